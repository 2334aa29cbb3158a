//! Performance benchmarks for the hot paths of the match engine

use client::game::solve_question;
use rand::rngs::StdRng;
use rand::SeedableRng;
use server::config::GameConfig;
use server::matchmaker::Matchmaker;
use server::participant::Participant;
use server::question::{parse_answer, Question};
use shared::{apply_force, compute_force, decode_event, encode_event, PullDirection, ServerEvent};
use std::time::Instant;
use tokio::sync::mpsc;

/// Benchmarks question generation
#[test]
fn benchmark_question_generation() {
    let mut rng = StdRng::seed_from_u64(7);
    let issued_at = tokio::time::Instant::now();

    let iterations = 100_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let question = Question::generate(&mut rng, issued_at);
        assert_eq!(solve_question(&question.text), Some(question.answer as i64));
    }

    let duration = start.elapsed();
    println!(
        "Question generation: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 2_000);
}

/// Benchmarks force computation and rope updates
#[test]
fn benchmark_force_computation() {
    let iterations = 1_000_000;
    let start = Instant::now();
    let mut position = 0.0;

    for i in 0..iterations {
        let force = compute_force((i % 12_000) as f64, 10_000.0, 15.0);
        let direction = PullDirection::for_seat(i % 2);
        position = apply_force(position, force, direction);
    }

    let duration = start.elapsed();
    println!(
        "Force computation: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    assert!(position.abs() <= shared::ROPE_LIMIT);
    assert!(duration.as_millis() < 500);
}

/// Benchmarks answer parsing
#[test]
fn benchmark_answer_parsing() {
    let inputs = ["42", " 17", "-3", "12abc", "abc", "", "99999999999999999999"];
    let iterations = 100_000;
    let start = Instant::now();

    for i in 0..iterations {
        let _ = parse_answer(inputs[i % inputs.len()]);
    }

    let duration = start.elapsed();
    println!(
        "Answer parsing: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 500);
}

/// Benchmarks event encoding and decoding
#[test]
fn benchmark_event_serialization() {
    let event = ServerEvent::RopeUpdate {
        rope_position: 42.5,
        player_id: "player_12".to_string(),
        force: 12.75,
    };

    let iterations = 50_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let text = encode_event(&event).unwrap();
        let decoded: ServerEvent = decode_event(&text).unwrap();
        assert_eq!(decoded, event);
    }

    let duration = start.elapsed();
    println!(
        "Event serialization: {} round trips in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 2_000);
}

/// Stress test: a burst of joins is paired in arrival order
#[tokio::test(start_paused = true)]
async fn stress_test_matchmaking_burst() {
    let mut matchmaker = Matchmaker::new(&GameConfig::default());
    let mut receivers = Vec::new();

    let players = 10_000;
    let start = Instant::now();
    let mut pairings = Vec::new();

    for i in 0..players {
        let (tx, rx) = mpsc::unbounded_channel();
        receivers.push(rx);
        pairings.extend(matchmaker.enqueue(Participant::real(format!("player_{}", i), tx)));
    }

    let duration = start.elapsed();
    println!(
        "Matchmaking: {} joins paired into {} matches in {:?}",
        players,
        pairings.len(),
        duration
    );

    assert_eq!(pairings.len(), players / 2);
    assert!(matchmaker.is_empty());
    assert_eq!(pairings[0].first.id(), "player_0");
    assert_eq!(pairings[0].second.id(), "player_1");
    assert!(pairings.iter().all(|pairing| !pairing.is_synthetic()));
    assert!(duration.as_millis() < 2_000);
}
