//! Waiting queue that pairs players into matches
//!
//! Players are paired strictly in arrival order. Anyone left alone in the
//! queue for longer than the fallback threshold is paired with a synthetic
//! opponent instead, so nobody waits forever. The matchmaker only decides
//! pairings; the caller turns them into sessions.

use crate::config::{GameConfig, SyntheticConfig};
use crate::participant::Participant;
use crate::synthetic::SyntheticOpponent;
use crate::utils::generate_synthetic_id;
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug)]
pub struct QueueEntry {
    pub participant: Participant,
    pub enqueued_at: Instant,
}

impl QueueEntry {
    pub fn new(participant: Participant) -> Self {
        Self {
            participant,
            enqueued_at: Instant::now(),
        }
    }

    pub fn waited(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.enqueued_at)
    }
}

/// Two participants that should play each other. `first` pulls toward `+100`.
#[derive(Debug)]
pub struct Pairing {
    pub first: Participant,
    pub second: Participant,
}

impl Pairing {
    pub fn is_synthetic(&self) -> bool {
        self.first.is_synthetic() || self.second.is_synthetic()
    }
}

pub struct Matchmaker {
    queue: VecDeque<QueueEntry>,
    fallback_after: Duration,
    synthetic: SyntheticConfig,
    rng: StdRng,
}

impl Matchmaker {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            queue: VecDeque::new(),
            fallback_after: config.matchmaking_fallback,
            synthetic: config.synthetic.clone(),
            rng: StdRng::from_entropy(),
        }
    }

    /// Adds a participant to the back of the queue and runs a pairing pass.
    /// A participant already waiting is left where it is.
    pub fn enqueue(&mut self, participant: Participant) -> Vec<Pairing> {
        if self.is_queued(participant.id()) {
            return Vec::new();
        }

        info!("Player {} joined queue", participant.id());
        self.queue.push_back(QueueEntry::new(participant));
        self.pairing_pass(Instant::now())
    }

    /// Removes a waiting participant. Returns false if it was not queued.
    pub fn dequeue(&mut self, participant_id: &str) -> bool {
        let before = self.queue.len();
        self.queue
            .retain(|entry| entry.participant.id() != participant_id);
        before != self.queue.len()
    }

    /// Periodic pairing pass
    pub fn tick(&mut self) -> Vec<Pairing> {
        self.pairing_pass(Instant::now())
    }

    /// Pairs waiting participants two at a time, oldest first, then gives
    /// every participant that waited past the fallback a synthetic opponent.
    pub fn pairing_pass(&mut self, now: Instant) -> Vec<Pairing> {
        let mut pairings = Vec::new();

        while self.queue.len() >= 2 {
            if let (Some(first), Some(second)) = (self.queue.pop_front(), self.queue.pop_front()) {
                info!(
                    "Matching {} with {}",
                    first.participant.id(),
                    second.participant.id()
                );
                pairings.push(Pairing {
                    first: first.participant,
                    second: second.participant,
                });
            }
        }

        let fallback_after = self.fallback_after;
        let (expired, waiting): (VecDeque<QueueEntry>, VecDeque<QueueEntry>) = self
            .queue
            .drain(..)
            .partition(|entry| entry.waited(now) > fallback_after);
        self.queue = waiting;

        for entry in expired {
            let opponent = SyntheticOpponent::new(
                generate_synthetic_id(&mut self.rng),
                &self.synthetic,
            );
            info!(
                "Matching {} with synthetic opponent {}",
                entry.participant.id(),
                opponent.id()
            );
            pairings.push(Pairing {
                first: entry.participant,
                second: Participant::Synthetic(opponent),
            });
        }

        pairings
    }

    pub fn is_queued(&self, participant_id: &str) -> bool {
        self.queue
            .iter()
            .any(|entry| entry.participant.id() == participant_id)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
