//! One match between two participants
//!
//! A session moves through `Pending -> Running -> Ended`. While running it
//! owns exactly one active question, at most one round timer and at most one
//! synthetic-answer timer. Every outward effect is a `ServerEvent` sent to
//! one or both participants.

use crate::config::GameConfig;
use crate::participant::Participant;
use crate::question::Question;
use crate::timers::{Scheduler, SessionTimer, TimerHandle};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared::{
    apply_force, compute_force, round_tenths, winning_direction, ParticipantId, PullDirection,
    ServerEvent,
};
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Pending,
    Running,
    Ended,
}

/// What happened to a submitted answer
#[derive(Debug, Clone, PartialEq)]
pub enum AnswerOutcome {
    /// Not running, no active question, or not a participant of this session
    Ignored,
    Incorrect,
    Correct { force: f64 },
    Won { winner_id: ParticipantId, force: f64 },
}

pub struct MatchSession {
    id: String,
    participants: [Participant; 2],
    rope_position: f64,
    current_question: Option<Question>,
    state: SessionState,
    round: u64,
    winner: Option<ParticipantId>,
    config: GameConfig,
    scheduler: Scheduler,
    round_timer: Option<TimerHandle>,
    synthetic_timer: Option<TimerHandle>,
    rng: StdRng,
}

impl MatchSession {
    pub fn new(
        id: String,
        first: Participant,
        second: Participant,
        config: GameConfig,
        scheduler: Scheduler,
    ) -> Self {
        Self::with_rng(id, first, second, config, scheduler, StdRng::from_entropy())
    }

    pub fn with_rng(
        id: String,
        first: Participant,
        second: Participant,
        config: GameConfig,
        scheduler: Scheduler,
        rng: StdRng,
    ) -> Self {
        Self {
            id,
            participants: [first, second],
            rope_position: 0.0,
            current_question: None,
            state: SessionState::Pending,
            round: 0,
            winner: None,
            config,
            scheduler,
            round_timer: None,
            synthetic_timer: None,
            rng,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    pub fn is_ended(&self) -> bool {
        self.state == SessionState::Ended
    }

    pub fn rope_position(&self) -> f64 {
        self.rope_position
    }

    pub fn round(&self) -> u64 {
        self.round
    }

    pub fn winner(&self) -> Option<&str> {
        self.winner.as_deref()
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.current_question.as_ref()
    }

    pub fn participant_ids(&self) -> [&str; 2] {
        [self.participants[0].id(), self.participants[1].id()]
    }

    pub fn has_participant(&self, participant_id: &str) -> bool {
        self.seat_of(participant_id).is_some()
    }

    pub fn has_pending_timers(&self) -> bool {
        self.round_timer.is_some() || self.synthetic_timer.is_some()
    }

    fn seat_of(&self, participant_id: &str) -> Option<usize> {
        self.participants
            .iter()
            .position(|participant| participant.id() == participant_id)
    }

    /// Sends an event to both participants
    pub fn broadcast(&self, event: &ServerEvent) {
        for participant in &self.participants {
            participant.notify(event);
        }
    }

    fn notify_seat(&self, seat: usize, event: &ServerEvent) {
        self.participants[seat].notify(event);
    }

    pub fn start(&mut self) {
        if self.state != SessionState::Pending {
            return;
        }

        self.state = SessionState::Running;
        info!(
            "Session {} started: {} vs {}",
            self.id,
            self.participants[0].id(),
            self.participants[1].id()
        );

        let players = self
            .participants
            .iter()
            .map(|participant| participant.id().to_string())
            .collect();
        self.broadcast(&ServerEvent::GameStart {
            players,
            rope_position: self.rope_position,
        });

        self.round_timer = Some(self.scheduler.schedule_session(
            self.config.lead_in,
            &self.id,
            self.round,
            SessionTimer::LeadIn,
        ));
    }

    /// Issues a fresh question and restarts the round timers
    pub fn advance_question(&mut self) {
        if self.state != SessionState::Running {
            return;
        }

        self.cancel_timers();

        let question = Question::generate(&mut self.rng, Instant::now());
        self.round += 1;
        debug!(
            "Session {} round {}: {} = {}",
            self.id, self.round, question.text, question.answer
        );

        self.broadcast(&ServerEvent::NewQuestion {
            question: question.text.clone(),
            duration: self.config.question_duration_ms(),
        });
        self.current_question = Some(question);

        self.round_timer = Some(self.scheduler.schedule_session(
            self.config.round_timeout(),
            &self.id,
            self.round,
            SessionTimer::RoundTimeout,
        ));

        self.schedule_synthetic_answer();
    }

    fn schedule_synthetic_answer(&mut self) {
        let Some(correct_answer) = self.current_question.as_ref().map(|q| q.answer) else {
            return;
        };
        let duration = self.config.question_duration;

        let mut pending = None;
        for participant in self.participants.iter_mut() {
            if let Participant::Synthetic(opponent) = participant {
                let decision = opponent.decide();
                if decision.delay >= duration {
                    debug!("{} sits out this round", opponent.id());
                    continue;
                }

                let answer = if decision.is_correct {
                    correct_answer
                } else {
                    correct_answer + 1
                };
                pending = Some((decision.delay, opponent.id().to_string(), answer.to_string()));
            }
        }

        if let Some((delay, participant_id, answer)) = pending {
            self.synthetic_timer = Some(self.scheduler.schedule_session(
                delay,
                &self.id,
                self.round,
                SessionTimer::SyntheticAnswer {
                    participant_id,
                    answer,
                },
            ));
        }
    }

    /// Reacts to one of this session's timers. Timers from an earlier round
    /// or after the session ended are stale and ignored.
    pub fn handle_timer(&mut self, round: u64, timer: SessionTimer) -> AnswerOutcome {
        if self.state != SessionState::Running || round != self.round {
            debug!(
                "Session {} ignoring stale {:?} for round {} (current {})",
                self.id, timer, round, self.round
            );
            return AnswerOutcome::Ignored;
        }

        match timer {
            SessionTimer::LeadIn | SessionTimer::RoundTimeout => {
                self.round_timer = None;
                self.advance_question();
                AnswerOutcome::Ignored
            }
            SessionTimer::SyntheticAnswer {
                participant_id,
                answer,
            } => {
                self.synthetic_timer = None;
                self.submit_answer(&participant_id, &answer)
            }
        }
    }

    pub fn submit_answer(&mut self, participant_id: &str, raw_answer: &str) -> AnswerOutcome {
        if self.state != SessionState::Running {
            return AnswerOutcome::Ignored;
        }
        let Some(seat) = self.seat_of(participant_id) else {
            return AnswerOutcome::Ignored;
        };
        let Some(question) = self.current_question.as_ref() else {
            return AnswerOutcome::Ignored;
        };

        let is_correct = question.is_correct(raw_answer);
        let elapsed = Instant::now().duration_since(question.issued_at);

        self.broadcast(&ServerEvent::PlayerAnswer {
            player_id: participant_id.to_string(),
            is_correct,
            value: raw_answer.to_string(),
        });

        if !is_correct {
            debug!("Session {}: {} answered {:?} wrong", self.id, participant_id, raw_answer);
            self.notify_seat(
                seat,
                &ServerEvent::AnswerResult {
                    correct: false,
                    force: None,
                },
            );
            return AnswerOutcome::Incorrect;
        }

        let force = compute_force(
            elapsed.as_secs_f64() * 1_000.0,
            self.config.question_duration.as_secs_f64() * 1_000.0,
            self.config.max_force,
        );
        let direction = PullDirection::for_seat(seat);
        self.rope_position = apply_force(self.rope_position, force, direction);
        debug!(
            "Session {}: {} pulled {:.2}, rope at {:.2}",
            self.id, participant_id, force, self.rope_position
        );

        self.broadcast(&ServerEvent::RopeUpdate {
            rope_position: self.rope_position,
            player_id: participant_id.to_string(),
            force,
        });
        self.notify_seat(
            seat,
            &ServerEvent::AnswerResult {
                correct: true,
                force: Some(round_tenths(force)),
            },
        );

        if let Some(winning) = winning_direction(self.rope_position) {
            let winner_id = self.participants[winning.seat()].id().to_string();
            self.end(&winner_id);
            return AnswerOutcome::Won { winner_id, force };
        }

        // A correct answer skips the rest of the round and the pause
        self.advance_question();
        AnswerOutcome::Correct { force }
    }

    /// Declares a winner and stops the session. Calling it again is a no-op.
    pub fn end(&mut self, winner_id: &str) {
        if self.state == SessionState::Ended {
            return;
        }

        self.state = SessionState::Ended;
        self.cancel_timers();
        self.current_question = None;
        self.winner = Some(winner_id.to_string());
        info!(
            "Session {} over: {} wins at {:.1}",
            self.id, winner_id, self.rope_position
        );

        self.broadcast(&ServerEvent::GameOver {
            winner_id: winner_id.to_string(),
            rope_position: self.rope_position,
        });
    }

    /// Stops the session without a winner, releasing every timer
    pub fn teardown(&mut self) {
        self.cancel_timers();
        if self.state == SessionState::Ended {
            return;
        }

        self.state = SessionState::Ended;
        self.current_question = None;
        info!("Session {} torn down", self.id);
    }

    fn cancel_timers(&mut self) {
        if let Some(timer) = self.round_timer.take() {
            timer.cancel();
        }
        if let Some(timer) = self.synthetic_timer.take() {
            timer.cancel();
        }
    }

    #[cfg(test)]
    pub(crate) fn set_rope_position(&mut self, position: f64) {
        self.rope_position = position;
    }
}
