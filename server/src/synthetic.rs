//! Randomised stand-in opponent
//!
//! A synthetic opponent never talks to the network. Each question it draws a
//! reaction delay and whether it will answer correctly; the session turns
//! that decision into a scheduled answer.

use crate::config::SyntheticConfig;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use log::warn;
use shared::{ParticipantId, SYNTHETIC_ACCURACY};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub delay: Duration,
    pub is_correct: bool,
}

#[derive(Debug)]
pub struct SyntheticOpponent {
    id: ParticipantId,
    accuracy: f64,
    min_delay_ms: u64,
    max_delay_ms: u64,
    rng: StdRng,
}

impl SyntheticOpponent {
    pub fn new(id: ParticipantId, config: &SyntheticConfig) -> Self {
        Self::with_rng(id, config, StdRng::from_entropy())
    }

    pub fn with_rng(id: ParticipantId, config: &SyntheticConfig, rng: StdRng) -> Self {
        let min_delay_ms = config.min_delay.as_millis() as u64;
        // Keep the sampling range non-empty
        let max_delay_ms = (config.max_delay.as_millis() as u64).max(min_delay_ms + 1);

        Self {
            id,
            accuracy: sanitize_accuracy(config.accuracy),
            min_delay_ms,
            max_delay_ms,
            rng,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn accuracy(&self) -> f64 {
        self.accuracy
    }

    /// Draws the reaction for one question: delay in `[min_delay, max_delay)`
    /// and a correct answer with probability `accuracy`.
    pub fn decide(&mut self) -> Decision {
        let delay_ms = self.rng.gen_range(self.min_delay_ms..self.max_delay_ms);
        let is_correct = self.rng.gen_bool(self.accuracy);

        Decision {
            delay: Duration::from_millis(delay_ms),
            is_correct,
        }
    }
}

/// Non-finite accuracies fall back to the default; the rest are clamped
fn sanitize_accuracy(accuracy: f64) -> f64 {
    if accuracy.is_finite() {
        accuracy.clamp(0.0, 1.0)
    } else {
        warn!(
            "Invalid synthetic accuracy {}, using {}",
            accuracy, SYNTHETIC_ACCURACY
        );
        SYNTHETIC_ACCURACY
    }
}
