//! Gameplay tunables for match sessions and matchmaking
//!
//! Every constant the game loop depends on lives here so the binary can
//! override it from the command line and tests can shorten it.

use shared::{
    DEFAULT_MAX_FORCE, LEAD_IN_MS, MATCHMAKING_FALLBACK_MS, MATCHMAKING_TICK_MS,
    QUESTION_DURATION_MS, ROUND_PAUSE_MS, SYNTHETIC_ACCURACY, SYNTHETIC_MAX_DELAY_MS,
    SYNTHETIC_MIN_DELAY_MS,
};
use std::time::Duration;

/// Behaviour of the stand-in opponent used when nobody else is waiting
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticConfig {
    /// Probability that a decision is a correct answer
    pub accuracy: f64,
    /// Inclusive lower bound of the sampled reaction delay
    pub min_delay: Duration,
    /// Exclusive upper bound of the sampled reaction delay
    pub max_delay: Duration,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            accuracy: SYNTHETIC_ACCURACY,
            min_delay: Duration::from_millis(SYNTHETIC_MIN_DELAY_MS),
            max_delay: Duration::from_millis(SYNTHETIC_MAX_DELAY_MS),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    /// Time a player has to answer before the force decays to zero
    pub question_duration: Duration,
    /// Pause added after an unanswered round before the next question
    pub round_pause: Duration,
    /// Delay between `game_start` and the first question
    pub lead_in: Duration,
    /// Force awarded for an instant correct answer
    pub max_force: f64,
    /// Wait after which a lone queued player is paired with a synthetic opponent
    pub matchmaking_fallback: Duration,
    /// Period of the matchmaker pairing pass
    pub matchmaking_tick: Duration,
    pub synthetic: SyntheticConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            question_duration: Duration::from_millis(QUESTION_DURATION_MS),
            round_pause: Duration::from_millis(ROUND_PAUSE_MS),
            lead_in: Duration::from_millis(LEAD_IN_MS),
            max_force: DEFAULT_MAX_FORCE,
            matchmaking_fallback: Duration::from_millis(MATCHMAKING_FALLBACK_MS),
            matchmaking_tick: Duration::from_millis(MATCHMAKING_TICK_MS),
            synthetic: SyntheticConfig::default(),
        }
    }
}

impl GameConfig {
    /// Total lifetime of an unanswered round
    pub fn round_timeout(&self) -> Duration {
        self.question_duration + self.round_pause
    }

    pub fn question_duration_ms(&self) -> u64 {
        self.question_duration.as_millis() as u64
    }
}
