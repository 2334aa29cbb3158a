use serde::{Deserialize, Serialize};

pub const ROPE_LIMIT: f64 = 100.0;
pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_MAX_FORCE: f64 = 15.0;
pub const QUESTION_DURATION_MS: u64 = 10_000;
pub const ROUND_PAUSE_MS: u64 = 2_000;
pub const LEAD_IN_MS: u64 = 1_000;
pub const SYNTHETIC_ACCURACY: f64 = 0.7;
pub const SYNTHETIC_MIN_DELAY_MS: u64 = 1_000;
pub const SYNTHETIC_MAX_DELAY_MS: u64 = 4_000;
pub const MATCHMAKING_FALLBACK_MS: u64 = 5_000;
pub const MATCHMAKING_TICK_MS: u64 = 1_000;

pub type ParticipantId = String;

/// Events sent by a client to the server.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    JoinGame,
    SubmitAnswer(String),
    Rematch,
}

/// Events sent by the server, either to a whole session or to one participant.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    /// Sent once after the handshake so the client knows its own id
    Connected {
        player_id: ParticipantId,
    },
    GameStart {
        players: Vec<ParticipantId>,
        rope_position: f64,
    },
    NewQuestion {
        question: String,
        duration: u64,
    },
    PlayerAnswer {
        player_id: ParticipantId,
        is_correct: bool,
        value: String,
    },
    RopeUpdate {
        rope_position: f64,
        player_id: ParticipantId,
        force: f64,
    },
    AnswerResult {
        correct: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        force: Option<f64>,
    },
    GameOver {
        winner_id: ParticipantId,
        rope_position: f64,
    },
    OpponentDisconnected,
}

pub fn encode_event<T: Serialize>(event: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string(event)
}

pub fn decode_event<'a, T: Deserialize<'a>>(text: &'a str) -> Result<T, serde_json::Error> {
    serde_json::from_str(text)
}

/// Which way a participant pulls the rope. The first participant of a
/// session pulls toward `+ROPE_LIMIT`, the second toward `-ROPE_LIMIT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullDirection {
    Positive,
    Negative,
}

impl PullDirection {
    pub fn for_seat(seat: usize) -> Self {
        if seat == 0 {
            PullDirection::Positive
        } else {
            PullDirection::Negative
        }
    }

    pub fn sign(self) -> f64 {
        match self {
            PullDirection::Positive => 1.0,
            PullDirection::Negative => -1.0,
        }
    }

    pub fn seat(self) -> usize {
        match self {
            PullDirection::Positive => 0,
            PullDirection::Negative => 1,
        }
    }
}

/// Force earned by a correct answer. Decays linearly from `max_force` at
/// issuance to zero once the whole round duration has elapsed.
pub fn compute_force(elapsed_ms: f64, duration_ms: f64, max_force: f64) -> f64 {
    if duration_ms <= 0.0 {
        return 0.0;
    }
    let remaining = (duration_ms - elapsed_ms.max(0.0)).max(0.0);
    (remaining / duration_ms).min(1.0) * max_force
}

pub fn apply_force(position: f64, force: f64, direction: PullDirection) -> f64 {
    (position + force * direction.sign()).clamp(-ROPE_LIMIT, ROPE_LIMIT)
}

pub fn winning_direction(position: f64) -> Option<PullDirection> {
    if position >= ROPE_LIMIT {
        Some(PullDirection::Positive)
    } else if position <= -ROPE_LIMIT {
        Some(PullDirection::Negative)
    } else {
        None
    }
}

/// Parses a probability for command line flags. Accepts finite values in
/// `[0, 1]` only.
pub fn parse_probability(raw: &str) -> Result<f64, String> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("`{}` is not a number", raw))?;
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(format!("`{}` is not a probability between 0 and 1", raw));
    }
    Ok(value)
}

/// Rounds to one decimal place, the precision reported back to the answering player.
pub fn round_tenths(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
