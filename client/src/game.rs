use log::debug;
use shared::{ParticipantId, PullDirection, ServerEvent, ROPE_LIMIT};

/// Local mirror of the match as reported by the server. The client never
/// moves the rope itself; every field here is overwritten by server events.
#[derive(Debug, Clone, Default)]
pub struct ClientMatchState {
    pub player_id: Option<ParticipantId>,
    pub players: Vec<ParticipantId>,
    pub rope_position: f64,
    pub question: Option<String>,
    /// Bumped on every `new_question` so late answers can be recognised
    pub question_seq: u64,
    pub winner: Option<ParticipantId>,
    pub in_match: bool,
    pub last_force: Option<f64>,
}

impl ClientMatchState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: &ServerEvent) {
        match event {
            ServerEvent::Connected { player_id } => {
                self.player_id = Some(player_id.clone());
            }
            ServerEvent::GameStart {
                players,
                rope_position,
            } => {
                self.players = players.clone();
                self.rope_position = *rope_position;
                self.question = None;
                self.winner = None;
                self.last_force = None;
                self.in_match = true;
            }
            ServerEvent::NewQuestion { question, .. } => {
                self.question = Some(question.clone());
                self.question_seq += 1;
            }
            ServerEvent::RopeUpdate { rope_position, .. } => {
                self.rope_position = *rope_position;
            }
            ServerEvent::AnswerResult { force, .. } => {
                self.last_force = *force;
            }
            ServerEvent::GameOver {
                winner_id,
                rope_position,
            } => {
                self.rope_position = *rope_position;
                self.winner = Some(winner_id.clone());
                self.question = None;
                self.in_match = false;
            }
            ServerEvent::OpponentDisconnected => {
                self.question = None;
                self.in_match = false;
            }
            ServerEvent::PlayerAnswer { .. } => {}
        }
    }

    /// Direction this client pulls in, once it knows its seat
    pub fn my_direction(&self) -> Option<PullDirection> {
        let me = self.player_id.as_ref()?;
        self.players
            .iter()
            .position(|player| player == me)
            .map(PullDirection::for_seat)
    }

    pub fn is_me(&self, player_id: &str) -> bool {
        self.player_id.as_deref() == Some(player_id)
    }

    pub fn won(&self) -> Option<bool> {
        self.winner.as_deref().map(|winner| self.is_me(winner))
    }

    /// One line of terminal output for an event, after it has been applied
    pub fn describe(&self, event: &ServerEvent) -> Option<String> {
        let line = match event {
            ServerEvent::Connected { player_id } => format!("Connected as {}", player_id),
            ServerEvent::GameStart { players, .. } => {
                let side = match self.my_direction() {
                    Some(PullDirection::Positive) => "right",
                    Some(PullDirection::Negative) => "left",
                    None => "unknown",
                };
                format!("Match started: {} (you pull {})", players.join(" vs "), side)
            }
            ServerEvent::NewQuestion { question, duration } => {
                format!("Question: {} ({}s)", question, duration / 1_000)
            }
            ServerEvent::PlayerAnswer {
                player_id,
                is_correct,
                value,
            } => {
                if self.is_me(player_id) {
                    return None;
                }
                let verdict = if *is_correct { "correct" } else { "wrong" };
                format!("{} answered {} ({})", player_id, value, verdict)
            }
            ServerEvent::RopeUpdate { player_id, force, .. } => format!(
                "{} {} pulled {:.1}",
                rope_gauge(self.rope_position, 41),
                player_id,
                force
            ),
            ServerEvent::AnswerResult { correct, force } => match (correct, force) {
                (true, Some(force)) => format!("Correct! Force {:.1}", force),
                (true, None) => "Correct!".to_string(),
                (false, _) => "Wrong answer".to_string(),
            },
            ServerEvent::GameOver { winner_id, .. } => match self.won() {
                Some(true) => "You won!".to_string(),
                _ => format!("{} won the match", winner_id),
            },
            ServerEvent::OpponentDisconnected => "Opponent disconnected".to_string(),
        };
        Some(line)
    }
}

/// Solves a question of the form `"a + b"` or `"a - b"`
pub fn solve_question(text: &str) -> Option<i64> {
    let mut parts = text.split_whitespace();
    let left: i64 = parts.next()?.parse().ok()?;
    let operator = parts.next()?;
    let right: i64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }

    match operator {
        "+" => Some(left + right),
        "-" => Some(left - right),
        other => {
            debug!("Unknown operator in question: {}", other);
            None
        }
    }
}

/// Renders the rope as a fixed-width gauge with the knot marked `O` and the
/// centre line `|`. Positive positions sit to the right of centre.
pub fn rope_gauge(position: f64, width: usize) -> String {
    let width = width.max(3);
    let center = width / 2;
    let fraction = (position.clamp(-ROPE_LIMIT, ROPE_LIMIT) + ROPE_LIMIT) / (2.0 * ROPE_LIMIT);
    let knot = (fraction * (width - 1) as f64).round() as usize;

    let cells: String = (0..width)
        .map(|cell| {
            if cell == knot {
                'O'
            } else if cell == center {
                '|'
            } else {
                '-'
            }
        })
        .collect();

    format!("[{}]", cells)
}
