//! Arithmetic questions issued once per round

use rand::Rng;
use tokio::time::Instant;

const MIN_OPERAND: u32 = 1;
const MAX_OPERAND: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Add,
    Subtract,
}

#[derive(Debug, Clone)]
pub struct Question {
    pub text: String,
    pub answer: u32,
    pub issued_at: Instant,
}

impl Question {
    /// Builds a question from two operands. Subtraction puts the larger
    /// operand first so the answer is never negative.
    pub fn from_operands(a: u32, b: u32, operation: Operation, issued_at: Instant) -> Self {
        let (text, answer) = match operation {
            Operation::Add => (format!("{} + {}", a, b), a + b),
            Operation::Subtract => {
                let (high, low) = if a >= b { (a, b) } else { (b, a) };
                (format!("{} - {}", high, low), high - low)
            }
        };

        Self {
            text,
            answer,
            issued_at,
        }
    }

    /// Random addition or subtraction with both operands in `[1, 10]`
    pub fn generate<R: Rng + ?Sized>(rng: &mut R, issued_at: Instant) -> Self {
        let a = rng.gen_range(MIN_OPERAND..=MAX_OPERAND);
        let b = rng.gen_range(MIN_OPERAND..=MAX_OPERAND);
        let operation = if rng.gen_bool(0.5) {
            Operation::Add
        } else {
            Operation::Subtract
        };

        Self::from_operands(a, b, operation, issued_at)
    }

    pub fn is_correct(&self, raw: &str) -> bool {
        parse_answer(raw) == Some(self.answer as i64)
    }
}

/// Reads the leading integer of a free-form answer, ignoring surrounding
/// whitespace and any trailing text ("4", " 4 ", "4.0" and "4x" all read as 4).
/// Returns `None` when no digits lead the input.
pub fn parse_answer(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let digits: &str = {
        let end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        &rest[..end]
    };

    if digits.is_empty() {
        return None;
    }

    let value: i64 = digits.parse().ok()?;
    Some(if negative { -value } else { value })
}
