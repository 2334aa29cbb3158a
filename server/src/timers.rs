//! Cancellable timers that feed the server event loop
//!
//! A timer is a spawned task that sleeps and then posts a message into the
//! same channel the network tasks use, so a firing timer is processed in
//! order with every other event. Cancelling (or dropping) the handle aborts
//! the task. A timer that already posted its message cannot be recalled,
//! which is why session timers carry the round they belong to.

use crate::network::ServerMessage;
use shared::ParticipantId;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;

/// Timers owned by a match session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionTimer {
    /// Pause between `game_start` and the first question
    LeadIn,
    /// The current round ran out without a correct answer
    RoundTimeout,
    /// A synthetic participant's answer for the current round
    SyntheticAnswer {
        participant_id: ParticipantId,
        answer: String,
    },
}

#[derive(Debug)]
pub struct TimerHandle {
    task: JoinHandle<()>,
}

impl TimerHandle {
    pub fn cancel(self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[derive(Debug, Clone)]
pub struct Scheduler {
    server_tx: mpsc::UnboundedSender<ServerMessage>,
}

impl Scheduler {
    pub fn new(server_tx: mpsc::UnboundedSender<ServerMessage>) -> Self {
        Self { server_tx }
    }

    /// Posts `message` to the event loop after `delay`
    pub fn schedule(&self, delay: Duration, message: ServerMessage) -> TimerHandle {
        let server_tx = self.server_tx.clone();
        let task = tokio::spawn(async move {
            sleep(delay).await;
            // The loop may already be gone during shutdown
            let _ = server_tx.send(message);
        });

        TimerHandle { task }
    }

    pub fn schedule_session(
        &self,
        delay: Duration,
        session_id: &str,
        round: u64,
        timer: SessionTimer,
    ) -> TimerHandle {
        self.schedule(
            delay,
            ServerMessage::SessionTimer {
                session_id: session_id.to_string(),
                round,
                timer,
            },
        )
    }
}
