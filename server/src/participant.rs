//! Match participants: live connections or synthetic opponents

use crate::synthetic::SyntheticOpponent;
use log::debug;
use shared::{ParticipantId, ServerEvent};
use tokio::sync::mpsc;

/// Outbound half of a client connection
pub type Connection = mpsc::UnboundedSender<ServerEvent>;

#[derive(Debug)]
pub enum Participant {
    Real { id: ParticipantId, connection: Connection },
    Synthetic(SyntheticOpponent),
}

impl Participant {
    pub fn real(id: impl Into<ParticipantId>, connection: Connection) -> Self {
        Participant::Real {
            id: id.into(),
            connection,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Participant::Real { id, .. } => id,
            Participant::Synthetic(opponent) => opponent.id(),
        }
    }

    pub fn is_synthetic(&self) -> bool {
        matches!(self, Participant::Synthetic(_))
    }

    /// Delivers an event to the participant. Synthetic opponents have nobody
    /// to tell; a closed connection is logged and otherwise ignored.
    pub fn notify(&self, event: &ServerEvent) {
        if let Participant::Real { id, connection } = self {
            if connection.send(event.clone()).is_err() {
                debug!("Dropping {:?} for closed connection {}", event, id);
            }
        }
    }
}
