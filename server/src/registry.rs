//! Live sessions indexed by id and by participant
//!
//! The registry turns pairings from the matchmaker into running sessions and
//! routes answers and timer events to them. A session that finishes during
//! one of those calls is removed before the call returns, so a participant
//! is free to queue again as soon as `game_over` has been sent.

use crate::config::GameConfig;
use crate::participant::Participant;
use crate::session::{AnswerOutcome, MatchSession};
use crate::timers::{Scheduler, SessionTimer};
use crate::utils::generate_session_id;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared::{ParticipantId, ServerEvent};
use std::collections::HashMap;

pub type SessionId = String;

pub struct SessionRegistry {
    sessions: HashMap<SessionId, MatchSession>,
    by_participant: HashMap<ParticipantId, SessionId>,
    config: GameConfig,
    scheduler: Scheduler,
    rng: StdRng,
}

impl SessionRegistry {
    pub fn new(config: GameConfig, scheduler: Scheduler) -> Self {
        Self {
            sessions: HashMap::new(),
            by_participant: HashMap::new(),
            config,
            scheduler,
            rng: StdRng::from_entropy(),
        }
    }

    /// Builds a session for two participants, indexes it and starts it.
    /// The first participant pulls toward `+100`.
    pub fn create_session(&mut self, first: Participant, second: Participant) -> SessionId {
        let mut session_id = generate_session_id(&mut self.rng);
        while self.sessions.contains_key(&session_id) {
            session_id = generate_session_id(&mut self.rng);
        }

        let participant_ids = [first.id().to_string(), second.id().to_string()];
        let session = MatchSession::with_rng(
            session_id.clone(),
            first,
            second,
            self.config.clone(),
            self.scheduler.clone(),
            StdRng::from_rng(&mut self.rng).unwrap_or_else(|_| StdRng::from_entropy()),
        );

        for participant_id in participant_ids {
            self.by_participant.insert(participant_id, session_id.clone());
        }
        info!("Created session {}", session_id);

        let session = self.sessions.entry(session_id.clone()).or_insert(session);
        session.start();

        session_id
    }

    pub fn lookup_by_participant(&self, participant_id: &str) -> Option<&MatchSession> {
        self.by_participant
            .get(participant_id)
            .and_then(|session_id| self.sessions.get(session_id))
    }

    pub fn contains_participant(&self, participant_id: &str) -> bool {
        self.by_participant.contains_key(participant_id)
    }

    /// Tears a session down and forgets both of its participants. Safe to
    /// call for a session that already ended or no longer exists.
    pub fn destroy_session(&mut self, session_id: &str) -> bool {
        let Some(mut session) = self.sessions.remove(session_id) else {
            return false;
        };

        session.teardown();
        for participant_id in session.participant_ids() {
            if self.by_participant.get(participant_id).map(String::as_str) == Some(session_id) {
                self.by_participant.remove(participant_id);
            }
        }
        debug!("Destroyed session {}", session_id);
        true
    }

    /// Routes an answer to the sender's session
    pub fn submit_answer(&mut self, participant_id: &str, raw_answer: &str) -> AnswerOutcome {
        let Some(session_id) = self.by_participant.get(participant_id).cloned() else {
            debug!("Answer from {} who is not in a session", participant_id);
            return AnswerOutcome::Ignored;
        };
        let Some(session) = self.sessions.get_mut(&session_id) else {
            return AnswerOutcome::Ignored;
        };

        let outcome = session.submit_answer(participant_id, raw_answer);
        self.reap_if_ended(&session_id);
        outcome
    }

    /// Routes a fired timer to its session. Timers for sessions that are
    /// already gone are dropped.
    pub fn handle_timer(
        &mut self,
        session_id: &str,
        round: u64,
        timer: SessionTimer,
    ) -> AnswerOutcome {
        let Some(session) = self.sessions.get_mut(session_id) else {
            debug!("Timer {:?} for unknown session {}", timer, session_id);
            return AnswerOutcome::Ignored;
        };

        let outcome = session.handle_timer(round, timer);
        self.reap_if_ended(session_id);
        outcome
    }

    /// Ends the session of a participant who went away, telling the room
    /// first. Returns whether a session was affected.
    pub fn abandon(&mut self, participant_id: &str) -> bool {
        let Some(session_id) = self.by_participant.get(participant_id).cloned() else {
            return false;
        };

        if let Some(session) = self.sessions.get(&session_id) {
            info!(
                "Participant {} left session {}, ending it",
                participant_id, session_id
            );
            session.broadcast(&ServerEvent::OpponentDisconnected);
        }
        self.destroy_session(&session_id)
    }

    fn reap_if_ended(&mut self, session_id: &str) {
        if self
            .sessions
            .get(session_id)
            .is_some_and(|session| session.is_ended())
        {
            self.destroy_session(session_id);
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
