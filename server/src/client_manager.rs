//! Roster of connected clients
//!
//! This module tracks every open connection the server knows about:
//! - Participant id assignment (`player_1`, `player_2`, ...)
//! - The outbound channel used to reach each connection
//! - Capacity enforcement
//!
//! A client is on the roster from handshake until disconnect, whether it is
//! idle, waiting in the matchmaking queue, or playing a match.

use crate::participant::{Connection, Participant};
use log::info;
use shared::ParticipantId;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// A connected client and the handle used to push events to it
#[derive(Debug)]
pub struct Client {
    /// Participant id assigned by the server
    pub id: ParticipantId,
    /// Remote address, kept for logging
    pub addr: SocketAddr,
    /// Outbound event channel drained by the connection's writer task
    pub connection: Connection,
    pub connected_at: Instant,
}

impl Client {
    pub fn new(id: ParticipantId, addr: SocketAddr, connection: Connection) -> Self {
        Self {
            id,
            addr,
            connection,
            connected_at: Instant::now(),
        }
    }

    /// Builds the match participant backed by this connection
    pub fn participant(&self) -> Participant {
        Participant::real(self.id.clone(), self.connection.clone())
    }

    pub fn connected_for(&self) -> Duration {
        self.connected_at.elapsed()
    }
}

pub struct ClientManager {
    clients: HashMap<ParticipantId, Client>,
    /// Next number used to build a participant id
    next_client_id: u32,
    max_clients: usize,
}

impl ClientManager {
    /// Ids start at `player_1` and are never reused
    pub fn new(max_clients: usize) -> Self {
        Self {
            clients: HashMap::new(),
            next_client_id: 1,
            max_clients,
        }
    }

    /// Registers a new connection. Returns `None` when the server is full.
    pub fn add_client(
        &mut self,
        addr: SocketAddr,
        connection: Connection,
    ) -> Option<ParticipantId> {
        if self.clients.len() >= self.max_clients {
            return None;
        }

        let client_id = format!("player_{}", self.next_client_id);
        self.next_client_id += 1;

        info!("Client {} connected from {}", client_id, addr);
        self.clients
            .insert(client_id.clone(), Client::new(client_id.clone(), addr, connection));

        Some(client_id)
    }

    pub fn remove_client(&mut self, client_id: &str) -> bool {
        if let Some(client) = self.clients.remove(client_id) {
            info!(
                "Client {} ({}) disconnected after {:.1}s",
                client.id,
                client.addr,
                client.connected_for().as_secs_f32()
            );
            true
        } else {
            false
        }
    }

    pub fn participant(&self, client_id: &str) -> Option<Participant> {
        self.clients.get(client_id).map(Client::participant)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn max_clients(&self) -> usize {
        self.max_clients
    }
}
