//! # Rope Pull Game Server Library
//!
//! This library provides the authoritative server for a two-player arithmetic
//! tug of war. Players answer questions; each correct answer pulls a shared
//! rope toward the answering player's side, harder the faster it came. The
//! first player to pull the rope to their end wins.
//!
//! ## Core Responsibilities
//!
//! ### Matchmaking
//! Players who ask to play wait in a first-come first-served queue. Two
//! waiting players are paired immediately; a player left alone past the
//! fallback threshold is paired with a synthetic opponent instead.
//!
//! ### Match Sessions
//! Each match owns its rope position, the active question and the timers
//! that pace the rounds. Answers are adjudicated on the server, which is the
//! only place the rope ever moves.
//!
//! ### Client Management
//! Handles the lifecycle of WebSocket connections:
//! - Handshake and participant id assignment
//! - Routing of inbound events to the queue or the right session
//! - Disconnect cleanup, including ending a match in progress
//!
//! ## Architecture Design
//!
//! ### Single-Threaded Event Loop
//! All game state is owned by one loop that handles one message at a time:
//! client events, disconnects, session timers and the matchmaker tick. No
//! handler is ever interrupted by another, so no game state needs a lock.
//! Per-connection tasks only translate between WebSocket frames and loop
//! messages.
//!
//! ### Cancellable Timers
//! Round timeouts and synthetic answers are spawned sleep tasks that post
//! a message back into the loop. Sessions cancel them before scheduling new
//! ones and tag each with its round so a late arrival is ignored.
//!
//! ## Module Organization
//!
//! - `client_manager`: connected clients and their outbound channels
//! - `config`: gameplay tunables
//! - `matchmaker`: the waiting queue and its pairing pass
//! - `network`: WebSocket handling and the main server loop
//! - `participant`: real or synthetic match participants
//! - `question`: question generation and answer parsing
//! - `registry`: live sessions by id and by participant
//! - `session`: the per-match state machine
//! - `synthetic`: the randomised stand-in opponent
//! - `timers`: cancellable timers feeding the loop
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::GameConfig;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut server = Server::bind("0.0.0.0:3001", GameConfig::default(), 1024).await?;
//!
//!     // Accepts connections, pairs players and runs every match until shutdown
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod client_manager;
pub mod config;
pub mod matchmaker;
pub mod network;
pub mod participant;
pub mod question;
pub mod registry;
pub mod session;
pub mod synthetic;
pub mod timers;
pub mod utils;
