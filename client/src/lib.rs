//! # Rope Pull Terminal Client
//!
//! A headless client for the rope pull server. It connects over WebSocket,
//! joins the matchmaking queue and prints the match as it unfolds: the
//! question, each pull on the rope and the result.
//!
//! ## Answering
//!
//! In manual mode every line typed on stdin is submitted as an answer while
//! a question is open. In bot mode the client solves each question itself,
//! waits a random delay and answers correctly with a configurable accuracy.
//! A bot answer that arrives after the question has changed is dropped.
//!
//! ## Module Organization
//!
//! - `game`: local mirror of the match, question solving and the rope gauge
//! - `network`: the WebSocket loop and the decision logic driving it

pub mod game;
pub mod network;
