//! Integration tests for the matchmaking and match session engine
//!
//! These tests run the full server loop. Most drive it through its message
//! channel under paused tokio time; one goes over a real WebSocket.

use client::game::solve_question;
use server::config::GameConfig;
use server::network::{Server, ServerMessage};
use shared::{ClientEvent, ParticipantId, ServerEvent};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

const EVENT_TIMEOUT: Duration = Duration::from_secs(120);

/// A client attached directly to the server loop's channel
struct TestClient {
    id: ParticipantId,
    events: mpsc::UnboundedReceiver<ServerEvent>,
    server_tx: mpsc::UnboundedSender<ServerMessage>,
}

impl TestClient {
    async fn connect(server_tx: &mpsc::UnboundedSender<ServerMessage>, port: u16) -> Self {
        let (connection, mut events) = mpsc::unbounded_channel();
        let (reply, reply_rx) = oneshot::channel();
        let addr: SocketAddr = format!("127.0.0.1:{}", port).parse().unwrap();

        server_tx
            .send(ServerMessage::ClientConnected {
                addr,
                connection,
                reply,
            })
            .unwrap();
        let id = reply_rx.await.unwrap().expect("server should accept the client");

        assert_eq!(
            events.recv().await,
            Some(ServerEvent::Connected {
                player_id: id.clone()
            })
        );

        Self {
            id,
            events,
            server_tx: server_tx.clone(),
        }
    }

    fn send(&self, event: ClientEvent) {
        self.server_tx
            .send(ServerMessage::ClientEvent {
                client_id: self.id.clone(),
                event,
            })
            .unwrap();
    }

    fn disconnect(&self) {
        self.server_tx
            .send(ServerMessage::ClientDisconnected {
                client_id: self.id.clone(),
            })
            .unwrap();
    }

    async fn next(&mut self) -> ServerEvent {
        tokio::time::timeout(EVENT_TIMEOUT, self.events.recv())
            .await
            .expect("timed out waiting for an event")
            .expect("server dropped the connection")
    }

    /// Skips events until one matches, returning it
    async fn next_matching(&mut self, wanted: impl Fn(&ServerEvent) -> bool) -> ServerEvent {
        loop {
            let event = self.next().await;
            if wanted(&event) {
                return event;
            }
        }
    }

    async fn next_question(&mut self) -> String {
        match self
            .next_matching(|event| matches!(event, ServerEvent::NewQuestion { .. }))
            .await
        {
            ServerEvent::NewQuestion { question, .. } => question,
            _ => unreachable!(),
        }
    }

    fn drain(&mut self) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }
}

fn spawn_server(config: GameConfig) -> mpsc::UnboundedSender<ServerMessage> {
    let mut server = Server::new(config, 16);
    let server_tx = server.sender();
    tokio::spawn(async move {
        let _ = server.run().await;
    });
    server_tx
}

async fn paired_clients(
    server_tx: &mpsc::UnboundedSender<ServerMessage>,
) -> (TestClient, TestClient) {
    let mut a = TestClient::connect(server_tx, 9000).await;
    let mut b = TestClient::connect(server_tx, 9001).await;

    a.send(ClientEvent::JoinGame);
    b.send(ClientEvent::JoinGame);

    let expected = ServerEvent::GameStart {
        players: vec![a.id.clone(), b.id.clone()],
        rope_position: 0.0,
    };
    assert_eq!(a.next().await, expected);
    assert_eq!(b.next().await, expected);
    (a, b)
}

/// MATCHMAKING TESTS
mod matchmaking_tests {
    use super::*;

    /// Two waiting players are paired at once and share the first question
    #[tokio::test(start_paused = true)]
    async fn two_players_are_paired() {
        let server_tx = spawn_server(GameConfig::default());
        let (mut a, mut b) = paired_clients(&server_tx).await;

        let question_a = a.next_question().await;
        let question_b = b.next_question().await;
        assert_eq!(question_a, question_b);
        assert!(solve_question(&question_a).is_some());
    }

    /// A lone player faces a synthetic opponent after the fallback wait
    #[tokio::test(start_paused = true)]
    async fn lone_player_gets_synthetic_opponent() {
        let server_tx = spawn_server(GameConfig::default());
        let mut a = TestClient::connect(&server_tx, 9000).await;

        let joined_at = tokio::time::Instant::now();
        a.send(ClientEvent::JoinGame);

        let players = match a.next().await {
            ServerEvent::GameStart {
                players,
                rope_position,
            } => {
                assert_eq!(rope_position, 0.0);
                players
            }
            other => panic!("Expected game_start, got {:?}", other),
        };
        assert!(joined_at.elapsed() > Duration::from_secs(5));
        assert_eq!(players[0], a.id);
        assert!(players[1].starts_with("AI_"));

        // The synthetic opponent answers within the round
        let synthetic_id = players[1].clone();
        a.next_question().await;
        a.next_matching(|event| {
            matches!(
                event,
                ServerEvent::PlayerAnswer { player_id, .. } if *player_id == synthetic_id
            )
        })
        .await;
    }

    /// Leaving the queue before the fallback means no match is ever started
    #[tokio::test(start_paused = true)]
    async fn disconnect_while_queued_cancels_match() {
        let server_tx = spawn_server(GameConfig::default());
        let mut a = TestClient::connect(&server_tx, 9000).await;

        a.send(ClientEvent::JoinGame);
        tokio::time::sleep(Duration::from_secs(2)).await;
        a.disconnect();
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert!(a.drain().is_empty());
    }
}

/// MATCH SESSION TESTS
mod session_tests {
    use super::*;

    /// A correct answer moves the rope and issues the next question at once
    #[tokio::test(start_paused = true)]
    async fn correct_answer_moves_rope_and_advances() {
        let server_tx = spawn_server(GameConfig::default());
        let (mut a, mut b) = paired_clients(&server_tx).await;

        let question = a.next_question().await;
        b.next_question().await;
        let answer = solve_question(&question).unwrap();
        a.send(ClientEvent::SubmitAnswer(answer.to_string()));

        assert_eq!(
            a.next().await,
            ServerEvent::PlayerAnswer {
                player_id: a.id.clone(),
                is_correct: true,
                value: answer.to_string(),
            }
        );
        match a.next().await {
            ServerEvent::RopeUpdate {
                rope_position,
                player_id,
                force,
            } => {
                assert_eq!(player_id, a.id);
                assert!(rope_position > 0.0);
                assert_eq!(rope_position, force);
            }
            other => panic!("Expected rope_update, got {:?}", other),
        }
        assert!(matches!(
            a.next().await,
            ServerEvent::AnswerResult {
                correct: true,
                force: Some(_)
            }
        ));
        assert!(matches!(a.next().await, ServerEvent::NewQuestion { .. }));

        // The opponent sees the pull but no private result
        let seen_by_b: Vec<ServerEvent> = vec![b.next().await, b.next().await, b.next().await];
        assert!(matches!(seen_by_b[0], ServerEvent::PlayerAnswer { .. }));
        assert!(matches!(seen_by_b[1], ServerEvent::RopeUpdate { .. }));
        assert!(matches!(seen_by_b[2], ServerEvent::NewQuestion { .. }));
    }

    /// Without answers the next question follows the duration plus the pause
    #[tokio::test(start_paused = true)]
    async fn unanswered_round_times_out() {
        let server_tx = spawn_server(GameConfig::default());
        let (mut a, _b) = paired_clients(&server_tx).await;

        a.next_question().await;
        let issued = tokio::time::Instant::now();
        a.next_question().await;

        let waited = issued.elapsed();
        assert!(waited >= Duration::from_secs(12));
        assert!(waited < Duration::from_millis(12_500));
    }

    /// A wrong answer is reported privately and leaves the rope alone
    #[tokio::test(start_paused = true)]
    async fn wrong_answer_is_private() {
        let server_tx = spawn_server(GameConfig::default());
        let (mut a, mut b) = paired_clients(&server_tx).await;

        let question = a.next_question().await;
        b.next_question().await;
        let wrong = solve_question(&question).unwrap() + 1;
        a.send(ClientEvent::SubmitAnswer(wrong.to_string()));

        assert!(matches!(
            a.next().await,
            ServerEvent::PlayerAnswer {
                is_correct: false,
                ..
            }
        ));
        assert_eq!(
            a.next().await,
            ServerEvent::AnswerResult {
                correct: false,
                force: None
            }
        );
        assert!(matches!(
            b.next().await,
            ServerEvent::PlayerAnswer {
                is_correct: false,
                ..
            }
        ));
        assert!(b.drain().is_empty());
    }

    /// Fast correct answers win the match; both players can then rematch
    #[tokio::test(start_paused = true)]
    async fn winning_and_rematch() {
        let server_tx = spawn_server(GameConfig::default());
        let (mut a, mut b) = paired_clients(&server_tx).await;

        let mut question = a.next_question().await;
        let game_over = loop {
            let answer = solve_question(&question).unwrap();
            a.send(ClientEvent::SubmitAnswer(answer.to_string()));

            match a
                .next_matching(|event| {
                    matches!(
                        event,
                        ServerEvent::NewQuestion { .. } | ServerEvent::GameOver { .. }
                    )
                })
                .await
            {
                ServerEvent::NewQuestion { question: next, .. } => question = next,
                over => break over,
            }
        };

        let expected = ServerEvent::GameOver {
            winner_id: a.id.clone(),
            rope_position: 100.0,
        };
        assert_eq!(game_over, expected);
        assert_eq!(
            b.next_matching(|event| matches!(event, ServerEvent::GameOver { .. }))
                .await,
            expected
        );

        // No more questions for the finished match
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(a.drain().is_empty());
        assert!(b.drain().is_empty());

        a.send(ClientEvent::Rematch);
        b.send(ClientEvent::Rematch);
        let rematch = ServerEvent::GameStart {
            players: vec![a.id.clone(), b.id.clone()],
            rope_position: 0.0,
        };
        assert_eq!(a.next().await, rematch);
        assert_eq!(b.next().await, rematch);
    }

    /// A disconnect mid-match ends it for the opponent exactly once
    #[tokio::test(start_paused = true)]
    async fn disconnect_notifies_opponent_once() {
        let server_tx = spawn_server(GameConfig::default());
        let (mut a, mut b) = paired_clients(&server_tx).await;

        a.next_question().await;
        b.next_question().await;
        a.disconnect();

        assert_eq!(b.next().await, ServerEvent::OpponentDisconnected);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(b.drain().is_empty());

        // The remaining player can queue again
        let mut c = TestClient::connect(&server_tx, 9002).await;
        b.send(ClientEvent::JoinGame);
        c.send(ClientEvent::JoinGame);
        assert!(matches!(b.next().await, ServerEvent::GameStart { .. }));
        assert!(matches!(c.next().await, ServerEvent::GameStart { .. }));
    }
}

/// WEBSOCKET TESTS
mod websocket_tests {
    use super::*;
    use futures_util::{SinkExt, StreamExt};
    use shared::{decode_event, encode_event};
    use tokio::net::TcpStream;
    use tokio_tungstenite::tungstenite::Message;
    use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

    type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

    async fn next_event(socket: &mut Socket) -> ServerEvent {
        loop {
            let frame = tokio::time::timeout(Duration::from_secs(5), socket.next())
                .await
                .expect("timed out waiting for a frame")
                .expect("socket closed")
                .expect("socket error");
            if let Message::Text(text) = frame {
                return decode_event(&text).unwrap();
            }
        }
    }

    async fn send_event(socket: &mut Socket, event: &ClientEvent) {
        socket
            .send(Message::Text(encode_event(event).unwrap()))
            .await
            .unwrap();
    }

    async fn open(addr: SocketAddr) -> (Socket, ParticipantId) {
        let (mut socket, _) = connect_async(format!("ws://{}", addr)).await.unwrap();
        match next_event(&mut socket).await {
            ServerEvent::Connected { player_id } => (socket, player_id),
            other => panic!("Expected connected, got {:?}", other),
        }
    }

    /// Two real WebSocket clients are paired and play a round
    #[tokio::test]
    async fn websocket_round_trip() {
        let mut server = Server::bind("127.0.0.1:0", GameConfig::default(), 8)
            .await
            .unwrap();
        let addr = server.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = server.run().await;
        });

        let (mut first, first_id) = open(addr).await;
        let (mut second, second_id) = open(addr).await;
        assert_ne!(first_id, second_id);

        // Garbage is dropped without closing the connection
        first
            .send(Message::Text("not an event".to_string()))
            .await
            .unwrap();

        send_event(&mut first, &ClientEvent::JoinGame).await;
        send_event(&mut second, &ClientEvent::JoinGame).await;

        let expected = ServerEvent::GameStart {
            players: vec![first_id.clone(), second_id.clone()],
            rope_position: 0.0,
        };
        assert_eq!(next_event(&mut first).await, expected);
        assert_eq!(next_event(&mut second).await, expected);

        let question = match next_event(&mut first).await {
            ServerEvent::NewQuestion { question, duration } => {
                assert_eq!(duration, 10_000);
                question
            }
            other => panic!("Expected new_question, got {:?}", other),
        };
        let answer = solve_question(&question).unwrap();
        send_event(&mut first, &ClientEvent::SubmitAnswer(answer.to_string())).await;

        assert!(matches!(
            next_event(&mut first).await,
            ServerEvent::PlayerAnswer {
                is_correct: true,
                ..
            }
        ));
        assert!(matches!(
            next_event(&mut first).await,
            ServerEvent::RopeUpdate { .. }
        ));
        match next_event(&mut first).await {
            ServerEvent::AnswerResult {
                correct: true,
                force: Some(force),
            } => assert!(force > 10.0 && force <= 15.0),
            other => panic!("Expected answer_result, got {:?}", other),
        }

        // Closing one side ends the match for the other
        first.close(None).await.unwrap();
        let ended = loop {
            let event = next_event(&mut second).await;
            if event == ServerEvent::OpponentDisconnected {
                break event;
            }
        };
        assert_eq!(ended, ServerEvent::OpponentDisconnected);
    }
}
