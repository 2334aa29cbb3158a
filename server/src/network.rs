//! Server network layer handling WebSocket connections and the event loop

use crate::client_manager::ClientManager;
use crate::config::GameConfig;
use crate::matchmaker::{Matchmaker, Pairing};
use crate::participant::Connection;
use crate::registry::SessionRegistry;
use crate::timers::{Scheduler, SessionTimer};
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use shared::{decode_event, encode_event, ClientEvent, ParticipantId, ServerEvent};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval, MissedTickBehavior};
use tokio_tungstenite::tungstenite::Message;

type ConnectionError = Box<dyn std::error::Error + Send + Sync>;

/// Messages processed by the main server loop, one at a time
#[derive(Debug)]
pub enum ServerMessage {
    /// A WebSocket handshake completed; the loop answers with the assigned id,
    /// or `None` when the server is full
    ClientConnected {
        addr: SocketAddr,
        connection: Connection,
        reply: oneshot::Sender<Option<ParticipantId>>,
    },
    ClientEvent {
        client_id: ParticipantId,
        event: ClientEvent,
    },
    ClientDisconnected {
        client_id: ParticipantId,
    },
    SessionTimer {
        session_id: String,
        round: u64,
        timer: SessionTimer,
    },
    Shutdown,
}

/// Main server coordinating connections, matchmaking and match sessions
pub struct Server {
    listener: Option<TcpListener>,
    local_addr: Option<SocketAddr>,
    clients: ClientManager,
    matchmaker: Matchmaker,
    sessions: SessionRegistry,
    tick_duration: Duration,

    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
}

impl Server {
    /// Creates a server without a listener. Connections can still be fed in
    /// through [`Server::sender`].
    pub fn new(config: GameConfig, max_clients: usize) -> Self {
        let (server_tx, server_rx) = mpsc::unbounded_channel();
        let scheduler = Scheduler::new(server_tx.clone());

        Server {
            listener: None,
            local_addr: None,
            clients: ClientManager::new(max_clients),
            matchmaker: Matchmaker::new(&config),
            tick_duration: config.matchmaking_tick,
            sessions: SessionRegistry::new(config, scheduler),
            server_tx,
            server_rx,
        }
    }

    pub async fn bind(
        addr: &str,
        config: GameConfig,
        max_clients: usize,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        info!("Server listening on {}", local_addr);

        let mut server = Self::new(config, max_clients);
        server.listener = Some(listener);
        server.local_addr = Some(local_addr);
        Ok(server)
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    pub fn sender(&self) -> mpsc::UnboundedSender<ServerMessage> {
        self.server_tx.clone()
    }

    pub fn clients(&self) -> &ClientManager {
        &self.clients
    }

    pub fn matchmaker(&self) -> &Matchmaker {
        &self.matchmaker
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Spawns the task accepting new TCP connections
    fn spawn_acceptor(&mut self) {
        let Some(listener) = self.listener.take() else {
            return;
        };
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((stream, addr)) => {
                        let server_tx = server_tx.clone();
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream, addr, server_tx).await {
                                warn!("Connection from {} failed: {}", addr, e);
                            }
                        });
                    }
                    Err(e) => {
                        error!("Error accepting connection: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    /// Main server loop. Every message and matchmaker tick is handled to
    /// completion before the next one is looked at.
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.spawn_acceptor();

        let mut tick_interval = interval(self.tick_duration);
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!("Server started successfully");

        loop {
            tokio::select! {
                message = self.server_rx.recv() => {
                    match message {
                        Some(message) => {
                            if !self.handle_message(message) {
                                break;
                            }
                        }
                        None => break,
                    }
                },

                _ = tick_interval.tick() => {
                    self.tick();
                },
            }
        }

        Ok(())
    }

    /// Applies one message to the server state. Returns false on shutdown.
    pub fn handle_message(&mut self, message: ServerMessage) -> bool {
        match message {
            ServerMessage::ClientConnected {
                addr,
                connection,
                reply,
            } => {
                let Some(client_id) = self.clients.add_client(addr, connection.clone()) else {
                    warn!("Server full, rejecting {}", addr);
                    let _ = reply.send(None);
                    return true;
                };
                if reply.send(Some(client_id.clone())).is_err() {
                    // Connection task went away during registration
                    self.clients.remove_client(&client_id);
                    return true;
                }
                let _ = connection.send(ServerEvent::Connected {
                    player_id: client_id,
                });
            }
            ServerMessage::ClientEvent { client_id, event } => {
                self.handle_client_event(&client_id, event);
            }
            ServerMessage::ClientDisconnected { client_id } => {
                self.handle_disconnect(&client_id);
            }
            ServerMessage::SessionTimer {
                session_id,
                round,
                timer,
            } => {
                self.sessions.handle_timer(&session_id, round, timer);
            }
            ServerMessage::Shutdown => {
                info!("Server shutting down");
                return false;
            }
        }

        true
    }

    fn handle_client_event(&mut self, client_id: &str, event: ClientEvent) {
        match event {
            ClientEvent::JoinGame | ClientEvent::Rematch => self.join_queue(client_id),
            ClientEvent::SubmitAnswer(answer) => {
                let outcome = self.sessions.submit_answer(client_id, &answer);
                debug!("Answer {:?} from {}: {:?}", answer, client_id, outcome);
            }
        }
    }

    fn join_queue(&mut self, client_id: &str) {
        if self.sessions.contains_participant(client_id) {
            warn!("{} asked to join while still in a match", client_id);
            return;
        }
        let Some(participant) = self.clients.participant(client_id) else {
            warn!("Join request from unknown client {}", client_id);
            return;
        };

        let pairings = self.matchmaker.enqueue(participant);
        self.start_matches(pairings);
    }

    fn handle_disconnect(&mut self, client_id: &str) {
        self.clients.remove_client(client_id);
        if self.matchmaker.dequeue(client_id) {
            debug!("Removed {} from queue", client_id);
        }
        self.sessions.abandon(client_id);
    }

    /// Periodic matchmaking pass
    pub fn tick(&mut self) {
        let pairings = self.matchmaker.tick();
        self.start_matches(pairings);
    }

    fn start_matches(&mut self, pairings: Vec<Pairing>) {
        for pairing in pairings {
            self.sessions.create_session(pairing.first, pairing.second);
        }
    }
}

/// Drives one WebSocket connection: registers it with the server loop, then
/// forwards decoded client events inward and server events outward until
/// either side closes.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    server_tx: mpsc::UnboundedSender<ServerMessage>,
) -> Result<(), ConnectionError> {
    let ws_stream = tokio_tungstenite::accept_async(stream).await?;
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<ServerEvent>();
    let (reply_tx, reply_rx) = oneshot::channel();
    server_tx
        .send(ServerMessage::ClientConnected {
            addr,
            connection: event_tx,
            reply: reply_tx,
        })
        .map_err(|_| "server loop is not running")?;

    let Some(client_id) = reply_rx.await? else {
        let _ = ws_sender.send(Message::Close(None)).await;
        return Ok(());
    };

    loop {
        tokio::select! {
            outbound = event_rx.recv() => {
                let Some(event) = outbound else { break };
                match encode_event(&event) {
                    Ok(text) => {
                        if let Err(e) = ws_sender.send(Message::Text(text)).await {
                            debug!("Send to {} failed: {}", client_id, e);
                            break;
                        }
                    }
                    Err(e) => error!("Failed to encode {:?}: {}", event, e),
                }
            },

            inbound = ws_receiver.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => match decode_event::<ClientEvent>(&text) {
                        Ok(event) => {
                            let message = ServerMessage::ClientEvent {
                                client_id: client_id.clone(),
                                event,
                            };
                            if server_tx.send(message).is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!("Malformed event from {}: {}", client_id, e),
                    },
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!("Receive from {} failed: {}", client_id, e);
                        break;
                    }
                }
            },
        }
    }

    let _ = server_tx.send(ServerMessage::ClientDisconnected { client_id });
    Ok(())
}
