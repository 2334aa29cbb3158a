use crate::game::{solve_question, ClientMatchState};
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::{decode_event, encode_event, ClientEvent, ServerEvent};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

pub const DEFAULT_BOT_ACCURACY: f64 = 0.8;

/// Automatic answering behaviour for `--bot` mode
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub accuracy: f64,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl BotConfig {
    pub fn new(accuracy: f64, min_delay: Duration, max_delay: Duration) -> Self {
        let (min_delay, max_delay) = if min_delay <= max_delay {
            (min_delay, max_delay)
        } else {
            (max_delay, min_delay)
        };
        Self {
            accuracy: if accuracy.is_finite() {
                accuracy.clamp(0.0, 1.0)
            } else {
                DEFAULT_BOT_ACCURACY
            },
            min_delay,
            max_delay,
        }
    }
}

#[derive(Debug, Clone)]
pub enum AnswerMode {
    /// Answers are typed on stdin, one per line
    Manual,
    Bot(BotConfig),
}

/// What the client should do after an event from the server
#[derive(Debug, Clone, PartialEq)]
pub enum Reaction {
    None,
    Send(ClientEvent),
    /// Submit `answer` after `delay` if question `seq` is still current
    ScheduleAnswer {
        seq: u64,
        delay: Duration,
        answer: String,
    },
    Quit,
}

/// Input arriving from outside the socket
#[derive(Debug)]
enum Command {
    Typed(String),
    BotAnswer { seq: u64, answer: String },
    InputClosed,
}

/// Decision logic of the client, kept apart from the socket so it can be
/// driven directly.
pub struct Controller {
    state: ClientMatchState,
    mode: AnswerMode,
    rematch: bool,
    rng: StdRng,
}

impl Controller {
    pub fn new(mode: AnswerMode, rematch: bool) -> Self {
        Self::with_rng(mode, rematch, StdRng::from_entropy())
    }

    pub fn with_rng(mode: AnswerMode, rematch: bool, rng: StdRng) -> Self {
        Self {
            state: ClientMatchState::new(),
            mode,
            rematch,
            rng,
        }
    }

    pub fn state(&self) -> &ClientMatchState {
        &self.state
    }

    pub fn handle_event(&mut self, event: &ServerEvent) -> Reaction {
        self.state.apply(event);
        if let Some(line) = self.state.describe(event) {
            println!("{}", line);
        }

        match event {
            ServerEvent::NewQuestion { question, .. } => self.plan_bot_answer(question),
            ServerEvent::GameOver { .. } => {
                if self.rematch {
                    Reaction::Send(ClientEvent::Rematch)
                } else {
                    Reaction::Quit
                }
            }
            ServerEvent::OpponentDisconnected => {
                if self.rematch {
                    Reaction::Send(ClientEvent::JoinGame)
                } else {
                    Reaction::Quit
                }
            }
            _ => Reaction::None,
        }
    }

    fn plan_bot_answer(&mut self, question: &str) -> Reaction {
        let AnswerMode::Bot(bot) = &self.mode else {
            return Reaction::None;
        };

        let Some(correct) = solve_question(question) else {
            warn!("Could not solve question: {}", question);
            return Reaction::None;
        };

        let answer = if self.rng.gen_bool(bot.accuracy) {
            correct
        } else {
            correct + 1
        };
        let delay_ms = self
            .rng
            .gen_range(bot.min_delay.as_millis() as u64..=bot.max_delay.as_millis() as u64);

        Reaction::ScheduleAnswer {
            seq: self.state.question_seq,
            delay: Duration::from_millis(delay_ms),
            answer: answer.to_string(),
        }
    }

    /// A typed line becomes an answer only while a question is open
    pub fn typed_answer(&self, line: &str) -> Option<ClientEvent> {
        let answer = line.trim();
        if answer.is_empty() || !self.state.in_match || self.state.question.is_none() {
            return None;
        }
        Some(ClientEvent::SubmitAnswer(answer.to_string()))
    }

    /// A scheduled bot answer is dropped if the question has moved on
    pub fn bot_answer(&self, seq: u64, answer: String) -> Option<ClientEvent> {
        if !self.state.in_match || seq != self.state.question_seq {
            debug!("Dropping stale answer for question {}", seq);
            return None;
        }
        Some(ClientEvent::SubmitAnswer(answer))
    }
}

pub struct Client {
    server_url: String,
    controller: Controller,
}

impl Client {
    pub fn new(server_url: &str, mode: AnswerMode, rematch: bool) -> Self {
        Self {
            server_url: server_url.to_string(),
            controller: Controller::new(mode, rematch),
        }
    }

    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        info!("Connecting to {}...", self.server_url);
        let (socket, _) = connect_async(self.server_url.as_str()).await?;
        let (mut write, mut read) = socket.split();

        let (command_tx, mut command_rx) = mpsc::unbounded_channel::<Command>();
        if matches!(self.controller.mode, AnswerMode::Manual) {
            spawn_stdin_reader(command_tx.clone());
            println!("Type answers and press Enter");
        }

        write
            .send(Message::Text(encode_event(&ClientEvent::JoinGame)?))
            .await?;
        println!("Waiting for an opponent...");

        loop {
            let outgoing = tokio::select! {
                frame = read.next() => {
                    let Some(frame) = frame else {
                        info!("Server closed the connection");
                        break;
                    };
                    match frame? {
                        Message::Text(text) => match decode_event::<ServerEvent>(&text) {
                            Ok(event) => match self.controller.handle_event(&event) {
                                Reaction::None => None,
                                Reaction::Send(event) => Some(event),
                                Reaction::ScheduleAnswer { seq, delay, answer } => {
                                    let tx = command_tx.clone();
                                    tokio::spawn(async move {
                                        sleep(delay).await;
                                        let _ = tx.send(Command::BotAnswer { seq, answer });
                                    });
                                    None
                                }
                                Reaction::Quit => break,
                            },
                            Err(e) => {
                                warn!("Ignoring malformed event: {}", e);
                                None
                            }
                        },
                        Message::Close(_) => {
                            info!("Server closed the connection");
                            break;
                        }
                        _ => None,
                    }
                },

                Some(command) = command_rx.recv() => match command {
                    Command::Typed(line) => self.controller.typed_answer(&line),
                    Command::BotAnswer { seq, answer } => self.controller.bot_answer(seq, answer),
                    Command::InputClosed => break,
                },
            };

            if let Some(event) = outgoing {
                if let Err(e) = write.send(Message::Text(encode_event(&event)?)).await {
                    error!("Error sending event: {}", e);
                    break;
                }
            }
        }

        let _ = write.send(Message::Close(None)).await;
        Ok(())
    }
}

fn spawn_stdin_reader(command_tx: mpsc::UnboundedSender<Command>) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if command_tx.send(Command::Typed(line)).is_err() {
                        break;
                    }
                }
                Ok(None) => {
                    let _ = command_tx.send(Command::InputClosed);
                    break;
                }
                Err(e) => {
                    error!("Error reading stdin: {}", e);
                    let _ = command_tx.send(Command::InputClosed);
                    break;
                }
            }
        }
    });
}
