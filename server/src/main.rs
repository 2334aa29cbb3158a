use clap::Parser;
use env_logger::Env;
use log::{error, info};
use server::config::{GameConfig, SyntheticConfig};
use server::network::{Server, ServerMessage};
use shared::{
    parse_probability, DEFAULT_MAX_FORCE, DEFAULT_PORT, MATCHMAKING_FALLBACK_MS,
    MATCHMAKING_TICK_MS, QUESTION_DURATION_MS, SYNTHETIC_ACCURACY,
};
use std::time::Duration;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: String,
    /// Server port to listen on
    #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT)]
    port: u16,
    /// Maximum number of simultaneous connections
    #[arg(long, default_value_t = 1024)]
    max_clients: usize,
    /// Time allowed per question in milliseconds
    #[arg(long, default_value_t = QUESTION_DURATION_MS)]
    question_duration_ms: u64,
    /// Force awarded for an instant correct answer
    #[arg(long, default_value_t = DEFAULT_MAX_FORCE)]
    max_force: f64,
    /// Probability that the synthetic opponent answers correctly
    #[arg(long, default_value_t = SYNTHETIC_ACCURACY, value_parser = parse_probability)]
    ai_accuracy: f64,
    /// Seconds a lone player waits before facing a synthetic opponent
    #[arg(long, default_value_t = MATCHMAKING_FALLBACK_MS / 1_000)]
    ai_fallback_secs: u64,
    /// Matchmaking pass interval in milliseconds
    #[arg(long, default_value_t = MATCHMAKING_TICK_MS)]
    tick_ms: u64,
}

impl Args {
    fn game_config(&self) -> GameConfig {
        GameConfig {
            question_duration: Duration::from_millis(self.question_duration_ms),
            max_force: self.max_force,
            matchmaking_fallback: Duration::from_secs(self.ai_fallback_secs),
            matchmaking_tick: Duration::from_millis(self.tick_ms.max(1)),
            synthetic: SyntheticConfig {
                accuracy: self.ai_accuracy,
                ..SyntheticConfig::default()
            },
            ..GameConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = args.game_config();
    info!("Game config: {:?}", config);

    let address = format!("{}:{}", args.host, args.port);
    let mut server = Server::bind(&address, config, args.max_clients).await?;
    let shutdown_tx = server.sender();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, shutting down gracefully...");
            if shutdown_tx.send(ServerMessage::Shutdown).is_err() {
                error!("Server loop already stopped");
            }
        }
    });

    server.run().await?;

    Ok(())
}
