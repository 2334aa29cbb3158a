use clap::Parser;
use client::network::{AnswerMode, BotConfig, Client, DEFAULT_BOT_ACCURACY};
use env_logger::Env;
use log::info;
use shared::parse_probability;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server URL to connect to
    #[arg(short = 's', long, default_value = "ws://127.0.0.1:3001")]
    server: String,

    /// Answer questions automatically instead of reading stdin
    #[arg(short = 'b', long)]
    bot: bool,

    /// Probability that the bot answers correctly
    #[arg(long, default_value_t = DEFAULT_BOT_ACCURACY, value_parser = parse_probability)]
    accuracy: f64,

    /// Shortest bot thinking time in milliseconds
    #[arg(long, default_value = "500")]
    min_delay_ms: u64,

    /// Longest bot thinking time in milliseconds
    #[arg(long, default_value = "3000")]
    max_delay_ms: u64,

    /// Queue for another match when one ends
    #[arg(short = 'r', long)]
    rematch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mode = if args.bot {
        info!(
            "Bot mode: accuracy {:.2}, delay {}-{}ms",
            args.accuracy, args.min_delay_ms, args.max_delay_ms
        );
        AnswerMode::Bot(BotConfig::new(
            args.accuracy,
            Duration::from_millis(args.min_delay_ms),
            Duration::from_millis(args.max_delay_ms),
        ))
    } else {
        AnswerMode::Manual
    };

    let mut client = Client::new(&args.server, mode, args.rematch);
    client.run().await?;

    Ok(())
}
