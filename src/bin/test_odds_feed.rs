//! Odds feed smoke test.
//!
//! Connects to the odds socket and counts events as they arrive.
//!
//! Usage:
//!   cargo run --bin test_odds_feed
//!   cargo run --bin test_odds_feed -- --books draftkings,pinnacle
//!
//! Environment:
//!   ODDS_API_KEY - odds feed credential

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::info;

use ::kalshi_sniper::auth::OddsApiConfig;
use ::kalshi_sniper::types::OddsEvent;
use ::kalshi_sniper::websockets::odds_feed;

#[derive(Parser, Debug)]
#[command(name = "test_odds_feed")]
#[command(about = "Stream the odds socket and count events")]
struct Args {
    /// Comma-separated sharp book filter
    #[arg(long, default_value = "draftkings,fanduel,pinnacle")]
    books: String,

    /// Reconnect delay in seconds
    #[arg(long, default_value_t = 5)]
    reconnect_delay: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("kalshi_sniper=info".parse().unwrap())
                .add_directive("tokio_tungstenite=warn".parse().unwrap()),
        )
        .with_target(false)
        .init();

    let args = Args::parse();
    let books: Vec<String> = args
        .books
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();

    info!("========================================");
    info!("  Odds Feed Test");
    info!("========================================");
    info!("  Books: {}", books.join(", "));
    info!("========================================");

    let config = OddsApiConfig::from_env().context("Failed to load odds feed credentials")?;

    let (sender, mut receiver) = mpsc::channel::<OddsEvent>(100);

    // Event counter task
    let counter_task = tokio::spawn(async move {
        let mut count = 0u64;
        while let Some(event) = receiver.recv().await {
            count += 1;
            info!(
                "[COUNTER] {} events (latest: {} vs {})",
                count,
                event.home_team.as_deref().unwrap_or("?"),
                event.away_team.as_deref().unwrap_or("?"),
            );
        }
        count
    });

    info!("Connecting to odds socket...");
    if let Err(e) = odds_feed::run(&config, &books, args.reconnect_delay, sender).await {
        info!("Feed stopped: {}", e);
    }

    let count = counter_task.await.unwrap_or(0);
    info!("Done. {} events received", count);
    Ok(())
}
