//! Kalshi Sports Edge Sniper
//!
//! Streams live sportsbook odds, maps games to Kalshi moneyline markets, and
//! fires limit orders when the book-implied probability beats the Kalshi YES
//! ask by a configured edge. Fills stream back over the trade socket and
//! engine state is published to Redis for dashboard consumption.
//! League-to-series mappings are loaded from `src/leagues.csv`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use ::kalshi_sniper::auth::{KalshiAuth, OddsApiConfig};
use ::kalshi_sniper::mapping::{MarketMapper, DEFAULT_MATCH_THRESHOLD};
use ::kalshi_sniper::redis_client::RedisClient;
use ::kalshi_sniper::sniper::{self, SniperConfig};
use ::kalshi_sniper::trading_apis::KalshiClient;
use ::kalshi_sniper::types::{FillUpdate, OddsEvent, TradingEnvironment};
use ::kalshi_sniper::websockets::{kalshi_fills, odds_feed};

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Path to the league CSV file
const LEAGUES_CSV_PATH: &str = "src/leagues.csv";

/// Reconnect delay after disconnection (seconds)
const RECONNECT_DELAY_SECS: u64 = 5;

/// Starting bankroll (dollars)
const BANKROLL: f64 = 26.00;

/// Hard cap on any single snipe (dollars)
const MAX_RISK_PER_TRADE: f64 = 2.00;

/// Minimum edge (probability points) to fire
const MIN_EDGE: f64 = 0.02;

/// Fractional-Kelly multiplier for stake sizing
const KELLY_MULTIPLIER: f64 = 1.0;

/// Minimum resting contracts at the YES ask
const MIN_LIQUIDITY: i64 = 10;

/// Sportsbooks sharp enough to trust as the true line
const SHARP_BOOKS: &[&str] = &["draftkings", "fanduel", "pinnacle"];

/// Seconds between engine status lines
const STATUS_INTERVAL_SECS: u64 = 30;

/// Record signals without placing orders (DANGER: real money when false
/// and KALSHI_ENV is not DEMO)
const DRY_RUN: bool = false;

/// Enable Redis publishing (set to false to run without Redis)
const ENABLE_REDIS: bool = true;

/// Enable the fill monitor socket
const ENABLE_FILLS: bool = true;

// =============================================================================
// LEAGUE CONFIG FROM CSV
// =============================================================================

/// A row from the league CSV - one sport on the odds feed mapped to the
/// Kalshi series carrying its moneyline markets.
#[derive(Debug, Clone, Deserialize)]
pub struct LeagueConfig {
    /// Sport key on the odds feed
    pub sport_key: String,
    /// Kalshi series ticker
    pub series_ticker: String,
}

/// Load league configurations from CSV file
fn load_leagues_from_csv<P: AsRef<Path>>(path: P) -> Result<Vec<LeagueConfig>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open leagues CSV: {}", path.display()))?;

    let mut leagues = Vec::new();
    for result in reader.deserialize() {
        let record: LeagueConfig = result.context("Failed to parse league row")?;
        leagues.push(record);
    }

    Ok(leagues)
}

// =============================================================================
// MAIN
// =============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("kalshi_sniper=info".parse().unwrap())
                .add_directive("tokio_tungstenite=warn".parse().unwrap()),
        )
        .with_target(false)
        .init();

    let env = TradingEnvironment::from_env();
    let leagues = load_leagues_from_csv(LEAGUES_CSV_PATH)?;

    info!("========================================");
    info!("  Kalshi Sports Edge Sniper");
    info!("========================================");
    info!("  Environment: {}", env);
    info!("  Leagues:     {}", leagues.len());
    for league in &leagues {
        info!("    {} -> {}", league.sport_key, league.series_ticker);
    }
    info!("  Min edge:    {:.1}%", MIN_EDGE * 100.0);
    info!("  Max risk:    ${:.2}/trade", MAX_RISK_PER_TRADE);
    info!("  Sharp books: {}", SHARP_BOOKS.join(", "));
    if DRY_RUN {
        info!("  Mode:        DRY RUN (no orders placed)");
    } else if env == TradingEnvironment::Production {
        warn!("  Mode:        *** PRODUCTION - REAL MONEY ***");
    }
    info!("========================================");

    // Connect to Redis (if enabled)
    let redis: Option<Arc<RedisClient>> = if ENABLE_REDIS {
        match RedisClient::from_env().await {
            Ok(client) => {
                info!("[REDIS] Connected");
                Some(Arc::new(client))
            }
            Err(e) => {
                warn!("[REDIS] Failed to connect: {}. Continuing without Redis.", e);
                None
            }
        }
    } else {
        None
    };

    // Load credentials
    let kalshi_auth = KalshiAuth::from_env().context("Failed to load Kalshi credentials")?;
    info!(
        "[KALSHI] Loaded credentials: {}...",
        &kalshi_auth.key_id[..8.min(kalshi_auth.key_id.len())]
    );
    let odds_config = OddsApiConfig::from_env().context("Failed to load odds feed credentials")?;

    // Verify REST connectivity before spawning anything
    let client = Arc::new(KalshiClient::new(kalshi_auth.clone(), env));
    let balance = client
        .get_balance()
        .await
        .context("Failed to connect to Kalshi API")?;
    info!(
        "[KALSHI] Connected! Balance: ${:.2}",
        balance.balance as f64 / 100.0
    );

    // Preload the market mapper
    info!("[MAPPER] Loading market mappings...");
    let series: Vec<String> = leagues.iter().map(|l| l.series_ticker.clone()).collect();
    let mut mapper = MarketMapper::new(DEFAULT_MATCH_THRESHOLD);
    mapper
        .preload(&client, &series)
        .await
        .context("Failed to preload market mappings")?;
    if mapper.is_empty() {
        warn!("[MAPPER] No open markets found - check the series tickers in {}", LEAGUES_CSV_PATH);
    }
    let mapper = Arc::new(mapper);

    // Channels: odds feed -> engine, fill monitor -> engine
    let (odds_tx, odds_rx) = mpsc::channel::<OddsEvent>(100);
    let (fill_tx, fill_rx) = mpsc::channel::<FillUpdate>(100);

    let mut handles = vec![];

    // --- Spawn Odds Feed ---
    let sharp_books: Vec<String> = SHARP_BOOKS.iter().map(|s| s.to_string()).collect();
    let feed_config = odds_config.clone();
    let feed_books = sharp_books.clone();
    let feed_handle = tokio::spawn(async move {
        if let Err(e) = odds_feed::run(&feed_config, &feed_books, RECONNECT_DELAY_SECS, odds_tx).await
        {
            error!("[ODDS] Feed stopped: {}", e);
        }
    });
    handles.push(feed_handle);

    // --- Spawn Fill Monitor ---
    if ENABLE_FILLS {
        let auth = kalshi_auth.clone();
        let fill_handle = tokio::spawn(async move {
            loop {
                match kalshi_fills::run(&auth, env, fill_tx.clone()).await {
                    Ok(()) => info!("[FILLS] Socket closed"),
                    Err(e) => error!("[FILLS] Socket error: {}", e),
                }
                info!("[FILLS] Reconnecting in {}s...", RECONNECT_DELAY_SECS);
                tokio::time::sleep(Duration::from_secs(RECONNECT_DELAY_SECS)).await;
            }
        });
        handles.push(fill_handle);
    } else {
        drop(fill_tx);
    }

    // --- Spawn Sniper Engine ---
    let engine_config = SniperConfig {
        bankroll: BANKROLL,
        max_risk_per_trade: MAX_RISK_PER_TRADE,
        min_edge: MIN_EDGE,
        kelly_multiplier: KELLY_MULTIPLIER,
        min_liquidity: MIN_LIQUIDITY,
        target_books: sharp_books,
        dry_run: DRY_RUN,
        status_interval_secs: STATUS_INTERVAL_SECS,
    };
    let engine_client = client.clone();
    let engine_mapper = mapper.clone();
    let engine_redis = redis.clone();
    let engine_handle = tokio::spawn(async move {
        sniper::run(
            engine_config,
            engine_client,
            engine_mapper,
            engine_redis,
            odds_rx,
            fill_rx,
        )
        .await;
    });
    handles.push(engine_handle);

    info!("[MAIN] All tasks running ({} markets mapped)", mapper.len());

    for handle in handles {
        let _ = handle.await;
    }

    Ok(())
}
