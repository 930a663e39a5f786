//! Kalshi REST API smoke test.
//!
//! Run with: cargo run --bin test_kalshi_api -- --market <TICKER>
//!
//! Checks the trade API by:
//! 1. Getting account balance
//! 2. Fetching the market orderbook
//! 3. Optionally (--fire) placing a 1 cent limit order and cancelling it
//!
//! Environment:
//!   KALSHI_ENV, KALSHI_API_KEY, KALSHI_KEY_ID, KALSHI_PRIVATE_KEY_B64

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use ::kalshi_sniper::auth::KalshiAuth;
use ::kalshi_sniper::trading_apis::KalshiClient;
use ::kalshi_sniper::types::{CreateOrderRequest, OrderSide, TradingEnvironment};

/// Test order price (very low so it won't fill)
const TEST_ORDER_PRICE_CENTS: i64 = 1;

/// Test order quantity
const TEST_ORDER_COUNT: i64 = 1;

#[derive(Parser, Debug)]
#[command(name = "test_kalshi_api")]
#[command(about = "Exercise the Kalshi REST API")]
struct Args {
    /// Market ticker to test with
    #[arg(long, default_value = "KXNBAGAME-26JAN15CHALAL-LAL")]
    market: String,

    /// Place (and cancel) a 1 cent test order
    #[arg(long)]
    fire: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("kalshi_sniper=debug".parse().unwrap())
                .add_directive("test_kalshi_api=info".parse().unwrap()),
        )
        .with_target(false)
        .init();

    let args = Args::parse();
    let env = TradingEnvironment::from_env();

    info!("========================================");
    info!("  Kalshi API Test");
    info!("========================================");
    info!("  Environment: {}", env);
    info!("  Market:      {}", args.market);
    info!("========================================");

    // Load credentials
    let auth = KalshiAuth::from_env().context("Failed to load Kalshi credentials")?;
    info!(
        "Loaded credentials: {}...",
        &auth.key_id[..8.min(auth.key_id.len())]
    );

    let client = KalshiClient::new(auth, env);

    // --- Test 1: Get Balance ---
    info!("\n[TEST 1] Getting account balance...");
    let balance = client.get_balance().await.context("Failed to get balance")?;
    info!("  Balance: ${:.2}", balance.balance as f64 / 100.0);

    // --- Test 2: Fetch Orderbook ---
    info!("\n[TEST 2] Fetching orderbook...");
    match client.get_yes_ask(&args.market).await? {
        Some(ask) => info!("  YES ask: {}¢ x {}", ask.price_cents, ask.quantity),
        None => info!("  No YES liquidity on {}", args.market),
    }

    if !args.fire {
        info!("\nSkipping order test (pass --fire to place a 1¢ test order)");
        return Ok(());
    }

    // --- Test 3: Place and Cancel Test Order ---
    info!("\n[TEST 3] Placing test order...");
    info!(
        "  Order: BUY YES @ {}¢ x {} on {}",
        TEST_ORDER_PRICE_CENTS, TEST_ORDER_COUNT, args.market
    );

    let request = CreateOrderRequest::snipe_buy(
        &args.market,
        OrderSide::Yes,
        TEST_ORDER_PRICE_CENTS,
        TEST_ORDER_COUNT,
    );
    let order = client
        .create_order(request)
        .await
        .context("Failed to create order")?;
    info!("  Order created!");
    info!("    ID: {}", order.order_id);
    info!("    Status: {:?}", order.status);

    info!("\n[TEST 4] Cancelling order...");
    client
        .cancel_order(&order.order_id)
        .await
        .context("Failed to cancel order")?;
    info!("  Order cancelled!");

    let remaining = client
        .get_orders(Some(&args.market))
        .await
        .context("Failed to get orders")?;
    info!("  Orders remaining for {}: {}", args.market, remaining.len());

    info!("\n========================================");
    info!("  All tests passed!");
    info!("========================================");

    Ok(())
}
