//! The sniper engine: sportsbook odds in, Kalshi limit orders out.
//!
//! Consumes odds events from the feed queue, maps the home team to a Kalshi
//! market, prices the edge against the live YES ask, and fires a limit order
//! when the edge clears the configured floor. Fills stream back in from the
//! trade socket and update bankroll state.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::mapping::MarketMapper;
use crate::pricing;
use crate::redis_client::RedisClient;
use crate::trading_apis::KalshiClient;
use crate::types::{
    CreateOrderRequest, EngineStatus, FillUpdate, OddsEvent, OrderAction, OrderSide, SnipeSignal,
    H2H_MARKET,
};

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Sniper engine configuration
#[derive(Debug, Clone)]
pub struct SniperConfig {
    /// Starting bankroll in dollars
    pub bankroll: f64,

    /// Hard cap on the stake of any single snipe (dollars)
    pub max_risk_per_trade: f64,

    /// Minimum edge (probability points) required to fire
    pub min_edge: f64,

    /// Fractional-Kelly multiplier for stake sizing (1.0 = full Kelly)
    pub kelly_multiplier: f64,

    /// Minimum resting quantity at the YES ask to take it
    pub min_liquidity: i64,

    /// Sportsbooks whose odds count as the true line
    pub target_books: Vec<String>,

    /// Record signals without placing orders
    pub dry_run: bool,

    /// Seconds between status summary lines
    pub status_interval_secs: u64,
}

impl Default for SniperConfig {
    fn default() -> Self {
        Self {
            bankroll: 26.0,
            max_risk_per_trade: 2.0,
            min_edge: 0.02,
            kelly_multiplier: 1.0,
            min_liquidity: 10,
            target_books: vec![
                "draftkings".to_string(),
                "fanduel".to_string(),
                "pinnacle".to_string(),
            ],
            dry_run: false,
            status_interval_secs: 30,
        }
    }
}

// =============================================================================
// STATE
// =============================================================================

/// Mutable engine state, owned by the run loop.
#[derive(Debug)]
pub struct SniperState {
    pub bankroll: f64,
    pub signals_fired: u64,
    pub fills: u64,
    /// Dollars committed to buy fills
    pub open_cost: f64,
}

impl SniperState {
    pub fn new(bankroll: f64) -> Self {
        Self {
            bankroll,
            signals_fired: 0,
            fills: 0,
            open_cost: 0.0,
        }
    }

    pub fn record_signal(&mut self) {
        self.signals_fired += 1;
    }

    /// Apply a fill: buys commit bankroll, sells release it.
    pub fn record_fill(&mut self, fill: &FillUpdate) {
        self.fills += 1;
        let cost = fill.cost_dollars();
        match fill.action {
            OrderAction::Buy => {
                self.bankroll -= cost;
                self.open_cost += cost;
            }
            OrderAction::Sell => {
                self.bankroll += cost;
                self.open_cost = (self.open_cost - cost).max(0.0);
            }
        }
    }

    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            bankroll: self.bankroll,
            signals_fired: self.signals_fired,
            fills: self.fills,
            open_cost: self.open_cost,
            timestamp: Utc::now(),
        }
    }
}

// =============================================================================
// PRICING HELPERS
// =============================================================================

/// Book-implied win probability for the home side.
///
/// De-vigs when the opposing price is known, otherwise falls back to the raw
/// implied probability (which still carries the book's margin).
pub fn true_probability(home_price: f64, away_price: Option<f64>) -> f64 {
    match away_price {
        Some(away) => pricing::devig_two_way(home_price, away).0,
        None => pricing::american_to_implied_prob(home_price),
    }
}

/// Contracts to buy for a detected edge: fractional-Kelly stake capped by the
/// per-trade risk limit, floored to whole contracts.
pub fn size_snipe(config: &SniperConfig, bankroll: f64, edge: f64, price_cents: i64) -> i64 {
    let price_prob = price_cents as f64 / 100.0;
    let payout = pricing::binary_payout(price_prob);
    let stake = pricing::kelly_bet_size(bankroll, edge, payout, config.kelly_multiplier)
        .min(config.max_risk_per_trade);
    pricing::contracts_for_stake(stake, price_cents)
}

// =============================================================================
// ENGINE LOOP
// =============================================================================

/// Run the sniper engine until the odds feed closes.
pub async fn run(
    config: SniperConfig,
    client: Arc<KalshiClient>,
    mapper: Arc<MarketMapper>,
    redis: Option<Arc<RedisClient>>,
    mut odds_rx: mpsc::Receiver<OddsEvent>,
    mut fill_rx: mpsc::Receiver<FillUpdate>,
) {
    let mut state = SniperState::new(config.bankroll);
    let mut status_interval = tokio::time::interval(Duration::from_secs(config.status_interval_secs));
    let mut fills_open = true;

    info!(
        "[SNIPER] Started (min_edge={:.1}%, max_risk=${:.2}, dry_run={})",
        config.min_edge * 100.0,
        config.max_risk_per_trade,
        config.dry_run
    );

    loop {
        tokio::select! {
            maybe_event = odds_rx.recv() => {
                match maybe_event {
                    Some(event) => {
                        handle_odds(&config, &client, &mapper, redis.as_deref(), &mut state, event)
                            .await;
                    }
                    None => {
                        info!("[SNIPER] Odds queue closed, stopping");
                        break;
                    }
                }
            }
            maybe_fill = fill_rx.recv(), if fills_open => {
                match maybe_fill {
                    Some(fill) => handle_fill(redis.as_deref(), &mut state, &fill),
                    None => fills_open = false,
                }
            }
            _ = status_interval.tick() => {
                info!(
                    "[SNIPER] bankroll=${:.2} | signals={} | fills={} | committed=${:.2}",
                    state.bankroll, state.signals_fired, state.fills, state.open_cost
                );
                if let Some(redis) = &redis {
                    if let Ok(json) = serde_json::to_string(&state.status()) {
                        redis.publish_engine_state(json);
                    }
                }
            }
        }
    }
}

/// Evaluate one odds event, firing at most one order per sharp book.
async fn handle_odds(
    config: &SniperConfig,
    client: &Arc<KalshiClient>,
    mapper: &MarketMapper,
    redis: Option<&RedisClient>,
    state: &mut SniperState,
    event: OddsEvent,
) {
    let Some(home_team) = event.home_team.as_deref() else {
        return;
    };
    let Some(entry) = mapper.find_market(home_team) else {
        debug!("[SNIPER] No market mapped for {}", home_team);
        return;
    };
    let ticker = entry.ticker.clone();

    for book in &event.bookmakers {
        if !config
            .target_books
            .iter()
            .any(|t| t.eq_ignore_ascii_case(&book.key))
        {
            continue;
        }

        for market in &book.markets {
            if market.key != H2H_MARKET {
                continue;
            }
            let Some(home) = market.outcomes.iter().find(|o| o.name == home_team) else {
                continue;
            };
            let away_price = market
                .outcomes
                .iter()
                .find(|o| o.name != home_team)
                .map(|o| o.price);
            let true_prob = true_probability(home.price, away_price);

            // The edge is only as good as the ask at decision time.
            let ask = match client.get_yes_ask(&ticker).await {
                Ok(Some(level)) => level,
                Ok(None) => {
                    debug!("[SNIPER] {} has no YES liquidity", ticker);
                    continue;
                }
                Err(e) => {
                    warn!("[SNIPER] Orderbook fetch failed for {}: {}", ticker, e);
                    continue;
                }
            };
            if ask.price_cents <= 0 || ask.price_cents >= 100 {
                continue;
            }
            if ask.quantity < config.min_liquidity {
                debug!(
                    "[SNIPER] {} too thin at ask ({} < {})",
                    ticker, ask.quantity, config.min_liquidity
                );
                continue;
            }

            let market_prob = ask.price_cents as f64 / 100.0;
            let edge = true_prob - market_prob;
            if edge < config.min_edge {
                continue;
            }

            let count = size_snipe(config, state.bankroll, edge, ask.price_cents);
            if count <= 0 {
                debug!("[SNIPER] Edge on {} sized to zero contracts", ticker);
                continue;
            }

            let signal = SnipeSignal {
                ticker: ticker.clone(),
                book: book.key.clone(),
                true_prob,
                market_prob,
                edge,
                price_cents: ask.price_cents,
                count,
                dry_run: config.dry_run,
                timestamp: Utc::now(),
            };

            info!(
                "[SNIPER] SIGNAL {} | edge {:+.2}% | {} {:.2} vs kalshi {:.2} | {}x @ {}¢{}",
                signal.ticker,
                edge * 100.0,
                signal.book,
                true_prob,
                market_prob,
                count,
                ask.price_cents,
                if config.dry_run { " (dry run)" } else { "" }
            );

            state.record_signal();
            if let Some(redis) = redis {
                if let Ok(json) = serde_json::to_string(&signal) {
                    redis.publish_signal(json, &signal.ticker);
                }
            }

            if !config.dry_run {
                fire(client.clone(), &signal);
            }
        }
    }
}

/// Fire-and-forget order placement so a slow exchange never stalls the loop.
fn fire(client: Arc<KalshiClient>, signal: &SnipeSignal) {
    let request =
        CreateOrderRequest::snipe_buy(&signal.ticker, OrderSide::Yes, signal.price_cents, signal.count);
    let ticker = signal.ticker.clone();
    let price = signal.price_cents;
    let count = signal.count;

    tokio::spawn(async move {
        match client.create_order(request).await {
            Ok(order) => info!(
                "[FIRE] {}x {} @ {}¢ accepted (order={})",
                count, ticker, price, order.order_id
            ),
            Err(e) => error!("[FIRE] {}x {} @ {}¢ rejected: {}", count, ticker, price, e),
        }
    });
}

fn handle_fill(redis: Option<&RedisClient>, state: &mut SniperState, fill: &FillUpdate) {
    state.record_fill(fill);
    info!(
        "[SNIPER] FILL {} | {:?} {:?} {}x @ {}¢ | bankroll=${:.2}",
        fill.ticker, fill.action, fill.side, fill.count, fill.price_cents, state.bankroll
    );
    if let Some(redis) = redis {
        if let Ok(json) = serde_json::to_string(fill) {
            redis.publish_fill(json);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_true_probability_devig() {
        // -150 / +130: raw home prob 0.60, devigged below it
        let devigged = true_probability(-150.0, Some(130.0));
        let raw = true_probability(-150.0, None);
        assert!((raw - 0.60).abs() < 1e-9);
        assert!(devigged < raw);
        assert!(devigged > 0.55);
    }

    #[test]
    fn test_size_snipe_capped_by_max_risk() {
        let config = SniperConfig {
            max_risk_per_trade: 2.0,
            kelly_multiplier: 1.0,
            ..Default::default()
        };
        // Kelly stake at 50c with 10% edge on $100 is $10; the cap wins.
        let count = size_snipe(&config, 100.0, 0.10, 50);
        assert_eq!(count, 4); // $2 / 50c
    }

    #[test]
    fn test_size_snipe_kelly_binds_small_bankroll() {
        let config = SniperConfig {
            max_risk_per_trade: 2.0,
            kelly_multiplier: 1.0,
            ..Default::default()
        };
        // $10 bankroll, 2% edge at 50c: Kelly stake $0.20 rounds to zero contracts
        let count = size_snipe(&config, 10.0, 0.02, 50);
        assert_eq!(count, 0);
    }

    #[test]
    fn test_size_snipe_cheap_contract() {
        let config = SniperConfig {
            max_risk_per_trade: 2.0,
            kelly_multiplier: 1.0,
            ..Default::default()
        };
        // At 40c the payout is 1.5, so Kelly fraction is edge / 1.5
        let count = size_snipe(&config, 100.0, 0.06, 40);
        // Stake: min(100 * 0.04, 2.0) = 2.0 -> 5 contracts at 40c
        assert_eq!(count, 5);
    }

    #[test]
    fn test_state_fill_accounting() {
        let mut state = SniperState::new(26.0);
        state.record_fill(&FillUpdate {
            order_id: "o1".to_string(),
            ticker: "T".to_string(),
            side: OrderSide::Yes,
            action: OrderAction::Buy,
            price_cents: 50,
            count: 4,
            timestamp: Utc::now(),
        });
        assert!((state.bankroll - 24.0).abs() < 1e-9);
        assert!((state.open_cost - 2.0).abs() < 1e-9);
        assert_eq!(state.fills, 1);

        state.record_fill(&FillUpdate {
            order_id: "o2".to_string(),
            ticker: "T".to_string(),
            side: OrderSide::Yes,
            action: OrderAction::Sell,
            price_cents: 60,
            count: 4,
            timestamp: Utc::now(),
        });
        assert!((state.bankroll - 26.4).abs() < 1e-9);
        assert_eq!(state.open_cost, 0.0);
    }
}
