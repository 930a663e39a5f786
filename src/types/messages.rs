//! Message types for communication between the feeds, the engine, and Redis.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{OrderAction, OrderSide};

// =============================================================================
// ENGINE → REDIS / LOGS
// =============================================================================

/// A detected edge that the engine acted on (or would have, in dry-run mode).
#[derive(Debug, Clone, Serialize)]
pub struct SnipeSignal {
    /// Kalshi market ticker
    pub ticker: String,
    /// Sportsbook the odds came from
    pub book: String,
    /// De-vigged (or raw implied) win probability from the book
    pub true_prob: f64,
    /// Kalshi YES ask expressed as a probability
    pub market_prob: f64,
    /// true_prob - market_prob
    pub edge: f64,
    /// YES ask in cents at decision time
    pub price_cents: i64,
    /// Contracts sized for the order
    pub count: i64,
    /// True when the engine recorded the signal without firing
    pub dry_run: bool,
    pub timestamp: DateTime<Utc>,
}

/// Periodic engine state snapshot for dashboard consumption.
#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    pub bankroll: f64,
    pub signals_fired: u64,
    pub fills: u64,
    /// Dollars committed to fills so far
    pub open_cost: f64,
    pub timestamp: DateTime<Utc>,
}

// =============================================================================
// FILL MONITOR → ENGINE
// =============================================================================

/// Fill notification from the Kalshi trade socket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FillUpdate {
    /// Order ID that was filled
    pub order_id: String,
    /// Market ticker
    pub ticker: String,
    /// Side of the order (Yes or No)
    pub side: OrderSide,
    /// Action (Buy or Sell)
    pub action: OrderAction,
    /// Fill price in cents
    pub price_cents: i64,
    /// Number of contracts filled
    pub count: i64,
    /// Timestamp of the fill
    pub timestamp: DateTime<Utc>,
}

impl FillUpdate {
    /// Dollar cost of this fill.
    pub fn cost_dollars(&self) -> f64 {
        self.count as f64 * self.price_cents as f64 / 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_cost() {
        let fill = FillUpdate {
            order_id: "o1".to_string(),
            ticker: "T".to_string(),
            side: OrderSide::Yes,
            action: OrderAction::Buy,
            price_cents: 45,
            count: 4,
            timestamp: Utc::now(),
        };
        assert!((fill.cost_dollars() - 1.80).abs() < 1e-9);
    }
}
