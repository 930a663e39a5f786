//! Type definitions for Kalshi environments, WebSocket commands, orderbooks, and orders.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Trading Environment
// =============================================================================

/// Trading environment selection (Demo vs Production)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradingEnvironment {
    Demo,
    Production,
}

impl TradingEnvironment {
    /// Select the environment from `KALSHI_ENV`.
    ///
    /// `DEMO` (any case) selects the demo exchange; anything else, including
    /// an unset variable, selects production.
    pub fn from_env() -> Self {
        match std::env::var("KALSHI_ENV") {
            Ok(v) if v.trim().eq_ignore_ascii_case("demo") => Self::Demo,
            _ => Self::Production,
        }
    }

    /// REST API base URL
    pub fn api_base_url(&self) -> &'static str {
        match self {
            Self::Demo => "https://demo-api.kalshi.co/trade-api/v2",
            Self::Production => "https://api.elections.kalshi.com/trade-api/v2",
        }
    }

    /// WebSocket URL
    pub fn ws_url(&self) -> &'static str {
        match self {
            Self::Demo => "wss://demo-api.kalshi.co/trade-api/ws/v2",
            Self::Production => "wss://api.elections.kalshi.com/trade-api/ws/v2",
        }
    }

    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Demo => "DEMO",
            Self::Production => "PRODUCTION",
        }
    }
}

impl std::fmt::Display for TradingEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// =============================================================================
// WebSocket Command Types
// =============================================================================

/// Authentication command, sent as the first frame on the trade socket.
#[derive(Debug, Serialize)]
pub struct AuthCmd {
    #[serde(rename = "type")]
    pub cmd_type: &'static str,
    pub data: AuthPayload,
}

/// Signed credentials carried by [`AuthCmd`].
///
/// The signature covers `{timestamp_ms}{api_key}`.
#[derive(Debug, Serialize)]
pub struct AuthPayload {
    pub id: String,
    pub timestamp: String,
    pub signature: String,
    pub api_key: String,
}

#[derive(Debug, Serialize)]
pub struct SubscribeCmd {
    pub id: i32,
    pub cmd: &'static str,
    pub params: SubscribeParams,
}

#[derive(Debug, Serialize)]
pub struct SubscribeParams {
    pub channels: Vec<&'static str>,
}

// =============================================================================
// Orderbook (REST)
// =============================================================================

/// REST orderbook response: `{"orderbook": {"yes": [[price, qty], ...], ...}}`
#[derive(Debug, Clone, Deserialize)]
pub struct OrderbookResponse {
    pub orderbook: OrderbookLevels,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderbookLevels {
    #[serde(default)]
    pub yes: Option<Vec<Vec<i64>>>,
    #[serde(default)]
    pub no: Option<Vec<Vec<i64>>>,
}

/// A single price level: price in cents plus resting quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookLevel {
    pub price_cents: i64,
    pub quantity: i64,
}

impl OrderbookResponse {
    /// Current cost of a YES contract: the first YES level of the book.
    ///
    /// Returns `None` when the YES side is absent or empty, or the level is
    /// malformed.
    pub fn yes_ask(&self) -> Option<BookLevel> {
        let levels = self.orderbook.yes.as_ref()?;
        let first = levels.first()?;
        if first.len() < 2 {
            return None;
        }
        Some(BookLevel {
            price_cents: first[0],
            quantity: first[1],
        })
    }
}

// =============================================================================
// Markets
// =============================================================================

/// A market row from the markets listing endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Market {
    pub ticker: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub event_ticker: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarketsResponse {
    #[serde(default)]
    pub markets: Vec<Market>,
    #[serde(default)]
    pub cursor: Option<String>,
}

// =============================================================================
// Order Types
// =============================================================================

/// Order action (buy or sell)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderAction {
    Buy,
    Sell,
}

impl OrderAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }
}

/// Order side (yes or no)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Yes,
    No,
}

impl OrderSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
        }
    }
}

/// Order type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Limit,
    Market,
}

/// Order status
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Resting,
    Executed,
    Canceled,
    Pending,
    #[serde(other)]
    Unknown,
}

// =============================================================================
// Order Request/Response
// =============================================================================

/// Request to create a new order
#[derive(Debug, Clone, Serialize)]
pub struct CreateOrderRequest {
    pub ticker: String,
    pub action: OrderAction,
    pub side: OrderSide,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yes_price: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_price: Option<i64>,
    /// Worst-case spend in cents (count * price), a hard cap on the fill.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_cost: Option<i64>,
    pub client_order_id: String,
}

impl CreateOrderRequest {
    pub fn generate_client_order_id() -> String {
        format!("snipe-{}", Uuid::new_v4().simple())
    }

    /// Limit buy at `price_cents`, capped at `count * price_cents` total cost.
    pub fn snipe_buy(ticker: &str, side: OrderSide, price_cents: i64, count: i64) -> Self {
        let (yes_price, no_price) = match side {
            OrderSide::Yes => (Some(price_cents), None),
            OrderSide::No => (None, Some(price_cents)),
        };
        Self {
            ticker: ticker.to_string(),
            action: OrderAction::Buy,
            side,
            order_type: OrderType::Limit,
            count,
            yes_price,
            no_price,
            max_cost: Some(count * price_cents),
            client_order_id: Self::generate_client_order_id(),
        }
    }
}

/// Response from order creation
#[derive(Debug, Clone, Deserialize)]
pub struct OrderResponse {
    pub order: Order,
}

/// Order details
#[derive(Debug, Clone, Deserialize)]
pub struct Order {
    pub order_id: String,
    pub ticker: String,
    pub status: OrderStatus,
    pub action: String,
    pub side: String,
    #[serde(rename = "type")]
    pub order_type: String,
    #[serde(default)]
    pub yes_price: Option<i64>,
    #[serde(default)]
    pub no_price: Option<i64>,
    #[serde(default)]
    pub count: Option<i64>,
    #[serde(default)]
    pub remaining_count: Option<i64>,
    #[serde(default)]
    pub client_order_id: Option<String>,
}

impl Order {
    pub fn is_resting(&self) -> bool {
        matches!(self.status, OrderStatus::Resting)
    }

    pub fn price_cents(&self) -> Option<i64> {
        self.yes_price.or(self.no_price)
    }
}

/// Response for list orders
#[derive(Debug, Clone, Deserialize)]
pub struct OrdersResponse {
    pub orders: Vec<Order>,
    #[serde(default)]
    pub cursor: Option<String>,
}

// =============================================================================
// Balance Types
// =============================================================================

/// Account balance (cents)
#[derive(Debug, Clone, Deserialize)]
pub struct Balance {
    #[serde(default)]
    pub balance: i64,
    #[serde(default)]
    pub portfolio_value: i64,
}

/// Response for get balance
#[derive(Debug, Clone, Deserialize)]
pub struct BalanceResponse {
    #[serde(flatten)]
    pub balance: Balance,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orderbook_yes_ask() {
        let json = r#"{"orderbook": {"yes": [[45, 120], [47, 30]], "no": [[52, 10]]}}"#;
        let book: OrderbookResponse = serde_json::from_str(json).unwrap();
        let ask = book.yes_ask().unwrap();
        assert_eq!(ask.price_cents, 45);
        assert_eq!(ask.quantity, 120);
    }

    #[test]
    fn test_orderbook_empty_yes_side() {
        let json = r#"{"orderbook": {"yes": [], "no": [[52, 10]]}}"#;
        let book: OrderbookResponse = serde_json::from_str(json).unwrap();
        assert!(book.yes_ask().is_none());

        let json = r#"{"orderbook": {"no": [[52, 10]]}}"#;
        let book: OrderbookResponse = serde_json::from_str(json).unwrap();
        assert!(book.yes_ask().is_none());
    }

    #[test]
    fn test_snipe_buy_serialization() {
        let req = CreateOrderRequest::snipe_buy("KXNFLGAME-TEST", OrderSide::Yes, 45, 4);
        let json = serde_json::to_value(&req).unwrap();

        assert_eq!(json["action"], "buy");
        assert_eq!(json["side"], "yes");
        assert_eq!(json["type"], "limit");
        assert_eq!(json["count"], 4);
        assert_eq!(json["yes_price"], 45);
        assert_eq!(json["max_cost"], 180);
        // NO price must be omitted entirely, not serialized as null
        assert!(json.get("no_price").is_none());
    }

    #[test]
    fn test_client_order_ids_unique() {
        let a = CreateOrderRequest::generate_client_order_id();
        let b = CreateOrderRequest::generate_client_order_id();
        assert_ne!(a, b);
        assert!(a.starts_with("snipe-"));
    }

    #[test]
    fn test_environment_selection() {
        std::env::set_var("KALSHI_ENV", "demo");
        assert_eq!(TradingEnvironment::from_env(), TradingEnvironment::Demo);

        std::env::set_var("KALSHI_ENV", "PROD");
        assert_eq!(TradingEnvironment::from_env(), TradingEnvironment::Production);

        std::env::remove_var("KALSHI_ENV");
        assert_eq!(TradingEnvironment::from_env(), TradingEnvironment::Production);
    }
}
