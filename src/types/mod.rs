//! Type definitions for all APIs.

pub mod kalshi;
pub mod messages;
pub mod odds;

// Re-export common Kalshi types
pub use kalshi::{
    // Environment
    TradingEnvironment,
    // WebSocket
    AuthCmd, AuthPayload, SubscribeCmd, SubscribeParams,
    // Orderbook
    BookLevel, OrderbookResponse,
    // Orders
    Balance, BalanceResponse, CreateOrderRequest, Market, MarketsResponse, Order, OrderAction,
    OrderResponse, OrderSide, OrderStatus, OrderType, OrdersResponse,
};

// Re-export odds feed types
pub use odds::{BookMarket, Bookmaker, OddsEvent, Outcome, H2H_MARKET};

// Re-export message types
pub use messages::{EngineStatus, FillUpdate, SnipeSignal};
