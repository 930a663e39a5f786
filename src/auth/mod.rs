//! Authentication and configuration modules for the Kalshi and odds APIs.

pub mod kalshi;
pub mod odds_api;

pub use kalshi::KalshiAuth;
pub use odds_api::OddsApiConfig;
