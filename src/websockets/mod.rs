//! WebSocket feeds: sportsbook odds in, Kalshi fills back.

pub mod kalshi_fills;
pub mod odds_feed;
