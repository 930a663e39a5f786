//! Kalshi Sports Edge Sniper
//!
//! This library provides modules for:
//! - Authentication with the Kalshi trade API and the odds feed
//! - WebSocket streaming of sportsbook odds and Kalshi fills
//! - REST API trading operations
//! - Fuzzy mapping of team names to Kalshi markets
//! - Probability and bet-sizing math
//! - The sniper engine that turns odds updates into limit orders
//! - Redis client for real-time pub/sub

pub mod auth;
pub mod mapping;
pub mod pricing;
pub mod redis_client;
pub mod sniper;
pub mod trading_apis;
pub mod types;
pub mod websockets;
