//! Kalshi REST API client for markets, orderbooks, orders, and account state.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::auth::KalshiAuth;
use crate::types::{
    Balance, BalanceResponse, BookLevel, CreateOrderRequest, Market, MarketsResponse, Order,
    OrderResponse, OrderbookResponse, OrdersResponse, TradingEnvironment,
};

/// Rate limit delay between requests (ms)
const API_DELAY_MS: u64 = 60;

/// Request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Order request timeout (shorter - a slow snipe is a dead snipe)
const ORDER_TIMEOUT: Duration = Duration::from_secs(5);

/// Max retries on rate limit
const MAX_RETRIES: u32 = 5;

/// Markets page size when preloading the mapper
const MARKETS_PAGE_LIMIT: u32 = 200;

/// Kalshi REST API client
pub struct KalshiClient {
    http: reqwest::Client,
    auth: KalshiAuth,
    env: TradingEnvironment,
}

impl KalshiClient {
    /// Create a new API client
    pub fn new(auth: KalshiAuth, env: TradingEnvironment) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("Failed to build HTTP client"),
            auth,
            env,
        }
    }

    /// Get the trading environment
    pub fn environment(&self) -> TradingEnvironment {
        self.env
    }

    fn base_url(&self) -> &'static str {
        self.env.api_base_url()
    }

    // =========================================================================
    // Internal HTTP Methods
    // =========================================================================

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request::<T, ()>("GET", path, None).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        self.request("POST", path, Some(body)).await
    }

    /// Generic authenticated request with retry on rate limit
    async fn request<T: DeserializeOwned, B: Serialize>(
        &self,
        method: &str,
        path: &str,
        body: Option<&B>,
    ) -> Result<T> {
        let mut retries = 0;

        loop {
            let url = format!("{}{}", self.base_url(), path);
            let (signature, timestamp) = self.auth.sign_request(method, path)?;

            let mut request = match method {
                "GET" => self.http.get(&url),
                "POST" => self.http.post(&url),
                "DELETE" => self.http.delete(&url),
                _ => anyhow::bail!("Unsupported HTTP method: {}", method),
            };

            request = request
                .header("KALSHI-ACCESS-KEY", &self.auth.api_key)
                .header("KALSHI-ACCESS-SIGNATURE", &signature)
                .header("KALSHI-ACCESS-TIMESTAMP", &timestamp);

            if let Some(b) = body {
                request = request
                    .header("Content-Type", "application/json")
                    .timeout(ORDER_TIMEOUT)
                    .json(b);
            }

            let resp = request.send().await?;
            let status = resp.status();

            // Rate limit: exponential backoff
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                retries += 1;
                if retries > MAX_RETRIES {
                    anyhow::bail!("Rate limited after {} retries", MAX_RETRIES);
                }
                let backoff_ms = 2000 * (1 << retries);
                warn!(
                    "Rate limited, backing off {}ms (retry {}/{})",
                    backoff_ms, retries, MAX_RETRIES
                );
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                continue;
            }

            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                anyhow::bail!("API error {}: {}", status, body);
            }

            let data: T = resp.json().await.context("Failed to parse response")?;

            tokio::time::sleep(Duration::from_millis(API_DELAY_MS)).await;

            return Ok(data);
        }
    }

    /// Request without response body (for DELETE)
    async fn delete(&self, path: &str) -> Result<()> {
        let url = format!("{}{}", self.base_url(), path);
        let (signature, timestamp) = self.auth.sign_request("DELETE", path)?;

        let resp = self
            .http
            .delete(&url)
            .header("KALSHI-ACCESS-KEY", &self.auth.api_key)
            .header("KALSHI-ACCESS-SIGNATURE", &signature)
            .header("KALSHI-ACCESS-TIMESTAMP", &timestamp)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("API error {}: {}", status, body);
        }

        tokio::time::sleep(Duration::from_millis(API_DELAY_MS)).await;
        Ok(())
    }

    // =========================================================================
    // Account
    // =========================================================================

    /// Get account balance
    pub async fn get_balance(&self) -> Result<Balance> {
        let resp: BalanceResponse = self.get("/portfolio/balance").await?;
        Ok(resp.balance)
    }

    // =========================================================================
    // Markets
    // =========================================================================

    /// One page of open markets, optionally filtered to a series.
    pub async fn get_open_markets(&self, series_ticker: Option<&str>) -> Result<Vec<Market>> {
        let path = match series_ticker {
            Some(series) => format!(
                "/markets?status=open&limit={}&series_ticker={}",
                MARKETS_PAGE_LIMIT, series
            ),
            None => format!("/markets?status=open&limit={}", MARKETS_PAGE_LIMIT),
        };
        let resp: MarketsResponse = self.get(&path).await?;
        Ok(resp.markets)
    }

    /// Live YES ask for a market: the first YES level of the book.
    ///
    /// `Ok(None)` means the book has no YES side right now; transport and API
    /// errors surface as `Err` so the caller can decide whether to skip.
    pub async fn get_yes_ask(&self, ticker: &str) -> Result<Option<BookLevel>> {
        let path = format!("/markets/{}/orderbook", ticker);
        let resp: OrderbookResponse = self.get(&path).await?;
        Ok(resp.yes_ask())
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Create a new order
    pub async fn create_order(&self, request: CreateOrderRequest) -> Result<Order> {
        debug!(
            "Creating order: {:?} {:?} {} @{:?}¢ x{}",
            request.action,
            request.side,
            request.ticker,
            request.yes_price.or(request.no_price),
            request.count
        );
        let resp: OrderResponse = self.post("/portfolio/orders", &request).await?;
        Ok(resp.order)
    }

    /// Get order by ID
    pub async fn get_order(&self, order_id: &str) -> Result<Order> {
        let path = format!("/portfolio/orders/{}", order_id);
        let resp: OrderResponse = self.get(&path).await?;
        Ok(resp.order)
    }

    /// List open (resting) orders, optionally filtered by ticker
    pub async fn get_orders(&self, ticker: Option<&str>) -> Result<Vec<Order>> {
        let path = match ticker {
            Some(t) => format!("/portfolio/orders?ticker={}&status=resting", t),
            None => "/portfolio/orders?status=resting".to_string(),
        };
        let resp: OrdersResponse = self.get(&path).await?;
        Ok(resp.orders)
    }

    /// Cancel an order by ID
    pub async fn cancel_order(&self, order_id: &str) -> Result<()> {
        let path = format!("/portfolio/orders/{}", order_id);
        self.delete(&path).await
    }
}
