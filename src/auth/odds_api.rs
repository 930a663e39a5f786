//! Odds feed configuration and socket URL construction.
//!
//! The socket authenticates via an `apiKey` query parameter. The key is never
//! logged; use [`OddsApiConfig::redact`] on any URL that reaches a log line.

use anyhow::{Context, Result};
use reqwest::Url;

/// Odds WebSocket endpoint (same for demo and production trading).
pub const ODDS_WS_URL: &str = "wss://app.oddsapi.io/ws/v1";

/// Odds API credentials
#[derive(Clone)]
pub struct OddsApiConfig {
    api_key: String,
}

impl OddsApiConfig {
    /// Load the key from `ODDS_API_KEY`.
    ///
    /// Whitespace is stripped - pasted keys routinely pick up a trailing
    /// newline that the server rejects as a 401.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let api_key = std::env::var("ODDS_API_KEY").context("ODDS_API_KEY is not set")?;
        Ok(Self::new(api_key))
    }

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into().trim().to_string(),
        }
    }

    /// Socket URL with the key appended, unless the base already carries one.
    pub fn ws_url(&self) -> Result<String> {
        self.ws_url_for(ODDS_WS_URL)
    }

    fn ws_url_for(&self, base: &str) -> Result<String> {
        let mut url = Url::parse(base).context("Invalid odds socket URL")?;

        let has_key = url.query_pairs().any(|(k, _)| k == "apiKey");
        if !has_key && !self.api_key.is_empty() {
            url.query_pairs_mut().append_pair("apiKey", &self.api_key);
        }

        Ok(url.to_string())
    }

    /// Replace the key with `REDACTED` wherever it appears in `text`.
    pub fn redact(&self, text: &str) -> String {
        if self.api_key.is_empty() {
            return text.to_string();
        }
        text.replace(&self.api_key, "REDACTED")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ws_url_appends_key() {
        let config = OddsApiConfig::new("secret123");
        let url = config.ws_url_for("wss://example.com/ws/v1").unwrap();
        assert_eq!(url, "wss://example.com/ws/v1?apiKey=secret123");
    }

    #[test]
    fn test_ws_url_respects_existing_key() {
        let config = OddsApiConfig::new("secret123");
        let url = config
            .ws_url_for("wss://example.com/ws/v1?apiKey=other")
            .unwrap();
        assert!(!url.contains("secret123"));
    }

    #[test]
    fn test_key_whitespace_stripped() {
        let config = OddsApiConfig::new(" secret123\n");
        let url = config.ws_url_for("wss://example.com/ws/v1").unwrap();
        assert!(url.ends_with("apiKey=secret123"));
    }

    #[test]
    fn test_redact() {
        let config = OddsApiConfig::new("secret123");
        let text = "wss://example.com/ws/v1?apiKey=secret123";
        assert_eq!(config.redact(text), "wss://example.com/ws/v1?apiKey=REDACTED");
    }
}
