//! Type definitions for odds feed events.
//!
//! The socket delivers one event per game update. Depending on the plan the
//! payload may carry a top-level bookmaker key (single-book updates) or a
//! full `bookmakers` array.

use serde::Deserialize;

/// Moneyline market key on the odds feed.
pub const H2H_MARKET: &str = "h2h";

/// A game update from the odds socket.
#[derive(Debug, Clone, Deserialize)]
pub struct OddsEvent {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub sport_key: Option<String>,
    #[serde(default)]
    pub commence_time: Option<String>,
    #[serde(default)]
    pub home_team: Option<String>,
    #[serde(default)]
    pub away_team: Option<String>,
    /// Single-book payloads name the book at the top level.
    #[serde(default)]
    pub bookmaker: Option<String>,
    #[serde(default)]
    pub bookmaker_key: Option<String>,
    #[serde(default)]
    pub bookmakers: Vec<Bookmaker>,
}

impl OddsEvent {
    /// Top-level book identifier, when the payload carries one.
    pub fn feed_book(&self) -> Option<&str> {
        self.bookmaker.as_deref().or(self.bookmaker_key.as_deref())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Bookmaker {
    pub key: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub markets: Vec<BookMarket>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookMarket {
    pub key: String,
    #[serde(default)]
    pub outcomes: Vec<Outcome>,
}

/// A single outcome with its American odds price.
#[derive(Debug, Clone, Deserialize)]
pub struct Outcome {
    pub name: String,
    pub price: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "id": "abc123",
        "sport_key": "americanfootball_nfl",
        "commence_time": "2026-01-18T18:00:00Z",
        "home_team": "Kansas City Chiefs",
        "away_team": "Buffalo Bills",
        "bookmakers": [
            {
                "key": "draftkings",
                "title": "DraftKings",
                "markets": [
                    {
                        "key": "h2h",
                        "outcomes": [
                            {"name": "Kansas City Chiefs", "price": -150},
                            {"name": "Buffalo Bills", "price": 130}
                        ]
                    }
                ]
            }
        ]
    }"#;

    #[test]
    fn test_deserialize_full_event() {
        let event: OddsEvent = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(event.home_team.as_deref(), Some("Kansas City Chiefs"));
        assert_eq!(event.bookmakers.len(), 1);

        let book = &event.bookmakers[0];
        assert_eq!(book.key, "draftkings");
        assert_eq!(book.markets[0].key, H2H_MARKET);
        assert_eq!(book.markets[0].outcomes[0].price, -150.0);
    }

    #[test]
    fn test_feed_book_fallback() {
        let event: OddsEvent =
            serde_json::from_str(r#"{"bookmaker_key": "pinnacle"}"#).unwrap();
        assert_eq!(event.feed_book(), Some("pinnacle"));

        let event: OddsEvent = serde_json::from_str(r#"{"home_team": "X"}"#).unwrap();
        assert!(event.feed_book().is_none());
    }

    #[test]
    fn test_sparse_payload_tolerated() {
        // Feed messages without game data (heartbeats, acks) still parse.
        let event: OddsEvent = serde_json::from_str("{}").unwrap();
        assert!(event.home_team.is_none());
        assert!(event.bookmakers.is_empty());
    }
}
