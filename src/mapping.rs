//! Fuzzy mapping from sportsbook team names to Kalshi market tickers.
//!
//! The mapper is preloaded once at startup from the markets listing endpoint
//! and is immutable afterwards; share it behind an `Arc`. Team names are
//! extracted from market titles of the form "A vs B" or "A @ B".

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::trading_apis::KalshiClient;

/// Default minimum Jaro-Winkler similarity for a team match.
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.85;

/// One market with its extracted team names.
#[derive(Debug, Clone)]
pub struct MarketEntry {
    pub ticker: String,
    pub title: String,
    pub teams: Vec<String>,
}

pub struct MarketMapper {
    entries: Vec<MarketEntry>,
    /// Flat index of every team string across all entries.
    team_index: Vec<String>,
    threshold: f64,
}

impl MarketMapper {
    pub fn new(threshold: f64) -> Self {
        Self {
            entries: Vec::new(),
            team_index: Vec::new(),
            threshold,
        }
    }

    /// Load open markets into memory.
    ///
    /// With an empty `series_tickers` slice one unfiltered page is fetched;
    /// otherwise one page per series. Markets whose titles contain no team
    /// separator are kept with an empty team list.
    pub async fn preload(&mut self, client: &KalshiClient, series_tickers: &[String]) -> Result<()> {
        let mut markets = Vec::new();

        if series_tickers.is_empty() {
            markets.extend(client.get_open_markets(None).await?);
        } else {
            for series in series_tickers {
                match client.get_open_markets(Some(series)).await {
                    Ok(batch) => {
                        debug!("[MAPPER] {}: {} open markets", series, batch.len());
                        markets.extend(batch);
                    }
                    Err(e) => warn!("[MAPPER] Failed to load series {}: {}", series, e),
                }
            }
        }

        for market in markets {
            let teams = extract_teams(&market.title);
            self.team_index.extend(teams.iter().cloned());
            self.entries.push(MarketEntry {
                ticker: market.ticker,
                title: market.title,
                teams,
            });
        }

        info!(
            "[MAPPER] Loaded {} markets ({} team names)",
            self.entries.len(),
            self.team_index.len()
        );
        Ok(())
    }

    /// Closest team string from loaded markets, or `None` below the threshold.
    pub fn match_team(&self, name: &str) -> Option<&str> {
        let needle = name.to_lowercase();
        let mut best: Option<(&str, f64)> = None;

        for candidate in &self.team_index {
            let score = strsim::jaro_winkler(&needle, &candidate.to_lowercase());
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((candidate, score));
            }
        }

        match best {
            Some((team, score)) if score >= self.threshold => Some(team),
            _ => None,
        }
    }

    /// Market entry owning the team that best matches `team_name`.
    pub fn find_market(&self, team_name: &str) -> Option<&MarketEntry> {
        let matched = self.match_team(team_name)?;
        self.entries
            .iter()
            .find(|entry| entry.teams.iter().any(|t| t == matched))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    fn insert_for_test(&mut self, ticker: &str, title: &str) {
        let teams = extract_teams(title);
        self.team_index.extend(teams.iter().cloned());
        self.entries.push(MarketEntry {
            ticker: ticker.to_string(),
            title: title.to_string(),
            teams,
        });
    }
}

/// Split a market title into team names, treating "@" as "vs".
fn extract_teams(title: &str) -> Vec<String> {
    title
        .replace('@', "vs")
        .split("vs")
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_mapper() -> MarketMapper {
        let mut mapper = MarketMapper::new(DEFAULT_MATCH_THRESHOLD);
        mapper.insert_for_test("KXNFLGAME-26JAN18KCBUF-KC", "Kansas City Chiefs vs Buffalo Bills");
        mapper.insert_for_test("KXNBAGAME-26JAN15CHALAL-LAL", "Charlotte Hornets @ Los Angeles Lakers");
        mapper.insert_for_test("KXHIGHNY-26JAN15", "Highest temperature in NYC today");
        mapper
    }

    #[test]
    fn test_extract_teams_vs() {
        let teams = extract_teams("Kansas City Chiefs vs Buffalo Bills");
        assert_eq!(teams, vec!["Kansas City Chiefs", "Buffalo Bills"]);
    }

    #[test]
    fn test_extract_teams_at_separator() {
        let teams = extract_teams("Charlotte Hornets @ Los Angeles Lakers");
        assert_eq!(teams, vec!["Charlotte Hornets", "Los Angeles Lakers"]);
    }

    #[test]
    fn test_extract_teams_no_separator() {
        assert!(extract_teams("").is_empty());
        // A title without "vs" yields itself as a single entry
        let teams = extract_teams("Highest temperature in NYC today");
        assert_eq!(teams.len(), 1);
    }

    #[test]
    fn test_match_team_exact_and_fuzzy() {
        let mapper = sample_mapper();
        assert_eq!(
            mapper.match_team("Kansas City Chiefs"),
            Some("Kansas City Chiefs")
        );
        // Sportsbooks often drop the city
        assert_eq!(
            mapper.match_team("Kansas City  Chiefs "),
            Some("Kansas City Chiefs")
        );
    }

    #[test]
    fn test_match_team_below_threshold() {
        let mapper = sample_mapper();
        assert!(mapper.match_team("Green Bay Packers").is_none());
    }

    #[test]
    fn test_find_market() {
        let mapper = sample_mapper();
        let entry = mapper.find_market("Buffalo Bills").unwrap();
        assert_eq!(entry.ticker, "KXNFLGAME-26JAN18KCBUF-KC");

        let entry = mapper.find_market("Los Angeles Lakers").unwrap();
        assert_eq!(entry.ticker, "KXNBAGAME-26JAN15CHALAL-LAL");
    }

    #[test]
    fn test_empty_mapper_matches_nothing() {
        let mapper = MarketMapper::new(DEFAULT_MATCH_THRESHOLD);
        assert!(mapper.is_empty());
        assert!(mapper.match_team("Kansas City Chiefs").is_none());
        assert!(mapper.find_market("Kansas City Chiefs").is_none());
    }
}
