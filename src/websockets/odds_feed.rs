//! Odds socket streaming into the engine queue.
//!
//! Maintains its own reconnect loop. A 401 on the handshake is fatal:
//! retrying a rejected key only gets the account banned, so the feed logs
//! remediation hints and returns instead.

use anyhow::{anyhow, Result};
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite, tungstenite::Message};
use tracing::{error, info, trace, warn};

use crate::auth::OddsApiConfig;
use crate::types::OddsEvent;

/// Run the odds feed, pushing events into `sender`.
///
/// Returns only on a fatal authentication failure; every other error is
/// logged and followed by a reconnect after `reconnect_delay_secs`.
pub async fn run(
    config: &OddsApiConfig,
    sharp_books: &[String],
    reconnect_delay_secs: u64,
    sender: mpsc::Sender<OddsEvent>,
) -> Result<()> {
    let url = config.ws_url()?;

    loop {
        info!("[ODDS] Connecting to {}", config.redact(&url));

        match connect_async(url.as_str()).await {
            Ok((ws_stream, _response)) => {
                info!("[ODDS] Connected");
                let (mut write, mut read) = ws_stream.split();

                while let Some(msg_result) = read.next().await {
                    match msg_result {
                        Ok(Message::Text(text)) => {
                            handle_text(&text, sharp_books, &sender).await;
                        }
                        Ok(Message::Ping(data)) => {
                            trace!("[ODDS] Ping, sending pong");
                            if let Err(e) = write.send(Message::Pong(data)).await {
                                warn!("[ODDS] Failed to send pong: {}", e);
                            }
                        }
                        Ok(Message::Pong(_)) => {
                            trace!("[ODDS] Pong");
                        }
                        Ok(Message::Close(frame)) => {
                            info!("[ODDS] Socket closed: {:?}", frame);
                            break;
                        }
                        Ok(Message::Binary(_)) | Ok(Message::Frame(_)) => {
                            trace!("[ODDS] Non-text frame ignored");
                        }
                        Err(e) => {
                            error!("[ODDS] Socket error: {}", e);
                            break;
                        }
                    }
                }
            }
            Err(tungstenite::Error::Http(response))
                if response.status() == tungstenite::http::StatusCode::UNAUTHORIZED =>
            {
                error!("[ODDS] 401 Unauthorized from odds socket");
                error!("[ODDS] 1. Is ODDS_API_KEY correct?");
                error!("[ODDS] 2. Does your plan include WebSocket access?");
                error!("[ODDS] URL used: {}", config.redact(&url));
                return Err(anyhow!("Odds socket rejected credentials (401)"));
            }
            Err(e) => {
                warn!("[ODDS] Connection failed: {}", e);
            }
        }

        info!("[ODDS] Reconnecting in {}s...", reconnect_delay_secs);
        tokio::time::sleep(Duration::from_secs(reconnect_delay_secs)).await;
    }
}

/// Parse a text frame and enqueue it if it passes the sharp-book filter.
async fn handle_text(text: &str, sharp_books: &[String], sender: &mpsc::Sender<OddsEvent>) {
    let event: OddsEvent = match serde_json::from_str(text) {
        Ok(event) => event,
        Err(e) => {
            warn!("[ODDS] Failed to decode payload: {}", e);
            return;
        }
    };

    // Single-book payloads name their book at the top level; drop soft books
    // here before they cost a queue slot. Array payloads are filtered per
    // book by the engine.
    if let Some(book) = event.feed_book() {
        let book = book.to_lowercase();
        if !sharp_books.iter().any(|s| s.eq_ignore_ascii_case(&book)) {
            trace!("[ODDS] Ignoring book {}", book);
            return;
        }
    }

    if let Err(e) = sender.send(event).await {
        error!("[ODDS] Failed to enqueue event: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sharp_book_filter() {
        let (tx, mut rx) = mpsc::channel::<OddsEvent>(8);
        let sharps = vec!["draftkings".to_string(), "pinnacle".to_string()];

        handle_text(r#"{"bookmaker": "pinnacle", "home_team": "A"}"#, &sharps, &tx).await;
        handle_text(r#"{"bookmaker": "softbook", "home_team": "B"}"#, &sharps, &tx).await;
        // Payloads without a top-level book pass through
        handle_text(r#"{"home_team": "C"}"#, &sharps, &tx).await;
        // Garbage is dropped without panicking
        handle_text("not json", &sharps, &tx).await;
        drop(tx);

        let first = rx.recv().await.unwrap();
        assert_eq!(first.home_team.as_deref(), Some("A"));
        let second = rx.recv().await.unwrap();
        assert_eq!(second.home_team.as_deref(), Some("C"));
        assert!(rx.recv().await.is_none());
    }
}
