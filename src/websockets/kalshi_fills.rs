//! Kalshi trade-socket fill monitor.
//!
//! Authenticates with a signed auth frame, subscribes to the `fill` channel,
//! and forwards validated fills to the engine. The reconnect loop lives in
//! main.

use anyhow::{Context, Result};
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, trace, warn};

use crate::auth::KalshiAuth;
use crate::types::{
    FillUpdate, OrderAction, OrderSide, SubscribeCmd, SubscribeParams, TradingEnvironment,
};

/// Envelope for messages arriving on the trade socket.
#[derive(Debug, Deserialize)]
struct FillWsMessage {
    #[serde(rename = "type")]
    msg_type: String,
    #[serde(default)]
    msg: Option<FillMessageBody>,
}

#[derive(Debug, Deserialize)]
struct FillMessageBody {
    #[serde(default)]
    order_id: Option<String>,
    #[serde(default)]
    market_ticker: Option<String>,
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    side: Option<String>,
    #[serde(default)]
    count: Option<i64>,
    #[serde(default)]
    yes_price: Option<i64>,
    #[serde(default)]
    no_price: Option<i64>,
}

/// Run the fill monitor until the socket closes or errors.
pub async fn run(
    auth: &KalshiAuth,
    env: TradingEnvironment,
    sender: mpsc::Sender<FillUpdate>,
) -> Result<()> {
    info!("[FILLS] Connecting to trade socket ({})...", env);
    let (ws_stream, _response) = connect_async(env.ws_url())
        .await
        .context("Failed to connect to Kalshi trade socket")?;

    let (mut write, mut read) = ws_stream.split();

    // Auth frame first; the socket drops unauthenticated subscribers.
    let auth_cmd = auth.ws_auth_payload()?;
    write
        .send(Message::Text(serde_json::to_string(&auth_cmd)?))
        .await
        .context("Failed to send auth frame")?;
    info!("[FILLS] Sent auth frame");

    let subscribe_cmd = SubscribeCmd {
        id: 1,
        cmd: "subscribe",
        params: SubscribeParams {
            channels: vec!["fill"],
        },
    };
    let subscribe_json = serde_json::to_string(&subscribe_cmd)?;
    debug!("[FILLS] Sending subscribe: {}", subscribe_json);
    write.send(Message::Text(subscribe_json)).await?;

    while let Some(msg_result) = read.next().await {
        match msg_result {
            Ok(Message::Text(text)) => {
                trace!("[FILLS] Received: {}", text);
                match serde_json::from_str::<FillWsMessage>(&text) {
                    Ok(ws_msg) => handle_message(&ws_msg, &sender).await,
                    Err(e) => trace!("[FILLS] Parse error (non-fill msg): {}", e),
                }
            }
            Ok(Message::Ping(data)) => {
                trace!("[FILLS] Ping, sending pong");
                if let Err(e) = write.send(Message::Pong(data)).await {
                    warn!("[FILLS] Failed to send pong: {}", e);
                }
            }
            Ok(Message::Pong(_)) => {
                trace!("[FILLS] Pong");
            }
            Ok(Message::Close(frame)) => {
                info!("[FILLS] Socket closed: {:?}", frame);
                break;
            }
            Ok(Message::Binary(_)) | Ok(Message::Frame(_)) => {
                trace!("[FILLS] Non-text frame ignored");
            }
            Err(e) => {
                error!("[FILLS] Socket error: {}", e);
                break;
            }
        }
    }

    Ok(())
}

async fn handle_message(ws_msg: &FillWsMessage, sender: &mpsc::Sender<FillUpdate>) {
    match ws_msg.msg_type.as_str() {
        "fill" => {
            let Some(body) = &ws_msg.msg else { return };
            let Some(fill) = validate_fill(body) else { return };

            info!(
                "[FILLS] {} | {:?} {:?} {} @ {}¢ | order={}",
                fill.ticker, fill.action, fill.side, fill.count, fill.price_cents, fill.order_id
            );

            if let Err(e) = sender.send(fill).await {
                error!("[FILLS] Failed to send fill update: {}", e);
            }
        }
        "subscribed" => {
            info!("[FILLS] Subscription confirmed");
        }
        "error" => {
            error!("[FILLS] Socket error message: {:?}", ws_msg.msg);
        }
        other => {
            trace!("[FILLS] Unhandled message type: {}", other);
        }
    }
}

/// Turn a raw fill body into a [`FillUpdate`], rejecting incomplete or
/// out-of-range messages.
fn validate_fill(body: &FillMessageBody) -> Option<FillUpdate> {
    let order_id = match &body.order_id {
        Some(id) => id.clone(),
        None => {
            warn!("[FILLS] Fill message missing order_id");
            return None;
        }
    };

    let ticker = match &body.market_ticker {
        Some(t) => t.clone(),
        None => {
            warn!("[FILLS] Fill message missing market_ticker");
            return None;
        }
    };

    let action = match body.action.as_deref() {
        Some("buy") => OrderAction::Buy,
        Some("sell") => OrderAction::Sell,
        other => {
            warn!("[FILLS] Fill message has invalid action: {:?}", other);
            return None;
        }
    };

    let side = match body.side.as_deref() {
        Some("yes") => OrderSide::Yes,
        Some("no") => OrderSide::No,
        other => {
            warn!("[FILLS] Fill message has invalid side: {:?}", other);
            return None;
        }
    };

    let count = body.count.unwrap_or(0);
    if count <= 0 {
        warn!("[FILLS] Fill message has invalid count: {}", count);
        return None;
    }

    let price_cents = match side {
        OrderSide::Yes => body.yes_price.unwrap_or(0),
        OrderSide::No => body.no_price.unwrap_or(0),
    };
    if price_cents <= 0 || price_cents >= 100 {
        warn!("[FILLS] Fill message has invalid price: {}", price_cents);
        return None;
    }

    Some(FillUpdate {
        order_id,
        ticker,
        side,
        action,
        price_cents,
        count,
        timestamp: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(json: &str) -> FillMessageBody {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_validate_complete_fill() {
        let fill = validate_fill(&body(
            r#"{"order_id": "o1", "market_ticker": "KXNFLGAME-T", "action": "buy",
                "side": "yes", "count": 3, "yes_price": 45}"#,
        ))
        .unwrap();

        assert_eq!(fill.order_id, "o1");
        assert_eq!(fill.side, OrderSide::Yes);
        assert_eq!(fill.price_cents, 45);
        assert_eq!(fill.count, 3);
    }

    #[test]
    fn test_validate_uses_side_price() {
        // NO fills price off no_price, not yes_price
        let fill = validate_fill(&body(
            r#"{"order_id": "o2", "market_ticker": "T", "action": "sell",
                "side": "no", "count": 1, "yes_price": 45, "no_price": 55}"#,
        ))
        .unwrap();
        assert_eq!(fill.price_cents, 55);
    }

    #[test]
    fn test_validate_rejects_incomplete() {
        assert!(validate_fill(&body(r#"{"market_ticker": "T"}"#)).is_none());
        assert!(validate_fill(&body(
            r#"{"order_id": "o", "market_ticker": "T", "action": "hold",
                "side": "yes", "count": 1, "yes_price": 45}"#
        ))
        .is_none());
        assert!(validate_fill(&body(
            r#"{"order_id": "o", "market_ticker": "T", "action": "buy",
                "side": "yes", "count": 0, "yes_price": 45}"#
        ))
        .is_none());
        assert!(validate_fill(&body(
            r#"{"order_id": "o", "market_ticker": "T", "action": "buy",
                "side": "yes", "count": 1, "yes_price": 100}"#
        ))
        .is_none());
    }
}
