//! Feed Client: contract `connect_and_subscribe` / `receive`, with
//! exponential-backoff-plus-jitter reconnection.

use crate::dedup::DedupRing;
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use rand::Rng;
use rust_decimal::Decimal;
use serde::Deserialize;
use sim_core::types::{EventSource, Side, TradeEvent};
use sim_core::Result;
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct FeedClient {
    url: String,
    reconnect_base_delay_ms: u64,
    reconnect_max_delay_ms: u64,
    reconnect_jitter_factor: f64,
    dedup: DedupRing,
    attempt: u32,
    stream: Option<WsStream>,
}

impl FeedClient {
    pub fn new(
        url: impl Into<String>,
        reconnect_base_delay_ms: u64,
        reconnect_max_delay_ms: u64,
        reconnect_jitter_factor: f64,
        dedup_buffer_size: usize,
    ) -> Self {
        Self {
            url: url.into(),
            reconnect_base_delay_ms,
            reconnect_max_delay_ms,
            reconnect_jitter_factor,
            dedup: DedupRing::new(dedup_buffer_size),
            attempt: 0,
            stream: None,
        }
    }

    /// Opens a streaming connection and subscribes to every tracked wallet
    /// in a single payload. Resets the reconnect attempt counter.
    pub async fn connect_and_subscribe(&mut self, tracked_wallets: &[String]) -> Result<()> {
        let (mut stream, _) = connect_async(&self.url).await?;

        let subscribe_msg = serde_json::json!({
            "method": "subscribeAccountTrade",
            "keys": tracked_wallets,
        });
        stream.send(Message::Text(subscribe_msg.to_string())).await?;
        info!(wallets = tracked_wallets.len(), "subscribed to upstream feed");

        self.stream = Some(stream);
        self.attempt = 0;
        Ok(())
    }

    /// Reads and decodes the next valid, non-duplicate event. Returns `None`
    /// on decode failure, duplicate signature, or transport close/error — in
    /// the latter two cases the driver must reconnect.
    pub async fn receive(&mut self) -> Option<TradeEvent> {
        loop {
            let stream = self.stream.as_mut()?;
            match stream.next().await {
                Some(Ok(Message::Text(text))) => match serde_json::from_str::<RawTradeMessage>(&text) {
                    Ok(raw) => {
                        let Some(event) = raw.into_event() else {
                            debug!("dropped feed message: missing required field");
                            continue;
                        };
                        if !self.dedup.add(event.signature.clone()) {
                            continue;
                        }
                        return Some(event);
                    }
                    Err(e) => {
                        debug!(error = %e, "failed to decode feed message");
                        continue;
                    }
                },
                Some(Ok(Message::Ping(data))) => {
                    if stream.send(Message::Pong(data)).await.is_err() {
                        self.stream = None;
                        return None;
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    info!("feed connection closed");
                    self.stream = None;
                    return None;
                }
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    warn!(error = %e, "feed transport error");
                    self.stream = None;
                    return None;
                }
            }
        }
    }

    /// `delay = min(base · 2^min(attempt,10), max)`, plus `delay · jitter ·
    /// U[0,1)`. Increments `attempt`; reset to 0 by a successful subscribe.
    pub fn next_reconnect_delay(&mut self) -> std::time::Duration {
        let exponent = self.attempt.min(10);
        let scaled = self.reconnect_base_delay_ms.saturating_mul(1u64 << exponent);
        let capped = scaled.min(self.reconnect_max_delay_ms);
        let jitter = (capped as f64) * self.reconnect_jitter_factor * rand::thread_rng().gen::<f64>();
        self.attempt += 1;
        std::time::Duration::from_millis(capped + jitter as u64)
    }
}

/// Upstream wire DTO. Unknown fields are tolerated (not rejected); missing
/// required fields drop the message.
#[derive(Debug, Deserialize)]
struct RawTradeMessage {
    signature: Option<String>,
    mint: Option<String>,
    #[serde(rename = "traderPublicKey")]
    trader_public_key: Option<String>,
    #[serde(rename = "txType")]
    tx_type: Option<String>,
    #[serde(rename = "tokenAmount")]
    token_amount: Option<Decimal>,
    #[serde(rename = "solAmount")]
    sol_amount: Option<Decimal>,
    #[serde(rename = "newTokenBalance")]
    new_token_balance: Option<Decimal>,
    #[serde(rename = "bondingCurveKey")]
    bonding_curve_key: Option<String>,
    #[serde(rename = "vTokensInBondingCurve")]
    v_tokens_in_bonding_curve: Option<Decimal>,
    #[serde(rename = "vSolInBondingCurve")]
    v_sol_in_bonding_curve: Option<Decimal>,
    #[serde(rename = "marketCapSol")]
    market_cap_sol: Option<Decimal>,
    pool: Option<String>,
}

impl RawTradeMessage {
    fn into_event(self) -> Option<TradeEvent> {
        Some(TradeEvent {
            id: None,
            signature: self.signature?,
            mint: self.mint?,
            trader: self.trader_public_key?,
            side: Side::parse_case_insensitive(&self.tx_type?),
            token_amount: self.token_amount?,
            sol_amount: self.sol_amount?,
            new_token_balance: self.new_token_balance?,
            curve_key: self.bonding_curve_key?,
            v_tokens_post: self.v_tokens_in_bonding_curve?,
            v_sol_post: self.v_sol_in_bonding_curve?,
            market_cap_sol: self.market_cap_sol?,
            pool: self.pool,
            received_at: Utc::now(),
            ingested_at: None,
            source: EventSource::Live,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_json() -> &'static str {
        r#"{
            "signature": "sig1",
            "mint": "mint1",
            "traderPublicKey": "trader1",
            "txType": "BUY",
            "tokenAmount": "100.0",
            "solAmount": "1.0",
            "newTokenBalance": "100.0",
            "bondingCurveKey": "curve1",
            "vTokensInBondingCurve": "1000000000.0",
            "vSolInBondingCurve": "30.0",
            "marketCapSol": "30.0",
            "pool": "pump",
            "unexpectedField": 42
        }"#
    }

    #[test]
    fn decodes_valid_message_tolerating_unknown_fields() {
        let raw: RawTradeMessage = serde_json::from_str(valid_json()).unwrap();
        let event = raw.into_event().unwrap();
        assert_eq!(event.signature, "sig1");
        assert_eq!(event.side, Side::Buy);
        assert_eq!(event.pool.as_deref(), Some("pump"));
    }

    #[test]
    fn missing_required_field_drops_message() {
        let raw: RawTradeMessage = serde_json::from_str(r#"{"mint": "mint1"}"#).unwrap();
        assert!(raw.into_event().is_none());
    }

    #[test]
    fn reconnect_delay_saturates_at_max_and_stays_within_jitter_bound() {
        let mut client = FeedClient::new("wss://example.invalid", 1000, 5000, 0.2, 100);
        for _ in 0..20 {
            let delay = client.next_reconnect_delay();
            assert!(delay.as_millis() <= 5000 + (5000.0 * 0.2) as u128);
        }
    }

    #[test]
    fn reconnect_delay_grows_with_attempt_before_saturating() {
        let mut client = FeedClient::new("wss://example.invalid", 100, 100_000, 0.0, 100);
        let first = client.next_reconnect_delay();
        let second = client.next_reconnect_delay();
        assert!(second >= first);
    }
}
