//! TradeEvent: a single upstream trade observation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Upstream trade direction. Parsed case-insensitively at the feed boundary:
/// anything other than `"buy"` is treated as a sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn parse_case_insensitive(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("buy") {
            Side::Buy
        } else {
            Side::Sell
        }
    }
}

/// Runtime-only tag distinguishing a live feed event from a replayed one.
/// Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum EventSource {
    #[default]
    Live,
    Replay,
}

/// A single upstream trade observation, immutable and append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeEvent {
    /// Monotonic key assigned by the store on insert. `None` before insertion.
    pub id: Option<i64>,
    pub signature: String,
    pub mint: String,
    pub trader: String,
    pub side: Side,
    pub token_amount: Decimal,
    pub sol_amount: Decimal,
    pub new_token_balance: Decimal,
    pub curve_key: String,
    /// Virtual token reserves after this trade — the pricing basis.
    pub v_tokens_post: Decimal,
    /// Virtual SOL reserves after this trade — the pricing basis.
    pub v_sol_post: Decimal,
    pub market_cap_sol: Decimal,
    /// Sentinel `"pump"` means still on the bonding curve; anything else is a migration.
    pub pool: Option<String>,
    pub received_at: DateTime<Utc>,
    /// Assigned by the store on insert; `None` before insertion.
    pub ingested_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub source: EventSource,
}

impl TradeEvent {
    /// `true` once the pool field names anything other than the bonding-curve sentinel.
    pub fn is_migrated(&self) -> bool {
        matches!(&self.pool, Some(p) if p != "pump")
    }

    /// `v_tokens_post > 0 && v_sol_post > 0`, the precondition for acting on this event.
    pub fn has_valid_curve(&self) -> bool {
        self.v_tokens_post > Decimal::ZERO && self.v_sol_post > Decimal::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_parses_case_insensitively() {
        assert_eq!(Side::parse_case_insensitive("BUY"), Side::Buy);
        assert_eq!(Side::parse_case_insensitive("buy"), Side::Buy);
        assert_eq!(Side::parse_case_insensitive("sell"), Side::Sell);
        assert_eq!(Side::parse_case_insensitive("anything-else"), Side::Sell);
    }

    #[test]
    fn migration_sentinel() {
        let mut event = sample_event();
        event.pool = Some("pump".to_string());
        assert!(!event.is_migrated());
        event.pool = Some("raydium_v4".to_string());
        assert!(event.is_migrated());
        event.pool = None;
        assert!(!event.is_migrated());
    }

    fn sample_event() -> TradeEvent {
        TradeEvent {
            id: None,
            signature: "sig1".to_string(),
            mint: "mint1".to_string(),
            trader: "trader1".to_string(),
            side: Side::Buy,
            token_amount: Decimal::ONE,
            sol_amount: Decimal::ONE,
            new_token_balance: Decimal::ONE,
            curve_key: "curve1".to_string(),
            v_tokens_post: Decimal::ONE,
            v_sol_post: Decimal::ONE,
            market_cap_sol: Decimal::ONE,
            pool: None,
            received_at: Utc::now(),
            ingested_at: None,
            source: EventSource::Live,
        }
    }
}
