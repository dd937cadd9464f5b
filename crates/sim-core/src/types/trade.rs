//! SimulatedTrade: one persisted synthetic fill.

use super::event::Side;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedTrade {
    pub id: Option<i64>,
    pub source_event_id: i64,
    pub session_id: Uuid,
    pub mint: String,
    pub side: Side,
    pub sol_amount: Decimal,
    pub token_amount: Decimal,
    pub simulated_price: Decimal,
    pub slippage_bps: Decimal,
    pub delay_ms: u64,
    pub executed_at: DateTime<Utc>,
    pub v_tokens_at_execution: Decimal,
    pub v_sol_at_execution: Decimal,
    /// Populated on sells only.
    pub realized_pnl: Option<Decimal>,
}
