//! PerformanceSnapshot: a frozen projection of the wallet and metrics.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceSnapshot {
    pub id: Option<i64>,
    pub session_id: Uuid,
    pub taken_at: DateTime<Utc>,
    pub total_trades: u64,
    pub win_count: u64,
    pub loss_count: u64,
    pub win_rate: Decimal,
    pub avg_roi_percent: Decimal,
    pub total_realized_pnl: Decimal,
    pub total_unrealized_pnl: Decimal,
    pub max_drawdown_percent: Decimal,
    pub sol_balance: Decimal,
    pub total_portfolio_value: Decimal,
}
