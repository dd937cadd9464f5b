//! Simulated-Trade Store: unit-granular persistence, no batching.

use sim_core::types::{
    PerformanceSnapshot, SessionMode, Side, SimulatedTrade, SimulationSession,
};
use sim_core::{Error, Result};
use sqlx::{PgPool, Row};

pub struct TradeStore {
    pool: PgPool,
}

impl TradeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert_session(&self, session: &SimulationSession) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO simulation_sessions (
                id, started_at, ended_at, mode, config_json,
                initial_sol_balance, final_sol_balance
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(session.id)
        .bind(session.started_at)
        .bind(session.ended_at)
        .bind(mode_to_i16(session.mode))
        .bind(serde_json::from_str::<serde_json::Value>(&session.config_json)?)
        .bind(session.initial_sol_balance)
        .bind(session.final_sol_balance)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn close_session(
        &self,
        session_id: uuid::Uuid,
        ended_at: chrono::DateTime<chrono::Utc>,
        final_sol_balance: rust_decimal::Decimal,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE simulation_sessions
            SET ended_at = $2, final_sol_balance = $3
            WHERE id = $1
            "#,
        )
        .bind(session_id)
        .bind(ended_at)
        .bind(final_sol_balance)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn insert_trade(&self, trade: &SimulatedTrade) -> Result<i64> {
        let row = sqlx::query(
            r#"
            INSERT INTO simulated_trades (
                source_event_id, session_id, mint, side, sol_amount, token_amount,
                simulated_price, slippage_bps, delay_ms, executed_at,
                v_tokens_at_execution, v_sol_at_execution, realized_pnl
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING id
            "#,
        )
        .bind(trade.source_event_id)
        .bind(trade.session_id)
        .bind(&trade.mint)
        .bind(side_to_i16(trade.side))
        .bind(trade.sol_amount)
        .bind(trade.token_amount)
        .bind(trade.simulated_price)
        .bind(trade.slippage_bps)
        .bind(trade.delay_ms as i64)
        .bind(trade.executed_at)
        .bind(trade.v_tokens_at_execution)
        .bind(trade.v_sol_at_execution)
        .bind(trade.realized_pnl)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.try_get("id").map_err(Error::from)?)
    }

    pub async fn insert_snapshot(&self, snapshot: &PerformanceSnapshot) -> Result<i64> {
        let row = sqlx::query(
            r#"
            INSERT INTO performance_snapshots (
                session_id, taken_at, total_trades, win_count, loss_count,
                win_rate, avg_roi_percent, total_realized_pnl, total_unrealized_pnl,
                max_drawdown_percent, sol_balance, total_portfolio_value
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING id
            "#,
        )
        .bind(snapshot.session_id)
        .bind(snapshot.taken_at)
        .bind(snapshot.total_trades as i64)
        .bind(snapshot.win_count as i64)
        .bind(snapshot.loss_count as i64)
        .bind(snapshot.win_rate)
        .bind(snapshot.avg_roi_percent)
        .bind(snapshot.total_realized_pnl)
        .bind(snapshot.total_unrealized_pnl)
        .bind(snapshot.max_drawdown_percent)
        .bind(snapshot.sol_balance)
        .bind(snapshot.total_portfolio_value)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.try_get("id").map_err(Error::from)?)
    }
}

fn mode_to_i16(mode: SessionMode) -> i16 {
    match mode {
        SessionMode::Live => 0,
        SessionMode::Replay => 1,
    }
}

fn side_to_i16(side: Side) -> i16 {
    match side {
        Side::Buy => 0,
        Side::Sell => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_and_side_encode_distinctly() {
        assert_ne!(mode_to_i16(SessionMode::Live), mode_to_i16(SessionMode::Replay));
        assert_ne!(side_to_i16(Side::Buy), side_to_i16(Side::Sell));
    }
}
