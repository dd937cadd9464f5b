//! Metrics: curve-state cache and snapshot derivation.

use crate::wallet::Portfolio;
use rust_decimal::Decimal;
use sim_core::types::{PerformanceSnapshot, VirtualWallet};
use std::collections::HashMap;
use uuid::Uuid;

/// Tracks the most recently observed `(v_tokens, v_sol)` per mint so the
/// processor can mark positions to market even for mints with no fresh
/// event on the current tick.
#[derive(Debug, Default)]
pub struct Metrics {
    curve_cache: HashMap<String, (Decimal, Decimal)>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unconditional — even events the processor later filters out still
    /// inform pricing of later positions.
    pub fn update_curve(&mut self, mint: impl Into<String>, v_tokens: Decimal, v_sol: Decimal) {
        self.curve_cache.insert(mint.into(), (v_tokens, v_sol));
    }

    /// Spot price from the cache, or `0` when the mint has never been seen.
    pub fn resolve_current_price(&self, mint: &str) -> Decimal {
        match self.curve_cache.get(mint) {
            Some((v_tokens, v_sol)) if *v_tokens > Decimal::ZERO => *v_sol / *v_tokens,
            _ => Decimal::ZERO,
        }
    }

    pub fn take_snapshot(
        &self,
        session_id: Uuid,
        wallet: &VirtualWallet,
        taken_at: chrono::DateTime<chrono::Utc>,
    ) -> PerformanceSnapshot {
        let price_fn = |mint: &str| self.resolve_current_price(mint);
        let win_count = wallet.win_count;
        let loss_count = wallet.loss_count;
        let decided = win_count + loss_count;

        let win_rate = if decided > 0 {
            Decimal::from(win_count) / Decimal::from(decided) * Decimal::from(100)
        } else {
            Decimal::ZERO
        };
        let avg_roi_percent = if decided > 0 {
            wallet.cumulative_roi_percent / Decimal::from(decided)
        } else {
            Decimal::ZERO
        };

        PerformanceSnapshot {
            id: None,
            session_id,
            taken_at,
            total_trades: wallet.total_trade_count,
            win_count,
            loss_count,
            win_rate,
            avg_roi_percent,
            total_realized_pnl: wallet.total_realized_pnl,
            total_unrealized_pnl: Portfolio::unrealized_pnl(wallet, price_fn),
            max_drawdown_percent: wallet.max_drawdown_percent,
            sol_balance: wallet.sol_balance,
            total_portfolio_value: Portfolio::total_value(wallet, price_fn),
        }
    }

    pub fn reset(&mut self) {
        self.curve_cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    #[test]
    fn resolve_current_price_is_zero_for_unseen_mint() {
        let metrics = Metrics::new();
        assert_eq!(metrics.resolve_current_price("mint1"), Decimal::ZERO);
    }

    #[test]
    fn resolve_current_price_reflects_latest_curve_state() {
        let mut metrics = Metrics::new();
        metrics.update_curve("mint1", dec!(1_000_000_000), dec!(30));
        assert_eq!(metrics.resolve_current_price("mint1"), dec!(30) / dec!(1_000_000_000));

        metrics.update_curve("mint1", dec!(900_000_000), dec!(33));
        assert_eq!(metrics.resolve_current_price("mint1"), dec!(33) / dec!(900_000_000));
    }

    #[test]
    fn take_snapshot_zero_denominator_is_zero_not_nan() {
        let metrics = Metrics::new();
        let wallet = VirtualWallet::new(dec!(10.0));
        let snap = metrics.take_snapshot(Uuid::new_v4(), &wallet, Utc::now());
        assert_eq!(snap.win_rate, Decimal::ZERO);
        assert_eq!(snap.avg_roi_percent, Decimal::ZERO);
        assert_eq!(snap.total_portfolio_value, dec!(10.0));
    }

    #[test]
    fn take_snapshot_computes_win_rate_and_avg_roi() {
        let mut metrics = Metrics::new();
        let mut wallet = VirtualWallet::new(dec!(10.0));
        metrics.update_curve("mint1", dec!(1_000_000_000), dec!(30));

        crate::wallet::Portfolio::record_buy(&mut wallet, "mint1", dec!(1.0), dec!(100), dec!(30), Utc::now());
        crate::wallet::Portfolio::record_sell(&mut wallet, "mint1", dec!(100), dec!(1.5));

        let snap = metrics.take_snapshot(Uuid::new_v4(), &wallet, Utc::now());
        assert_eq!(snap.win_count, 1);
        assert_eq!(snap.loss_count, 0);
        assert_eq!(snap.win_rate, dec!(100));
        assert_eq!(snap.total_trades, 2);
    }

    #[test]
    fn reset_clears_curve_cache() {
        let mut metrics = Metrics::new();
        metrics.update_curve("mint1", dec!(1_000_000_000), dec!(30));
        metrics.reset();
        assert_eq!(metrics.resolve_current_price("mint1"), Decimal::ZERO);
    }
}
