//! Position: a single open (or just-closed) holding inside a VirtualWallet.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A mutable position owned by exactly one `VirtualWallet`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub mint: String,
    pub token_balance: Decimal,
    pub total_cost_basis: Decimal,
    pub opened_at: DateTime<Utc>,
    /// Snapshot of `v_sol_post` at first buy; comparative reporting only.
    pub v_sol_at_open: Decimal,
    pub buy_count: u32,
    pub sell_count: u32,
}

impl Position {
    pub fn new(mint: impl Into<String>, opened_at: DateTime<Utc>, v_sol_at_open: Decimal) -> Self {
        Self {
            mint: mint.into(),
            token_balance: Decimal::ZERO,
            total_cost_basis: Decimal::ZERO,
            opened_at,
            v_sol_at_open,
            buy_count: 0,
            sell_count: 0,
        }
    }

    /// VWAP cost basis per token; `0` while the position holds no tokens.
    pub fn avg_entry_price(&self) -> Decimal {
        if self.token_balance > Decimal::ZERO {
            self.total_cost_basis / self.token_balance
        } else {
            Decimal::ZERO
        }
    }

    pub fn is_closed(&self) -> bool {
        self.token_balance <= Decimal::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn avg_entry_price_is_vwap() {
        let mut pos = Position::new("mint1", Utc::now(), dec!(30.0));
        pos.total_cost_basis = dec!(2.0);
        pos.token_balance = dec!(100.0);
        // 2.0 SOL / 100.0 tokens = 0.02 SOL per token
        assert_eq!(pos.avg_entry_price(), dec!(0.02));
    }

    #[test]
    fn zero_balance_avg_price_is_zero() {
        let pos = Position::new("mint1", Utc::now(), dec!(30.0));
        assert_eq!(pos.avg_entry_price(), Decimal::ZERO);
        assert!(pos.is_closed());
    }
}
