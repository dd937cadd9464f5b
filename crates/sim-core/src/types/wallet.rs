//! VirtualWallet: the single-owner, single-mutator portfolio state.

use super::position::Position;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Mutable, single-owner wallet state. Mutated only by the Processor, through
/// `portfolio::Portfolio`'s associated functions.
#[derive(Debug, Clone, PartialEq)]
pub struct VirtualWallet {
    pub sol_balance: Decimal,
    pub positions: HashMap<String, Position>,
    pub total_realized_pnl: Decimal,
    pub cumulative_roi_percent: Decimal,
    pub total_trade_count: u64,
    pub win_count: u64,
    pub loss_count: u64,
    pub high_water_mark: Decimal,
    pub max_drawdown_percent: Decimal,
}

impl VirtualWallet {
    /// Created at session start with `sol_balance = initial`, `high_water_mark = initial`.
    pub fn new(initial_sol_balance: Decimal) -> Self {
        Self {
            sol_balance: initial_sol_balance,
            positions: HashMap::new(),
            total_realized_pnl: Decimal::ZERO,
            cumulative_roi_percent: Decimal::ZERO,
            total_trade_count: 0,
            win_count: 0,
            loss_count: 0,
            high_water_mark: initial_sol_balance,
            max_drawdown_percent: Decimal::ZERO,
        }
    }

    pub fn reset(&mut self, initial_sol_balance: Decimal) {
        *self = Self::new(initial_sol_balance);
    }
}
