//! Portfolio: the single mutator of `VirtualWallet`.
//!
//! Intentionally a unit struct of associated functions rather than a type
//! wrapping the wallet — the processor owns the one `VirtualWallet` and calls
//! through here, so there is nothing this type would otherwise hold.

use rust_decimal::Decimal;
use sim_core::types::{Position, VirtualWallet};
use tracing::warn;

pub struct Portfolio;

impl Portfolio {
    /// Applies a buy. No-op (logged) when `sol_balance < sol_amount`.
    /// Returns whether the buy was applied.
    pub fn record_buy(
        wallet: &mut VirtualWallet,
        mint: &str,
        sol_amount: Decimal,
        token_amount: Decimal,
        v_sol_at_open: Decimal,
        opened_at: chrono::DateTime<chrono::Utc>,
    ) -> bool {
        if wallet.sol_balance < sol_amount {
            warn!(mint, %sol_amount, balance = %wallet.sol_balance, "buy rejected: insufficient sol balance");
            return false;
        }

        wallet.sol_balance -= sol_amount;
        wallet.total_trade_count += 1;

        match wallet.positions.get_mut(mint) {
            Some(pos) => {
                pos.total_cost_basis += sol_amount;
                pos.token_balance += token_amount;
                pos.buy_count += 1;
            }
            None => {
                let mut pos = Position::new(mint, opened_at, v_sol_at_open);
                pos.total_cost_basis = sol_amount;
                pos.token_balance = token_amount;
                pos.buy_count = 1;
                wallet.positions.insert(mint.to_string(), pos);
            }
        }
        true
    }

    /// Applies a sell. Returns realized PnL; `0` and no mutation when no
    /// open position exists for `mint`.
    pub fn record_sell(
        wallet: &mut VirtualWallet,
        mint: &str,
        requested_tokens: Decimal,
        requested_sol: Decimal,
    ) -> Decimal {
        let (sold_tokens, cost_basis_sold, actual_sol, realized_pnl, closes) = {
            let pos = match wallet.positions.get(mint) {
                Some(pos) => pos,
                None => return Decimal::ZERO,
            };
            let sold_tokens = requested_tokens.min(pos.token_balance);
            let proportion_sold = if pos.token_balance > Decimal::ZERO {
                sold_tokens / pos.token_balance
            } else {
                Decimal::ZERO
            };
            let cost_basis_sold = pos.total_cost_basis * proportion_sold;
            let actual_sol = if requested_tokens > Decimal::ZERO {
                requested_sol * (sold_tokens / requested_tokens)
            } else {
                Decimal::ZERO
            };
            let realized_pnl = actual_sol - cost_basis_sold;
            let closes = pos.token_balance - sold_tokens <= Decimal::ZERO;
            (sold_tokens, cost_basis_sold, actual_sol, realized_pnl, closes)
        };

        wallet.sol_balance += actual_sol;
        wallet.total_realized_pnl += realized_pnl;
        wallet.total_trade_count += 1;
        if realized_pnl > Decimal::ZERO {
            wallet.win_count += 1;
        } else {
            wallet.loss_count += 1;
        }
        if cost_basis_sold > Decimal::ZERO {
            wallet.cumulative_roi_percent += (realized_pnl / cost_basis_sold) * Decimal::from(100);
        }

        if closes {
            wallet.positions.remove(mint);
        } else if let Some(pos) = wallet.positions.get_mut(mint) {
            pos.token_balance -= sold_tokens;
            pos.total_cost_basis -= cost_basis_sold;
            pos.sell_count += 1;
        }

        realized_pnl
    }

    /// `Σ (balance · price_fn(mint) − cost_basis)` over open positions.
    pub fn unrealized_pnl(wallet: &VirtualWallet, price_fn: impl Fn(&str) -> Decimal) -> Decimal {
        wallet
            .positions
            .values()
            .filter(|p| p.token_balance > Decimal::ZERO)
            .map(|p| p.token_balance * price_fn(&p.mint) - p.total_cost_basis)
            .sum()
    }

    /// `sol_balance + Σ balance · price_fn(mint)`.
    pub fn total_value(wallet: &VirtualWallet, price_fn: impl Fn(&str) -> Decimal) -> Decimal {
        let positions_value: Decimal = wallet
            .positions
            .values()
            .map(|p| p.token_balance * price_fn(&p.mint))
            .sum();
        wallet.sol_balance + positions_value
    }

    pub fn update_drawdown(wallet: &mut VirtualWallet, current_value: Decimal) {
        wallet.high_water_mark = wallet.high_water_mark.max(current_value);
        if wallet.high_water_mark > Decimal::ZERO {
            let dd_pct = (wallet.high_water_mark - current_value) / wallet.high_water_mark
                * Decimal::from(100);
            wallet.max_drawdown_percent = wallet.max_drawdown_percent.max(dd_pct);
        }
    }

    pub fn reset(wallet: &mut VirtualWallet, initial_sol_balance: Decimal) {
        wallet.reset(initial_sol_balance);
    }
}
