//! Slippage Model: deterministic, configuration-parameterized, no
//! random component.

use rust_decimal::Decimal;

pub struct SlippageModel;

impl SlippageModel {
    /// `impact_bps = (sol_amount / v_sol) * price_impact_factor * 10000`
    /// `total_bps  = min(base_slippage_bps + impact_bps, max_slippage_bps)`
    /// Returns `base_slippage_bps` unchanged when `v_sol <= 0`.
    pub fn total_bps(
        sol_amount: Decimal,
        v_sol: Decimal,
        base_slippage_bps: Decimal,
        price_impact_factor: Decimal,
        max_slippage_bps: Decimal,
    ) -> Decimal {
        if v_sol <= Decimal::ZERO {
            return base_slippage_bps;
        }
        let impact_bps = (sol_amount / v_sol) * price_impact_factor * Decimal::from(10_000);
        (base_slippage_bps + impact_bps).min(max_slippage_bps)
    }

    /// `true` when the intent must be rejected — computed on the
    /// *uncapped* total before any clamping.
    pub fn exceeds_cap(
        sol_amount: Decimal,
        v_sol: Decimal,
        base_slippage_bps: Decimal,
        price_impact_factor: Decimal,
        max_slippage_bps: Decimal,
    ) -> bool {
        if v_sol <= Decimal::ZERO {
            return base_slippage_bps > max_slippage_bps;
        }
        let impact_bps = (sol_amount / v_sol) * price_impact_factor * Decimal::from(10_000);
        base_slippage_bps + impact_bps > max_slippage_bps
    }

    /// Apply slippage to a raw buy fill: `raw_tokens_out * (1 - total_bps/10000)`.
    pub fn apply_to_buy(raw_tokens_out: Decimal, total_bps: Decimal) -> Decimal {
        raw_tokens_out * (Decimal::ONE - total_bps / Decimal::from(10_000))
    }

    /// Apply slippage to a raw sell fill: `raw_sol_out * (1 - total_bps/10000)`.
    pub fn apply_to_sell(raw_sol_out: Decimal, total_bps: Decimal) -> Decimal {
        raw_sol_out * (Decimal::ONE - total_bps / Decimal::from(10_000))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn total_bps_adds_price_impact_to_base_when_under_cap() {
        // 100 + (1.0/30.0) * 1 * 10000 ~= 433.33 bps, capped at 1000 -> unchanged
        let bps = SlippageModel::total_bps(dec!(1), dec!(30), dec!(100), dec!(1), dec!(1000));
        let expected = dec!(100) + (dec!(1) / dec!(30)) * dec!(1) * dec!(10000);
        assert_eq!(bps, expected);
        assert!(bps < dec!(1000));
    }

    #[test]
    fn total_bps_saturates_at_cap() {
        let bps = SlippageModel::total_bps(dec!(100), dec!(1), dec!(100), dec!(1), dec!(500));
        assert_eq!(bps, dec!(500));
    }

    #[test]
    fn total_bps_falls_back_to_base_when_v_sol_nonpositive() {
        let bps = SlippageModel::total_bps(dec!(1), dec!(0), dec!(250), dec!(1), dec!(1000));
        assert_eq!(bps, dec!(250));
    }

    #[test]
    fn zero_max_slippage_rejects_everything() {
        assert!(SlippageModel::exceeds_cap(
            dec!(0.0001),
            dec!(1000),
            Decimal::ZERO,
            dec!(1),
            Decimal::ZERO
        ));
    }

    #[test]
    fn apply_to_buy_reduces_fill_by_bps() {
        // 1000 tokens at 100 bps (1%) -> 990
        let filled = SlippageModel::apply_to_buy(dec!(1000), dec!(100));
        assert_eq!(filled, dec!(990));
    }
}
