//! Executor seam: the only place the pipeline branches between
//! simulation and a future live trading path.

use crate::resolver::PriceResolver;
use crate::slippage::SlippageModel;
use async_trait::async_trait;
use rust_decimal::Decimal;
use sim_core::types::{TradeExecutionResult, TradeIntent};
use sim_core::Error;
use tracing::debug;

/// A single operation, `execute`, behind which a live executor can later be
/// swapped in without changing the processor or anything downstream.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(&self, intent: &TradeIntent) -> Result<TradeExecutionResult, Error>;
}

/// Slippage parameters the simulation executor applies on top of whatever
/// curve state and cap ride along on the intent.
#[derive(Debug, Clone, Copy)]
pub struct SlippageConfig {
    pub base_slippage_bps: Decimal,
    pub price_impact_factor: Decimal,
}

/// The default core executor: a pure function of its inputs, no I/O, no
/// randomness.
#[derive(Debug, Clone, Copy)]
pub struct SimulationExecutor {
    slippage: SlippageConfig,
}

impl SimulationExecutor {
    pub fn new(slippage: SlippageConfig) -> Self {
        Self { slippage }
    }
}

#[async_trait]
impl Executor for SimulationExecutor {
    async fn execute(&self, intent: &TradeIntent) -> Result<TradeExecutionResult, Error> {
        let (amount, max_slippage_bps, v_tokens, v_sol, is_buy) = match intent {
            TradeIntent::Buy {
                sol_in,
                max_slippage_bps,
                v_tokens,
                v_sol,
                ..
            } => (*sol_in, *max_slippage_bps, *v_tokens, *v_sol, true),
            TradeIntent::Sell {
                tokens_in,
                max_slippage_bps,
                v_tokens,
                v_sol,
                ..
            } => (*tokens_in, *max_slippage_bps, *v_tokens, *v_sol, false),
        };

        let base = self.slippage.base_slippage_bps;
        let impact_factor = self.slippage.price_impact_factor;

        if SlippageModel::exceeds_cap(amount, v_sol, base, impact_factor, max_slippage_bps) {
            let bps = SlippageModel::total_bps(amount, v_sol, base, impact_factor, max_slippage_bps);
            debug!(mint = intent.mint(), bps = %bps, "executor rejected: slippage cap exceeded");
            return Ok(TradeExecutionResult::rejected(bps, "slippage cap exceeded"));
        }

        let total_bps = SlippageModel::total_bps(amount, v_sol, base, impact_factor, max_slippage_bps);

        if is_buy {
            let raw_tokens = PriceResolver::tokens_out(amount, v_tokens, v_sol)?;
            let actual_tokens = SlippageModel::apply_to_buy(raw_tokens, total_bps);
            let effective_price = if actual_tokens > Decimal::ZERO {
                amount / actual_tokens
            } else {
                Decimal::ZERO
            };
            Ok(TradeExecutionResult {
                success: true,
                actual_token_amount: actual_tokens,
                actual_sol_amount: amount,
                effective_price,
                slippage_bps: total_bps,
                error_reason: None,
            })
        } else {
            let raw_sol = PriceResolver::sol_out(amount, v_tokens, v_sol)?;
            let actual_sol = SlippageModel::apply_to_sell(raw_sol, total_bps);
            let effective_price = if amount > Decimal::ZERO {
                actual_sol / amount
            } else {
                Decimal::ZERO
            };
            Ok(TradeExecutionResult {
                success: true,
                actual_token_amount: amount,
                actual_sol_amount: actual_sol,
                effective_price,
                slippage_bps: total_bps,
                error_reason: None,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use sim_core::types::TradeIntent;

    fn executor() -> SimulationExecutor {
        SimulationExecutor::new(SlippageConfig {
            base_slippage_bps: dec!(100),
            price_impact_factor: dec!(1),
        })
    }

    #[tokio::test]
    async fn single_buy_applies_price_impact_slippage_to_the_fill() {
        let intent = TradeIntent::Buy {
            mint: "mint1".to_string(),
            sol_in: dec!(1.0),
            max_slippage_bps: dec!(1000),
            v_tokens: dec!(1_000_000_000),
            v_sol: dec!(30.0),
            source_event_id: 1,
            delay_ms: 0,
        };
        let result = executor().execute(&intent).await.unwrap();
        assert!(result.success);
        // raw tokens = 1e9/31 (constant-product math), total_bps ~= 433.33
        let raw_tokens = dec!(1_000_000_000) / dec!(31);
        let expected_bps = dec!(100) + (dec!(1) / dec!(30)) * dec!(1) * dec!(10000);
        assert_eq!(result.slippage_bps, expected_bps);
        let expected_tokens = raw_tokens * (Decimal::ONE - expected_bps / dec!(10000));
        assert_eq!(result.actual_token_amount, expected_tokens);
    }

    #[tokio::test]
    async fn rejects_when_slippage_exceeds_cap() {
        let intent = TradeIntent::Buy {
            mint: "mint1".to_string(),
            sol_in: dec!(1.0),
            max_slippage_bps: Decimal::ZERO,
            v_tokens: dec!(1_000_000_000),
            v_sol: dec!(30.0),
            source_event_id: 1,
            delay_ms: 0,
        };
        let result = executor().execute(&intent).await.unwrap();
        assert!(!result.success);
        assert_eq!(result.actual_token_amount, Decimal::ZERO);
        assert!(result.error_reason.is_some());
    }
}
