//! Executor contract types: a tagged-variant redesign of the overloaded intent field.

use rust_decimal::Decimal;

/// What the processor asks the executor to do with one event.
///
/// The source system overloads a single numeric field to mean "SOL in" on
/// buys and "tokens in" on sells. This implementation uses a tagged variant
/// instead so the two fill computations can never be confused at a call site.
#[derive(Debug, Clone, PartialEq)]
pub enum TradeIntent {
    Buy {
        mint: String,
        sol_in: Decimal,
        max_slippage_bps: Decimal,
        v_tokens: Decimal,
        v_sol: Decimal,
        source_event_id: i64,
        delay_ms: u64,
    },
    Sell {
        mint: String,
        tokens_in: Decimal,
        max_slippage_bps: Decimal,
        v_tokens: Decimal,
        v_sol: Decimal,
        source_event_id: i64,
        delay_ms: u64,
    },
}

impl TradeIntent {
    pub fn mint(&self) -> &str {
        match self {
            TradeIntent::Buy { mint, .. } | TradeIntent::Sell { mint, .. } => mint,
        }
    }

    pub fn source_event_id(&self) -> i64 {
        match self {
            TradeIntent::Buy { source_event_id, .. }
            | TradeIntent::Sell { source_event_id, .. } => *source_event_id,
        }
    }

    pub fn delay_ms(&self) -> u64 {
        match self {
            TradeIntent::Buy { delay_ms, .. } | TradeIntent::Sell { delay_ms, .. } => *delay_ms,
        }
    }
}

/// Outcome of one executor invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeExecutionResult {
    pub success: bool,
    pub actual_token_amount: Decimal,
    pub actual_sol_amount: Decimal,
    pub effective_price: Decimal,
    pub slippage_bps: Decimal,
    pub error_reason: Option<String>,
}

impl TradeExecutionResult {
    pub fn rejected(slippage_bps: Decimal, reason: impl Into<String>) -> Self {
        Self {
            success: false,
            actual_token_amount: Decimal::ZERO,
            actual_sol_amount: Decimal::ZERO,
            effective_price: Decimal::ZERO,
            slippage_bps,
            error_reason: Some(reason.into()),
        }
    }
}
