//! Processor: the single reader of the queue, and the only task that
//! mutates the wallet.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use event_store::TradeStore;
use pricing::Executor;
use portfolio::{Metrics, Portfolio};
use rust_decimal::Decimal;
use sim_core::types::{
    EventSource, Side, SimulatedTrade, SimulationSession, TradeEvent, TradeExecutionResult,
    TradeIntent, VirtualWallet,
};
use sim_core::Result;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy)]
pub struct ProcessorConfig {
    pub position_size_sol: Decimal,
    pub max_slippage_bps: Decimal,
    pub execution_delay_ms: u64,
    pub skip_migrated_tokens: bool,
    pub max_trades_per_wallet_per_minute: u32,
    pub snapshot_interval: Duration,
}

pub struct Processor {
    queue_rx: mpsc::Receiver<TradeEvent>,
    executor: Arc<dyn Executor>,
    trade_store: Arc<TradeStore>,
    session: SimulationSession,
    config: ProcessorConfig,
    wallet: VirtualWallet,
    metrics: Metrics,
    rate_windows: HashMap<String, VecDeque<DateTime<Utc>>>,
    last_snapshot_at: DateTime<Utc>,
}

impl Processor {
    pub fn new(
        queue_rx: mpsc::Receiver<TradeEvent>,
        executor: Arc<dyn Executor>,
        trade_store: Arc<TradeStore>,
        session: SimulationSession,
        config: ProcessorConfig,
    ) -> Self {
        let wallet = VirtualWallet::new(session.initial_sol_balance);
        Self {
            queue_rx,
            executor,
            trade_store,
            session,
            config,
            wallet,
            metrics: Metrics::new(),
            rate_windows: HashMap::new(),
            last_snapshot_at: Utc::now(),
        }
    }

    /// Drains the queue until it closes, then finalizes the session.
    /// Returns the final wallet state.
    pub async fn run(mut self) -> Result<VirtualWallet> {
        if let Err(e) = self.trade_store.insert_session(&self.session).await {
            warn!(error = %e, session_id = %self.session.id, "failed to persist session start");
        }

        while let Some(event) = self.queue_rx.recv().await {
            self.process_event(event).await;
        }

        self.finalize().await;
        Ok(self.wallet)
    }

    async fn process_event(&mut self, event: TradeEvent) {
        self.metrics.update_curve(event.mint.clone(), event.v_tokens_post, event.v_sol_post);

        if self.config.skip_migrated_tokens && event.is_migrated() {
            debug!(mint = %event.mint, pool = ?event.pool, "discarding migrated-pool event");
            return;
        }

        if !self.admit_rate_limit(&event.trader, event.received_at) {
            debug!(trader = %event.trader, "rate limit exceeded, dropping event");
            return;
        }

        let delay_ms = if event.source == EventSource::Live {
            self.config.execution_delay_ms
        } else {
            0
        };
        if delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }

        let Some(source_event_id) = event.id else {
            warn!(signature = %event.signature, "event has no store id, cannot build intent");
            return;
        };

        let Some(intent) = self.build_intent(&event, source_event_id, delay_ms) else {
            return;
        };

        let result = match self.executor.execute(&intent).await {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, mint = %event.mint, "executor invocation failed");
                return;
            }
        };

        if !result.success {
            debug!(mint = %event.mint, reason = ?result.error_reason, "trade rejected by executor");
            return;
        }

        self.apply_result(&event, &intent, &result).await;
    }

    fn build_intent(&self, event: &TradeEvent, source_event_id: i64, delay_ms: u64) -> Option<TradeIntent> {
        match event.side {
            Side::Buy => {
                if self.wallet.sol_balance < self.config.position_size_sol {
                    debug!(
                        mint = %event.mint,
                        balance = %self.wallet.sol_balance,
                        "buy skipped: insufficient sol balance"
                    );
                    return None;
                }
                Some(TradeIntent::Buy {
                    mint: event.mint.clone(),
                    sol_in: self.config.position_size_sol,
                    max_slippage_bps: self.config.max_slippage_bps,
                    v_tokens: event.v_tokens_post,
                    v_sol: event.v_sol_post,
                    source_event_id,
                    delay_ms,
                })
            }
            Side::Sell => {
                let Some(position) = self.wallet.positions.get(&event.mint) else {
                    debug!(mint = %event.mint, "sell skipped: no open position");
                    return None;
                };
                Some(TradeIntent::Sell {
                    mint: event.mint.clone(),
                    tokens_in: position.token_balance,
                    max_slippage_bps: self.config.max_slippage_bps,
                    v_tokens: event.v_tokens_post,
                    v_sol: event.v_sol_post,
                    source_event_id,
                    delay_ms,
                })
            }
        }
    }

    async fn apply_result(&mut self, event: &TradeEvent, intent: &TradeIntent, result: &TradeExecutionResult) {
        let realized_pnl = match intent {
            TradeIntent::Buy { v_sol, .. } => {
                let applied = Portfolio::record_buy(
                    &mut self.wallet,
                    &event.mint,
                    result.actual_sol_amount,
                    result.actual_token_amount,
                    *v_sol,
                    event.received_at,
                );
                if !applied {
                    return;
                }
                None
            }
            TradeIntent::Sell { tokens_in, .. } => Some(Portfolio::record_sell(
                &mut self.wallet,
                &event.mint,
                *tokens_in,
                result.actual_sol_amount,
            )),
        };

        let current_value = Portfolio::total_value(&self.wallet, |mint| self.metrics.resolve_current_price(mint));
        Portfolio::update_drawdown(&mut self.wallet, current_value);

        let trade = SimulatedTrade {
            id: None,
            source_event_id: intent.source_event_id(),
            session_id: self.session.id,
            mint: event.mint.clone(),
            side: event.side,
            sol_amount: result.actual_sol_amount,
            token_amount: result.actual_token_amount,
            simulated_price: result.effective_price,
            slippage_bps: result.slippage_bps,
            delay_ms: intent.delay_ms(),
            executed_at: Utc::now(),
            v_tokens_at_execution: event.v_tokens_post,
            v_sol_at_execution: event.v_sol_post,
            realized_pnl,
        };
        if let Err(e) = self.trade_store.insert_trade(&trade).await {
            warn!(error = %e, mint = %event.mint, "failed to persist simulated trade");
        }

        self.maybe_snapshot().await;
    }

    async fn maybe_snapshot(&mut self) {
        let now = Utc::now();
        let elapsed = now - self.last_snapshot_at;
        if elapsed
            < ChronoDuration::from_std(self.config.snapshot_interval).unwrap_or(ChronoDuration::zero())
        {
            return;
        }
        let snapshot = self.metrics.take_snapshot(self.session.id, &self.wallet, now);
        if let Err(e) = self.trade_store.insert_snapshot(&snapshot).await {
            warn!(error = %e, "failed to persist performance snapshot");
        }
        self.last_snapshot_at = now;
    }

    fn admit_rate_limit(&mut self, trader: &str, now: DateTime<Utc>) -> bool {
        let window = self.rate_windows.entry(trader.to_string()).or_default();
        let cutoff = now - ChronoDuration::seconds(60);
        while matches!(window.front(), Some(ts) if *ts < cutoff) {
            window.pop_front();
        }
        if (window.len() as u32) < self.config.max_trades_per_wallet_per_minute {
            window.push_back(now);
            true
        } else {
            false
        }
    }

    async fn finalize(&mut self) {
        let now = Utc::now();
        let snapshot = self.metrics.take_snapshot(self.session.id, &self.wallet, now);
        if let Err(e) = self.trade_store.insert_snapshot(&snapshot).await {
            warn!(error = %e, "failed to persist final performance snapshot");
        }
        if let Err(e) = self
            .trade_store
            .close_session(self.session.id, now, self.wallet.sol_balance)
            .await
        {
            warn!(error = %e, session_id = %self.session.id, "failed to close session");
        }
        info!(
            session_id = %self.session.id,
            final_sol_balance = %self.wallet.sol_balance,
            total_trades = self.wallet.total_trade_count,
            win_count = self.wallet.win_count,
            loss_count = self.wallet.loss_count,
            max_drawdown_percent = %self.wallet.max_drawdown_percent,
            "session finalized"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use sim_core::types::SessionMode;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct AlwaysFillExecutor {
        calls: AtomicU32,
    }

    #[async_trait]
    impl Executor for AlwaysFillExecutor {
        async fn execute(&self, intent: &TradeIntent) -> Result<TradeExecutionResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match intent {
                TradeIntent::Buy { sol_in, v_tokens, v_sol, .. } => Ok(TradeExecutionResult {
                    success: true,
                    actual_token_amount: *sol_in * *v_tokens / *v_sol,
                    actual_sol_amount: *sol_in,
                    effective_price: *v_sol / *v_tokens,
                    slippage_bps: Decimal::ZERO,
                    error_reason: None,
                }),
                TradeIntent::Sell { tokens_in, v_tokens, v_sol, .. } => Ok(TradeExecutionResult {
                    success: true,
                    actual_token_amount: *tokens_in,
                    actual_sol_amount: *tokens_in * *v_sol / *v_tokens,
                    effective_price: *v_sol / *v_tokens,
                    slippage_bps: Decimal::ZERO,
                    error_reason: None,
                }),
            }
        }
    }

    fn sample_event(id: i64, trader: &str, side: Side, pool: Option<&str>) -> TradeEvent {
        TradeEvent {
            id: Some(id),
            signature: format!("sig-{id}"),
            mint: "mint1".to_string(),
            trader: trader.to_string(),
            side,
            token_amount: dec!(1),
            sol_amount: dec!(1),
            new_token_balance: dec!(1),
            curve_key: "curve1".to_string(),
            v_tokens_post: dec!(1_000_000_000),
            v_sol_post: dec!(30),
            market_cap_sol: dec!(30),
            pool: pool.map(|p| p.to_string()),
            received_at: Utc::now(),
            ingested_at: None,
            source: EventSource::Live,
        }
    }

    fn test_config() -> ProcessorConfig {
        ProcessorConfig {
            position_size_sol: dec!(1.0),
            max_slippage_bps: dec!(1000),
            execution_delay_ms: 0,
            skip_migrated_tokens: true,
            max_trades_per_wallet_per_minute: 2,
            snapshot_interval: Duration::from_secs(3600),
        }
    }

    fn unconnected_trade_store() -> Arc<TradeStore> {
        // `connect_lazy` builds the pool without dialing the database; fine
        // here since these tests never issue a query through it.
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/copytrade_sim_test")
            .expect("lazy pool construction");
        Arc::new(TradeStore::new(pool))
    }

    #[test]
    fn rate_limit_admits_up_to_configured_max_per_window() {
        let (_tx, rx) = mpsc::channel(1);
        let mut processor = Processor::new(
            rx,
            Arc::new(AlwaysFillExecutor { calls: AtomicU32::new(0) }),
            unconnected_trade_store(),
            SimulationSession::start(SessionMode::Live, "{}".to_string(), dec!(10.0)),
            test_config(),
        );
        let now = Utc::now();
        assert!(processor.admit_rate_limit("trader1", now));
        assert!(processor.admit_rate_limit("trader1", now));
        assert!(!processor.admit_rate_limit("trader1", now));
    }

    #[test]
    fn migrated_event_is_detected_for_skip() {
        let migrated = sample_event(1, "trader1", Side::Buy, Some("raydium_v4"));
        assert!(migrated.is_migrated());
        let on_curve = sample_event(2, "trader1", Side::Buy, Some("pump"));
        assert!(!on_curve.is_migrated());
    }
}
