//! Ingest Driver: `Disconnected -> Connecting -> Subscribed -> Receiving`,
//! batching events to the store while forwarding them to the processor
//! queue in the same pass.

use event_store::EventStore;
use feed::FeedClient;
use sim_core::types::TradeEvent;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy)]
pub struct IngestConfig {
    pub batch_size: usize,
    pub flush_interval: Duration,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            flush_interval: Duration::from_millis(100),
        }
    }
}

enum State {
    Disconnected,
    Connecting,
    Subscribed,
    Receiving,
}

/// Drives one feed connection, batches events to the event store, and
/// forwards each admitted event to the processor queue.
pub struct IngestDriver {
    feed: FeedClient,
    store: Arc<EventStore>,
    queue_tx: mpsc::Sender<TradeEvent>,
    tracked_wallets: Vec<String>,
    config: IngestConfig,
    shutdown: watch::Receiver<bool>,
}

impl IngestDriver {
    pub fn new(
        feed: FeedClient,
        store: Arc<EventStore>,
        queue_tx: mpsc::Sender<TradeEvent>,
        tracked_wallets: Vec<String>,
        config: IngestConfig,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            feed,
            store,
            queue_tx,
            tracked_wallets,
            config,
            shutdown,
        }
    }

    /// Runs the state machine until shutdown is signalled, flushing and
    /// closing the queue on the way out.
    pub async fn run(mut self) {
        let mut state = State::Disconnected;
        let mut batch: Vec<TradeEvent> = Vec::with_capacity(self.config.batch_size);
        let mut flush_timer = tokio::time::interval(self.config.flush_interval);
        flush_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            if *self.shutdown.borrow() {
                self.flush_and_forward(&mut batch).await;
                break;
            }

            match state {
                State::Disconnected => {
                    state = State::Connecting;
                }
                State::Connecting => match self.feed.connect_and_subscribe(&self.tracked_wallets).await {
                    Ok(()) => state = State::Subscribed,
                    Err(e) => {
                        warn!(error = %e, "feed connect failed, backing off");
                        self.flush_and_forward(&mut batch).await;
                        if self.sleep_or_shutdown().await {
                            break;
                        }
                        state = State::Disconnected;
                    }
                },
                State::Subscribed => {
                    state = State::Receiving;
                }
                State::Receiving => {
                    tokio::select! {
                        biased;
                        _ = self.shutdown.changed() => {
                            self.flush_and_forward(&mut batch).await;
                            break;
                        }
                        _ = flush_timer.tick() => {
                            self.flush_and_forward(&mut batch).await;
                        }
                        event = self.feed.receive() => {
                            match event {
                                Some(event) => {
                                    batch.push(event);
                                    if batch.len() >= self.config.batch_size {
                                        self.flush_and_forward(&mut batch).await;
                                    }
                                }
                                None => {
                                    self.flush_and_forward(&mut batch).await;
                                    if self.sleep_or_shutdown().await {
                                        break;
                                    }
                                    state = State::Disconnected;
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    /// Waits out the reconnect backoff, or returns `true` early if shutdown
    /// fires first.
    async fn sleep_or_shutdown(&mut self) -> bool {
        let delay = self.feed.next_reconnect_delay();
        tokio::select! {
            _ = tokio::time::sleep(delay) => false,
            _ = self.shutdown.changed() => true,
        }
    }

    /// Persists the batch, assigns the store-issued id to each event, and
    /// forwards them to the processor in order. A persistence failure drops
    /// the batch rather than blocking the pipeline.
    async fn flush_and_forward(&mut self, batch: &mut Vec<TradeEvent>) {
        if batch.is_empty() {
            return;
        }
        let drained: Vec<TradeEvent> = batch.drain(..).collect();
        match self.store.insert_batch(&drained).await {
            Ok(ids) => {
                for mut event in drained {
                    event.id = ids.get(&event.signature).copied();
                    if event.id.is_none() {
                        debug!(signature = %event.signature, "event batch flush did not resolve an id, dropping");
                        continue;
                    }
                    if self.queue_tx.send(event).await.is_err() {
                        info!("processor queue closed, stopping ingest");
                        return;
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, count = drained.len(), "trade event batch flush failed, dropping batch");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_batch_size_and_interval_match_spec_defaults() {
        let config = IngestConfig::default();
        assert_eq!(config.batch_size, 50);
        assert_eq!(config.flush_interval, Duration::from_millis(100));
    }
}
