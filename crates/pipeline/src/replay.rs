//! Replay Driver: drives a bounded historical range through the same
//! downstream pipeline as live ingest, then closes the queue.

use chrono::{DateTime, Utc};
use event_store::EventStore;
use futures_util::{pin_mut, StreamExt};
use sim_core::types::{EventSource, TradeEvent};
use sim_core::Result;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

pub struct ReplayDriver {
    store: Arc<EventStore>,
    queue_tx: mpsc::Sender<TradeEvent>,
    filter_wallets: Vec<String>,
}

impl ReplayDriver {
    pub fn new(store: Arc<EventStore>, queue_tx: mpsc::Sender<TradeEvent>, filter_wallets: Vec<String>) -> Self {
        Self {
            store,
            queue_tx,
            filter_wallets,
        }
    }

    /// Reads `[from, to]`, applies the wallet allowlist in-memory, stamps
    /// every event `Replay`, and enqueues it. Must not run alongside a live
    /// ingest driver in the same process.
    pub async fn run(self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<()> {
        let mut enqueued = 0usize;
        let stream = self.store.stream_range(from, to);
        pin_mut!(stream);

        while let Some(event) = stream.next().await {
            let mut event = event?;
            if !self.filter_wallets.is_empty() && !self.filter_wallets.contains(&event.trader) {
                continue;
            }
            event.source = EventSource::Replay;
            if self.queue_tx.send(event).await.is_err() {
                warn!("processor queue closed mid-replay, stopping early");
                break;
            }
            enqueued += 1;
        }

        info!(enqueued, "replay complete");
        Ok(())
    }
}
