//! Portfolio mutation and derived metrics.
//!
//! `wallet` is the sole mutator of `sim_core::types::VirtualWallet` — the
//! processor is the only caller, so no internal locking is needed.

pub mod metrics;
pub mod wallet;

pub use metrics::Metrics;
pub use wallet::Portfolio;
