//! Ingest Driver, Replay Driver, and Processor: the three tasks that carry
//! events from feed or store to a mutated `VirtualWallet` and persisted
//! `SimulatedTrade`s.

pub mod ingest;
pub mod processor;
pub mod replay;

pub use ingest::{IngestConfig, IngestDriver};
pub use processor::{Processor, ProcessorConfig};
pub use replay::ReplayDriver;
