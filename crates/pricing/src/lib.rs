//! Constant-product price resolver, deterministic slippage model, and the
//! simulation executor.

pub mod executor;
pub mod resolver;
pub mod slippage;

pub use executor::{Executor, SimulationExecutor, SlippageConfig};
pub use resolver::PriceResolver;
pub use slippage::SlippageModel;
