//! Core domain types for the copy-trading simulator.

pub mod event;
pub mod intent;
pub mod position;
pub mod session;
pub mod snapshot;
pub mod trade;
pub mod wallet;

pub use event::*;
pub use intent::*;
pub use position::*;
pub use session::*;
pub use snapshot::*;
pub use trade::*;
pub use wallet::*;
