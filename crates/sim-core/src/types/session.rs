//! SimulationSession: one contiguous run with an immutable configuration.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    Live,
    Replay,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationSession {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub mode: SessionMode,
    /// Literal serialization of the effective configuration.
    pub config_json: String,
    pub initial_sol_balance: Decimal,
    pub final_sol_balance: Option<Decimal>,
}

impl SimulationSession {
    pub fn start(mode: SessionMode, config_json: String, initial_sol_balance: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            ended_at: None,
            mode,
            config_json,
            initial_sol_balance,
            final_sol_balance: None,
        }
    }
}
