//! Configuration for the copy-trading simulator.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;

/// Top-level effective configuration for one simulation session.
///
/// `Serialize` exists so a session row can carry a literal
/// `config_json` snapshot of what it ran with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub simulation: SimulationConfig,
    pub websocket: WebSocketConfig,
    pub wallets: WalletTrackingConfig,
    pub replay: ReplayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Simulation-group options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub initial_sol_balance: rust_decimal::Decimal,
    pub position_size_sol: rust_decimal::Decimal,
    pub execution_delay_ms: u64,
    pub base_slippage_bps: rust_decimal::Decimal,
    pub price_impact_factor: rust_decimal::Decimal,
    pub max_slippage_bps: rust_decimal::Decimal,
    pub max_trades_per_wallet_per_minute: u32,
    pub snapshot_interval_seconds: u64,
    pub skip_migrated_tokens: bool,
}

/// WebSocket-group options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSocketConfig {
    pub url: String,
    pub reconnect_base_delay_ms: u64,
    pub reconnect_max_delay_ms: u64,
    pub reconnect_jitter_factor: f64,
    pub receive_buffer_size: usize,
    pub dedup_buffer_size: usize,
}

/// Wallet-id -> display-alias map; membership subscribes the wallet.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WalletTrackingConfig {
    pub tracked: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ReplayConfig {
    pub enabled: bool,
    pub from: Option<chrono::DateTime<chrono::Utc>>,
    pub to: Option<chrono::DateTime<chrono::Utc>>,
    pub filter_wallets: Vec<String>,
    pub batch_size: usize,
}

impl Config {
    /// Load configuration from environment variables, with `.env` fallback.
    #[allow(clippy::result_large_err)]
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let database = DatabaseConfig {
            url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost/copytrade_sim".to_string()),
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5),
        };

        let simulation = SimulationConfig {
            initial_sol_balance: env_decimal("INITIAL_SOL_BALANCE", "10.0"),
            position_size_sol: env_decimal("POSITION_SIZE_SOL", "1.0"),
            execution_delay_ms: env_u64("EXECUTION_DELAY_MS", 0),
            base_slippage_bps: env_decimal("BASE_SLIPPAGE_BPS", "100"),
            price_impact_factor: env_decimal("PRICE_IMPACT_FACTOR", "1.0"),
            max_slippage_bps: env_decimal("MAX_SLIPPAGE_BPS", "1000"),
            max_trades_per_wallet_per_minute: env::var("MAX_TRADES_PER_WALLET_PER_MINUTE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            snapshot_interval_seconds: env_u64("SNAPSHOT_INTERVAL_SECONDS", 60),
            skip_migrated_tokens: env::var("SKIP_MIGRATED_TOKENS")
                .ok()
                .map(|s| s == "true" || s == "1")
                .unwrap_or(true),
        };

        let websocket = WebSocketConfig {
            url: env::var("FEED_WS_URL")
                .unwrap_or_else(|_| "wss://pumpportal.fun/api/data".to_string()),
            reconnect_base_delay_ms: env_u64("RECONNECT_BASE_DELAY_MS", 1000),
            reconnect_max_delay_ms: env_u64("RECONNECT_MAX_DELAY_MS", 30_000),
            reconnect_jitter_factor: env::var("RECONNECT_JITTER_FACTOR")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0.2),
            receive_buffer_size: env::var("RECEIVE_BUFFER_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10_000),
            dedup_buffer_size: env::var("DEDUP_BUFFER_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10_000),
        };

        let tracked = env::var("TRACKED_WALLETS")
            .ok()
            .map(|raw| parse_tracked_wallets(&raw))
            .unwrap_or_default();

        Ok(Self {
            database,
            simulation,
            websocket,
            wallets: WalletTrackingConfig { tracked },
            replay: ReplayConfig {
                enabled: env::var("REPLAY_ENABLED")
                    .ok()
                    .map(|s| s == "true" || s == "1")
                    .unwrap_or(false),
                from: env::var("REPLAY_FROM").ok().and_then(|s| s.parse().ok()),
                to: env::var("REPLAY_TO").ok().and_then(|s| s.parse().ok()),
                filter_wallets: Vec::new(),
                batch_size: env::var("REPLAY_BATCH_SIZE")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(500),
            },
        })
    }

    /// Default configuration for tests: in-memory-friendly values, no network/db reliance.
    #[cfg(any(test, feature = "test-util"))]
    pub fn test_config() -> Self {
        use rust_decimal_macros::dec;
        Self {
            database: DatabaseConfig {
                url: "postgres://localhost/copytrade_sim_test".to_string(),
                max_connections: 2,
            },
            simulation: SimulationConfig {
                initial_sol_balance: dec!(10.0),
                position_size_sol: dec!(1.0),
                execution_delay_ms: 0,
                base_slippage_bps: dec!(100),
                price_impact_factor: dec!(1.0),
                max_slippage_bps: dec!(1000),
                max_trades_per_wallet_per_minute: 10,
                snapshot_interval_seconds: 60,
                skip_migrated_tokens: true,
            },
            websocket: WebSocketConfig {
                url: "wss://example.invalid/ws".to_string(),
                reconnect_base_delay_ms: 1000,
                reconnect_max_delay_ms: 30_000,
                reconnect_jitter_factor: 0.0,
                receive_buffer_size: 1000,
                dedup_buffer_size: 1000,
            },
            wallets: WalletTrackingConfig::default(),
            replay: ReplayConfig::default(),
        }
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key).ok().and_then(|s| s.parse().ok()).unwrap_or(default)
}

fn env_decimal(key: &str, default: &str) -> rust_decimal::Decimal {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| default.parse().expect("default decimal literal is valid"))
}

fn parse_tracked_wallets(raw: &str) -> HashMap<String, String> {
    raw.split(',')
        .filter_map(|entry| {
            let mut parts = entry.splitn(2, '=');
            let wallet = parts.next()?.trim();
            if wallet.is_empty() {
                return None;
            }
            let alias = parts.next().unwrap_or(wallet).trim();
            Some((wallet.to_string(), alias.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tracked_wallets_with_and_without_alias() {
        let parsed = parse_tracked_wallets("abc=Alice,def,  ghi = Carol ");
        assert_eq!(parsed.get("abc"), Some(&"Alice".to_string()));
        assert_eq!(parsed.get("def"), Some(&"def".to_string()));
        assert_eq!(parsed.get("ghi"), Some(&"Carol".to_string()));
    }

    #[test]
    fn test_config_has_sane_defaults() {
        let cfg = Config::test_config();
        assert!(cfg.simulation.initial_sol_balance > rust_decimal::Decimal::ZERO);
        assert_eq!(cfg.websocket.reconnect_jitter_factor, 0.0);
    }
}
