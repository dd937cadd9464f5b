//! Copy-trading simulator entrypoint.
//!
//! `run` drives the live feed through the pipeline; `replay` drives a
//! historical range from the Event Store through the same pipeline and
//! exits when it drains.

use anyhow::Context;
use clap::{Parser, Subcommand};
use event_store::{EventStore, TradeStore};
use feed::FeedClient;
use pipeline::{IngestConfig, IngestDriver, Processor, ProcessorConfig, ReplayDriver};
use pricing::{Executor, SimulationExecutor, SlippageConfig};
use sim_core::config::Config;
use sim_core::types::{SessionMode, SimulationSession};
use sim_core::Error;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser)]
#[command(name = "simulator-cli")]
#[command(about = "Deterministic copy-trading simulator for bonding-curve tokens")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the live pipeline against the configured upstream feed.
    Run,
    /// Replay a historical range from the Event Store and exit on completion.
    Replay,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "simulator_cli=info,pipeline=info,feed=info,event_store=info,portfolio=info,pricing=info,sim_core=info".into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("loading configuration")?;

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await
        .context("connecting to database")?;

    let skip_migrations = std::env::var("SKIP_MIGRATIONS")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false);
    if !skip_migrations {
        info!("running database migrations");
        sqlx::migrate!("../event-store/migrations")
            .run(&pool)
            .await
            .context("running migrations")?;
    }

    match cli.command {
        Commands::Run => run_live(config, pool).await,
        Commands::Replay => run_replay(config, pool).await,
    }
}

/// Shared by both subcommands: a watch channel flipped by SIGINT/SIGTERM,
/// observed by the ingest driver (the processor terminates by queue closure
/// instead).
fn shutdown_signal() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        let ctrl_c = async {
            let _ = tokio::signal::ctrl_c().await;
        };
        #[cfg(unix)]
        let terminate = async {
            let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler");
            sigterm.recv().await;
        };
        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {}
            _ = terminate => {}
        }
        info!("shutdown signal received");
        let _ = tx.send(true);
    });
    rx
}

async fn run_live(config: Config, pool: sqlx::PgPool) -> anyhow::Result<()> {
    let config_json = serde_json::to_string(&config).context("serializing effective configuration")?;
    let session = SimulationSession::start(
        SessionMode::Live,
        config_json,
        config.simulation.initial_sol_balance,
    );
    info!(session_id = %session.id, "starting live session");

    let event_store = Arc::new(EventStore::new(pool.clone()));
    let trade_store = Arc::new(TradeStore::new(pool));

    let tracked_wallets: Vec<String> = config.wallets.tracked.keys().cloned().collect();
    let feed = FeedClient::new(
        config.websocket.url.clone(),
        config.websocket.reconnect_base_delay_ms,
        config.websocket.reconnect_max_delay_ms,
        config.websocket.reconnect_jitter_factor,
        config.websocket.dedup_buffer_size,
    );

    let (queue_tx, queue_rx) = mpsc::channel(config.websocket.receive_buffer_size);
    let shutdown = shutdown_signal();

    let ingest = IngestDriver::new(
        feed,
        event_store,
        queue_tx,
        tracked_wallets,
        IngestConfig::default(),
        shutdown,
    );
    let ingest_handle = tokio::spawn(ingest.run());

    let executor: Arc<dyn Executor> = Arc::new(SimulationExecutor::new(SlippageConfig {
        base_slippage_bps: config.simulation.base_slippage_bps,
        price_impact_factor: config.simulation.price_impact_factor,
    }));
    let processor = Processor::new(
        queue_rx,
        executor,
        trade_store,
        session,
        ProcessorConfig {
            position_size_sol: config.simulation.position_size_sol,
            max_slippage_bps: config.simulation.max_slippage_bps,
            execution_delay_ms: config.simulation.execution_delay_ms,
            skip_migrated_tokens: config.simulation.skip_migrated_tokens,
            max_trades_per_wallet_per_minute: config.simulation.max_trades_per_wallet_per_minute,
            snapshot_interval: Duration::from_secs(config.simulation.snapshot_interval_seconds),
        },
    );
    let processor_handle = tokio::spawn(processor.run());

    ingest_handle.await.context("ingest driver task panicked")?;
    let wallet = processor_handle
        .await
        .context("processor task panicked")?
        .context("processor run failed")?;

    info!(
        final_sol_balance = %wallet.sol_balance,
        total_trades = wallet.total_trade_count,
        "live session complete"
    );
    Ok(())
}

async fn run_replay(config: Config, pool: sqlx::PgPool) -> anyhow::Result<()> {
    let (from, to) = match (config.replay.from, config.replay.to) {
        (Some(from), Some(to)) => (from, to),
        _ => return Err(Error::ReplayRangeMissing).context("replay configuration"),
    };

    let config_json = serde_json::to_string(&config).context("serializing effective configuration")?;
    let session = SimulationSession::start(
        SessionMode::Replay,
        config_json,
        config.simulation.initial_sol_balance,
    );
    info!(session_id = %session.id, %from, %to, "starting replay session");

    let event_store = Arc::new(EventStore::new(pool.clone()));
    let trade_store = Arc::new(TradeStore::new(pool));

    let (queue_tx, queue_rx) = mpsc::channel(config.replay.batch_size.max(1));
    let replay = ReplayDriver::new(event_store, queue_tx, config.replay.filter_wallets.clone());
    let replay_handle = tokio::spawn(replay.run(from, to));

    let executor: Arc<dyn Executor> = Arc::new(SimulationExecutor::new(SlippageConfig {
        base_slippage_bps: config.simulation.base_slippage_bps,
        price_impact_factor: config.simulation.price_impact_factor,
    }));
    let processor = Processor::new(
        queue_rx,
        executor,
        trade_store,
        session,
        ProcessorConfig {
            position_size_sol: config.simulation.position_size_sol,
            max_slippage_bps: config.simulation.max_slippage_bps,
            execution_delay_ms: config.simulation.execution_delay_ms,
            skip_migrated_tokens: config.simulation.skip_migrated_tokens,
            max_trades_per_wallet_per_minute: config.simulation.max_trades_per_wallet_per_minute,
            snapshot_interval: Duration::from_secs(config.simulation.snapshot_interval_seconds),
        },
    );
    let processor_handle = tokio::spawn(processor.run());

    replay_handle
        .await
        .context("replay driver task panicked")?
        .context("replay driver failed")?;
    let wallet = processor_handle
        .await
        .context("processor task panicked")?
        .context("processor run failed")?;

    info!(
        final_sol_balance = %wallet.sol_balance,
        total_trades = wallet.total_trade_count,
        "replay complete"
    );
    Ok(())
}
