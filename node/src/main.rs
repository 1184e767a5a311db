// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Pledge Node
//!
//! Entry point for the `pledge-node` binary:
//!
//! - `run`     start the slot clock and serve the HTTP/WS API and metrics
//! - `init`    create the data directory and a signing key
//! - `sign`    sign an instruction offline and print the call as JSON
//! - `version` print build version information

mod api;
mod cli;
mod ledger;
mod logging;
mod metrics;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use pledge_contracts::Instruction;
use pledge_protocol::call::SignedCall;
use pledge_protocol::config::{EVENT_CHANNEL_CAPACITY, PROTOCOL_VERSION};
use pledge_protocol::crypto::Keypair;
use pledge_protocol::host::SlotClock;
use pledge_protocol::storage::LedgerDb;
use tokio::signal;
use tokio::sync::{broadcast, Mutex};

use cli::{Commands, PledgeNodeCli};
use ledger::NodeLedger;
use logging::LogFormat;
use metrics::NodeMetrics;

const KEY_FILE: &str = "node.key";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = PledgeNodeCli::parse();

    match cli.command {
        Commands::Run(args) => run_node(args).await,
        Commands::Init(args) => init_node(args),
        Commands::Sign(args) => sign_call(args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

async fn run_node(args: cli::RunArgs) -> Result<()> {
    logging::init_logging(
        "pledge_node=info,pledge_contracts=info,pledge_protocol=info,tower_http=info",
        args.log_format,
    );

    tracing::info!(
        rpc_port = args.rpc_port,
        metrics_port = args.metrics_port,
        slot_ms = args.slot_ms,
        faucet = !args.disable_faucet,
        data_dir = %args.data_dir.display(),
        "starting pledge-node"
    );

    // --- Persistent storage ---
    let db_path = args.data_dir.join("db");
    std::fs::create_dir_all(&db_path)
        .with_context(|| format!("failed to create database directory: {}", db_path.display()))?;
    let db = LedgerDb::open(&db_path)
        .with_context(|| format!("failed to open database at {}", db_path.display()))?;
    let ledger = NodeLedger::open(db).context("failed to load ledger state")?;
    let clock = ledger.clock();

    // --- Metrics ---
    let node_metrics = Arc::new(
        NodeMetrics::new().map_err(|e| anyhow::anyhow!("failed to register metrics: {e}"))?,
    );
    node_metrics
        .current_slot
        .set(i64::try_from(clock.current_slot()).unwrap_or(i64::MAX));
    let open = ledger.open_campaigns();
    node_metrics
        .open_campaigns
        .set(i64::try_from(open).unwrap_or(i64::MAX));

    let ledger = Arc::new(Mutex::new(ledger));
    let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

    let app_state = api::AppState {
        version: format!(
            "{} (protocol {})",
            env!("CARGO_PKG_VERSION"),
            PROTOCOL_VERSION
        ),
        ledger: Arc::clone(&ledger),
        clock: Arc::clone(&clock),
        event_tx: event_tx.clone(),
        metrics: Arc::clone(&node_metrics),
        faucet_enabled: !args.disable_faucet,
    };

    // --- API server ---
    let api_router = api::create_router(app_state);
    let api_addr = format!("0.0.0.0:{}", args.rpc_port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind RPC listener on {}", api_addr))?;
    tracing::info!("API server listening on {}", api_addr);

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(Arc::clone(&node_metrics));
    let metrics_addr = format!("0.0.0.0:{}", args.metrics_port);
    let metrics_listener = tokio::net::TcpListener::bind(&metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {}", metrics_addr))?;
    tracing::info!("metrics server listening on {}", metrics_addr);

    // --- Slot clock ---
    let period = Duration::from_millis(args.slot_ms);
    let slot_ledger = Arc::clone(&ledger);
    let slot_metrics = Arc::clone(&node_metrics);
    let slot_loop = tokio::spawn(async move {
        let mut interval =
            tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        loop {
            interval.tick().await;
            let slot = slot_ledger.lock().await.tick();
            slot_metrics
                .current_slot
                .set(i64::try_from(slot).unwrap_or(i64::MAX));
            let _ = event_tx.send(api::NodeEvent::NewSlot {
                slot,
                timestamp: u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0),
            });
            tracing::trace!(slot, "slot advanced");
        }
    });

    // --- Serve ---
    tokio::select! {
        res = axum::serve(api_listener, api_router) => {
            if let Err(e) = res {
                tracing::error!("API server error: {}", e);
            }
        }
        res = axum::serve(metrics_listener, metrics_router) => {
            if let Err(e) = res {
                tracing::error!("metrics server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received");
        }
    }

    slot_loop.abort();
    let ledger = ledger.lock().await;
    ledger.flush().context("failed to flush ledger on shutdown")?;
    tracing::info!(slot = ledger.current_slot(), "pledge-node stopped");
    Ok(())
}

/// Creates the data directory and writes a fresh signing key.
fn init_node(args: cli::InitArgs) -> Result<()> {
    logging::init_logging("pledge_node=info", LogFormat::Pretty);

    let data_dir = &args.data_dir;
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("failed to create data directory: {}", data_dir.display()))?;

    let key_path = data_dir.join(KEY_FILE);
    if key_path.exists() {
        bail!("refusing to overwrite existing key at {}", key_path.display());
    }

    let keypair = Keypair::generate();
    std::fs::write(&key_path, hex::encode(keypair.secret_key_bytes()))
        .with_context(|| format!("failed to write key to {}", key_path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&key_path, std::fs::Permissions::from_mode(0o600))?;
    }

    let account = keypair.account_id();
    tracing::info!(%account, key_path = %key_path.display(), "signing key generated");

    println!("Node initialized.");
    println!("  Data directory : {}", data_dir.display());
    println!("  Key file       : {}", key_path.display());
    println!("  Account        : {}", account);

    Ok(())
}

/// Signs an instruction and prints the call body for `POST /calls`.
fn sign_call(args: cli::SignArgs) -> Result<()> {
    let keypair = read_key(&args.key)?;
    let instruction = Instruction::from(args.instruction);
    let payload = instruction
        .encode()
        .context("failed to encode instruction")?;
    let call = SignedCall::sign(&keypair, args.nonce, payload);
    println!("{}", serde_json::to_string_pretty(&call)?);
    Ok(())
}

fn read_key(path: &Path) -> Result<Keypair> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read key file {}", path.display()))?;
    Keypair::from_hex(text.trim())
        .with_context(|| format!("invalid key in {}", path.display()))
}

fn print_version() {
    println!("pledge-node {}", env!("CARGO_PKG_VERSION"));
    println!("protocol    {}", PROTOCOL_VERSION);
}

/// Waits for SIGINT or SIGTERM. A handler that cannot be installed never
/// fires, leaving the other one in charge.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
