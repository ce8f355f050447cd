//! # Kaya Terminal Library
//!
//! Backend for one Kaya POS till. Opens the local ledger, starts the sync
//! agent and exposes the commands the till front end calls.
//!
//! ## Module Organization
//! ```text
//! kaya_terminal/
//! ├── lib.rs          ◄─── You are here (startup & run)
//! ├── state/
//! │   ├── mod.rs      ◄─── AppState bundle
//! │   ├── cart.rs     ◄─── Cart + scanner behind a mutex
//! │   ├── config.rs   ◄─── Store settings from the environment
//! │   └── sync.rs     ◄─── Sync agent handle and status DTO
//! ├── commands/       ◄─── One module per till screen
//! ├── watcher.rs      ◄─── Alert badge kept current from the change feed
//! └── error.rs        ◄─── API error type for commands
//! ```

pub mod commands;
pub mod error;
pub mod state;
pub mod watcher;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use directories::ProjectDirs;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use kaya_db::{Database, DbConfig};
use kaya_sync::{SyncAgent, SyncConfig, TracingEmitter};

use state::{AppState, ConfigState, SyncState};
use watcher::AlertWatcher;

/// Runs the terminal until Ctrl-C.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                       Terminal Startup                                  │
/// │                                                                         │
/// │  1. Logging ──────── tracing-subscriber, RUST_LOG or the default filter │
/// │  2. Config ───────── KAYA_* environment variables                       │
/// │  3. Ledger ───────── SQLite in the app data dir, migrated, seeded once  │
/// │  4. Sync agent ───── sync.toml + env; offline mode starts nothing       │
/// │  5. Session ──────── AppState (cart under the default tax rule)         │
/// │  6. Alert watcher ── follows product and batch changes                  │
/// │  7. Wait ─────────── Ctrl-C, then stop sync and close the pool          │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
///
/// A sync agent that fails to start is logged and the till runs offline.
pub async fn run() -> anyhow::Result<()> {
    init_tracing();
    info!("Starting Kaya POS terminal");

    let config = ConfigState::from_env();
    let db_path = database_path(&config)?;
    info!(?db_path, "Database path determined");

    let db = Database::new(DbConfig::new(db_path))
        .await
        .context("failed to open the ledger")?;
    kaya_db::seed::seed_if_empty(&db)
        .await
        .context("failed to seed the ledger")?;
    info!("Database connected and migrations applied");

    let sync = start_sync(&db);
    let state = AppState::new(db.clone(), config, sync)
        .await
        .context("failed to build the session")?;

    let watcher = AlertWatcher::spawn(db.clone()).await;
    info!(
        store = %state.config.store_name,
        sync_mode = ?state.sync.mode(),
        "Terminal ready"
    );

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    info!("Shutting down");

    watcher.stop();
    state.sync.shutdown().await;
    db.close().await;
    Ok(())
}

/// Initializes the tracing subscriber.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=kaya=trace` - Trace for the kaya crates only
/// - Default: `info,kaya=debug,sqlx=warn`
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,kaya=debug,sqlx=warn"));

    // A subscriber may already be installed (tests, embedding)
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Ledger location.
///
/// ## Platform-Specific Paths
/// - **macOS**: `~/Library/Application Support/com.kaya.pos/kaya.db`
/// - **Windows**: `%APPDATA%\kaya\pos\data\kaya.db`
/// - **Linux**: `~/.local/share/pos/kaya.db`
///
/// `KAYA_DB_PATH` overrides all of these.
fn database_path(config: &ConfigState) -> anyhow::Result<PathBuf> {
    if let Some(path) = &config.db_path {
        return Ok(path.clone());
    }

    let dirs = ProjectDirs::from("com", "kaya", "pos")
        .context("could not determine the app data directory")?;
    let data_dir = dirs.data_dir();
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("could not create {}", data_dir.display()))?;

    Ok(data_dir.join("kaya.db"))
}

fn start_sync(db: &Database) -> SyncState {
    let config = SyncConfig::load_or_default(None);

    match SyncAgent::start(&config, db.clone(), Arc::new(TracingEmitter)) {
        Ok(Some(handle)) => SyncState::running(config.mode(), handle),
        Ok(None) => SyncState::offline(),
        Err(e) => {
            error!(error = %e, "Sync agent failed to start; running offline");
            SyncState::offline()
        }
    }
}
