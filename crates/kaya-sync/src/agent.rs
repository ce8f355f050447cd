//! # Sync Agent
//!
//! Background task that decides *when* a pass runs. The reconciler decides
//! *what* a pass does.
//!
//! ## Agent Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        SyncAgent Architecture                           │
//! │                                                                         │
//! │   SyncHandle (cloneable)                                                │
//! │     notify_online() ──┐                                                 │
//! │     sync_now() ───────┤  commands (mpsc)                                │
//! │     shutdown() ───────┼──────────────────┐                              │
//! │                       ▼                  ▼                              │
//! │  ┌──────────────────────────────────────────────────────────────────┐   │
//! │  │                        run loop (select!)                        │   │
//! │  │                                                                  │   │
//! │  │  shutdown ─────────────────────────────────────► break           │   │
//! │  │  interval_at(start + startup_delay, interval) ─┐                 │   │
//! │  │  Online ───────────────────────────────────────┼─► spawn pass    │   │
//! │  │  SyncNow(reply) ───────────────────────────────┘                 │   │
//! │  └──────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  pass:  in_flight.try_lock() ── busy ──► skipped_passes += 1            │
//! │                │                         (PassInFlight to caller)       │
//! │                ▼                                                        │
//! │         reconciler.sync_all() ──► SyncStatus ──► emitter                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Passes never overlap. A trigger that arrives while a pass is running is
//! dropped, not queued: the running pass already covers the same records.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot, Mutex, RwLock};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use kaya_db::Database;

use crate::client::SyncClient;
use crate::config::{SyncConfig, SyncMode};
use crate::error::{SyncError, SyncResult};
use crate::reconciler::{SyncReconciler, SyncReport, SyncTransport};

// =============================================================================
// Sync Status
// =============================================================================

/// Current sync status for external queries.
#[derive(Debug, Clone, Default)]
pub struct SyncStatus {
    pub mode: SyncMode,

    /// A pass is running right now.
    pub running: bool,

    /// When the last pass finished.
    pub last_run: Option<DateTime<Utc>>,

    /// When the last pass with no category errors finished.
    pub last_success: Option<DateTime<Utc>>,

    /// Category errors of the last pass, `"<Category>: <message>"`.
    pub last_errors: Vec<String>,

    /// Records pushed by the last pass.
    pub last_synced: u64,

    /// Passes completed since start.
    pub passes: u64,

    /// Triggers dropped because a pass was already running.
    pub skipped_passes: u64,
}

// =============================================================================
// Triggers
// =============================================================================

/// What started a pass. Only used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncTrigger {
    Timer,
    Online,
    Manual,
}

enum AgentCommand {
    Online,
    SyncNow(oneshot::Sender<SyncResult<SyncReport>>),
}

// =============================================================================
// Event Emitter Trait
// =============================================================================

/// Receives agent events, e.g. to refresh a status indicator.
pub trait SyncEventEmitter: Send + Sync {
    /// Emits the status after every pass.
    fn emit_status(&self, status: &SyncStatus);

    /// Emits one message per failed category.
    fn emit_error(&self, message: &str);
}

/// No-op event emitter for testing.
pub struct NoOpEmitter;

impl SyncEventEmitter for NoOpEmitter {
    fn emit_status(&self, _status: &SyncStatus) {}
    fn emit_error(&self, _message: &str) {}
}

/// Emitter that writes events to the log.
pub struct TracingEmitter;

impl SyncEventEmitter for TracingEmitter {
    fn emit_status(&self, status: &SyncStatus) {
        info!(
            passes = status.passes,
            synced = status.last_synced,
            errors = status.last_errors.len(),
            "Sync status"
        );
    }

    fn emit_error(&self, message: &str) {
        warn!(%message, "Sync error");
    }
}

// =============================================================================
// Schedule
// =============================================================================

/// When scheduled passes fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSchedule {
    pub startup_delay: Duration,
    pub interval: Duration,
}

impl SyncSchedule {
    pub fn from_config(config: &SyncConfig) -> Self {
        SyncSchedule {
            startup_delay: config.startup_delay(),
            interval: config.interval(),
        }
    }
}

// =============================================================================
// Sync Agent
// =============================================================================

struct Shared<T> {
    reconciler: SyncReconciler<T>,
    status: Arc<RwLock<SyncStatus>>,
    emitter: Arc<dyn SyncEventEmitter>,
    in_flight: Mutex<()>,
}

impl<T: SyncTransport> Shared<T> {
    async fn run_pass(&self, trigger: SyncTrigger) -> SyncResult<SyncReport> {
        let Ok(_guard) = self.in_flight.try_lock() else {
            debug!(?trigger, "Pass already running, trigger dropped");
            self.status.write().await.skipped_passes += 1;
            return Err(SyncError::PassInFlight);
        };

        debug!(?trigger, "Starting sync pass");
        self.status.write().await.running = true;

        let report = self.reconciler.sync_all().await;

        let snapshot = {
            let mut status = self.status.write().await;
            let now = Utc::now();
            status.running = false;
            status.passes += 1;
            status.last_run = Some(now);
            status.last_synced = report.total_synced();
            status.last_errors = report.errors.clone();
            if report.is_success() {
                status.last_success = Some(now);
            }
            status.clone()
        };

        for message in &report.errors {
            self.emitter.emit_error(message);
        }
        self.emitter.emit_status(&snapshot);

        Ok(report)
    }
}

/// Spawns and wires the background sync task.
pub struct SyncAgent;

impl SyncAgent {
    /// Starts the agent against the configured HTTP server.
    ///
    /// Returns `Ok(None)` in offline mode.
    pub fn start(
        config: &SyncConfig,
        db: Database,
        emitter: Arc<dyn SyncEventEmitter>,
    ) -> SyncResult<Option<SyncHandle>> {
        if !config.is_sync_enabled() {
            info!("Sync is disabled (mode: offline)");
            return Ok(None);
        }

        config.validate()?;
        let client = SyncClient::from_config(config)?;

        info!(
            device_id = %config.device_id(),
            server_url = %config.sync.server_url,
            interval_secs = config.sync.interval_secs,
            "Starting sync agent"
        );

        let reconciler = SyncReconciler::new(db, client);
        Ok(Some(Self::spawn(
            reconciler,
            SyncSchedule::from_config(config),
            config.mode(),
            emitter,
        )))
    }

    /// Spawns the run loop over any transport. Must be called inside a
    /// Tokio runtime.
    pub fn spawn<T: SyncTransport>(
        reconciler: SyncReconciler<T>,
        schedule: SyncSchedule,
        mode: SyncMode,
        emitter: Arc<dyn SyncEventEmitter>,
    ) -> SyncHandle {
        let status = Arc::new(RwLock::new(SyncStatus {
            mode,
            ..Default::default()
        }));

        let shared = Arc::new(Shared {
            reconciler,
            status: status.clone(),
            emitter,
            in_flight: Mutex::new(()),
        });

        let (command_tx, command_rx) = mpsc::channel(16);
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        tokio::spawn(run_loop(shared, schedule, command_rx, shutdown_rx));

        SyncHandle {
            commands: command_tx,
            shutdown: shutdown_tx,
            status,
        }
    }
}

async fn run_loop<T: SyncTransport>(
    shared: Arc<Shared<T>>,
    schedule: SyncSchedule,
    mut commands: mpsc::Receiver<AgentCommand>,
    mut shutdown_rx: mpsc::Receiver<()>,
) {
    let mut ticker = interval_at(Instant::now() + schedule.startup_delay, schedule.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            _ = shutdown_rx.recv() => {
                info!("Sync agent received shutdown");
                break;
            }

            _ = ticker.tick() => {
                spawn_pass(&shared, SyncTrigger::Timer, None);
            }

            Some(command) = commands.recv() => {
                match command {
                    AgentCommand::Online => spawn_pass(&shared, SyncTrigger::Online, None),
                    AgentCommand::SyncNow(reply) => {
                        spawn_pass(&shared, SyncTrigger::Manual, Some(reply))
                    }
                }
            }
        }
    }

    info!("Sync agent stopped");
}

fn spawn_pass<T: SyncTransport>(
    shared: &Arc<Shared<T>>,
    trigger: SyncTrigger,
    reply: Option<oneshot::Sender<SyncResult<SyncReport>>>,
) {
    let shared = shared.clone();
    tokio::spawn(async move {
        let result = shared.run_pass(trigger).await;
        if let Some(reply) = reply {
            let _ = reply.send(result);
        }
    });
}

// =============================================================================
// Agent Handle (for external control)
// =============================================================================

/// Cloneable handle to a running agent.
#[derive(Clone)]
pub struct SyncHandle {
    commands: mpsc::Sender<AgentCommand>,
    shutdown: mpsc::Sender<()>,
    status: Arc<RwLock<SyncStatus>>,
}

impl SyncHandle {
    /// Connectivity came back; run a pass now.
    pub fn notify_online(&self) {
        if let Err(e) = self.commands.try_send(AgentCommand::Online) {
            debug!(error = %e, "Online trigger not delivered");
        }
    }

    /// Runs a pass and waits for its report.
    ///
    /// Fails with [`SyncError::PassInFlight`] if a pass is already running.
    pub async fn sync_now(&self) -> SyncResult<SyncReport> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(AgentCommand::SyncNow(reply_tx))
            .await
            .map_err(|_| SyncError::ShuttingDown)?;
        reply_rx.await.map_err(|_| SyncError::ShuttingDown)?
    }

    pub async fn status(&self) -> SyncStatus {
        self.status.read().await.clone()
    }

    /// Stops the run loop. A pass already running finishes on its own.
    pub async fn shutdown(&self) {
        let _ = self.shutdown.send(()).await;
    }
}
