//! # Background Sync Engine
//!
//! Keeps the remote copy of the open event in step with the form without
//! ever blocking it. Edits are backed up locally at once and written
//! remotely after a quiet period; failures back off and retry; going
//! offline suspends writes until connectivity returns.
//!
//! ## Architecture
//!
//! - **Scheduler**: single task owning all sync state ([`scheduler`])
//! - **Change Detector**: skips writes that would change nothing
//! - **Retry Tracker**: exponential backoff with a retry budget
//! - **Network Monitor**: connectivity reports forwarded to the scheduler
//! - **Sync State**: status snapshots published over a watch channel
//! - **Metrics**: write counts, durations and payload sizes
//!
//! ## Usage
//!
//! ```rust,no_run
//! use eventlog_pro::client::local_db::MemoryBackup;
//! use eventlog_pro::client::remote::MemoryStore;
//! use eventlog_pro::client::sync::{SyncConfig, SyncEngine};
//! use eventlog_pro::shared::{EventId, EventRecord};
//! use std::sync::Arc;
//!
//! # async fn example() -> eventlog_pro::shared::SyncResult<()> {
//! let engine = SyncEngine::start(
//!     SyncConfig::default(),
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(MemoryBackup::new()),
//! );
//! let sync = engine.handle();
//!
//! let mut record = EventRecord::new(EventId::new(2025, 1));
//! record.event_name = "Museum visit".into();
//! sync.notify_field_changed(record)?;
//!
//! let status = sync.sync_status();
//! println!("pending: {}", status.pending_count);
//!
//! engine.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod change_detector;
pub mod metrics;
pub mod network_monitor;
pub mod retry;
pub mod scheduler;
pub mod sync_state;

pub use network_monitor::{NetworkMonitor, NetworkStatus};
pub use retry::BackoffStrategy;
pub use scheduler::SyncCommand;
pub use sync_state::{SyncPhase, SyncStatus};

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::client::local_db::BackupStore;
use crate::client::remote::RemoteStore;
use crate::shared::error::{SyncError, SyncResult};
use crate::shared::event::EventRecord;
use crate::shared::snapshot::SyncSnapshot;
use scheduler::Scheduler;

/// Tunables for the sync engine
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Write automatically after edits; when off only manual syncs write
    pub auto_sync: bool,
    /// Quiet period after the last edit before writing
    pub debounce: Duration,
    /// Periodic attempt for a change left outstanding; `None` disables it
    pub heartbeat_interval: Option<Duration>,
    pub backoff: BackoffStrategy,
    /// Transient failures retried before giving up
    pub max_retries: u32,
    /// Backups older than this are discarded at startup
    pub backup_freshness: Duration,
    /// Connectivity assumed until the first report
    pub start_online: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            auto_sync: true,
            debounce: Duration::from_millis(1500),
            heartbeat_interval: Some(Duration::from_secs(120)),
            backoff: BackoffStrategy::default(),
            max_retries: 5,
            backup_freshness: Duration::from_secs(24 * 60 * 60),
            start_online: true,
        }
    }
}

/// Cloneable front door to a running scheduler
#[derive(Debug, Clone)]
pub struct SyncHandle {
    commands: mpsc::UnboundedSender<SyncCommand>,
    status: watch::Receiver<SyncStatus>,
}

impl SyncHandle {
    /// Report the form's current state after any field change
    pub fn notify_field_changed(&self, record: EventRecord) -> SyncResult<()> {
        self.send(SyncCommand::FieldChanged(SyncSnapshot::capture(record)))
    }

    /// Write now. With a record, that record is written even if unchanged.
    pub fn force_sync_now(&self, record: Option<EventRecord>) -> SyncResult<()> {
        self.send(SyncCommand::SyncNow(record.map(SyncSnapshot::capture)))
    }

    pub fn set_online(&self, online: bool) -> SyncResult<()> {
        self.send(SyncCommand::NetworkChanged(online))
    }

    /// Mark `record` as the confirmed remote state, e.g. after loading it
    pub fn set_baseline(&self, record: EventRecord) -> SyncResult<()> {
        self.send(SyncCommand::Baseline(record))
    }

    /// Forget the confirmed state and anything pending
    pub fn reset(&self) -> SyncResult<()> {
        self.send(SyncCommand::Reset)
    }

    pub fn set_auto_sync(&self, enabled: bool) -> SyncResult<()> {
        self.send(SyncCommand::SetAutoSync(enabled))
    }

    /// Latest published status
    pub fn sync_status(&self) -> SyncStatus {
        self.status.borrow().clone()
    }

    /// Receiver that wakes on every status change
    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.status.clone()
    }

    /// Wait until the published status satisfies `predicate`
    pub async fn wait_for(
        &self,
        predicate: impl FnMut(&SyncStatus) -> bool,
    ) -> SyncResult<SyncStatus> {
        let mut status = self.status.clone();
        let result = status.wait_for(predicate).await;
        result
            .map(|s| s.clone())
            .map_err(|_| SyncError::unavailable("sync engine has stopped"))
    }

    fn send(&self, command: SyncCommand) -> SyncResult<()> {
        self.commands
            .send(command)
            .map_err(|_| SyncError::unavailable("sync engine has stopped"))
    }
}

/// Owns the scheduler task
#[derive(Debug)]
pub struct SyncEngine {
    handle: SyncHandle,
    task: Option<JoinHandle<()>>,
}

impl SyncEngine {
    /// Spawn the scheduler on the current tokio runtime
    pub fn start<R: RemoteStore, B: BackupStore>(
        config: SyncConfig,
        remote: Arc<R>,
        backup: Arc<B>,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(SyncStatus {
            is_online: config.start_online,
            ..SyncStatus::default()
        });

        let scheduler = Scheduler::new(config, remote, backup, command_rx, status_tx);
        let task = tokio::spawn(scheduler.run());

        Self {
            handle: SyncHandle {
                commands: command_tx,
                status: status_rx,
            },
            task: Some(task),
        }
    }

    pub fn handle(&self) -> SyncHandle {
        self.handle.clone()
    }

    /// Stop the scheduler. A write already in flight finishes first.
    pub async fn shutdown(mut self) {
        let _ = self.handle.send(SyncCommand::Shutdown);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!("Sync scheduler task failed: {}", e);
            }
        }
    }
}

impl Drop for SyncEngine {
    fn drop(&mut self) {
        if self.task.take().is_some() {
            let _ = self.handle.send(SyncCommand::Shutdown);
        }
    }
}
