//! # Event Session
//!
//! What a UI talks to: one open event in a [`RosterForm`], a running sync
//! engine, and the backend for the operations that bypass the scheduler
//! (list, load, delete, id generation).
//!
//! ## Usage
//!
//! ```rust,no_run
//! use eventlog_pro::client::form::HeaderField;
//! use eventlog_pro::client::local_db::MemoryBackup;
//! use eventlog_pro::client::recovery::RecoveryDecision;
//! use eventlog_pro::client::remote::MemoryStore;
//! use eventlog_pro::client::session::EventSession;
//! use eventlog_pro::client::sync::SyncConfig;
//! use eventlog_pro::shared::SyncSnapshot;
//! use std::sync::Arc;
//!
//! # async fn example() -> eventlog_pro::shared::SyncResult<()> {
//! let mut session = EventSession::start(
//!     SyncConfig::default(),
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(MemoryBackup::new()),
//! );
//! session.recover(&mut |_: &SyncSnapshot| RecoveryDecision::Restore).await?;
//! session.new_event().await?;
//! session.edit(|form| form.set_field(HeaderField::EventName, "Museum visit"))?;
//! session.shutdown().await;
//! # Ok(())
//! # }
//! ```

use chrono::{Datelike, Utc};
use std::sync::Arc;

use crate::client::form::RosterForm;
use crate::client::local_db::BackupStore;
use crate::client::recovery::{RecoveryManager, RecoveryOutcome, RecoveryPrompt};
use crate::client::remote::RemoteStore;
use crate::client::sync::{SyncConfig, SyncEngine, SyncHandle, SyncStatus};
use crate::shared::error::{SyncError, SyncResult};
use crate::shared::event::{EventId, EventRecord, EventSummary, RosterSummary};

pub struct EventSession<R, B> {
    remote: Arc<R>,
    backup: Arc<B>,
    engine: SyncEngine,
    sync: SyncHandle,
    form: RosterForm,
    config: SyncConfig,
}

impl<R: RemoteStore, B: BackupStore> EventSession<R, B> {
    /// Start the sync engine with an empty form. Needs a tokio runtime.
    pub fn start(config: SyncConfig, remote: Arc<R>, backup: Arc<B>) -> Self {
        let engine = SyncEngine::start(config.clone(), Arc::clone(&remote), Arc::clone(&backup));
        let sync = engine.handle();
        Self {
            remote,
            backup,
            engine,
            sync,
            form: RosterForm::default(),
            config,
        }
    }

    /// Offer an unsynced draft from the last run. A restored draft goes
    /// into the form and is queued like any edit.
    pub async fn recover(
        &mut self,
        prompt: &mut impl RecoveryPrompt,
    ) -> SyncResult<RecoveryOutcome> {
        let manager = RecoveryManager::new(Arc::clone(&self.backup), self.config.backup_freshness);
        let outcome = manager.check(self.form.has_loaded_event(), prompt).await?;
        if let RecoveryOutcome::Restored(snapshot) = &outcome {
            self.form.load_record(&snapshot.event_data);
            self.notify_field_changed()?;
        }
        Ok(outcome)
    }

    /// Blank form under a freshly generated id for the current year
    pub async fn new_event(&mut self) -> SyncResult<EventId> {
        let event_id = self.remote.generate_id(Utc::now().year()).await;
        self.form.reset(event_id.clone());
        self.sync.reset()?;
        tracing::info!("New event {}", event_id);
        Ok(event_id)
    }

    /// Fetch `event_id` into the form; it becomes the confirmed state
    pub async fn load_event(&mut self, event_id: &EventId) -> SyncResult<EventRecord> {
        let record = self
            .remote
            .fetch_event(event_id)
            .await?
            .ok_or_else(|| SyncError::not_found(event_id.as_str()))?;
        self.form.load_record(&record);
        self.sync.set_baseline(record.clone())?;
        tracing::info!("Loaded event {} ({} students)", event_id, record.students.len());
        Ok(record)
    }

    /// Delete the open event remotely, drop its backup and start a new one
    pub async fn delete_current_event(&mut self) -> SyncResult<EventId> {
        let event_id = self.form.event_id().clone();
        if event_id.is_empty() {
            return Err(SyncError::validation("eventId", "No event selected"));
        }

        // Nothing pending may recreate it after the delete
        self.sync.reset()?;
        self.remote.delete_event(&event_id).await?;
        self.backup.clear_backup().await?;
        tracing::info!("Deleted event {}", event_id);

        self.new_event().await
    }

    pub async fn list_events(&self) -> SyncResult<Vec<EventSummary>> {
        self.remote.list_events().await
    }

    pub fn form(&self) -> &RosterForm {
        &self.form
    }

    /// Apply a form change and report it to the scheduler
    pub fn edit<T>(&mut self, change: impl FnOnce(&mut RosterForm) -> T) -> SyncResult<T> {
        let result = change(&mut self.form);
        self.notify_field_changed()?;
        Ok(result)
    }

    pub fn capture_snapshot(&self) -> EventRecord {
        self.form.capture_snapshot()
    }

    pub fn notify_field_changed(&self) -> SyncResult<()> {
        self.sync.notify_field_changed(self.capture_snapshot())
    }

    /// Save the form now, even when nothing changed
    pub fn force_sync_now(&self) -> SyncResult<()> {
        self.sync.force_sync_now(Some(self.capture_snapshot()))
    }

    pub fn sync_status(&self) -> SyncStatus {
        self.sync.sync_status()
    }

    pub fn sync_handle(&self) -> SyncHandle {
        self.sync.clone()
    }

    pub fn set_network_online(&self, online: bool) -> SyncResult<()> {
        self.sync.set_online(online)
    }

    pub fn roster_summary(&self) -> RosterSummary {
        self.form.summary()
    }

    /// Stop the engine; an in-flight write completes first
    pub async fn shutdown(self) {
        self.engine.shutdown().await;
    }
}
