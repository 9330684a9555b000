//! In-process [`BackupStore`], for tests and for running without a disk.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

use crate::client::local_db::backup::BackupStore;
use crate::shared::error::{SyncError, SyncResult};
use crate::shared::event::EventRecord;
use crate::shared::snapshot::SyncSnapshot;

#[derive(Debug, Default)]
struct Slots {
    backup: Option<SyncSnapshot>,
    confirmed: Option<EventRecord>,
    last_sync_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
pub struct MemoryBackup {
    slots: RwLock<Slots>,
    backup_writes: AtomicUsize,
    fail_writes: AtomicBool,
}

impl MemoryBackup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a draft already saved
    pub fn with_backup(snapshot: SyncSnapshot) -> Self {
        Self {
            slots: RwLock::new(Slots {
                backup: Some(snapshot),
                ..Slots::default()
            }),
            ..Self::default()
        }
    }

    /// Number of `save_backup` calls so far
    pub fn backup_writes(&self) -> usize {
        self.backup_writes.load(Ordering::SeqCst)
    }

    /// Make every write fail with a storage error
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> SyncResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(SyncError::storage("disk full"));
        }
        Ok(())
    }
}

impl BackupStore for MemoryBackup {
    async fn save_backup(&self, snapshot: &SyncSnapshot) -> SyncResult<()> {
        self.backup_writes.fetch_add(1, Ordering::SeqCst);
        self.check_writable()?;
        self.slots.write().await.backup = Some(snapshot.clone());
        Ok(())
    }

    async fn load_latest_backup(&self) -> SyncResult<Option<SyncSnapshot>> {
        Ok(self.slots.read().await.backup.clone())
    }

    async fn clear_backup(&self) -> SyncResult<()> {
        self.slots.write().await.backup = None;
        Ok(())
    }

    async fn save_confirmed_snapshot(&self, record: &EventRecord) -> SyncResult<()> {
        self.check_writable()?;
        self.slots.write().await.confirmed = Some(record.clone());
        Ok(())
    }

    async fn load_confirmed_snapshot(&self) -> SyncResult<Option<EventRecord>> {
        Ok(self.slots.read().await.confirmed.clone())
    }

    async fn set_last_sync_time(&self, at: DateTime<Utc>) -> SyncResult<()> {
        self.check_writable()?;
        self.slots.write().await.last_sync_time = Some(at);
        Ok(())
    }

    async fn get_last_sync_time(&self) -> SyncResult<Option<DateTime<Utc>>> {
        Ok(self.slots.read().await.last_sync_time)
    }
}
