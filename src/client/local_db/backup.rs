//! # Backup Slots
//!
//! The scheduler persists through [`BackupStore`]: the draft written on
//! every edit, the snapshot the backend last confirmed, and the time of that
//! confirmation. [`LocalDatabase`] is the durable implementation;
//! [`MemoryBackup`](super::MemoryBackup) keeps the same slots in process.

use chrono::{DateTime, Utc};
use std::future::Future;

use crate::client::local_db::schema::keys;
use crate::client::local_db::LocalDatabase;
use crate::shared::error::SyncResult;
use crate::shared::event::EventRecord;
use crate::shared::snapshot::SyncSnapshot;

/// Persistence used by the scheduler and the recovery manager
pub trait BackupStore: Send + Sync + 'static {
    /// Overwrite the draft slot
    fn save_backup(&self, snapshot: &SyncSnapshot) -> impl Future<Output = SyncResult<()>> + Send;

    fn load_latest_backup(&self) -> impl Future<Output = SyncResult<Option<SyncSnapshot>>> + Send;

    fn clear_backup(&self) -> impl Future<Output = SyncResult<()>> + Send;

    fn save_confirmed_snapshot(
        &self,
        record: &EventRecord,
    ) -> impl Future<Output = SyncResult<()>> + Send;

    fn load_confirmed_snapshot(&self)
        -> impl Future<Output = SyncResult<Option<EventRecord>>> + Send;

    fn set_last_sync_time(&self, at: DateTime<Utc>) -> impl Future<Output = SyncResult<()>> + Send;

    fn get_last_sync_time(&self) -> impl Future<Output = SyncResult<Option<DateTime<Utc>>>> + Send;
}

impl BackupStore for LocalDatabase {
    async fn save_backup(&self, snapshot: &SyncSnapshot) -> SyncResult<()> {
        self.set_json(keys::BACKUP_LATEST, snapshot).await
    }

    async fn load_latest_backup(&self) -> SyncResult<Option<SyncSnapshot>> {
        self.get_json(keys::BACKUP_LATEST).await
    }

    async fn clear_backup(&self) -> SyncResult<()> {
        self.remove_value(keys::BACKUP_LATEST).await
    }

    async fn save_confirmed_snapshot(&self, record: &EventRecord) -> SyncResult<()> {
        self.set_json(keys::CONFIRMED_SNAPSHOT, record).await
    }

    async fn load_confirmed_snapshot(&self) -> SyncResult<Option<EventRecord>> {
        self.get_json(keys::CONFIRMED_SNAPSHOT).await
    }

    async fn set_last_sync_time(&self, at: DateTime<Utc>) -> SyncResult<()> {
        self.set_value(keys::LAST_SYNC_TIME, &at.to_rfc3339()).await
    }

    async fn get_last_sync_time(&self) -> SyncResult<Option<DateTime<Utc>>> {
        let Some(raw) = self.get_value(keys::LAST_SYNC_TIME).await? else {
            return Ok(None);
        };
        match DateTime::parse_from_rfc3339(&raw) {
            Ok(at) => Ok(Some(at.with_timezone(&Utc))),
            Err(e) => {
                tracing::warn!("Ignoring unreadable last sync time {:?}: {}", raw, e);
                Ok(None)
            }
        }
    }
}
