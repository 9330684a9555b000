//! # Crash Recovery
//!
//! At startup the backup slot may hold a draft that never reached the
//! backend. [`RecoveryManager::check`] decides whether it is worth
//! offering, asks the host through [`RecoveryPrompt`], and clears what the
//! user declines or what is too old to matter.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

use crate::client::local_db::BackupStore;
use crate::shared::error::SyncResult;
use crate::shared::snapshot::SyncSnapshot;

/// User's answer to the restore prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryDecision {
    Restore,
    Discard,
}

/// Host callback asked about a recoverable draft
pub trait RecoveryPrompt {
    fn on_recoverable_backup_found(&mut self, snapshot: &SyncSnapshot) -> RecoveryDecision;
}

impl<F> RecoveryPrompt for F
where
    F: FnMut(&SyncSnapshot) -> RecoveryDecision,
{
    fn on_recoverable_backup_found(&mut self, snapshot: &SyncSnapshot) -> RecoveryDecision {
        self(snapshot)
    }
}

/// What the startup check did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryOutcome {
    NoBackup,
    /// An event was already open; the backup was left alone
    EventAlreadyLoaded,
    /// Older than the freshness window; cleared without asking
    DiscardedStale,
    /// Same content as the last confirmed write; cleared without asking
    AlreadySynced,
    Declined,
    /// The caller should load this draft into the form and mark it dirty
    Restored(SyncSnapshot),
}

pub struct RecoveryManager<B> {
    backup: Arc<B>,
    freshness: Duration,
}

impl<B: BackupStore> RecoveryManager<B> {
    pub fn new(backup: Arc<B>, freshness: Duration) -> Self {
        Self { backup, freshness }
    }

    /// Inspect the backup slot and ask `prompt` when a draft is worth restoring
    pub async fn check(
        &self,
        form_has_event: bool,
        prompt: &mut impl RecoveryPrompt,
    ) -> SyncResult<RecoveryOutcome> {
        let Some(snapshot) = self.backup.load_latest_backup().await? else {
            return Ok(RecoveryOutcome::NoBackup);
        };

        if form_has_event {
            tracing::debug!("Event already loaded; not offering backup");
            return Ok(RecoveryOutcome::EventAlreadyLoaded);
        }

        let fresh = chrono::Duration::from_std(self.freshness)
            .map_or(true, |window| snapshot.is_fresh(Utc::now(), window));
        if !fresh {
            tracing::info!(
                "Discarding backup captured at {}",
                snapshot.captured_at.to_rfc3339()
            );
            self.backup.clear_backup().await?;
            return Ok(RecoveryOutcome::DiscardedStale);
        }

        if let Some(confirmed) = self.backup.load_confirmed_snapshot().await? {
            if confirmed.event_id == snapshot.event_data.event_id
                && confirmed.content_eq(&snapshot.event_data)
            {
                tracing::debug!("Backup matches confirmed state of {}", confirmed.event_id);
                self.backup.clear_backup().await?;
                return Ok(RecoveryOutcome::AlreadySynced);
            }
        }

        if snapshot.event_data.is_blank() {
            self.backup.clear_backup().await?;
            return Ok(RecoveryOutcome::NoBackup);
        }

        match prompt.on_recoverable_backup_found(&snapshot) {
            RecoveryDecision::Restore => {
                tracing::info!("Restoring unsynced draft of {}", snapshot.event_data.event_id);
                Ok(RecoveryOutcome::Restored(snapshot))
            }
            RecoveryDecision::Discard => {
                tracing::info!("Unsynced draft discarded by user");
                self.backup.clear_backup().await?;
                Ok(RecoveryOutcome::Declined)
            }
        }
    }
}
