//! # Sync Scheduler
//!
//! The actor that owns [`SyncState`]. UI notifications, manual saves and
//! connectivity changes arrive as [`SyncCommand`]s; the actor turns them
//! into at most one remote write at a time.
//!
//! ## Features
//!
//! - **Debounce**: a burst of edits becomes one write carrying the last state
//! - **Single Flight**: one write in flight; later requests collapse into
//!   "write the latest snapshot next"
//! - **Backoff**: transient failures retry after `min(base * 2^n, cap)`
//!   until the retry budget runs out
//! - **Offline Suspension**: deadlines stop while offline; reconnecting
//!   syncs an outstanding change at once
//! - **Heartbeat**: a periodic attempt for changes left outstanding
//! - **Local Backup**: every edit is written to the backup store first,
//!   whatever the network is doing
//!
//! The in-flight write is polled inside the actor's `select!` and is never
//! dropped before it resolves; commands keep being handled meanwhile.

use chrono::Utc;
use futures_util::future::{BoxFuture, FutureExt};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep_until, Instant};

use crate::client::local_db::BackupStore;
use crate::client::remote::RemoteStore;
use crate::client::sync::retry::{RetryDecision, RetryTracker};
use crate::client::sync::sync_state::{SyncPhase, SyncState, SyncStatus};
use crate::client::sync::SyncConfig;
use crate::shared::error::{SyncError, SyncResult};
use crate::shared::event::EventRecord;
use crate::shared::snapshot::SyncSnapshot;

/// Messages handled by the scheduler
#[derive(Debug, Clone)]
pub enum SyncCommand {
    /// The form changed; this is its latest capture
    FieldChanged(SyncSnapshot),
    /// Write now, skipping any wait. A snapshot, when given, is written
    /// even if it matches the last confirmed state.
    SyncNow(Option<SyncSnapshot>),
    NetworkChanged(bool),
    /// A freshly loaded event; it is the confirmed state
    Baseline(EventRecord),
    /// A new, empty event; nothing is confirmed yet
    Reset,
    SetAutoSync(bool),
    Shutdown,
}

struct WriteOutcome {
    record: EventRecord,
    generation: u64,
    bytes: u64,
    result: SyncResult<()>,
}

type WriteFuture = BoxFuture<'static, WriteOutcome>;

enum Wake {
    Command(Option<SyncCommand>),
    Written(WriteOutcome),
    Deadline,
    Heartbeat,
}

pub(crate) struct Scheduler<R, B> {
    config: SyncConfig,
    remote: Arc<R>,
    backup: Arc<B>,
    state: SyncState,
    commands: mpsc::UnboundedReceiver<SyncCommand>,
    status_tx: watch::Sender<SyncStatus>,
    in_flight: Option<WriteFuture>,
    /// Debounce or backoff deadline, whichever is armed
    deadline: Option<Instant>,
    next_heartbeat: Option<Instant>,
    /// `ready()` has resolved and nothing has reported the backend unavailable since
    ready_confirmed: bool,
}

impl<R: RemoteStore, B: BackupStore> Scheduler<R, B> {
    pub(crate) fn new(
        config: SyncConfig,
        remote: Arc<R>,
        backup: Arc<B>,
        commands: mpsc::UnboundedReceiver<SyncCommand>,
        status_tx: watch::Sender<SyncStatus>,
    ) -> Self {
        let retry = RetryTracker::new(config.backoff, config.max_retries);
        let state = SyncState::new(retry, config.start_online);
        Self {
            config,
            remote,
            backup,
            state,
            commands,
            status_tx,
            in_flight: None,
            deadline: None,
            next_heartbeat: None,
            ready_confirmed: false,
        }
    }

    pub(crate) async fn run(mut self) {
        self.restore_sync_metadata().await;
        self.next_heartbeat = self.config.heartbeat_interval.map(|every| Instant::now() + every);
        self.publish();
        tracing::info!("Sync scheduler started (online: {})", self.state.is_online);

        loop {
            let wake = self.next_wake().await;
            match wake {
                Wake::Command(None) | Wake::Command(Some(SyncCommand::Shutdown)) => break,
                Wake::Command(Some(command)) => self.handle_command(command).await,
                Wake::Written(outcome) => self.on_write_complete(outcome).await,
                Wake::Deadline => self.on_deadline().await,
                Wake::Heartbeat => self.on_heartbeat().await,
            }
            self.publish();
        }

        // A write already on the wire still gets its result applied
        if let Some(write) = self.in_flight.take() {
            tracing::debug!("Waiting for in-flight write before stopping");
            let outcome = write.await;
            self.apply_outcome(outcome).await;
        }
        self.deadline = None;
        self.next_heartbeat = None;
        self.state.phase = SyncPhase::Idle;
        self.publish();
        tracing::info!("Sync scheduler stopped");
    }

    async fn next_wake(&mut self) -> Wake {
        // Deadlines only run while online with nothing in flight
        let deadline = if self.state.is_online && self.in_flight.is_none() {
            self.deadline
        } else {
            None
        };
        let heartbeat = self.next_heartbeat;
        let writing = self.in_flight.is_some();
        let commands = &mut self.commands;
        let in_flight = &mut self.in_flight;

        tokio::select! {
            command = commands.recv() => Wake::Command(command),
            outcome = poll_write(in_flight), if writing => Wake::Written(outcome),
            _ = sleep_until_opt(deadline), if deadline.is_some() => Wake::Deadline,
            _ = sleep_until_opt(heartbeat), if heartbeat.is_some() => Wake::Heartbeat,
        }
    }

    async fn handle_command(&mut self, command: SyncCommand) {
        match command {
            SyncCommand::FieldChanged(snapshot) => self.on_field_changed(snapshot).await,
            SyncCommand::SyncNow(snapshot) => self.on_sync_now(snapshot).await,
            SyncCommand::NetworkChanged(online) => self.on_network_changed(online).await,
            SyncCommand::Baseline(record) => {
                self.start_generation();
                self.state.detector.accept(&record);
                tracing::debug!("Baseline set to {}", record.event_id);
            }
            SyncCommand::Reset => {
                self.start_generation();
                self.state.detector.clear();
                tracing::debug!("Baseline cleared for a new event");
            }
            SyncCommand::SetAutoSync(enabled) => {
                self.config.auto_sync = enabled;
                tracing::info!("Automatic sync {}", if enabled { "enabled" } else { "disabled" });
                if !enabled {
                    self.deadline = None;
                    if matches!(self.state.phase, SyncPhase::Backoff(_)) {
                        self.state.phase = SyncPhase::Dirty;
                    }
                } else if self.state.has_outstanding() && !self.state.is_syncing() {
                    self.arm_debounce();
                }
            }
            SyncCommand::Shutdown => {}
        }
    }

    async fn on_field_changed(&mut self, snapshot: SyncSnapshot) {
        self.save_backup(&snapshot).await;

        // A new edit re-enables automatic retries and may fix a rejected form
        self.state.retry.reset();
        if self.state.last_error.as_ref().is_some_and(SyncError::is_validation) {
            self.state.last_error = None;
        }

        // While a write is out the baseline may be about to move, so the
        // edit stays pending and the write's outcome decides
        let writing = self.in_flight.is_some();
        if !writing && !self.state.detector.has_changes(&snapshot.event_data) {
            tracing::debug!("Edit matches the confirmed state; nothing to sync");
            self.state.pending = None;
            self.deadline = None;
            if !self.state.is_syncing() {
                self.state.phase = SyncPhase::Idle;
            }
            return;
        }

        self.state.pending = Some(snapshot);
        if !self.state.is_syncing() {
            self.state.phase = SyncPhase::Dirty;
        }
        if self.config.auto_sync {
            self.arm_debounce();
        }
    }

    async fn on_sync_now(&mut self, snapshot: Option<SyncSnapshot>) {
        self.state.retry.reset();
        if let Some(snapshot) = snapshot {
            self.save_backup(&snapshot).await;
            self.state.pending = Some(snapshot);
        }
        if !self.state.has_outstanding() {
            tracing::debug!("Manual sync requested with nothing pending");
            return;
        }

        self.deadline = None;
        if self.in_flight.is_some() {
            tracing::debug!("Write in flight; latest snapshot goes next");
            self.state.follow_up = true;
            return;
        }
        if !self.state.is_online {
            tracing::info!("Offline; manual sync will run on reconnect");
            self.state.phase = SyncPhase::Dirty;
            return;
        }
        self.start_sync();
    }

    async fn on_network_changed(&mut self, online: bool) {
        if self.state.is_online == online {
            return;
        }
        self.state.is_online = online;

        if !online {
            tracing::info!("Network offline; automatic sync suspended");
            return;
        }
        tracing::info!("Network back online");
        if self.config.auto_sync && self.in_flight.is_none() && self.state.can_auto_sync() {
            self.deadline = None;
            self.start_sync();
        }
    }

    async fn on_deadline(&mut self) {
        self.deadline = None;
        match self.state.phase {
            SyncPhase::Dirty | SyncPhase::Backoff(_) => self.start_sync(),
            _ => {}
        }
    }

    async fn on_heartbeat(&mut self) {
        self.next_heartbeat = self
            .config
            .heartbeat_interval
            .map(|every| Instant::now() + every);

        let waiting = matches!(self.state.phase, SyncPhase::Idle | SyncPhase::Dirty);
        if self.config.auto_sync
            && self.state.is_online
            && self.in_flight.is_none()
            && waiting
            && self.state.can_auto_sync()
        {
            tracing::debug!("Heartbeat sync for outstanding change");
            self.deadline = None;
            self.start_sync();
        }
    }

    /// Begin writing the pending snapshot, unless it cannot be written
    fn start_sync(&mut self) {
        let Some(snapshot) = self.state.pending.clone() else {
            self.state.phase = SyncPhase::Idle;
            return;
        };
        let record = snapshot.event_data;

        if let Err(error) = record.validate() {
            tracing::warn!("Not saving {}: {}", record.event_id, error);
            self.state.metrics.record_local_rejection();
            self.state.last_error = Some(error);
            self.state.phase = SyncPhase::Idle;
            self.state.follow_up = false;
            self.deadline = None;
            return;
        }

        if record.event_id.is_empty() {
            tracing::debug!("No event id yet; keeping the draft local");
            self.state.detector.accept(&record);
            self.state.pending = None;
            self.state.last_error = None;
            self.state.phase = SyncPhase::Idle;
            self.state.follow_up = false;
            return;
        }

        self.state.phase = SyncPhase::Syncing;
        self.state.follow_up = false;
        self.deadline = None;
        self.state.metrics.record_sync_start();
        tracing::info!("Syncing {}", record.event_id);

        let bytes = serde_json::to_vec(&record).map_or(0, |json| json.len() as u64);
        let remote = Arc::clone(&self.remote);
        let check_ready = !self.ready_confirmed;
        let generation = self.state.generation;

        self.in_flight = Some(
            async move {
                let result = async {
                    if check_ready {
                        remote.ready().await?;
                    }
                    remote.upsert_event(&record).await
                }
                .await;
                WriteOutcome {
                    record,
                    generation,
                    bytes,
                    result,
                }
            }
            .boxed(),
        );
    }

    async fn on_write_complete(&mut self, outcome: WriteOutcome) {
        self.in_flight = None;
        self.apply_outcome(outcome).await;
        self.continue_after_write();
    }

    /// Fold a finished write into the state. Does not start another write.
    async fn apply_outcome(&mut self, outcome: WriteOutcome) {
        self.ready_confirmed = !matches!(outcome.result, Err(SyncError::BackendUnavailable { .. }));

        if outcome.generation != self.state.generation {
            tracing::debug!("Dropping result of a write for a previous event");
            match outcome.result {
                Ok(()) => self.state.metrics.record_sync_success(outcome.bytes),
                Err(e) => self.state.metrics.record_sync_failure(e.is_transient()),
            }
            self.state.phase = SyncPhase::Idle;
            return;
        }

        match outcome.result {
            Ok(()) => {
                let now = Utc::now();
                self.state.metrics.record_sync_success(outcome.bytes);
                self.state.detector.accept(&outcome.record);
                self.state.last_sync_time = Some(now);
                self.state.retry.reset();
                self.state.last_error = None;
                self.state.phase = SyncPhase::Idle;
                tracing::info!("Synced {}", outcome.record.event_id);

                if let Err(e) = self.backup.save_confirmed_snapshot(&outcome.record).await {
                    tracing::error!("Failed to store confirmed snapshot: {}", e);
                }
                if let Err(e) = self.backup.set_last_sync_time(now).await {
                    tracing::error!("Failed to store last sync time: {}", e);
                }

                let superseded = self
                    .state
                    .pending
                    .as_ref()
                    .is_some_and(|p| self.state.detector.has_changes(&p.event_data));
                if !superseded {
                    self.state.pending = None;
                }
            }
            Err(error) if error.is_transient() => {
                self.state.metrics.record_sync_failure(true);
                self.state.last_error = Some(error.clone());
                if self.state.follow_up {
                    // A manual request arrived mid-flight; it gets a fresh budget
                    self.state.retry.reset();
                    self.state.phase = SyncPhase::Dirty;
                    return;
                }
                match self.state.retry.record_failure() {
                    RetryDecision::RetryAfter(delay) => {
                        let attempt = self.state.retry.attempt();
                        tracing::warn!(
                            "Sync of {} failed (attempt {}), retrying in {:?}: {}",
                            outcome.record.event_id,
                            attempt,
                            delay,
                            error
                        );
                        self.state.phase = SyncPhase::Backoff(attempt);
                        self.deadline = Some(Instant::now() + delay);
                    }
                    RetryDecision::GiveUp => {
                        tracing::error!(
                            "Giving up on {} after {} attempts: {}",
                            outcome.record.event_id,
                            self.config.max_retries,
                            error
                        );
                        self.state.phase = SyncPhase::Idle;
                        self.deadline = None;
                    }
                }
            }
            Err(error) => {
                self.state.metrics.record_sync_failure(false);
                tracing::error!("Sync of {} rejected: {}", outcome.record.event_id, error);
                self.state.last_error = Some(error);
                self.state.phase = SyncPhase::Idle;
                self.deadline = None;
            }
        }
    }

    /// After a write resolves: start the follow-up if one is due
    fn continue_after_write(&mut self) {
        if matches!(self.state.phase, SyncPhase::Backoff(_)) {
            return;
        }
        if !self.state.has_outstanding() {
            self.state.follow_up = false;
            return;
        }

        let manual = self.state.follow_up;
        let blocked = !manual && !self.state.can_auto_sync();
        if blocked {
            return;
        }
        self.state.phase = SyncPhase::Dirty;
        if !self.state.is_online {
            return;
        }

        let debounce_over = self.deadline.map_or(true, |at| at <= Instant::now());
        if manual || (self.config.auto_sync && debounce_over) {
            self.start_sync();
        }
    }

    fn arm_debounce(&mut self) {
        self.deadline = Some(Instant::now() + self.config.debounce);
        tracing::debug!("Debounce armed for {:?}", self.config.debounce);
    }

    /// The session switched events; forget everything about the old one
    fn start_generation(&mut self) {
        self.state.generation += 1;
        self.state.pending = None;
        self.state.follow_up = false;
        self.state.retry.reset();
        self.state.last_error = None;
        self.deadline = None;
        self.state.phase = if self.in_flight.is_some() {
            SyncPhase::Syncing
        } else {
            SyncPhase::Idle
        };
    }

    async fn save_backup(&mut self, snapshot: &SyncSnapshot) {
        if let Err(e) = self.backup.save_backup(snapshot).await {
            tracing::error!("Failed to write local backup: {}", e);
        }
    }

    async fn restore_sync_metadata(&mut self) {
        match self.backup.get_last_sync_time().await {
            Ok(last) => self.state.last_sync_time = last,
            Err(e) => tracing::warn!("Could not read last sync time: {}", e),
        }
        match self.backup.load_confirmed_snapshot().await {
            Ok(Some(record)) => self.state.detector.accept(&record),
            Ok(None) => {}
            Err(e) => tracing::warn!("Could not read confirmed snapshot: {}", e),
        }
    }

    fn publish(&self) {
        self.status_tx.send_replace(self.state.status());
    }
}

async fn poll_write(in_flight: &mut Option<WriteFuture>) -> WriteOutcome {
    match in_flight {
        Some(write) => write.await,
        None => std::future::pending().await,
    }
}

async fn sleep_until_opt(at: Option<Instant>) {
    match at {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}
