/**
 * Event Log Pro Sync Entry Point
 *
 * Headless companion to the roster UI: loads configuration, opens the local
 * database, offers to restore an unsynced draft from the last run, pushes it
 * if accepted, and checks that the configured backend answers.
 */
use chrono::{Datelike, Utc};
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::Duration;

use eventlog_pro::client::config::Config;
use eventlog_pro::client::local_db::LocalDatabase;
use eventlog_pro::client::logging::init_tracing;
use eventlog_pro::client::recovery::{RecoveryDecision, RecoveryOutcome};
use eventlog_pro::client::remote::{AnyBackend, RemoteStore};
use eventlog_pro::client::session::EventSession;
use eventlog_pro::client::sync::{NetworkMonitor, NetworkStatus};
use eventlog_pro::shared::SyncSnapshot;

/// How long to wait for a restored draft to reach the backend
const PUSH_TIMEOUT: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file if present
    dotenv::dotenv().ok();
    init_tracing();

    let mut config = Config::from_env()?;
    let db = Arc::new(LocalDatabase::from_config(config.app()).await?);
    config.apply_settings(&db.api_settings().await?)?;

    let backend = Arc::new(AnyBackend::from_config(config.app())?);
    tracing::info!("Using {:?} backend", backend.kind());

    let monitor = NetworkMonitor::new();
    if let Some(url) = config.app().effective_api_url() {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        if monitor.probe(&client, url).await == NetworkStatus::Offline {
            tracing::warn!("Backend unreachable; changes stay local until it answers");
        }
    }
    config.sync_mut().start_online = monitor.is_online();

    let mut session = EventSession::start(config.sync().clone(), Arc::clone(&backend), Arc::clone(&db));
    let _forward = monitor.attach(session.sync_handle());

    match session.recover(&mut ask_on_terminal).await? {
        RecoveryOutcome::Restored(snapshot) => {
            println!("Restored draft {}; saving...", snapshot.event_data.event_id);
            push_restored(&session).await;
        }
        RecoveryOutcome::DiscardedStale => println!("Old draft found and discarded."),
        RecoveryOutcome::AlreadySynced => println!("Last draft is already saved."),
        RecoveryOutcome::Declined => println!("Draft discarded."),
        RecoveryOutcome::NoBackup | RecoveryOutcome::EventAlreadyLoaded => {}
    }

    match backend.ready().await {
        Ok(()) => match backend.list_events().await {
            Ok(events) if events.is_empty() => println!("Backend OK: no events yet"),
            Ok(events) => {
                println!("Backend OK: {} event(s)", events.len());
                for event in events.iter().take(10) {
                    println!("  {}  {}  {}", event.event_id, event.event_date, event.event_name);
                }
            }
            Err(e) => println!("Backend answered but listing failed: {}", e),
        },
        Err(e) => println!("Backend not available: {}", e),
    }
    let next_id = backend.generate_id(Utc::now().year()).await;
    println!("Next event id: {}", next_id);

    let status = session.sync_status();
    if let Some(last) = status.last_sync_time {
        println!("Last successful sync: {}", last.to_rfc3339());
    }

    session.shutdown().await;
    Ok(())
}

fn ask_on_terminal(snapshot: &SyncSnapshot) -> RecoveryDecision {
    let record = &snapshot.event_data;
    print!(
        "Unsaved changes to {} \"{}\" from {}. Restore? [y/N] ",
        record.event_id,
        record.event_name,
        snapshot.captured_at.format("%Y-%m-%d %H:%M")
    );
    if io::stdout().flush().is_err() {
        return RecoveryDecision::Discard;
    }

    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return RecoveryDecision::Discard;
    }
    match answer.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => RecoveryDecision::Restore,
        _ => RecoveryDecision::Discard,
    }
}

async fn push_restored(session: &EventSession<AnyBackend, LocalDatabase>) {
    let before = session.sync_status().metrics;
    if let Err(e) = session.force_sync_now() {
        tracing::error!("Could not queue restored draft: {}", e);
        return;
    }

    let sync = session.sync_handle();
    let waiting = sync.wait_for(|s| {
        s.metrics.successful_syncs > before.successful_syncs
            || s.metrics.failed_syncs > before.failed_syncs
            || s.is_blocked_by_validation()
    });
    match tokio::time::timeout(PUSH_TIMEOUT, waiting).await {
        Ok(Ok(status)) if status.last_error.is_none() => println!("Draft saved."),
        Ok(Ok(status)) => {
            let reason = status
                .last_error
                .map(|e| e.to_string())
                .unwrap_or_default();
            println!("Draft kept locally: {}", reason);
        }
        Ok(Err(e)) => println!("Sync stopped: {}", e),
        Err(_) => println!("Still saving; the draft stays in the local backup."),
    }
}
