//! Session flows over the SQLite store, on real time

use pretty_assertions::assert_eq;
use std::sync::Arc;

use eventlog_pro::client::form::HeaderField;
use eventlog_pro::client::local_db::{BackupStore, LocalDatabase};
use eventlog_pro::client::recovery::{RecoveryDecision, RecoveryOutcome};
use eventlog_pro::client::remote::{MemoryStore, RemoteStore};
use eventlog_pro::client::session::EventSession;
use eventlog_pro::shared::SyncSnapshot;

use crate::common::*;

fn fill_form(session: &mut EventSession<MemoryStore, LocalDatabase>, name: &str) {
    crate::assert_ok!(session.edit(|form| {
        form.set_field(HeaderField::EventName, name);
        form.set_field(HeaderField::EventDate, "2024-11-20");
        form.set_field(HeaderField::Venue, "Science Park");
        form.update_row(0, |row| row.name = "Ana".to_string());
        let row = form.add_row();
        form.update_row(row, |r| r.name = "Ben".to_string());
    }));
}

#[tokio::test]
async fn test_draft_survives_restart_and_syncs() {
    let dir = tempfile::tempdir().expect("temp dir");
    let db_path = dir.path().join("local.db");
    let store = Arc::new(MemoryStore::new());

    // First run: offline, edits only reach the local backup
    let event_id = {
        let db = Arc::new(crate::assert_ok!(LocalDatabase::open(&db_path).await));
        let mut session = EventSession::start(fast_config(), Arc::clone(&store), db);
        crate::assert_ok!(session.set_network_online(false));
        let event_id = crate::assert_ok!(session.new_event().await);
        fill_form(&mut session, "Observatory");
        crate::assert_ok!(session.sync_handle().wait_for(|s| s.pending_count == 1).await);
        session.shutdown().await;
        event_id
    };
    assert_eq!(store.calls().upsert, 0);

    // Second run: the draft is offered, restored and written
    let db = Arc::new(crate::assert_ok!(LocalDatabase::open(&db_path).await));
    let mut session = EventSession::start(fast_config(), Arc::clone(&store), Arc::clone(&db));
    let mut offered = 0;
    let outcome = crate::assert_ok!(
        session
            .recover(&mut |snapshot: &SyncSnapshot| {
                offered += 1;
                assert_eq!(snapshot.event_data.event_name, "Observatory");
                RecoveryDecision::Restore
            })
            .await
    );
    assert_eq!(offered, 1);
    assert!(matches!(outcome, RecoveryOutcome::Restored(_)));

    crate::assert_ok!(
        session
            .sync_handle()
            .wait_for(|s| s.metrics.successful_syncs == 1)
            .await
    );
    let stored = crate::assert_ok!(store.fetch_event(&event_id).await).expect("synced");
    assert_eq!(stored.event_name, "Observatory");
    assert_roster(&stored, &["Ana", "Ben"]);

    let confirmed = crate::assert_ok!(db.load_confirmed_snapshot().await).expect("confirmed");
    assert!(confirmed.content_eq(&stored));
    assert!(crate::assert_ok!(db.get_last_sync_time().await).is_some());

    session.shutdown().await;
}

#[tokio::test]
async fn test_synced_draft_is_not_offered_again() {
    let db = Arc::new(crate::assert_ok!(LocalDatabase::in_memory().await));
    let store = Arc::new(MemoryStore::new());

    let mut session = EventSession::start(fast_config(), Arc::clone(&store), Arc::clone(&db));
    crate::assert_ok!(session.new_event().await);
    fill_form(&mut session, "Aquarium");
    crate::assert_ok!(
        session
            .sync_handle()
            .wait_for(|s| s.metrics.successful_syncs == 1)
            .await
    );
    session.shutdown().await;

    let mut session = EventSession::start(fast_config(), store, Arc::clone(&db));
    let outcome = crate::assert_ok!(
        session
            .recover(&mut |_: &SyncSnapshot| -> RecoveryDecision {
                panic!("already synced draft was offered")
            })
            .await
    );
    assert_eq!(outcome, RecoveryOutcome::AlreadySynced);
    assert!(crate::assert_ok!(db.load_latest_backup().await).is_none());
    session.shutdown().await;
}

#[tokio::test]
async fn test_declined_draft_is_gone() {
    let db = Arc::new(crate::assert_ok!(LocalDatabase::in_memory().await));
    let snapshot = SyncSnapshot::capture(trip(9, "Harbour"));
    crate::assert_ok!(db.save_backup(&snapshot).await);

    let mut session = EventSession::start(fast_config(), Arc::new(MemoryStore::new()), Arc::clone(&db));
    let outcome = crate::assert_ok!(
        session
            .recover(&mut |_: &SyncSnapshot| RecoveryDecision::Discard)
            .await
    );
    assert_eq!(outcome, RecoveryOutcome::Declined);
    assert!(crate::assert_ok!(db.load_latest_backup().await).is_none());
    assert_eq!(session.form().field(HeaderField::EventName), "");
    session.shutdown().await;
}

#[tokio::test]
async fn test_load_edit_and_delete() {
    let db = Arc::new(crate::assert_ok!(LocalDatabase::in_memory().await));
    let store = Arc::new(MemoryStore::new());
    store.insert(trip(4, "Castle")).await;
    store.insert(trip(6, "Lake")).await;

    let mut session = EventSession::start(fast_config(), Arc::clone(&store), db);
    let events = crate::assert_ok!(session.list_events().await);
    assert_eq!(events.len(), 2);

    let loaded = crate::assert_ok!(session.load_event(&events[0].event_id).await);
    crate::assert_ok!(session.edit(|form| {
        form.set_field(HeaderField::Vehicle, "Coach 12");
        form.push_student(student("Cy"))
    }));
    crate::assert_ok!(
        session
            .sync_handle()
            .wait_for(|s| s.metrics.successful_syncs == 1)
            .await
    );
    let stored = crate::assert_ok!(store.fetch_event(&loaded.event_id).await).expect("stored");
    assert_eq!(stored.vehicle, "Coach 12");
    assert_roster(&stored, &["Ana", "Ben", "Cy"]);

    crate::assert_ok!(session.delete_current_event().await);
    assert!(crate::assert_ok!(store.fetch_event(&loaded.event_id).await).is_none());
    assert_eq!(crate::assert_ok!(session.list_events().await).len(), 1);

    session.shutdown().await;
}
