//! Acceptance scenarios for the sync core

use pretty_assertions::assert_eq;
use std::time::Duration;
use wiremock::MockServer;

use eventlog_pro::client::form::{HeaderField, RosterForm};
use eventlog_pro::client::remote::memory::CallCounts;
use eventlog_pro::client::remote::{DocumentClient, MemoryStore, RemoteStore, RpcClient};
use eventlog_pro::shared::{EventId, EventRecord, SyncError};

use crate::common::*;

#[tokio::test(start_paused = true)]
async fn scenario_a_missing_name_is_rejected_without_network() {
    let env = TestEngine::start(quiet_config());
    let record = EventRecord {
        event_id: EventId::new(2024, 1),
        event_name: String::new(),
        event_date: "2024-05-01".to_string(),
        students: Vec::new(),
        ..EventRecord::default()
    };
    crate::assert_err!(record.validate(), SyncError::Validation { .. });

    crate::assert_ok!(env.sync.notify_field_changed(record.clone()));
    let status = crate::assert_ok!(env.sync.wait_for(|s| s.is_blocked_by_validation()).await);
    assert_eq!(status.pending_count, 1);
    assert_eq!(status.metrics.local_rejections, 1);

    crate::assert_ok!(env.sync.force_sync_now(Some(record)));
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(env.store.calls(), CallCounts::default());
    assert!(env.sync.sync_status().is_blocked_by_validation());

    env.shutdown().await;
}

#[tokio::test]
async fn scenario_b_only_named_students_are_persisted() {
    let record = EventRecord {
        students: roster_with_placeholder(),
        ..trip(2, "Museum")
    };

    let store = MemoryStore::new();
    crate::assert_ok!(store.upsert_event(&record).await);
    let stored = crate::assert_ok!(store.fetch_event(&record.event_id).await).expect("stored");
    assert_roster(&stored, &["Ana"]);
    assert_eq!(stored.students[0].other_illness, "Celiac");

    let server = MockServer::start().await;
    mount_document_writes(&server).await;
    let client = crate::assert_ok!(DocumentClient::new(&document_config(&server)));
    crate::assert_ok!(client.upsert_event(&record).await);

    let inserts = bodies_of(&server, "POST", &format!("{}/students", REST_PREFIX)).await;
    assert_eq!(inserts.len(), 1);
    let rows = inserts[0].as_array().expect("row array");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name"], "Ana");
    assert_eq!(rows[0]["other_illness"], "Celiac");
}

#[tokio::test]
async fn scenario_c_next_id_follows_highest_sequence() {
    let store = MemoryStore::new();
    store.insert(trip(1, "Zoo")).await;
    store.insert(trip(3, "Farm")).await;
    assert_eq!(store.generate_id(2024).await.as_str(), "2024-004");

    // RPC endpoint without generateEventId: falls back to scanning the list
    let server = MockServer::start().await;
    mount_rpc_event_list(&server, &["2024-001", "2024-003", "2023-009"]).await;
    let client = crate::assert_ok!(RpcClient::new(&rpc_config(&server)));
    assert_eq!(client.generate_id(2024).await.as_str(), "2024-004");
}

#[tokio::test(start_paused = true)]
async fn scenario_d_offline_edits_sync_once_on_reconnect() {
    let env = TestEngine::start(quiet_config());
    crate::assert_ok!(env.sync.set_online(false));

    for name in ["Trip v1", "Trip v2", "Trip v3"] {
        crate::assert_ok!(env.sync.notify_field_changed(trip(5, name)));
        tokio::time::sleep(Duration::from_secs(3)).await;
    }

    assert_eq!(env.backup.backup_writes(), 3);
    assert_eq!(env.store.calls(), CallCounts::default());

    crate::assert_ok!(env.sync.set_online(true));
    crate::assert_ok!(env.sync.wait_for(|s| s.metrics.successful_syncs == 1).await);
    tokio::time::sleep(Duration::from_secs(30)).await;

    assert_eq!(env.store.calls().upsert, 1);
    let written = env.store.accepted_writes();
    assert_eq!(written.len(), 1);
    assert_eq!(written[0].event_name, "Trip v3");

    env.shutdown().await;
}

#[test]
fn scenario_e_blank_teacher_segments_are_ignored() {
    let record = EventRecord {
        accompanying: "Smith, , Jones,".to_string(),
        ..EventRecord::default()
    };
    assert_eq!(record.teacher_count(), 2);

    let mut form = RosterForm::default();
    form.set_field(HeaderField::Accompanying, "Smith, , Jones,");
    form.update_row(0, |row| row.name = "Ana".to_string());
    let summary = form.summary();
    assert_eq!(summary.teacher_count, 2);
    assert_eq!(summary.total_people, 3);
}
