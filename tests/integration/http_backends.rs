//! Sessions and engines over the HTTP adapters, against wiremock

use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use eventlog_pro::client::form::HeaderField;
use eventlog_pro::client::local_db::MemoryBackup;
use eventlog_pro::client::remote::{DocumentClient, RpcClient};
use eventlog_pro::client::session::EventSession;
use eventlog_pro::client::sync::{BackoffStrategy, SyncConfig, SyncEngine};

use crate::common::*;

#[tokio::test]
async fn test_document_session_writes_header_then_roster() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/events", REST_PREFIX)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    mount_document_writes(&server).await;

    let client = Arc::new(crate::assert_ok!(DocumentClient::new(&document_config(&server))));
    let mut session = EventSession::start(fast_config(), client, Arc::new(MemoryBackup::new()));

    let event_id = crate::assert_ok!(session.new_event().await);
    assert_eq!(event_id.sequence(), Some(1));

    crate::assert_ok!(session.edit(|form| {
        form.set_field(HeaderField::EventName, "Botanic Garden");
        form.set_field(HeaderField::EventDate, "2024-06-02");
        form.update_row(0, |row| row.name = "Ana".to_string());
        form.add_row();
    }));
    let status = crate::assert_ok!(
        session
            .sync_handle()
            .wait_for(|s| s.metrics.successful_syncs == 1)
            .await
    );
    assert!(status.last_error.is_none());
    assert!(status.last_sync_time.is_some());

    let headers = bodies_of(&server, "POST", &format!("{}/events", REST_PREFIX)).await;
    assert_eq!(headers.len(), 1);
    assert_eq!(headers[0][0]["event_id"], event_id.as_str());
    assert_eq!(headers[0][0]["event_name"], "Botanic Garden");

    let rosters = bodies_of(&server, "POST", &format!("{}/students", REST_PREFIX)).await;
    assert_eq!(rosters.len(), 1);
    assert_eq!(rosters[0].as_array().map(Vec::len), Some(1));

    session.shutdown().await;
}

#[tokio::test]
async fn test_rpc_write_retries_after_server_error() {
    let server = MockServer::start().await;
    mount_rpc_event_list(&server, &[]).await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    mount_rpc_writes(&server).await;

    let client = Arc::new(crate::assert_ok!(RpcClient::new(&rpc_config(&server))));
    let config = SyncConfig {
        backoff: BackoffStrategy::Fixed {
            interval: Duration::from_millis(50),
        },
        ..fast_config()
    };
    let engine = SyncEngine::start(config, client, Arc::new(MemoryBackup::new()));
    let sync = engine.handle();

    crate::assert_ok!(sync.notify_field_changed(trip(5, "Mill")));
    let status = crate::assert_ok!(sync.wait_for(|s| s.metrics.successful_syncs == 1).await);
    assert_eq!(status.metrics.failed_syncs, 1);
    assert_eq!(status.pending_count, 0);

    let writes = bodies_of(&server, "POST", "/exec").await;
    assert_eq!(writes.len(), 2);
    for body in &writes {
        assert_eq!(body["action"], "saveEvent");
        assert_eq!(body["sheetId"], "sheet-test");
        assert_eq!(body["eventData"]["eventId"], "2024-005");
    }

    engine.shutdown().await;
}
