//! Mock server helpers for integration tests
//!
//! wiremock setups for the two HTTP backends. Mocks answer every matching
//! request; tests inspect `received_requests` for what was sent.

use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use eventlog_pro::shared::{AppConfig, BackendKind};

/// Document API base path used by every helper
pub const REST_PREFIX: &str = "/rest/v1";

/// Configuration pointing the document adapter at `server`
pub fn document_config(server: &MockServer) -> AppConfig {
    AppConfig::builder()
        .backend(BackendKind::Document)
        .api_url(format!("{}{}", server.uri(), REST_PREFIX))
        .api_key("test-key")
        .build()
        .expect("valid document config")
}

/// Configuration pointing the RPC adapter at `server`
pub fn rpc_config(server: &MockServer) -> AppConfig {
    AppConfig::builder()
        .api_url(format!("{}/exec", server.uri()))
        .sheet_id("sheet-test")
        .build()
        .expect("valid rpc config")
}

/// Accept header upserts and roster replacement for any event
pub async fn mount_document_writes(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(format!("{}/events", REST_PREFIX)))
        .respond_with(ResponseTemplate::new(201))
        .mount(server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(format!("{}/students", REST_PREFIX)))
        .respond_with(ResponseTemplate::new(204))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{}/students", REST_PREFIX)))
        .respond_with(ResponseTemplate::new(201))
        .mount(server)
        .await;
}

/// Answer `getAllEvents` with the given ids
pub async fn mount_rpc_event_list(server: &MockServer, ids: &[&str]) {
    let events: Vec<Value> = ids.iter().map(|id| json!({ "eventId": id })).collect();
    Mock::given(method("GET"))
        .and(query_param("action", "getAllEvents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "events": events
        })))
        .mount(server)
        .await;
}

/// Accept every RPC write
pub async fn mount_rpc_writes(server: &MockServer) {
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .mount(server)
        .await;
}

/// JSON bodies of the requests matching `verb` and `request_path`, in order
pub async fn bodies_of(server: &MockServer, verb: &str, request_path: &str) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.method.as_str() == verb && r.url.path() == request_path)
        .filter_map(|r| serde_json::from_slice(&r.body).ok())
        .collect()
}
