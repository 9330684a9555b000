/**
 * Spreadsheet RPC Client
 *
 * Talks to a spreadsheet macro deployed as a single web endpoint. Reads are
 * `GET ?action=...`, writes are `POST` with a JSON body `{action, ...}` sent
 * as `text/plain` (the macro host rejects preflighted requests). The macro
 * performs the roster replacement itself; this client only sends the
 * normalized record.
 *
 * The macro distinguishes `saveEvent` (append a header row) from
 * `updateEvent` (rewrite it), so the client remembers which ids the
 * backend already holds.
 */
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::client::remote::{check_status, http_client, RemoteStore};
use crate::shared::config::AppConfig;
use crate::shared::error::{SyncError, SyncResult};
use crate::shared::event::{next_event_id, sort_by_recency, EventId, EventRecord, EventSummary};

const TEXT_PLAIN: &str = "text/plain;charset=utf-8";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RpcResponse {
    success: bool,
    error: Option<String>,
    events: Option<Vec<EventSummary>>,
    event: Option<EventRecord>,
    event_id: Option<EventId>,
}

impl RpcResponse {
    fn accepted() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    fn error_text(&self) -> &str {
        self.error.as_deref().unwrap_or("unknown error")
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RpcRequest<'a> {
    action: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    event_data: Option<&'a EventRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    event_id: Option<&'a EventId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sheet_id: Option<&'a str>,
    client_id: Uuid,
}

/// Spreadsheet macro adapter
#[derive(Debug)]
pub struct RpcClient {
    client: Client,
    api_url: Option<String>,
    sheet_id: Option<String>,
    /// Sent with every write so the macro log can tell clients apart
    client_id: Uuid,
    known_ids: RwLock<KnownIds>,
}

#[derive(Debug, Default)]
struct KnownIds {
    ids: HashSet<EventId>,
    primed: bool,
}

impl RpcClient {
    /// Build a client; an unset or placeholder URL is reported by `ready()`
    pub fn new(config: &AppConfig) -> SyncResult<Self> {
        Ok(Self {
            client: http_client()?,
            api_url: config.effective_api_url().map(str::to_string),
            sheet_id: config.sheet_id.clone(),
            client_id: Uuid::new_v4(),
            known_ids: RwLock::new(KnownIds::default()),
        })
    }

    fn endpoint(&self) -> SyncResult<&str> {
        self.api_url
            .as_deref()
            .ok_or_else(|| SyncError::unavailable("API URL not configured"))
    }

    async fn get(&self, action: &str, params: &[(&str, &str)]) -> SyncResult<RpcResponse> {
        let url = self.endpoint()?;
        let mut query = vec![("action", action)];
        query.extend_from_slice(params);

        tracing::debug!("RPC GET {}", action);
        let response = self.client.get(url).query(&query).send().await?;
        let response = check_status(response, action).await?;
        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn post(&self, request: RpcRequest<'_>) -> SyncResult<RpcResponse> {
        let url = self.endpoint()?;
        let body = serde_json::to_string(&request)?;

        tracing::debug!("RPC POST {}", request.action);
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, TEXT_PLAIN)
            .body(body)
            .send()
            .await?;
        let response = check_status(response, request.action).await?;
        let text = response.text().await?;
        if text.trim().is_empty() {
            // Some deployments answer writes with an empty body
            return Ok(RpcResponse::accepted());
        }

        let parsed: RpcResponse = serde_json::from_str(&text)?;
        if !parsed.success {
            return Err(SyncError::validation(
                request.action,
                format!("{} rejected: {}", request.action, parsed.error_text()),
            ));
        }
        Ok(parsed)
    }

    fn write_request<'a>(&'a self, action: &'a str) -> RpcRequest<'a> {
        RpcRequest {
            action,
            event_data: None,
            event_id: None,
            sheet_id: self.sheet_id.as_deref(),
            client_id: self.client_id,
        }
    }

    /// Whether the backend already holds `event_id`. Lists events once to
    /// learn what exists before the first decision.
    async fn is_known(&self, event_id: &EventId) -> SyncResult<bool> {
        if !self.known_ids.read().await.primed {
            self.list_events().await?;
        }
        Ok(self.known_ids.read().await.ids.contains(event_id))
    }

    async fn remember(&self, event_id: &EventId) {
        self.known_ids.write().await.ids.insert(event_id.clone());
    }
}

impl RemoteStore for RpcClient {
    async fn ready(&self) -> SyncResult<()> {
        self.endpoint().map(|_| ())
    }

    async fn generate_id(&self, year: i32) -> EventId {
        let year_text = year.to_string();
        match self.get("generateEventId", &[("year", year_text.as_str())]).await {
            Ok(RpcResponse {
                success: true,
                event_id: Some(id),
                ..
            }) if id.year() == Some(year) => return id,
            Ok(response) => {
                tracing::debug!("generateEventId gave no usable id: {}", response.error_text())
            }
            Err(e) => tracing::warn!("generateEventId failed: {}", e),
        }

        match self.list_events().await {
            Ok(events) => next_event_id(year, events.iter().map(|e| &e.event_id)),
            Err(_) => EventId::first_of_year(year),
        }
    }

    async fn list_events(&self) -> SyncResult<Vec<EventSummary>> {
        let response = self.get("getAllEvents", &[]).await?;
        if !response.success {
            return Err(SyncError::unavailable(format!(
                "getAllEvents rejected: {}",
                response.error_text()
            )));
        }

        let mut events = response.events.unwrap_or_default();
        {
            let mut known = self.known_ids.write().await;
            known.ids.extend(events.iter().map(|e| e.event_id.clone()));
            known.primed = true;
        }
        sort_by_recency(&mut events);
        Ok(events)
    }

    async fn fetch_event(&self, event_id: &EventId) -> SyncResult<Option<EventRecord>> {
        let response = self
            .get("getEventData", &[("eventId", event_id.as_str())])
            .await?;
        if !response.success {
            if response.error_text().to_ascii_lowercase().contains("not found") {
                return Ok(None);
            }
            return Err(SyncError::unavailable(format!(
                "getEventData rejected: {}",
                response.error_text()
            )));
        }

        match response.event {
            Some(event) => {
                self.remember(&event.event_id).await;
                Ok(Some(event))
            }
            None => Ok(None),
        }
    }

    async fn upsert_event(&self, record: &EventRecord) -> SyncResult<()> {
        record.validate()?;
        let payload = record.normalized();
        let action = if self.is_known(&payload.event_id).await? {
            "updateEvent"
        } else {
            "saveEvent"
        };

        let mut request = self.write_request(action);
        request.event_data = Some(&payload);
        self.post(request).await?;

        self.remember(&payload.event_id).await;
        tracing::info!("{} accepted for {}", action, payload.event_id);
        Ok(())
    }

    async fn delete_event(&self, event_id: &EventId) -> SyncResult<()> {
        let mut request = self.write_request("deleteEvent");
        request.event_id = Some(event_id);
        self.post(request).await?;

        self.known_ids.write().await.ids.remove(event_id);
        Ok(())
    }
}
