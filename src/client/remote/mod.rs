//! # Remote Store
//!
//! Everything the sync core needs from a backend, behind one trait. The
//! scheduler and the session are generic over [`RemoteStore`]; concrete
//! adapters translate the five operations into their own transport and
//! convert every failure into a [`SyncError`] before it leaves the adapter.
//!
//! ## Adapters
//!
//! - [`RpcClient`]: spreadsheet-macro endpoint, `GET ?action=` for reads and
//!   `POST {action, ...}` for writes
//! - [`DocumentClient`]: PostgREST-style REST API over `events` and `students`
//! - [`MemoryStore`]: in-process store with failure injection, for tests
//! - [`AnyBackend`]: picks one of the above from [`AppConfig`]

pub mod document;
pub mod memory;
pub mod rpc;

pub use document::DocumentClient;
pub use memory::MemoryStore;
pub use rpc::RpcClient;

use reqwest::StatusCode;
use std::future::Future;
use std::time::Duration;

use crate::shared::config::{AppConfig, BackendKind};
use crate::shared::error::{SyncError, SyncResult};
use crate::shared::event::{next_event_id, EventId, EventRecord, EventSummary};

/// Request timeout for both HTTP adapters
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Backend operations used by the sync core
pub trait RemoteStore: Send + Sync + 'static {
    /// Resolves once the backend can take requests. Awaited before the
    /// first write and again after a write fails as unavailable.
    fn ready(&self) -> impl Future<Output = SyncResult<()>> + Send;

    /// Next unused id for `year`.
    ///
    /// Never fails: an unreachable backend yields `{year}-001`, which is a
    /// local guess and may collide with another client's.
    fn generate_id(&self, year: i32) -> impl Future<Output = EventId> + Send {
        async move {
            match self.list_events().await {
                Ok(events) => next_event_id(year, events.iter().map(|e| &e.event_id)),
                Err(e) => {
                    tracing::warn!("Could not scan event ids, using first id of {}: {}", year, e);
                    EventId::first_of_year(year)
                }
            }
        }
    }

    /// Event picker entries, most recently modified first
    fn list_events(&self) -> impl Future<Output = SyncResult<Vec<EventSummary>>> + Send;

    /// Header joined with roster; `None` when the id is unknown
    fn fetch_event(
        &self,
        event_id: &EventId,
    ) -> impl Future<Output = SyncResult<Option<EventRecord>>> + Send;

    /// Create or overwrite the header, then replace the whole roster with
    /// the named students, numbered from 1 in submitted order
    fn upsert_event(&self, record: &EventRecord) -> impl Future<Output = SyncResult<()>> + Send;

    /// Remove the header and every student of the event
    fn delete_event(&self, event_id: &EventId) -> impl Future<Output = SyncResult<()>> + Send;
}

/// Adapter chosen at runtime from configuration
#[derive(Debug)]
pub enum AnyBackend {
    Rpc(RpcClient),
    Document(DocumentClient),
    Memory(MemoryStore),
}

impl AnyBackend {
    pub fn from_config(config: &AppConfig) -> SyncResult<Self> {
        Ok(match config.backend {
            BackendKind::Rpc => Self::Rpc(RpcClient::new(config)?),
            BackendKind::Document => Self::Document(DocumentClient::new(config)?),
            BackendKind::Memory => Self::Memory(MemoryStore::new()),
        })
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            Self::Rpc(_) => BackendKind::Rpc,
            Self::Document(_) => BackendKind::Document,
            Self::Memory(_) => BackendKind::Memory,
        }
    }
}

impl RemoteStore for AnyBackend {
    async fn ready(&self) -> SyncResult<()> {
        match self {
            Self::Rpc(client) => client.ready().await,
            Self::Document(client) => client.ready().await,
            Self::Memory(store) => store.ready().await,
        }
    }

    async fn generate_id(&self, year: i32) -> EventId {
        match self {
            Self::Rpc(client) => client.generate_id(year).await,
            Self::Document(client) => client.generate_id(year).await,
            Self::Memory(store) => store.generate_id(year).await,
        }
    }

    async fn list_events(&self) -> SyncResult<Vec<EventSummary>> {
        match self {
            Self::Rpc(client) => client.list_events().await,
            Self::Document(client) => client.list_events().await,
            Self::Memory(store) => store.list_events().await,
        }
    }

    async fn fetch_event(&self, event_id: &EventId) -> SyncResult<Option<EventRecord>> {
        match self {
            Self::Rpc(client) => client.fetch_event(event_id).await,
            Self::Document(client) => client.fetch_event(event_id).await,
            Self::Memory(store) => store.fetch_event(event_id).await,
        }
    }

    async fn upsert_event(&self, record: &EventRecord) -> SyncResult<()> {
        match self {
            Self::Rpc(client) => client.upsert_event(record).await,
            Self::Document(client) => client.upsert_event(record).await,
            Self::Memory(store) => store.upsert_event(record).await,
        }
    }

    async fn delete_event(&self, event_id: &EventId) -> SyncResult<()> {
        match self {
            Self::Rpc(client) => client.delete_event(event_id).await,
            Self::Document(client) => client.delete_event(event_id).await,
            Self::Memory(store) => store.delete_event(event_id).await,
        }
    }
}

/// Shared HTTP client with the adapter timeout
pub(crate) fn http_client() -> SyncResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| SyncError::unavailable(format!("Failed to build HTTP client: {}", e)))
}

/// Pass successful responses through. A client error the backend would
/// repeat for the same request becomes `Validation`; anything else is
/// `BackendUnavailable` and may be retried.
pub(crate) async fn check_status(
    response: reqwest::Response,
    operation: &str,
) -> SyncResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| status.to_string());
    let message = format!("{} failed: {} - {}", operation, status, error_text);
    if is_rejection(status) {
        Err(SyncError::validation(operation, message))
    } else {
        Err(SyncError::unavailable(message))
    }
}

/// 4xx answers that depend on the payload rather than on the backend's
/// health. Auth, timeouts, rate limits and missing routes can clear up.
fn is_rejection(status: StatusCode) -> bool {
    status.is_client_error()
        && !matches!(
            status,
            StatusCode::UNAUTHORIZED
                | StatusCode::FORBIDDEN
                | StatusCode::NOT_FOUND
                | StatusCode::REQUEST_TIMEOUT
                | StatusCode::TOO_MANY_REQUESTS
        )
}
