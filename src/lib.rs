//! Event Log Pro - Sync Core
//!
//! Event Log Pro keeps school-trip rosters: an event header (name, date,
//! venue, transport, accompanying teachers) plus a student list with
//! medical, permission and attendance flags. This crate is the part that
//! is not UI: it keeps the remote copy of an event in step with the form
//! while connectivity comes and goes.
//!
//! # Overview
//!
//! - Debounced autosave with a single write in flight
//! - Retry with capped exponential backoff
//! - Offline suspension and catch-up on reconnect
//! - A local backup of every edit, offered back after a crash
//! - Two interchangeable backends: a spreadsheet RPC endpoint and a
//!   document database REST API
//!
//! # Module Structure
//!
//! - **`shared`** - Data model, snapshots, errors and configuration
//!   - `EventRecord`, `StudentRecord`, `EventId`, `SyncSnapshot`
//!   - `SyncError` taxonomy
//!   - `AppConfig` and its builder
//!
//! - **`client`** - Everything that runs next to the UI
//!   - Sync engine (scheduler actor, retry, change detection)
//!   - `RemoteStore` trait and adapters
//!   - SQLite-backed local storage
//!   - Recovery manager and the `EventSession` facade
//!
//! # Thread Safety
//!
//! Sync state is owned by one tokio task; callers talk to it through a
//! cloneable `SyncHandle` and read status from a watch channel. Adapters
//! and stores are `Send + Sync` and shared through `Arc`.
//!
//! # Error Handling
//!
//! Every fallible operation returns `SyncResult<T>`. `SyncError::is_transient`
//! separates failures worth retrying from ones that need user action.

/// Shared types and data structures
pub mod shared;

/// Local-first client: sync engine, adapters, storage, session
pub mod client;
