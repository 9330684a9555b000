//! Client Module
//!
//! The local-first side of Event Log Pro: the roster form model, the
//! background sync engine, the remote adapters, local persistence, crash
//! recovery and the session facade a UI drives.
//!
//! # Module Structure
//!
//! ```text
//! client/
//! ├── main.rs       - eventlog-sync binary
//! ├── config.rs     - environment + saved settings
//! ├── logging.rs    - tracing subscriber setup
//! ├── form.rs       - editable roster form
//! ├── session.rs    - UI facade over form, engine and backend
//! ├── recovery.rs   - startup draft recovery
//! ├── sync/         - scheduler, retry, change detection, network monitor
//! ├── remote/       - RemoteStore trait and adapters
//! └── local_db/     - SQLite key-value slots and BackupStore
//! ```

pub mod config;
pub mod form;
pub mod local_db;
pub mod logging;
pub mod recovery;
pub mod remote;
pub mod session;
pub mod sync;

// Re-export commonly used types
pub use config::Config;
pub use form::{HeaderField, RosterForm};
pub use recovery::{RecoveryDecision, RecoveryOutcome, RecoveryPrompt};
pub use session::EventSession;
pub use sync::{SyncConfig, SyncEngine, SyncHandle, SyncStatus};
