//! Slot names and schema migrations for the local key-value store.

/// Slot names in `kv_store`
pub mod keys {
    /// Latest draft, JSON `SyncSnapshot`; one per profile
    pub const BACKUP_LATEST: &str = "backup.latest";
    /// Last record the backend confirmed, JSON `EventRecord`
    pub const CONFIRMED_SNAPSHOT: &str = "sync.confirmed_snapshot";
    /// RFC 3339
    pub const LAST_SYNC_TIME: &str = "sync.last_sync_time";
    pub const IS_AUTHENTICATED: &str = "auth.is_authenticated";
    pub const THEME: &str = "ui.theme";
    pub const API_URL: &str = "settings.api_url";
    pub const SHEET_ID: &str = "settings.sheet_id";
    pub const DOC_ID: &str = "settings.doc_id";
}

/// One forward-only schema step
#[derive(Debug)]
pub struct Migration {
    pub version: i32,
    pub name: &'static str,
    pub sql: &'static str,
}

/// Every migration, in version order
pub const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "kv_store",
    sql: include_str!("schema.sql"),
}];

/// Version of a fully migrated database
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Migrations a database at `current_version` still has to apply
pub fn pending_migrations(current_version: i32) -> impl Iterator<Item = &'static Migration> {
    MIGRATIONS
        .iter()
        .filter(move |migration| migration.version > current_version)
}
