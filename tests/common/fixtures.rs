//! Event fixtures and engine setup
//!
//! Records are valid unless the helper says otherwise. Engines run over
//! `MemoryStore` + `MemoryBackup`, so tests may pause tokio time.

use std::sync::Arc;
use std::time::Duration;

use eventlog_pro::client::local_db::MemoryBackup;
use eventlog_pro::client::remote::MemoryStore;
use eventlog_pro::client::sync::{SyncConfig, SyncEngine, SyncHandle};
use eventlog_pro::shared::{EventId, EventRecord, Illness, StudentRecord};

/// Default tunables with the heartbeat off
pub fn quiet_config() -> SyncConfig {
    SyncConfig {
        heartbeat_interval: None,
        ..SyncConfig::default()
    }
}

/// Tunables for tests on real time
pub fn fast_config() -> SyncConfig {
    SyncConfig {
        debounce: Duration::from_millis(20),
        heartbeat_interval: None,
        ..SyncConfig::default()
    }
}

/// Valid trip with two named students
pub fn trip(sequence: u32, name: &str) -> EventRecord {
    EventRecord {
        event_id: EventId::new(2024, sequence),
        event_name: name.to_string(),
        event_date: "2024-05-01".to_string(),
        venue: "City Museum".to_string(),
        accompanying: "Smith, Jones".to_string(),
        students: vec![student("Ana"), student("Ben")],
        ..EventRecord::default()
    }
}

/// Named student with permission granted
pub fn student(name: &str) -> StudentRecord {
    StudentRecord {
        name: name.to_string(),
        form: "7B".to_string(),
        permission: true,
        ..StudentRecord::default()
    }
}

/// Ana with a custom illness, followed by an unnamed row
pub fn roster_with_placeholder() -> Vec<StudentRecord> {
    vec![
        StudentRecord {
            name: "Ana".to_string(),
            illness: Illness::Other,
            other_illness: "Celiac".to_string(),
            ..StudentRecord::default()
        },
        StudentRecord {
            name: String::new(),
            illness: Illness::None,
            ..StudentRecord::default()
        },
    ]
}

/// Running engine over fresh in-memory stores
pub struct TestEngine {
    pub engine: SyncEngine,
    pub sync: SyncHandle,
    pub store: Arc<MemoryStore>,
    pub backup: Arc<MemoryBackup>,
}

impl TestEngine {
    pub fn start(config: SyncConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let backup = Arc::new(MemoryBackup::new());
        let engine = SyncEngine::start(config, Arc::clone(&store), Arc::clone(&backup));
        let sync = engine.handle();
        Self {
            engine,
            sync,
            store,
            backup,
        }
    }

    pub async fn shutdown(self) {
        self.engine.shutdown().await;
    }
}
