//! # Network Monitor
//!
//! Connectivity as seen by the sync engine. The host reports changes (or
//! lets [`NetworkMonitor::probe`] find out) and [`NetworkMonitor::attach`]
//! forwards every change to a scheduler.
//!
//! ## Features
//!
//! - **Connectivity Detection**: online/offline reports and an HTTP probe
//! - **Real-time Updates**: watch channel, receivers see only the latest value

use std::fmt;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::client::sync::SyncHandle;

/// Network connectivity status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NetworkStatus {
    Online,
    Offline,
    /// Nothing reported yet
    #[default]
    Unknown,
}

impl NetworkStatus {
    /// Unknown counts as online; writes find out soon enough
    pub fn is_online(self) -> bool {
        !matches!(self, Self::Offline)
    }
}

impl fmt::Display for NetworkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Online => "online",
            Self::Offline => "offline",
            Self::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

#[derive(Debug)]
pub struct NetworkMonitor {
    status: watch::Sender<NetworkStatus>,
}

impl Default for NetworkMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkMonitor {
    pub fn new() -> Self {
        let (status, _) = watch::channel(NetworkStatus::Unknown);
        Self { status }
    }

    /// Record a connectivity change; repeats of the current value are ignored
    pub fn report(&self, online: bool) {
        let next = if online {
            NetworkStatus::Online
        } else {
            NetworkStatus::Offline
        };
        let changed = self.status.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
        if changed {
            tracing::info!("Network is {}", next);
        }
    }

    pub fn get_status(&self) -> NetworkStatus {
        *self.status.borrow()
    }

    pub fn is_online(&self) -> bool {
        self.get_status().is_online()
    }

    pub fn subscribe(&self) -> watch::Receiver<NetworkStatus> {
        self.status.subscribe()
    }

    /// Forward every reported change to `sync` until either side goes away
    pub fn attach(&self, sync: SyncHandle) -> JoinHandle<()> {
        let mut updates = self.subscribe();
        tokio::spawn(async move {
            while updates.changed().await.is_ok() {
                let status = *updates.borrow_and_update();
                if status == NetworkStatus::Unknown {
                    continue;
                }
                if sync.set_online(status.is_online()).is_err() {
                    tracing::debug!("Sync engine gone; network forwarding stopped");
                    break;
                }
            }
        })
    }

    /// Check reachability of `url` and report the result.
    ///
    /// Any HTTP response means online, whatever its status; only a
    /// transport failure counts as offline.
    pub async fn probe(&self, client: &reqwest::Client, url: &str) -> NetworkStatus {
        let online = match client.head(url).send().await {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!("Connectivity probe to {} failed: {}", url, e);
                false
            }
        };
        self.report(online);
        self.get_status()
    }
}
