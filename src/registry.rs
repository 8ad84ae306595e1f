//! Registry of live client connections
//!
//! Owned by the server and handed to each connection; used for the health
//! report and for draining connections during shutdown.

use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
    time::Duration,
};

use chrono::{DateTime, Utc};
use tokio::sync::{watch, Notify};

#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    pub peer: Option<SocketAddr>,
    pub connected_at: DateTime<Utc>,
}

#[derive(Debug)]
struct RegistryInner {
    connections: Mutex<HashMap<u64, ConnectionInfo>>,
    next_id: AtomicU64,
    drained: Notify,
    sever: watch::Sender<bool>,
}

#[derive(Debug, Clone)]
pub struct ConnectionRegistry {
    inner: Arc<RegistryInner>,
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        let (sever, _) = watch::channel(false);
        Self {
            inner: Arc::new(RegistryInner {
                connections: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(1),
                drained: Notify::new(),
                sever,
            }),
        }
    }

    /// Adds a connection. It stays registered until the returned guard is dropped.
    pub fn register(&self, peer: Option<SocketAddr>) -> ConnectionGuard {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock().insert(
            id,
            ConnectionInfo {
                peer,
                connected_at: Utc::now(),
            },
        );

        ConnectionGuard {
            id,
            registry: self.clone(),
            sever: self.inner.sever.subscribe(),
        }
    }

    pub fn count(&self) -> usize {
        self.lock().len()
    }

    pub fn connection(&self, id: u64) -> Option<ConnectionInfo> {
        self.lock().get(&id).cloned()
    }

    /// Waits until no connection is registered or `grace` elapses. Returns
    /// `true` when the registry drained in time.
    pub async fn wait_drained(&self, grace: Duration) -> bool {
        let drained = async {
            loop {
                let notified = self.inner.drained.notified();
                if self.count() == 0 {
                    return;
                }
                notified.await;
            }
        };

        tokio::time::timeout(grace, drained).await.is_ok()
    }

    /// Tells every open connection to close.
    pub fn sever_all(&self) {
        self.inner.sever.send_replace(true);
    }

    fn deregister(&self, id: u64) {
        let remaining = {
            let mut connections = self.lock();
            connections.remove(&id);
            connections.len()
        };

        if remaining == 0 {
            self.inner.drained.notify_waiters();
        }
    }

    // Entries are plain data, so a poisoned map is still consistent.
    fn lock(&self) -> MutexGuard<'_, HashMap<u64, ConnectionInfo>> {
        self.inner
            .connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Registration of one connection, removed from the registry on drop.
#[derive(Debug)]
pub struct ConnectionGuard {
    id: u64,
    registry: ConnectionRegistry,
    sever: watch::Receiver<bool>,
}

impl ConnectionGuard {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Resolves once the server severs all connections.
    pub async fn severed(&mut self) {
        // A closed channel means the registry is gone; treat that as severed too.
        let _ = self.sever.wait_for(|severed| *severed).await;
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.registry.deregister(self.id);
    }
}
