//! Backend server records and the shared pool strategies select from.

use std::ops::Deref;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Weight given to servers that don't specify one.
pub const DEFAULT_WEIGHT: u32 = 1;

/// A single backend server. Identity and weight are fixed at construction,
/// the live metrics are written by the caller and only read by strategies.
#[derive(Debug)]
pub struct Server {
    pub address: String,
    pub weight: u32,
    active_connections: AtomicU32,
    /// Nanoseconds, saturating at `u64::MAX`.
    last_response_time: AtomicU64,
}

impl Server {
    pub fn new(address: impl Into<String>) -> Self {
        Self::with_weight(address, DEFAULT_WEIGHT)
    }

    pub fn with_weight(address: impl Into<String>, weight: u32) -> Self {
        Self {
            address: address.into(),
            weight,
            active_connections: AtomicU32::new(0),
            last_response_time: AtomicU64::new(0),
        }
    }

    pub fn get_connections(&self) -> u32 {
        self.active_connections.load(Ordering::Acquire)
    }

    pub fn set_connections(&self, count: u32) {
        self.active_connections.store(count, Ordering::Release);
    }

    pub fn increment_connections(&self) {
        self.active_connections.fetch_add(1, Ordering::AcqRel);
    }

    pub fn decrement_connections(&self) {
        let _ = self
            .active_connections
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                Some(current.saturating_sub(1))
            });
    }

    /// Count a connection against this server until the returned guard is dropped.
    pub fn track_connection(&self) -> ConnectionGuard<'_> {
        self.increment_connections();
        ConnectionGuard { server: self }
    }

    pub fn last_response_time(&self) -> Duration {
        Duration::from_nanos(self.last_response_time.load(Ordering::Acquire))
    }

    pub fn set_response_time(&self, elapsed: Duration) {
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        self.last_response_time.store(nanos, Ordering::Release);
    }
}

/// Decrements the owning server's connection count on drop.
#[derive(Debug)]
pub struct ConnectionGuard<'a> {
    server: &'a Server,
}

impl Drop for ConnectionGuard<'_> {
    fn drop(&mut self) {
        self.server.decrement_connections();
    }
}

/// A thread-safe reference to a Server.
pub type SharedServer = Arc<Server>;

/// Ordered, immutable set of servers. Clones share the same servers, so
/// metric updates made through one clone are seen through all of them.
#[derive(Debug, Clone, Default)]
pub struct ServerPool {
    servers: Arc<Vec<SharedServer>>,
}

impl ServerPool {
    pub fn new(servers: Vec<Server>) -> Self {
        Self::from_shared(servers.into_iter().map(Arc::new).collect())
    }

    pub fn from_shared(servers: Vec<SharedServer>) -> Self {
        Self {
            servers: Arc::new(servers),
        }
    }

    pub fn find(&self, address: &str) -> Option<&SharedServer> {
        self.servers.iter().find(|s| s.address == address)
    }

    /// Weights in pool order.
    pub fn weights(&self) -> impl Iterator<Item = u32> + '_ {
        self.servers.iter().map(|s| s.weight)
    }
}

impl Deref for ServerPool {
    type Target = [SharedServer];

    fn deref(&self) -> &Self::Target {
        &self.servers
    }
}

impl FromIterator<Server> for ServerPool {
    fn from_iter<I: IntoIterator<Item = Server>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
