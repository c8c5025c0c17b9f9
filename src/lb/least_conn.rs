use super::ensure_non_empty;
use crate::error::{LoadBalancerError, Result};
use crate::server::{ServerPool, SharedServer};
use crate::strategy::{SelectionStrategy, StrategyKind};
use tracing::debug;

/// Picks the server with the fewest active connections. Ties go to the
/// server that comes first in the pool.
pub struct LeastConnections {
    pool: ServerPool,
}

impl LeastConnections {
    pub fn new(pool: ServerPool) -> Result<Self> {
        ensure_non_empty(&pool)?;
        Ok(Self { pool })
    }
}

impl SelectionStrategy for LeastConnections {
    fn select(&self, _request_key: Option<&str>) -> Result<&SharedServer> {
        // `min_by_key` keeps the first of several equal minima.
        let server = self
            .pool
            .iter()
            .min_by_key(|s| s.get_connections())
            .ok_or(LoadBalancerError::EmptyPool)?;

        debug!(
            strategy = "least_connections",
            address = %server.address,
            connections = server.get_connections(),
            "selected server"
        );
        Ok(server)
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::LeastConnections
    }

    fn pool(&self) -> &ServerPool {
        &self.pool
    }
}
