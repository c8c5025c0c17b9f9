use super::ensure_non_empty;
use crate::error::{LoadBalancerError, Result};
use crate::server::{ServerPool, SharedServer};
use crate::strategy::{SelectionStrategy, StrategyKind};
use tracing::debug;

/// Picks the server whose last request completed fastest. Ties go to the
/// server that comes first in the pool.
pub struct LeastResponseTime {
    pool: ServerPool,
}

impl LeastResponseTime {
    pub fn new(pool: ServerPool) -> Result<Self> {
        ensure_non_empty(&pool)?;
        Ok(Self { pool })
    }
}

impl SelectionStrategy for LeastResponseTime {
    fn select(&self, _request_key: Option<&str>) -> Result<&SharedServer> {
        let server = self
            .pool
            .iter()
            .min_by_key(|s| s.last_response_time())
            .ok_or(LoadBalancerError::EmptyPool)?;

        debug!(
            strategy = "least_response_time",
            address = %server.address,
            response_time = ?server.last_response_time(),
            "selected server"
        );
        Ok(server)
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::LeastResponseTime
    }

    fn pool(&self) -> &ServerPool {
        &self.pool
    }
}
