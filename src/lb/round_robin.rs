use super::ensure_non_empty;
use crate::error::{LoadBalancerError, Result};
use crate::server::{ServerPool, SharedServer};
use crate::strategy::{SelectionStrategy, StrategyKind};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

/// Cycles through the pool in order, ignoring weights and metrics.
pub struct RoundRobin {
    pool: ServerPool,
    current: AtomicUsize,
}

impl RoundRobin {
    pub fn new(pool: ServerPool) -> Result<Self> {
        ensure_non_empty(&pool)?;
        Ok(Self {
            pool,
            current: AtomicUsize::new(0),
        })
    }
}

impl SelectionStrategy for RoundRobin {
    fn select(&self, _request_key: Option<&str>) -> Result<&SharedServer> {
        let len = self.pool.len();
        if len == 0 {
            return Err(LoadBalancerError::EmptyPool);
        }

        // Cursor stays below `len`, so the cycle survives counter overflow.
        let index = self
            .current
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |c| Some((c + 1) % len))
            .unwrap_or_else(|c| c);

        let server = &self.pool[index];
        debug!(strategy = "round_robin", address = %server.address, "selected server");
        Ok(server)
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::RoundRobin
    }

    fn pool(&self) -> &ServerPool {
        &self.pool
    }
}
