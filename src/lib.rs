pub mod config;
pub mod error;
pub mod lb;
pub mod server;
pub mod strategy;

pub use config::Config;
pub use error::{LoadBalancerError, Result};
pub use server::{ConnectionGuard, Server, ServerPool, SharedServer, DEFAULT_WEIGHT};
pub use strategy::{create_strategy, SelectionStrategy, StrategyKind};

use arc_swap::ArcSwap;
use tracing::info;

/// A strategy of a fixed kind over a swappable pool.
///
/// Pool membership never changes under a live strategy: `replace_pool`
/// builds a fresh strategy over the new pool and swaps it in atomically, so
/// in-flight selections finish against the pool they started with.
pub struct LoadBalancer {
    kind: StrategyKind,
    strategy: ArcSwap<Box<dyn SelectionStrategy>>,
}

impl LoadBalancer {
    pub fn new(kind: StrategyKind, pool: ServerPool) -> Result<Self> {
        let strategy = create_strategy(kind, pool)?;
        Ok(Self {
            kind,
            strategy: ArcSwap::from_pointee(strategy),
        })
    }

    pub fn kind(&self) -> StrategyKind {
        self.kind
    }

    pub fn select(&self, request_key: Option<&str>) -> Result<SharedServer> {
        let strategy = self.strategy.load();
        let server = strategy.select(request_key)?;
        Ok(server.clone())
    }

    /// Snapshot of the current pool.
    pub fn servers(&self) -> ServerPool {
        self.strategy.load().pool().clone()
    }

    /// Rebuilds the strategy over `pool`. Cursor state starts over. On error
    /// the previous pool stays in place.
    pub fn replace_pool(&self, pool: ServerPool) -> Result<()> {
        let servers = pool.len();
        let strategy = create_strategy(self.kind, pool)?;
        self.strategy.store(std::sync::Arc::new(strategy));
        info!(strategy = %self.kind, servers, "replaced server pool");
        Ok(())
    }
}
