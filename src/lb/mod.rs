mod ip_hash;
mod least_conn;
mod least_response_time;
mod round_robin;
mod weighted_round_robin;

pub use ip_hash::{Fnv1aHasher, IpHash};
pub use least_conn::LeastConnections;
pub use least_response_time::LeastResponseTime;
pub use round_robin::RoundRobin;
pub use weighted_round_robin::WeightedRoundRobin;

use crate::error::{LoadBalancerError, Result};
use crate::server::ServerPool;

fn ensure_non_empty(pool: &ServerPool) -> Result<()> {
    if pool.is_empty() {
        return Err(LoadBalancerError::InvalidPool);
    }
    Ok(())
}

#[cfg(test)]
pub(crate) fn weighted_pool(weights: &[u32]) -> ServerPool {
    weights
        .iter()
        .enumerate()
        .map(|(i, &w)| crate::server::Server::with_weight(format!("10.0.0.{}:80", i + 1), w))
        .collect()
}
