use crate::error::{LoadBalancerError, Result};
use crate::lb::{IpHash, LeastConnections, LeastResponseTime, RoundRobin, WeightedRoundRobin};
use crate::server::{ServerPool, SharedServer};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Picks one server of its pool per request.
///
/// Selection is synchronous and never blocks on I/O. Stateful strategies
/// advance their cursor on every call, so identical conditions may yield
/// different servers.
pub trait SelectionStrategy: Send + Sync {
    /// `request_key` identifies the client. Only key-affine strategies read it.
    fn select(&self, request_key: Option<&str>) -> Result<&SharedServer>;

    fn kind(&self) -> StrategyKind;

    fn pool(&self) -> &ServerPool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    RoundRobin,
    WeightedRoundRobin,
    LeastConnections,
    LeastResponseTime,
    IpHash,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 5] = [
        StrategyKind::RoundRobin,
        StrategyKind::WeightedRoundRobin,
        StrategyKind::LeastConnections,
        StrategyKind::LeastResponseTime,
        StrategyKind::IpHash,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::RoundRobin => "round_robin",
            StrategyKind::WeightedRoundRobin => "weighted_round_robin",
            StrategyKind::LeastConnections => "least_connections",
            StrategyKind::LeastResponseTime => "least_response_time",
            StrategyKind::IpHash => "ip_hash",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = LoadBalancerError;

    fn from_str(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == name)
            .ok_or_else(|| LoadBalancerError::UnknownStrategy(name.to_string()))
    }
}

/// Builds the strategy of the given kind over `pool`.
pub fn create_strategy(kind: StrategyKind, pool: ServerPool) -> Result<Box<dyn SelectionStrategy>> {
    Ok(match kind {
        StrategyKind::RoundRobin => Box::new(RoundRobin::new(pool)?),
        StrategyKind::WeightedRoundRobin => Box::new(WeightedRoundRobin::new(pool)?),
        StrategyKind::LeastConnections => Box::new(LeastConnections::new(pool)?),
        StrategyKind::LeastResponseTime => Box::new(LeastResponseTime::new(pool)?),
        StrategyKind::IpHash => Box::new(IpHash::new(pool)?),
    })
}
