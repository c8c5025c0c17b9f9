//! Smooth weighted round robin.
//!
//! Servers are visited in pool order while a moving weight threshold steps
//! down from the maximum weight by the GCD of all weights, once per pass over
//! the pool. A server is picked whenever its weight reaches the threshold, so
//! over a full cycle each server is chosen in proportion to its weight and
//! heavy servers are spread across the cycle instead of being served in a
//! single burst. With weights 1, 2 and 3 for A, B and C one cycle is
//! `[C, B, C, A, B, C]`.

use super::ensure_non_empty;
use crate::error::{LoadBalancerError, Result};
use crate::server::{ServerPool, SharedServer};
use crate::strategy::{SelectionStrategy, StrategyKind};
use parking_lot::Mutex;
use tracing::{debug, warn};

#[derive(Debug)]
struct Cursor {
    index: usize,
    current_weight: i64,
}

pub struct WeightedRoundRobin {
    pool: ServerPool,
    /// GCD over every weight in the pool. Zero only when all weights are zero.
    gcd: u32,
    max_weight: u32,
    cursor: Mutex<Cursor>,
}

impl WeightedRoundRobin {
    pub fn new(pool: ServerPool) -> Result<Self> {
        ensure_non_empty(&pool)?;

        let gcd = pool.weights().fold(0, gcd);
        let max_weight = pool.weights().max().unwrap_or(0);
        if max_weight == 0 {
            warn!(
                servers = pool.len(),
                "all server weights are zero, weighted round robin will always pick the first server"
            );
        }

        // Parked on the last slot so the first advance lands on index 0.
        let cursor = Cursor {
            index: pool.len() - 1,
            current_weight: 0,
        };

        Ok(Self {
            pool,
            gcd,
            max_weight,
            cursor: Mutex::new(cursor),
        })
    }

    fn next_index(&self) -> usize {
        let len = self.pool.len();
        // An all-zero pool would otherwise accept every slot at threshold 0.
        if len == 1 || self.max_weight == 0 {
            return 0;
        }

        let mut cursor = self.cursor.lock();
        loop {
            cursor.index = (cursor.index + 1) % len;
            if cursor.index == 0 {
                cursor.current_weight -= i64::from(self.gcd);
                if cursor.current_weight <= 0 {
                    cursor.current_weight = i64::from(self.max_weight);
                }
            }
            if i64::from(self.pool[cursor.index].weight) >= cursor.current_weight {
                return cursor.index;
            }
        }
    }
}

fn gcd(a: u32, b: u32) -> u32 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

impl SelectionStrategy for WeightedRoundRobin {
    fn select(&self, _request_key: Option<&str>) -> Result<&SharedServer> {
        if self.pool.is_empty() {
            return Err(LoadBalancerError::EmptyPool);
        }

        let server = &self.pool[self.next_index()];
        debug!(
            strategy = "weighted_round_robin",
            address = %server.address,
            weight = server.weight,
            "selected server"
        );
        Ok(server)
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::WeightedRoundRobin
    }

    fn pool(&self) -> &ServerPool {
        &self.pool
    }
}
