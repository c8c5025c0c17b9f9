use super::ensure_non_empty;
use crate::error::{LoadBalancerError, Result};
use crate::server::{ServerPool, SharedServer};
use crate::strategy::{SelectionStrategy, StrategyKind};
use std::hash::Hasher;
use std::marker::PhantomData;
use tracing::debug;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// 64-bit FNV-1a. Unlike `DefaultHasher` its output is fixed across runs,
/// platforms and toolchains, which keeps client affinity stable.
#[derive(Debug, Clone, Copy)]
pub struct Fnv1aHasher(u64);

impl Default for Fnv1aHasher {
    fn default() -> Self {
        Self(FNV_OFFSET_BASIS)
    }
}

impl Hasher for Fnv1aHasher {
    fn finish(&self) -> u64 {
        self.0
    }

    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.0 ^= u64::from(byte);
            self.0 = self.0.wrapping_mul(FNV_PRIME);
        }
    }
}

/// Maps a client key to a fixed server: `pool[hash(key) % len]`.
///
/// The same key always lands on the same server as long as the pool is
/// unchanged. Any [`Hasher`] + [`Default`] can be plugged in through `H`.
pub struct IpHash<H = Fnv1aHasher> {
    pool: ServerPool,
    _hasher: PhantomData<fn() -> H>,
}

impl IpHash {
    pub fn new(pool: ServerPool) -> Result<Self> {
        Self::with_hasher(pool)
    }
}

impl<H: Hasher + Default> IpHash<H> {
    pub fn with_hasher(pool: ServerPool) -> Result<Self> {
        ensure_non_empty(&pool)?;
        Ok(Self {
            pool,
            _hasher: PhantomData,
        })
    }

    pub fn hash_key(key: &str) -> u64 {
        let mut hasher = H::default();
        hasher.write(key.as_bytes());
        hasher.finish()
    }
}

impl<H: Hasher + Default> SelectionStrategy for IpHash<H> {
    fn select(&self, request_key: Option<&str>) -> Result<&SharedServer> {
        let key = request_key.ok_or(LoadBalancerError::MissingKey)?;
        let len = self.pool.len();
        if len == 0 {
            return Err(LoadBalancerError::EmptyPool);
        }

        // usize -> u64 is lossless on every supported target, and the
        // remainder is below `len`.
        let index = (Self::hash_key(key) % len as u64) as usize;
        let server = &self.pool[index];
        debug!(strategy = "ip_hash", key, address = %server.address, "selected server");
        Ok(server)
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::IpHash
    }

    fn pool(&self) -> &ServerPool {
        &self.pool
    }
}
