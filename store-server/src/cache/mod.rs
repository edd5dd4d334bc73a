//! Cache layer - hot state store
//!
//! Everything latency-sensitive lives behind [`CacheStore`]: stock
//! counters, cart hashes, order-id sequences, status tallies and the
//! statistics aggregates/queue. Components receive an
//! `Arc<dyn CacheStore>` at construction time; nothing reaches for a
//! global client.
//!
//! Two backends:
//!
//! - [`RedisCache`] - production backend. The stock check-and-decrement
//!   runs as a single Lua script so concurrent reservations against the
//!   same key serialize inside the cache engine.
//! - [`MemoryCache`] - embedded backend with the same semantics
//!   (including TTLs and the atomic check-and-decrement), used by the
//!   test suite and for running without a Redis instance.

pub mod keys;
pub mod memory;
pub mod redis;

use async_trait::async_trait;
use shared::AppResult;
use std::collections::HashMap;

pub use memory::MemoryCache;
pub use self::redis::RedisCache;

/// Key/value cache operations used by the core
///
/// The surface mirrors the Redis commands the system depends on; the
/// in-memory backend implements the same contract.
#[async_trait]
pub trait CacheStore: Send + Sync {
    // ========== Strings / counters ==========

    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> AppResult<()>;

    async fn del(&self, key: &str) -> AppResult<()>;

    /// Set a TTL on an existing key. Non-positive `seconds` deletes the key.
    async fn expire(&self, key: &str, seconds: i64) -> AppResult<()>;

    /// Atomic INCRBY. Missing keys start from zero.
    async fn incr_by(&self, key: &str, delta: i64) -> AppResult<i64>;

    /// Atomic INCRBYFLOAT. Missing keys start from zero.
    async fn incr_by_float(&self, key: &str, delta: f64) -> AppResult<f64>;

    /// Atomic check-and-decrement, executed as one indivisible operation
    /// inside the cache engine.
    ///
    /// Result convention (from the stock script): `-1` when the key is
    /// absent, `-2` when the current value is smaller than `amount`,
    /// otherwise the new value after the decrement. No mutation happens
    /// on the negative outcomes.
    async fn check_and_decr(&self, key: &str, amount: i64) -> AppResult<i64>;

    // ========== Hashes ==========

    async fn hget(&self, key: &str, field: &str) -> AppResult<Option<String>>;

    async fn hset(&self, key: &str, field: &str, value: &str) -> AppResult<()>;

    async fn hget_all(&self, key: &str) -> AppResult<HashMap<String, String>>;

    async fn hdel(&self, key: &str, fields: &[&str]) -> AppResult<()>;

    async fn hincr_by(&self, key: &str, field: &str, delta: i64) -> AppResult<i64>;

    async fn hincr_by_float(&self, key: &str, field: &str, delta: f64) -> AppResult<f64>;

    // ========== Lists (FIFO via push-left / pop-right) ==========

    async fn lpush(&self, key: &str, value: &str) -> AppResult<i64>;

    async fn rpop(&self, key: &str) -> AppResult<Option<String>>;

    async fn llen(&self, key: &str) -> AppResult<i64>;

    // ========== Sets ==========

    async fn sadd(&self, key: &str, member: &str) -> AppResult<()>;

    async fn sismember(&self, key: &str, member: &str) -> AppResult<bool>;

    // ========== Sorted sets ==========

    async fn zincr_by(&self, key: &str, member: &str, delta: f64) -> AppResult<f64>;

    /// Members ordered by score descending, inclusive index range
    async fn zrevrange(&self, key: &str, start: isize, stop: isize) -> AppResult<Vec<String>>;
}
