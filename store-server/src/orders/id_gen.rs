//! Order id generator
//!
//! 20-character ids: a 14-digit local timestamp (second precision)
//! followed by a 6-digit zero-padded sequence, e.g.
//! `20260107103000000001`. The sequence comes from an atomic increment on
//! `order:seq:{timestamp}` with a 2-second TTL, so each second's sequence
//! space is independent and self-cleaning.
//!
//! When the cache increment is unavailable the generator falls back to
//! the low 6 digits of the millisecond clock. That trades the uniqueness
//! guarantee for liveness; collisions become possible within a
//! millisecond, which is accepted for a degraded-cache window.

use crate::cache::{CacheStore, keys};
use shared::util;
use std::sync::Arc;

#[derive(Clone)]
pub struct OrderIdGenerator {
    cache: Arc<dyn CacheStore>,
}

impl OrderIdGenerator {
    pub fn new(cache: Arc<dyn CacheStore>) -> Self {
        Self { cache }
    }

    /// Generate the next order id
    pub async fn next(&self) -> String {
        let prefix = chrono::Local::now()
            .format(util::COMPACT_DATETIME)
            .to_string();
        let sequence = self.next_sequence(&prefix).await;
        format!("{prefix}{sequence}")
    }

    async fn next_sequence(&self, prefix: &str) -> String {
        let key = keys::order_seq(prefix);
        match self.cache.incr_by(&key, 1).await {
            Ok(sequence) => {
                if let Err(e) = self.cache.expire(&key, keys::ORDER_SEQ_TTL_SECS).await {
                    tracing::warn!(error = %e, "Failed to set TTL on order sequence key");
                }
                format!("{:06}", sequence % 1_000_000)
            }
            Err(e) => {
                tracing::error!(error = %e, "Cache sequence unavailable, falling back to clock");
                Self::fallback_sequence()
            }
        }
    }

    fn fallback_sequence() -> String {
        format!("{:06}", util::now_millis() % 1_000_000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;

    fn generator() -> OrderIdGenerator {
        OrderIdGenerator::new(Arc::new(MemoryCache::new()))
    }

    #[tokio::test]
    async fn id_is_twenty_digits() {
        let id = generator().next().await;
        assert_eq!(id.len(), 20);
        assert!(id.chars().all(|c| c.is_ascii_digit()));
    }

    #[tokio::test]
    async fn sequence_increments_within_a_second() {
        let generator = generator();
        let a = generator.next().await;
        let b = generator.next().await;
        assert_ne!(a, b);
        if a[..14] == b[..14] {
            let seq_a: u64 = a[14..].parse().unwrap();
            let seq_b: u64 = b[14..].parse().unwrap();
            assert_eq!(seq_b, seq_a + 1);
        }
    }

    #[tokio::test]
    async fn ids_are_unique_in_a_burst() {
        let generator = generator();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            assert!(seen.insert(generator.next().await));
        }
    }

    #[test]
    fn fallback_is_six_digits() {
        let sequence = OrderIdGenerator::fallback_sequence();
        assert_eq!(sequence.len(), 6);
        assert!(sequence.chars().all(|c| c.is_ascii_digit()));
    }
}
