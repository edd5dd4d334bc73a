//! Stock ledger - atomic per-product availability counters
//!
//! Counters live in the cache under `stock:{productId}`. Reservation is a
//! scripted check-and-decrement executed by the cache engine, so
//! concurrent reservations against the same product serialize without an
//! external lock. An absent counter means "no stock", not unlimited
//! stock. Running out is a normal outcome, surfaced to callers as
//! `Ok(false)`; the lifecycle turns it into a validation error.

use crate::cache::{CacheStore, keys};
use shared::{AppError, AppResult};
use std::sync::Arc;

#[derive(Clone)]
pub struct StockLedger {
    cache: Arc<dyn CacheStore>,
    ttl_secs: i64,
}

impl StockLedger {
    pub fn new(cache: Arc<dyn CacheStore>, ttl_secs: i64) -> Self {
        Self { cache, ttl_secs }
    }

    /// Seed or overwrite a product's available quantity
    pub async fn set(&self, product_id: &str, quantity: u32) -> AppResult<()> {
        let key = keys::stock(product_id);
        self.cache.set(&key, &quantity.to_string()).await?;
        self.cache.expire(&key, self.ttl_secs).await?;
        tracing::debug!(product_id = %product_id, quantity, "Stock counter set");
        Ok(())
    }

    /// Current available quantity, `None` when no counter exists
    pub async fn peek(&self, product_id: &str) -> AppResult<Option<u64>> {
        let value = self.cache.get(&keys::stock(product_id)).await?;
        match value {
            Some(raw) => match raw.parse::<u64>() {
                Ok(quantity) => Ok(Some(quantity)),
                Err(_) => {
                    tracing::warn!(product_id = %product_id, raw = %raw, "Unparsable stock counter");
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    /// Atomically check `available >= quantity` and decrement.
    ///
    /// Returns `Ok(false)` without mutation when the counter is missing or
    /// insufficient. `Err` is reserved for cache failures.
    pub async fn reserve(&self, product_id: &str, quantity: u32) -> AppResult<bool> {
        if quantity == 0 {
            tracing::warn!(product_id = %product_id, "Reservation of zero quantity rejected");
            return Ok(false);
        }

        let key = keys::stock(product_id);
        let result = self.cache.check_and_decr(&key, quantity as i64).await?;
        match result {
            -1 => {
                tracing::debug!(product_id = %product_id, "No stock counter, reservation failed");
                Ok(false)
            }
            -2 => {
                tracing::debug!(
                    product_id = %product_id,
                    requested = quantity,
                    "Insufficient stock, reservation failed"
                );
                Ok(false)
            }
            remaining if remaining >= 0 => {
                tracing::debug!(product_id = %product_id, reserved = quantity, remaining, "Stock reserved");
                Ok(true)
            }
            other => Err(AppError::cache(format!(
                "unexpected check-and-decrement result {other} for product {product_id}"
            ))),
        }
    }

    /// Unconditionally return quantity to the counter (rollback, cancel)
    pub async fn restore(&self, product_id: &str, quantity: u32) -> AppResult<()> {
        if quantity == 0 {
            return Ok(());
        }
        self.cache
            .incr_by(&keys::stock(product_id), quantity as i64)
            .await?;
        tracing::info!(product_id = %product_id, quantity, "Stock restored");
        Ok(())
    }
}
