//! Redis-backed cache
//!
//! Uses a multiplexed managed connection; `ConnectionManager` reconnects
//! on failure and is cheap to clone per call. The stock
//! check-and-decrement runs as a Lua script so all reservations for a
//! given key serialize inside Redis without an external lock.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};
use shared::{AppError, AppResult};
use std::collections::HashMap;
use std::sync::Arc;

use super::CacheStore;

/// Atomic check-and-decrement.
///
/// Returns -1 when the key is absent, -2 when the stored value is smaller
/// than the requested amount, otherwise the value after the decrement.
const CHECK_AND_DECR_SCRIPT: &str = r#"
local stock = redis.call('get', KEYS[1])
if not stock then return -1 end
stock = tonumber(stock)
if stock < tonumber(ARGV[1]) then return -2 end
redis.call('decrby', KEYS[1], ARGV[1])
return stock - tonumber(ARGV[1])
"#;

fn cache_err(err: redis::RedisError) -> AppError {
    AppError::cache(err.to_string())
}

/// Production cache backend
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
    reserve_script: Arc<Script>,
}

impl RedisCache {
    /// Connect to Redis and prepare the reservation script
    pub async fn connect(url: &str) -> AppResult<Self> {
        let client = redis::Client::open(url).map_err(cache_err)?;
        let conn = ConnectionManager::new(client).await.map_err(cache_err)?;
        tracing::info!(url = %url, "Redis connection established");
        Ok(Self {
            conn,
            reserve_script: Arc::new(Script::new(CHECK_AND_DECR_SCRIPT)),
        })
    }

    fn conn(&self) -> ConnectionManager {
        self.conn.clone()
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let mut conn = self.conn();
        conn.get(key).await.map_err(cache_err)
    }

    async fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let mut conn = self.conn();
        let _: () = conn.set(key, value).await.map_err(cache_err)?;
        Ok(())
    }

    async fn del(&self, key: &str) -> AppResult<()> {
        let mut conn = self.conn();
        let _: () = conn.del(key).await.map_err(cache_err)?;
        Ok(())
    }

    async fn expire(&self, key: &str, seconds: i64) -> AppResult<()> {
        let mut conn = self.conn();
        if seconds <= 0 {
            let _: () = conn.del(key).await.map_err(cache_err)?;
            return Ok(());
        }
        let _: bool = conn.expire(key, seconds).await.map_err(cache_err)?;
        Ok(())
    }

    async fn incr_by(&self, key: &str, delta: i64) -> AppResult<i64> {
        let mut conn = self.conn();
        conn.incr(key, delta).await.map_err(cache_err)
    }

    async fn incr_by_float(&self, key: &str, delta: f64) -> AppResult<f64> {
        let mut conn = self.conn();
        conn.incr(key, delta).await.map_err(cache_err)
    }

    async fn check_and_decr(&self, key: &str, amount: i64) -> AppResult<i64> {
        let mut conn = self.conn();
        self.reserve_script
            .key(key)
            .arg(amount)
            .invoke_async(&mut conn)
            .await
            .map_err(cache_err)
    }

    async fn hget(&self, key: &str, field: &str) -> AppResult<Option<String>> {
        let mut conn = self.conn();
        conn.hget(key, field).await.map_err(cache_err)
    }

    async fn hset(&self, key: &str, field: &str, value: &str) -> AppResult<()> {
        let mut conn = self.conn();
        let _: () = conn.hset(key, field, value).await.map_err(cache_err)?;
        Ok(())
    }

    async fn hget_all(&self, key: &str) -> AppResult<HashMap<String, String>> {
        let mut conn = self.conn();
        conn.hgetall(key).await.map_err(cache_err)
    }

    async fn hdel(&self, key: &str, fields: &[&str]) -> AppResult<()> {
        if fields.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn();
        let _: () = conn.hdel(key, fields).await.map_err(cache_err)?;
        Ok(())
    }

    async fn hincr_by(&self, key: &str, field: &str, delta: i64) -> AppResult<i64> {
        let mut conn = self.conn();
        conn.hincr(key, field, delta).await.map_err(cache_err)
    }

    async fn hincr_by_float(&self, key: &str, field: &str, delta: f64) -> AppResult<f64> {
        let mut conn = self.conn();
        conn.hincr(key, field, delta).await.map_err(cache_err)
    }

    async fn lpush(&self, key: &str, value: &str) -> AppResult<i64> {
        let mut conn = self.conn();
        conn.lpush(key, value).await.map_err(cache_err)
    }

    async fn rpop(&self, key: &str) -> AppResult<Option<String>> {
        let mut conn = self.conn();
        conn.rpop(key, None).await.map_err(cache_err)
    }

    async fn llen(&self, key: &str) -> AppResult<i64> {
        let mut conn = self.conn();
        conn.llen(key).await.map_err(cache_err)
    }

    async fn sadd(&self, key: &str, member: &str) -> AppResult<()> {
        let mut conn = self.conn();
        let _: i64 = conn.sadd(key, member).await.map_err(cache_err)?;
        Ok(())
    }

    async fn sismember(&self, key: &str, member: &str) -> AppResult<bool> {
        let mut conn = self.conn();
        conn.sismember(key, member).await.map_err(cache_err)
    }

    async fn zincr_by(&self, key: &str, member: &str, delta: f64) -> AppResult<f64> {
        let mut conn = self.conn();
        conn.zincr(key, member, delta).await.map_err(cache_err)
    }

    async fn zrevrange(&self, key: &str, start: isize, stop: isize) -> AppResult<Vec<String>> {
        let mut conn = self.conn();
        conn.zrevrange(key, start, stop).await.map_err(cache_err)
    }
}
