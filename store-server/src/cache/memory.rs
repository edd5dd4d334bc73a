//! In-process cache backend
//!
//! Single-mutex keyspace with lazy TTL expiry. Implements the same
//! contract as the Redis backend, including the atomic
//! check-and-decrement (the mutex plays the role of the script's
//! single-threaded execution). Used by the test suite and for running
//! the server without a Redis instance.

use async_trait::async_trait;
use parking_lot::Mutex;
use shared::{AppError, AppResult};
use std::collections::{HashMap, HashSet, VecDeque};
use std::time::{Duration, Instant};

use super::CacheStore;

#[derive(Debug, Clone)]
enum Value {
    Str(String),
    Hash(HashMap<String, String>),
    List(VecDeque<String>),
    Set(HashSet<String>),
    ZSet(HashMap<String, f64>),
}

impl Value {
    fn kind(&self) -> &'static str {
        match self {
            Value::Str(_) => "string",
            Value::Hash(_) => "hash",
            Value::List(_) => "list",
            Value::Set(_) => "set",
            Value::ZSet(_) => "zset",
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn new(value: Value) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    fn expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

fn wrong_type(key: &str, found: &Entry) -> AppError {
    AppError::cache(format!(
        "wrong value type for key {key}: found {}",
        found.value.kind()
    ))
}

fn not_numeric(key: &str) -> AppError {
    AppError::cache(format!("value at key {key} is not numeric"))
}

/// Embedded cache backend
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

type Entries = HashMap<String, Entry>;

/// Drop the entry if its TTL has passed, then return it
fn live<'a>(entries: &'a mut Entries, key: &str) -> Option<&'a mut Entry> {
    if entries.get(key).is_some_and(Entry::expired) {
        entries.remove(key);
    }
    entries.get_mut(key)
}

fn hash_mut<'a>(entries: &'a mut Entries, key: &str) -> AppResult<&'a mut HashMap<String, String>> {
    let entry = entries
        .entry(key.to_string())
        .or_insert_with(|| Entry::new(Value::Hash(HashMap::new())));
    let kind = entry.value.kind();
    match &mut entry.value {
        Value::Hash(map) => Ok(map),
        _ => Err(AppError::cache(format!(
            "wrong value type for key {key}: found {kind}"
        ))),
    }
}

impl MemoryCache {
    fn with_entries<T>(&self, f: impl FnOnce(&mut Entries) -> T) -> T {
        let mut entries = self.entries.lock();
        f(&mut entries)
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        self.with_entries(|entries| match live(entries, key) {
            Some(entry) => match &entry.value {
                Value::Str(s) => Ok(Some(s.clone())),
                _ => Err(wrong_type(key, entry)),
            },
            None => Ok(None),
        })
    }

    async fn set(&self, key: &str, value: &str) -> AppResult<()> {
        self.with_entries(|entries| {
            entries.insert(key.to_string(), Entry::new(Value::Str(value.to_string())));
        });
        Ok(())
    }

    async fn del(&self, key: &str) -> AppResult<()> {
        self.with_entries(|entries| {
            entries.remove(key);
        });
        Ok(())
    }

    async fn expire(&self, key: &str, seconds: i64) -> AppResult<()> {
        self.with_entries(|entries| {
            if seconds <= 0 {
                entries.remove(key);
            } else if let Some(entry) = live(entries, key) {
                entry.expires_at = Some(Instant::now() + Duration::from_secs(seconds as u64));
            }
        });
        Ok(())
    }

    async fn incr_by(&self, key: &str, delta: i64) -> AppResult<i64> {
        self.with_entries(|entries| match live(entries, key) {
            Some(entry) => {
                let current = match &entry.value {
                    Value::Str(s) => s.parse::<i64>().map_err(|_| not_numeric(key))?,
                    _ => return Err(wrong_type(key, entry)),
                };
                let next = current + delta;
                entry.value = Value::Str(next.to_string());
                Ok(next)
            }
            None => {
                entries.insert(key.to_string(), Entry::new(Value::Str(delta.to_string())));
                Ok(delta)
            }
        })
    }

    async fn incr_by_float(&self, key: &str, delta: f64) -> AppResult<f64> {
        self.with_entries(|entries| match live(entries, key) {
            Some(entry) => {
                let current = match &entry.value {
                    Value::Str(s) => s.parse::<f64>().map_err(|_| not_numeric(key))?,
                    _ => return Err(wrong_type(key, entry)),
                };
                let next = current + delta;
                entry.value = Value::Str(format_float(next));
                Ok(next)
            }
            None => {
                entries.insert(
                    key.to_string(),
                    Entry::new(Value::Str(format_float(delta))),
                );
                Ok(delta)
            }
        })
    }

    async fn check_and_decr(&self, key: &str, amount: i64) -> AppResult<i64> {
        self.with_entries(|entries| {
            let Some(entry) = live(entries, key) else {
                return Ok(-1);
            };
            let current = match &entry.value {
                Value::Str(s) => s.parse::<i64>().map_err(|_| not_numeric(key))?,
                _ => return Err(wrong_type(key, entry)),
            };
            if current < amount {
                return Ok(-2);
            }
            let next = current - amount;
            entry.value = Value::Str(next.to_string());
            Ok(next)
        })
    }

    async fn hget(&self, key: &str, field: &str) -> AppResult<Option<String>> {
        self.with_entries(|entries| match live(entries, key) {
            Some(entry) => match &entry.value {
                Value::Hash(map) => Ok(map.get(field).cloned()),
                _ => Err(wrong_type(key, entry)),
            },
            None => Ok(None),
        })
    }

    async fn hset(&self, key: &str, field: &str, value: &str) -> AppResult<()> {
        self.with_entries(|entries| {
            live(entries, key);
            let map = hash_mut(entries, key)?;
            map.insert(field.to_string(), value.to_string());
            Ok(())
        })
    }

    async fn hget_all(&self, key: &str) -> AppResult<HashMap<String, String>> {
        self.with_entries(|entries| match live(entries, key) {
            Some(entry) => match &entry.value {
                Value::Hash(map) => Ok(map.clone()),
                _ => Err(wrong_type(key, entry)),
            },
            None => Ok(HashMap::new()),
        })
    }

    async fn hdel(&self, key: &str, fields: &[&str]) -> AppResult<()> {
        self.with_entries(|entries| {
            let now_empty = match live(entries, key) {
                Some(entry) => match &mut entry.value {
                    Value::Hash(map) => {
                        for field in fields {
                            map.remove(*field);
                        }
                        map.is_empty()
                    }
                    _ => return Err(wrong_type(key, entry)),
                },
                None => return Ok(()),
            };
            if now_empty {
                entries.remove(key);
            }
            Ok(())
        })
    }

    async fn hincr_by(&self, key: &str, field: &str, delta: i64) -> AppResult<i64> {
        self.with_entries(|entries| {
            live(entries, key);
            let map = hash_mut(entries, key)?;
            let current = match map.get(field) {
                Some(s) => s.parse::<i64>().map_err(|_| not_numeric(key))?,
                None => 0,
            };
            let next = current + delta;
            map.insert(field.to_string(), next.to_string());
            Ok(next)
        })
    }

    async fn hincr_by_float(&self, key: &str, field: &str, delta: f64) -> AppResult<f64> {
        self.with_entries(|entries| {
            live(entries, key);
            let map = hash_mut(entries, key)?;
            let current = match map.get(field) {
                Some(s) => s.parse::<f64>().map_err(|_| not_numeric(key))?,
                None => 0.0,
            };
            let next = current + delta;
            map.insert(field.to_string(), format_float(next));
            Ok(next)
        })
    }

    async fn lpush(&self, key: &str, value: &str) -> AppResult<i64> {
        self.with_entries(|entries| {
            live(entries, key);
            let entry = entries
                .entry(key.to_string())
                .or_insert_with(|| Entry::new(Value::List(VecDeque::new())));
            match &mut entry.value {
                Value::List(list) => {
                    list.push_front(value.to_string());
                    Ok(list.len() as i64)
                }
                _ => Err(wrong_type(key, entry)),
            }
        })
    }

    async fn rpop(&self, key: &str) -> AppResult<Option<String>> {
        self.with_entries(|entries| {
            let (popped, now_empty) = match live(entries, key) {
                Some(entry) => match &mut entry.value {
                    Value::List(list) => {
                        let popped = list.pop_back();
                        (popped, list.is_empty())
                    }
                    _ => return Err(wrong_type(key, entry)),
                },
                None => return Ok(None),
            };
            if now_empty {
                entries.remove(key);
            }
            Ok(popped)
        })
    }

    async fn llen(&self, key: &str) -> AppResult<i64> {
        self.with_entries(|entries| match live(entries, key) {
            Some(entry) => match &entry.value {
                Value::List(list) => Ok(list.len() as i64),
                _ => Err(wrong_type(key, entry)),
            },
            None => Ok(0),
        })
    }

    async fn sadd(&self, key: &str, member: &str) -> AppResult<()> {
        self.with_entries(|entries| {
            live(entries, key);
            let entry = entries
                .entry(key.to_string())
                .or_insert_with(|| Entry::new(Value::Set(HashSet::new())));
            match &mut entry.value {
                Value::Set(set) => {
                    set.insert(member.to_string());
                    Ok(())
                }
                _ => Err(wrong_type(key, entry)),
            }
        })
    }

    async fn sismember(&self, key: &str, member: &str) -> AppResult<bool> {
        self.with_entries(|entries| match live(entries, key) {
            Some(entry) => match &entry.value {
                Value::Set(set) => Ok(set.contains(member)),
                _ => Err(wrong_type(key, entry)),
            },
            None => Ok(false),
        })
    }

    async fn zincr_by(&self, key: &str, member: &str, delta: f64) -> AppResult<f64> {
        self.with_entries(|entries| {
            live(entries, key);
            let entry = entries
                .entry(key.to_string())
                .or_insert_with(|| Entry::new(Value::ZSet(HashMap::new())));
            match &mut entry.value {
                Value::ZSet(scores) => {
                    let score = scores.entry(member.to_string()).or_insert(0.0);
                    *score += delta;
                    Ok(*score)
                }
                _ => Err(wrong_type(key, entry)),
            }
        })
    }

    async fn zrevrange(&self, key: &str, start: isize, stop: isize) -> AppResult<Vec<String>> {
        self.with_entries(|entries| {
            let Some(entry) = live(entries, key) else {
                return Ok(Vec::new());
            };
            let scores = match &entry.value {
                Value::ZSet(scores) => scores,
                _ => return Err(wrong_type(key, entry)),
            };

            let mut members: Vec<(&String, f64)> =
                scores.iter().map(|(m, s)| (m, *s)).collect();
            // Score descending, ties in reverse lexicographic order (ZREVRANGE)
            members.sort_by(|a, b| {
                b.1.partial_cmp(&a.1)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| b.0.cmp(a.0))
            });

            let len = members.len() as isize;
            let resolve = |idx: isize| -> isize {
                if idx < 0 { len + idx } else { idx }
            };
            let from = resolve(start).max(0);
            let to = resolve(stop).min(len - 1);
            if from > to || len == 0 {
                return Ok(Vec::new());
            }

            Ok(members[from as usize..=(to as usize)]
                .iter()
                .map(|(m, _)| (*m).clone())
                .collect())
        })
    }
}

/// Match Redis INCRBYFLOAT formatting: no trailing zeros, no exponent
fn format_float(value: f64) -> String {
    let formatted = format!("{value:.17}");
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}
