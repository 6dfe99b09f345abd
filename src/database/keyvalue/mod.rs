#[cfg(test)]
mod tests;

use async_trait::async_trait;
use redis::AsyncCommands;
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::debug;

use crate::config::RedisConfig;
use crate::{AdapterError, Result};

/// Single-key lookup against a key-value cache.
///
/// An absent key is `Ok(None)`, not an error.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
}

/// Redis backend. Opens one connection per call and drops it afterwards.
#[derive(Debug, Clone)]
pub struct RedisKeyValue {
    client: redis::Client,
}

impl RedisKeyValue {
    #[inline]
    pub fn new(config: &RedisConfig) -> Result<Self> {
        let url = config
            .redis_url()
            .map_err(|e| AdapterError::Config(e.to_string()))?;
        let client = redis::Client::open(url.as_str())
            .map_err(|e| AdapterError::Connection(format!("Invalid Redis URL: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl KeyValueStore for RedisKeyValue {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut connection = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AdapterError::Connection(format!("Redis connection failed: {}", e)))?;

        debug!("Redis GET {}", key);
        let value: Option<String> = connection
            .get(key)
            .await
            .map_err(|e| AdapterError::Database(format!("Redis GET failed: {}", e)))?;

        Ok(value)
    }
}

/// In-memory backend for tests and offline runs
#[derive(Debug, Default)]
pub struct MemoryKeyValue {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryKeyValue {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: RwLock::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    #[inline]
    pub fn insert(&self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        self.entries
            .write()
            .map_err(|_| AdapterError::Database("Key-value store lock poisoned".to_string()))?
            .insert(key.into(), value.into());
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValue {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| AdapterError::Database("Key-value store lock poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }
}
