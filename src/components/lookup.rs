use tracing::{error, info, warn};

use super::Message;
use crate::database::KeyValueStore;

pub const NO_KEY: &str = "No key provided";

/// Single-key lookup against a key-value cache.
///
/// Never fails: an absent key and a broken connection both produce an empty
/// message, with the cause logged.
#[derive(Debug)]
pub struct RedisLookup<K> {
    store: K,
}

impl<K: KeyValueStore> RedisLookup<K> {
    #[inline]
    pub fn new(store: K) -> Self {
        Self { store }
    }

    #[inline]
    pub async fn get_value(&self, key: &str) -> Message {
        let key = key.trim();
        if key.is_empty() {
            return Message::new(NO_KEY);
        }

        match self.store.get(key).await {
            Ok(Some(value)) => {
                info!("Found value for key: {}", key);
                Message::new(value)
            }
            Ok(None) => {
                warn!("No value found for key: {}", key);
                Message::empty()
            }
            Err(e) => {
                error!("Redis GET failed for key '{}': {}", key, e);
                Message::empty()
            }
        }
    }
}
