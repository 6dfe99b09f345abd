//! Chat transcript storage keyed by session id.
//!
//! The Redis layout follows the common `message_store:<session>` list
//! convention: each entry is a JSON object `{"type": "human"|"ai",
//! "data": {"content": ...}}`, new entries are pushed to the head, and reads
//! reverse the list so callers always see chronological order.

#[cfg(test)]
mod tests;

use async_trait::async_trait;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::{debug, warn};

use crate::config::RedisConfig;
use crate::{AdapterError, Result};

pub const KEY_PREFIX: &str = "message_store:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sender {
    #[serde(rename = "human")]
    User,
    #[serde(rename = "ai")]
    Ai,
}

impl Sender {
    #[inline]
    pub fn label(self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Ai => "AI",
        }
    }
}

impl std::fmt::Display for Sender {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub sender: Sender,
    pub content: String,
}

impl ChatMessage {
    #[inline]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            content: content.into(),
        }
    }

    #[inline]
    pub fn ai(content: impl Into<String>) -> Self {
        Self {
            sender: Sender::Ai,
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry {
    #[serde(rename = "type")]
    sender: Sender,
    data: StoredEntryData,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredEntryData {
    content: String,
}

#[inline]
pub fn session_key(session_id: &str) -> String {
    format!("{}{}", KEY_PREFIX, session_id)
}

fn encode_entry(message: &ChatMessage) -> Result<String> {
    serde_json::to_string(&StoredEntry {
        sender: message.sender,
        data: StoredEntryData {
            content: message.content.clone(),
        },
    })
    .map_err(|e| AdapterError::MalformedInput(format!("Failed to encode chat message: {}", e)))
}

fn decode_entry(raw: &str) -> Option<ChatMessage> {
    match serde_json::from_str::<StoredEntry>(raw) {
        Ok(entry) => Some(ChatMessage {
            sender: entry.sender,
            content: entry.data.content,
        }),
        Err(e) => {
            warn!("Skipping unreadable chat entry: {}", e);
            None
        }
    }
}

/// Ordered, append-only chat history per session.
#[async_trait]
pub trait ChatHistoryStore: Send + Sync {
    async fn append(&self, session_id: &str, message: &ChatMessage) -> Result<()>;

    /// Full history in chronological order
    async fn history(&self, session_id: &str) -> Result<Vec<ChatMessage>>;
}

#[derive(Debug, Clone)]
pub struct RedisChatHistory {
    client: redis::Client,
}

impl RedisChatHistory {
    #[inline]
    pub fn new(config: &RedisConfig) -> Result<Self> {
        let url = config
            .redis_url()
            .map_err(|e| AdapterError::Config(e.to_string()))?;
        let client = redis::Client::open(url.as_str())
            .map_err(|e| AdapterError::Connection(format!("Invalid Redis URL: {}", e)))?;
        Ok(Self { client })
    }

    async fn connect(&self) -> Result<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AdapterError::Connection(format!("Redis connection failed: {}", e)))
    }
}

#[async_trait]
impl ChatHistoryStore for RedisChatHistory {
    async fn append(&self, session_id: &str, message: &ChatMessage) -> Result<()> {
        let entry = encode_entry(message)?;
        let mut connection = self.connect().await?;

        let _: i64 = connection
            .lpush(session_key(session_id), entry)
            .await
            .map_err(|e| AdapterError::Database(format!("Redis LPUSH failed: {}", e)))?;

        debug!("Appended {} message to session '{}'", message.sender, session_id);
        Ok(())
    }

    async fn history(&self, session_id: &str) -> Result<Vec<ChatMessage>> {
        let mut connection = self.connect().await?;

        let raw: Vec<String> = connection
            .lrange(session_key(session_id), 0, -1)
            .await
            .map_err(|e| AdapterError::Database(format!("Redis LRANGE failed: {}", e)))?;

        Ok(raw.iter().rev().filter_map(|entry| decode_entry(entry)).collect())
    }
}

/// In-memory backend storing the same encoded entries as Redis
#[derive(Debug, Default)]
pub struct MemoryChatHistory {
    sessions: RwLock<HashMap<String, Vec<String>>>,
}

impl MemoryChatHistory {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Push an already-encoded entry, as another client might have written it
    #[inline]
    pub fn push_raw(&self, session_id: &str, raw: impl Into<String>) -> Result<()> {
        self.sessions
            .write()
            .map_err(|_| AdapterError::Database("Chat store lock poisoned".to_string()))?
            .entry(session_key(session_id))
            .or_default()
            .push(raw.into());
        Ok(())
    }
}

#[async_trait]
impl ChatHistoryStore for MemoryChatHistory {
    async fn append(&self, session_id: &str, message: &ChatMessage) -> Result<()> {
        let entry = encode_entry(message)?;
        self.push_raw(session_id, entry)
    }

    async fn history(&self, session_id: &str) -> Result<Vec<ChatMessage>> {
        let sessions = self
            .sessions
            .read()
            .map_err(|_| AdapterError::Database("Chat store lock poisoned".to_string()))?;

        Ok(sessions
            .get(&session_key(session_id))
            .map(|entries| entries.iter().filter_map(|e| decode_entry(e)).collect())
            .unwrap_or_default())
    }
}
