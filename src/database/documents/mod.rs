
pub mod mongo;

pub use mongo::MongoDocumentStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::RwLock;
use tracing::debug;

use crate::intent::extract_content;
use crate::{AdapterError, Result};

/// Source label written on every document stored by the smart document component
pub const SOURCE_LABEL: &str = "langflow_tis_smart";

/// Fields matched by a document search, in the order they are queried
pub const SEARCH_FIELDS: [&str; 8] = [
    "content",
    "metadata.title",
    "metadata.description",
    "metadata.code",
    "metadata.tags",
    "metadata.language",
    "metadata.category",
    "metadata.type",
];

/// A document that has not been stored yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewDocument {
    pub source: String,
    pub content: String,
    pub metadata: Map<String, Value>,
}

impl NewDocument {
    /// Build a document from a structured payload, deriving its content text
    #[inline]
    pub fn from_payload(payload: Map<String, Value>) -> Self {
        Self {
            source: SOURCE_LABEL.to_string(),
            content: extract_content(&payload),
            metadata: payload,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub source: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub metadata: Map<String, Value>,
    #[serde(rename = "_updated_at")]
    pub updated_at: DateTime<Utc>,
}

impl StoredDocument {
    #[inline]
    pub fn title(&self) -> Option<&str> {
        self.metadata.get("title").and_then(Value::as_str)
    }

    #[inline]
    pub fn language(&self) -> Option<&str> {
        self.metadata.get("language").and_then(Value::as_str)
    }

    /// Tags as strings; a single string tag is treated as a one-element list
    #[inline]
    pub fn tags(&self) -> Vec<String> {
        match self.metadata.get("tags") {
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
            Some(Value::String(s)) if !s.is_empty() => vec![s.clone()],
            _ => Vec::new(),
        }
    }
}

/// Insert-or-search access to a document collection.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert(&self, document: NewDocument) -> Result<StoredDocument>;

    /// Case-insensitive match of `query` as a literal against [`SEARCH_FIELDS`],
    /// newest first, at most `limit` results
    async fn search(&self, query: &str, limit: i64) -> Result<Vec<StoredDocument>>;
}

fn value_contains(value: &Value, needle: &str) -> bool {
    match value {
        Value::String(s) => s.to_lowercase().contains(needle),
        Value::Array(items) => items.iter().any(|item| value_contains(item, needle)),
        _ => false,
    }
}

/// Whether any searchable field of `document` contains `query`, ignoring case
#[inline]
pub fn document_matches(document: &StoredDocument, query: &str) -> bool {
    let needle = query.to_lowercase();
    if document.content.to_lowercase().contains(&needle) {
        return true;
    }

    SEARCH_FIELDS
        .iter()
        .filter_map(|field| field.strip_prefix("metadata."))
        .filter_map(|key| document.metadata.get(key))
        .any(|value| value_contains(value, &needle))
}

/// In-memory collection with the same search semantics as the MongoDB backend
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    documents: RwLock<Vec<StoredDocument>>,
}

impl MemoryDocumentStore {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.documents.read().map(|docs| docs.len()).unwrap_or(0)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert a document with a fixed timestamp
    #[inline]
    pub fn insert_at(
        &self,
        document: NewDocument,
        created_at: DateTime<Utc>,
    ) -> Result<StoredDocument> {
        let mut documents = self
            .documents
            .write()
            .map_err(|_| AdapterError::Database("Document store lock poisoned".to_string()))?;

        let stored = StoredDocument {
            id: uuid::Uuid::new_v4().simple().to_string(),
            source: document.source,
            content: document.content,
            created_at,
            metadata: document.metadata,
            updated_at: created_at,
        };
        documents.push(stored.clone());
        Ok(stored)
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn insert(&self, document: NewDocument) -> Result<StoredDocument> {
        self.insert_at(document, Utc::now())
    }

    async fn search(&self, query: &str, limit: i64) -> Result<Vec<StoredDocument>> {
        let documents = self
            .documents
            .read()
            .map_err(|_| AdapterError::Database("Document store lock poisoned".to_string()))?;

        let mut matches: Vec<StoredDocument> = documents
            .iter()
            .filter(|doc| document_matches(doc, query))
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        // A non-positive limit means no limit, as in MongoDB
        match usize::try_from(limit) {
            Ok(limit) if limit > 0 => matches.truncate(limit),
            _ => {}
        }

        debug!("Memory search '{}' matched {} documents", query, matches.len());
        Ok(matches)
    }
}
