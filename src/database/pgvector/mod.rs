//! Relational vector storage with schema-tolerant writes.
//!
//! Three user-owned tables are involved: documents, embeddings and embedding
//! models. Their exact column sets vary between deployments, so every insert
//! walks an ordered list of [`layout::Layout`]s and only falls back to the
//! next one when the database reports an undefined column.

#[cfg(test)]
mod tests;

pub mod index;
pub mod layout;
pub mod memory;
pub mod postgres;

pub use index::VectorIndex;
pub use memory::MemoryVectorStore;
pub use postgres::PgVectorStore;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::Result;
use crate::config::PgVectorConfig;

/// Names of the three tables a vector store works against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorTables {
    pub documents: String,
    pub embeddings: String,
    pub models: String,
}

impl VectorTables {
    #[inline]
    pub fn from_config(config: &PgVectorConfig) -> Self {
        Self {
            documents: config.documents_table.clone(),
            embeddings: config.embeddings_table.clone(),
            models: config.models_table.clone(),
        }
    }

    #[inline]
    pub fn all(&self) -> [&str; 3] {
        [&self.documents, &self.embeddings, &self.models]
    }
}

impl Default for VectorTables {
    fn default() -> Self {
        Self::from_config(&PgVectorConfig::default())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewVectorDocument {
    pub content: String,
    pub metadata: Map<String, Value>,
}

impl NewVectorDocument {
    #[inline]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: Map::new(),
        }
    }

    #[inline]
    pub fn with_metadata(content: impl Into<String>, metadata: Map<String, Value>) -> Self {
        Self {
            content: content.into(),
            metadata,
        }
    }
}

/// A row read back from the documents table
#[derive(Debug, Clone, PartialEq)]
pub struct StoredItem {
    pub id: i64,
    pub content: String,
    /// Empty when the table has no metadata column
    pub metadata: Map<String, Value>,
}

/// Nearest-neighbour hit. `distance` is cosine distance, `0.0` meaning identical.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub content: String,
    pub metadata: Map<String, Value>,
    pub distance: f32,
}

/// Storage side of the vector index. Implementations embed nothing
/// themselves; vectors arrive already computed.
#[async_trait]
pub trait VectorStore: Send + Sync {
    fn tables(&self) -> &VectorTables;

    /// Check that every table is reachable
    async fn validate_schema(&self) -> Result<()>;

    /// Id of the model record for `dimension`, creating it if needed
    async fn ensure_model(&self, dimension: u32) -> Result<i64>;

    /// Store documents and their vectors atomically. Returns document ids in
    /// input order. Nothing is persisted if any row fails.
    async fn add_documents(
        &self,
        documents: &[NewVectorDocument],
        embeddings: &[Vec<f32>],
        dimension: u32,
    ) -> Result<Vec<i64>>;

    async fn count_embeddings(&self) -> Result<i64>;

    /// Up to `k` documents ordered by ascending cosine distance to `query`
    async fn nearest(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>>;

    /// First `limit` documents without any ranking
    async fn list_documents(&self, limit: usize) -> Result<Vec<StoredItem>>;
}

/// Reject vector batches that do not line up with their documents or whose
/// vectors have the wrong length.
#[inline]
pub fn check_batch(
    documents: &[NewVectorDocument],
    embeddings: &[Vec<f32>],
    dimension: u32,
) -> Result<()> {
    if documents.len() != embeddings.len() {
        return Err(crate::AdapterError::MalformedInput(format!(
            "Got {} embeddings for {} documents",
            embeddings.len(),
            documents.len()
        )));
    }

    let expected = dimension as usize;
    if let Some(bad) = embeddings.iter().find(|e| e.len() != expected) {
        return Err(crate::AdapterError::MalformedInput(format!(
            "Embedding has {} dimensions, expected {}",
            bad.len(),
            expected
        )));
    }

    Ok(())
}

/// Cosine distance in `[0, 2]`. A zero vector sits at distance `1.0` from any
/// non-zero vector.
#[inline]
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return if norm_a == norm_b { 0.0 } else { 1.0 };
    }

    1.0 - dot / (norm_a * norm_b)
}
