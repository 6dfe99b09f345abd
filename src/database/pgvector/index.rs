use serde_json::{Map, Value};
use tracing::{debug, info};

use super::{NewVectorDocument, SearchResult, StoredItem, VectorStore};
use crate::embeddings::EmbeddingProvider;
use crate::intent::extract_content;
use crate::{AdapterError, Result};

/// Pairs a [`VectorStore`] with the embedding provider used for both writes
/// and queries.
#[derive(Debug)]
pub struct VectorIndex<S, E> {
    store: S,
    embedder: E,
    dimension: u32,
}

impl<S: VectorStore, E: EmbeddingProvider> VectorIndex<S, E> {
    #[inline]
    pub fn new(store: S, embedder: E, dimension: u32) -> Self {
        Self {
            store,
            embedder,
            dimension,
        }
    }

    #[inline]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[inline]
    pub fn dimension(&self) -> u32 {
        self.dimension
    }

    /// Embed and store documents in one transaction, returning their ids
    #[inline]
    pub async fn add(&self, documents: &[NewVectorDocument]) -> Result<Vec<i64>> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let texts: Vec<String> = documents.iter().map(|d| d.content.clone()).collect();
        let embeddings = self.embedder.embed_documents(&texts)?;
        debug!(
            "Embedded {} documents with {}",
            embeddings.len(),
            self.embedder.model_name()
        );

        self.store
            .add_documents(documents, &embeddings, self.dimension)
            .await
    }

    /// Store a structured payload. The content text is derived from the
    /// payload and the payload itself becomes the metadata.
    #[inline]
    pub async fn store_structured(&self, payload: Map<String, Value>) -> Result<i64> {
        let document = NewVectorDocument::with_metadata(extract_content(&payload), payload);
        let ids = self.add(std::slice::from_ref(&document)).await?;
        let id = ids.first().copied().ok_or_else(|| {
            AdapterError::Database("Store returned no id for document".to_string())
        })?;

        info!(
            "Stored document {} in {}/{}",
            id,
            self.store.tables().documents,
            self.store.tables().embeddings
        );
        Ok(id)
    }

    /// Up to `k` stored documents closest to `query`.
    ///
    /// `k == 0` short-circuits without touching the store. An empty
    /// embeddings table is reported as [`AdapterError::NotPopulated`] rather
    /// than an empty result.
    #[inline]
    pub async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<SearchResult>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let count = self.store.count_embeddings().await?;
        if count == 0 {
            return Err(AdapterError::NotPopulated {
                table: self.store.tables().embeddings.clone(),
            });
        }

        let vector = self.embedder.embed_query(query)?;
        if vector.len() != self.dimension as usize {
            return Err(AdapterError::MalformedInput(format!(
                "Query embedding has {} dimensions, expected {}",
                vector.len(),
                self.dimension
            )));
        }

        let results = self.store.nearest(&vector, k).await?;
        debug!(
            "Found {} results for query '{}' among {} embeddings",
            results.len(),
            query,
            count
        );
        Ok(results)
    }

    #[inline]
    pub async fn list(&self, limit: usize) -> Result<Vec<StoredItem>> {
        self.store.list_documents(limit).await
    }
}
