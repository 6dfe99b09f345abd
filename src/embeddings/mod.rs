// Embeddings module
// Query and document embedding providers shared by the vector store write and search paths

pub mod hashed;
pub mod ollama;

pub use hashed::HashedEmbedder;
pub use ollama::{DEFAULT_EMBEDDING_DIMENSION, OllamaClient};

use crate::Result;
use crate::config::{Config, EmbeddingProviderKind};

/// Embedding backend used for both stored documents and search queries.
///
/// Writes and searches must go through the same provider, otherwise the
/// distances computed by the vector store are meaningless.
pub trait EmbeddingProvider: Send + Sync {
    /// Model identifier, for logging
    fn model_name(&self) -> &str;

    fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let mut embeddings = self.embed_documents(&[text.to_string()])?;
        embeddings.pop().ok_or_else(|| {
            crate::AdapterError::Embedding("Provider returned no embedding for query".to_string())
        })
    }
}

impl<T: EmbeddingProvider + ?Sized> EmbeddingProvider for Box<T> {
    #[inline]
    fn model_name(&self) -> &str {
        (**self).model_name()
    }

    #[inline]
    fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        (**self).embed_documents(texts)
    }

    #[inline]
    fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        (**self).embed_query(text)
    }
}

/// Build the provider selected in `[embedding]`.
///
/// The hashed provider produces vectors of the configured pgvector dimension
/// so it can be used without any embedding service.
#[inline]
pub fn build_provider(config: &Config) -> Result<Box<dyn EmbeddingProvider>> {
    match config.embedding.provider {
        EmbeddingProviderKind::Ollama => Ok(Box::new(OllamaClient::new(config)?)),
        EmbeddingProviderKind::Hashed => Ok(Box::new(HashedEmbedder::new(
            config.pgvector.embedding_dimension as usize,
        )?)),
    }
}
