//! Offline feature-hashing embedder.
//!
//! Each lowercase alphanumeric token is hashed into one of `dimension`
//! buckets with a hash-derived sign, and the resulting vector is
//! L2-normalized. Texts sharing vocabulary end up close under cosine
//! distance, which is enough for keyword-flavoured similarity search when
//! no embedding service is available.

#[cfg(test)]
mod tests;

use sha2::{Digest, Sha256};

use super::EmbeddingProvider;
use crate::{AdapterError, Result};

#[derive(Debug, Clone)]
pub struct HashedEmbedder {
    dimension: usize,
    model_name: String,
}

impl HashedEmbedder {
    #[inline]
    pub fn new(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(AdapterError::Config(
                "Hashed embedder dimension must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            dimension,
            model_name: format!("hashed-{}d", dimension),
        })
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    pub fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];

        for token in tokenize(text) {
            let digest = Sha256::digest(token.as_bytes());
            let mut bucket_bytes = [0u8; 8];
            bucket_bytes.copy_from_slice(&digest[..8]);
            let bucket = (u64::from_le_bytes(bucket_bytes) % self.dimension as u64) as usize;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > f32::EPSILON {
            for value in &mut vector {
                *value /= norm;
            }
        }

        vector
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
}

impl EmbeddingProvider for HashedEmbedder {
    #[inline]
    fn model_name(&self) -> &str {
        &self.model_name
    }

    #[inline]
    fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed(text)).collect())
    }

    #[inline]
    fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed(text))
    }
}
