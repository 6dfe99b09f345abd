
use serde_json::{Map, Value};
use tracing::{error, info};

use super::{Data, Message};
use crate::database::{NewVectorDocument, SearchResult, StoredItem, VectorIndex, VectorStore};
use crate::embeddings::EmbeddingProvider;
use crate::format;
use crate::intent::{Intent, detect_intent};

/// Vector store node: ingests data payloads, runs similarity searches and
/// lists stored documents when no query is given.
#[derive(Debug)]
pub struct VectorSearch<S, E> {
    index: VectorIndex<S, E>,
    number_of_results: usize,
    status: String,
}

impl<S: VectorStore, E: EmbeddingProvider> VectorSearch<S, E> {
    #[inline]
    pub fn new(index: VectorIndex<S, E>, number_of_results: usize) -> Self {
        Self {
            index,
            number_of_results,
            status: String::new(),
        }
    }

    #[inline]
    pub fn index(&self) -> &VectorIndex<S, E> {
        &self.index
    }

    #[inline]
    pub fn status(&self) -> &str {
        &self.status
    }

    fn tables_label(&self) -> String {
        let tables = self.index.store().tables();
        format!("{}/{}", tables.documents, tables.embeddings)
    }

    /// Store every payload as one document; returns the stored ids. Failures
    /// are recorded in the status and yield no ids.
    #[inline]
    pub async fn ingest(&mut self, inputs: &[Data]) -> Vec<i64> {
        if inputs.is_empty() {
            self.status = format!("Vector store ready: {}", self.tables_label());
            return Vec::new();
        }

        if self.open().await.is_some() {
            return Vec::new();
        }

        let documents: Vec<NewVectorDocument> = inputs
            .iter()
            .map(|input| NewVectorDocument::with_metadata(input.text(), payload_metadata(input)))
            .collect();

        match self.index.add(&documents).await {
            Ok(ids) => {
                self.status = format!("Stored {} documents in {}", ids.len(), self.tables_label());
                info!("{}", self.status);
                ids
            }
            Err(e) => {
                self.status = format!("Vector store build failed: {}", e);
                error!("{}", self.status);
                Vec::new()
            }
        }
    }

    /// Search results as data payloads. A blank query lists the first
    /// documents instead of ranking.
    #[inline]
    pub async fn search_documents(&mut self, query: &str) -> Vec<Data> {
        if self.open().await.is_some() {
            return Vec::new();
        }

        if query.trim().is_empty() {
            return match self.index.list(self.number_of_results).await {
                Ok(items) => {
                    self.status = format!(
                        "Retrieved {} documents (no search query provided)",
                        items.len()
                    );
                    items.iter().map(item_to_data).collect()
                }
                Err(e) => {
                    self.status = format!("Failed to get all documents: {}", e);
                    error!("{}", self.status);
                    Vec::new()
                }
            };
        }

        match self
            .index
            .similarity_search(query, self.number_of_results)
            .await
        {
            Ok(results) => {
                self.status = format!("Found {} results for query: '{}'", results.len(), query);
                results.iter().map(result_to_data).collect()
            }
            Err(e) => {
                self.status = format!("Search failed: {}", e);
                error!("{}", self.status);
                Vec::new()
            }
        }
    }

    /// Text entry point: JSON objects are stored, other text is searched and
    /// blank input lists stored documents
    #[inline]
    pub async fn run(&mut self, input: &str, k: Option<usize>) -> Message {
        if let Some(failure) = self.open().await {
            return failure;
        }

        let k = k.unwrap_or(self.number_of_results);

        match detect_intent(input) {
            Intent::Empty => match self.index.list(self.number_of_results).await {
                Ok(items) => Message::new(format::document_listing(&items)),
                Err(e) => self.fail(&format!("Failed to get all documents: {}", e)),
            },
            Intent::Store(payload) => match self.index.store_structured(payload).await {
                Ok(id) => {
                    let tables = self.index.store().tables();
                    let text = format::vector_stored(id, &tables.documents, &tables.embeddings);
                    self.status = text.clone();
                    Message::new(text)
                }
                Err(e) => self.fail(&format!("Vector store build failed: {}", e)),
            },
            Intent::Search(query) => match self.index.similarity_search(&query, k).await {
                Ok(results) => {
                    self.status = format!("Found {} results for query: '{}'", results.len(), query);
                    Message::new(format::similarity_results(&results, &query))
                }
                Err(e) => self.fail(&format!("Search failed: {}", e)),
            },
        }
    }

    /// Check that the configured tables are reachable. On failure the cause is
    /// recorded in the status and returned as the message to show.
    async fn open(&mut self) -> Option<Message> {
        match self.index.store().validate_schema().await {
            Ok(()) => None,
            Err(e) => Some(self.fail(&format!("Vector store build failed: {}", e))),
        }
    }

    fn fail(&mut self, cause: &str) -> Message {
        error!("{}", cause);
        self.status = cause.to_string();
        Message::new(cause)
    }
}

/// The payload without its `text` field, which becomes the document content
fn payload_metadata(input: &Data) -> Map<String, Value> {
    input
        .data
        .iter()
        .filter(|(key, _)| key.as_str() != "text")
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

fn result_to_data(result: &SearchResult) -> Data {
    let mut data = result.metadata.clone();
    data.insert("text".to_string(), Value::String(result.content.clone()));
    if let Some(distance) = serde_json::Number::from_f64(f64::from(result.distance)) {
        data.insert("distance".to_string(), Value::Number(distance));
    }
    Data::new(data)
}

fn item_to_data(item: &StoredItem) -> Data {
    let mut data = Map::new();
    data.insert("text".to_string(), Value::String(item.content.clone()));
    data.insert("content".to_string(), Value::String(item.content.clone()));
    data.insert("metadata".to_string(), Value::Object(item.metadata.clone()));
    Data::new(data)
}
