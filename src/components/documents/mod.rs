
use tracing::{error, info};

use super::Message;
use crate::database::{DocumentStore, NewDocument};
use crate::format;
use crate::intent::{Intent, detect_intent};

pub const EMPTY_INPUT: &str = "Please provide input: JSON to store or text to search";

/// Smart store-or-search over a document collection.
///
/// A JSON object input is stored; any other text is searched for. The last
/// outcome is kept as a status line alongside the detected operation.
#[derive(Debug)]
pub struct SmartDocuments<D> {
    store: D,
    search_limit: i64,
    status: String,
    operation: &'static str,
}

impl<D: DocumentStore> SmartDocuments<D> {
    #[inline]
    pub fn new(store: D, search_limit: i64) -> Self {
        Self {
            store,
            search_limit,
            status: "Ready".to_string(),
            operation: "unknown",
        }
    }

    #[inline]
    pub async fn run(&mut self, input: &str) -> Message {
        let intent = detect_intent(input);
        self.operation = intent.kind();

        match intent {
            Intent::Empty => Message::new(EMPTY_INPUT),
            Intent::Store(payload) => {
                info!("Detected STORE operation");
                match self.store.insert(NewDocument::from_payload(payload)).await {
                    Ok(stored) => {
                        self.status = format!("Document stored with ID: {}", stored.id);
                        Message::new(format::stored_document(&stored))
                    }
                    Err(e) => self.fail(&format!("Error storing document: {}", e)),
                }
            }
            Intent::Search(query) => {
                info!("Detected SEARCH operation: '{}'", query);
                match self.store.search(&query, self.search_limit).await {
                    Ok(results) => {
                        self.status = format!("Found {} documents for '{}'", results.len(), query);
                        Message::new(format::document_results(&results, &query))
                    }
                    Err(e) => self.fail(&format!("Error searching: {}", e)),
                }
            }
        }
    }

    /// Last outcome with the operation that produced it
    #[inline]
    pub fn status(&self) -> Message {
        Message::new(format!("{} (Operation: {})", self.status, self.operation))
    }

    fn fail(&mut self, cause: &str) -> Message {
        error!("{}", cause);
        self.status = cause.to_string();
        Message::new(format!("Smart operation failed: {}", cause))
    }
}
