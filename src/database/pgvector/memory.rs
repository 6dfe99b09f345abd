use async_trait::async_trait;
use serde_json::Map;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

use super::layout::{
    self, DOCUMENT_LAYOUTS, DocumentRow, EMBEDDING_LAYOUTS, EmbeddingRow, Layout, MODEL_LAYOUTS,
    ModelRow, SqlValue,
};
use super::{
    NewVectorDocument, SearchResult, StoredItem, VectorStore, VectorTables, check_batch,
    cosine_distance,
};
use crate::{AdapterError, Result};

pub const FULL_DOCUMENT_COLUMNS: &[&str] = &["id", "source", "content", "metadata", "created_at"];
pub const FULL_EMBEDDING_COLUMNS: &[&str] = &["id", "document_id", "model_id", "embedding"];
pub const FULL_MODEL_COLUMNS: &[&str] = &["id", "name", "dimension", "notes"];

#[derive(Debug, Clone)]
struct MemoryRow {
    id: i64,
    values: HashMap<String, SqlValue>,
}

impl MemoryRow {
    fn get(&self, column: &str) -> Option<&SqlValue> {
        self.values.get(column)
    }
}

#[derive(Debug, Clone)]
struct MemoryTable {
    name: String,
    columns: Vec<String>,
    rows: Vec<MemoryRow>,
    next_id: i64,
}

impl MemoryTable {
    fn new(name: &str, columns: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            columns: columns.iter().map(|c| (*c).to_string()).collect(),
            rows: Vec::new(),
            next_id: 0,
        }
    }

    fn has_columns(&self, layout: &Layout) -> bool {
        layout
            .columns
            .iter()
            .all(|column| self.columns.iter().any(|c| c == column))
    }

    /// Same walk as the PostgreSQL backend: a layout naming a missing column
    /// is skipped, the first one that fits is used.
    fn insert<F>(&mut self, layouts: &[Layout], value: F) -> Result<i64>
    where
        F: Fn(&str) -> Option<SqlValue>,
    {
        for layout in layouts {
            if !self.has_columns(layout) {
                debug!("Layout ({}) rejected by {}", layout.describe(), self.name);
                continue;
            }

            let values = layout::row_values(&self.name, layout, &value)?;
            self.next_id += 1;
            self.rows.push(MemoryRow {
                id: self.next_id,
                values: layout
                    .columns
                    .iter()
                    .map(|c| (*c).to_string())
                    .zip(values)
                    .collect(),
            });
            return Ok(self.next_id);
        }

        Err(layout::exhausted(&self.name, layouts))
    }
}

#[derive(Debug, Clone)]
struct State {
    documents: MemoryTable,
    embeddings: MemoryTable,
    models: MemoryTable,
    /// Another writer creates the next missing model between lookup and insert
    concurrent_model_writer: bool,
}

impl State {
    fn find_model(&self, name: &str) -> Option<i64> {
        self.models
            .rows
            .iter()
            .find(|row| row.get("name").and_then(SqlValue::as_text) == Some(name))
            .map(|row| row.id)
    }

    fn ensure_model(&mut self, dimension: u32) -> Result<i64> {
        let name = layout::model_name(dimension);
        if let Some(id) = self.find_model(&name) {
            return Ok(id);
        }

        let row = ModelRow { dimension };
        if self.concurrent_model_writer {
            self.concurrent_model_writer = false;
            self.models.insert(&MODEL_LAYOUTS, |c| row.value(c))?;

            // Our own insert now hits the unique name, so re-read like PostgreSQL does
            debug!("Model '{}' created concurrently, re-reading", name);
            return self.find_model(&name).ok_or_else(|| {
                AdapterError::Database(format!(
                    "Model '{}' missing after concurrent insert",
                    name
                ))
            });
        }

        self.models.insert(&MODEL_LAYOUTS, |c| row.value(c))
    }
}

/// In-memory vector store with configurable column sets, used to exercise
/// layout fallback and rollback without a database.
#[derive(Debug)]
pub struct MemoryVectorStore {
    source_name: String,
    tables: VectorTables,
    state: Mutex<State>,
    missing_tables: Vec<String>,
    embedding_insert_limit: Option<usize>,
}

impl MemoryVectorStore {
    #[inline]
    pub fn new(tables: VectorTables, source_name: impl Into<String>) -> Self {
        let state = State {
            documents: MemoryTable::new(&tables.documents, FULL_DOCUMENT_COLUMNS),
            embeddings: MemoryTable::new(&tables.embeddings, FULL_EMBEDDING_COLUMNS),
            models: MemoryTable::new(&tables.models, FULL_MODEL_COLUMNS),
            concurrent_model_writer: false,
        };

        Self {
            source_name: source_name.into(),
            tables,
            state: Mutex::new(state),
            missing_tables: Vec::new(),
            embedding_insert_limit: None,
        }
    }

    #[inline]
    pub fn with_document_columns(self, columns: &[&str]) -> Self {
        self.replace_columns(|state| &mut state.documents, columns)
    }

    #[inline]
    pub fn with_embedding_columns(self, columns: &[&str]) -> Self {
        self.replace_columns(|state| &mut state.embeddings, columns)
    }

    #[inline]
    pub fn with_model_columns(self, columns: &[&str]) -> Self {
        self.replace_columns(|state| &mut state.models, columns)
    }

    /// Make schema validation fail as if `table` did not exist
    #[inline]
    pub fn with_missing_table(mut self, table: impl Into<String>) -> Self {
        self.missing_tables.push(table.into());
        self
    }

    /// Fail every embedding insert after the first `limit` of a batch with a
    /// non-schema error
    #[inline]
    pub fn failing_embeddings_after(mut self, limit: usize) -> Self {
        self.embedding_insert_limit = Some(limit);
        self
    }

    /// Let another writer create the model record right before this store's
    /// own insert, so the insert reports a unique-name conflict
    #[inline]
    pub fn with_concurrent_model_insert(mut self) -> Self {
        if let Ok(state) = self.state.get_mut() {
            state.concurrent_model_writer = true;
        }
        self
    }

    fn replace_columns(
        mut self,
        table: impl FnOnce(&mut State) -> &mut MemoryTable,
        columns: &[&str],
    ) -> Self {
        if let Ok(state) = self.state.get_mut() {
            table(state).columns = columns.iter().map(|c| (*c).to_string()).collect();
        }
        self
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| AdapterError::Database("Vector store lock poisoned".to_string()))
    }

    #[inline]
    pub fn document_count(&self) -> usize {
        self.lock().map(|s| s.documents.rows.len()).unwrap_or(0)
    }

    #[inline]
    pub fn model_count(&self) -> usize {
        self.lock().map(|s| s.models.rows.len()).unwrap_or(0)
    }

    /// Column names written for the document with `id`, sorted
    #[inline]
    pub fn document_columns(&self, id: i64) -> Option<Vec<String>> {
        let state = self.lock().ok()?;
        let row = state.documents.rows.iter().find(|row| row.id == id)?;
        let mut columns: Vec<String> = row.values.keys().cloned().collect();
        columns.sort();
        Some(columns)
    }

    /// Column names written for the embedding of document `id`, sorted
    #[inline]
    pub fn embedding_columns(&self, document_id: i64) -> Option<Vec<String>> {
        let state = self.lock().ok()?;
        let row = state.embeddings.rows.iter().find(|row| {
            row.get("document_id").and_then(SqlValue::as_i64) == Some(document_id)
        })?;
        let mut columns: Vec<String> = row.values.keys().cloned().collect();
        columns.sort();
        Some(columns)
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    fn tables(&self) -> &VectorTables {
        &self.tables
    }

    async fn validate_schema(&self) -> Result<()> {
        if let Some(missing) = self
            .tables
            .all()
            .into_iter()
            .find(|t| self.missing_tables.iter().any(|m| m == t))
        {
            return Err(AdapterError::Database(format!(
                "Schema validation failed. Tables not found: {}. Error: relation \"{}\" does not exist",
                self.tables.all().join(", "),
                missing
            )));
        }
        Ok(())
    }

    async fn ensure_model(&self, dimension: u32) -> Result<i64> {
        self.lock()?.ensure_model(dimension)
    }

    async fn add_documents(
        &self,
        documents: &[NewVectorDocument],
        embeddings: &[Vec<f32>],
        dimension: u32,
    ) -> Result<Vec<i64>> {
        check_batch(documents, embeddings, dimension)?;
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let mut state = self.lock()?;
        // Work on a copy so a failure part-way leaves nothing behind
        let mut working = state.clone();

        let model_id = working.ensure_model(dimension)?;
        let mut ids = Vec::with_capacity(documents.len());

        for (index, (document, embedding)) in documents.iter().zip(embeddings).enumerate() {
            let row = DocumentRow {
                source: &self.source_name,
                content: &document.content,
                metadata: &document.metadata,
            };
            let document_id = working.documents.insert(&DOCUMENT_LAYOUTS, |c| row.value(c))?;

            if self.embedding_insert_limit.is_some_and(|limit| index >= limit) {
                return Err(AdapterError::Database(format!(
                    "Failed to insert embedding: simulated failure for document {}",
                    document_id
                )));
            }

            let row = EmbeddingRow {
                document_id,
                model_id,
                embedding,
            };
            working
                .embeddings
                .insert(&EMBEDDING_LAYOUTS, |c| row.value(c))?;
            ids.push(document_id);
        }

        *state = working;
        Ok(ids)
    }

    async fn count_embeddings(&self) -> Result<i64> {
        let count = self.lock()?.embeddings.rows.len();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }

    async fn nearest(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let state = self.lock()?;
        let mut results: Vec<SearchResult> = state
            .embeddings
            .rows
            .iter()
            .filter_map(|embedding| {
                let document_id = embedding.get("document_id")?.as_i64()?;
                let vector = embedding.get("embedding")?.as_vector()?;
                let document = state.documents.rows.iter().find(|d| d.id == document_id)?;

                Some(SearchResult {
                    content: document
                        .get("content")
                        .and_then(SqlValue::as_text)
                        .unwrap_or_default()
                        .to_string(),
                    metadata: document
                        .get("metadata")
                        .and_then(SqlValue::as_object)
                        .cloned()
                        .unwrap_or_default(),
                    distance: cosine_distance(vector, query),
                })
            })
            .collect();

        results.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        results.truncate(k);
        Ok(results)
    }

    async fn list_documents(&self, limit: usize) -> Result<Vec<StoredItem>> {
        let state = self.lock()?;
        Ok(state
            .documents
            .rows
            .iter()
            .take(limit)
            .map(|row| StoredItem {
                id: row.id,
                content: row
                    .get("content")
                    .and_then(SqlValue::as_text)
                    .unwrap_or_default()
                    .to_string(),
                metadata: row
                    .get("metadata")
                    .and_then(SqlValue::as_object)
                    .cloned()
                    .unwrap_or_else(Map::new),
            })
            .collect())
    }
}
