use async_trait::async_trait;
use pgvector::Vector;
use serde_json::{Map, Value};
use sqlx::postgres::{PgConnection, PgRow, Postgres};
use sqlx::types::Json;
use sqlx::{Connection, QueryBuilder, Row};
use tracing::{debug, info, warn};

use super::layout::{
    self, DOCUMENT_LAYOUTS, DocumentRow, EMBEDDING_LAYOUTS, EmbeddingRow, Layout, MODEL_LAYOUTS,
    ModelRow, READ_LAYOUTS, SqlValue,
};
use super::{NewVectorDocument, SearchResult, StoredItem, VectorStore, VectorTables, check_batch};
use crate::config::{PgVectorConfig, is_valid_table_name, mask_credentials};
use crate::{AdapterError, Result};

const UNDEFINED_COLUMN: &str = "42703";
const UNIQUE_VIOLATION: &str = "23505";

/// Outcome of a layout walk: the returned id, or the first error that was not
/// a schema mismatch
type Attempt = std::result::Result<Option<i64>, sqlx::Error>;

/// PostgreSQL + pgvector backend.
///
/// Every operation opens its own connection and closes it when done. Writes
/// run in one transaction, with each layout attempt wrapped in a savepoint so
/// a rejected layout leaves the transaction usable.
#[derive(Debug, Clone)]
pub struct PgVectorStore {
    url: String,
    source_name: String,
    tables: VectorTables,
}

impl PgVectorStore {
    #[inline]
    pub fn new(config: &PgVectorConfig) -> Result<Self> {
        let tables = VectorTables::from_config(config);
        if let Some(bad) = tables.all().into_iter().find(|t| !is_valid_table_name(t)) {
            return Err(AdapterError::Config(format!("Invalid table name: {}", bad)));
        }

        Ok(Self {
            url: config.connection_url(),
            source_name: config.source_name.clone(),
            tables,
        })
    }

    async fn connect(&self) -> Result<PgConnection> {
        let connection = PgConnection::connect(&self.url).await.map_err(|e| {
            AdapterError::Connection(format!("PostgreSQL connection failed: {}", e))
        })?;
        debug!("Connected to {}", mask_credentials(&self.url));
        Ok(connection)
    }

    async fn ensure_model_in(&self, conn: &mut PgConnection, dimension: u32) -> Result<i64> {
        let name = layout::model_name(dimension);
        if let Some(id) = select_model(conn, &self.tables.models, &name).await? {
            debug!("Using existing embedding model '{}' ({})", name, id);
            return Ok(id);
        }

        let row = ModelRow { dimension };
        let attempt = insert_with_layouts(conn, &self.tables.models, &MODEL_LAYOUTS, true, |c| {
            row.value(c)
        })
        .await?;

        match attempt {
            Ok(Some(id)) => {
                info!("Created embedding model '{}' with id {}", name, id);
                Ok(id)
            }
            Ok(None) => Err(AdapterError::Database(
                "Model insert returned no id".to_string(),
            )),
            Err(e) if has_code(&e, UNIQUE_VIOLATION) => {
                debug!("Model '{}' created concurrently, re-reading", name);
                select_model(conn, &self.tables.models, &name)
                    .await?
                    .ok_or_else(|| {
                        AdapterError::Database(format!(
                            "Model '{}' missing after concurrent insert",
                            name
                        ))
                    })
            }
            Err(e) => Err(AdapterError::Database(format!(
                "Failed to create embedding model: {}",
                e
            ))),
        }
    }

    async fn add_in_transaction(
        &self,
        conn: &mut PgConnection,
        documents: &[NewVectorDocument],
        embeddings: &[Vec<f32>],
        dimension: u32,
    ) -> Result<Vec<i64>> {
        let mut tx = conn
            .begin()
            .await
            .map_err(db_error("Failed to start transaction"))?;

        let model_id = self.ensure_model_in(&mut tx, dimension).await?;
        let mut ids = Vec::with_capacity(documents.len());

        for (document, embedding) in documents.iter().zip(embeddings) {
            let row = DocumentRow {
                source: &self.source_name,
                content: &document.content,
                metadata: &document.metadata,
            };
            let document_id = match insert_with_layouts(
                &mut tx,
                &self.tables.documents,
                &DOCUMENT_LAYOUTS,
                true,
                |c| row.value(c),
            )
            .await?
            {
                Ok(Some(id)) => id,
                Ok(None) => {
                    return Err(AdapterError::Database(
                        "Document insert returned no id".to_string(),
                    ));
                }
                Err(e) => {
                    return Err(AdapterError::Database(format!(
                        "Failed to insert document: {}",
                        e
                    )));
                }
            };

            let row = EmbeddingRow {
                document_id,
                model_id,
                embedding,
            };
            if let Err(e) = insert_with_layouts(
                &mut tx,
                &self.tables.embeddings,
                &EMBEDDING_LAYOUTS,
                false,
                |c| row.value(c),
            )
            .await?
            {
                return Err(AdapterError::Database(format!(
                    "Failed to insert embedding: {}",
                    e
                )));
            }

            ids.push(document_id);
        }

        tx.commit()
            .await
            .map_err(db_error("Failed to commit transaction"))?;
        Ok(ids)
    }

    async fn nearest_in(
        &self,
        conn: &mut PgConnection,
        query: &[f32],
        k: usize,
    ) -> Result<Vec<SearchResult>> {
        let limit = i64::try_from(k).unwrap_or(i64::MAX);

        for layout in &READ_LAYOUTS {
            let sql = format!(
                "SELECT d.content, {} AS metadata, (e.embedding <=> $1)::float8 AS distance \
                 FROM {} e JOIN {} d ON e.document_id = d.id \
                 ORDER BY distance LIMIT $2",
                metadata_expr(layout, "d."),
                self.tables.embeddings,
                self.tables.documents
            );

            match sqlx::query(&sql)
                .bind(Vector::from(query.to_vec()))
                .bind(limit)
                .fetch_all(&mut *conn)
                .await
            {
                Ok(rows) => return rows.iter().map(search_result_from_row).collect(),
                Err(e) if has_code(&e, UNDEFINED_COLUMN) => {
                    debug!("Search layout ({}) rejected: {}", layout.describe(), e);
                }
                Err(e) => {
                    return Err(AdapterError::Database(format!(
                        "Similarity search failed: {}",
                        e
                    )));
                }
            }
        }

        Err(layout::exhausted(&self.tables.documents, &READ_LAYOUTS))
    }

    async fn list_in(&self, conn: &mut PgConnection, limit: usize) -> Result<Vec<StoredItem>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        for layout in &READ_LAYOUTS {
            let sql = format!(
                "SELECT id::bigint AS id, content, {} AS metadata FROM {} ORDER BY id LIMIT $1",
                metadata_expr(layout, ""),
                self.tables.documents
            );

            match sqlx::query(&sql).bind(limit).fetch_all(&mut *conn).await {
                Ok(rows) => return rows.iter().map(stored_item_from_row).collect(),
                Err(e) if has_code(&e, UNDEFINED_COLUMN) => {
                    debug!("Listing layout ({}) rejected: {}", layout.describe(), e);
                }
                Err(e) => {
                    return Err(AdapterError::Database(format!(
                        "Failed to list documents: {}",
                        e
                    )));
                }
            }
        }

        Err(layout::exhausted(&self.tables.documents, &READ_LAYOUTS))
    }
}

#[async_trait]
impl VectorStore for PgVectorStore {
    fn tables(&self) -> &VectorTables {
        &self.tables
    }

    async fn validate_schema(&self) -> Result<()> {
        let mut conn = self.connect().await?;

        let mut failure = None;
        for table in self.tables.all() {
            let sql = format!("SELECT 1 FROM {} LIMIT 1", table);
            if let Err(e) = sqlx::query(&sql).fetch_optional(&mut conn).await {
                failure = Some(e);
                break;
            }
        }
        close(conn).await;

        match failure {
            None => Ok(()),
            Some(e) => Err(AdapterError::Database(format!(
                "Schema validation failed. Tables not found: {}. Error: {}",
                self.tables.all().join(", "),
                e
            ))),
        }
    }

    async fn ensure_model(&self, dimension: u32) -> Result<i64> {
        let mut conn = self.connect().await?;

        let result = async {
            let mut tx = conn
                .begin()
                .await
                .map_err(db_error("Failed to start transaction"))?;
            let id = self.ensure_model_in(&mut tx, dimension).await?;
            tx.commit()
                .await
                .map_err(db_error("Failed to commit transaction"))?;
            Ok::<_, AdapterError>(id)
        }
        .await;

        close(conn).await;
        result
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

        let mut conn = self.connect().await?;
        let result = self
            .add_in_transaction(&mut conn, documents, embeddings, dimension)
            .await;
        close(conn).await;

        if let Ok(ids) = &result {
            info!(
                "Stored {} documents in {}/{}",
                ids.len(),
                self.tables.documents,
                self.tables.embeddings
            );
        }
        result
    }

    async fn count_embeddings(&self) -> Result<i64> {
        let mut conn = self.connect().await?;
        let sql = format!("SELECT COUNT(*) FROM {}", self.tables.embeddings);
        let count = sqlx::query_scalar::<_, i64>(&sql)
            .fetch_one(&mut conn)
            .await
            .map_err(db_error("Failed to count embeddings"));
        close(conn).await;
        count
    }

    async fn nearest(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut conn = self.connect().await?;
        let result = self.nearest_in(&mut conn, query, k).await;
        close(conn).await;
        result
    }

    async fn list_documents(&self, limit: usize) -> Result<Vec<StoredItem>> {
        let mut conn = self.connect().await?;
        let result = self.list_in(&mut conn, limit).await;
        close(conn).await;
        result
    }
}

/// Try each layout in order inside its own savepoint. Undefined-column errors
/// move on to the next layout; any other statement error is handed back in
/// the inner result so callers can react to specific codes.
async fn insert_with_layouts<F>(
    conn: &mut PgConnection,
    table: &str,
    layouts: &[Layout],
    returning: bool,
    value: F,
) -> Result<Attempt>
where
    F: Fn(&str) -> Option<SqlValue> + Send + Sync,
{
    for layout in layouts {
        let values = layout::row_values(table, layout, &value)?;
        let mut savepoint = Connection::begin(&mut *conn)
            .await
            .map_err(db_error("Failed to open savepoint"))?;

        let mut builder = insert_query(table, layout, values, returning);
        let outcome = if returning {
            builder
                .build()
                .fetch_one(&mut *savepoint)
                .await
                .and_then(|row| row.try_get::<i64, _>(0))
                .map(Some)
        } else {
            builder
                .build()
                .execute(&mut *savepoint)
                .await
                .map(|_| None)
        };

        match outcome {
            Ok(id) => {
                savepoint
                    .commit()
                    .await
                    .map_err(db_error("Failed to release savepoint"))?;
                return Ok(Ok(id));
            }
            Err(e) if has_code(&e, UNDEFINED_COLUMN) => {
                debug!("Layout ({}) rejected by {}: {}", layout.describe(), table, e);
                savepoint
                    .rollback()
                    .await
                    .map_err(db_error("Failed to roll back savepoint"))?;
            }
            Err(e) => {
                savepoint
                    .rollback()
                    .await
                    .map_err(db_error("Failed to roll back savepoint"))?;
                return Ok(Err(e));
            }
        }
    }

    Err(layout::exhausted(table, layouts))
}

fn insert_query<'args>(
    table: &str,
    layout: &Layout,
    values: Vec<SqlValue>,
    returning: bool,
) -> QueryBuilder<'args, Postgres> {
    let mut builder = QueryBuilder::new(format!(
        "INSERT INTO {} ({}) VALUES (",
        table,
        layout.describe()
    ));

    let mut separated = builder.separated(", ");
    for value in values {
        match value {
            SqlValue::Text(v) => separated.push_bind(v),
            SqlValue::Json(v) => separated.push_bind(Json(v)),
            SqlValue::BigInt(v) => separated.push_bind(v),
            SqlValue::Int(v) => separated.push_bind(v),
            SqlValue::Vector(v) => separated.push_bind(Vector::from(v)),
        };
    }
    separated.push_unseparated(")");

    if returning {
        builder.push(" RETURNING id::bigint");
    }
    builder
}

async fn select_model(conn: &mut PgConnection, table: &str, name: &str) -> Result<Option<i64>> {
    let sql = format!("SELECT id::bigint FROM {} WHERE name = $1 LIMIT 1", table);
    sqlx::query_scalar::<_, i64>(&sql)
        .bind(name)
        .fetch_optional(&mut *conn)
        .await
        .map_err(db_error("Failed to look up embedding model"))
}

fn metadata_expr(layout: &Layout, prefix: &str) -> String {
    if layout.columns.contains(&"metadata") {
        format!("{}metadata::jsonb", prefix)
    } else {
        "NULL::jsonb".to_string()
    }
}

fn read_metadata(row: &PgRow) -> Result<Map<String, Value>> {
    let value: Option<Json<Value>> = row
        .try_get("metadata")
        .map_err(db_error("Failed to read metadata"))?;
    Ok(match value {
        Some(Json(Value::Object(map))) => map,
        _ => Map::new(),
    })
}

fn search_result_from_row(row: &PgRow) -> Result<SearchResult> {
    let distance: f64 = row
        .try_get("distance")
        .map_err(db_error("Failed to read distance"))?;
    Ok(SearchResult {
        content: row
            .try_get("content")
            .map_err(db_error("Failed to read content"))?,
        metadata: read_metadata(row)?,
        distance: distance as f32,
    })
}

fn stored_item_from_row(row: &PgRow) -> Result<StoredItem> {
    Ok(StoredItem {
        id: row.try_get("id").map_err(db_error("Failed to read id"))?,
        content: row
            .try_get("content")
            .map_err(db_error("Failed to read content"))?,
        metadata: read_metadata(row)?,
    })
}

fn has_code(error: &sqlx::Error, code: &str) -> bool {
    error
        .as_database_error()
        .and_then(|e| e.code())
        .is_some_and(|c| c == code)
}

fn db_error(context: &str) -> impl FnOnce(sqlx::Error) -> AdapterError + '_ {
    move |e| AdapterError::Database(format!("{}: {}", context, e))
}

async fn close(conn: PgConnection) {
    if let Err(e) = conn.close().await {
        warn!("Failed to close PostgreSQL connection cleanly: {}", e);
    }
}
