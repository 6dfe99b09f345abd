
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::{self, Bson, Document, doc};
use mongodb::{Client, Collection};
use serde_json::{Map, Value};
use tracing::{debug, info};

use super::{DocumentStore, NewDocument, SEARCH_FIELDS, StoredDocument};
use crate::config::{MongoConfig, mask_credentials};
use crate::{AdapterError, Result};

/// MongoDB backend. Each operation opens a client, pings the server, runs one
/// command and shuts the client down again.
#[derive(Debug, Clone)]
pub struct MongoDocumentStore {
    config: MongoConfig,
}

impl MongoDocumentStore {
    #[inline]
    pub fn new(config: &MongoConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    async fn connect(&self) -> Result<Client> {
        let client = Client::with_uri_str(&self.config.connection_string)
            .await
            .map_err(|e| AdapterError::Connection(format!("MongoDB connection failed: {}", e)))?;

        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| AdapterError::Connection(format!("MongoDB connection failed: {}", e)))?;

        debug!(
            "Connected to MongoDB at {}",
            mask_credentials(&self.config.connection_string)
        );
        Ok(client)
    }

    fn collection(&self, client: &Client) -> Collection<Document> {
        client
            .database(&self.config.database_name)
            .collection(&self.config.collection_name)
    }
}

#[async_trait]
impl DocumentStore for MongoDocumentStore {
    async fn insert(&self, document: NewDocument) -> Result<StoredDocument> {
        let client = self.connect().await?;
        let now = Utc::now();
        let record = to_bson_document(&document, now)?;

        let result = self
            .collection(&client)
            .insert_one(record)
            .await
            .map_err(|e| AdapterError::Database(format!("Error storing document: {}", e)));
        client.shutdown().await;
        let result = result?;

        let stored = StoredDocument {
            id: bson_id_to_string(&result.inserted_id),
            source: document.source,
            content: document.content,
            created_at: now,
            metadata: document.metadata,
            updated_at: now,
        };
        info!("Document stored with ID: {}", stored.id);
        Ok(stored)
    }

    async fn search(&self, query: &str, limit: i64) -> Result<Vec<StoredDocument>> {
        let client = self.connect().await?;

        let found = async {
            let cursor = self
                .collection(&client)
                .find(search_filter(query))
                .sort(doc! { "created_at": -1 })
                .limit(limit)
                .await?;
            cursor.try_collect::<Vec<Document>>().await
        }
        .await
        .map_err(|e| AdapterError::Database(format!("Error searching: {}", e)));
        client.shutdown().await;

        let documents: Vec<StoredDocument> =
            found?.into_iter().map(from_bson_document).collect();
        info!("Found {} documents for '{}'", documents.len(), query);
        Ok(documents)
    }
}

/// `$or` of case-insensitive regex conditions over every searchable field.
/// The query is escaped so it always matches literally.
pub(crate) fn search_filter(query: &str) -> Document {
    let pattern = fancy_regex::escape(query).into_owned();
    let conditions: Vec<Bson> = SEARCH_FIELDS
        .iter()
        .map(|field| {
            let mut condition = Document::new();
            condition.insert(*field, doc! { "$regex": pattern.as_str(), "$options": "i" });
            Bson::Document(condition)
        })
        .collect();

    doc! { "$or": conditions }
}

pub(crate) fn to_bson_document(document: &NewDocument, now: DateTime<Utc>) -> Result<Document> {
    let metadata = bson::to_bson(&Value::Object(document.metadata.clone()))
        .map_err(|e| AdapterError::MalformedInput(format!("Unsupported metadata: {}", e)))?;
    let timestamp = bson::DateTime::from_millis(now.timestamp_millis());

    Ok(doc! {
        "source": document.source.as_str(),
        "content": document.content.as_str(),
        "created_at": timestamp,
        "metadata": metadata,
        "_updated_at": timestamp,
    })
}

pub(crate) fn from_bson_document(document: Document) -> StoredDocument {
    let id = document.get("_id").map(bson_id_to_string).unwrap_or_default();
    let source = document.get_str("source").unwrap_or_default().to_string();
    let content = document.get_str("content").unwrap_or_default().to_string();
    let created_at = read_timestamp(&document, "created_at").unwrap_or_default();
    let updated_at = read_timestamp(&document, "_updated_at").unwrap_or(created_at);

    let metadata = match document.get("metadata").cloned().map(Bson::into_relaxed_extjson) {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };

    StoredDocument {
        id,
        source,
        content,
        created_at,
        metadata,
        updated_at,
    }
}

fn read_timestamp(document: &Document, key: &str) -> Option<DateTime<Utc>> {
    document
        .get_datetime(key)
        .ok()
        .and_then(|dt| DateTime::from_timestamp_millis(dt.timestamp_millis()))
}

fn bson_id_to_string(id: &Bson) -> String {
    match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::String(s) => s.clone(),
        other => other.to_string(),
    }
}
