//! Column layouts tried, richest first, when writing to tables whose exact
//! shape is not known up front.

use serde_json::{Map, Value};

use crate::AdapterError;

/// Ordered set of columns used for a single insert attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub columns: &'static [&'static str],
}

impl Layout {
    #[inline]
    pub const fn new(columns: &'static [&'static str]) -> Self {
        Self { columns }
    }

    #[inline]
    pub fn describe(&self) -> String {
        self.columns.join(", ")
    }
}

pub const DOCUMENT_LAYOUTS: [Layout; 3] = [
    Layout::new(&["source", "content", "metadata"]),
    Layout::new(&["source", "content"]),
    Layout::new(&["content"]),
];

pub const EMBEDDING_LAYOUTS: [Layout; 2] = [
    Layout::new(&["document_id", "model_id", "embedding"]),
    Layout::new(&["document_id", "embedding"]),
];

pub const MODEL_LAYOUTS: [Layout; 2] = [
    Layout::new(&["name", "dimension", "notes"]),
    Layout::new(&["name"]),
];

/// Columns read back from the documents table by searches and listings
pub const READ_LAYOUTS: [Layout; 2] = [
    Layout::new(&["id", "content", "metadata"]),
    Layout::new(&["id", "content"]),
];

/// Error returned once every layout for `table` has been rejected
#[inline]
pub fn exhausted(table: &str, layouts: &[Layout]) -> AdapterError {
    AdapterError::SchemaMismatch {
        table: table.to_string(),
        tried: layouts
            .iter()
            .map(|layout| format!("({})", layout.describe()))
            .collect::<Vec<_>>()
            .join(", "),
    }
}

#[inline]
pub fn model_name(dimension: u32) -> String {
    format!("langflow-{}d", dimension)
}

#[inline]
pub fn model_notes(dimension: u32) -> String {
    format!("Langflow {}D embeddings", dimension)
}

/// A value bound to one column of an insert
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    Json(Value),
    BigInt(i64),
    Int(i32),
    Vector(Vec<f32>),
}

impl SqlValue {
    #[inline]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::BigInt(v) => Some(*v),
            Self::Int(v) => Some(i64::from(*v)),
            _ => None,
        }
    }

    #[inline]
    pub fn as_vector(&self) -> Option<&[f32]> {
        match self {
            Self::Vector(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_object(&self) -> Option<&Map<String, Value>> {
        match self {
            Self::Json(Value::Object(map)) => Some(map),
            _ => None,
        }
    }
}

/// Values for a documents-table row, looked up by column name
#[derive(Debug, Clone, Copy)]
pub struct DocumentRow<'a> {
    pub source: &'a str,
    pub content: &'a str,
    pub metadata: &'a Map<String, Value>,
}

impl DocumentRow<'_> {
    #[inline]
    pub fn value(&self, column: &str) -> Option<SqlValue> {
        match column {
            "source" => Some(SqlValue::Text(self.source.to_string())),
            "content" => Some(SqlValue::Text(self.content.to_string())),
            "metadata" => Some(SqlValue::Json(Value::Object(self.metadata.clone()))),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EmbeddingRow<'a> {
    pub document_id: i64,
    pub model_id: i64,
    pub embedding: &'a [f32],
}

impl EmbeddingRow<'_> {
    #[inline]
    pub fn value(&self, column: &str) -> Option<SqlValue> {
        match column {
            "document_id" => Some(SqlValue::BigInt(self.document_id)),
            "model_id" => Some(SqlValue::BigInt(self.model_id)),
            "embedding" => Some(SqlValue::Vector(self.embedding.to_vec())),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ModelRow {
    pub dimension: u32,
}

impl ModelRow {
    #[inline]
    pub fn value(&self, column: &str) -> Option<SqlValue> {
        match column {
            "name" => Some(SqlValue::Text(model_name(self.dimension))),
            "dimension" => i32::try_from(self.dimension).ok().map(SqlValue::Int),
            "notes" => Some(SqlValue::Text(model_notes(self.dimension))),
            _ => None,
        }
    }
}

/// Collect the values of `layout` from a row accessor. A column the row
/// cannot supply is a programming error in the layout tables.
#[inline]
pub fn row_values<F>(table: &str, layout: &Layout, value: F) -> Result<Vec<SqlValue>, AdapterError>
where
    F: Fn(&str) -> Option<SqlValue>,
{
    layout
        .columns
        .iter()
        .map(|column| {
            value(column).ok_or_else(|| {
                AdapterError::MalformedInput(format!(
                    "No value for column '{}' of table '{}'",
                    column, table
                ))
            })
        })
        .collect()
}
