use thiserror::Error;

pub type Result<T> = std::result::Result<T, AdapterError>;

#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("No compatible column layout for table '{table}' (tried: {tried})")]
    SchemaMismatch { table: String, tried: String },

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("No embeddings found in {table}")]
    NotPopulated { table: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod commands;
pub mod components;
pub mod config;
pub mod database;
pub mod embeddings;
pub mod format;
pub mod intent;
