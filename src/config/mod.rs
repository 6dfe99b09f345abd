// Configuration management module
// TOML settings for every store adapter plus the embedding provider

pub mod settings;


use anyhow::{Context, Result};
use console::style;
use std::path::{Path, PathBuf};

pub use settings::{
    ChatConfig, Config, ConfigError, EmbeddingConfig, EmbeddingProviderKind, MongoConfig,
    PgVectorConfig, RedisConfig, is_valid_table_name, mask_credentials, normalize_postgres_url,
};

/// Resolve the configuration directory, preferring an explicit override
#[inline]
pub fn resolve_config_dir(override_dir: Option<&Path>) -> Result<PathBuf, ConfigError> {
    match override_dir {
        Some(dir) => Ok(dir.to_path_buf()),
        None => Config::default_dir(),
    }
}

/// Write the effective configuration to `config.toml`, creating the
/// directory when needed. Existing values are kept.
#[inline]
pub fn write_config(config_dir: &Path) -> Result<PathBuf> {
    let config = Config::load(config_dir).context("Failed to load configuration")?;
    config.save()?;
    Ok(config.config_file_path())
}

/// Print the effective configuration with secrets masked
#[inline]
pub fn show_config(config_dir: &Path) -> Result<()> {
    let config = Config::load(config_dir).context("Failed to load configuration")?;

    eprintln!("{}", style("Current Configuration").bold().cyan());
    eprintln!();

    for line in render_config(&config) {
        if line.ends_with(':') {
            eprintln!("{}", style(line).bold().yellow());
        } else {
            eprintln!("{}", line);
        }
    }

    eprintln!();
    eprintln!(
        "Config file: {}",
        style(config.config_file_path().display()).dim()
    );

    Ok(())
}

/// Plain-text lines describing the configuration; passwords never appear.
#[inline]
pub fn render_config(config: &Config) -> Vec<String> {
    let redis_password = match config.redis.password.as_deref() {
        Some(p) if !p.is_empty() => "****",
        _ => "(none)",
    };

    vec![
        "Redis:".to_string(),
        format!("  Host: {}", config.redis.host),
        format!("  Port: {}", config.redis.port),
        format!("  Database: {}", config.redis.database),
        format!("  Password: {}", redis_password),
        "MongoDB:".to_string(),
        format!(
            "  Connection: {}",
            mask_credentials(&config.mongodb.connection_string)
        ),
        format!("  Database: {}", config.mongodb.database_name),
        format!("  Collection: {}", config.mongodb.collection_name),
        format!("  Search Limit: {}", config.mongodb.search_limit),
        "PGVector:".to_string(),
        format!(
            "  Connection: {}",
            mask_credentials(&config.pgvector.connection_string)
        ),
        format!(
            "  Tables: {} / {} / {}",
            config.pgvector.documents_table,
            config.pgvector.embeddings_table,
            config.pgvector.models_table
        ),
        format!("  Source Name: {}", config.pgvector.source_name),
        format!(
            "  Embedding Dimension: {}",
            config.pgvector.embedding_dimension
        ),
        format!("  Results: {}", config.pgvector.number_of_results),
        "Chat:".to_string(),
        format!("  Session ID: {}", config.chat.session_id),
        "Embedding:".to_string(),
        format!("  Provider: {:?}", config.embedding.provider),
        format!("  Model: {}", config.embedding.model),
        format!(
            "  Endpoint: {}://{}:{}",
            config.embedding.protocol, config.embedding.host, config.embedding.port
        ),
    ]
}
