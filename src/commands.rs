use anyhow::{Context, Result};
use console::style;
use tracing::info;

use crate::components::{
    ChatStorage, Message, RedisLookup, SmartDocuments, VectorSearch, build_prompt,
    message_to_data,
};
use crate::config::Config;
use crate::database::{
    MongoDocumentStore, PgVectorStore, RedisChatHistory, RedisKeyValue, VectorIndex,
};
use crate::embeddings::{EmbeddingProvider, build_provider};

/// Session used when neither the command line nor the config names one
pub const DEFAULT_SESSION: &str = "default";

fn print_status(status: &str) {
    if !status.is_empty() {
        eprintln!("{}", style(status).dim());
    }
}

/// Look up a single key in Redis and print its value
#[inline]
pub async fn get_key(config: &Config, key: &str) -> Result<()> {
    let store = RedisKeyValue::new(&config.redis)?;
    let value = RedisLookup::new(store).get_value(key).await;
    println!("{}", value);
    Ok(())
}

/// Store a JSON document or search the collection, depending on `input`
#[inline]
pub async fn smart_documents(config: &Config, input: &str) -> Result<()> {
    let store = MongoDocumentStore::new(&config.mongodb);
    let mut component = SmartDocuments::new(store, config.mongodb.search_limit);

    let output = component.run(input).await;
    println!("{}", output);
    print_status(&component.status().text);
    Ok(())
}

/// Store a JSON document in the vector tables, or run a similarity search.
/// Unreachable tables are reported as the command output.
#[inline]
pub async fn vector(config: &Config, input: &str, k: Option<usize>) -> Result<()> {
    let store = PgVectorStore::new(&config.pgvector)?;
    let embedder = build_provider(config)?;
    info!("Using embedding model {}", embedder.model_name());

    let index = VectorIndex::new(store, embedder, config.pgvector.embedding_dimension);
    let mut component = VectorSearch::new(index, config.pgvector.number_of_results);

    let output = component.run(input, k).await;
    println!("{}", output);
    print_status(component.status());
    Ok(())
}

/// Append the given messages to a chat session and print its transcript
#[inline]
pub async fn chat(
    config: &Config,
    session: Option<String>,
    user: Option<&str>,
    ai: Option<&str>,
) -> Result<()> {
    let session = session
        .filter(|s| !s.trim().is_empty())
        .or_else(|| Some(config.chat.session_id.clone()).filter(|s| !s.trim().is_empty()))
        .unwrap_or_else(|| DEFAULT_SESSION.to_string());

    let store = RedisChatHistory::new(&config.redis)?;
    let chat = ChatStorage::new(store, session);
    let ai = ai.map(Message::from);

    let output = chat.store_and_render(user, ai.as_ref()).await;
    println!("{}", output);
    Ok(())
}

/// Print the data payload a message converts to
#[inline]
pub fn convert(text: &str) -> Result<()> {
    let data = message_to_data(Some(&Message::from(text)));
    let rendered =
        serde_json::to_string_pretty(&data.data).context("Failed to render data payload")?;
    println!("{}", rendered);
    Ok(())
}

/// Build the explanation prompt from an API response and domain knowledge
#[inline]
pub fn prompt(api_response: Option<&str>, knowledge: Option<&str>) -> Result<()> {
    let api_response = api_response.map(|text| message_to_data(Some(&Message::from(text))));
    let knowledge = knowledge.map(Message::from);

    let built = build_prompt(api_response.as_ref(), knowledge.as_ref());
    println!("{}", built.prompt);
    print_status(&built.status);
    Ok(())
}
