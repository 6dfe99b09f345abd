// Database module
// One store abstraction per external system, each with a live backend and an
// in-memory backend honouring the same contract

pub mod chat;
pub mod documents;
pub mod keyvalue;
pub mod pgvector;

pub use chat::{ChatHistoryStore, ChatMessage, MemoryChatHistory, RedisChatHistory, Sender};
pub use documents::{
    DocumentStore, MemoryDocumentStore, MongoDocumentStore, NewDocument, StoredDocument,
};
pub use keyvalue::{KeyValueStore, MemoryKeyValue, RedisKeyValue};
pub use pgvector::{
    MemoryVectorStore, NewVectorDocument, PgVectorStore, SearchResult, StoredItem, VectorIndex,
    VectorStore,
};
