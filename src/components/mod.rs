// Components module
// Host-facing nodes. Each owns its store handle and turns every outcome,
// failures included, into a Message or Data for the host


pub mod chat;
pub mod convert;
pub mod documents;
pub mod envelope;
pub mod lookup;
pub mod prompt;
pub mod vector;

pub use chat::ChatStorage;
pub use convert::message_to_data;
pub use documents::SmartDocuments;
pub use envelope::{Data, Message};
pub use lookup::RedisLookup;
pub use prompt::{BuiltPrompt, build_prompt};
pub use vector::VectorSearch;
