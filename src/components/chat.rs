use tracing::{error, info};

use super::Message;
use crate::database::{ChatHistoryStore, ChatMessage};
use crate::format;

/// Appends the turn's messages to a session and renders the whole transcript.
#[derive(Debug)]
pub struct ChatStorage<C> {
    store: C,
    session_id: String,
}

impl<C: ChatHistoryStore> ChatStorage<C> {
    #[inline]
    pub fn new(store: C, session_id: impl Into<String>) -> Self {
        Self {
            store,
            session_id: session_id.into(),
        }
    }

    #[inline]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Store a non-blank user message and any given AI reply, in that order,
    /// then return the formatted history
    #[inline]
    pub async fn store_and_render(
        &self,
        user_message: Option<&str>,
        ai_message: Option<&Message>,
    ) -> Message {
        let pending = [
            user_message
                .filter(|text| !text.trim().is_empty())
                .map(ChatMessage::user),
            ai_message.map(|message| ChatMessage::ai(message.text.as_str())),
        ];

        for message in pending.iter().flatten() {
            if let Err(e) = self.store.append(&self.session_id, message).await {
                error!("Error storing {} message: {}", message.sender, e);
                return Message::new(format!("Error storing chat message: {}", e));
            }
            info!(
                "Stored {} message: {}",
                message.sender,
                message.content.chars().take(30).collect::<String>()
            );
        }

        match self.store.history(&self.session_id).await {
            Ok(history) => {
                info!("Returned {} messages", history.len());
                Message::new(format::chat_history(&history))
            }
            Err(e) => {
                error!("Error getting messages: {}", e);
                Message::new("Error retrieving conversation history.")
            }
        }
    }
}
