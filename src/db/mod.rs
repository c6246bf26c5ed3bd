mod postgres;
mod sqlite;

pub use postgres::PostgresChatStore;
pub use sqlite::SqliteChatStore;

use crate::models::{Chat, Message, MessageRole};
use async_trait::async_trait;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Database(#[from] sqlx::Error),
}

/// Persistence contract shared by the embedded and the client-server
/// backend. Each operation commits fully or returns an error; ownership is
/// enforced by filtering on the user identity inside the queries, the same
/// way the schema is shared: no caching and no locking of our own on top of
/// the engine.
#[async_trait]
pub trait ChatStore: Send + Sync {
    /// Create the two chat tables and the preference table if missing.
    async fn ensure_schema(&self) -> Result<(), StoreError>;

    async fn create_chat(&self, user_id: &str, title: &str) -> Result<Chat, StoreError>;

    /// All chats of one user, most recently created first.
    async fn list_chats(&self, user_id: &str) -> Result<Vec<Chat>, StoreError>;

    async fn fetch_chat(&self, chat_id: Uuid, user_id: &str) -> Result<Option<Chat>, StoreError>;

    /// Messages of one chat in append order. Empty when the chat does not
    /// exist or belongs to someone else.
    async fn load_messages(
        &self,
        chat_id: Uuid,
        user_id: &str,
    ) -> Result<Vec<Message>, StoreError>;

    async fn append_message(
        &self,
        chat_id: Uuid,
        role: MessageRole,
        content: &str,
    ) -> Result<Message, StoreError>;

    /// Returns the updated chat, or `None` when no chat matched.
    async fn rename_chat(
        &self,
        chat_id: Uuid,
        user_id: &str,
        title: &str,
    ) -> Result<Option<Chat>, StoreError>;

    /// Returns the number of chats removed; messages go with them.
    async fn delete_chat(&self, chat_id: Uuid, user_id: &str) -> Result<u64, StoreError>;

    async fn preferred_model(&self, user_id: &str) -> Result<Option<String>, StoreError>;

    async fn set_preferred_model(&self, user_id: &str, model: &str) -> Result<(), StoreError>;
}
