use super::{ChatStore, StoreError};
use crate::models::{Chat, Message, MessageRole};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::time::Duration;
use uuid::Uuid;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS chats (
    id BLOB PRIMARY KEY,
    user_id TEXT NOT NULL,
    title TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS messages (
    id BLOB PRIMARY KEY,
    chat_id BLOB NOT NULL REFERENCES chats(id) ON DELETE CASCADE,
    role TEXT NOT NULL,
    content TEXT NOT NULL,
    "position" INTEGER NOT NULL,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_messages_chat ON messages (chat_id, "position");
CREATE TABLE IF NOT EXISTS user_preferences (
    user_id TEXT PRIMARY KEY,
    preferred_model TEXT NOT NULL
);
"#;

/// Embedded file-based backend.
pub struct SqliteChatStore {
    pool: SqlitePool,
}

impl SqliteChatStore {
    pub async fn connect(path: &str) -> Result<Self, StoreError> {
        // Cascade deletes depend on foreign_keys being enabled per connection.
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl ChatStore for SqliteChatStore {
    async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        tracing::info!("SQLite schema is in place");
        Ok(())
    }

    async fn create_chat(&self, user_id: &str, title: &str) -> Result<Chat, StoreError> {
        let chat = Chat::new(user_id.to_string(), title.to_string());
        sqlx::query(
            r#"INSERT INTO chats (id, user_id, title, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(chat.id)
        .bind(&chat.user_id)
        .bind(&chat.title)
        .bind(chat.created_at)
        .bind(chat.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(chat)
    }

    async fn list_chats(&self, user_id: &str) -> Result<Vec<Chat>, StoreError> {
        sqlx::query_as::<_, Chat>(
            r#"SELECT id, user_id, title, created_at, updated_at
               FROM chats
               WHERE user_id = ?
               ORDER BY created_at DESC, id"#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from)
    }

    async fn fetch_chat(&self, chat_id: Uuid, user_id: &str) -> Result<Option<Chat>, StoreError> {
        sqlx::query_as::<_, Chat>(
            r#"SELECT id, user_id, title, created_at, updated_at
               FROM chats
               WHERE id = ? AND user_id = ?"#,
        )
        .bind(chat_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from)
    }

    async fn load_messages(
        &self,
        chat_id: Uuid,
        user_id: &str,
    ) -> Result<Vec<Message>, StoreError> {
        sqlx::query_as::<_, Message>(
            r#"SELECT m.id, m.chat_id, m.role, m.content, m."position", m.created_at
               FROM messages m
               JOIN chats c ON c.id = m.chat_id
               WHERE m.chat_id = ? AND c.user_id = ?
               ORDER BY m."position""#,
        )
        .bind(chat_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from)
    }

    async fn append_message(
        &self,
        chat_id: Uuid,
        role: MessageRole,
        content: &str,
    ) -> Result<Message, StoreError> {
        let mut tx = self.pool.begin().await?;

        let position: i64 = sqlx::query_scalar(
            r#"SELECT COALESCE(MAX("position") + 1, 0) FROM messages WHERE chat_id = ?"#,
        )
        .bind(chat_id)
        .fetch_one(&mut *tx)
        .await?;

        let message = Message::new(chat_id, role, content.to_string(), position);
        sqlx::query(
            r#"INSERT INTO messages (id, chat_id, role, content, "position", created_at)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(message.id)
        .bind(message.chat_id)
        .bind(&message.role)
        .bind(&message.content)
        .bind(message.position)
        .bind(message.created_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(r#"UPDATE chats SET updated_at = ? WHERE id = ?"#)
            .bind(Utc::now())
            .bind(chat_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(message)
    }

    async fn rename_chat(
        &self,
        chat_id: Uuid,
        user_id: &str,
        title: &str,
    ) -> Result<Option<Chat>, StoreError> {
        sqlx::query_as::<_, Chat>(
            r#"UPDATE chats SET title = ?, updated_at = ?
               WHERE id = ? AND user_id = ?
               RETURNING id, user_id, title, created_at, updated_at"#,
        )
        .bind(title)
        .bind(Utc::now())
        .bind(chat_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from)
    }

    async fn delete_chat(&self, chat_id: Uuid, user_id: &str) -> Result<u64, StoreError> {
        let result = sqlx::query(r#"DELETE FROM chats WHERE id = ? AND user_id = ?"#)
            .bind(chat_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn preferred_model(&self, user_id: &str) -> Result<Option<String>, StoreError> {
        sqlx::query_scalar(
            r#"SELECT preferred_model FROM user_preferences WHERE user_id = ?"#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from)
    }

    async fn set_preferred_model(&self, user_id: &str, model: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"INSERT INTO user_preferences (user_id, preferred_model)
               VALUES (?, ?)
               ON CONFLICT(user_id) DO UPDATE SET preferred_model = excluded.preferred_model"#,
        )
        .bind(user_id)
        .bind(model)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
