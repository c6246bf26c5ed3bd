use super::{ChatStore, StoreError};
use crate::configuration::PostgresSettings;
use crate::models::{Chat, Message, MessageRole};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::PgPool;
use std::time::Duration;
use uuid::Uuid;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS chats (
    id UUID PRIMARY KEY,
    user_id TEXT NOT NULL,
    title TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL
);
CREATE TABLE IF NOT EXISTS messages (
    id UUID PRIMARY KEY,
    chat_id UUID NOT NULL REFERENCES chats(id) ON DELETE CASCADE,
    role TEXT NOT NULL,
    content TEXT NOT NULL,
    "position" BIGINT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_messages_chat ON messages (chat_id, "position");
CREATE TABLE IF NOT EXISTS user_preferences (
    user_id TEXT PRIMARY KEY,
    preferred_model TEXT NOT NULL
);
"#;

// Same layout with pgcrypto-encrypted content. pgp_sym_encrypt produces
// BYTEA; everything else stays plaintext so listing and renaming never need
// the key.
const SCHEMA_ENCRYPTED: &str = r#"
CREATE EXTENSION IF NOT EXISTS pgcrypto;
CREATE TABLE IF NOT EXISTS chats (
    id UUID PRIMARY KEY,
    user_id TEXT NOT NULL,
    title TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL
);
CREATE TABLE IF NOT EXISTS messages (
    id UUID PRIMARY KEY,
    chat_id UUID NOT NULL REFERENCES chats(id) ON DELETE CASCADE,
    role TEXT NOT NULL,
    content BYTEA NOT NULL,
    "position" BIGINT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_messages_chat ON messages (chat_id, "position");
CREATE TABLE IF NOT EXISTS user_preferences (
    user_id TEXT PRIMARY KEY,
    preferred_model TEXT NOT NULL
);
"#;

/// Client-server backend. With an encryption key configured, message content
/// is encrypted at rest with `pgp_sym_encrypt` and decrypted on read; the
/// key never leaves the process.
pub struct PostgresChatStore {
    pool: PgPool,
    encryption_key: Option<String>,
}

impl PostgresChatStore {
    pub async fn connect(settings: &PostgresSettings) -> Result<Self, StoreError> {
        let options = PgConnectOptions::new()
            .host(&settings.host)
            .port(settings.port)
            .username(&settings.username)
            .password(&settings.password)
            .database(&settings.database_name)
            .ssl_mode(PgSslMode::Disable);

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(options)
            .await?;

        Ok(Self {
            pool,
            encryption_key: settings.encryption_key.clone(),
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ChatStore for PostgresChatStore {
    async fn ensure_schema(&self) -> Result<(), StoreError> {
        let schema = if self.encryption_key.is_some() {
            SCHEMA_ENCRYPTED
        } else {
            SCHEMA
        };
        sqlx::raw_sql(schema).execute(&self.pool).await?;
        tracing::info!(
            encrypted = self.encryption_key.is_some(),
            "PostgreSQL schema is in place"
        );
        Ok(())
    }

    async fn create_chat(&self, user_id: &str, title: &str) -> Result<Chat, StoreError> {
        let chat = Chat::new(user_id.to_string(), title.to_string());
        sqlx::query(
            r#"INSERT INTO chats (id, user_id, title, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5)"#,
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
               WHERE user_id = $1
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
               WHERE id = $1 AND user_id = $2"#,
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
        if let Some(key) = &self.encryption_key {
            return sqlx::query_as::<_, Message>(
                r#"SELECT m.id, m.chat_id, m.role,
                          pgp_sym_decrypt(m.content, $3) AS content,
                          m."position", m.created_at
                   FROM messages m
                   JOIN chats c ON c.id = m.chat_id
                   WHERE m.chat_id = $1 AND c.user_id = $2
                   ORDER BY m."position""#,
            )
            .bind(chat_id)
            .bind(user_id)
            .bind(key)
            .fetch_all(&self.pool)
            .await
            .map_err(StoreError::from);
        }

        sqlx::query_as::<_, Message>(
            r#"SELECT m.id, m.chat_id, m.role, m.content, m."position", m.created_at
               FROM messages m
               JOIN chats c ON c.id = m.chat_id
               WHERE m.chat_id = $1 AND c.user_id = $2
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
            r#"SELECT COALESCE(MAX("position") + 1, 0) FROM messages WHERE chat_id = $1"#,
        )
        .bind(chat_id)
        .fetch_one(&mut *tx)
        .await?;

        let message = Message::new(chat_id, role, content.to_string(), position);
        if let Some(key) = &self.encryption_key {
            sqlx::query(
                r#"INSERT INTO messages (id, chat_id, role, content, "position", created_at)
                   VALUES ($1, $2, $3, pgp_sym_encrypt($4, $7), $5, $6)"#,
            )
            .bind(message.id)
            .bind(message.chat_id)
            .bind(&message.role)
            .bind(&message.content)
            .bind(message.position)
            .bind(message.created_at)
            .bind(key)
            .execute(&mut *tx)
            .await?;
        } else {
            sqlx::query(
                r#"INSERT INTO messages (id, chat_id, role, content, "position", created_at)
                   VALUES ($1, $2, $3, $4, $5, $6)"#,
            )
            .bind(message.id)
            .bind(message.chat_id)
            .bind(&message.role)
            .bind(&message.content)
            .bind(message.position)
            .bind(message.created_at)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(r#"UPDATE chats SET updated_at = $1 WHERE id = $2"#)
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
            r#"UPDATE chats SET title = $1, updated_at = $2
               WHERE id = $3 AND user_id = $4
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
        let result = sqlx::query(r#"DELETE FROM chats WHERE id = $1 AND user_id = $2"#)
            .bind(chat_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn preferred_model(&self, user_id: &str) -> Result<Option<String>, StoreError> {
        sqlx::query_scalar(
            r#"SELECT preferred_model FROM user_preferences WHERE user_id = $1"#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from)
    }

    async fn set_preferred_model(&self, user_id: &str, model: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"INSERT INTO user_preferences (user_id, preferred_model)
               VALUES ($1, $2)
               ON CONFLICT (user_id) DO UPDATE SET preferred_model = EXCLUDED.preferred_model"#,
        )
        .bind(user_id)
        .bind(model)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
