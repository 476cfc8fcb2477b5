//! Repository for message data access operations.

use crate::entities::Message;
use crate::types::DatabaseResult;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::info;

/// Repository for message database operations
pub struct MessageRepository {
    pool: SqlitePool,
}

impl MessageRepository {
    /// Create a new message repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new message. The timestamp is assigned here, never taken
    /// from the client.
    pub async fn create(
        &self,
        conversation_id: i64,
        sender_id: i64,
        text: &str,
    ) -> DatabaseResult<Message> {
        let now = chrono::Utc::now().to_rfc3339();

        let result = sqlx::query(
            "INSERT INTO messages (conversation_id, sender_id, text, timestamp)
             VALUES (?, ?, ?, ?)",
        )
        .bind(conversation_id)
        .bind(sender_id)
        .bind(text)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        let message_id = result.last_insert_rowid();

        info!(
            message_id = message_id,
            conversation_id = conversation_id,
            sender_id = sender_id,
            "created new message"
        );

        Ok(Message {
            id: message_id,
            conversation_id,
            sender_id,
            text: text.to_string(),
            timestamp: now,
        })
    }

    /// Find a message by id
    pub async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<Message>> {
        let row = sqlx::query(
            "SELECT id, conversation_id, sender_id, text, timestamp
             FROM messages WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| message_from_row(&row))
            .transpose()
            .map_err(Into::into)
    }

    /// List all messages of a conversation in ascending timestamp order
    pub async fn list_by_conversation(&self, conversation_id: i64) -> DatabaseResult<Vec<Message>> {
        let rows = sqlx::query(
            "SELECT id, conversation_id, sender_id, text, timestamp
             FROM messages WHERE conversation_id = ? ORDER BY timestamp ASC, id ASC",
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(message_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(Into::into)
    }
}

fn message_from_row(row: &SqliteRow) -> Result<Message, sqlx::Error> {
    Ok(Message {
        id: row.try_get("id")?,
        conversation_id: row.try_get("conversation_id")?,
        sender_id: row.try_get("sender_id")?,
        text: row.try_get("text")?,
        timestamp: row.try_get("timestamp")?,
    })
}
