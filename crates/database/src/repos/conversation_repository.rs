//! Repository for conversation data access operations.

use crate::entities::Conversation;
use crate::types::DatabaseResult;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::info;

/// Repository for conversation database operations
pub struct ConversationRepository {
    pool: SqlitePool,
}

impl ConversationRepository {
    /// Create a new conversation repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Find a conversation by id
    pub async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<Conversation>> {
        let row = sqlx::query(
            "SELECT id, patient_id, doctor_id, created_at, updated_at
             FROM conversations WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| conversation_from_row(&row))
            .transpose()
            .map_err(Into::into)
    }

    /// List every conversation the user participates in, most recent first
    pub async fn list_for_user(&self, user_id: i64) -> DatabaseResult<Vec<Conversation>> {
        let rows = sqlx::query(
            "SELECT id, patient_id, doctor_id, created_at, updated_at
             FROM conversations WHERE patient_id = ? OR doctor_id = ?
             ORDER BY updated_at DESC",
        )
        .bind(user_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(conversation_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(Into::into)
    }

    /// Create a new conversation between a patient and a doctor
    pub async fn create(&self, patient_id: i64, doctor_id: i64) -> DatabaseResult<Conversation> {
        let now = chrono::Utc::now().to_rfc3339();

        let result = sqlx::query(
            "INSERT INTO conversations (patient_id, doctor_id, created_at, updated_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(patient_id)
        .bind(doctor_id)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        let conversation_id = result.last_insert_rowid();

        info!(
            conversation_id = conversation_id,
            patient_id = patient_id,
            doctor_id = doctor_id,
            "created new conversation"
        );

        Ok(Conversation {
            id: conversation_id,
            patient_id,
            doctor_id,
            created_at: now.clone(),
            updated_at: now,
        })
    }
}

fn conversation_from_row(row: &SqliteRow) -> Result<Conversation, sqlx::Error> {
    Ok(Conversation {
        id: row.try_get("id")?,
        patient_id: row.try_get("patient_id")?,
        doctor_id: row.try_get("doctor_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
