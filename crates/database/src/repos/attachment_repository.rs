//! Repository for attachment data access operations.

use crate::entities::{Attachment, CreateAttachmentRequest};
use crate::types::DatabaseResult;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::info;

/// Repository for attachment database operations
pub struct AttachmentRepository {
    pool: SqlitePool,
}

impl AttachmentRepository {
    /// Create a new attachment repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new attachment row. `message_id` may be `None` when the
    /// file is uploaded ahead of the message it will belong to.
    pub async fn create(&self, request: &CreateAttachmentRequest) -> DatabaseResult<Attachment> {
        let now = chrono::Utc::now().to_rfc3339();

        let result = sqlx::query(
            "INSERT INTO attachments (message_id, file_name, content_type, file_size, file_path, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(request.message_id)
        .bind(&request.file_name)
        .bind(&request.content_type)
        .bind(request.file_size)
        .bind(&request.file_path)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        let attachment_id = result.last_insert_rowid();

        info!(
            attachment_id = attachment_id,
            message_id = ?request.message_id,
            file_name = %request.file_name,
            "created new attachment"
        );

        Ok(Attachment {
            id: attachment_id,
            message_id: request.message_id,
            file_name: request.file_name.clone(),
            content_type: request.content_type.clone(),
            file_size: request.file_size,
            file_path: request.file_path.clone(),
            created_at: now,
        })
    }

    /// Find an attachment by id
    pub async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<Attachment>> {
        let row = sqlx::query(
            "SELECT id, message_id, file_name, content_type, file_size, file_path, created_at
             FROM attachments WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| attachment_from_row(&row))
            .transpose()
            .map_err(Into::into)
    }

    /// Link an unlinked attachment to a message. Returns `false` when the
    /// attachment does not exist or already belongs to a message; the
    /// owning message of an attachment is never reassigned.
    pub async fn link_to_message(&self, attachment_id: i64, message_id: i64) -> DatabaseResult<bool> {
        let result = sqlx::query(
            "UPDATE attachments SET message_id = ? WHERE id = ? AND message_id IS NULL",
        )
        .bind(message_id)
        .bind(attachment_id)
        .execute(&self.pool)
        .await?;

        let linked = result.rows_affected() == 1;
        if linked {
            info!(
                attachment_id = attachment_id,
                message_id = message_id,
                "linked attachment to message"
            );
        }

        Ok(linked)
    }

    /// List all attachments of a message
    pub async fn list_by_message(&self, message_id: i64) -> DatabaseResult<Vec<Attachment>> {
        let rows = sqlx::query(
            "SELECT id, message_id, file_name, content_type, file_size, file_path, created_at
             FROM attachments WHERE message_id = ? ORDER BY id ASC",
        )
        .bind(message_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(attachment_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(Into::into)
    }
}

fn attachment_from_row(row: &SqliteRow) -> Result<Attachment, sqlx::Error> {
    Ok(Attachment {
        id: row.try_get("id")?,
        message_id: row.try_get("message_id")?,
        file_name: row.try_get("file_name")?,
        content_type: row.try_get("content_type")?,
        file_size: row.try_get("file_size")?,
        file_path: row.try_get("file_path")?,
        created_at: row.try_get("created_at")?,
    })
}
