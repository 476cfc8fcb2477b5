//! Attachment storage.
//!
//! Files arrive either ahead of their message (phase one of the
//! two-phase attach, later linked by id) or inline with a message
//! creation request. Bytes land under the configured media storage
//! directory; the database row records the relative path.

use std::path::{Path, PathBuf};

use mediline_config::MediaConfig;
use mediline_database::{Attachment, AttachmentRepository, CreateAttachmentRequest};
use sqlx::SqlitePool;
use tracing::info;

use crate::types::{AttachmentInfo, ConversationError, ConversationResult};

/// Service for attachment operations
pub struct AttachmentService {
    attachments: AttachmentRepository,
    media: MediaConfig,
}

impl AttachmentService {
    /// Create a new attachment service instance
    pub fn new(pool: SqlitePool, media: MediaConfig) -> Self {
        Self {
            attachments: AttachmentRepository::new(pool),
            media,
        }
    }

    /// Store an uploaded file without a message (phase one of the
    /// two-phase attach). Returns the unlinked attachment row whose id
    /// the client later references in a `chat_message` frame.
    pub async fn store(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> ConversationResult<Attachment> {
        self.store_internal(None, file_name, content_type, bytes).await
    }

    /// Store an uploaded file directly linked to a message (the inline
    /// multipart path).
    pub async fn store_for_message(
        &self,
        message_id: i64,
        file_name: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> ConversationResult<Attachment> {
        self.store_internal(Some(message_id), file_name, content_type, bytes)
            .await
    }

    async fn store_internal(
        &self,
        message_id: Option<i64>,
        file_name: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> ConversationResult<Attachment> {
        let relative_path = stored_path(file_name);
        let full_path = PathBuf::from(&self.media.storage_dir).join(&relative_path);

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&full_path, bytes).await?;

        let attachment = self
            .attachments
            .create(&CreateAttachmentRequest {
                message_id,
                file_name: file_name.to_string(),
                content_type: content_type.to_string(),
                file_size: bytes.len() as i64,
                file_path: relative_path,
            })
            .await?;

        info!(
            attachment_id = attachment.id,
            message_id = ?message_id,
            file_name = %file_name,
            file_size = attachment.file_size,
            "stored uploaded attachment"
        );

        Ok(attachment)
    }

    /// Get an attachment by id
    pub async fn get(&self, id: i64) -> ConversationResult<Attachment> {
        self.attachments
            .find_by_id(id)
            .await?
            .ok_or(ConversationError::AttachmentNotFound { id })
    }

    /// Serialized metadata for an attachment
    pub fn info(&self, attachment: &Attachment) -> AttachmentInfo {
        AttachmentInfo::from_attachment(attachment, &self.media)
    }
}

/// A collision-free relative storage path preserving the extension of the
/// uploaded file name.
fn stored_path(file_name: &str) -> String {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("bin");

    format!("attachments/{}.{}", cuid2::create_id(), extension)
}
