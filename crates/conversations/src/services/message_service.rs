//! Message persistence and two-phase attachment linking.

use mediline_config::MediaConfig;
use mediline_database::{
    AttachmentRepository, ConversationRepository, Message, MessageRepository,
};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::types::{AttachmentInfo, ConversationError, ConversationResult};

/// Service for message operations
pub struct MessageService {
    messages: MessageRepository,
    attachments: AttachmentRepository,
    conversations: ConversationRepository,
    media: MediaConfig,
}

impl MessageService {
    /// Create a new message service instance
    pub fn new(pool: SqlitePool, media: MediaConfig) -> Self {
        Self {
            messages: MessageRepository::new(pool.clone()),
            attachments: AttachmentRepository::new(pool.clone()),
            conversations: ConversationRepository::new(pool),
            media,
        }
    }

    /// Persist a new message. The sender must be a participant of the
    /// conversation; the timestamp is assigned by the store.
    pub async fn create_message(
        &self,
        conversation_id: i64,
        sender_id: i64,
        text: &str,
    ) -> ConversationResult<Message> {
        let conversation = self
            .conversations
            .find_by_id(conversation_id)
            .await?
            .ok_or(ConversationError::ConversationNotFound {
                id: conversation_id,
            })?;

        if !conversation.is_participant(sender_id) {
            return Err(ConversationError::permission_denied(
                "sender is not a party to this conversation",
            ));
        }

        Ok(self.messages.create(conversation_id, sender_id, text).await?)
    }

    /// Link previously-uploaded attachments to a message by id.
    ///
    /// Ids that do not resolve, or that belong to an already-linked
    /// attachment, are skipped; linking is never an error path for the
    /// surrounding message creation.
    pub async fn link_attachments(
        &self,
        message_id: i64,
        attachment_ids: &[i64],
    ) -> ConversationResult<()> {
        for &attachment_id in attachment_ids {
            let linked = self.attachments.link_to_message(attachment_id, message_id).await?;
            if linked {
                info!(attachment_id, message_id, "attached uploaded file to message");
            } else {
                debug!(attachment_id, message_id, "skipping unknown or already-linked attachment");
            }
        }
        Ok(())
    }

    /// Serialized attachment metadata of a message, with absolute URLs.
    pub async fn attachments_for(&self, message_id: i64) -> ConversationResult<Vec<AttachmentInfo>> {
        let attachments = self.attachments.list_by_message(message_id).await?;
        Ok(attachments
            .iter()
            .map(|attachment| AttachmentInfo::from_attachment(attachment, &self.media))
            .collect())
    }
}
