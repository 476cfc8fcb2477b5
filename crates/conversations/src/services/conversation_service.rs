//! Conversation management and the merged history view.

use mediline_config::MediaConfig;
use mediline_database::{
    AccountType, AttachmentRepository, CallRepository, Conversation, ConversationRepository,
    MessageRepository, UserRepository,
};
use sqlx::SqlitePool;

use crate::types::history::merge_history;
use crate::types::{AttachmentInfo, ConversationError, ConversationResult, HistoryItem};

/// Service for conversation operations
pub struct ConversationService {
    conversations: ConversationRepository,
    messages: MessageRepository,
    attachments: AttachmentRepository,
    calls: CallRepository,
    users: UserRepository,
    media: MediaConfig,
}

impl ConversationService {
    /// Create a new conversation service instance
    pub fn new(pool: SqlitePool, media: MediaConfig) -> Self {
        Self {
            conversations: ConversationRepository::new(pool.clone()),
            messages: MessageRepository::new(pool.clone()),
            attachments: AttachmentRepository::new(pool.clone()),
            calls: CallRepository::new(pool.clone()),
            users: UserRepository::new(pool),
            media,
        }
    }

    /// Get a conversation by id
    pub async fn get(&self, id: i64) -> ConversationResult<Conversation> {
        self.conversations
            .find_by_id(id)
            .await?
            .ok_or(ConversationError::ConversationNotFound { id })
    }

    /// Get a conversation, requiring `user_id` to be one of its two
    /// participants.
    pub async fn get_checked(&self, id: i64, user_id: i64) -> ConversationResult<Conversation> {
        let conversation = self.get(id).await?;
        if !conversation.is_participant(user_id) {
            return Err(ConversationError::permission_denied(
                "user is not a party to this conversation",
            ));
        }
        Ok(conversation)
    }

    /// List conversations the user participates in
    pub async fn list_for_user(&self, user_id: i64) -> ConversationResult<Vec<Conversation>> {
        Ok(self.conversations.list_for_user(user_id).await?)
    }

    /// Create a conversation between a patient and a doctor. Roles are
    /// checked explicitly.
    pub async fn create(&self, patient_id: i64, doctor_id: i64) -> ConversationResult<Conversation> {
        let patient = self
            .users
            .find_by_id(patient_id)
            .await?
            .ok_or(ConversationError::UserNotFound { id: patient_id })?;
        let doctor = self
            .users
            .find_by_id(doctor_id)
            .await?
            .ok_or(ConversationError::UserNotFound { id: doctor_id })?;

        if patient.account_type != AccountType::Patient {
            return Err(ConversationError::validation(
                "conversation patient must have a patient account",
            ));
        }
        if doctor.account_type != AccountType::Doctor {
            return Err(ConversationError::validation(
                "conversation doctor must have a doctor account",
            ));
        }

        Ok(self.conversations.create(patient_id, doctor_id).await?)
    }

    /// The merged history of a conversation: messages and calls as one
    /// tagged timeline, ascending by timestamp. The caller must be a
    /// participant.
    pub async fn history(
        &self,
        conversation_id: i64,
        user_id: i64,
    ) -> ConversationResult<Vec<HistoryItem>> {
        self.get_checked(conversation_id, user_id).await?;

        let messages = self.messages.list_by_conversation(conversation_id).await?;
        let mut with_attachments = Vec::with_capacity(messages.len());
        for message in messages {
            let attachments = self
                .attachments
                .list_by_message(message.id)
                .await?
                .iter()
                .map(|attachment| AttachmentInfo::from_attachment(attachment, &self.media))
                .collect();
            with_attachments.push((message, attachments));
        }

        let calls = self.calls.list_by_conversation(conversation_id).await?;

        Ok(merge_history(with_attachments, calls))
    }
}
