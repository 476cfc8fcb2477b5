//! Call records and their forward-only status machine.

use mediline_database::{
    Call, CallRepository, CallStatus, CallType, ConversationRepository,
};
use sqlx::SqlitePool;
use tracing::info;

use crate::types::{ConversationError, ConversationResult};

/// Service for call operations
pub struct CallService {
    calls: CallRepository,
    conversations: ConversationRepository,
}

impl CallService {
    /// Create a new call service instance
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            calls: CallRepository::new(pool.clone()),
            conversations: ConversationRepository::new(pool),
        }
    }

    /// Create a call on a conversation. The caller must be a participant;
    /// the receiver is always deduced as the other participant — a
    /// receiver supplied by the client is untrusted and ignored.
    pub async fn create(
        &self,
        conversation_id: i64,
        caller_id: i64,
        call_type: CallType,
    ) -> ConversationResult<Call> {
        let conversation = self
            .conversations
            .find_by_id(conversation_id)
            .await?
            .ok_or(ConversationError::ConversationNotFound {
                id: conversation_id,
            })?;

        let receiver_id = conversation.other_participant(caller_id).ok_or_else(|| {
            ConversationError::permission_denied("caller is not a party to this conversation")
        })?;

        Ok(self
            .calls
            .create(conversation_id, caller_id, receiver_id, call_type)
            .await?)
    }

    /// Get a call by id
    pub async fn get(&self, id: i64) -> ConversationResult<Call> {
        self.calls
            .find_by_id(id)
            .await?
            .ok_or(ConversationError::CallNotFound { id })
    }

    /// Move a call to a new status.
    ///
    /// Only the caller or the receiver may update a call; anyone else is
    /// rejected with the record unchanged. Transitions must move forward
    /// through the status machine, and terminal statuses stamp the end
    /// time server-side.
    pub async fn update_status(
        &self,
        call_id: i64,
        actor_id: i64,
        new_status: CallStatus,
    ) -> ConversationResult<Call> {
        let call = self.get(call_id).await?;

        if actor_id != call.caller_id && actor_id != call.receiver_id {
            return Err(ConversationError::permission_denied(
                "only the caller or the receiver may update a call",
            ));
        }

        if !call.call_status.can_transition_to(new_status) {
            return Err(ConversationError::InvalidTransition {
                from: call.call_status,
                to: new_status,
            });
        }

        let stamp_end_time = new_status.is_terminal();
        let updated = self
            .calls
            .update_status(call_id, new_status, stamp_end_time)
            .await?
            .ok_or(ConversationError::CallNotFound { id: call_id })?;

        info!(
            call_id = call_id,
            actor_id = actor_id,
            from = %call.call_status,
            to = %new_status,
            "call status updated"
        );

        Ok(updated)
    }
}
