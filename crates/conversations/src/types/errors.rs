//! Error types for the conversation domain.

use mediline_database::CallStatus;
use thiserror::Error;

/// Result type alias for conversation operations
pub type ConversationResult<T> = Result<T, ConversationError>;

/// Main error type for the conversation domain
#[derive(Debug, Error)]
pub enum ConversationError {
    #[error("database error: {0}")]
    Database(#[from] mediline_database::DatabaseError),

    #[error("conversation not found: {id}")]
    ConversationNotFound { id: i64 },

    #[error("message not found: {id}")]
    MessageNotFound { id: i64 },

    #[error("attachment not found: {id}")]
    AttachmentNotFound { id: i64 },

    #[error("call not found: {id}")]
    CallNotFound { id: i64 },

    #[error("user not found: {id}")]
    UserNotFound { id: i64 },

    #[error("permission denied: {reason}")]
    PermissionDenied { reason: String },

    #[error("illegal call status transition: {from} -> {to}")]
    InvalidTransition { from: CallStatus, to: CallStatus },

    #[error("validation error: {message}")]
    Validation { message: String },

    #[error("file storage error: {message}")]
    FileStorage { message: String },
}

impl ConversationError {
    /// Create a permission denied error
    pub fn permission_denied(reason: impl Into<String>) -> Self {
        Self::PermissionDenied {
            reason: reason.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a file storage error
    pub fn file_storage(message: impl Into<String>) -> Self {
        Self::FileStorage {
            message: message.into(),
        }
    }
}

impl From<mediline_users::UserError> for ConversationError {
    fn from(error: mediline_users::UserError) -> Self {
        match error {
            mediline_users::UserError::UserNotFound { id } => Self::UserNotFound { id },
            mediline_users::UserError::Database(e) => Self::Database(e),
        }
    }
}

impl From<std::io::Error> for ConversationError {
    fn from(error: std::io::Error) -> Self {
        Self::FileStorage {
            message: error.to_string(),
        }
    }
}
