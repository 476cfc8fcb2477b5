//! Error types for the users crate

use thiserror::Error;

/// Result type alias for user operations
pub type UserResult<T> = Result<T, UserError>;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("user not found: {id}")]
    UserNotFound { id: i64 },

    #[error("database error: {0}")]
    Database(#[from] mediline_database::DatabaseError),
}
