//! Error types for the gateway layer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Gateway error types
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Authorization failed: {0}")]
    AuthorizationFailed(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Illegal state transition: {0}")]
    InvalidTransition(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("WebSocket error: {0}")]
    WebSocketError(String),
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::AuthenticationFailed(_) => StatusCode::UNAUTHORIZED,
            GatewayError::AuthorizationFailed(_) => StatusCode::FORBIDDEN,
            GatewayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::InvalidTransition(_) => StatusCode::UNPROCESSABLE_ENTITY,
            GatewayError::InternalError(_)
            | GatewayError::DatabaseError(_)
            | GatewayError::ServiceError(_)
            | GatewayError::WebSocketError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_response = json!({
            "error": status.as_str(),
            "message": self.to_string(),
        });

        (status, Json(error_response)).into_response()
    }
}

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Convert from common error types
impl From<mediline_auth::AuthError> for GatewayError {
    fn from(error: mediline_auth::AuthError) -> Self {
        GatewayError::AuthenticationFailed(error.to_string())
    }
}

impl From<mediline_conversations::ConversationError> for GatewayError {
    fn from(error: mediline_conversations::ConversationError) -> Self {
        use mediline_conversations::ConversationError;

        match error {
            ConversationError::ConversationNotFound { .. }
            | ConversationError::MessageNotFound { .. }
            | ConversationError::AttachmentNotFound { .. }
            | ConversationError::CallNotFound { .. }
            | ConversationError::UserNotFound { .. } => GatewayError::NotFound(error.to_string()),
            ConversationError::PermissionDenied { reason } => {
                GatewayError::AuthorizationFailed(reason)
            }
            ConversationError::InvalidTransition { .. } => {
                GatewayError::InvalidTransition(error.to_string())
            }
            ConversationError::Validation { message } => GatewayError::InvalidRequest(message),
            ConversationError::Database(e) => GatewayError::DatabaseError(e.to_string()),
            ConversationError::FileStorage { message } => GatewayError::InternalError(message),
        }
    }
}

impl From<mediline_users::UserError> for GatewayError {
    fn from(error: mediline_users::UserError) -> Self {
        match error {
            mediline_users::UserError::UserNotFound { .. } => {
                GatewayError::NotFound(error.to_string())
            }
            mediline_users::UserError::Database(e) => GatewayError::DatabaseError(e.to_string()),
        }
    }
}

impl From<sqlx::Error> for GatewayError {
    fn from(error: sqlx::Error) -> Self {
        GatewayError::DatabaseError(error.to_string())
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(error: serde_json::Error) -> Self {
        GatewayError::InvalidRequest(format!("JSON serialization error: {}", error))
    }
}
