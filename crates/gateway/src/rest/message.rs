//! Message REST endpoints
//!
//! `POST /api/conversations/{id}/messages` accepts multipart form data:
//! a `text` field plus any number of `file` parts stored and linked to
//! the new message inline. This is the second attach path next to the
//! two-phase upload-then-link flow.

use axum::{
    extract::{Multipart, Path, State},
    routing::post,
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::error::{GatewayError, GatewayResult};
use crate::state::GatewayState;
use mediline_auth::AuthenticatedUser;
use mediline_conversations::AttachmentInfo;

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub id: i64,
    pub conversation: i64,
    pub sender: i64,
    pub text: String,
    pub timestamp: String,
    #[schema(value_type = Vec<Object>)]
    pub attachments: Vec<AttachmentInfo>,
}

/// Create message routes
pub fn create_message_routes() -> Router<Arc<GatewayState>> {
    Router::new().route(
        "/api/conversations/:conversation_id/messages",
        post(create_message),
    )
}

#[utoipa::path(
    post,
    path = "/api/conversations/{conversation_id}/messages",
    tag = "messages",
    params(("conversation_id" = i64, Path, description = "Conversation id")),
    responses(
        (status = 200, description = "Message created with inline attachments", body = MessageResponse),
        (status = 403, description = "Caller is not a participant", body = crate::rest::ErrorResponse),
        (status = 404, description = "Conversation not found", body = crate::rest::ErrorResponse)
    )
)]
pub async fn create_message(
    Path(conversation_id): Path<i64>,
    State(state): State<Arc<GatewayState>>,
    Extension(user): Extension<AuthenticatedUser>,
    mut multipart: Multipart,
) -> GatewayResult<Json<MessageResponse>> {
    let mut text = String::new();
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| GatewayError::InvalidRequest(format!("invalid multipart body: {}", e)))?
    {
        match field.name() {
            Some("text") => {
                text = field
                    .text()
                    .await
                    .map_err(|e| GatewayError::InvalidRequest(format!("invalid text field: {}", e)))?;
            }
            Some("file") => {
                let file_name = field
                    .file_name()
                    .unwrap_or("upload.bin")
                    .to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| GatewayError::InvalidRequest(format!("invalid file field: {}", e)))?;
                files.push((file_name, content_type, bytes));
            }
            _ => {}
        }
    }

    let message = state
        .message_service
        .create_message(conversation_id, user.id, &text)
        .await?;

    for (file_name, content_type, bytes) in &files {
        state
            .attachment_service
            .store_for_message(message.id, file_name, content_type, bytes)
            .await?;
    }

    let attachments = state.message_service.attachments_for(message.id).await?;

    Ok(Json(MessageResponse {
        id: message.id,
        conversation: message.conversation_id,
        sender: message.sender_id,
        text: message.text,
        timestamp: message.timestamp,
        attachments,
    }))
}
