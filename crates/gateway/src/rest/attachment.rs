//! Attachment REST endpoints
//!
//! `POST /api/attachments` is phase one of the two-phase attach: the
//! file is stored and recorded without a message; the returned id is
//! later referenced from a `chat_message` WebSocket frame.

use axum::{
    extract::{Multipart, Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::error::{GatewayError, GatewayResult};
use crate::state::GatewayState;
use mediline_auth::AuthenticatedUser;

#[derive(Debug, Serialize, ToSchema)]
pub struct AttachmentResponse {
    pub id: i64,
    pub message: Option<i64>,
    pub file_name: String,
    pub content_type: String,
    pub file_size: i64,
    pub url: String,
}

impl AttachmentResponse {
    fn from_attachment(
        attachment: mediline_database::Attachment,
        media: &mediline_config::MediaConfig,
    ) -> Self {
        Self {
            id: attachment.id,
            message: attachment.message_id,
            file_name: attachment.file_name,
            content_type: attachment.content_type,
            file_size: attachment.file_size,
            url: media.absolute_url(&attachment.file_path),
        }
    }
}

/// Create attachment routes
pub fn create_attachment_routes() -> Router<Arc<GatewayState>> {
    Router::new()
        .route("/api/attachments", post(upload_attachment))
        .route("/api/attachments/:attachment_id", get(get_attachment))
}

#[utoipa::path(
    post,
    path = "/api/attachments",
    tag = "attachments",
    responses(
        (status = 200, description = "File stored, not yet linked to a message", body = AttachmentResponse),
        (status = 400, description = "No file part in the request", body = crate::rest::ErrorResponse)
    )
)]
pub async fn upload_attachment(
    State(state): State<Arc<GatewayState>>,
    Extension(_user): Extension<AuthenticatedUser>,
    mut multipart: Multipart,
) -> GatewayResult<Json<AttachmentResponse>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| GatewayError::InvalidRequest(format!("invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("upload.bin").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| GatewayError::InvalidRequest(format!("invalid file field: {}", e)))?;

        let attachment = state
            .attachment_service
            .store(&file_name, &content_type, &bytes)
            .await?;

        return Ok(Json(AttachmentResponse::from_attachment(
            attachment,
            &state.media,
        )));
    }

    Err(GatewayError::InvalidRequest(
        "multipart request carried no file part".to_string(),
    ))
}

#[utoipa::path(
    get,
    path = "/api/attachments/{attachment_id}",
    tag = "attachments",
    params(("attachment_id" = i64, Path, description = "Attachment id")),
    responses(
        (status = 200, description = "Attachment metadata", body = AttachmentResponse),
        (status = 404, description = "Attachment not found", body = crate::rest::ErrorResponse)
    )
)]
pub async fn get_attachment(
    Path(attachment_id): Path<i64>,
    State(state): State<Arc<GatewayState>>,
    Extension(_user): Extension<AuthenticatedUser>,
) -> GatewayResult<Json<AttachmentResponse>> {
    let attachment = state.attachment_service.get(attachment_id).await?;

    Ok(Json(AttachmentResponse::from_attachment(
        attachment,
        &state.media,
    )))
}
