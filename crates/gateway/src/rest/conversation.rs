//! Conversation REST endpoints

use axum::{
    extract::{Path, State},
    routing::get,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::error::GatewayResult;
use crate::state::GatewayState;
use mediline_auth::AuthenticatedUser;
use mediline_conversations::HistoryItem;

#[derive(Debug, Serialize, ToSchema)]
pub struct ConversationResponse {
    pub id: i64,
    pub patient: i64,
    pub doctor: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<mediline_database::Conversation> for ConversationResponse {
    fn from(conversation: mediline_database::Conversation) -> Self {
        Self {
            id: conversation.id,
            patient: conversation.patient_id,
            doctor: conversation.doctor_id,
            created_at: conversation.created_at,
            updated_at: conversation.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateConversationRequest {
    pub patient: i64,
    pub doctor: i64,
}

/// Create conversation routes
pub fn create_conversation_routes() -> Router<Arc<GatewayState>> {
    Router::new()
        .route(
            "/api/conversations",
            get(list_conversations).post(create_conversation),
        )
        .route("/api/conversations/:conversation_id", get(get_conversation))
        .route(
            "/api/conversations/:conversation_id/history",
            get(conversation_history),
        )
}

#[utoipa::path(
    get,
    path = "/api/conversations",
    tag = "conversations",
    responses(
        (status = 200, description = "Conversations the caller participates in", body = Vec<ConversationResponse>),
        (status = 401, description = "Unauthorized", body = crate::rest::ErrorResponse)
    )
)]
pub async fn list_conversations(
    State(state): State<Arc<GatewayState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> GatewayResult<Json<Vec<ConversationResponse>>> {
    let conversations = state.conversation_service.list_for_user(user.id).await?;

    Ok(Json(conversations.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/api/conversations",
    tag = "conversations",
    request_body = CreateConversationRequest,
    responses(
        (status = 200, description = "Conversation created", body = ConversationResponse),
        (status = 400, description = "Participants have the wrong roles", body = crate::rest::ErrorResponse),
        (status = 404, description = "Participant not found", body = crate::rest::ErrorResponse)
    )
)]
pub async fn create_conversation(
    State(state): State<Arc<GatewayState>>,
    Extension(_user): Extension<AuthenticatedUser>,
    Json(request): Json<CreateConversationRequest>,
) -> GatewayResult<Json<ConversationResponse>> {
    let conversation = state
        .conversation_service
        .create(request.patient, request.doctor)
        .await?;

    Ok(Json(conversation.into()))
}

#[utoipa::path(
    get,
    path = "/api/conversations/{conversation_id}",
    tag = "conversations",
    params(("conversation_id" = i64, Path, description = "Conversation id")),
    responses(
        (status = 200, description = "Conversation detail", body = ConversationResponse),
        (status = 403, description = "Caller is not a participant", body = crate::rest::ErrorResponse),
        (status = 404, description = "Conversation not found", body = crate::rest::ErrorResponse)
    )
)]
pub async fn get_conversation(
    Path(conversation_id): Path<i64>,
    State(state): State<Arc<GatewayState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> GatewayResult<Json<ConversationResponse>> {
    let conversation = state
        .conversation_service
        .get_checked(conversation_id, user.id)
        .await?;

    Ok(Json(conversation.into()))
}

/// Merged message + call history, ascending by timestamp, each entry
/// tagged `"message"` or `"call"`.
#[utoipa::path(
    get,
    path = "/api/conversations/{conversation_id}/history",
    tag = "conversations",
    params(("conversation_id" = i64, Path, description = "Conversation id")),
    responses(
        (status = 200, description = "Merged message and call timeline"),
        (status = 403, description = "Caller is not a participant", body = crate::rest::ErrorResponse),
        (status = 404, description = "Conversation not found", body = crate::rest::ErrorResponse)
    )
)]
pub async fn conversation_history(
    Path(conversation_id): Path<i64>,
    State(state): State<Arc<GatewayState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> GatewayResult<Json<Vec<HistoryItem>>> {
    let history = state
        .conversation_service
        .history(conversation_id, user.id)
        .await?;

    Ok(Json(history))
}
