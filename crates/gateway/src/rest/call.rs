//! Call REST endpoints
//!
//! Calls are created against a conversation; the receiver is always
//! deduced as the other participant, and a receiver supplied by the
//! client is ignored as untrusted input. Status updates are restricted
//! to the call's two parties and must move forward through the status
//! machine.

use axum::{
    extract::{Path, State},
    routing::{patch, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use utoipa::ToSchema;

use crate::error::{GatewayError, GatewayResult};
use crate::state::GatewayState;
use mediline_auth::AuthenticatedUser;
use mediline_database::{CallStatus, CallType};

#[derive(Debug, Serialize, ToSchema)]
pub struct CallResponse {
    pub id: i64,
    pub conversation: i64,
    pub caller: i64,
    pub receiver: i64,
    pub call_type: String,
    pub call_status: String,
    pub start_time: String,
    pub end_time: Option<String>,
}

impl From<mediline_database::Call> for CallResponse {
    fn from(call: mediline_database::Call) -> Self {
        Self {
            id: call.id,
            conversation: call.conversation_id,
            caller: call.caller_id,
            receiver: call.receiver_id,
            call_type: call.call_type.to_string(),
            call_status: call.call_status.to_string(),
            start_time: call.start_time,
            end_time: call.end_time,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCallRequest {
    pub call_type: String,
    /// Accepted for wire compatibility but never trusted; the receiver
    /// is deduced from the conversation participants.
    pub receiver: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCallRequest {
    pub status: String,
}

/// Create call routes
pub fn create_call_routes() -> Router<Arc<GatewayState>> {
    Router::new()
        .route("/api/conversations/:conversation_id/calls", post(create_call))
        .route("/api/calls/:call_id", patch(update_call))
}

#[utoipa::path(
    post,
    path = "/api/conversations/{conversation_id}/calls",
    tag = "calls",
    params(("conversation_id" = i64, Path, description = "Conversation id")),
    request_body = CreateCallRequest,
    responses(
        (status = 200, description = "Call created in initiated status", body = CallResponse),
        (status = 403, description = "Caller is not a participant", body = crate::rest::ErrorResponse),
        (status = 404, description = "Conversation not found", body = crate::rest::ErrorResponse)
    )
)]
pub async fn create_call(
    Path(conversation_id): Path<i64>,
    State(state): State<Arc<GatewayState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<CreateCallRequest>,
) -> GatewayResult<Json<CallResponse>> {
    if let Some(receiver) = request.receiver {
        debug!(
            conversation_id,
            receiver, "ignoring client-supplied call receiver"
        );
    }

    let call_type = parse_call_type(&request.call_type)?;
    let call = state
        .call_service
        .create(conversation_id, user.id, call_type)
        .await?;

    Ok(Json(call.into()))
}

#[utoipa::path(
    patch,
    path = "/api/calls/{call_id}",
    tag = "calls",
    params(("call_id" = i64, Path, description = "Call id")),
    request_body = UpdateCallRequest,
    responses(
        (status = 200, description = "Call status updated, end time stamped on terminal statuses", body = CallResponse),
        (status = 403, description = "Actor is neither caller nor receiver", body = crate::rest::ErrorResponse),
        (status = 404, description = "Call not found", body = crate::rest::ErrorResponse),
        (status = 422, description = "Backward status transition", body = crate::rest::ErrorResponse)
    )
)]
pub async fn update_call(
    Path(call_id): Path<i64>,
    State(state): State<Arc<GatewayState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<UpdateCallRequest>,
) -> GatewayResult<Json<CallResponse>> {
    let status = parse_call_status(&request.status)?;
    let call = state
        .call_service
        .update_status(call_id, user.id, status)
        .await?;

    Ok(Json(call.into()))
}

fn parse_call_type(raw: &str) -> GatewayResult<CallType> {
    match raw {
        "video" => Ok(CallType::Video),
        "audio" => Ok(CallType::Audio),
        other => Err(GatewayError::InvalidRequest(format!(
            "unknown call type: {other}"
        ))),
    }
}

fn parse_call_status(raw: &str) -> GatewayResult<CallStatus> {
    match raw {
        "initiated" => Ok(CallStatus::Initiated),
        "ongoing" => Ok(CallStatus::Ongoing),
        "completed" => Ok(CallStatus::Completed),
        "missed" => Ok(CallStatus::Missed),
        "rejected" => Ok(CallStatus::Rejected),
        other => Err(GatewayError::InvalidRequest(format!(
            "unknown call status: {other}"
        ))),
    }
}
