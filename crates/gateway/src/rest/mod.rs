//! REST endpoints for the gateway

pub mod attachment;
pub mod auth;
pub mod call;
pub mod conversation;
pub mod health;
pub mod message;

use axum::{middleware as axum_middleware, routing::get, Router};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::middleware::auth_middleware;
use crate::state::GatewayState;

/// Error body returned by REST endpoints
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Create all REST routes
pub fn create_rest_routes(state: Arc<GatewayState>) -> Router<Arc<GatewayState>> {
    let protected = Router::new()
        .merge(auth::create_auth_routes())
        .merge(conversation::create_conversation_routes())
        .merge(message::create_message_routes())
        .merge(attachment::create_attachment_routes())
        .merge(call::create_call_routes())
        .layer(axum_middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/health", get(health::health_check))
        .merge(protected)
}
