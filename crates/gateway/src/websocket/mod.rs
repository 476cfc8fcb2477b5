//! WebSocket endpoints for the gateway
//!
//! Two kinds of persistent connections exist: chat connections joined to
//! a conversation room, and call-signaling connections joined to a call
//! room. Both authenticate out-of-band via a `token` query parameter
//! before any room join; a failed handshake is closed with application
//! close code 4001.

pub mod call;
pub mod conversation;
pub mod frames;
pub mod rooms;

use std::borrow::Cow;
use std::sync::Arc;

use axum::{
    extract::ws::{CloseFrame, Message, WebSocket},
    routing::get,
    Router,
};
use tracing::warn;

use crate::state::GatewayState;
use mediline_auth::AuthenticatedUser;

/// Application close code used when a connection fails authentication.
pub const AUTH_FAILURE_CLOSE_CODE: u16 = 4001;

/// Create all WebSocket routes
pub fn create_websocket_routes() -> Router<Arc<GatewayState>> {
    Router::new()
        // Chat connections; clients historically include the trailing slash.
        .route(
            "/conversation/:conversation_id",
            get(conversation::conversation_websocket_handler),
        )
        .route(
            "/conversation/:conversation_id/",
            get(conversation::conversation_websocket_handler),
        )
        // Call-signaling connections
        .route("/call/:call_id", get(call::call_websocket_handler))
        .route("/call/:call_id/", get(call::call_websocket_handler))
}

/// Extract the `token` parameter from a raw query string, tolerating
/// unrelated parameters in arbitrary order.
pub(crate) fn token_from_query(query: &str) -> Option<String> {
    query.split('&').find_map(|pair| {
        let mut parts = pair.splitn(2, '=');
        match (parts.next(), parts.next()) {
            (Some("token"), Some(value)) => Some(value.to_string()),
            _ => None,
        }
    })
}

/// Authenticate the handshake token, or close the freshly-upgraded
/// socket with code 4001. Runs before any room join, so a refused
/// connection never appears in the registry.
pub(crate) async fn authenticate_or_close(
    state: &GatewayState,
    socket: &mut WebSocket,
    token: Option<String>,
) -> Option<AuthenticatedUser> {
    let result = match token {
        Some(token) => state.authenticator.authenticate_token(&token).await,
        None => Err(mediline_auth::AuthError::MissingToken),
    };

    match result {
        Ok(user) => Some(user),
        Err(error) => {
            warn!(%error, "websocket authentication failed, closing connection");
            let _ = socket
                .send(Message::Close(Some(CloseFrame {
                    code: AUTH_FAILURE_CLOSE_CODE,
                    reason: Cow::from("authentication failed"),
                })))
                .await;
            None
        }
    }
}
