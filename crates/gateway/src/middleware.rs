//! Middleware for authentication and other cross-cutting concerns

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::error::GatewayError;
use crate::state::GatewayState;
use mediline_auth::AuthenticatedUser;

/// Authentication middleware for the REST surface. Validates the bearer
/// token from the `Authorization` header and stores the resolved
/// identity in the request extensions. (WebSocket handshakes carry their
/// token as a query parameter and authenticate in the session instead.)
pub async fn auth_middleware(
    State(state): State<Arc<GatewayState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "));

    let token = token.ok_or_else(|| {
        GatewayError::AuthenticationFailed("missing authentication token".to_string())
    })?;

    let user: AuthenticatedUser = state
        .authenticator
        .authenticate_token(token)
        .await
        .map_err(|e| GatewayError::AuthenticationFailed(format!("invalid token: {}", e)))?;

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Logging middleware for request/response logging
pub async fn logging_middleware(
    request: Request,
    next: Next,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let method = request.method().clone();
    let uri = request.uri().clone();

    let start = std::time::Instant::now();
    let response = next.run(request).await;
    let duration = start.elapsed();

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %response.status(),
        duration_ms = duration.as_millis(),
        "request completed"
    );

    Ok(response)
}
