//! Authenticated-identity endpoint

use axum::{extract::State, routing::get, Extension, Json, Router};
use std::sync::Arc;

use crate::error::GatewayResult;
use crate::state::GatewayState;
use mediline_auth::AuthenticatedUser;
use mediline_users::SenderProfile;

/// Create auth routes
pub fn create_auth_routes() -> Router<Arc<GatewayState>> {
    Router::new().route("/api/me", get(me))
}

/// The caller's own profile, in the same shape chat broadcasts use.
#[utoipa::path(
    get,
    path = "/api/me",
    tag = "auth",
    responses(
        (status = 200, description = "The authenticated user's profile"),
        (status = 401, description = "Unauthorized", body = crate::rest::ErrorResponse)
    )
)]
pub async fn me(
    State(state): State<Arc<GatewayState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> GatewayResult<Json<SenderProfile>> {
    let profile = state.profile_service.sender_profile(user.id).await?;

    Ok(Json(profile))
}
