//! # Mediline Gateway Crate
//!
//! This crate provides the connection-handling layer for Mediline: REST
//! endpoints for conversations, messages, attachments, and calls, plus
//! the realtime WebSocket subsystem (conversation chat sessions,
//! call-signaling sessions, and the in-process room registry they fan
//! out through).
//!
//! ## Architecture
//!
//! - **REST**: HTTP API endpoints with OpenAPI documentation
//! - **WebSocket**: per-connection chat and call-signaling sessions
//! - **State**: shared services and the injectable room registry
//! - **Middleware**: bearer-token authentication, CORS, request logging

pub mod error;
pub mod middleware;
pub mod rest;
pub mod state;
pub mod websocket;

// Re-export main types for convenience
pub use error::{GatewayError, GatewayResult};
pub use state::GatewayState;
pub use websocket::rooms::{RoomKey, RoomMember, RoomRegistry};

use axum::{http::Method, middleware as axum_middleware, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

/// Create the main application router with all routes
pub fn create_router(state: GatewayState) -> Router {
    let arc_state = Arc::new(state);

    #[allow(unused_mut)]
    let mut router = Router::new()
        // REST API routes
        .merge(rest::create_rest_routes(arc_state.clone()).with_state(arc_state.clone()))
        // WebSocket routes
        .merge(websocket::create_websocket_routes().with_state(arc_state))
        // CORS middleware
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
                .allow_headers(Any),
        )
        // Logging middleware
        .layer(axum_middleware::from_fn(middleware::logging_middleware));

    // Add Swagger UI in debug builds
    #[cfg(debug_assertions)]
    {
        #[derive(OpenApi)]
        #[openapi(
            paths(
                rest::health::health_check,
                rest::auth::me,
                rest::conversation::list_conversations,
                rest::conversation::create_conversation,
                rest::conversation::get_conversation,
                rest::conversation::conversation_history,
                rest::message::create_message,
                rest::attachment::upload_attachment,
                rest::attachment::get_attachment,
                rest::call::create_call,
                rest::call::update_call,
            ),
            components(
                schemas(
                    rest::ErrorResponse,
                    rest::conversation::ConversationResponse,
                    rest::conversation::CreateConversationRequest,
                    rest::message::MessageResponse,
                    rest::attachment::AttachmentResponse,
                    rest::call::CallResponse,
                    rest::call::CreateCallRequest,
                    rest::call::UpdateCallRequest,
                )
            ),
            tags(
                (name = "health", description = "Liveness probes"),
                (name = "auth", description = "Authenticated identity"),
                (name = "conversations", description = "Conversation management and history"),
                (name = "messages", description = "Message creation with inline attachments"),
                (name = "attachments", description = "Two-phase attachment upload"),
                (name = "calls", description = "Call creation and status updates"),
            )
        )]
        struct ApiDoc;

        router = router
            .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));
    }

    router
}
