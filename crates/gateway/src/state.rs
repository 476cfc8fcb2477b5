//! Shared application state for the gateway

use std::sync::Arc;

use mediline_auth::Authenticator;
use mediline_config::{AppConfig, AuthConfig, MediaConfig};
use mediline_conversations::{
    AttachmentService, CallService, ConversationService, MessageService,
};
use mediline_users::ProfileService;
use sqlx::SqlitePool;

use crate::error::{GatewayError, GatewayResult};
use crate::websocket::rooms::RoomRegistry;

/// Shared application state containing all services and the room
/// registry. The registry is owned here and passed by reference to each
/// session; nothing in the process reaches it as ambient global state.
#[derive(Clone)]
pub struct GatewayState {
    /// Database connection pool
    pub pool: SqlitePool,
    /// Media storage configuration (base URL + storage directory)
    pub media: MediaConfig,
    /// Connection authenticator
    pub authenticator: Authenticator,
    /// Conversation service
    pub conversation_service: Arc<ConversationService>,
    /// Message service
    pub message_service: Arc<MessageService>,
    /// Attachment service
    pub attachment_service: Arc<AttachmentService>,
    /// Call service
    pub call_service: Arc<CallService>,
    /// Sender profile serialization service
    pub profile_service: Arc<ProfileService>,
    /// In-process room registry for WebSocket fan-out
    pub rooms: Arc<RoomRegistry>,
}

impl GatewayState {
    /// Create a new gateway state with all services initialized
    pub fn new(pool: SqlitePool, auth: AuthConfig, media: MediaConfig) -> Self {
        let authenticator = Authenticator::new(pool.clone(), auth);

        let conversation_service =
            Arc::new(ConversationService::new(pool.clone(), media.clone()));
        let message_service = Arc::new(MessageService::new(pool.clone(), media.clone()));
        let attachment_service = Arc::new(AttachmentService::new(pool.clone(), media.clone()));
        let call_service = Arc::new(CallService::new(pool.clone()));
        let profile_service = Arc::new(ProfileService::new(pool.clone(), media.clone()));

        Self {
            pool,
            media,
            authenticator,
            conversation_service,
            message_service,
            attachment_service,
            call_service,
            profile_service,
            rooms: Arc::new(RoomRegistry::new()),
        }
    }

    /// Create gateway state from the application configuration
    pub async fn from_config(config: &AppConfig) -> GatewayResult<Self> {
        let pool = mediline_database::initialize_database(&config.database)
            .await
            .map_err(|e| {
                GatewayError::DatabaseError(format!("failed to initialize database: {}", e))
            })?;

        Ok(Self::new(pool, config.auth.clone(), config.media.clone()))
    }
}
