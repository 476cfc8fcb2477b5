//! Conversation (chat) WebSocket sessions.
//!
//! One session per accepted connection. Lifecycle: authenticate during
//! the handshake, join the conversation room, dispatch inbound frames,
//! and leave the room on disconnect. Frame-level failures are isolated:
//! a message that cannot be persisted is logged and dropped without a
//! broadcast, and the connection stays open.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, RawQuery, State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::state::GatewayState;
use crate::websocket::frames::{AttachmentRef, ClientFrame, ServerFrame};
use crate::websocket::rooms::{RoomKey, RoomMember};
use crate::websocket::{authenticate_or_close, token_from_query};
use mediline_auth::AuthenticatedUser;

/// Conversation WebSocket connection handler
pub async fn conversation_websocket_handler(
    ws: WebSocketUpgrade,
    Path(conversation_id): Path<i64>,
    RawQuery(query): RawQuery,
    State(state): State<Arc<GatewayState>>,
) -> Response {
    let token = query.as_deref().and_then(token_from_query);
    ws.on_upgrade(move |socket| handle_conversation_socket(socket, state, conversation_id, token))
}

async fn handle_conversation_socket(
    mut socket: WebSocket,
    state: Arc<GatewayState>,
    conversation_id: i64,
    token: Option<String>,
) {
    let Some(user) = authenticate_or_close(&state, &mut socket, token).await else {
        return;
    };

    let connection_id = Uuid::new_v4();
    let room = RoomKey::Conversation(conversation_id);
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel();

    state
        .rooms
        .join(room, RoomMember::new(connection_id, user.id, outbound_tx))
        .await;

    info!(
        conversation_id,
        user_id = user.id,
        connection_id = %connection_id,
        "chat connection established"
    );

    let (mut sink, mut stream) = socket.split();

    // Writer task: drains the member's outbound queue in FIFO order.
    let writer = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sink.send(message).await.is_err() {
                break;
            }
        }
    });

    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Text(text)) => {
                handle_frame(&state, &user, conversation_id, &text).await;
            }
            Ok(Message::Close(_)) | Err(_) => break,
            _ => {}
        }
    }

    // Leave before anything else so a departed member never receives
    // further broadcasts.
    state.rooms.leave(room, connection_id).await;
    writer.abort();

    info!(
        conversation_id,
        user_id = user.id,
        connection_id = %connection_id,
        "chat connection closed"
    );
}

async fn handle_frame(
    state: &GatewayState,
    user: &AuthenticatedUser,
    conversation_id: i64,
    text: &str,
) {
    let frame = match serde_json::from_str::<ClientFrame>(text) {
        Ok(frame) => frame,
        Err(error) => {
            debug!(conversation_id, %error, "dropping unrecognized frame");
            return;
        }
    };

    match frame {
        ClientFrame::ChatMessage {
            text,
            sender,
            attachments,
        } => {
            handle_chat_message(state, user, conversation_id, text, sender, attachments).await;
        }
        ClientFrame::CallMessage { call_data } => {
            // Opaque passthrough: how an independent call session alerts
            // chat participants.
            state
                .rooms
                .broadcast(
                    RoomKey::Conversation(conversation_id),
                    &ServerFrame::NewCall { call: call_data },
                )
                .await;
        }
        ClientFrame::WebrtcOffer { .. }
        | ClientFrame::WebrtcAnswer { .. }
        | ClientFrame::WebrtcIceCandidate { .. } => {
            debug!(
                conversation_id,
                user_id = user.id,
                "dropping signaling frame on chat connection"
            );
        }
    }
}

async fn handle_chat_message(
    state: &GatewayState,
    user: &AuthenticatedUser,
    conversation_id: i64,
    text: String,
    sender: Option<i64>,
    attachments: Vec<AttachmentRef>,
) {
    let sender_id = sender.unwrap_or(user.id);

    let message = match state
        .message_service
        .create_message(conversation_id, sender_id, &text)
        .await
    {
        Ok(message) => message,
        Err(error) => {
            // No partial frames: nothing is broadcast when persistence
            // fails, and the connection survives.
            warn!(conversation_id, sender_id, %error, "failed to persist chat message");
            return;
        }
    };

    let attachment_ids: Vec<i64> = attachments.iter().map(|reference| reference.id).collect();
    if let Err(error) = state
        .message_service
        .link_attachments(message.id, &attachment_ids)
        .await
    {
        warn!(message_id = message.id, %error, "failed to link attachments");
    }

    let attachments = match state.message_service.attachments_for(message.id).await {
        Ok(attachments) => attachments,
        Err(error) => {
            warn!(message_id = message.id, %error, "failed to load attachments for broadcast");
            Vec::new()
        }
    };

    // The sender identity is resolved fresh from the store for every
    // message, never cached on the connection.
    let sender_profile = match state.profile_service.sender_profile(sender_id).await {
        Ok(profile) => profile,
        Err(error) => {
            warn!(sender_id, %error, "failed to serialize message sender");
            return;
        }
    };

    let frame = ServerFrame::Message {
        id: message.id,
        text: message.text.clone(),
        sender: sender_profile,
        timestamp: message.timestamp.clone(),
        attachments,
        conversation: conversation_id,
    };

    // Chat messages echo back to the sender: seeing the broadcast is the
    // persistence confirmation.
    state
        .rooms
        .broadcast(RoomKey::Conversation(conversation_id), &frame)
        .await;
}
