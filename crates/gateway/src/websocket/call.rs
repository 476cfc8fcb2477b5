//! Call-signaling WebSocket sessions.
//!
//! A call session relays WebRTC negotiation payloads (offer, answer,
//! ICE candidates) between the members of a call room. Relays suppress
//! the originating connection — compared by connection handle, not user
//! id, since one user may hold several tabs. The first offer relayed on
//! a connection additionally alerts the parent conversation room with a
//! `call_notification` frame so chat participants not yet in the call
//! room learn about the call.

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
use crate::websocket::frames::{ClientFrame, ServerFrame};
use crate::websocket::rooms::{RoomKey, RoomMember};
use crate::websocket::{authenticate_or_close, token_from_query};
use mediline_auth::AuthenticatedUser;

/// Call-signaling WebSocket connection handler
pub async fn call_websocket_handler(
    ws: WebSocketUpgrade,
    Path(call_id): Path<i64>,
    RawQuery(query): RawQuery,
    State(state): State<Arc<GatewayState>>,
) -> Response {
    let token = query.as_deref().and_then(token_from_query);
    ws.on_upgrade(move |socket| handle_call_socket(socket, state, call_id, token))
}

async fn handle_call_socket(
    mut socket: WebSocket,
    state: Arc<GatewayState>,
    call_id: i64,
    token: Option<String>,
) {
    let Some(user) = authenticate_or_close(&state, &mut socket, token).await else {
        return;
    };

    let connection_id = Uuid::new_v4();
    let room = RoomKey::Call(call_id);
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel();

    state
        .rooms
        .join(room, RoomMember::new(connection_id, user.id, outbound_tx))
        .await;

    info!(
        call_id,
        user_id = user.id,
        connection_id = %connection_id,
        "call-signaling connection established"
    );

    let (mut sink, mut stream) = socket.split();

    let writer = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sink.send(message).await.is_err() {
                break;
            }
        }
    });

    // Only the first offer on this connection notifies the conversation
    // room.
    let mut first_offer_sent = false;

    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Text(text)) => {
                handle_signaling_frame(
                    &state,
                    &user,
                    call_id,
                    connection_id,
                    &text,
                    &mut first_offer_sent,
                )
                .await;
            }
            Ok(Message::Close(_)) | Err(_) => break,
            _ => {}
        }
    }

    state.rooms.leave(room, connection_id).await;
    writer.abort();

    info!(
        call_id,
        user_id = user.id,
        connection_id = %connection_id,
        "call-signaling connection closed"
    );
}

async fn handle_signaling_frame(
    state: &GatewayState,
    user: &AuthenticatedUser,
    call_id: i64,
    connection_id: Uuid,
    text: &str,
    first_offer_sent: &mut bool,
) {
    let frame = match serde_json::from_str::<ClientFrame>(text) {
        Ok(frame) => frame,
        Err(error) => {
            debug!(call_id, %error, "dropping unrecognized signaling frame");
            return;
        }
    };

    let room = RoomKey::Call(call_id);

    match frame {
        ClientFrame::WebrtcOffer {
            offer,
            conversation_id,
        } => {
            relay(state, room, connection_id, ServerFrame::WebrtcOffer {
                offer,
                sender: user.id,
            })
            .await;

            if !*first_offer_sent {
                *first_offer_sent = true;
                notify_conversation(state, user, call_id, conversation_id).await;
            }
        }
        ClientFrame::WebrtcAnswer {
            answer,
            conversation_id: _,
        } => {
            relay(state, room, connection_id, ServerFrame::WebrtcAnswer {
                answer,
                sender: user.id,
            })
            .await;
        }
        ClientFrame::WebrtcIceCandidate {
            candidate,
            conversation_id: _,
        } => {
            relay(state, room, connection_id, ServerFrame::WebrtcIceCandidate {
                candidate,
                sender: user.id,
            })
            .await;
        }
        ClientFrame::ChatMessage { .. } | ClientFrame::CallMessage { .. } => {
            debug!(
                call_id,
                user_id = user.id,
                "dropping chat frame on call-signaling connection"
            );
        }
    }
}

/// Relay a signaling frame to the call room, never echoing it back to
/// the connection it came from.
async fn relay(state: &GatewayState, room: RoomKey, connection_id: Uuid, frame: ServerFrame) {
    state.rooms.broadcast_except(room, connection_id, &frame).await;
}

/// Push a `call_notification` into the parent conversation room. The
/// conversation id travels alongside the signaling payload; without it
/// there is no room to notify.
async fn notify_conversation(
    state: &GatewayState,
    user: &AuthenticatedUser,
    call_id: i64,
    conversation_id: Option<i64>,
) {
    let Some(conversation_id) = conversation_id else {
        debug!(call_id, "offer carried no conversation id, skipping call notification");
        return;
    };

    let caller = match state.profile_service.sender_profile(user.id).await {
        Ok(profile) => profile,
        Err(error) => {
            warn!(call_id, user_id = user.id, %error, "failed to serialize caller for notification");
            return;
        }
    };

    state
        .rooms
        .broadcast(
            RoomKey::Conversation(conversation_id),
            &ServerFrame::CallNotification {
                caller,
                call: call_id,
            },
        )
        .await;
}
