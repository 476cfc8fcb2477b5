//! In-process room registry for WebSocket fan-out.
//!
//! A room is an in-memory broadcast group keyed by conversation or call
//! id; the two key namespaces are disjoint. Rooms exist from the first
//! join until the last member leaves. Each member owns an unbounded
//! outbound queue drained by its connection's writer task, which gives
//! per-member FIFO delivery in broadcast-call order.
//!
//! The registry lock guards the map only: broadcasts serialize the frame
//! once, snapshot the member queues under the read lock, and send after
//! the lock is released. No lock is ever held across an await point.

use std::collections::HashMap;

use axum::extract::ws::Message;
use serde::Serialize;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, warn};
use uuid::Uuid;

/// Key of a broadcast room. Conversation rooms and call rooms never
/// collide even for equal ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoomKey {
    Conversation(i64),
    Call(i64),
}

impl std::fmt::Display for RoomKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoomKey::Conversation(id) => write!(f, "conversation:{id}"),
            RoomKey::Call(id) => write!(f, "call:{id}"),
        }
    }
}

/// A live connection's handle within a room. The registry holds the
/// outbound queue sender only; the connection task owns the socket.
#[derive(Debug, Clone)]
pub struct RoomMember {
    pub connection_id: Uuid,
    pub user_id: i64,
    sender: mpsc::UnboundedSender<Message>,
}

impl RoomMember {
    pub fn new(connection_id: Uuid, user_id: i64, sender: mpsc::UnboundedSender<Message>) -> Self {
        Self {
            connection_id,
            user_id,
            sender,
        }
    }
}

/// Process-wide mapping from room keys to their current members.
#[derive(Default)]
pub struct RoomRegistry {
    rooms: RwLock<HashMap<RoomKey, HashMap<Uuid, RoomMember>>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a member to a room, creating the room on first join.
    /// Idempotent per connection id.
    pub async fn join(&self, key: RoomKey, member: RoomMember) {
        let mut rooms = self.rooms.write().await;
        let room = rooms.entry(key).or_default();
        let connection_id = member.connection_id;
        room.entry(connection_id).or_insert(member);
        debug!(room = %key, connection_id = %connection_id, members = room.len(), "member joined room");
    }

    /// Remove a member from a room; empty rooms are reaped so the map
    /// never grows unboundedly.
    pub async fn leave(&self, key: RoomKey, connection_id: Uuid) {
        let mut rooms = self.rooms.write().await;
        if let Some(room) = rooms.get_mut(&key) {
            room.remove(&connection_id);
            debug!(room = %key, connection_id = %connection_id, members = room.len(), "member left room");
            if room.is_empty() {
                rooms.remove(&key);
            }
        }
    }

    /// Number of members currently in a room.
    pub async fn member_count(&self, key: RoomKey) -> usize {
        self.rooms
            .read()
            .await
            .get(&key)
            .map(|room| room.len())
            .unwrap_or(0)
    }

    /// Broadcast a frame to every member of a room. Broadcasting to a
    /// room with no members is a no-op.
    pub async fn broadcast<T: Serialize>(&self, key: RoomKey, frame: &T) {
        self.broadcast_internal(key, None, frame).await;
    }

    /// Broadcast a frame to every member of a room except the named
    /// connection. Exclusion compares connection handles, not user ids:
    /// a user's other tabs still receive the frame.
    pub async fn broadcast_except<T: Serialize>(&self, key: RoomKey, except: Uuid, frame: &T) {
        self.broadcast_internal(key, Some(except), frame).await;
    }

    async fn broadcast_internal<T: Serialize>(&self, key: RoomKey, except: Option<Uuid>, frame: &T) {
        let text = match serde_json::to_string(frame) {
            Ok(text) => text,
            Err(error) => {
                warn!(room = %key, %error, "failed to serialize broadcast frame");
                return;
            }
        };

        let recipients: Vec<mpsc::UnboundedSender<Message>> = {
            let rooms = self.rooms.read().await;
            match rooms.get(&key) {
                Some(room) => room
                    .values()
                    .filter(|member| except != Some(member.connection_id))
                    .map(|member| member.sender.clone())
                    .collect(),
                None => return,
            }
        };

        for sender in recipients {
            // A closed queue only means the member is mid-disconnect; its
            // leave() is already on the way.
            let _ = sender.send(Message::Text(text.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn member(user_id: i64) -> (RoomMember, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (RoomMember::new(Uuid::new_v4(), user_id, tx), rx)
    }

    fn text_of(message: Message) -> String {
        match message {
            Message::Text(text) => text,
            other => panic!("expected text frame, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn join_and_leave_track_member_counts() {
        let registry = RoomRegistry::new();
        let key = RoomKey::Conversation(42);

        let (alice, _alice_rx) = member(1);
        let (bob, _bob_rx) = member(2);
        let alice_id = alice.connection_id;

        registry.join(key, alice.clone()).await;
        registry.join(key, bob).await;
        assert_eq!(registry.member_count(key).await, 2);

        // Joining the same connection twice does not double-count.
        registry.join(key, alice).await;
        assert_eq!(registry.member_count(key).await, 2);

        registry.leave(key, alice_id).await;
        assert_eq!(registry.member_count(key).await, 1);

        // Leaving a room one is not in is harmless.
        registry.leave(key, alice_id).await;
        assert_eq!(registry.member_count(key).await, 1);
    }

    #[tokio::test]
    async fn conversation_and_call_namespaces_are_disjoint() {
        let registry = RoomRegistry::new();
        let (alice, _rx) = member(1);

        registry.join(RoomKey::Conversation(7), alice).await;

        assert_eq!(registry.member_count(RoomKey::Conversation(7)).await, 1);
        assert_eq!(registry.member_count(RoomKey::Call(7)).await, 0);
    }

    #[tokio::test]
    async fn empty_rooms_are_reaped() {
        let registry = RoomRegistry::new();
        let key = RoomKey::Call(9);

        let (alice, _rx) = member(1);
        let alice_id = alice.connection_id;
        registry.join(key, alice).await;
        registry.leave(key, alice_id).await;

        assert!(registry.rooms.read().await.is_empty());
    }

    #[tokio::test]
    async fn broadcast_reaches_every_member_in_order() {
        let registry = RoomRegistry::new();
        let key = RoomKey::Conversation(1);

        let (alice, mut alice_rx) = member(1);
        let (bob, mut bob_rx) = member(2);
        registry.join(key, alice).await;
        registry.join(key, bob).await;

        registry.broadcast(key, &json!({"seq": 1})).await;
        registry.broadcast(key, &json!({"seq": 2})).await;

        for rx in [&mut alice_rx, &mut bob_rx] {
            let first = text_of(rx.try_recv().unwrap());
            let second = text_of(rx.try_recv().unwrap());
            assert!(first.contains("\"seq\":1"));
            assert!(second.contains("\"seq\":2"));
            assert!(rx.try_recv().is_err());
        }
    }

    #[tokio::test]
    async fn broadcast_except_suppresses_only_the_originating_connection() {
        let registry = RoomRegistry::new();
        let key = RoomKey::Call(3);

        // Two connections of the same user plus one other user: exclusion
        // is by connection handle, so the user's second tab still hears
        // the frame.
        let (caller_tab, mut caller_tab_rx) = member(1);
        let (other_tab, mut other_tab_rx) = member(1);
        let (callee, mut callee_rx) = member(2);
        let caller_connection = caller_tab.connection_id;

        registry.join(key, caller_tab).await;
        registry.join(key, other_tab).await;
        registry.join(key, callee).await;

        registry
            .broadcast_except(key, caller_connection, &json!({"type": "webrtc_offer"}))
            .await;

        assert!(caller_tab_rx.try_recv().is_err());
        assert!(other_tab_rx.try_recv().is_ok());
        assert!(callee_rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn broadcast_to_missing_room_is_a_noop() {
        let registry = RoomRegistry::new();

        // Nothing joined; must not panic or create the room.
        registry
            .broadcast(RoomKey::Conversation(404), &json!({"type": "message"}))
            .await;
        assert_eq!(registry.member_count(RoomKey::Conversation(404)).await, 0);
        assert!(registry.rooms.read().await.is_empty());
    }

    #[tokio::test]
    async fn departed_members_receive_no_further_broadcasts() {
        let registry = RoomRegistry::new();
        let key = RoomKey::Conversation(5);

        let (alice, mut alice_rx) = member(1);
        let (bob, mut bob_rx) = member(2);
        let alice_id = alice.connection_id;
        registry.join(key, alice).await;
        registry.join(key, bob).await;

        registry.broadcast(key, &json!({"seq": 1})).await;
        registry.leave(key, alice_id).await;
        registry.broadcast(key, &json!({"seq": 2})).await;

        assert!(text_of(alice_rx.try_recv().unwrap()).contains("\"seq\":1"));
        assert!(alice_rx.try_recv().is_err(), "no frames after leaving");

        assert!(text_of(bob_rx.try_recv().unwrap()).contains("\"seq\":1"));
        assert!(text_of(bob_rx.try_recv().unwrap()).contains("\"seq\":2"));
    }
}
