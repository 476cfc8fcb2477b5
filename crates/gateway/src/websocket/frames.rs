//! Wire frames exchanged over WebSocket connections.
//!
//! Inbound frames are tagged by an `action` field, outbound frames by a
//! `type` field. The protocol is permissive: a frame whose action is
//! unknown simply fails to parse and is dropped by the session.

use mediline_conversations::AttachmentInfo;
use mediline_users::SenderProfile;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reference to a previously-uploaded attachment inside a `chat_message`
/// frame.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AttachmentRef {
    pub id: i64,
}

/// Frames received from clients.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientFrame {
    /// A chat message to persist and broadcast.
    ChatMessage {
        #[serde(default)]
        text: String,
        /// Sender id carried in the payload; sessions fall back to the
        /// authenticated user when absent.
        sender: Option<i64>,
        #[serde(default)]
        attachments: Vec<AttachmentRef>,
    },
    /// An opaque call event relayed verbatim to the conversation room.
    CallMessage {
        #[serde(rename = "callData", default)]
        call_data: Value,
    },
    /// WebRTC SDP offer relayed within a call room.
    WebrtcOffer {
        offer: Value,
        #[serde(rename = "conversationId")]
        conversation_id: Option<i64>,
    },
    /// WebRTC SDP answer relayed within a call room.
    WebrtcAnswer {
        answer: Value,
        #[serde(rename = "conversationId")]
        conversation_id: Option<i64>,
    },
    /// ICE candidate relayed within a call room.
    WebrtcIceCandidate {
        candidate: Value,
        #[serde(rename = "conversationId")]
        conversation_id: Option<i64>,
    },
}

/// Frames pushed to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    /// A persisted chat message, echoed to every room member including
    /// the sender.
    Message {
        id: i64,
        text: String,
        sender: SenderProfile,
        timestamp: String,
        attachments: Vec<AttachmentInfo>,
        conversation: i64,
    },
    /// An opaque call event forwarded into a conversation room.
    NewCall { call: Value },
    /// Alert to chat participants that a call has started.
    CallNotification { caller: SenderProfile, call: i64 },
    WebrtcOffer { offer: Value, sender: i64 },
    WebrtcAnswer { answer: Value, sender: i64 },
    WebrtcIceCandidate { candidate: Value, sender: i64 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediline_database::AccountType;
    use serde_json::json;

    fn sender_profile() -> SenderProfile {
        SenderProfile {
            id: 10,
            username: "paula".to_string(),
            first_name: "Paula".to_string(),
            last_name: "Stone".to_string(),
            email: "paula@example.com".to_string(),
            account_type: AccountType::Patient,
            profile_pic: None,
        }
    }

    #[test]
    fn chat_message_frame_parses_with_optional_fields() {
        let frame: ClientFrame = serde_json::from_str(
            r#"{"action":"chat_message","text":"hi","sender":10,"attachments":[{"id":3}]}"#,
        )
        .unwrap();

        match frame {
            ClientFrame::ChatMessage {
                text,
                sender,
                attachments,
            } => {
                assert_eq!(text, "hi");
                assert_eq!(sender, Some(10));
                assert_eq!(attachments.len(), 1);
                assert_eq!(attachments[0].id, 3);
            }
            other => panic!("unexpected frame {other:?}"),
        }

        // Attachments and sender may be omitted entirely.
        let frame: ClientFrame =
            serde_json::from_str(r#"{"action":"chat_message","text":"hi"}"#).unwrap();
        assert!(matches!(
            frame,
            ClientFrame::ChatMessage { sender: None, .. }
        ));
    }

    #[test]
    fn signaling_frames_parse_with_camel_case_keys() {
        let frame: ClientFrame = serde_json::from_str(
            r#"{"action":"webrtc_offer","offer":{"sdp":"v=0"},"conversationId":42}"#,
        )
        .unwrap();

        match frame {
            ClientFrame::WebrtcOffer {
                offer,
                conversation_id,
            } => {
                assert_eq!(offer["sdp"], "v=0");
                assert_eq!(conversation_id, Some(42));
            }
            other => panic!("unexpected frame {other:?}"),
        }

        let frame: ClientFrame = serde_json::from_str(
            r#"{"action":"webrtc_ice_candidate","candidate":{"sdpMid":"0"},"conversationId":42}"#,
        )
        .unwrap();
        assert!(matches!(frame, ClientFrame::WebrtcIceCandidate { .. }));
    }

    #[test]
    fn unknown_actions_fail_to_parse() {
        let result = serde_json::from_str::<ClientFrame>(r#"{"action":"shrug"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn outbound_frames_carry_their_type_tag() {
        let frame = ServerFrame::Message {
            id: 1,
            text: "hi".to_string(),
            sender: sender_profile(),
            timestamp: "2024-03-01T10:00:00+00:00".to_string(),
            attachments: vec![],
            conversation: 42,
        };
        let value = serde_json::to_value(&frame).unwrap();
        assert_eq!(value["type"], "message");
        assert_eq!(value["conversation"], 42);
        assert_eq!(value["sender"]["account_type"], "patient");

        let frame = ServerFrame::CallNotification {
            caller: sender_profile(),
            call: 7,
        };
        let value = serde_json::to_value(&frame).unwrap();
        assert_eq!(value["type"], "call_notification");
        assert_eq!(value["call"], 7);

        let frame = ServerFrame::WebrtcOffer {
            offer: json!({"sdp": "v=0"}),
            sender: 10,
        };
        let value = serde_json::to_value(&frame).unwrap();
        assert_eq!(value["type"], "webrtc_offer");
        assert_eq!(value["sender"], 10);
    }
}
