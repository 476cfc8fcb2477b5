//! The merged conversation history view.
//!
//! A conversation's history interleaves its messages and its calls. The
//! two kinds are carried as one tagged union with an explicit
//! discriminant (`type: "message" | "call"`) and ordered by a single
//! common timestamp key.

use chrono::{DateTime, Utc};
use mediline_database::{Call, CallStatus, CallType, Message};
use serde::{Deserialize, Serialize};

use crate::types::AttachmentInfo;

/// One entry of the merged history, sorted ascending by timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum HistoryItem {
    Message {
        id: i64,
        conversation: i64,
        sender: i64,
        text: String,
        timestamp: String,
        attachments: Vec<AttachmentInfo>,
    },
    Call {
        id: i64,
        conversation: i64,
        caller: i64,
        receiver: i64,
        call_type: CallType,
        call_status: CallStatus,
        start_time: String,
        end_time: Option<String>,
    },
}

impl HistoryItem {
    pub fn from_message(message: Message, attachments: Vec<AttachmentInfo>) -> Self {
        Self::Message {
            id: message.id,
            conversation: message.conversation_id,
            sender: message.sender_id,
            text: message.text,
            timestamp: message.timestamp,
            attachments,
        }
    }

    pub fn from_call(call: Call) -> Self {
        Self::Call {
            id: call.id,
            conversation: call.conversation_id,
            caller: call.caller_id,
            receiver: call.receiver_id,
            call_type: call.call_type,
            call_status: call.call_status,
            start_time: call.start_time,
            end_time: call.end_time,
        }
    }

    /// The common ordering key: a message's creation time or a call's
    /// start time.
    pub fn timestamp_key(&self) -> DateTime<Utc> {
        let raw = match self {
            HistoryItem::Message { timestamp, .. } => timestamp,
            HistoryItem::Call { start_time, .. } => start_time,
        };

        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// Merge messages and calls into one ascending timeline.
pub fn merge_history(
    messages: Vec<(Message, Vec<AttachmentInfo>)>,
    calls: Vec<Call>,
) -> Vec<HistoryItem> {
    let mut items: Vec<HistoryItem> = messages
        .into_iter()
        .map(|(message, attachments)| HistoryItem::from_message(message, attachments))
        .chain(calls.into_iter().map(HistoryItem::from_call))
        .collect();

    items.sort_by_key(HistoryItem::timestamp_key);
    items
}
