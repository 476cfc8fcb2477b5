//! Call entity definitions

use serde::{Deserialize, Serialize};

/// A call record. Caller and receiver are not symmetric; the receiver is
/// always the other participant of the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Call {
    pub id: i64,
    pub conversation_id: i64,
    pub caller_id: i64,
    pub receiver_id: i64,
    pub call_type: CallType,
    pub call_status: CallStatus,
    pub start_time: String,
    pub end_time: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallType {
    Video,
    Audio,
}

impl CallType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallType::Video => "video",
            CallType::Audio => "audio",
        }
    }
}

impl From<&str> for CallType {
    fn from(s: &str) -> Self {
        match s {
            "audio" => CallType::Audio,
            _ => CallType::Video,
        }
    }
}

impl std::fmt::Display for CallType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Call lifecycle status. Transitions only move forward: `Initiated` may
/// become `Ongoing`, `Completed`, `Missed`, or `Rejected`; `Ongoing` may
/// become `Completed`; everything else is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallStatus {
    Initiated,
    Ongoing,
    Completed,
    Missed,
    Rejected,
}

impl CallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallStatus::Initiated => "initiated",
            CallStatus::Ongoing => "ongoing",
            CallStatus::Completed => "completed",
            CallStatus::Missed => "missed",
            CallStatus::Rejected => "rejected",
        }
    }

    /// Whether no further transitions are allowed out of this status.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CallStatus::Completed | CallStatus::Missed | CallStatus::Rejected
        )
    }

    /// Whether moving to `next` is a legal forward transition.
    pub fn can_transition_to(&self, next: CallStatus) -> bool {
        match self {
            CallStatus::Initiated => matches!(
                next,
                CallStatus::Ongoing
                    | CallStatus::Completed
                    | CallStatus::Missed
                    | CallStatus::Rejected
            ),
            CallStatus::Ongoing => matches!(next, CallStatus::Completed),
            _ => false,
        }
    }
}

impl From<&str> for CallStatus {
    fn from(s: &str) -> Self {
        match s {
            "ongoing" => CallStatus::Ongoing,
            "completed" => CallStatus::Completed,
            "missed" => CallStatus::Missed,
            "rejected" => CallStatus::Rejected,
            _ => CallStatus::Initiated,
        }
    }
}

impl std::fmt::Display for CallStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
