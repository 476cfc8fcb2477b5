//! Message entity definitions

use serde::{Deserialize, Serialize};

/// A chat message. The text body is immutable and the timestamp is
/// assigned server-side at persistence time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub conversation_id: i64,
    pub sender_id: i64,
    pub text: String,
    pub timestamp: String,
}
