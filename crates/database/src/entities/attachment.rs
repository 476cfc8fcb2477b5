//! Attachment entity definitions

use serde::{Deserialize, Serialize};

/// A file attachment. `message_id` is `None` while the attachment has
/// been uploaded but not yet linked to a message (two-phase attach);
/// once set it is never reassigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: i64,
    pub message_id: Option<i64>,
    pub file_name: String,
    pub content_type: String,
    pub file_size: i64,
    pub file_path: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAttachmentRequest {
    pub message_id: Option<i64>,
    pub file_name: String,
    pub content_type: String,
    pub file_size: i64,
    pub file_path: String,
}
