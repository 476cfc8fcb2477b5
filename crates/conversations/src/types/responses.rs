//! Wire-facing response shapes

use mediline_config::MediaConfig;
use mediline_database::Attachment;
use serde::{Deserialize, Serialize};

/// Attachment metadata as sent to clients; `url` is absolute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachmentInfo {
    pub id: i64,
    pub file_name: String,
    pub content_type: String,
    pub file_size: i64,
    pub url: String,
}

impl AttachmentInfo {
    pub fn from_attachment(attachment: &Attachment, media: &MediaConfig) -> Self {
        Self {
            id: attachment.id,
            file_name: attachment.file_name.clone(),
            content_type: attachment.content_type.clone(),
            file_size: attachment.file_size,
            url: media.absolute_url(&attachment.file_path),
        }
    }
}
