//! Serialized user shapes sent to clients

use mediline_database::AccountType;
use serde::{Deserialize, Serialize};

/// The sender block embedded in broadcast message frames and history
/// entries. `profile_pic` is an absolute URL or `None` when the user has
/// not set an avatar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SenderProfile {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub account_type: AccountType,
    pub profile_pic: Option<String>,
}
