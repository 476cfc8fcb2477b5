//! # Mediline Users Crate
//!
//! User directory lookups and the profile serialization used when a chat
//! message is broadcast. Sender identities are always resolved fresh from
//! the store at message-creation time, never cached on a connection.

pub mod services;
pub mod types;

pub use services::ProfileService;
pub use types::{SenderProfile, UserError, UserResult};
