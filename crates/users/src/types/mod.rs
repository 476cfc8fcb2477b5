//! Shared types for the users crate

pub mod errors;
pub mod responses;

pub use errors::{UserError, UserResult};
pub use responses::SenderProfile;
