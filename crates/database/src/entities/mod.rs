//! Domain entity definitions

pub mod user;
pub mod profile;
pub mod conversation;
pub mod message;
pub mod attachment;
pub mod call;

pub use user::{User, AccountType, CreateUserRequest};
pub use profile::{PatientProfile, DoctorProfile};
pub use conversation::Conversation;
pub use message::Message;
pub use attachment::{Attachment, CreateAttachmentRequest};
pub use call::{Call, CallType, CallStatus};
