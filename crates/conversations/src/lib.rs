//! # Mediline Conversations Crate
//!
//! This crate provides the domain logic for the realtime messaging core:
//! conversations between a patient and a doctor, message persistence with
//! two-phase attachment linking, call records with a forward-only status
//! machine, and the merged message/call history view.
//!
//! ## Architecture
//!
//! - **Services**: business logic over the database repositories
//! - **Types**: errors, wire-facing response shapes, and the tagged
//!   history union

pub mod services;
pub mod types;

pub use services::{
    AttachmentService, CallService, ConversationService, MessageService,
};
pub use types::{
    AttachmentInfo, ConversationError, ConversationResult, HistoryItem,
};
