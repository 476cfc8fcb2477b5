//! Mediline Database Crate
//!
//! This crate provides database functionality for the Mediline backend,
//! including connection management, migrations, domain entities, and
//! repository implementations.

use sqlx::SqlitePool;
use mediline_config::DatabaseConfig;

pub mod connection;
pub mod migrations;
pub mod entities;
pub mod repos;
pub mod types;

pub use connection::prepare_database;
pub use migrations::run_migrations;

// Re-export repositories
pub use repos::{
    UserRepository, ConversationRepository, MessageRepository, AttachmentRepository,
    CallRepository,
};

// Re-export entities
pub use entities::{
    user::{User, AccountType, CreateUserRequest},
    profile::{PatientProfile, DoctorProfile},
    conversation::Conversation,
    message::Message,
    attachment::{Attachment, CreateAttachmentRequest},
    call::{Call, CallType, CallStatus},
};

// Re-export types
pub use types::{errors::DatabaseError, DatabaseResult};

/// Initialize the database with migrations
pub async fn initialize_database(config: &DatabaseConfig) -> DatabaseResult<SqlitePool> {
    let pool = prepare_database(config)
        .await
        .map_err(|e| DatabaseError::Connection(e.to_string()))?;

    run_migrations(&pool)
        .await
        .map_err(|e| DatabaseError::Migration(e.to_string()))?;

    Ok(pool)
}
