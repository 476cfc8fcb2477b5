//! Shared types for the database crate

pub mod errors;

pub use errors::DatabaseError;

/// Result type alias for database operations
pub type DatabaseResult<T> = Result<T, DatabaseError>;
