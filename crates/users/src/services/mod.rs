//! Service layer for the users crate

pub mod profile_service;

pub use profile_service::ProfileService;
