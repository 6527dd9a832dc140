//! # Gradebook Common Library
//!
//! Shared code for the gradebook service and its tools:
//! - Error type used by the storage layer
//! - Bootstrap configuration and root folder resolution
//! - Database initialization (schema)
//! - Entity models and generic collection access

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
