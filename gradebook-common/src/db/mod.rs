//! Database initialization, models and generic collection access

pub mod collection;
pub mod init;
pub mod models;

pub use collection::*;
pub use init::*;
pub use models::*;
