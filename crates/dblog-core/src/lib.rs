//! dblog core - Core abstractions shared by the pool, drivers and logger
//!
//! This crate provides the fundamental traits and types that all other
//! dblog crates depend on. It defines:
//!
//! - `DatabaseDriver` - Trait for database driver implementations
//! - `Connection` - Trait for a live database connection
//! - `ServerConfig` / `DatabaseConfig` - Immutable connection configuration
//! - Common types like `Value`, `Row`, `QueryResult`

mod config;
mod connection;
mod driver;
mod error;
mod types;

pub use config::*;
pub use connection::*;
pub use driver::*;
pub use error::*;
pub use types::*;
