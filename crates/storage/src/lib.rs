//! Store abstraction and the PostgreSQL backend for Sprint Pulse.
//!
//! This crate provides the trait the progress job talks to, the
//! environment-driven connection settings, and a single-connection
//! PostgreSQL implementation.

#![warn(missing_docs)]

pub mod config;
pub mod postgres_storage;
pub mod trait_;

pub use config::{ConfigError, DbConfig};
pub use postgres_storage::PgProgressStore;
pub use trait_::{ProgressStore, Result, StorageError};
