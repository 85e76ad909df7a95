//! Public surface for the `yatube-server` crate.
//!
//! Exposes the router builder, config and storage types so that the admin
//! CLI and the conformance suite can reuse them without spawning a
//! subprocess.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod password;
pub mod router;
pub mod storage;
pub mod tokens;

pub use config::{ConfigError, ServerConfig};
pub use router::build_router;
pub use storage::{memory::MemoryStorage, sqlite::SqliteStorage, Storage, StorageError};
