//! Common utilities and shared types for bullhorn.
//!
//! This crate provides foundational components used across all bullhorn crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based unique identifiers via [`IdGenerator`]
//! - **Storage**: File storage backend for media uploads
//!
//! # Example
//!
//! ```no_run
//! use bullhorn_common::{Config, IdGenerator, AppResult};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     let id = id_gen.generate();
//!     println!("Generated ID: {}", id);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod id;
pub mod storage;

pub use config::{Config, DatabaseConfig, EmailConfig, RedisConfig, ServerConfig, StorageSettings};
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
pub use storage::{LocalStorage, StorageBackend, UploadedFile, generate_storage_key};
