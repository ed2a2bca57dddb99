//! `peerwatch` Core Library
//!
//! Shared functionality for the `peerwatch` bot:
//! - Configuration loading with environment overrides
//! - `SQLite` pool helpers and the storage error type
//! - Tracing initialisation
//! - Byte and duration formatting for chat replies
//! - Common error types

pub mod config;
pub mod db;
pub mod error;
pub mod format;
pub mod tracing_init;

pub use config::Config;
pub use error::{Error, Result};
