//! `SQLite` storage for peerwatch.
//!
//! Persists subscription peers: quota, expiry, chat link and the two
//! notice flags the notifier uses to deduplicate messages.

mod db;
mod models;
mod queries;
mod store;

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests;

pub use db::PeerDatabase;
pub use models::*;
pub use peerwatch_core::db::DatabaseError;
pub use store::PeerStore;
