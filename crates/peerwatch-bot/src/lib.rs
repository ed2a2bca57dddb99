//! peerwatch bot library
//!
//! - `SQLite` storage for subscription peers
//! - Telegram Bot API transport behind the [`transport::Transport`] seam
//! - Activation linking a chat to a peer
//! - Periodic usage/expiry notices with per-peer deduplication flags
//! - Inbound message routing

pub mod dispatcher;
pub mod linker;
pub mod messages;
pub mod notifier;
pub mod storage;
pub mod telegram;
pub mod transport;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod test_support;
