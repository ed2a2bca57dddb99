//! Telegram Bot API transport.
//!
//! - [`TelegramClient`] for `sendMessage` / `getUpdates` over HTTPS
//! - Startup helpers for bot identity and webhook removal
//! - Wire types for the subset of the API the bot touches

pub mod client;
pub mod types;


pub use client::TelegramClient;

/// Errors that can occur talking to the Bot API.
#[derive(Debug, thiserror::Error)]
pub enum TelegramError {
    /// The request never produced a usable response.
    #[error("Telegram request error: {0}")]
    Http(String),

    /// The API answered with `ok: false`.
    #[error("Telegram API error ({code}): {description}")]
    Api {
        /// `error_code` from the response envelope (or the HTTP status).
        code: i64,
        description: String,
    },

    /// Invalid client configuration.
    #[error("Telegram configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for TelegramError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e.to_string())
    }
}
