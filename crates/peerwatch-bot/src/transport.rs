//! The messaging seam between the bot logic and the chat provider.
//!
//! [`Transport`] is implemented by [`crate::telegram::TelegramClient`] in
//! production and by a recording fake in tests.

use async_trait::async_trait;

use crate::telegram::TelegramError;

/// How the receiving client should interpret `text`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    Html,
}

/// A message to deliver to one chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub chat_id: i64,
    pub text: String,
    pub reply_to: Option<i64>,
    pub parse_mode: Option<ParseMode>,
}

impl OutboundMessage {
    /// Plain-text message.
    pub fn text(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            reply_to: None,
            parse_mode: None,
        }
    }

    /// HTML-formatted message.
    pub fn html(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            parse_mode: Some(ParseMode::Html),
            ..Self::text(chat_id, text)
        }
    }

    /// Quote the message with `message_id`.
    #[must_use]
    pub const fn reply_to(mut self, message_id: i64) -> Self {
        self.reply_to = Some(message_id);
        self
    }
}

/// A chat message received by the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Chat the message arrived in; replies go here.
    pub chat_id: i64,
    /// Sender identity; this is what activation links to a peer.
    pub sender_id: i64,
    pub message_id: i64,
    pub text: String,
}

impl InboundMessage {
    /// The command name without the leading `/` or a trailing `@botname`,
    /// or `None` when the text is not a command.
    pub fn command(&self) -> Option<&str> {
        let first = self.text.split_whitespace().next()?;
        let name = first.strip_prefix('/')?;
        let name = name.split_once('@').map_or(name, |(n, _)| n);
        (!name.is_empty()).then_some(name)
    }

    /// Everything after the command word, trimmed. Empty when the text is
    /// not a command.
    pub fn command_arguments(&self) -> &str {
        if self.command().is_none() {
            return "";
        }
        let text = self.text.trim_start();
        text.split_once(char::is_whitespace)
            .map_or("", |(_, rest)| rest.trim())
    }
}

/// One entry of a long-poll page. Updates without a message (edits,
/// callbacks, membership changes) still advance the offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundUpdate {
    pub update_id: i64,
    pub message: Option<InboundMessage>,
}

/// Send and receive operations the bot needs from a chat provider.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Deliver one message. A single attempt; callers decide about retries.
    async fn send_message(&self, message: &OutboundMessage) -> Result<(), TelegramError>;

    /// Fetch the next page of updates with `update_id >= offset`, waiting up
    /// to `timeout_secs` for at least one to arrive.
    async fn receive_updates(
        &self,
        offset: i64,
        timeout_secs: u64,
    ) -> Result<Vec<InboundUpdate>, TelegramError>;
}
