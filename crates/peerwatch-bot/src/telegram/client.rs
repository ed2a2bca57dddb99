//! Bot API HTTP client.
//!
//! Every method is a JSON `POST` to `{base_url}/bot{token}/{method}`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::TelegramError;
use super::types::{
    ApiResponse, DeleteWebhookRequest, GetUpdatesRequest, ReplyParameters, SendMessageRequest,
    Update, User, WebhookInfo,
};
use crate::transport::{InboundUpdate, OutboundMessage, ParseMode, Transport};

/// Timeout for every call except the long poll.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Extra time granted to a long poll beyond its server-side timeout.
const LONG_POLL_GRACE: Duration = Duration::from_secs(10);

/// Client for the Telegram Bot API.
pub struct TelegramClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl TelegramClient {
    /// Create a client for the bot identified by `token`.
    pub fn new(base_url: &str, token: &str) -> Result<Self, TelegramError> {
        if base_url.is_empty() {
            return Err(TelegramError::Config("api base url is empty".into()));
        }
        if token.trim().is_empty() {
            return Err(TelegramError::Config("bot token is empty".into()));
        }

        // reqwest is built with `rustls-no-provider`; install ring once.
        // `Err` means a provider is already installed.
        let _ = rustls::crypto::ring::default_provider().install_default();

        let http = reqwest::Client::builder().build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.trim().to_string(),
        })
    }

    pub(crate) fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    async fn call<B, T>(&self, method: &str, body: &B, timeout: Duration) -> Result<T, TelegramError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let response = self
            .http
            .post(self.method_url(method))
            .timeout(timeout)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        let envelope: ApiResponse<T> = serde_json::from_str(&text).map_err(|e| {
            if status.is_success() {
                TelegramError::Http(format!("{method}: malformed response: {e}"))
            } else {
                TelegramError::Api {
                    code: i64::from(status.as_u16()),
                    description: text.clone(),
                }
            }
        })?;

        if !envelope.ok {
            let code = envelope
                .error_code
                .unwrap_or_else(|| i64::from(status.as_u16()));
            let description = envelope.description.unwrap_or_default();
            warn!(method, code, description = %description, "Telegram API returned error");
            return Err(TelegramError::Api { code, description });
        }

        envelope
            .result
            .ok_or_else(|| TelegramError::Http(format!("{method}: response has no result")))
    }

    /// The bot's own account.
    pub async fn get_me(&self) -> Result<User, TelegramError> {
        self.call("getMe", &serde_json::json!({}), REQUEST_TIMEOUT)
            .await
    }

    pub async fn get_webhook_info(&self) -> Result<WebhookInfo, TelegramError> {
        self.call("getWebhookInfo", &serde_json::json!({}), REQUEST_TIMEOUT)
            .await
    }

    /// Remove the webhook so `getUpdates` can be used.
    pub async fn delete_webhook(&self, drop_pending_updates: bool) -> Result<(), TelegramError> {
        let deleted: bool = self
            .call(
                "deleteWebhook",
                &DeleteWebhookRequest {
                    drop_pending_updates,
                },
                REQUEST_TIMEOUT,
            )
            .await?;
        if deleted {
            Ok(())
        } else {
            Err(TelegramError::Api {
                code: 0,
                description: "deleteWebhook returned false".into(),
            })
        }
    }
}

#[async_trait]
impl Transport for TelegramClient {
    async fn send_message(&self, message: &OutboundMessage) -> Result<(), TelegramError> {
        let body = SendMessageRequest {
            chat_id: message.chat_id,
            text: &message.text,
            parse_mode: message.parse_mode.map(|mode| match mode {
                ParseMode::Html => "HTML",
            }),
            reply_parameters: message.reply_to.map(|message_id| ReplyParameters {
                message_id,
                allow_sending_without_reply: true,
            }),
        };

        let _sent: serde_json::Value = self.call("sendMessage", &body, REQUEST_TIMEOUT).await?;
        debug!(chat_id = message.chat_id, "Telegram message sent");
        Ok(())
    }

    async fn receive_updates(
        &self,
        offset: i64,
        timeout_secs: u64,
    ) -> Result<Vec<InboundUpdate>, TelegramError> {
        let body = GetUpdatesRequest {
            offset,
            timeout: timeout_secs,
            allowed_updates: &["message"],
        };
        let updates: Vec<Update> = self
            .call(
                "getUpdates",
                &body,
                Duration::from_secs(timeout_secs) + LONG_POLL_GRACE,
            )
            .await?;
        Ok(updates.into_iter().map(InboundUpdate::from).collect())
    }
}
