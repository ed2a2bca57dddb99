//! Inbound message loop.
//!
//! Long-polls the transport and routes each message: `/list` answers with
//! the sender's peers, a command carrying an argument is an activation
//! request, anything else is an invalid request.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, info, warn};

use peerwatch_core::db::unix_timestamp_millis;

use crate::linker::Linker;
use crate::messages;
use crate::storage::PeerStore;
use crate::transport::{InboundMessage, OutboundMessage, Transport};

/// Pause after a failed poll before asking again.
const POLL_BACKOFF: Duration = Duration::from_secs(1);

/// Lazy, unbounded stream of inbound messages.
///
/// Each poll asks for updates after the highest `update_id` seen so far.
/// Updates without a message only advance the offset. A failed poll is
/// logged and retried after [`POLL_BACKOFF`]. The stream ends once
/// `shutdown` flips to `true`.
pub fn update_stream(
    transport: Arc<dyn Transport>,
    timeout_secs: u64,
    mut shutdown: watch::Receiver<bool>,
) -> impl Stream<Item = InboundMessage> + Send {
    async_stream::stream! {
        let mut offset = 0_i64;
        loop {
            if *shutdown.borrow() {
                break;
            }

            let page = tokio::select! {
                page = transport.receive_updates(offset, timeout_secs) => page,
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
            };

            let updates = match page {
                Ok(updates) => updates,
                Err(e) => {
                    warn!(offset, error = %e, "Failed to poll updates, backing off");
                    tokio::select! {
                        () = tokio::time::sleep(POLL_BACKOFF) => {}
                        _ = shutdown.changed() => {}
                    }
                    continue;
                }
            };

            for update in updates {
                offset = offset.max(update.update_id.saturating_add(1));
                if let Some(message) = update.message {
                    yield message;
                }
            }
        }
    }
}

pub struct Dispatcher {
    store: Arc<dyn PeerStore>,
    transport: Arc<dyn Transport>,
    linker: Linker,
    poll_timeout_secs: u64,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn PeerStore>,
        transport: Arc<dyn Transport>,
        channel_id: impl Into<String>,
        poll_timeout_secs: u64,
    ) -> Self {
        let linker = Linker::new(Arc::clone(&store), Arc::clone(&transport), channel_id);
        Self {
            store,
            transport,
            linker,
            poll_timeout_secs,
        }
    }

    /// Route one message. Never fails; problems are answered or logged.
    pub async fn handle(&self, message: &InboundMessage) {
        debug!(
            chat_id = message.chat_id,
            message_id = message.message_id,
            command = ?message.command(),
            "Inbound message"
        );

        match message.command() {
            Some("list") => self.list(message).await,
            Some(_) if !message.command_arguments().is_empty() => {
                self.linker
                    .activate(message, message.command_arguments())
                    .await;
            }
            _ => {
                let reply = OutboundMessage::text(message.chat_id, messages::INVALID_REQUEST);
                self.reply(message, reply).await;
            }
        }
    }

    async fn list(&self, message: &InboundMessage) {
        let reply = match self.store.find_peers_by_chat(message.sender_id).await {
            Ok(peers) if peers.is_empty() => {
                OutboundMessage::text(message.chat_id, messages::NO_PEERS_LINKED)
            }
            Ok(peers) => OutboundMessage::html(
                message.chat_id,
                messages::peer_listing(&peers, unix_timestamp_millis()),
            ),
            Err(e) => {
                warn!(chat_id = message.sender_id, error = %e, "Failed to list peers for chat");
                OutboundMessage::text(message.chat_id, messages::INVALID_REQUEST)
            }
        };
        self.reply(message, reply).await;
    }

    async fn reply(&self, to: &InboundMessage, reply: OutboundMessage) {
        let reply = reply.reply_to(to.message_id);
        if let Err(e) = self.transport.send_message(&reply).await {
            warn!(chat_id = to.chat_id, error = %e, "Failed to send reply");
        }
    }

    /// Receive and handle messages one at a time until `shutdown` fires.
    /// A message being handled when shutdown arrives is finished first.
    pub async fn run(&self, shutdown: watch::Receiver<bool>) {
        info!(poll_timeout_secs = self.poll_timeout_secs, "Dispatcher started");

        let stream = update_stream(Arc::clone(&self.transport), self.poll_timeout_secs, shutdown);
        tokio::pin!(stream);
        while let Some(message) = stream.next().await {
            self.handle(&message).await;
        }

        info!("Dispatcher stopped");
    }
}
