//! Activation: bind a chat identity to a peer.
//!
//! The activation code is the standard base64 encoding of the peer's public
//! key. Lookup is an exact match on the decoded key; the sender's id is then
//! written into `telegram_chat_id`, overwriting any previous link.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::{info, warn};

use crate::messages;
use crate::storage::PeerStore;
use crate::transport::{InboundMessage, OutboundMessage, Transport};

/// Length of a base64-encoded WireGuard public key.
pub const PUBLIC_KEY_LEN: usize = 44;

/// What an activation attempt did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivationOutcome {
    /// The peer is now linked to the sender.
    Linked { peer_id: String },
    /// The code was rejected or the store failed; nothing changed.
    Invalid,
}

/// Decode an activation code into the public key it stands for.
///
/// Returns `None` unless the code is valid base64 of a 44-byte UTF-8 key.
pub fn decode_activation_code(code: &str) -> Option<String> {
    let bytes = STANDARD.decode(code.trim()).ok()?;
    if bytes.len() != PUBLIC_KEY_LEN {
        return None;
    }
    String::from_utf8(bytes).ok()
}

pub struct Linker {
    store: Arc<dyn PeerStore>,
    transport: Arc<dyn Transport>,
    channel_id: String,
}

impl Linker {
    pub fn new(
        store: Arc<dyn PeerStore>,
        transport: Arc<dyn Transport>,
        channel_id: impl Into<String>,
    ) -> Self {
        Self {
            store,
            transport,
            channel_id: channel_id.into(),
        }
    }

    /// Handle one activation request and reply to it.
    ///
    /// Every failure reads as "invalid request" to the user. The reply itself
    /// is a single attempt; a failed reply is logged and does not undo the
    /// link.
    pub async fn activate(&self, message: &InboundMessage, code: &str) -> ActivationOutcome {
        let (outcome, reply) = match self.link(message, code).await {
            Some((peer_id, peer_name)) => {
                info!(peer = %peer_id, chat_id = message.sender_id, "Peer linked to chat");
                let text = messages::linked_confirmation(&peer_name, &self.channel_id);
                (
                    ActivationOutcome::Linked { peer_id },
                    OutboundMessage::html(message.chat_id, text),
                )
            }
            None => (
                ActivationOutcome::Invalid,
                OutboundMessage::text(message.chat_id, messages::INVALID_REQUEST),
            ),
        };

        let reply = reply.reply_to(message.message_id);
        if let Err(e) = self.transport.send_message(&reply).await {
            warn!(chat_id = message.chat_id, error = %e, "Failed to send activation reply");
        }
        outcome
    }

    async fn link(&self, message: &InboundMessage, code: &str) -> Option<(String, String)> {
        let Some(public_key) = decode_activation_code(code) else {
            info!(chat_id = message.sender_id, "Rejected malformed activation code");
            return None;
        };

        let peer = match self.store.find_peer_by_public_key(&public_key).await {
            Ok(peer) => peer,
            Err(e) => {
                info!(chat_id = message.sender_id, error = %e, "Activation lookup failed");
                return None;
            }
        };

        if let Err(e) = self.store.link_chat(&peer.public_key, message.sender_id).await {
            warn!(peer = %peer.id, chat_id = message.sender_id, error = %e, "Failed to link chat");
            return None;
        }

        Some((peer.id, peer.name))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::{NewPeer, PeerDatabase};
    use crate::test_support::{FakeTransport, FlakyStore, inbound, new_peer, test_db};
    use crate::transport::ParseMode;

    const KEY: &str = "mK3sY8d0wq9JcWb2pVxT7eRfLhN4uGzA1oIiQ5yZ6Ds=";

    fn code_for(key: &str) -> String {
        STANDARD.encode(key)
    }

    async fn setup() -> (PeerDatabase, Arc<FakeTransport>, Linker) {
        let db = test_db().await;
        db.insert_peer(&NewPeer {
            name: "laptop",
            ..new_peer("p1", KEY)
        })
        .await
        .unwrap();
        let transport = Arc::new(FakeTransport::new());
        let linker = Linker::new(Arc::new(db.clone()), transport.clone(), "@peerwatch_news");
        (db, transport, linker)
    }

    #[test]
    fn decodes_only_full_length_keys() {
        assert_eq!(KEY.len(), PUBLIC_KEY_LEN);
        assert_eq!(decode_activation_code(&code_for(KEY)).as_deref(), Some(KEY));
        assert_eq!(decode_activation_code(&code_for("short")), None);
        assert_eq!(decode_activation_code("not base64!"), None);
        assert_eq!(decode_activation_code(""), None);
    }

    #[tokio::test]
    async fn valid_code_links_sender_and_confirms() {
        let (db, transport, linker) = setup().await;

        let outcome = linker.activate(&inbound(777, 12, "/start"), &code_for(KEY)).await;

        assert_eq!(outcome, ActivationOutcome::Linked { peer_id: "p1".into() });
        assert_eq!(db.get_peer_by_public_key(KEY).await.unwrap().telegram_chat_id, 777);
        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].chat_id, 777);
        assert_eq!(sent[0].reply_to, Some(12));
        assert_eq!(sent[0].parse_mode, Some(ParseMode::Html));
        assert!(sent[0].text.contains("<b>laptop</b>"));
        assert!(sent[0].text.contains("https://t.me/peerwatch_news"));
    }

    #[tokio::test]
    async fn relinking_overwrites_previous_chat() {
        let (db, _transport, linker) = setup().await;

        linker.activate(&inbound(1, 1, "/start"), &code_for(KEY)).await;
        let outcome = linker.activate(&inbound(2, 1, "/start"), &code_for(KEY)).await;

        assert!(matches!(outcome, ActivationOutcome::Linked { .. }));
        assert_eq!(db.get_peer_by_public_key(KEY).await.unwrap().telegram_chat_id, 2);
    }

    #[tokio::test]
    async fn unknown_code_is_invalid_and_changes_nothing() {
        let (db, transport, linker) = setup().await;
        let other = "Zz3sY8d0wq9JcWb2pVxT7eRfLhN4uGzA1oIiQ5yZ6Ds=";

        let outcome = linker.activate(&inbound(5, 3, "/start"), &code_for(other)).await;

        assert_eq!(outcome, ActivationOutcome::Invalid);
        assert_eq!(db.get_peer_by_public_key(KEY).await.unwrap().telegram_chat_id, 0);
        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].text, messages::INVALID_REQUEST);
        assert_eq!(sent[0].parse_mode, None);
        assert_eq!(sent[0].reply_to, Some(3));
    }

    #[tokio::test]
    async fn malformed_codes_are_invalid() {
        let (db, transport, linker) = setup().await;

        let short = code_for("too-short");
        for code in ["%%%", short.as_str(), KEY] {
            let outcome = linker.activate(&inbound(5, 3, "/start"), code).await;
            assert_eq!(outcome, ActivationOutcome::Invalid, "code={code}");
        }

        assert_eq!(transport.sent().len(), 3);
        assert_eq!(db.get_peer_by_public_key(KEY).await.unwrap().telegram_chat_id, 0);
    }

    #[tokio::test]
    async fn store_write_failure_reads_as_invalid() {
        let db = test_db().await;
        db.insert_peer(&new_peer("p1", KEY)).await.unwrap();
        let store = Arc::new(FlakyStore::new(db.clone()));
        store.fail_writes_for(KEY);
        let transport = Arc::new(FakeTransport::new());
        let linker = Linker::new(store, transport.clone(), "chan");

        let outcome = linker.activate(&inbound(9, 4, "/start"), &code_for(KEY)).await;

        assert_eq!(outcome, ActivationOutcome::Invalid);
        assert_eq!(transport.sent()[0].text, messages::INVALID_REQUEST);
        assert_eq!(db.get_peer_by_public_key(KEY).await.unwrap().telegram_chat_id, 0);
    }

    #[tokio::test]
    async fn failed_reply_keeps_the_link() {
        let (db, transport, linker) = setup().await;
        transport.fail_chat(777);

        let outcome = linker.activate(&inbound(777, 1, "/start"), &code_for(KEY)).await;

        assert!(matches!(outcome, ActivationOutcome::Linked { .. }));
        assert_eq!(db.get_peer_by_public_key(KEY).await.unwrap().telegram_chat_id, 777);
    }
}
