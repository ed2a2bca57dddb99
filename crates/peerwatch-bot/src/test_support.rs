//! Shared fixtures for unit tests: an in-memory store, peer builders, a
//! recording transport and a store wrapper that fails on demand.

use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::storage::{DatabaseError, NewPeer, NoticeKind, Peer, PeerDatabase, PeerStore};
use crate::telegram::TelegramError;
use crate::transport::{InboundMessage, InboundUpdate, OutboundMessage, Transport};

pub async fn test_db() -> PeerDatabase {
    PeerDatabase::open_in_memory().await.unwrap()
}

/// A peer with plenty of quota and no expiry, unlinked and without flags.
pub const fn new_peer(id: &'static str, public_key: &'static str) -> NewPeer<'static> {
    NewPeer {
        id,
        name: id,
        public_key,
        allowed_ips: "",
        disabled: false,
        allowed_usage: 0,
        expires_at: 0,
        total_tx: 0,
        total_rx: 0,
        telegram_chat_id: 0,
        received_usage_notice: false,
        received_expiry_notice: false,
    }
}

/// Materialise a `Peer` without touching a database.
pub fn peer_row(p: NewPeer<'_>) -> Peer {
    Peer {
        id: p.id.to_string(),
        name: p.name.to_string(),
        public_key: p.public_key.to_string(),
        allowed_ips: p.allowed_ips.to_string(),
        disabled: p.disabled,
        allowed_usage: p.allowed_usage,
        expires_at: p.expires_at,
        total_tx: p.total_tx,
        total_rx: p.total_rx,
        telegram_chat_id: p.telegram_chat_id,
        received_usage_notice: p.received_usage_notice,
        received_expiry_notice: p.received_expiry_notice,
    }
}

pub fn inbound(chat_id: i64, message_id: i64, text: &str) -> InboundMessage {
    InboundMessage {
        chat_id,
        sender_id: chat_id,
        message_id,
        text: text.to_string(),
    }
}

/// Transport that records every send and serves queued update pages.
#[derive(Default)]
pub struct FakeTransport {
    sent: Mutex<Vec<OutboundMessage>>,
    failing_chats: Mutex<HashSet<i64>>,
    pages: Mutex<VecDeque<Result<Vec<InboundUpdate>, TelegramError>>>,
    offsets: Mutex<Vec<i64>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// Sends to `chat_id` fail until [`Self::recover_chat`] is called.
    pub fn fail_chat(&self, chat_id: i64) {
        self.failing_chats.lock().unwrap().insert(chat_id);
    }

    pub fn recover_chat(&self, chat_id: i64) {
        self.failing_chats.lock().unwrap().remove(&chat_id);
    }

    pub fn push_page(&self, page: Result<Vec<InboundUpdate>, TelegramError>) {
        self.pages.lock().unwrap().push_back(page);
    }

    /// Offsets passed to `receive_updates`, in call order.
    pub fn offsets(&self) -> Vec<i64> {
        self.offsets.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send_message(&self, message: &OutboundMessage) -> Result<(), TelegramError> {
        if self.failing_chats.lock().unwrap().contains(&message.chat_id) {
            return Err(TelegramError::Http("connection reset".into()));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }

    async fn receive_updates(
        &self,
        offset: i64,
        _timeout_secs: u64,
    ) -> Result<Vec<InboundUpdate>, TelegramError> {
        self.offsets.lock().unwrap().push(offset);
        let next = self.pages.lock().unwrap().pop_front();
        match next {
            Some(page) => page,
            None => {
                // Behave like an idle long poll.
                tokio::task::yield_now().await;
                Ok(Vec::new())
            }
        }
    }
}

/// Store that delegates to a real database but can fail selected calls.
pub struct FlakyStore {
    pub inner: PeerDatabase,
    fail_list: Mutex<bool>,
    fail_writes_for: Mutex<HashSet<String>>,
}

impl FlakyStore {
    pub fn new(inner: PeerDatabase) -> Self {
        Self {
            inner,
            fail_list: Mutex::new(false),
            fail_writes_for: Mutex::new(HashSet::new()),
        }
    }

    pub fn fail_list(&self, fail: bool) {
        *self.fail_list.lock().unwrap() = fail;
    }

    pub fn fail_writes_for(&self, public_key: &str) {
        self.fail_writes_for
            .lock()
            .unwrap()
            .insert(public_key.to_string());
    }

    fn write_fails(&self, public_key: &str) -> bool {
        self.fail_writes_for.lock().unwrap().contains(public_key)
    }
}

#[async_trait]
impl PeerStore for FlakyStore {
    async fn list_peers(&self) -> Result<Vec<Peer>, DatabaseError> {
        if *self.fail_list.lock().unwrap() {
            return Err(DatabaseError::Connection("store unavailable".into()));
        }
        self.inner.list_peers().await
    }

    async fn find_peer_by_public_key(&self, public_key: &str) -> Result<Peer, DatabaseError> {
        self.inner.find_peer_by_public_key(public_key).await
    }

    async fn find_peers_by_chat(&self, chat_id: i64) -> Result<Vec<Peer>, DatabaseError> {
        self.inner.find_peers_by_chat(chat_id).await
    }

    async fn set_notice_flag(
        &self,
        public_key: &str,
        kind: NoticeKind,
        value: bool,
    ) -> Result<(), DatabaseError> {
        if self.write_fails(public_key) {
            return Err(DatabaseError::Query("disk I/O error".into()));
        }
        self.inner.set_notice_flag(public_key, kind, value).await
    }

    async fn link_chat(&self, public_key: &str, chat_id: i64) -> Result<(), DatabaseError> {
        if self.write_fails(public_key) {
            return Err(DatabaseError::Query("disk I/O error".into()));
        }
        self.inner.link_chat(public_key, chat_id).await
    }
}
