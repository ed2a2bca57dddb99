//! The store seam consumed by the linker, notifier and dispatcher.

use async_trait::async_trait;

use super::db::PeerDatabase;
use super::models::{NoticeKind, Peer};
use peerwatch_core::db::DatabaseError;

/// Find / find-one / update-one-field access to peer records.
///
/// Each call is atomic on its own; callers get no transaction spanning a
/// read and a later write.
#[async_trait]
pub trait PeerStore: Send + Sync {
    /// Every peer, unfiltered.
    async fn list_peers(&self) -> Result<Vec<Peer>, DatabaseError>;

    /// Exactly one peer by public key, or [`DatabaseError::NotFound`].
    async fn find_peer_by_public_key(&self, public_key: &str) -> Result<Peer, DatabaseError>;

    /// Peers linked to `chat_id`.
    async fn find_peers_by_chat(&self, chat_id: i64) -> Result<Vec<Peer>, DatabaseError>;

    async fn set_notice_flag(
        &self,
        public_key: &str,
        kind: NoticeKind,
        value: bool,
    ) -> Result<(), DatabaseError>;

    async fn link_chat(&self, public_key: &str, chat_id: i64) -> Result<(), DatabaseError>;
}

#[async_trait]
impl PeerStore for PeerDatabase {
    async fn list_peers(&self) -> Result<Vec<Peer>, DatabaseError> {
        self.list_all_peers().await
    }

    async fn find_peer_by_public_key(&self, public_key: &str) -> Result<Peer, DatabaseError> {
        self.get_peer_by_public_key(public_key).await
    }

    async fn find_peers_by_chat(&self, chat_id: i64) -> Result<Vec<Peer>, DatabaseError> {
        self.list_peers_by_chat(chat_id).await
    }

    async fn set_notice_flag(
        &self,
        public_key: &str,
        kind: NoticeKind,
        value: bool,
    ) -> Result<(), DatabaseError> {
        self.update_notice_flag(public_key, kind, value).await
    }

    async fn link_chat(&self, public_key: &str, chat_id: i64) -> Result<(), DatabaseError> {
        self.update_chat_link(public_key, chat_id).await
    }
}
