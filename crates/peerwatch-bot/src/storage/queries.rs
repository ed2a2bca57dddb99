//! Database queries for peerwatch.

use super::db::PeerDatabase;
use super::models::{NewPeer, NoticeKind, Peer};
use peerwatch_core::db::DatabaseError;

impl PeerDatabase {
    /// Insert a peer row. Provisioning normally happens outside the bot.
    pub async fn insert_peer(&self, peer: &NewPeer<'_>) -> Result<Peer, DatabaseError> {
        sqlx::query(
            "INSERT INTO peers (id, name, public_key, allowed_ips, disabled, allowed_usage, \
             expires_at, total_tx, total_rx, telegram_chat_id, received_usage_notice, \
             received_expiry_notice) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(peer.id)
        .bind(peer.name)
        .bind(peer.public_key)
        .bind(peer.allowed_ips)
        .bind(peer.disabled)
        .bind(peer.allowed_usage)
        .bind(peer.expires_at)
        .bind(peer.total_tx)
        .bind(peer.total_rx)
        .bind(peer.telegram_chat_id)
        .bind(peer.received_usage_notice)
        .bind(peer.received_expiry_notice)
        .execute(self.pool())
        .await?;

        self.get_peer_by_public_key(peer.public_key).await
    }

    /// Full snapshot of every peer.
    pub async fn list_all_peers(&self) -> Result<Vec<Peer>, DatabaseError> {
        let peers = sqlx::query_as::<_, Peer>("SELECT * FROM peers ORDER BY id")
            .fetch_all(self.pool())
            .await?;
        Ok(peers)
    }

    /// Get a peer by exact public key match.
    pub async fn get_peer_by_public_key(&self, public_key: &str) -> Result<Peer, DatabaseError> {
        sqlx::query_as::<_, Peer>("SELECT * FROM peers WHERE public_key = ?")
            .bind(public_key)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Peer with public key {public_key}")))
    }

    /// Peers linked to a chat identity.
    pub async fn list_peers_by_chat(&self, chat_id: i64) -> Result<Vec<Peer>, DatabaseError> {
        let peers =
            sqlx::query_as::<_, Peer>("SELECT * FROM peers WHERE telegram_chat_id = ? ORDER BY id")
                .bind(chat_id)
                .fetch_all(self.pool())
                .await?;
        Ok(peers)
    }

    /// Set one notice flag on the peer with `public_key`.
    pub async fn update_notice_flag(
        &self,
        public_key: &str,
        kind: NoticeKind,
        value: bool,
    ) -> Result<(), DatabaseError> {
        let sql = format!("UPDATE peers SET {} = ? WHERE public_key = ?", kind.column());
        let result = sqlx::query(&sql)
            .bind(value)
            .bind(public_key)
            .execute(self.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!(
                "Peer with public key {public_key}"
            )));
        }
        Ok(())
    }

    /// Bind the peer with `public_key` to a chat, replacing any earlier link.
    pub async fn update_chat_link(&self, public_key: &str, chat_id: i64) -> Result<(), DatabaseError> {
        let result = sqlx::query("UPDATE peers SET telegram_chat_id = ? WHERE public_key = ?")
            .bind(chat_id)
            .bind(public_key)
            .execute(self.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!(
                "Peer with public key {public_key}"
            )));
        }
        Ok(())
    }

    /// Overwrite the usage counters. The metering process owns these in
    /// production; this exists for tooling and tests.
    pub async fn update_usage(
        &self,
        public_key: &str,
        total_rx: i64,
        total_tx: i64,
    ) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE peers SET total_rx = ?, total_tx = ? WHERE public_key = ?")
            .bind(total_rx)
            .bind(total_tx)
            .bind(public_key)
            .execute(self.pool())
            .await?;
        Ok(())
    }
}
