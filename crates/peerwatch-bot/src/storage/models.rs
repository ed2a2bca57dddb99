//! Data models for peerwatch storage.

use serde::{Deserialize, Serialize};

/// One subscription record.
///
/// `total_rx`/`total_tx` are maintained by the metering process and are
/// read-only here. `telegram_chat_id == 0` means the peer is not linked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Peer {
    pub id: String,
    pub name: String,
    pub public_key: String,
    pub allowed_ips: String,
    pub disabled: bool,
    /// Inclusive ceiling in bytes.
    pub allowed_usage: i64,
    /// Milliseconds since the Unix epoch.
    pub expires_at: i64,
    pub total_tx: i64,
    pub total_rx: i64,
    pub telegram_chat_id: i64,
    pub received_usage_notice: bool,
    pub received_expiry_notice: bool,
}

impl Peer {
    /// Bytes consumed in both directions.
    pub const fn used_bytes(&self) -> i64 {
        self.total_rx.saturating_add(self.total_tx)
    }

    /// Bytes left before the quota is exhausted. Negative once over quota.
    pub const fn remaining_bytes(&self) -> i64 {
        self.allowed_usage.saturating_sub(self.used_bytes())
    }

    pub const fn is_linked(&self) -> bool {
        self.telegram_chat_id != 0
    }
}

/// Fields for provisioning a peer row.
#[derive(Debug, Clone, Default)]
pub struct NewPeer<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub public_key: &'a str,
    pub allowed_ips: &'a str,
    pub disabled: bool,
    pub allowed_usage: i64,
    pub expires_at: i64,
    pub total_tx: i64,
    pub total_rx: i64,
    pub telegram_chat_id: i64,
    pub received_usage_notice: bool,
    pub received_expiry_notice: bool,
}

/// Which deduplication flag a write targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Usage,
    Expiry,
}

impl NoticeKind {
    pub(crate) const fn column(self) -> &'static str {
        match self {
            Self::Usage => "received_usage_notice",
            Self::Expiry => "received_expiry_notice",
        }
    }
}

impl std::fmt::Display for NoticeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Usage => f.write_str("usage"),
            Self::Expiry => f.write_str("expiry"),
        }
    }
}
