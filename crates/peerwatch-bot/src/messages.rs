//! Outbound message text.
//!
//! Notices and confirmations are HTML: the peer name in bold plus a link to
//! the admin or channel handle.

use peerwatch_core::format::{format_bytes, format_expiry};

use crate::storage::Peer;

pub const INVALID_REQUEST: &str = "Invalid request";

pub const NO_PEERS_LINKED: &str = "No subscriptions are linked to this chat";

/// Escape text for Telegram's HTML parse mode.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

fn handle_link(handle: &str, label: &str) -> String {
    let handle = handle.trim_start_matches('@');
    format!("<a href=\"https://t.me/{}\">{label}</a>", escape_html(handle))
}

/// Remaining usage dropped below `threshold_bytes`.
pub fn usage_notice(peer_name: &str, threshold_bytes: i64, admin_id: &str) -> String {
    format!(
        "Remaining traffic for subscription <b>{}</b> is below {}.\n\n{}",
        escape_html(peer_name),
        format_bytes(threshold_bytes, true),
        handle_link(admin_id, "Renew subscription"),
    )
}

/// Expiry is closer than `threshold_ms`.
pub fn expiry_notice(peer_name: &str, threshold_ms: i64, admin_id: &str) -> String {
    format!(
        "Subscription <b>{}</b> ends in less than {} hours.\n\n{}",
        escape_html(peer_name),
        threshold_ms / 3_600_000,
        handle_link(admin_id, "Renew subscription"),
    )
}

/// Activation succeeded.
pub fn linked_confirmation(peer_name: &str, channel_id: &str) -> String {
    format!(
        "Subscription <b>{}</b> is now linked to this chat.\n\n{}",
        escape_html(peer_name),
        handle_link(channel_id, "View channel"),
    )
}

/// `/list` reply: one block per peer with usage and time left.
pub fn peer_listing(peers: &[Peer], now_ms: i64) -> String {
    peers
        .iter()
        .map(|p| {
            format!(
                "<b>{}</b>\n\t-> {}/{} {}\n\n",
                escape_html(&p.name),
                format_bytes(p.used_bytes(), false),
                format_bytes(p.allowed_usage, false),
                format_expiry(p.expires_at, now_ms, false),
            )
        })
        .collect()
}
