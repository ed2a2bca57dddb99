//! Storage layer tests for peerwatch.

use super::models::{NewPeer, NoticeKind};
use super::store::PeerStore;
use crate::test_support::{new_peer, test_db};
use peerwatch_core::db::DatabaseError;

#[tokio::test]
async fn insert_and_get_peer() {
    let db = test_db().await;
    let peer = db
        .insert_peer(&NewPeer {
            allowed_usage: 10_000_000_000,
            total_rx: 3,
            total_tx: 4,
            ..new_peer("p1", "KEY1")
        })
        .await
        .unwrap();

    assert_eq!(peer.id, "p1");
    assert_eq!(peer.public_key, "KEY1");
    assert_eq!(peer.used_bytes(), 7);
    assert_eq!(peer.remaining_bytes(), 9_999_999_993);
    assert!(!peer.is_linked());
    assert!(!peer.received_usage_notice);
    assert!(!peer.received_expiry_notice);
}

#[tokio::test]
async fn find_by_public_key_is_exact() {
    let db = test_db().await;
    db.insert_peer(&new_peer("p1", "KEY1")).await.unwrap();

    assert_eq!(db.find_peer_by_public_key("KEY1").await.unwrap().id, "p1");
    let err = db.find_peer_by_public_key("key1").await.unwrap_err();
    assert!(matches!(err, DatabaseError::NotFound(_)));
}

#[tokio::test]
async fn list_peers_returns_full_snapshot() {
    let db = test_db().await;
    db.insert_peer(&new_peer("p1", "KEY1")).await.unwrap();
    db.insert_peer(&NewPeer {
        disabled: true,
        ..new_peer("p2", "KEY2")
    })
    .await
    .unwrap();

    let peers = db.list_peers().await.unwrap();
    assert_eq!(peers.len(), 2);
    assert!(peers.iter().any(|p| p.disabled));
}

#[tokio::test]
async fn find_peers_by_chat_filters_on_link() {
    let db = test_db().await;
    db.insert_peer(&NewPeer {
        telegram_chat_id: 42,
        ..new_peer("p1", "KEY1")
    })
    .await
    .unwrap();
    db.insert_peer(&NewPeer {
        telegram_chat_id: 42,
        ..new_peer("p2", "KEY2")
    })
    .await
    .unwrap();
    db.insert_peer(&new_peer("p3", "KEY3")).await.unwrap();

    let linked = db.find_peers_by_chat(42).await.unwrap();
    assert_eq!(linked.len(), 2);
    assert!(db.find_peers_by_chat(7).await.unwrap().is_empty());
}

#[tokio::test]
async fn set_notice_flag_touches_only_that_flag() {
    let db = test_db().await;
    db.insert_peer(&new_peer("p1", "KEY1")).await.unwrap();

    db.set_notice_flag("KEY1", NoticeKind::Usage, true)
        .await
        .unwrap();
    let peer = db.find_peer_by_public_key("KEY1").await.unwrap();
    assert!(peer.received_usage_notice);
    assert!(!peer.received_expiry_notice);

    db.set_notice_flag("KEY1", NoticeKind::Expiry, true)
        .await
        .unwrap();
    db.set_notice_flag("KEY1", NoticeKind::Usage, false)
        .await
        .unwrap();
    let peer = db.find_peer_by_public_key("KEY1").await.unwrap();
    assert!(!peer.received_usage_notice);
    assert!(peer.received_expiry_notice);
}

#[tokio::test]
async fn set_notice_flag_on_unknown_peer_is_not_found() {
    let db = test_db().await;
    let err = db
        .set_notice_flag("missing", NoticeKind::Expiry, true)
        .await
        .unwrap_err();
    assert!(matches!(err, DatabaseError::NotFound(_)));
}

#[tokio::test]
async fn link_chat_overwrites_previous_link() {
    let db = test_db().await;
    db.insert_peer(&new_peer("p1", "KEY1")).await.unwrap();

    db.link_chat("KEY1", 100).await.unwrap();
    db.link_chat("KEY1", 200).await.unwrap();

    let peer = db.find_peer_by_public_key("KEY1").await.unwrap();
    assert_eq!(peer.telegram_chat_id, 200);
    assert!(db.find_peers_by_chat(100).await.unwrap().is_empty());
}

#[tokio::test]
async fn link_chat_on_unknown_peer_is_not_found() {
    let db = test_db().await;
    assert!(matches!(
        db.link_chat("missing", 1).await.unwrap_err(),
        DatabaseError::NotFound(_)
    ));
}

#[tokio::test]
async fn update_usage_changes_counters() {
    let db = test_db().await;
    db.insert_peer(&new_peer("p1", "KEY1")).await.unwrap();

    db.update_usage("KEY1", 500, 250).await.unwrap();

    let peer = db.find_peer_by_public_key("KEY1").await.unwrap();
    assert_eq!(peer.used_bytes(), 750);
}

#[test]
fn remaining_bytes_goes_negative_over_quota() {
    let peer = crate::test_support::peer_row(NewPeer {
        allowed_usage: 100,
        total_rx: 80,
        total_tx: 70,
        ..new_peer("p1", "KEY1")
    });
    assert_eq!(peer.remaining_bytes(), -50);
}
