//! Periodic usage/expiry sweep.
//!
//! Every cycle loads all peers, evaluates each against the transition rules
//! and, per transition, sends a notice and/or flips the matching flag. A
//! flag is only set after its notice was delivered, so a failed send is
//! retried on the next cycle. Failures for one peer never stop the sweep.

mod rules;


use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use peerwatch_core::Config;
use peerwatch_core::db::unix_timestamp_millis;

pub use rules::{CheckPolicy, Thresholds, Transition, evaluate, is_eligible};

use crate::messages;
use crate::storage::{DatabaseError, NoticeKind, Peer, PeerStore};
use crate::transport::{OutboundMessage, Transport};

/// Sweep timing, thresholds and notice wording inputs.
#[derive(Debug, Clone)]
pub struct NotifierSettings {
    pub interval: Duration,
    pub thresholds: Thresholds,
    pub policy: CheckPolicy,
    /// Admin handle linked from notices.
    pub admin_id: String,
}

impl NotifierSettings {
    pub fn from_config(config: &Config) -> Self {
        let n = &config.notifier;
        Self {
            interval: Duration::from_secs(n.interval_secs),
            thresholds: Thresholds {
                usage_bytes: n.usage_threshold_bytes,
                expiry_ms: n.expiry_threshold_ms,
            },
            policy: if n.independent_checks {
                CheckPolicy::Independent
            } else {
                CheckPolicy::Priority
            },
            admin_id: config.telegram.admin_id.clone(),
        }
    }
}

/// Counters for one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub peers: usize,
    pub skipped: usize,
    pub notices_sent: usize,
    pub flags_cleared: usize,
    pub send_failures: usize,
    pub store_failures: usize,
}

/// Drives the notice state machine over the peer store.
pub struct Notifier {
    store: Arc<dyn PeerStore>,
    transport: Arc<dyn Transport>,
    settings: NotifierSettings,
}

impl Notifier {
    pub fn new(
        store: Arc<dyn PeerStore>,
        transport: Arc<dyn Transport>,
        settings: NotifierSettings,
    ) -> Self {
        Self {
            store,
            transport,
            settings,
        }
    }

    /// Run one full pass over a fresh snapshot of all peers.
    ///
    /// Only a failure to load the snapshot is returned; per-peer failures
    /// are logged and counted in the report.
    #[instrument(skip(self))]
    pub async fn sweep(&self, now_ms: i64) -> Result<SweepReport, DatabaseError> {
        let peers = self.store.list_peers().await?;
        let mut report = SweepReport {
            peers: peers.len(),
            ..SweepReport::default()
        };

        for peer in &peers {
            if !is_eligible(peer) {
                report.skipped += 1;
                continue;
            }
            let transitions = evaluate(peer, &self.settings.thresholds, now_ms, self.settings.policy);
            for transition in transitions {
                self.apply(peer, transition, &mut report).await;
            }
        }

        Ok(report)
    }

    async fn apply(&self, peer: &Peer, transition: Transition, report: &mut SweepReport) {
        let kind = transition.kind();

        if transition.sends_notice() {
            let text = self.notice_text(peer, kind);
            let message = OutboundMessage::html(peer.telegram_chat_id, text);
            if let Err(e) = self.transport.send_message(&message).await {
                warn!(
                    peer = %peer.id,
                    chat_id = peer.telegram_chat_id,
                    notice = %kind,
                    error = %e,
                    "Failed to send notice, will retry next cycle"
                );
                report.send_failures += 1;
                return;
            }
        }

        let value = transition.flag_value();
        match self
            .store
            .set_notice_flag(&peer.public_key, kind, value)
            .await
        {
            Ok(()) if value => {
                info!(peer = %peer.id, chat_id = peer.telegram_chat_id, notice = %kind, "Notice sent");
                report.notices_sent += 1;
            }
            Ok(()) => {
                info!(peer = %peer.id, notice = %kind, "Notice flag cleared");
                report.flags_cleared += 1;
            }
            Err(e) => {
                warn!(
                    peer = %peer.id,
                    notice = %kind,
                    value,
                    error = %e,
                    "Failed to persist notice flag"
                );
                report.store_failures += 1;
            }
        }
    }

    fn notice_text(&self, peer: &Peer, kind: NoticeKind) -> String {
        let t = &self.settings.thresholds;
        match kind {
            NoticeKind::Usage => {
                messages::usage_notice(&peer.name, t.usage_bytes, &self.settings.admin_id)
            }
            NoticeKind::Expiry => {
                messages::expiry_notice(&peer.name, t.expiry_ms, &self.settings.admin_id)
            }
        }
    }

    /// Sweep, sleep, repeat until `shutdown` flips to `true`.
    ///
    /// A cycle in progress always completes; shutdown is observed between
    /// cycles.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_ms = u64::try_from(self.settings.interval.as_millis()).unwrap_or(u64::MAX),
            policy = ?self.settings.policy,
            "Notifier started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            match self.sweep(unix_timestamp_millis()).await {
                Ok(report) => debug!(?report, "Sweep complete"),
                Err(e) => warn!(error = %e, "Failed to load peers, skipping cycle"),
            }

            tokio::select! {
                () = tokio::time::sleep(self.settings.interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Notifier stopped");
    }
}
