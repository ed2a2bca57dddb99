//! Transition rules for a single peer.
//!
//! The rules form an ordered table evaluated top to bottom. Under
//! [`CheckPolicy::Priority`] the first match wins, so a peer sees at most
//! one transition per sweep and usage always pre-empts expiry.

use crate::storage::{NoticeKind, Peer};

/// A state change the notifier acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Remaining usage fell below the threshold; notify and set the flag.
    UsageLow,
    /// Remaining usage is back above the threshold; clear the flag silently.
    UsageRecovered,
    /// Expiry is closer than the threshold; notify and set the flag.
    ExpiryNear,
    /// Expiry moved beyond the threshold again; clear the flag silently.
    ExpiryRecovered,
}

impl Transition {
    pub const fn kind(self) -> NoticeKind {
        match self {
            Self::UsageLow | Self::UsageRecovered => NoticeKind::Usage,
            Self::ExpiryNear | Self::ExpiryRecovered => NoticeKind::Expiry,
        }
    }

    /// Flag value persisted once the transition is applied.
    pub const fn flag_value(self) -> bool {
        matches!(self, Self::UsageLow | Self::ExpiryNear)
    }

    /// Only threshold crossings produce a message; recoveries are silent.
    pub const fn sends_notice(self) -> bool {
        self.flag_value()
    }
}

/// Threshold values; both comparisons are strict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    pub usage_bytes: i64,
    pub expiry_ms: i64,
}

/// How many transitions a peer may take in one sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckPolicy {
    /// One transition per peer per sweep, usage before expiry.
    #[default]
    Priority,
    /// At most one usage and one expiry transition per peer per sweep.
    Independent,
}

struct Rule {
    transition: Transition,
    applies: fn(&Peer, &Thresholds, i64) -> bool,
}

const fn time_left(peer: &Peer, now_ms: i64) -> i64 {
    peer.expires_at.saturating_sub(now_ms)
}

const USAGE_RULES: [Rule; 2] = [
    Rule {
        transition: Transition::UsageLow,
        applies: |p, t, _| !p.received_usage_notice && p.remaining_bytes() < t.usage_bytes,
    },
    Rule {
        transition: Transition::UsageRecovered,
        applies: |p, t, _| p.received_usage_notice && p.remaining_bytes() > t.usage_bytes,
    },
];

const EXPIRY_RULES: [Rule; 2] = [
    Rule {
        transition: Transition::ExpiryNear,
        applies: |p, t, now| !p.received_expiry_notice && time_left(p, now) < t.expiry_ms,
    },
    Rule {
        transition: Transition::ExpiryRecovered,
        applies: |p, t, now| p.received_expiry_notice && time_left(p, now) > t.expiry_ms,
    },
];

/// Unlinked and disabled peers are never evaluated and never touched.
pub const fn is_eligible(peer: &Peer) -> bool {
    peer.is_linked() && !peer.disabled
}

fn first_match<'a>(
    rules: impl IntoIterator<Item = &'a Rule>,
    peer: &Peer,
    thresholds: &Thresholds,
    now_ms: i64,
) -> Option<Transition> {
    rules
        .into_iter()
        .find(|rule| (rule.applies)(peer, thresholds, now_ms))
        .map(|rule| rule.transition)
}

/// Transitions to apply to `peer` this sweep, in application order.
pub fn evaluate(
    peer: &Peer,
    thresholds: &Thresholds,
    now_ms: i64,
    policy: CheckPolicy,
) -> Vec<Transition> {
    if !is_eligible(peer) {
        return Vec::new();
    }

    match policy {
        CheckPolicy::Priority => {
            first_match(USAGE_RULES.iter().chain(&EXPIRY_RULES), peer, thresholds, now_ms)
                .into_iter()
                .collect()
        }
        CheckPolicy::Independent => [
            first_match(&USAGE_RULES, peer, thresholds, now_ms),
            first_match(&EXPIRY_RULES, peer, thresholds, now_ms),
        ]
        .into_iter()
        .flatten()
        .collect(),
    }
}
