//! Human-readable byte counts and remaining-time strings.
//!
//! Used by the `/list` reply. Units are decimal above the first step
//! (1024 bytes to a KB, then 1000 KB to an MB and so on).

/// Unit ladder above kilobytes.
const STEP: f64 = 1000.0;

/// Values below this stay in the current unit.
const UNIT_LIMIT: f64 = 100.0;

/// Format a byte count, e.g. `"9.8 GB"` or `"512KB"`.
///
/// A zero count renders as `"00.00 KB"` (or `"00.00KB"` without `space`).
#[allow(clippy::cast_precision_loss)]
pub fn format_bytes(total_bytes: i64, space: bool) -> String {
    let sep = if space { " " } else { "" };
    if total_bytes == 0 {
        return format!("00.00{sep}KB");
    }

    let kilos = (total_bytes / 1024) as f64;
    let megas = kilos / STEP;
    let gigas = megas / STEP;
    let teras = gigas / STEP;

    let (value, unit) = if kilos < UNIT_LIMIT {
        (kilos, "KB")
    } else if megas < UNIT_LIMIT {
        (megas, "MB")
    } else if gigas < UNIT_LIMIT {
        (gigas, "GB")
    } else {
        (teras, "TB")
    };

    if (value - value.trunc()).abs() < f64::EPSILON {
        format!("{value:.0}{sep}{unit}")
    } else {
        format!("{value:.1}{sep}{unit}")
    }
}

/// Format the time left until `expires_at_ms`, e.g. `"5hours"` or `"-2days"`.
///
/// An expiry of `0` means the peer has no known expiry and renders as
/// `"unknown"`. Past instants carry a leading `-` unless `no_prefix` is set.
/// Every step truncates toward zero.
pub fn format_expiry(expires_at_ms: i64, now_ms: i64, no_prefix: bool) -> String {
    if expires_at_ms == 0 {
        return "unknown".to_string();
    }

    let total_seconds = expires_at_ms.saturating_sub(now_ms) / 1000;
    let prefix = if total_seconds < 0 && !no_prefix { "-" } else { "" };
    let total_seconds = total_seconds.unsigned_abs();

    if total_seconds < 60 {
        return format!("{prefix}{total_seconds}seconds");
    }

    let total_minutes = total_seconds / 60;
    if total_minutes < 60 {
        return format!("{prefix}{total_minutes}minutes");
    }

    let total_hours = total_minutes / 60;
    if total_hours < 24 {
        return format!("{prefix}{total_hours}hours");
    }

    format!("{prefix}{}days", total_hours / 24)
}
