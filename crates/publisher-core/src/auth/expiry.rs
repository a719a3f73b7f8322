//! Token expiry arithmetic.
//!
//! Timestamps are naive UTC in ISO-8601 with second precision
//! (`2026-10-19T12:00:00`), the form callers store next to the token.

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};

/// Refresh this long before the hard expiry
pub const DEFAULT_EXPIRY_BUFFER_MINUTES: i64 = 60;

const EXPIRY_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Current UTC time plus `expires_in` seconds, as an ISO-8601 string.
/// None when the lifetime falls outside the representable date range.
pub fn calculate_token_expiry(expires_in: i64) -> Option<String> {
    expiry_from(Utc::now().naive_utc(), expires_in)
}

/// True if the token is missing, unparsable, or within `buffer_minutes` of expiring
pub fn is_token_expired(expires_at: Option<&str>, buffer_minutes: i64) -> bool {
    expired_at(expires_at, buffer_minutes, Utc::now().naive_utc())
}

fn expiry_from(now: NaiveDateTime, expires_in: i64) -> Option<String> {
    let lifetime = TimeDelta::try_seconds(expires_in)?;
    let expiry = now.checked_add_signed(lifetime)?;
    Some(expiry.format(EXPIRY_FORMAT).to_string())
}

fn expired_at(expires_at: Option<&str>, buffer_minutes: i64, now: NaiveDateTime) -> bool {
    let Some(raw) = expires_at.map(str::trim).filter(|s| !s.is_empty()) else {
        return true;
    };

    let refresh_at = parse_expiry(raw).and_then(|expiry| {
        TimeDelta::try_minutes(buffer_minutes).and_then(|buffer| expiry.checked_sub_signed(buffer))
    });

    match refresh_at {
        Some(refresh_at) => now >= refresh_at,
        None => true,
    }
}

/// Naive timestamps are taken as UTC; offset-qualified ones are converted
fn parse_expiry(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    raw.parse::<NaiveDateTime>().ok()
}
