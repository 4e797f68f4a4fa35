//! Access-token expiry inspection
//!
//! Tokens are treated as opaque unless they look like a JWT carrying an `exp`
//! claim. The signature is never checked here; the backend does that.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, TimeDelta, Utc};
use serde::Deserialize;

#[derive(Deserialize)]
struct ExpiryClaim {
    exp: Option<i64>,
}

/// Expiry time encoded in a JWT access token, if any
pub fn expires_at(token: &str) -> Option<DateTime<Utc>> {
    let mut segments = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return None;
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    let claim: ExpiryClaim = serde_json::from_slice(&bytes).ok()?;
    DateTime::from_timestamp(claim.exp?, 0)
}

/// Whether `token` expires within `skew` of `now`.
///
/// Opaque tokens never report as expiring. A skew reaching past the end of
/// representable time treats every JWT as expiring.
pub fn expires_within(token: &str, skew: TimeDelta, now: DateTime<Utc>) -> bool {
    expires_at(token).is_some_and(|exp| {
        now.checked_add_signed(skew)
            .is_none_or(|limit| exp <= limit)
    })
}
