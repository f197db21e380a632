//! Bearer-token claim decoding.
//!
//! The client never *verifies* a token: the server is the authority on
//! whether a token is valid. All we need from it is the expiry, so we
//! can renew the session before the server starts rejecting requests.
//!
//! A JWT looks like `header.payload.signature`, each segment base64url
//! encoded. The payload is a JSON object; its `exp` claim is the expiry
//! in seconds since the Unix epoch.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::{Map, Value as JsonValue};

/// The claims we read out of a bearer token.
#[derive(Debug, Clone, PartialEq)]
pub struct Claims {
    /// Expiry as milliseconds since the Unix epoch (`exp * 1000`).
    pub expires_at_ms: u64,
    /// Every other claim, untouched. Nothing in the client interprets
    /// these; they are kept for UI collaborators that want `sub`, `name`…
    pub extra: Map<String, JsonValue>,
}

impl Claims {
    /// Gets a pass-through claim by key.
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.extra.get(key)
    }

    /// Returns `true` if the token has expired at `now_ms`.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at_ms
    }
}

/// Decodes a token's claims without verifying its signature.
///
/// Returns `None` (never panics) if the token isn't three
/// dot-separated segments, the payload isn't base64url, the payload
/// isn't a JSON object, or `exp` is missing or not a non-negative
/// number. `None` means "can't schedule a refresh"; the token itself
/// may still be perfectly usable for requests.
pub fn decode_claims(token: &str) -> Option<Claims> {
    let mut segments = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return None;
    };

    // Some issuers pad their segments; the JWT spec says they shouldn't.
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    let JsonValue::Object(mut extra) =
        serde_json::from_slice::<JsonValue>(&bytes).ok()?
    else {
        return None;
    };

    let exp_secs = extra.remove("exp")?.as_f64()?;
    if !exp_secs.is_finite() || exp_secs < 0.0 {
        return None;
    }

    Some(Claims {
        expires_at_ms: (exp_secs * 1000.0) as u64,
        extra,
    })
}
