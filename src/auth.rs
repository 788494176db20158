// HMAC request signing for /metrics: X-Timestamp plus X-Signature = hex(HMAC-SHA256(secret, timestamp))

use axum::extract::{Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::warn;

use crate::routes::AppState;

type HmacSha256 = Hmac<Sha256>;

pub const TIMESTAMP_HEADER: &str = "x-timestamp";
pub const SIGNATURE_HEADER: &str = "x-signature";

/// Largest accepted distance between the request timestamp and the server clock.
pub const MAX_CLOCK_SKEW_SECS: i64 = 300;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing {0} header")]
    MissingHeader(&'static str),
    #[error("timestamp is not an integer")]
    BadTimestamp,
    #[error("timestamp is {skew}s away from server time")]
    Expired { skew: i64 },
    #[error("signature mismatch")]
    BadSignature,
    #[error("invalid HMAC key")]
    InvalidKey,
}

fn keyed(secret: &str) -> Result<HmacSha256, AuthError> {
    HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| AuthError::InvalidKey)
}

/// Lowercase hex signature a client sends for `timestamp`.
pub fn sign(secret: &str, timestamp: &str) -> Result<String, AuthError> {
    let mut mac = keyed(secret)?;
    mac.update(timestamp.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Check a timestamp/signature pair against `now` (unix seconds).
pub fn verify(secret: &str, timestamp: &str, signature: &str, now: i64) -> Result<(), AuthError> {
    let ts: i64 = timestamp.parse().map_err(|_| AuthError::BadTimestamp)?;
    let skew = now.saturating_sub(ts).saturating_abs();
    if skew > MAX_CLOCK_SKEW_SECS {
        return Err(AuthError::Expired { skew });
    }
    let expected = hex::decode(signature).map_err(|_| AuthError::BadSignature)?;
    let mut mac = keyed(secret)?;
    mac.update(timestamp.as_bytes());
    mac.verify_slice(&expected).map_err(|_| AuthError::BadSignature)
}

fn header<'a>(headers: &'a HeaderMap, name: &'static str) -> Result<&'a str, AuthError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .ok_or(AuthError::MissingHeader(name))
}

fn check(secret: &str, headers: &HeaderMap) -> Result<(), AuthError> {
    let timestamp = header(headers, TIMESTAMP_HEADER)?;
    let signature = header(headers, SIGNATURE_HEADER)?;
    verify(secret, timestamp, signature, chrono::Utc::now().timestamp())
}

/// Middleware for signed routes. Passes everything through when no secret is configured.
pub(crate) async fn require_signature(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if let Some(secret) = state.secret.as_deref()
        && let Err(e) = check(secret, request.headers())
    {
        warn!(operation = "auth", path = %request.uri().path(), error = %e, "request rejected");
        return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "s3cret";

    #[test]
    fn signature_is_lowercase_hex_sha256() {
        let sig = sign(SECRET, "1700000000").unwrap();
        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
        assert_eq!(sig, sign(SECRET, "1700000000").unwrap());
        assert_ne!(sig, sign("other", "1700000000").unwrap());
    }

    #[test]
    fn known_hmac_vector() {
        // Published HMAC-SHA256 example.
        let sig = sign("key", "The quick brown fox jumps over the lazy dog").unwrap();
        assert_eq!(
            sig,
            "f7bc83f430538424b13298e6aa6fb143ef4d59a14946175997479dbc2d1a3cd8"
        );
    }

    #[test]
    fn accepts_signature_within_skew() {
        let now: i64 = 1_700_000_000;
        let ts = (now - 299).to_string();
        let sig = sign(SECRET, &ts).unwrap();
        assert_eq!(verify(SECRET, &ts, &sig, now), Ok(()));
        let ts = (now + 300).to_string();
        let sig = sign(SECRET, &ts).unwrap();
        assert_eq!(verify(SECRET, &ts, &sig, now), Ok(()));
    }

    #[test]
    fn rejects_stale_timestamp() {
        let now: i64 = 1_700_000_000;
        let ts = (now - 301).to_string();
        let sig = sign(SECRET, &ts).unwrap();
        assert_eq!(
            verify(SECRET, &ts, &sig, now),
            Err(AuthError::Expired { skew: 301 })
        );
    }

    #[test]
    fn rejects_bad_inputs() {
        let now: i64 = 1_700_000_000;
        let ts = now.to_string();
        assert_eq!(verify(SECRET, "soon", "00", now), Err(AuthError::BadTimestamp));
        assert_eq!(verify(SECRET, &ts, "zz", now), Err(AuthError::BadSignature));
        let wrong = sign("other", &ts).unwrap();
        assert_eq!(verify(SECRET, &ts, &wrong, now), Err(AuthError::BadSignature));
        let upper = sign(SECRET, &ts).unwrap().to_uppercase();
        assert_eq!(verify(SECRET, &ts, &upper, now), Ok(()));
    }

    #[test]
    fn missing_headers_are_reported() {
        let mut headers = HeaderMap::new();
        assert_eq!(
            check(SECRET, &headers),
            Err(AuthError::MissingHeader(TIMESTAMP_HEADER))
        );
        headers.insert(TIMESTAMP_HEADER, "1".parse().unwrap());
        assert_eq!(
            check(SECRET, &headers),
            Err(AuthError::MissingHeader(SIGNATURE_HEADER))
        );
    }
}
