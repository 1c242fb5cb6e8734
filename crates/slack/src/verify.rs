//! Slack request signature verification.
//!
//! Slack signs every request with `v0=hex(HMAC-SHA256(secret, "v0:{timestamp}:{body}"))`
//! and sends the result in `X-Slack-Signature`. Requests whose timestamp is more
//! than five minutes away from the local clock are rejected before the signature
//! is computed, which bounds how long a captured request can be replayed.

use hmac::digest::{Key, KeyInit};
use hmac::{Hmac, Mac};
use http::header::CONTENT_TYPE;
use http::{HeaderMap, Method};
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use slashbot_core::errors::ApplicationError;
use subtle::ConstantTimeEq;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-slack-signature";
pub const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
pub const SIGNATURE_VERSION: &str = "v0";
pub const REPLAY_WINDOW_SECS: u64 = 300;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum VerificationError {
    #[error("unexpected request method `{0}`")]
    MethodNotAllowed(String),
    #[error("unexpected content type `{0}`")]
    UnsupportedContentType(String),
    #[error("missing or empty `{0}` header")]
    MissingHeader(&'static str),
    #[error("timestamp header `{0}` is not a unix epoch")]
    InvalidTimestamp(String),
    #[error("timestamp {timestamp} is outside the replay window (now {now})")]
    StaleTimestamp { timestamp: i64, now: i64 },
    #[error("computed signature does not match the provided signature")]
    SignatureMismatch,
}

impl From<VerificationError> for ApplicationError {
    fn from(value: VerificationError) -> Self {
        match value {
            VerificationError::MethodNotAllowed(method) => Self::MethodNotAllowed(method),
            VerificationError::UnsupportedContentType(content_type) => {
                Self::UnsupportedMediaType(content_type)
            }
            other => Self::Authentication(other.to_string()),
        }
    }
}

/// Holds the signing secret for the lifetime of the process. Cloning shares nothing
/// mutable; every call to [`RequestVerifier::verify`] is independent.
#[derive(Clone, Debug)]
pub struct RequestVerifier {
    signing_secret: SecretString,
}

impl RequestVerifier {
    pub fn new(signing_secret: SecretString) -> Self {
        Self { signing_secret }
    }

    /// Checks method, content type, headers, freshness and signature in that order.
    /// Returns the body untouched so it can be parsed afterwards.
    pub fn verify<'a>(
        &self,
        method: &Method,
        headers: &HeaderMap,
        body: &'a [u8],
        now: i64,
    ) -> Result<&'a [u8], VerificationError> {
        if *method != Method::POST {
            return Err(VerificationError::MethodNotAllowed(method.to_string()));
        }

        let content_type = header_value(headers, CONTENT_TYPE.as_str()).unwrap_or_default();
        if !is_form_content_type(content_type) {
            return Err(VerificationError::UnsupportedContentType(content_type.to_owned()));
        }

        let signature = header_value(headers, SIGNATURE_HEADER)
            .filter(|value| !value.is_empty())
            .ok_or(VerificationError::MissingHeader(SIGNATURE_HEADER))?;
        let timestamp = header_value(headers, TIMESTAMP_HEADER)
            .filter(|value| !value.is_empty())
            .ok_or(VerificationError::MissingHeader(TIMESTAMP_HEADER))?;

        let issued_at = timestamp
            .parse::<i64>()
            .map_err(|_| VerificationError::InvalidTimestamp(timestamp.to_owned()))?;
        if now.abs_diff(issued_at) > REPLAY_WINDOW_SECS {
            return Err(VerificationError::StaleTimestamp { timestamp: issued_at, now });
        }

        let expected = compute_signature(self.signing_secret.expose_secret(), timestamp, body);
        if !signatures_match(&expected, signature) {
            return Err(VerificationError::SignatureMismatch);
        }

        Ok(body)
    }
}

/// `v0=` followed by the lowercase hex HMAC-SHA256 of `v0:{timestamp}:{body}`.
pub fn compute_signature(signing_secret: &str, timestamp: &str, body: &[u8]) -> String {
    let mut mac = keyed_mac(signing_secret.as_bytes());
    mac.update(SIGNATURE_VERSION.as_bytes());
    mac.update(b":");
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    mac.update(body);

    format!("{SIGNATURE_VERSION}={}", hex::encode(mac.finalize().into_bytes()))
}

/// RFC 2104 key preparation: secrets longer than the SHA-256 block are hashed
/// first, shorter ones are zero padded. Every secret yields a key.
fn keyed_mac(secret: &[u8]) -> HmacSha256 {
    let mut key = Key::<HmacSha256>::default();
    if secret.len() > key.len() {
        let digest = Sha256::digest(secret);
        key[..digest.len()].copy_from_slice(&digest);
    } else {
        key[..secret.len()].copy_from_slice(secret);
    }
    <HmacSha256 as KeyInit>::new(&key)
}

/// Constant-time over the common length; the length itself is public (the
/// expected signature is always 67 bytes).
pub fn signatures_match(expected: &str, provided: &str) -> bool {
    let expected = expected.as_bytes();
    let provided = provided.as_bytes();
    if expected.len() != provided.len() {
        return false;
    }

    expected.ct_eq(provided).into()
}

fn header_value<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
    headers.get(name).and_then(|value| value.to_str().ok()).map(str::trim)
}

fn is_form_content_type(value: &str) -> bool {
    let media_type = value.split(';').next().unwrap_or_default().trim();
    media_type.eq_ignore_ascii_case(FORM_CONTENT_TYPE)
}
