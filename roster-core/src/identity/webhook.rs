use std::fmt;

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;
use zeroize::Zeroizing;

type HmacSha256 = Hmac<Sha256>;

pub const HEADER_ID: &str = "svix-id";
pub const HEADER_TIMESTAMP: &str = "svix-timestamp";
pub const HEADER_SIGNATURE: &str = "svix-signature";

const SECRET_PREFIX: &str = "whsec_";
const SIGNATURE_VERSION: &str = "v1";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WebhookError {
    #[error("webhook signing secret must not be empty")]
    EmptySecret,
    #[error("webhook signing secret is not valid base64")]
    InvalidSecret,
    #[error("missing webhook header {0}")]
    MissingHeader(&'static str),
    #[error("webhook timestamp is not a unix timestamp")]
    InvalidTimestamp,
    #[error("webhook timestamp is outside the accepted window")]
    TimestampOutOfTolerance,
    #[error("no webhook signature matched")]
    SignatureMismatch,
    #[error("invalid webhook payload: {0}")]
    InvalidPayload(String),
}

/// The three headers that accompany each delivery.
#[derive(Debug, Clone, Copy)]
pub struct WebhookHeaders<'a> {
    pub id: &'a str,
    pub timestamp: &'a str,
    pub signature: &'a str,
}

/// Verifies the HMAC-SHA-256 signatures the identity provider attaches to
/// webhook deliveries.
///
/// The signed content is `"{id}.{timestamp}.{body}"`; the signature header
/// holds one or more space separated `v1,<base64>` entries, any of which
/// may match (the provider sends several while rotating secrets).
pub struct WebhookVerifier {
    key: Zeroizing<Vec<u8>>,
    tolerance_secs: u64,
}

impl fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("key", &"<redacted>")
            .field("tolerance_secs", &self.tolerance_secs)
            .finish()
    }
}

impl WebhookVerifier {
    pub const DEFAULT_TOLERANCE_SECS: u64 = 300;

    /// Build a verifier from a `whsec_` secret. Secrets without the prefix
    /// are accepted as raw base64.
    pub fn new(secret: &str, tolerance_secs: u64) -> Result<Self, WebhookError> {
        let encoded = secret.trim();
        let encoded = encoded.strip_prefix(SECRET_PREFIX).unwrap_or(encoded);
        if encoded.is_empty() {
            return Err(WebhookError::EmptySecret);
        }
        let key = BASE64
            .decode(encoded)
            .map_err(|_| WebhookError::InvalidSecret)?;
        if key.is_empty() {
            return Err(WebhookError::EmptySecret);
        }

        Ok(Self {
            key: Zeroizing::new(key),
            tolerance_secs,
        })
    }

    /// Check the signature and timestamp of one delivery.
    pub fn verify(
        &self,
        headers: &WebhookHeaders<'_>,
        body: &[u8],
        now: DateTime<Utc>,
    ) -> Result<(), WebhookError> {
        if headers.id.is_empty() {
            return Err(WebhookError::MissingHeader(HEADER_ID));
        }
        if headers.signature.trim().is_empty() {
            return Err(WebhookError::MissingHeader(HEADER_SIGNATURE));
        }
        let timestamp: i64 = headers
            .timestamp
            .trim()
            .parse()
            .map_err(|_| WebhookError::InvalidTimestamp)?;
        if now.timestamp().abs_diff(timestamp) > self.tolerance_secs {
            return Err(WebhookError::TimestampOutOfTolerance);
        }

        let candidates = headers
            .signature
            .split_whitespace()
            .filter_map(|entry| entry.split_once(','))
            .filter(|(version, _)| *version == SIGNATURE_VERSION)
            .filter_map(|(_, encoded)| BASE64.decode(encoded).ok());

        for candidate in candidates {
            let mac = self.mac_for(headers.id, timestamp, body);
            if mac.verify_slice(&candidate).is_ok() {
                return Ok(());
            }
        }
        Err(WebhookError::SignatureMismatch)
    }

    /// Produce a `v1,<base64>` signature entry. Used by tests and local
    /// tooling that replays deliveries.
    pub fn sign(&self, id: &str, timestamp: i64, body: &[u8]) -> String {
        let digest = self.mac_for(id, timestamp, body).finalize().into_bytes();
        format!("{SIGNATURE_VERSION},{}", BASE64.encode(digest))
    }

    fn mac_for(&self, id: &str, timestamp: i64, body: &[u8]) -> HmacSha256 {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .expect("HMAC-SHA-256 accepts keys of any size");
        mac.update(id.as_bytes());
        mac.update(b".");
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(body);
        mac
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    const SECRET: &str = "whsec_MfKQ9r8GKYqrTwjUPD8ILPZIo2LaLaSw";

    fn headers<'a>(id: &'a str, ts: &'a str, sig: &'a str) -> WebhookHeaders<'a> {
        WebhookHeaders {
            id,
            timestamp: ts,
            signature: sig,
        }
    }

    #[test]
    fn accepts_valid_signature() {
        let verifier = WebhookVerifier::new(SECRET, 300).unwrap();
        let now = Utc::now();
        let body = br#"{"type":"user.created"}"#;
        let ts = now.timestamp().to_string();
        let sig = verifier.sign("msg_1", now.timestamp(), body);

        assert_eq!(
            verifier.verify(&headers("msg_1", &ts, &sig), body, now),
            Ok(())
        );
    }

    #[test]
    fn accepts_any_of_several_signatures() {
        let verifier = WebhookVerifier::new(SECRET, 300).unwrap();
        let now = Utc::now();
        let body = b"{}";
        let ts = now.timestamp().to_string();
        let good = verifier.sign("msg_2", now.timestamp(), body);
        let header = format!("v1,Zm9vYmFy v2,ignored {good}");

        assert!(
            verifier
                .verify(&headers("msg_2", &ts, &header), body, now)
                .is_ok()
        );
    }

    #[test]
    fn rejects_tampered_body() {
        let verifier = WebhookVerifier::new(SECRET, 300).unwrap();
        let now = Utc::now();
        let ts = now.timestamp().to_string();
        let sig = verifier.sign("msg_3", now.timestamp(), b"original");

        assert_eq!(
            verifier.verify(&headers("msg_3", &ts, &sig), b"tampered", now),
            Err(WebhookError::SignatureMismatch)
        );
    }

    #[test]
    fn rejects_stale_timestamp() {
        let verifier = WebhookVerifier::new(SECRET, 300).unwrap();
        let sent = Utc::now() - Duration::seconds(301);
        let ts = sent.timestamp().to_string();
        let sig = verifier.sign("msg_4", sent.timestamp(), b"{}");

        assert_eq!(
            verifier.verify(&headers("msg_4", &ts, &sig), b"{}", Utc::now()),
            Err(WebhookError::TimestampOutOfTolerance)
        );
    }

    #[test]
    fn rejects_extreme_timestamps() {
        let verifier = WebhookVerifier::new(SECRET, 300).unwrap();
        let now = Utc::now();
        for ts in ["-9223372036854775808", "9223372036854775807"] {
            assert_eq!(
                verifier.verify(&headers("msg_5", ts, "v1,abc"), b"{}", now),
                Err(WebhookError::TimestampOutOfTolerance)
            );
        }
    }

    #[test]
    fn rejects_missing_headers_and_bad_secrets() {
        let verifier = WebhookVerifier::new(SECRET, 300).unwrap();
        let now = Utc::now();
        assert_eq!(
            verifier.verify(&headers("", "1", "v1,abc"), b"{}", now),
            Err(WebhookError::MissingHeader(HEADER_ID))
        );
        assert_eq!(
            verifier.verify(&headers("msg", "soon", "v1,abc"), b"{}", now),
            Err(WebhookError::InvalidTimestamp)
        );
        assert!(matches!(
            WebhookVerifier::new("whsec_", 300),
            Err(WebhookError::EmptySecret)
        ));
        assert!(matches!(
            WebhookVerifier::new("whsec_not base64!", 300),
            Err(WebhookError::InvalidSecret)
        ));
    }
}
