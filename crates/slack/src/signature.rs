//! Slack request-signature verification for the events webhook.
//!
//! Slack signs each delivery with
//! `v0=hex(hmac_sha256(signing_secret, "v0:{timestamp}:{body}"))` in the
//! `X-Slack-Signature` header, with the timestamp in
//! `X-Slack-Request-Timestamp`. Deliveries older than five minutes are
//! rejected to blunt replay.

use {
    hmac::{Hmac, Mac},
    sha2::Sha256,
    tracing::warn,
};

type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_VERSION: &str = "v0";
const MAX_TIMESTAMP_SKEW_SECS: i64 = 300;

/// Verify a delivery against the configured signing secret.
///
/// `now_unix` is passed in rather than read from the clock so staleness is
/// testable.
pub fn verify_signature(
    body: &[u8],
    timestamp_header: &str,
    signature_header: &str,
    signing_secret: &str,
    now_unix: i64,
) -> bool {
    let timestamp = match timestamp_header.trim().parse::<i64>() {
        Ok(value) => value,
        Err(_) => {
            warn!("invalid slack request timestamp header");
            return false;
        }
    };

    if (now_unix - timestamp).abs() > MAX_TIMESTAMP_SKEW_SECS {
        warn!(timestamp, "stale slack request timestamp");
        return false;
    }

    let expected = match signature_header.strip_prefix("v0=") {
        Some(hex) => hex,
        None => {
            warn!("invalid slack signature header format (missing v0= prefix)");
            return false;
        }
    };

    let mut mac = match HmacSha256::new_from_slice(signing_secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => {
            warn!("failed to create HMAC from signing secret");
            return false;
        }
    };

    mac.update(SIGNATURE_VERSION.as_bytes());
    mac.update(b":");
    mac.update(timestamp_header.trim().as_bytes());
    mac.update(b":");
    mac.update(body);
    let computed = hex::encode(mac.finalize().into_bytes());

    // Constant-time comparison to prevent timing attacks.
    constant_time_eq(&computed, expected)
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes().zip(b.bytes()).fold(0, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::{constant_time_eq, verify_signature, HmacSha256};
    use hmac::Mac;

    const SECRET: &str = "8f742231b10e8888abcd99yyyzzz85a5";
    const NOW: i64 = 1_730_000_000;

    fn sign(body: &[u8], timestamp: i64) -> String {
        let mut mac = HmacSha256::new_from_slice(SECRET.as_bytes()).expect("hmac");
        mac.update(format!("v0:{timestamp}:").as_bytes());
        mac.update(body);
        format!("v0={}", hex::encode(mac.finalize().into_bytes()))
    }

    #[test]
    fn accepts_valid_signature() {
        let body = br#"{"type":"event_callback"}"#;
        let signature = sign(body, NOW);

        assert!(verify_signature(body, &NOW.to_string(), &signature, SECRET, NOW));
    }

    #[test]
    fn rejects_tampered_body() {
        let signature = sign(b"original body", NOW);

        assert!(!verify_signature(
            b"tampered body",
            &NOW.to_string(),
            &signature,
            SECRET,
            NOW
        ));
    }

    #[test]
    fn rejects_stale_timestamp() {
        let body = b"body";
        let stale = NOW - 301;
        let signature = sign(body, stale);

        assert!(!verify_signature(body, &stale.to_string(), &signature, SECRET, NOW));
    }

    #[test]
    fn accepts_timestamp_at_skew_boundary() {
        let body = b"body";
        let boundary = NOW - 300;
        let signature = sign(body, boundary);

        assert!(verify_signature(body, &boundary.to_string(), &signature, SECRET, NOW));
    }

    #[test]
    fn rejects_missing_version_prefix() {
        assert!(!verify_signature(b"body", &NOW.to_string(), "sha256=abc", SECRET, NOW));
    }

    #[test]
    fn rejects_non_numeric_timestamp() {
        let signature = sign(b"body", NOW);
        assert!(!verify_signature(b"body", "not-a-number", &signature, SECRET, NOW));
    }

    #[test]
    fn constant_time_eq_handles_length_mismatch() {
        assert!(constant_time_eq("abc", "abc"));
        assert!(!constant_time_eq("abc", "abd"));
        assert!(!constant_time_eq("abc", "abcd"));
    }
}
