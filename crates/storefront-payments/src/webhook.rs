//! Signature verification for provider webhook deliveries.
//!
//! The signature header has the form `t=<unix seconds>,v1=<hex>[,v1=<hex>...]`.
//! Each `v1` value is an HMAC-SHA256 of `"{t}.{payload}"` keyed with the
//! endpoint secret. A delivery is accepted when any `v1` matches and the
//! timestamp is within the tolerance window.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::PaymentError;
use crate::types::WebhookEvent;

type HmacSha256 = Hmac<Sha256>;

/// Maximum age of a delivery, in seconds.
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

struct SignatureHeader<'a> {
    timestamp: i64,
    signatures: Vec<&'a str>,
}

fn parse_header(header: &str) -> Result<SignatureHeader<'_>, PaymentError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => {
                timestamp = Some(value.parse::<i64>().map_err(|_| {
                    PaymentError::InvalidSignature(format!("invalid timestamp '{value}'"))
                })?);
            }
            "v1" => signatures.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp
        .ok_or_else(|| PaymentError::InvalidSignature("missing timestamp".to_owned()))?;
    if signatures.is_empty() {
        return Err(PaymentError::InvalidSignature("no v1 signature".to_owned()));
    }

    Ok(SignatureHeader {
        timestamp,
        signatures,
    })
}

/// Computes the hex signature the provider would send for `payload` at `timestamp`.
///
/// # Errors
///
/// Returns [`PaymentError::InvalidSignature`] if `secret` cannot key the HMAC.
pub fn sign(payload: &[u8], timestamp: i64, secret: &str) -> Result<String, PaymentError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| PaymentError::InvalidSignature(e.to_string()))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verifies `header` against `payload` at time `now` (unix seconds).
///
/// # Errors
///
/// Returns [`PaymentError::InvalidSignature`] if the header is malformed,
/// the timestamp is outside `tolerance_secs`, or no signature matches.
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    now: i64,
    tolerance_secs: i64,
) -> Result<(), PaymentError> {
    let parsed = parse_header(header)?;

    if (now - parsed.timestamp).abs() > tolerance_secs {
        return Err(PaymentError::InvalidSignature(
            "timestamp outside the tolerance zone".to_owned(),
        ));
    }

    let expected = sign(payload, parsed.timestamp, secret)?;
    let matched = parsed
        .signatures
        .iter()
        .any(|candidate| bool::from(expected.as_bytes().ct_eq(candidate.as_bytes())));

    if matched {
        Ok(())
    } else {
        Err(PaymentError::InvalidSignature(
            "no signatures found matching the expected signature".to_owned(),
        ))
    }
}

/// Verifies a delivery against the current clock and parses the event.
///
/// # Errors
///
/// Returns [`PaymentError::InvalidSignature`] on verification failure and
/// [`PaymentError::Deserialize`] if the verified body is not an event.
pub fn construct_event(
    payload: &[u8],
    header: &str,
    secret: &str,
) -> Result<WebhookEvent, PaymentError> {
    verify_signature(
        payload,
        header,
        secret,
        chrono::Utc::now().timestamp(),
        DEFAULT_TOLERANCE_SECS,
    )?;

    serde_json::from_slice(payload).map_err(|e| PaymentError::Deserialize {
        context: "webhook event".to_owned(),
        source: e,
    })
}
