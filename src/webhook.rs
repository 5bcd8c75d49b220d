//! Webhook signature and replay checks.
//!
//! The gateway signs each notification with HMAC-SHA256 over the raw request
//! body, keyed with the application secret, and sends the digest base64
//! encoded. Verification is a pure function of its inputs.

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::{Error, Result};
use crate::models::WebhookNotification;

type HmacSha256 = Hmac<Sha256>;

/// Accepted difference between event time and local time
pub const DEFAULT_TIMESTAMP_TOLERANCE_SECS: u64 = 300;

/// Base64-encoded HMAC-SHA256 of `payload` keyed with `secret`
pub fn compute_signature(payload: &[u8], secret: &str) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| Error::Configuration(format!("Invalid webhook signing key: {}", e)))?;
    mac.update(payload);
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Check a provided signature against the payload.
///
/// Comparison ignores ASCII case and runs in constant time over the encoded
/// digest. A blank signature or secret never verifies.
pub fn verify_signature(payload: &[u8], signature: &str, app_secret: &str) -> bool {
    let signature = signature.trim();
    if signature.is_empty() || app_secret.trim().is_empty() {
        tracing::debug!("Webhook signature or secret is blank");
        return false;
    }

    let expected = match compute_signature(payload, app_secret) {
        Ok(signature) => signature.to_ascii_lowercase(),
        Err(e) => {
            tracing::warn!(error = %e, "Could not compute webhook signature");
            return false;
        }
    };
    let provided = signature.to_ascii_lowercase();

    expected.as_bytes().ct_eq(provided.as_bytes()).into()
}

/// True when `timestamp` (unix seconds) is within `tolerance_secs` of now
pub fn is_timestamp_valid(timestamp: i64, tolerance_secs: u64) -> bool {
    is_timestamp_valid_at(timestamp, tolerance_secs, Utc::now())
}

/// Same as [`is_timestamp_valid`] against a fixed clock
pub fn is_timestamp_valid_at(timestamp: i64, tolerance_secs: u64, now: DateTime<Utc>) -> bool {
    let difference = (i128::from(now.timestamp()) - i128::from(timestamp)).unsigned_abs();
    difference <= u128::from(tolerance_secs)
}

/// Decode a notification body
pub fn parse_notification(payload: &[u8]) -> Result<WebhookNotification> {
    serde_json::from_slice(payload)
        .map_err(|e| Error::InvalidArgument(format!("Malformed webhook payload: {}", e)))
}

/// Verify signature and freshness, then decode the notification
pub fn verify_notification(
    payload: &[u8],
    signature: &str,
    app_secret: &str,
    tolerance_secs: u64,
) -> Result<WebhookNotification> {
    if !verify_signature(payload, signature, app_secret) {
        return Err(Error::WebhookRejected("invalid signature".to_string()));
    }

    let notification = parse_notification(payload)?;

    if !is_timestamp_valid(notification.timestamp, tolerance_secs) {
        return Err(Error::WebhookRejected(format!(
            "timestamp {} outside tolerance of {}s",
            notification.timestamp, tolerance_secs
        )));
    }

    Ok(notification)
}
