use crate::error::AppError;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Requests older (or newer) than this are rejected to bound replay attacks
const MAX_REQUEST_AGE_MS: f64 = 5.0 * 60.0 * 1000.0;

const SIGNATURE_VERSION: &str = "v0";

/// Verify a Slack request signature against the current wall clock
///
/// Never fails loudly: any missing input, stale timestamp or mismatch is
/// reported as `false`.
pub fn verify_slack_request(
    signing_secret: &str,
    timestamp: &str,
    signature: &str,
    body: &[u8],
) -> bool {
    verify_slack_request_at(
        signing_secret,
        timestamp,
        signature,
        body,
        chrono::Utc::now().timestamp_millis(),
    )
}

/// Same as [`verify_slack_request`], with an explicit "now" in epoch millis
pub fn verify_slack_request_at(
    signing_secret: &str,
    timestamp: &str,
    signature: &str,
    body: &[u8],
    now_ms: i64,
) -> bool {
    check_slack_signature_at(
        signing_secret,
        Some(timestamp),
        Some(signature),
        body,
        now_ms,
    )
    .is_ok()
}

/// Check a Slack request signature, explaining why it was rejected
///
/// Slack signs all requests with HMAC-SHA256 using the signing secret.
///
/// # Algorithm
/// 1. Reject if `|now - timestamp * 1000|` exceeds five minutes
/// 2. Compute HMAC-SHA256 over `v0:{timestamp}:{body}` with the signing secret
/// 3. Compare `v0={hex digest}` with the provided signature in constant time
///
/// # Errors
/// - `SignatureMissing` if the secret, a header or the body is absent/empty
/// - `SignatureExpired` if the timestamp is outside the five minute window
/// - `SignatureInvalid` if the timestamp is malformed or the signature doesn't match
pub fn check_slack_signature(
    signing_secret: &str,
    timestamp: Option<&str>,
    signature: Option<&str>,
    body: &[u8],
) -> Result<(), AppError> {
    check_slack_signature_at(
        signing_secret,
        timestamp,
        signature,
        body,
        chrono::Utc::now().timestamp_millis(),
    )
}

fn check_slack_signature_at(
    signing_secret: &str,
    timestamp: Option<&str>,
    signature: Option<&str>,
    body: &[u8],
    now_ms: i64,
) -> Result<(), AppError> {
    let timestamp = timestamp.filter(|t| !t.is_empty());
    let signature = signature.filter(|s| !s.is_empty());
    let (Some(timestamp), Some(signature)) = (timestamp, signature) else {
        return Err(AppError::SignatureMissing);
    };
    if signing_secret.is_empty() || body.is_empty() {
        return Err(AppError::SignatureMissing);
    }

    let request_seconds = timestamp
        .trim()
        .parse::<f64>()
        .map_err(|_| AppError::SignatureInvalid("Invalid timestamp format".to_string()))?;

    let age_ms = (now_ms as f64 - request_seconds * 1000.0).abs();
    if !age_ms.is_finite() {
        return Err(AppError::SignatureInvalid(
            "Invalid timestamp format".to_string(),
        ));
    }
    if age_ms > MAX_REQUEST_AGE_MS {
        return Err(AppError::SignatureExpired(
            "Request timestamp outside the allowed window".to_string(),
        ));
    }

    // Slack always sends lower-case hex; anything else is not its signature
    let provided = signature
        .strip_prefix("v0=")
        .filter(|hex_digest| !hex_digest.bytes().any(|b| b.is_ascii_uppercase()))
        .and_then(|hex_digest| hex::decode(hex_digest).ok())
        .ok_or_else(|| AppError::SignatureInvalid("Malformed signature".to_string()))?;

    // verify_slice checks the length first, then compares in constant time
    signing_mac(signing_secret, timestamp, body)?
        .verify_slice(&provided)
        .map_err(|_| {
            tracing::warn!("Slack signature verification failed");
            AppError::SignatureInvalid("Signature does not match".to_string())
        })?;

    tracing::debug!("Slack signature verified successfully");
    Ok(())
}

/// Compute the `v0=<hex>` signature Slack would send for this request
pub fn compute_signature(
    signing_secret: &str,
    timestamp: &str,
    body: &[u8],
) -> Result<String, AppError> {
    let mac = signing_mac(signing_secret, timestamp, body)?;
    Ok(format!(
        "{}={}",
        SIGNATURE_VERSION,
        hex::encode(mac.finalize().into_bytes())
    ))
}

fn signing_mac(signing_secret: &str, timestamp: &str, body: &[u8]) -> Result<HmacSha256, AppError> {
    let mut mac = HmacSha256::new_from_slice(signing_secret.as_bytes())
        .map_err(|e| AppError::SignatureInvalid(format!("Invalid key: {}", e)))?;
    mac.update(format!("{}:{}:", SIGNATURE_VERSION, timestamp).as_bytes());
    mac.update(body);
    Ok(mac)
}
