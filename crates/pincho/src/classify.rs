//! Response classification.
//!
//! Maps one physical HTTP exchange onto either a parsed
//! [`NotificationResponse`] or a typed [`PushError`] whose kind carries the
//! retryability decision the executor acts on.

use std::time::Duration;

use serde::Deserialize;

use crate::error::PushError;
use crate::models::NotificationResponse;
use crate::transport::AttemptResponse;

/// Error payload shared by both API variants. One variant nests the detail
/// under `error`, the other puts a flat `message` next to `status`; both are
/// tolerated, preferring the nested form.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<ErrorDetail>,
}

/// Structured error detail returned by the nested body shape.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorDetail {
    #[serde(default, rename = "type")]
    pub error_type: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    /// Name of the request field the server rejected, if any.
    #[serde(default)]
    pub param: Option<String>,
}

/// Classify one HTTP exchange.
///
/// 2xx bodies must parse as [`NotificationResponse`]; anything else on a
/// success status is a protocol mismatch, not a transient condition, and is
/// reported as a non-retryable `InvalidResponse`. Non-2xx statuses map onto
/// the fixed category table, with the human-readable message assembled from
/// whichever error-body shape the server used.
pub(crate) fn classify(response: AttemptResponse) -> Result<NotificationResponse, PushError> {
    let AttemptResponse {
        status,
        body,
        retry_after,
    } = response;

    if (200..300).contains(&status) {
        return serde_json::from_str(&body).map_err(|e| {
            PushError::invalid_response(format!("malformed success body: {e}"))
        });
    }

    let message = error_message(status, &body);
    Err(match status {
        400 | 404 => PushError::Validation { status, message },
        401 | 403 => PushError::Authentication { status, message },
        429 => PushError::RateLimited {
            message,
            retry_after: retry_after.as_deref().and_then(parse_retry_after),
        },
        500..=599 => PushError::Server { status, message },
        _ => PushError::Api { status, message },
    })
}

/// Build the descriptive message for a non-2xx body.
fn error_message(status: u16, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(detail) = &parsed.error
            && let Some(msg) = detail.message.as_deref()
        {
            let mut out = msg.to_string();
            if let Some(param) = detail.param.as_deref() {
                out.push_str(&format!(" (parameter: {param})"));
            }
            if let Some(code) = detail.code.as_deref() {
                out.push_str(&format!(" [{code}]"));
            }
            return out;
        }
        if let Some(msg) = parsed.message {
            return msg;
        }
    }
    format!("HTTP {status}: {body}")
}

/// Parse a `Retry-After` header value: integer seconds, or an HTTP-date
/// whose delay from now is positive.
fn parse_retry_after(value: &str) -> Option<Duration> {
    let value = value.trim();
    if let Ok(seconds) = value.parse::<u64>() {
        return (seconds > 0).then(|| Duration::from_secs(seconds));
    }
    let date = chrono::DateTime::parse_from_rfc2822(value).ok()?;
    date.signed_duration_since(chrono::Utc::now())
        .to_std()
        .ok()
        .filter(|d| *d > Duration::ZERO)
}
