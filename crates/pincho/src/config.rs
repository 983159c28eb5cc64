//! Client configuration: API variant, credentials, and per-client knobs.

use std::time::Duration;

use crate::error::PushError;

/// Default per-attempt request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Default retry budget after the initial attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

pub(crate) const SEND_PATH: &str = "/send";
pub(crate) const NOTIFAI_PATH: &str = "/notifai";

/// One of the two near-identical API deployments.
///
/// The variants share every behavior; they differ only in where they live
/// and in the wire name of the AI endpoint's free-text field. Modeling that
/// as data keeps a single client engine instead of two parallel ones.
#[derive(Debug, Clone)]
pub struct Variant {
    pub name: &'static str,
    pub default_base_url: &'static str,
    /// Wire field carrying the AI input text (`"input"` vs `"text"`).
    pub ai_input_field: &'static str,
}

impl Variant {
    pub fn pincho() -> Self {
        Self {
            name: "pincho",
            default_base_url: "https://api.pincho.app",
            ai_input_field: "input",
        }
    }

    pub fn wirepusher() -> Self {
        Self {
            name: "wirepusher",
            default_base_url: "https://api.wirepusher.com",
            ai_input_field: "text",
        }
    }
}

/// Authentication mode. Exactly one is held per client; the enum makes
/// "both" unrepresentable, and the builder rejects "neither".
#[derive(Debug, Clone)]
pub enum Credentials {
    /// Token auth: sent as `Authorization: Bearer {token}`.
    Bearer { token: String },
    /// Legacy device auth: the device id travels inside the payload.
    Device { id: String },
}

impl Credentials {
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer {
            token: token.into(),
        }
    }

    pub fn device(id: impl Into<String>) -> Self {
        Self::Device { id: id.into() }
    }

    pub(crate) fn validate(&self) -> Result<(), PushError> {
        let empty = match self {
            Self::Bearer { token } => token.trim().is_empty(),
            Self::Device { id } => id.trim().is_empty(),
        };
        if empty {
            return Err(PushError::invalid_argument(
                "credentials must not be empty",
            ));
        }
        Ok(())
    }
}

/// Immutable per-client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub variant: Variant,
    pub base_url: String,
    /// Timeout per physical attempt, not per logical call.
    pub timeout: Duration,
    pub max_retries: u32,
}

impl ClientConfig {
    pub fn for_variant(variant: Variant) -> Self {
        let base_url = variant.default_base_url.to_string();
        Self {
            variant,
            base_url,
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}
