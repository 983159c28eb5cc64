//! # pincho-client
//!
//! Client library for the Pincho and WirePusher push-notification APIs.
//! Build a notification, send it over HTTPS, and get a typed result back;
//! transient failures (network errors, 5xx, rate limits) are retried with
//! exponential backoff, and everything else surfaces as a [`PushError`]
//! whose kind tells you whether retrying could ever help.
//!
//! Both API variants are served by the same engine, selected by a
//! [`Variant`] configuration; authentication is either a bearer token or a
//! legacy device id ([`Credentials`]).
//!
//! ```rust,ignore
//! use pincho_client::{Credentials, Notification, NotificationClient, Variant};
//!
//! # async fn doc_test() -> pincho_client::Result<()> {
//! let client = NotificationClient::builder(Variant::pincho())
//!     .credentials(Credentials::bearer("pk_live_..."))
//!     .build()?;
//!
//! client.send("Deploy finished", "v1.4.2 is live").await?;
//!
//! let notification = Notification::builder("Disk alert", "volume at 93%")
//!     .notification_type("ops")
//!     .tags(["prod", "storage"])
//!     .encryption_password("shared-secret")
//!     .build()?;
//! client.send_notification(&notification).await?;
//! # Ok(())
//! # }
//! ```
//!
//! Messages can be encrypted client-side for the companion apps; only the
//! message body is encrypted (title, type, tags and URLs stay cleartext for
//! server-side filtering), and the password never leaves the process.

mod classify;
mod client;
mod config;
mod crypto;
mod error;
mod models;
mod payload;
mod retry;
mod tags;
mod transport;

pub use classify::ErrorDetail;
pub use client::{NotificationClient, NotificationClientBuilder};
pub use config::{ClientConfig, Credentials, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT, Variant};
pub use crypto::{IV_LEN, Iv, derive_key, encrypt};
pub use error::PushError;
pub use models::{
    AiNotification, MAX_MESSAGE_LEN, MAX_TAGS, MAX_TITLE_LEN, NotifAiRequest, Notification,
    NotificationBuilder, NotificationResponse,
};
pub use retry::RetryPolicy;
pub use tags::{is_valid_tag, normalize_tags};
pub use transport::{AttemptResponse, HttpTransport, Transport};

/// Cancellation handle accepted by the `*_cancellable` operations.
pub use tokio_util::sync::CancellationToken;

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, PushError>;
