//! The notification client: payload assembly, header construction, and
//! retry orchestration around the transport.

use std::sync::Arc;

use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

use crate::classify::classify;
use crate::config::{ClientConfig, Credentials, NOTIFAI_PATH, SEND_PATH, Variant};
use crate::crypto::{self, Iv};
use crate::error::PushError;
use crate::models::{MAX_TAGS, NotifAiRequest, Notification, NotificationResponse};
use crate::payload::PayloadBuilder;
use crate::retry::{RetryPolicy, run_with_retry};
use crate::tags::normalize_tags;
use crate::transport::{HttpTransport, Transport};

/// Client for one Pincho / WirePusher account.
///
/// Holds only immutable configuration and a shared transport, so one
/// instance is safe to use from arbitrarily many tasks concurrently; every
/// send is an independent logical operation with its own retry state.
pub struct NotificationClient {
    config: ClientConfig,
    credentials: Credentials,
    headers: HeaderMap,
    policy: RetryPolicy,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for NotificationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationClient")
            .field("config", &self.config)
            .field("credentials", &self.credentials)
            .field("headers", &self.headers)
            .field("policy", &self.policy)
            .field("transport", &"<dyn Transport>")
            .finish()
    }
}

impl NotificationClient {
    pub fn builder(variant: Variant) -> NotificationClientBuilder {
        NotificationClientBuilder {
            config: ClientConfig::for_variant(variant),
            policy: RetryPolicy::default(),
            credentials: None,
            transport: None,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Send a minimal title + message notification.
    pub async fn send(
        &self,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Result<NotificationResponse, PushError> {
        let notification = Notification::new(title, message)?;
        self.send_notification(&notification).await
    }

    /// Send a full notification.
    pub async fn send_notification(
        &self,
        notification: &Notification,
    ) -> Result<NotificationResponse, PushError> {
        self.send_notification_cancellable(notification, &CancellationToken::new())
            .await
    }

    /// Send a full notification, abortable through `token`. Cancelling
    /// during the HTTP exchange or a backoff wait ends the whole logical
    /// operation with [`PushError::Cancelled`].
    pub async fn send_notification_cancellable(
        &self,
        notification: &Notification,
        token: &CancellationToken,
    ) -> Result<NotificationResponse, PushError> {
        let payload = self.build_send_payload(notification)?;
        self.execute(SEND_PATH, payload, token).await
    }

    /// Have the server build a notification from free-form text.
    pub async fn notif_ai(
        &self,
        text: impl Into<String>,
    ) -> Result<NotificationResponse, PushError> {
        let request = NotifAiRequest::new(text)?;
        self.notif_ai_request(&request).await
    }

    pub async fn notif_ai_request(
        &self,
        request: &NotifAiRequest,
    ) -> Result<NotificationResponse, PushError> {
        self.notif_ai_cancellable(request, &CancellationToken::new())
            .await
    }

    pub async fn notif_ai_cancellable(
        &self,
        request: &NotifAiRequest,
        token: &CancellationToken,
    ) -> Result<NotificationResponse, PushError> {
        let payload = self.build_ai_payload(request)?;
        self.execute(NOTIFAI_PATH, payload, token).await
    }

    /// Encrypt a body field when a password is set; returns the value to
    /// transmit plus the IV hex to attach.
    fn seal(
        &self,
        plaintext: &str,
        password: Option<&str>,
    ) -> Result<(String, Option<String>), PushError> {
        match password {
            Some(password) => {
                let iv = Iv::generate();
                let ciphertext = crypto::encrypt(plaintext, password, iv.bytes())?;
                Ok((ciphertext, Some(iv.hex().to_string())))
            }
            None => Ok((plaintext.to_string(), None)),
        }
    }

    fn build_send_payload(&self, notification: &Notification) -> Result<Value, PushError> {
        let tags = normalize_tags(notification.tags());
        if let Some(tags) = &tags
            && tags.len() > MAX_TAGS
        {
            return Err(PushError::invalid_argument(format!(
                "at most {MAX_TAGS} tags are allowed, got {} after normalization",
                tags.len()
            )));
        }

        let (message, iv_hex) =
            self.seal(notification.message(), notification.encryption_password())?;

        let builder = PayloadBuilder::new()
            .field("title", notification.title())
            .field("message", message)
            .opt_field("type", notification.notification_type())
            .opt_field("imageUrl", notification.image_url())
            .opt_field("actionUrl", notification.action_url())
            .opt_field("iv", iv_hex)
            .opt_list("tags", tags);
        Ok(self.apply_credentials(builder).build())
    }

    fn build_ai_payload(&self, request: &NotifAiRequest) -> Result<Value, PushError> {
        let (text, iv_hex) = self.seal(request.text(), request.encryption_password())?;

        let builder = PayloadBuilder::new()
            .field(self.config.variant.ai_input_field, text)
            .opt_field("type", request.notification_type())
            .opt_field("iv", iv_hex);
        Ok(self.apply_credentials(builder).build())
    }

    fn apply_credentials(&self, builder: PayloadBuilder) -> PayloadBuilder {
        match &self.credentials {
            // Token auth travels in the Authorization header, not the body.
            Credentials::Bearer { .. } => builder,
            Credentials::Device { id } => builder.field("id", id.as_str()),
        }
    }

    async fn execute(
        &self,
        path: &str,
        payload: Value,
        token: &CancellationToken,
    ) -> Result<NotificationResponse, PushError> {
        let url = format!("{}{}", self.config.base_url, path);
        run_with_retry(&self.policy, token, |attempt| {
            let url = url.as_str();
            let payload = &payload;
            async move {
                debug!(
                    endpoint = url,
                    attempt = attempt + 1,
                    variant = self.config.variant.name,
                    "sending notification request"
                );
                let response = tokio::select! {
                    _ = token.cancelled() => return Err(PushError::Cancelled),
                    result = self.transport.post_json(url, &self.headers, payload) => result?,
                };
                classify(response)
            }
        })
        .await
    }
}

/// Builder for [`NotificationClient`]. Credentials are mandatory;
/// everything else has variant defaults.
pub struct NotificationClientBuilder {
    config: ClientConfig,
    policy: RetryPolicy,
    credentials: Option<Credentials>,
    transport: Option<Arc<dyn Transport>>,
}

impl NotificationClientBuilder {
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Override the variant's default base URL (mainly for self-hosted
    /// deployments and tests).
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    /// Per-attempt request timeout. Default 30 seconds.
    pub fn timeout(mut self, timeout: std::time::Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Retry budget after the initial attempt. Default 3; `0` disables
    /// retrying.
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.config.max_retries = max_retries;
        self.policy.max_retries = max_retries;
        self
    }

    /// Replace the whole backoff policy (delays included).
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.config.max_retries = policy.max_retries;
        self.policy = policy;
        self
    }

    /// Swap in a custom transport (test doubles, instrumented clients).
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn build(self) -> Result<NotificationClient, PushError> {
        let credentials = self
            .credentials
            .ok_or_else(|| PushError::invalid_argument("credentials are required"))?;
        credentials.validate()?;

        let mut config = self.config;
        Url::parse(&config.base_url)
            .map_err(|e| PushError::invalid_argument(format!("invalid base URL: {e}")))?;
        config.base_url = config.base_url.trim_end_matches('/').to_string();

        let headers = build_headers(&config.variant, &credentials)?;
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(config.timeout)?),
        };

        Ok(NotificationClient {
            config,
            credentials,
            headers,
            policy: self.policy,
            transport,
        })
    }
}

fn build_headers(variant: &Variant, credentials: &Credentials) -> Result<HeaderMap, PushError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    let identifier = format!(
        "{}-client/{} (rust)",
        variant.name,
        env!("CARGO_PKG_VERSION")
    );
    let identifier = HeaderValue::from_str(&identifier)
        .map_err(|e| PushError::invalid_argument(format!("invalid client identifier: {e}")))?;
    headers.insert(USER_AGENT, identifier);

    if let Credentials::Bearer { token } = credentials {
        let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
            PushError::invalid_argument("bearer token contains characters invalid in a header")
        })?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }

    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::AttemptResponse;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Transport double that replays a script of attempt outcomes and
    /// records every request it saw.
    struct ScriptedTransport {
        script: Mutex<VecDeque<Result<AttemptResponse, PushError>>>,
        requests: Mutex<Vec<(String, HeaderMap, Value)>>,
    }

    impl ScriptedTransport {
        fn new(script: Vec<Result<AttemptResponse, PushError>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<(String, HeaderMap, Value)> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn post_json(
            &self,
            url: &str,
            headers: &HeaderMap,
            body: &Value,
        ) -> Result<AttemptResponse, PushError> {
            self.requests
                .lock()
                .unwrap()
                .push((url.to_string(), headers.clone(), body.clone()));
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .expect("transport script exhausted")
        }
    }

    fn ok_response() -> Result<AttemptResponse, PushError> {
        Ok(AttemptResponse {
            status: 200,
            body: r#"{"status":"success","message":"delivered"}"#.to_string(),
            retry_after: None,
        })
    }

    fn error_response(status: u16) -> Result<AttemptResponse, PushError> {
        Ok(AttemptResponse {
            status,
            body: r#"{"status":"error","message":"boom"}"#.to_string(),
            retry_after: None,
        })
    }

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(20),
            rate_limit_first_delay: Duration::from_millis(5),
        }
    }

    fn client(
        credentials: Credentials,
        script: Vec<Result<AttemptResponse, PushError>>,
    ) -> (NotificationClient, Arc<ScriptedTransport>) {
        let transport = ScriptedTransport::new(script);
        let client = NotificationClient::builder(Variant::pincho())
            .credentials(credentials)
            .retry_policy(fast_policy(3))
            .transport(transport.clone())
            .build()
            .unwrap();
        (client, transport)
    }

    #[test]
    fn build_rejects_missing_or_empty_credentials() {
        let err = NotificationClient::builder(Variant::pincho())
            .build()
            .unwrap_err();
        assert!(matches!(err, PushError::InvalidArgument { .. }));

        let err = NotificationClient::builder(Variant::pincho())
            .credentials(Credentials::bearer(""))
            .build()
            .unwrap_err();
        assert!(matches!(err, PushError::InvalidArgument { .. }));
    }

    #[test]
    fn build_rejects_invalid_base_url() {
        let err = NotificationClient::builder(Variant::pincho())
            .credentials(Credentials::bearer("tok"))
            .base_url("not a url")
            .build()
            .unwrap_err();
        assert!(matches!(err, PushError::InvalidArgument { .. }));
    }

    #[tokio::test]
    async fn bearer_auth_travels_in_the_header_only() {
        let (client, transport) = client(Credentials::bearer("tok-123"), vec![ok_response()]);
        let response = client.send("Deploy", "v2 is live").await.unwrap();
        assert!(response.is_success());

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        let (url, headers, body) = &requests[0];
        assert_eq!(url, "https://api.pincho.app/send");
        assert_eq!(headers[AUTHORIZATION], "Bearer tok-123");
        assert_eq!(headers[ACCEPT], "application/json");
        assert!(headers[USER_AGENT].to_str().unwrap().starts_with("pincho-client/"));

        let obj = body.as_object().unwrap();
        assert_eq!(obj["title"], "Deploy");
        assert_eq!(obj["message"], "v2 is live");
        assert!(!obj.contains_key("id"));
        // Optional fields are omitted entirely.
        for absent in ["type", "tags", "imageUrl", "actionUrl", "iv"] {
            assert!(!obj.contains_key(absent), "{absent} should be omitted");
        }
    }

    #[tokio::test]
    async fn device_auth_travels_in_the_payload() {
        let (client, transport) = client(Credentials::device("dev-42"), vec![ok_response()]);
        client.send("Hi", "there").await.unwrap();

        let (_, headers, body) = &transport.requests()[0];
        assert!(!headers.contains_key(AUTHORIZATION));
        assert_eq!(body["id"], "dev-42");
    }

    #[tokio::test]
    async fn optional_fields_are_sent_when_present() {
        let (client, transport) = client(Credentials::bearer("tok"), vec![ok_response()]);
        let notification = Notification::builder("Alert", "disk full")
            .notification_type("ops")
            .tags([" PROD ", "prod", "Backend@123!"])
            .image_url("https://example.com/disk.png")
            .build()
            .unwrap();
        client.send_notification(&notification).await.unwrap();

        let (_, _, body) = &transport.requests()[0];
        assert_eq!(body["type"], "ops");
        assert_eq!(body["imageUrl"], "https://example.com/disk.png");
        assert_eq!(body["tags"], serde_json::json!(["prod", "backend123"]));
        assert!(!body.as_object().unwrap().contains_key("actionUrl"));
    }

    #[tokio::test]
    async fn too_many_tags_fail_before_any_attempt() {
        let (client, transport) = client(Credentials::bearer("tok"), vec![]);
        let tags: Vec<String> = (0..11).map(|i| format!("tag-{i}")).collect();
        let notification = Notification::builder("t", "m").tags(tags).build().unwrap();

        let err = client.send_notification(&notification).await.unwrap_err();
        assert!(matches!(err, PushError::InvalidArgument { .. }));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn encryption_rewrites_the_message_and_attaches_the_iv() {
        let (client, transport) = client(Credentials::bearer("tok"), vec![ok_response()]);
        let notification = Notification::builder("Secret", "the launch code is 0000")
            .encryption_password("hunter2")
            .build()
            .unwrap();
        client.send_notification(&notification).await.unwrap();

        let (_, _, body) = &transport.requests()[0];
        let message = body["message"].as_str().unwrap();
        assert_ne!(message, "the launch code is 0000");
        assert!(!message.contains('+') && !message.contains('/') && !message.contains('='));

        let iv = body["iv"].as_str().unwrap();
        assert_eq!(iv.len(), 32);
        assert!(iv.chars().all(|c| c.is_ascii_hexdigit()));
        // The password itself must never appear in the payload.
        assert!(!body.to_string().contains("hunter2"));
    }

    #[tokio::test]
    async fn validation_error_makes_exactly_one_attempt() {
        let (client, transport) = client(Credentials::bearer("tok"), vec![error_response(400)]);
        let err = client.send("t", "m").await.unwrap_err();
        assert!(matches!(err, PushError::Validation { status: 400, .. }));
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn rate_limit_is_retried_and_recovers() {
        let (client, transport) = client(
            Credentials::bearer("tok"),
            vec![error_response(429), ok_response()],
        );
        let response = client.send("t", "m").await.unwrap();
        assert!(response.is_success());
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn server_errors_exhaust_the_budget() {
        let transport = ScriptedTransport::new(vec![
            error_response(500),
            error_response(500),
            error_response(500),
        ]);
        let client = NotificationClient::builder(Variant::pincho())
            .credentials(Credentials::bearer("tok"))
            .retry_policy(fast_policy(2))
            .transport(transport.clone())
            .build()
            .unwrap();

        let err = client.send("t", "m").await.unwrap_err();
        assert!(matches!(err, PushError::Server { status: 500, .. }));
        assert!(err.is_retryable());
        assert_eq!(transport.requests().len(), 3);
    }

    #[tokio::test]
    async fn ai_endpoint_uses_the_variant_field_name() {
        let (client, transport) = client(Credentials::bearer("tok"), vec![ok_response()]);
        client.notif_ai("summarize my day").await.unwrap();
        let (url, _, body) = &transport.requests()[0];
        assert_eq!(url, "https://api.pincho.app/notifai");
        assert_eq!(body["input"], "summarize my day");
        assert!(!body.as_object().unwrap().contains_key("text"));

        let transport = ScriptedTransport::new(vec![ok_response()]);
        let client = NotificationClient::builder(Variant::wirepusher())
            .credentials(Credentials::device("dev-1"))
            .transport(transport.clone())
            .build()
            .unwrap();
        let request = NotifAiRequest::new("summarize my day")
            .unwrap()
            .with_notification_type("digest");
        client.notif_ai_request(&request).await.unwrap();
        let (url, _, body) = &transport.requests()[0];
        assert_eq!(url, "https://api.wirepusher.com/notifai");
        assert_eq!(body["text"], "summarize my day");
        assert_eq!(body["type"], "digest");
        assert_eq!(body["id"], "dev-1");
    }

    #[tokio::test]
    async fn trailing_slash_in_base_url_is_normalized() {
        let transport = ScriptedTransport::new(vec![ok_response()]);
        let client = NotificationClient::builder(Variant::pincho())
            .credentials(Credentials::bearer("tok"))
            .base_url("https://push.example.com/")
            .transport(transport.clone())
            .build()
            .unwrap();
        client.send("t", "m").await.unwrap();
        assert_eq!(transport.requests()[0].0, "https://push.example.com/send");
    }
}
