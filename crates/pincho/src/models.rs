//! Request and response value objects.

use serde::Deserialize;

use crate::error::PushError;

/// Title limit enforced by the API contract (UTF-8 characters).
pub const MAX_TITLE_LEN: usize = 256;
/// Message limit enforced by the API contract (UTF-8 characters).
pub const MAX_MESSAGE_LEN: usize = 4096;
/// Maximum number of tags accepted per notification, after normalization.
pub const MAX_TAGS: usize = 10;

/// An outbound notification. Immutable; construct one per send.
///
/// Use [`Notification::new`] for the minimal title + message form, or
/// [`Notification::builder`] to attach the optional fields.
#[derive(Debug, Clone)]
pub struct Notification {
    title: String,
    message: String,
    notification_type: Option<String>,
    tags: Option<Vec<String>>,
    image_url: Option<String>,
    action_url: Option<String>,
    encryption_password: Option<String>,
}

impl Notification {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Result<Self, PushError> {
        Self::builder(title, message).build()
    }

    pub fn builder(
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> NotificationBuilder {
        NotificationBuilder {
            title: title.into(),
            message: message.into(),
            notification_type: None,
            tags: None,
            image_url: None,
            action_url: None,
            encryption_password: None,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn notification_type(&self) -> Option<&str> {
        self.notification_type.as_deref()
    }

    pub fn tags(&self) -> Option<&[String]> {
        self.tags.as_deref()
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    pub fn action_url(&self) -> Option<&str> {
        self.action_url.as_deref()
    }

    pub fn encryption_password(&self) -> Option<&str> {
        self.encryption_password.as_deref()
    }
}

/// Builder for [`Notification`]. `build` validates the contract limits so a
/// bad notification never reaches the network.
#[derive(Debug, Clone)]
pub struct NotificationBuilder {
    title: String,
    message: String,
    notification_type: Option<String>,
    tags: Option<Vec<String>>,
    image_url: Option<String>,
    action_url: Option<String>,
    encryption_password: Option<String>,
}

impl NotificationBuilder {
    /// Category used by the receiving device for grouping and filtering.
    pub fn notification_type(mut self, notification_type: impl Into<String>) -> Self {
        self.notification_type = Some(notification_type.into());
        self
    }

    /// Raw tags; they are normalized when the notification is sent.
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    pub fn action_url(mut self, action_url: impl Into<String>) -> Self {
        self.action_url = Some(action_url.into());
        self
    }

    /// Encrypt the message body client-side with a key derived from this
    /// password. The password is used locally for key derivation and never
    /// transmitted.
    pub fn encryption_password(mut self, password: impl Into<String>) -> Self {
        self.encryption_password = Some(password.into());
        self
    }

    pub fn build(self) -> Result<Notification, PushError> {
        if self.title.trim().is_empty() {
            return Err(PushError::invalid_argument("title must not be empty"));
        }
        if self.title.chars().count() > MAX_TITLE_LEN {
            return Err(PushError::invalid_argument(format!(
                "title exceeds {MAX_TITLE_LEN} characters"
            )));
        }
        if self.message.trim().is_empty() {
            return Err(PushError::invalid_argument("message must not be empty"));
        }
        if self.message.chars().count() > MAX_MESSAGE_LEN {
            return Err(PushError::invalid_argument(format!(
                "message exceeds {MAX_MESSAGE_LEN} characters"
            )));
        }
        Ok(Notification {
            title: self.title,
            message: self.message,
            notification_type: self.notification_type,
            tags: self.tags,
            image_url: self.image_url,
            action_url: self.action_url,
            encryption_password: self.encryption_password,
        })
    }
}

/// Input for the AI endpoint: free-form text the server turns into a
/// notification.
#[derive(Debug, Clone)]
pub struct NotifAiRequest {
    text: String,
    notification_type: Option<String>,
    encryption_password: Option<String>,
}

impl NotifAiRequest {
    pub fn new(text: impl Into<String>) -> Result<Self, PushError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(PushError::invalid_argument("input text must not be empty"));
        }
        Ok(Self {
            text,
            notification_type: None,
            encryption_password: None,
        })
    }

    /// Override the type the server would otherwise infer.
    pub fn with_notification_type(mut self, notification_type: impl Into<String>) -> Self {
        self.notification_type = Some(notification_type.into());
        self
    }

    /// Encrypt the input text client-side, same scheme as the message body.
    pub fn with_encryption_password(mut self, password: impl Into<String>) -> Self {
        self.encryption_password = Some(password.into());
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn notification_type(&self) -> Option<&str> {
        self.notification_type.as_deref()
    }

    pub fn encryption_password(&self) -> Option<&str> {
        self.encryption_password.as_deref()
    }
}

/// Successful API response.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationResponse {
    /// `"success"` or `"error"`; prefer [`NotificationResponse::is_success`].
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    /// Present on AI-endpoint responses: the notification the server built.
    #[serde(default)]
    pub notification: Option<AiNotification>,
}

impl NotificationResponse {
    pub fn is_success(&self) -> bool {
        self.status.eq_ignore_ascii_case("success")
    }
}

/// Notification fields inferred by the AI endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct AiNotification {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, rename = "type")]
    pub notification_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_notification_builds() {
        let n = Notification::new("Deploy", "v1.2.3 is live").unwrap();
        assert_eq!(n.title(), "Deploy");
        assert_eq!(n.message(), "v1.2.3 is live");
        assert!(n.notification_type().is_none());
        assert!(n.tags().is_none());
        assert!(n.encryption_password().is_none());
    }

    #[test]
    fn builder_carries_optional_fields() {
        let n = Notification::builder("Alert", "disk almost full")
            .notification_type("ops")
            .tags(["prod", "storage"])
            .image_url("https://example.com/disk.png")
            .action_url("https://example.com/runbook")
            .encryption_password("pw")
            .build()
            .unwrap();
        assert_eq!(n.notification_type(), Some("ops"));
        assert_eq!(n.tags().unwrap().len(), 2);
        assert_eq!(n.image_url(), Some("https://example.com/disk.png"));
        assert_eq!(n.action_url(), Some("https://example.com/runbook"));
        assert_eq!(n.encryption_password(), Some("pw"));
    }

    #[test]
    fn contract_limits_are_enforced() {
        assert!(matches!(
            Notification::new("", "msg"),
            Err(PushError::InvalidArgument { .. })
        ));
        assert!(matches!(
            Notification::new("   ", "msg"),
            Err(PushError::InvalidArgument { .. })
        ));
        assert!(matches!(
            Notification::new("title", " "),
            Err(PushError::InvalidArgument { .. })
        ));
        assert!(matches!(
            Notification::new("t".repeat(MAX_TITLE_LEN + 1), "msg"),
            Err(PushError::InvalidArgument { .. })
        ));
        assert!(matches!(
            Notification::new("title", "m".repeat(MAX_MESSAGE_LEN + 1)),
            Err(PushError::InvalidArgument { .. })
        ));

        // Exactly at the limit is fine.
        assert!(Notification::new("t".repeat(MAX_TITLE_LEN), "m".repeat(MAX_MESSAGE_LEN)).is_ok());
    }

    #[test]
    fn ai_request_requires_text() {
        assert!(matches!(
            NotifAiRequest::new("  "),
            Err(PushError::InvalidArgument { .. })
        ));
        let req = NotifAiRequest::new("server down, page the on-call")
            .unwrap()
            .with_notification_type("incident");
        assert_eq!(req.notification_type(), Some("incident"));
    }

    #[test]
    fn response_success_flag() {
        let ok: NotificationResponse =
            serde_json::from_str(r#"{"status":"success","message":"delivered"}"#).unwrap();
        assert!(ok.is_success());

        let err: NotificationResponse = serde_json::from_str(r#"{"status":"error"}"#).unwrap();
        assert!(!err.is_success());
        assert!(err.message.is_none());
    }

    #[test]
    fn ai_response_carries_inferred_notification() {
        let body = r#"{
            "status": "success",
            "message": "ok",
            "notification": {"title": "Build failed", "message": "job 42", "type": "ci"}
        }"#;
        let resp: NotificationResponse = serde_json::from_str(body).unwrap();
        let ai = resp.notification.unwrap();
        assert_eq!(ai.title.as_deref(), Some("Build failed"));
        assert_eq!(ai.notification_type.as_deref(), Some("ci"));
    }
}
