use crate::config::MailConfig;
use crate::error::CmsError;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: Vec<String>,
    pub subject: String,
    pub text: String,
    pub reply_to: Option<String>,
}

/// Outbound email transport.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> Result<(), CmsError>;
}

/// Send and swallow the failure. Notification mail is best effort: the
/// write that triggered it has already been committed.
pub async fn deliver(mailer: &dyn Mailer, email: OutgoingEmail, purpose: &'static str) {
    let to = email.to.join(", ");
    match mailer.send(email).await {
        Ok(()) => info!(purpose, to = %to, "email sent"),
        Err(e) => warn!(purpose, to = %to, error = %e, "email delivery failed"),
    }
}

/// Pick the transport for the configuration: Resend when an API key is set,
/// log-only otherwise.
pub fn from_config(cfg: &MailConfig) -> Result<Arc<dyn Mailer>, CmsError> {
    match cfg.resend_api_key.as_deref().filter(|k| !k.is_empty()) {
        Some(key) => Ok(Arc::new(ResendMailer::new(cfg, key)?)),
        None => {
            warn!("mail.resend_api_key not set; outgoing email will only be logged");
            Ok(Arc::new(LogMailer))
        }
    }
}

#[derive(Serialize)]
struct ResendPayload<'a> {
    from: &'a str,
    to: &'a [String],
    subject: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a str>,
}

/// Resend REST API transport.
pub struct ResendMailer {
    client: reqwest::Client,
    api_url: Url,
    api_key: String,
    from: String,
}

impl ResendMailer {
    pub fn new(cfg: &MailConfig, api_key: &str) -> Result<Self, CmsError> {
        let client = reqwest::Client::builder()
            .user_agent("shieldline-mailer/1.0")
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self {
            client,
            api_url: cfg.api_url.clone(),
            api_key: api_key.to_string(),
            from: cfg.from.clone(),
        })
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), CmsError> {
        let payload = ResendPayload {
            from: &self.from,
            to: &email.to,
            subject: &email.subject,
            text: &email.text,
            reply_to: email.reply_to.as_deref(),
        };
        let resp = self
            .client
            .post(self.api_url.clone())
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(CmsError::Mail(format!("resend returned {status}: {body}")));
        }
        Ok(())
    }
}

/// Writes emails to the log instead of sending them.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), CmsError> {
        info!(
            to = ?email.to,
            subject = %email.subject,
            body = %email.text,
            "mail transport disabled; email logged"
        );
        Ok(())
    }
}
