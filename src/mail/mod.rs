//! Outgoing email through an HTTP email API

use reqwest::Client;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::Config;

/// A message ready to send
#[derive(Debug, Clone, Serialize)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
}

/// What happened to a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Delivery {
    /// Accepted by the email API
    Sent,
    /// No email API configured; the message was only logged
    Logged,
}

impl Delivery {
    pub fn delivered(self) -> bool {
        matches!(self, Delivery::Sent)
    }
}

#[derive(Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    html: Option<&'a str>,
}

/// Email sender
#[derive(Clone)]
pub struct Mailer {
    client: Client,
    endpoint: Option<String>,
    api_key: Option<String>,
    from: String,
}

impl Mailer {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            endpoint: config.email_api_url.clone(),
            api_key: config.email_api_key.clone(),
            from: config.email_from.clone(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.endpoint.is_some()
    }

    /// Send a message, or log it when no email API is configured
    pub async fn send(&self, email: &Email) -> Result<Delivery, MailError> {
        if !email.to.contains('@') {
            return Err(MailError::InvalidRecipient(email.to.clone()));
        }

        let Some(endpoint) = &self.endpoint else {
            info!(
                to = %email.to,
                subject = %email.subject,
                body = %email.text,
                "Email API not configured, message logged only"
            );
            return Ok(Delivery::Logged);
        };

        let payload = SendRequest {
            from: &self.from,
            to: [&email.to],
            subject: &email.subject,
            text: &email.text,
            html: email.html.as_deref(),
        };

        let mut request = self.client.post(endpoint).json(&payload);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(MailError::Request)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), to = %email.to, "Email API rejected message");
            return Err(MailError::Api {
                status: status.as_u16(),
                body,
            });
        }

        info!(to = %email.to, subject = %email.subject, "Email sent");
        Ok(Delivery::Sent)
    }
}

/// Mail errors
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Invalid recipient address: {0}")]
    InvalidRecipient(String),

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Email API error (status {status}): {body}")]
    Api { status: u16, body: String },
}
