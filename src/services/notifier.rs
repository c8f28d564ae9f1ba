// src/services/notifier.rs

//! Notification transports for matches and escalated errors.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use url::Url;

use crate::error::{OperationalError, Result};
use crate::models::{MatchedPaste, NotifyConfig};
use crate::utils::http;

/// Delivers matches and escalated errors to the outside world.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send one matched paste.
    async fn send_paste(&self, paste: &MatchedPaste) -> Result<()>;

    /// Escalate one operational error.
    async fn send_error(&self, error: &OperationalError) -> Result<()>;
}

/// Chat-webhook payload.
#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    text: &'a str,
}

/// Posts `{"text": ...}` messages to incoming-webhook URLs.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: Client,
    paste_url: Url,
    error_url: Url,
}

impl WebhookNotifier {
    pub fn new(client: Client, config: &NotifyConfig) -> Result<Self> {
        Ok(Self {
            client,
            paste_url: Url::parse(&config.webhook_url)?,
            error_url: Url::parse(config.error_url())?,
        })
    }

    async fn post(&self, url: &Url, text: &str) -> Result<()> {
        let response = self
            .client
            .post(url.clone())
            .json(&WebhookPayload { text })
            .send()
            .await?;
        http::ensure_success(response)?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send_paste(&self, paste: &MatchedPaste) -> Result<()> {
        self.post(&self.paste_url, &paste.format_message()).await
    }

    async fn send_error(&self, error: &OperationalError) -> Result<()> {
        let text = format!("pastewatch error during {}: {}", error.stage, error.message);
        self.post(&self.error_url, &text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_shape() {
        let json = serde_json::to_string(&WebhookPayload { text: "hi" }).unwrap();
        assert_eq!(json, r#"{"text":"hi"}"#);
    }

    #[test]
    fn test_error_url_defaults_to_paste_url() {
        let config = NotifyConfig {
            webhook_url: "https://hooks.example.com/paste".into(),
            error_webhook_url: None,
        };
        let notifier = WebhookNotifier::new(Client::new(), &config).unwrap();
        assert_eq!(notifier.error_url, notifier.paste_url);
    }

    #[test]
    fn test_rejects_missing_url() {
        let config = NotifyConfig::default();
        assert!(WebhookNotifier::new(Client::new(), &config).is_err());
    }
}
