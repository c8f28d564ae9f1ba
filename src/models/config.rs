//! Application configuration structures.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Watched keywords and their exceptions
    pub keywords: Vec<KeywordConfig>,

    /// Escalate operational errors to the error webhook
    #[serde(default, alias = "mailOnError")]
    pub mail_on_error: bool,

    /// Upstream endpoints and polling behavior
    #[serde(default)]
    pub scraper: ScraperConfig,

    /// Notification transport settings
    #[serde(default)]
    pub notify: NotifyConfig,
}

impl Config {
    /// Load configuration from a TOML or JSON file.
    ///
    /// Files with a `.json` extension are parsed as JSON, everything else as TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(toml::from_str(&content)?)
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.keywords.is_empty() {
            return Err(AppError::validation("No keywords defined"));
        }
        if let Some(k) = self.keywords.iter().find(|k| k.keyword.trim().is_empty()) {
            return Err(AppError::validation(format!(
                "Blank keyword (exceptions: {:?})",
                k.exceptions
            )));
        }
        if self.scraper.timeout_secs == 0 {
            return Err(AppError::validation("scraper.timeout_secs must be > 0"));
        }
        if self.scraper.poll_interval_secs == 0 {
            return Err(AppError::validation(
                "scraper.poll_interval_secs must be > 0",
            ));
        }
        if self.scraper.retention_secs == 0 {
            return Err(AppError::validation("scraper.retention_secs must be > 0"));
        }
        if self.scraper.user_agent.trim().is_empty() {
            return Err(AppError::validation("scraper.user_agent is empty"));
        }

        Url::parse(&self.scraper.list_url)?;
        Url::parse(&self.scraper.item_url)?;
        if self.notify.webhook_url.trim().is_empty() {
            return Err(AppError::validation("notify.webhook_url is empty"));
        }
        Url::parse(&self.notify.webhook_url)?;
        if let Some(url) = &self.notify.error_webhook_url {
            Url::parse(url)?;
        }
        Ok(())
    }
}

/// A watched keyword.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeywordConfig {
    /// Literal text to look for
    pub keyword: String,

    /// Lines containing any of these substrings are not reported
    #[serde(default)]
    pub exceptions: Vec<String>,
}

/// Upstream endpoints, timing and HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// Endpoint returning the most recent pastes
    #[serde(default = "defaults::list_url")]
    pub list_url: String,

    /// Endpoint returning the raw body of one paste
    #[serde(default = "defaults::item_url")]
    pub item_url: String,

    /// Number of pastes requested per list call
    #[serde(default = "defaults::list_limit")]
    pub list_limit: u32,

    /// Time between the start of two poll cycles
    #[serde(default = "defaults::poll_interval")]
    pub poll_interval_secs: u64,

    /// Pause after every item fetch
    #[serde(default = "defaults::item_delay")]
    pub item_delay_ms: u64,

    /// How long a processed key is remembered
    #[serde(default = "defaults::retention")]
    pub retention_secs: u64,

    /// Total request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,
}

impl ScraperConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn item_delay(&self) -> Duration {
        Duration::from_millis(self.item_delay_ms)
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            list_url: defaults::list_url(),
            item_url: defaults::item_url(),
            list_limit: defaults::list_limit(),
            poll_interval_secs: defaults::poll_interval(),
            item_delay_ms: defaults::item_delay(),
            retention_secs: defaults::retention(),
            timeout_secs: defaults::timeout(),
            user_agent: defaults::user_agent(),
        }
    }
}

/// Notification transport settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NotifyConfig {
    /// Webhook receiving matched pastes
    #[serde(default)]
    pub webhook_url: String,

    /// Webhook receiving escalated errors (falls back to `webhook_url`)
    #[serde(default)]
    pub error_webhook_url: Option<String>,
}

impl NotifyConfig {
    /// URL errors are escalated to.
    pub fn error_url(&self) -> &str {
        self.error_webhook_url
            .as_deref()
            .unwrap_or(&self.webhook_url)
    }
}

mod defaults {
    pub fn list_url() -> String {
        "https://scrape.pastebin.com/api_scraping.php".into()
    }
    pub fn item_url() -> String {
        "https://scrape.pastebin.com/api_scrape_item.php".into()
    }
    pub fn list_limit() -> u32 {
        100
    }
    pub fn poll_interval() -> u64 {
        60
    }
    pub fn item_delay() -> u64 {
        1000
    }
    pub fn retention() -> u64 {
        600
    }
    pub fn timeout() -> u64 {
        10
    }
    pub fn user_agent() -> String {
        concat!("pastewatch/", env!("CARGO_PKG_VERSION")).into()
    }
}
