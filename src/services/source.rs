// src/services/source.rs

//! Upstream paste source.
//!
//! Lists recently published pastes and downloads their bodies. Every request
//! races the shared cancellation token so shutdown aborts in-flight calls.

use std::future::Future;

use async_trait::async_trait;
use reqwest::{Client, Response};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{Paste, ScraperConfig};
use crate::utils::http;

/// Where pastes come from.
#[async_trait]
pub trait PasteSource: Send + Sync {
    /// Fetch the current list of published pastes, newest first.
    async fn list_items(&self, cancel: &CancellationToken) -> Result<Vec<Paste>>;

    /// Fetch the full body of one paste.
    async fn fetch_body(&self, paste: &Paste, cancel: &CancellationToken) -> Result<String>;
}

/// Client for the pastebin scraping API.
#[derive(Debug, Clone)]
pub struct PastebinClient {
    client: Client,
    list_url: Url,
    item_url: Url,
}

impl PastebinClient {
    /// Create a client with its own HTTP connection pool.
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let client = http::create_async_client(config)?;
        Self::with_client(client, config)
    }

    /// Create a client sharing an existing HTTP client.
    pub fn with_client(client: Client, config: &ScraperConfig) -> Result<Self> {
        let mut list_url = Url::parse(&config.list_url)?;
        list_url
            .query_pairs_mut()
            .append_pair("limit", &config.list_limit.to_string());

        Ok(Self {
            client,
            list_url,
            item_url: Url::parse(&config.item_url)?,
        })
    }

    /// URL of the raw body for `key`.
    pub fn item_url(&self, key: &str) -> Url {
        let mut url = self.item_url.clone();
        url.query_pairs_mut().append_pair("i", key);
        url
    }

    pub fn list_url(&self) -> &Url {
        &self.list_url
    }

    async fn get(&self, url: &Url, cancel: &CancellationToken) -> Result<Response> {
        let response = cancellable(url, cancel, self.client.get(url.clone()).send()).await??;
        http::ensure_success(response)
    }
}

#[async_trait]
impl PasteSource for PastebinClient {
    async fn list_items(&self, cancel: &CancellationToken) -> Result<Vec<Paste>> {
        let response = self.get(&self.list_url, cancel).await?;
        let bytes = cancellable(&self.list_url, cancel, response.bytes()).await??;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn fetch_body(&self, paste: &Paste, cancel: &CancellationToken) -> Result<String> {
        let url = self.item_url(&paste.key);
        let response = self.get(&url, cancel).await?;
        Ok(cancellable(&url, cancel, response.text()).await??)
    }
}

/// Run `fut` unless `cancel` fires first.
async fn cancellable<F, T>(url: &Url, cancel: &CancellationToken, fut: F) -> Result<T>
where
    F: Future<Output = T>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(AppError::Cancelled(url.to_string())),
        value = fut => Ok(value),
    }
}
