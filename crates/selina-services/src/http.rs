//! Shared HTTP client and request helpers.

use crate::ai::AiChain;
use reqwest::{RequestBuilder, Response};
use selina_core::{config::ServicesConfig, error::SelinaError};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Entry point for every adapter: one pooled client plus endpoint config.
pub struct Services {
    pub(crate) client: reqwest::Client,
    pub(crate) config: ServicesConfig,
    pub(crate) ai: AiChain,
}

impl Services {
    /// Build the client. `bot_name` is sent to chat backends that ask for one.
    pub fn new(config: ServicesConfig, bot_name: &str) -> Result<Self, SelinaError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| SelinaError::Service(format!("failed to build http client: {e}")))?;
        let ai = AiChain::standard(&client, &config, bot_name);
        Ok(Self { client, config, ai })
    }

    pub fn config(&self) -> &ServicesConfig {
        &self.config
    }

    /// Download a URL into memory.
    pub async fn fetch_bytes(&self, url: &str, timeout: Duration) -> Result<Vec<u8>, SelinaError> {
        let resp = send(self.client.get(url).timeout(timeout), "download").await?;
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| SelinaError::Service(format!("download: failed to read body: {e}")))?;
        debug!("download: {} bytes from {url}", bytes.len());
        Ok(bytes.to_vec())
    }

    /// Authorization header for the Infinity API, when a key is configured.
    pub(crate) fn with_infinity_auth(&self, req: RequestBuilder) -> RequestBuilder {
        if self.config.infinity_api_key.is_empty() {
            req
        } else {
            req.bearer_auth(&self.config.infinity_api_key)
        }
    }

    pub(crate) fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.config.search_timeout_secs)
    }

    pub(crate) fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.config.lookup_timeout_secs)
    }

    pub fn image_timeout(&self) -> Duration {
        Duration::from_secs(self.config.image_timeout_secs)
    }

    pub fn media_timeout(&self) -> Duration {
        Duration::from_secs(self.config.media_timeout_secs)
    }
}

/// Send a request and reject non-2xx statuses.
pub(crate) async fn send(req: RequestBuilder, what: &str) -> Result<Response, SelinaError> {
    let resp = req
        .send()
        .await
        .map_err(|e| SelinaError::Service(format!("{what} request failed: {e}")))?;

    if !resp.status().is_success() {
        let status = resp.status();
        return Err(SelinaError::Service(format!("{what} returned {status}")));
    }
    Ok(resp)
}

pub(crate) async fn get_json<T: DeserializeOwned>(
    req: RequestBuilder,
    what: &str,
) -> Result<T, SelinaError> {
    send(req, what)
        .await?
        .json()
        .await
        .map_err(|e| SelinaError::Service(format!("{what}: failed to parse response: {e}")))
}

pub(crate) async fn get_text(req: RequestBuilder, what: &str) -> Result<String, SelinaError> {
    send(req, what)
        .await?
        .text()
        .await
        .map_err(|e| SelinaError::Service(format!("{what}: failed to read body: {e}")))
}

pub(crate) fn selector(css: &str) -> Result<scraper::Selector, SelinaError> {
    scraper::Selector::parse(css)
        .map_err(|e| SelinaError::Service(format!("invalid selector {css}: {e:?}")))
}
