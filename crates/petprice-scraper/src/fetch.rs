//! HTTP fetch collaborator used by adapters and the product pipeline.
//!
//! Both methods share one convention: a page that is simply not there
//! (non-2xx, timeout, required selector missing) is `Ok(None)`; anything
//! else going wrong on the wire is an `Err`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};

use crate::document::Document;
use crate::error::ScraperError;
use crate::parse::{body_matches, compile_selector};

#[async_trait]
pub trait Fetch: Send + Sync {
    /// GET `url` and return it as a [`Document`] if `selector` matches.
    ///
    /// An empty `selector` skips the match check.
    async fn fetch(
        &self,
        url: &str,
        selector: &str,
        headers: &[(&str, &str)],
    ) -> Result<Option<Document>, ScraperError>;

    /// GET `url` and decode the body as JSON.
    async fn fetch_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<Option<serde_json::Value>, ScraperError>;
}

/// [`Fetch`] over a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    /// Creates a `PageFetcher` with configured timeout and `User-Agent`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed (e.g., invalid TLS config).
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }

    fn request(&self, url: &str, headers: &[(&str, &str)]) -> RequestBuilder {
        headers
            .iter()
            .fold(self.client.get(url), |request, (name, value)| {
                request.header(*name, *value)
            })
    }

    /// Send the request and read the body; `None` for non-2xx and timeouts.
    async fn get_body(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<Option<String>, ScraperError> {
        let response = match self.request(url, headers).send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                tracing::warn!(url, error = %e, "request timed out");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(url, status = status.as_u16(), "non-success response");
            return Ok(None);
        }

        match response.text().await {
            Ok(body) => Ok(Some(body)),
            Err(e) if e.is_timeout() => {
                tracing::warn!(url, error = %e, "timed out reading body");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl Fetch for PageFetcher {
    async fn fetch(
        &self,
        url: &str,
        selector: &str,
        headers: &[(&str, &str)],
    ) -> Result<Option<Document>, ScraperError> {
        let Some(body) = self.get_body(url, headers).await? else {
            return Ok(None);
        };

        if !selector.is_empty() && !body_matches(&body, &compile_selector(selector)?) {
            tracing::warn!(url, selector, "required selector not found");
            return Ok(None);
        }

        Ok(Some(Document::new(url, body)))
    }

    async fn fetch_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<Option<serde_json::Value>, ScraperError> {
        let Some(body) = self.get_body(url, headers).await? else {
            return Ok(None);
        };

        serde_json::from_str(&body)
            .map(Some)
            .map_err(|e| ScraperError::Deserialize {
                context: format!("JSON body from {url}"),
                source: e,
            })
    }
}

#[cfg(test)]
#[path = "fetch_test.rs"]
mod tests;
