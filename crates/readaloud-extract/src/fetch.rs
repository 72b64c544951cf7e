//! Guarded HTTP fetching
//!
//! Every request to a user-influenced URL goes through [`GuardedFetcher`].
//! Automatic redirects are off; each hop is validated by the URL guard and
//! the connection is pinned to the addresses the guard vetted, so neither a
//! redirect nor a second DNS answer can steer the request somewhere
//! internal.

use crate::{config::ExtractorConfig, error::Result, ExtractError};
use readaloud_guard::{SafeTarget, UrlGuard};
use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::{redirect, Client, StatusCode};
use std::net::SocketAddr;
use tracing::debug;
use url::Url;

/// A fetched response body
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL after following redirects
    pub final_url: Url,

    /// Status of the final response
    pub status: StatusCode,

    /// Content type header, if any
    pub content_type: Option<String>,

    /// Response body, decoded as UTF-8 (lossy)
    pub body: String,
}

/// HTTP client that validates every hop against the URL guard
#[derive(Debug, Clone)]
pub struct GuardedFetcher {
    config: ExtractorConfig,
    guard: UrlGuard,
}

impl GuardedFetcher {
    /// Create a new fetcher
    pub fn new(config: ExtractorConfig, guard: UrlGuard) -> Self {
        Self { config, guard }
    }

    /// The active configuration
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// GET `url`, following up to `max_redirects` validated redirects.
    ///
    /// The whole chain, DNS and body included, is bounded by `timeout_secs`.
    /// Non-success statuses are returned, not treated as errors; callers
    /// decide what a 404 means to them.
    pub async fn get(&self, url: &str) -> Result<FetchedPage> {
        match tokio::time::timeout(self.config.timeout(), self.follow(url)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                debug!(url, timeout_secs = self.config.timeout_secs, "fetch timed out");
                Err(ExtractError::Timeout(self.config.timeout_secs))
            }
        }
    }

    async fn follow(&self, url: &str) -> Result<FetchedPage> {
        let mut target = self.guard.check(url).await?;

        for hop in 0..=self.config.max_redirects {
            let client = self.client_for(&target)?;
            let response = client
                .get(target.url.clone())
                .send()
                .await
                .map_err(|e| self.transport_error(e))?;
            let status = response.status();

            if status.is_redirection() {
                let Some(location) = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|v| v.to_str().ok())
                else {
                    return Err(ExtractError::Http {
                        status: status.as_u16(),
                        message: "redirect without Location header".to_string(),
                    });
                };

                if hop == self.config.max_redirects {
                    break;
                }

                let next = target.url.join(location)?;
                debug!(from = %target.url, to = %next, hop = hop + 1, "following redirect");
                target = self.guard.check(next.as_str()).await?;
                continue;
            }

            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string());

            let body = self.read_body(response).await?;
            debug!(url = %target.url, status = status.as_u16(), bytes = body.len(), "fetched");

            return Ok(FetchedPage {
                final_url: target.url,
                status,
                content_type,
                body,
            });
        }

        Err(ExtractError::TooManyRedirects(self.config.max_redirects))
    }

    /// Build a client for one hop, pinned to the vetted addresses
    fn client_for(&self, target: &SafeTarget) -> Result<Client> {
        let mut builder = Client::builder()
            .redirect(redirect::Policy::none())
            .no_proxy()
            .user_agent(&self.config.user_agent);

        if !target.literal_ip {
            // The port is taken from the URL; the one given here is ignored.
            let addrs: Vec<SocketAddr> = target
                .addrs
                .iter()
                .map(|ip| SocketAddr::new(*ip, 0))
                .collect();
            builder = builder.resolve_to_addrs(&target.host, &addrs);
        }

        builder
            .build()
            .map_err(|e| ExtractError::Network(format!("failed to build HTTP client: {}", e)))
    }

    fn transport_error(&self, err: reqwest::Error) -> ExtractError {
        if err.is_timeout() {
            ExtractError::Timeout(self.config.timeout_secs)
        } else if let Some(status) = err.status() {
            ExtractError::Http {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            ExtractError::Network(err.to_string())
        }
    }

    /// Read the body chunk by chunk, giving up past `max_body_bytes`
    async fn read_body(&self, mut response: reqwest::Response) -> Result<String> {
        let max = self.config.max_body_bytes;
        if let Some(declared) = response.content_length() {
            if declared > max {
                return Err(ExtractError::ContentTooLarge {
                    what: "response body".to_string(),
                    size: declared,
                    max,
                });
            }
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| self.transport_error(e))? {
            if (body.len() + chunk.len()) as u64 > max {
                return Err(ExtractError::ContentTooLarge {
                    what: "response body".to_string(),
                    size: (body.len() + chunk.len()) as u64,
                    max,
                });
            }
            body.extend_from_slice(&chunk);
        }

        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

impl FetchedPage {
    /// Media type without parameters, lowercased
    pub fn media_type(&self) -> Option<String> {
        self.content_type
            .as_deref()
            .and_then(|value| value.split(';').next())
            .map(|essence| essence.trim().to_ascii_lowercase())
            .filter(|essence| !essence.is_empty())
    }

    /// Whether the body can be treated as HTML. A missing header is given
    /// the benefit of the doubt.
    pub fn is_html(&self) -> bool {
        match self.media_type() {
            None => true,
            Some(media) => matches!(media.as_str(), "text/html" | "application/xhtml+xml"),
        }
    }
}
