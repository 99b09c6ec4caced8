//! Shared HTTP client handed to both the catalog resolver and the downloader.

use crate::config::HttpConfig;
use crate::error::{Error, Result};

/// Pair of connection-pooled clients built from one [`HttpConfig`].
///
/// Profile lookups must see the redirect response itself, so they go through a
/// client with redirects disabled. Everything else (catalog pages, mirror
/// archives) follows redirects as usual.
#[derive(Clone, Debug)]
pub struct HttpClient {
    standard: reqwest::Client,
    no_redirect: reqwest::Client,
}

impl HttpClient {
    /// Build both clients
    ///
    /// # Errors
    /// Returns [`Error::Config`] if the TLS backend or settings are unusable
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let build = |policy: reqwest::redirect::Policy| {
            reqwest::Client::builder()
                .user_agent(config.user_agent.as_str())
                .connect_timeout(config.connect_timeout)
                .redirect(policy)
                .build()
                .map_err(|e| Error::config("http", format!("failed to create HTTP client: {}", e)))
        };

        Ok(Self {
            standard: build(reqwest::redirect::Policy::default())?,
            no_redirect: build(reqwest::redirect::Policy::none())?,
        })
    }

    /// Client that follows redirects
    pub fn standard(&self) -> &reqwest::Client {
        &self.standard
    }

    /// Client that returns 3xx responses as-is
    pub fn no_redirect(&self) -> &reqwest::Client {
        &self.no_redirect
    }
}
