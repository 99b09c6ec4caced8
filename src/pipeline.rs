//! End-to-end run: resolve the user, list their beatmap sets, download them.

use crate::catalog::CatalogResolver;
use crate::config::Config;
use crate::downloader::{MirroredDownloader, RunSummary};
use crate::error::Result;
use crate::http::HttpClient;
use crate::types::{Event, UserIdentity};
use std::sync::Arc;
use tracing::info;

/// Resolver and downloader sharing one HTTP client and configuration
pub struct Pipeline {
    resolver: CatalogResolver,
    downloader: MirroredDownloader,
    config: Arc<Config>,
}

impl Pipeline {
    /// Validate `config` and build both components around a single client
    ///
    /// # Errors
    /// Returns [`crate::Error::Config`] for an unusable configuration.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let config = Arc::new(config);
        let client = HttpClient::new(&config.http)?;
        Ok(Self {
            resolver: CatalogResolver::new(client.clone(), Arc::clone(&config)),
            downloader: MirroredDownloader::new(client, Arc::clone(&config)),
            config,
        })
    }

    /// Subscribe to the downloader's progress events
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.downloader.subscribe()
    }

    /// Run the whole pipeline for the user named by `input`
    ///
    /// # Errors
    /// Fails on an invalid identity, an unresolvable username, or an unusable
    /// download directory. Catalog and per-archive problems only shrink the
    /// result.
    pub async fn run(&self, input: &str) -> Result<RunSummary> {
        let identity = UserIdentity::parse(input)?;
        let items = self.resolver.fetch_catalog(&identity).await?;
        info!(user = %identity, items = items.len(), "Catalog ready");
        self.downloader
            .run(&items, self.config.download.download_dir.as_deref())
            .await
    }
}

/// Convenience wrapper: build a [`Pipeline`] and run it once
pub async fn run_pipeline(config: Config, input: &str) -> Result<RunSummary> {
    Pipeline::new(config)?.run(input).await
}
