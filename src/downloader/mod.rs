//! Mirrored archive downloader split into focused submodules.
//!
//! The `MirroredDownloader` struct and its methods are organized by concern:
//! - [`mirror`] - Single beatmap set download with mirror fallback
//! - [`pool`] - Bounded worker pool used by [`MirroredDownloader::run`]

mod mirror;
pub mod pool;


use crate::config::Config;
use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::types::{BeatmapsetId, CatalogItem, DownloadOutcome, Event};
use pool::WorkerPool;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Directory archives are written to.
///
/// When no directory was configured this owns a temporary directory, which is
/// removed once the value (and every [`RunSummary`] holding it) is dropped.
#[derive(Debug)]
pub struct DownloadDirectory {
    path: PathBuf,
    temp: Option<tempfile::TempDir>,
}

impl DownloadDirectory {
    /// Path of the directory
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether this is a temporary directory created for the run
    pub fn is_temporary(&self) -> bool {
        self.temp.is_some()
    }
}

/// Result of a [`MirroredDownloader::run`]
#[derive(Debug)]
pub struct RunSummary {
    /// Archives written during this run, in completion order
    pub downloaded: Vec<PathBuf>,
    /// Beatmap sets whose archive already existed
    pub skipped: usize,
    /// Beatmap sets no archive could be obtained for
    pub failed: usize,
    /// Directory the run wrote to
    pub directory: DownloadDirectory,
}

/// Downloads beatmap set archives from an ordered list of mirrors (cloneable)
#[derive(Clone)]
pub struct MirroredDownloader {
    /// Shared HTTP client (owned by the pipeline)
    pub(crate) client: HttpClient,
    /// Run configuration (mirrors, concurrency, chunk size)
    pub(crate) config: Arc<Config>,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: tokio::sync::broadcast::Sender<Event>,
}

impl MirroredDownloader {
    /// Create a downloader using the given client and configuration
    pub fn new(client: HttpClient, config: Arc<Config>) -> Self {
        let (event_tx, _rx) = tokio::sync::broadcast::channel(1000);
        Self {
            client,
            config,
            event_tx,
        }
    }

    /// Subscribe to progress events
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Resolve the target directory, creating it if needed
    ///
    /// `None` yields a fresh temporary directory that lives as long as the
    /// returned value.
    pub async fn prepare_directory(path: Option<&Path>) -> Result<DownloadDirectory> {
        match path {
            Some(path) => {
                tokio::fs::create_dir_all(path).await.map_err(|e| {
                    Error::Io(std::io::Error::new(
                        e.kind(),
                        format!(
                            "Failed to create download directory '{}': {}",
                            path.display(),
                            e
                        ),
                    ))
                })?;
                Ok(DownloadDirectory {
                    path: path.to_path_buf(),
                    temp: None,
                })
            }
            None => {
                let temp = tempfile::Builder::new().prefix("osu-mirror-dl-").tempdir()?;
                info!(path = %temp.path().display(), "Using temporary directory");
                Ok(DownloadDirectory {
                    path: temp.path().to_path_buf(),
                    temp: Some(temp),
                })
            }
        }
    }

    /// Download every item, at most `max_concurrent_downloads` at a time
    ///
    /// Items sharing an id collapse to one download (the last title wins).
    /// Individual failures are logged and counted; only failing to prepare
    /// the directory is returned as an error.
    pub async fn run(&self, items: &[CatalogItem], directory: Option<&Path>) -> Result<RunSummary> {
        let titles: HashMap<BeatmapsetId, String> = items
            .iter()
            .map(|item| (item.id, item.title.clone()))
            .collect();
        let directory = Self::prepare_directory(directory).await?;

        info!(
            total = titles.len(),
            directory = %directory.path().display(),
            "Downloading beatmaps"
        );
        self.event_tx
            .send(Event::Started {
                total: titles.len(),
                directory: directory.path().to_path_buf(),
            })
            .ok();

        let mut pool = WorkerPool::new(self.config.download.max_concurrent_downloads);
        for (id, title) in titles {
            let downloader = self.clone();
            let dir = directory.path().to_path_buf();
            pool.spawn(async move {
                let outcome = downloader.download_one(id, &title, &dir).await;
                (id, title, outcome)
            });
        }

        let mut downloaded = Vec::new();
        let mut skipped = 0;
        let mut failed = 0;

        while let Some((id, title, outcome)) = pool.next_completed().await {
            match outcome {
                Ok(DownloadOutcome::Downloaded { path, .. }) => {
                    self.event_tx
                        .send(Event::Downloaded {
                            id,
                            title,
                            path: path.clone(),
                        })
                        .ok();
                    downloaded.push(path);
                }
                Ok(DownloadOutcome::Skipped { .. }) => {
                    skipped += 1;
                    self.event_tx.send(Event::Skipped { id }).ok();
                }
                Ok(DownloadOutcome::Rejected { mirror, status }) => {
                    failed += 1;
                    self.event_tx
                        .send(Event::Failed {
                            id,
                            reason: format!("{} returned HTTP {}", mirror, status),
                        })
                        .ok();
                }
                Ok(DownloadOutcome::Unavailable) => {
                    failed += 1;
                    self.event_tx
                        .send(Event::Failed {
                            id,
                            reason: "no mirror reachable".to_string(),
                        })
                        .ok();
                }
                Err(e) => {
                    failed += 1;
                    warn!(beatmapset_id = id.0, error = %e, "Download failed");
                    self.event_tx
                        .send(Event::Failed {
                            id,
                            reason: e.to_string(),
                        })
                        .ok();
                }
            }
        }

        let lost = pool.lost();
        if lost > 0 {
            warn!(lost, "Download tasks ended without a result");
            failed += lost;
        }

        info!(
            downloaded = downloaded.len(),
            skipped, failed, "Finished downloading"
        );
        self.event_tx
            .send(Event::Finished {
                downloaded: downloaded.len(),
                skipped,
                failed,
            })
            .ok();

        Ok(RunSummary {
            downloaded,
            skipped,
            failed,
            directory,
        })
    }
}
