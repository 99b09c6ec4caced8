//! # osu-mirror-dl
//!
//! Downloads the beatmap sets an osu! player has played most, fetching each
//! `.osz` archive from the first mirror that will serve it.
//!
//! ## Design
//!
//! - **Catalog resolver** - turns a username or id into a deduplicated list of
//!   beatmap sets by paging through the player's most-played listing
//! - **Mirrored downloader** - fetches archives concurrently (12 at a time by
//!   default), trying mirrors in a fixed order and skipping archives that are
//!   already on disk
//! - **Event-driven** - consumers subscribe to progress events, no polling
//!
//! ## Quick Start
//!
//! ```no_run
//! use osu_mirror_dl::{Config, Event, Pipeline};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.download.download_dir = Some("songs".into());
//!
//!     let pipeline = Pipeline::new(config)?;
//!
//!     let mut events = pipeline.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             if let Event::Downloaded { id, title, .. } = event {
//!                 println!("Downloaded {} - {}", id, title);
//!             }
//!         }
//!     });
//!
//!     let summary = pipeline.run("peppy").await?;
//!     println!("{} new archives", summary.downloaded.len());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Catalog resolution against the osu! web service
pub mod catalog;
/// Configuration types
pub mod config;
/// Mirrored archive downloader
pub mod downloader;
/// Error types
pub mod error;
/// Shared HTTP client
pub mod http;
/// End-to-end pipeline
pub mod pipeline;
/// Core types and events
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use catalog::CatalogResolver;
pub use config::{Config, Mirror, MirrorFailurePolicy};
pub use downloader::{DownloadDirectory, MirroredDownloader, RunSummary};
pub use error::{CatalogError, DownloadError, Error, Result};
pub use http::HttpClient;
pub use pipeline::{Pipeline, run_pipeline};
pub use types::{BeatmapsetId, CatalogItem, DownloadOutcome, Event, UserId, UserIdentity};
