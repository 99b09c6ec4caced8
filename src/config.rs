//! Configuration types for osu-mirror-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Placeholder substituted with the beatmap set id in mirror URL templates
pub const ID_PLACEHOLDER: &str = "{id}";

/// Catalog (osu! web) request settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Entries requested per most-played page (default: 100)
    #[serde(default = "default_page_size")]
    pub page_size: u64,

    /// Timeout for play-count and listing requests (default: 10 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// Pause after every successfully fetched page (default: 1 second)
    #[serde(default = "default_page_delay", with = "duration_serde")]
    pub page_delay: Duration,

    /// Game mode passed to the historical stats endpoint (default: "osu")
    #[serde(default = "default_mode")]
    pub mode: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            request_timeout: default_request_timeout(),
            page_delay: default_page_delay(),
            mode: default_mode(),
        }
    }
}

/// How a mirror that answers with a non-200 status is treated
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MirrorFailurePolicy {
    /// Stop trying further mirrors for that beatmap set (default)
    #[default]
    AbortOnRejection,
    /// Move on to the next mirror, same as a connection failure
    TryNext,
}

/// Download behavior configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Download directory (None = fresh temporary directory per run)
    #[serde(default)]
    pub download_dir: Option<PathBuf>,

    /// Maximum concurrent archive downloads (default: 12)
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_downloads: usize,

    /// Write buffer size in bytes used while streaming archives (default: 1024)
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Reaction to a mirror rejecting a request
    #[serde(default)]
    pub mirror_failure_policy: MirrorFailurePolicy,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            download_dir: None,
            max_concurrent_downloads: default_max_concurrent(),
            chunk_size: default_chunk_size(),
            mirror_failure_policy: MirrorFailurePolicy::default(),
        }
    }
}

/// Shared HTTP client settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// TCP connect timeout (default: 30 seconds)
    #[serde(default = "default_connect_timeout", with = "duration_serde")]
    pub connect_timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            connect_timeout: default_connect_timeout(),
        }
    }
}

/// A download mirror: a display name and a URL template containing `{id}`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mirror {
    /// Host name shown in logs
    pub name: String,
    /// URL with an `{id}` placeholder for the beatmap set id
    pub url_template: String,
}

impl Mirror {
    /// Create a mirror entry
    pub fn new(name: impl Into<String>, url_template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url_template: url_template.into(),
        }
    }

    /// Archive URL for the given beatmap set id
    pub fn url_for(&self, id: impl std::fmt::Display) -> String {
        self.url_template.replace(ID_PLACEHOLDER, &id.to_string())
    }
}

/// Main configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// osu! web base URL, without trailing slash (default: "https://osu.ppy.sh")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Catalog request settings
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Download behavior settings
    #[serde(default)]
    pub download: DownloadConfig,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Mirrors in the order they are tried
    #[serde(default = "default_mirrors")]
    pub mirrors: Vec<Mirror>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            catalog: CatalogConfig::default(),
            download: DownloadConfig::default(),
            http: HttpConfig::default(),
            mirrors: default_mirrors(),
        }
    }
}

impl Config {
    /// Load a configuration from a JSON file; missing fields take their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("failed to read {}: {}", path.display(), e),
            key: None,
        })?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Base URL with any trailing slash removed
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Check that the configuration can drive a run
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(self.base_url())
            .map_err(|e| Error::config("base_url", format!("invalid base URL: {}", e)))?;

        if self.catalog.page_size == 0 {
            return Err(Error::config("catalog.page_size", "page size must be positive"));
        }
        if self.download.max_concurrent_downloads == 0 {
            return Err(Error::config(
                "download.max_concurrent_downloads",
                "at least one concurrent download is required",
            ));
        }
        if self.download.chunk_size == 0 {
            return Err(Error::config(
                "download.chunk_size",
                "chunk size must be positive",
            ));
        }
        if self.mirrors.is_empty() {
            return Err(Error::config("mirrors", "at least one mirror is required"));
        }
        for mirror in &self.mirrors {
            if !mirror.url_template.contains(ID_PLACEHOLDER) {
                return Err(Error::config(
                    "mirrors",
                    format!("mirror {} template has no {} placeholder", mirror.name, ID_PLACEHOLDER),
                ));
            }
            url::Url::parse(&mirror.url_for(0)).map_err(|e| {
                Error::config("mirrors", format!("mirror {} has an invalid URL: {}", mirror.name, e))
            })?;
        }
        Ok(())
    }
}

// Default value functions
fn default_base_url() -> String {
    "https://osu.ppy.sh".to_string()
}

fn default_page_size() -> u64 {
    100
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_page_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_mode() -> String {
    "osu".to_string()
}

fn default_max_concurrent() -> usize {
    12
}

fn default_chunk_size() -> usize {
    1024
}

fn default_user_agent() -> String {
    concat!("osu-mirror-dl/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_mirrors() -> Vec<Mirror> {
    vec![
        Mirror::new("nerinyan.moe", "https://api.nerinyan.moe/d/{id}"),
        Mirror::new("beatconnect.io", "https://beatconnect.io/b/{id}"),
        Mirror::new("catboy.best", "https://catboy.best/d/{id}"),
        Mirror::new("osu.direct", "https://osu.direct/api/d/{id}"),
    ]
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
