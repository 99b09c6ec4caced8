//! Core types and events for osu-mirror-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Identifier of a beatmap set (the unit a mirror serves as one `.osz` archive)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BeatmapsetId(pub u64);

impl BeatmapsetId {
    /// Get the inner u64 value
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl From<u64> for BeatmapsetId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for BeatmapsetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Numeric osu! user id
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the user typed at the prompt: a numeric id or a username to look up
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UserIdentity {
    /// Already numeric, used as-is
    Id(UserId),
    /// Needs a profile lookup to find the numeric id
    Username(String),
}

impl UserIdentity {
    /// Classify raw input. Surrounding whitespace is ignored.
    ///
    /// A digit string is kept as its numeric value, so leading zeros do not
    /// survive: `"0123"` addresses user `123`, which is the same profile on
    /// osu!.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(Error::InvalidIdentity(input.to_string()));
        }
        if input.bytes().all(|b| b.is_ascii_digit()) {
            // Digit strings too long for u64 cannot be real ids; look them up by name.
            if let Ok(id) = input.parse::<u64>() {
                return Ok(UserIdentity::Id(UserId(id)));
            }
        }
        Ok(UserIdentity::Username(input.to_string()))
    }
}

impl fmt::Display for UserIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserIdentity::Id(id) => write!(f, "{}", id),
            UserIdentity::Username(name) => f.write_str(name),
        }
    }
}

/// A beatmap set the user has played
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Beatmap set id
    pub id: BeatmapsetId,
    /// Set title as reported by osu!
    pub title: String,
}

/// Result of trying to materialize one archive
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Archive written to `path` from `mirror`
    Downloaded {
        /// Final archive path
        path: PathBuf,
        /// Name of the mirror that served it
        mirror: String,
    },
    /// Target file already existed; no request was made
    Skipped {
        /// Existing archive path
        path: PathBuf,
    },
    /// A mirror answered with a non-200 status and the attempt was abandoned
    Rejected {
        /// Mirror that rejected the request
        mirror: String,
        /// Status code received
        status: u16,
    },
    /// No mirror could be reached
    Unavailable,
}

impl DownloadOutcome {
    /// Path of a freshly downloaded archive; `None` for every other outcome
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            DownloadOutcome::Downloaded { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Progress events emitted by [`crate::MirroredDownloader`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// A run has started
    Started {
        /// Number of beatmap sets submitted
        total: usize,
        /// Directory archives are written to
        directory: PathBuf,
    },
    /// An archive was written
    Downloaded {
        /// Beatmap set id
        id: BeatmapsetId,
        /// Set title
        title: String,
        /// Final archive path
        path: PathBuf,
    },
    /// The archive was already on disk
    Skipped {
        /// Beatmap set id
        id: BeatmapsetId,
    },
    /// No archive could be obtained
    Failed {
        /// Beatmap set id
        id: BeatmapsetId,
        /// Human-readable reason
        reason: String,
    },
    /// All tasks of the run have finished
    Finished {
        /// Archives written
        downloaded: usize,
        /// Archives already present
        skipped: usize,
        /// Sets that could not be downloaded
        failed: usize,
    },
}
