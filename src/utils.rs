//! Utility functions for archive naming and path manipulation

use crate::types::BeatmapsetId;
use std::path::{Path, PathBuf};

/// Characters that are not allowed in file names on at least one supported platform
const FORBIDDEN_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Extension of a beatmap set archive
pub const ARCHIVE_EXTENSION: &str = "osz";

/// Suffix of the file an archive is streamed into before it is moved into place
const PARTIAL_SUFFIX: &str = ".part";

/// Remove characters that cannot appear in a file name
///
/// Only used for building file names; mirror URLs always use the raw id.
///
/// # Examples
///
/// ```
/// use osu_mirror_dl::utils::sanitize_title;
///
/// assert_eq!(sanitize_title("My:Map<Test>?"), "MyMapTest");
/// assert_eq!(sanitize_title("Harumachi Clover"), "Harumachi Clover");
/// ```
#[must_use]
pub fn sanitize_title(title: &str) -> String {
    title.chars().filter(|c| !FORBIDDEN_CHARS.contains(c)).collect()
}

/// Final path of the archive for a beatmap set: `{dir}/{id} - {title}.osz`
///
/// # Examples
///
/// ```
/// use osu_mirror_dl::BeatmapsetId;
/// use osu_mirror_dl::utils::target_filename;
/// use std::path::Path;
///
/// let path = target_filename(Path::new("songs"), BeatmapsetId(39804), "FREEDOM DiVE");
/// assert_eq!(path, Path::new("songs/39804 - FREEDOM DiVE.osz"));
/// ```
#[must_use]
pub fn target_filename(dir: &Path, id: BeatmapsetId, title: &str) -> PathBuf {
    dir.join(format!(
        "{} - {}.{}",
        id,
        sanitize_title(title),
        ARCHIVE_EXTENSION
    ))
}

/// Sibling path an archive is written to while it is still streaming
#[must_use]
pub fn partial_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_os_string();
    name.push(PARTIAL_SUFFIX);
    PathBuf::from(name)
}
