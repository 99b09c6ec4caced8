//! Single beatmap set download: ordered mirror fallback and streamed writes.

use std::path::Path;

use reqwest::StatusCode;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, warn};

use super::MirroredDownloader;
use crate::config::MirrorFailurePolicy;
use crate::error::{DownloadError, Error, Result};
use crate::types::{BeatmapsetId, DownloadOutcome};
use crate::utils::{partial_path, target_filename};

impl MirroredDownloader {
    /// Download one beatmap set archive into `directory`
    ///
    /// Mirrors are tried in configured order:
    /// - an existing target file short-circuits to [`DownloadOutcome::Skipped`]
    ///   without any request
    /// - a connection failure moves on to the next mirror
    /// - a non-200 answer ends the attempt with [`DownloadOutcome::Rejected`]
    ///   (or moves on, under [`MirrorFailurePolicy::TryNext`])
    /// - a 200 answer is streamed to `{target}.part` and renamed into place
    ///
    /// # Errors
    /// Returns an error if the body breaks off or the file cannot be written.
    /// The partial file is removed in that case.
    pub async fn download_one(
        &self,
        id: BeatmapsetId,
        title: &str,
        directory: &Path,
    ) -> Result<DownloadOutcome> {
        let target = target_filename(directory, id, title);
        if tokio::fs::try_exists(&target).await? {
            debug!(beatmapset_id = id.0, path = %target.display(), "Archive already exists, skipping");
            return Ok(DownloadOutcome::Skipped { path: target });
        }

        let policy = self.config.download.mirror_failure_policy;
        let mut last_rejection = None;

        for mirror in &self.config.mirrors {
            let url = mirror.url_for(id);
            let response = match self.client.standard().get(&url).send().await {
                Ok(response) => response,
                Err(e) => {
                    warn!(
                        beatmapset_id = id.0,
                        mirror = %mirror.name,
                        error = %e,
                        "Mirror unreachable, trying next"
                    );
                    continue;
                }
            };

            let status = response.status();
            if status != StatusCode::OK {
                let rejection = DownloadOutcome::Rejected {
                    mirror: mirror.name.clone(),
                    status: status.as_u16(),
                };
                match policy {
                    MirrorFailurePolicy::AbortOnRejection => {
                        warn!(
                            beatmapset_id = id.0,
                            mirror = %mirror.name,
                            status = status.as_u16(),
                            "Mirror rejected request, giving up on this beatmap set"
                        );
                        return Ok(rejection);
                    }
                    MirrorFailurePolicy::TryNext => {
                        warn!(
                            beatmapset_id = id.0,
                            mirror = %mirror.name,
                            status = status.as_u16(),
                            "Mirror rejected request, trying next"
                        );
                        last_rejection = Some(rejection);
                        continue;
                    }
                }
            }

            let bytes = write_archive(
                response,
                &target,
                &mirror.name,
                self.config.download.chunk_size,
            )
            .await?;
            debug!(
                beatmapset_id = id.0,
                mirror = %mirror.name,
                bytes,
                "Downloaded {} - {}",
                id,
                title
            );
            return Ok(DownloadOutcome::Downloaded {
                path: target,
                mirror: mirror.name.clone(),
            });
        }

        Ok(last_rejection.unwrap_or(DownloadOutcome::Unavailable))
    }
}

/// Stream a response into `{target}.part`, then move it to `target`
///
/// The partial file is removed if anything fails, so `target` only ever
/// appears complete.
async fn write_archive(
    response: reqwest::Response,
    target: &Path,
    mirror: &str,
    chunk_size: usize,
) -> Result<u64> {
    let part = partial_path(target);

    let result = match stream_to_file(response, &part, mirror, chunk_size).await {
        Ok(bytes) => tokio::fs::rename(&part, target)
            .await
            .map(|()| bytes)
            .map_err(|e| persist_error(target, e)),
        Err(e) => Err(e),
    };

    if result.is_err()
        && let Err(e) = tokio::fs::remove_file(&part).await
        && e.kind() != std::io::ErrorKind::NotFound
    {
        warn!(path = %part.display(), error = %e, "Failed to remove partial archive");
    }
    result
}

/// Copy the response body to `path` in `chunk_size` pieces
async fn stream_to_file(
    mut response: reqwest::Response,
    path: &Path,
    mirror: &str,
    chunk_size: usize,
) -> Result<u64> {
    let chunk_size = chunk_size.max(1);
    let file = tokio::fs::File::create(path)
        .await
        .map_err(|e| persist_error(path, e))?;
    let mut writer = BufWriter::with_capacity(chunk_size, file);
    let mut written = 0u64;

    while let Some(bytes) = response.chunk().await.map_err(|e| DownloadError::Stream {
        mirror: mirror.to_string(),
        reason: e.to_string(),
    })? {
        for piece in bytes.chunks(chunk_size) {
            writer
                .write_all(piece)
                .await
                .map_err(|e| persist_error(path, e))?;
        }
        written += bytes.len() as u64;
    }

    writer.flush().await.map_err(|e| persist_error(path, e))?;
    Ok(written)
}

fn persist_error(path: &Path, e: std::io::Error) -> Error {
    DownloadError::Persist {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
    .into()
}
