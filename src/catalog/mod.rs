//! Catalog resolution against the osu! web service.
//!
//! Turns what the user typed into a numeric user id, reads how many beatmaps
//! that user has played, and pages through the "most played" listing to build
//! a deduplicated list of beatmap sets. Only the identity lookup can fail the
//! run; every later failure degrades to a shorter (possibly empty) catalog.

use crate::config::Config;
use crate::error::{CatalogError, Error, Result};
use crate::http::HttpClient;
use crate::types::{BeatmapsetId, CatalogItem, UserId, UserIdentity};
use regex::Regex;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// `GET {base}/users/{id}/extra-pages/historical` body (only the part we read)
#[derive(Debug, Deserialize)]
struct HistoricalPage {
    beatmap_playcounts: Option<PlaycountSection>,
}

#[derive(Debug, Deserialize)]
struct PlaycountSection {
    count: Option<u64>,
}

/// One record of the most-played listing
#[derive(Debug, Deserialize)]
struct MostPlayedEntry {
    beatmap: BeatmapRef,
    beatmapset: BeatmapsetRef,
}

#[derive(Debug, Deserialize)]
struct BeatmapRef {
    beatmapset_id: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct BeatmapsetRef {
    #[serde(default)]
    title: Option<String>,
}

/// Resolves users and enumerates their most-played beatmap sets
pub struct CatalogResolver {
    /// Shared HTTP client (owned by the pipeline)
    client: HttpClient,
    /// Run configuration
    config: Arc<Config>,
}

impl CatalogResolver {
    /// Create a resolver using the given client and configuration
    pub fn new(client: HttpClient, config: Arc<Config>) -> Self {
        Self { client, config }
    }

    /// Resolve an identity and list every beatmap set the user has played
    ///
    /// # Errors
    /// Only identity resolution is fatal; see [`CatalogResolver::resolve_identity`].
    pub async fn fetch_catalog(&self, identity: &UserIdentity) -> Result<Vec<CatalogItem>> {
        let user_id = self.resolve_identity(identity).await?;
        let total_count = self.get_total_count(user_id).await;
        info!(user_id = user_id.0, total_count, "Resolved user");
        Ok(self.list_items(user_id, total_count).await)
    }

    /// Turn an identity into a numeric user id
    ///
    /// Numeric identities are returned unchanged without any request. Usernames
    /// are looked up via the profile URL with redirects disabled; the response
    /// body carries a `Redirecting to {base}/users/{id}` notice.
    ///
    /// # Errors
    /// Returns [`Error::IdentityResolution`] if the request fails or the notice
    /// is absent.
    pub async fn resolve_identity(&self, identity: &UserIdentity) -> Result<UserId> {
        let name = match identity {
            UserIdentity::Id(id) => return Ok(*id),
            UserIdentity::Username(name) => name,
        };

        let resolution_error = |reason: String| Error::IdentityResolution {
            input: name.clone(),
            reason,
        };

        let mut url = url::Url::parse(self.config.base_url())
            .map_err(|e| resolution_error(format!("invalid base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|()| resolution_error("base URL cannot have a path".to_string()))?
            .pop_if_empty()
            .extend(["users", name.as_str()]);

        debug!(username = %name, url = %url, "Looking up user id");
        let response = self
            .client
            .no_redirect()
            .get(url)
            .send()
            .await
            .map_err(|e| resolution_error(format!("profile lookup failed: {}", e)))?;
        let body = response
            .text()
            .await
            .map_err(|e| resolution_error(format!("failed to read profile response: {}", e)))?;

        parse_redirect_notice(&body, self.config.base_url())
            .map(UserId)
            .ok_or_else(|| resolution_error("no redirect notice in profile response".to_string()))
    }

    /// Number of beatmaps the user has played; `0` if it cannot be determined
    pub async fn get_total_count(&self, user_id: UserId) -> u64 {
        let url = format!(
            "{}/users/{}/extra-pages/historical?mode={}",
            self.config.base_url(),
            user_id,
            self.config.catalog.mode
        );

        let count = self
            .get_json::<HistoricalPage>(&url)
            .await
            .and_then(|page| {
                page.beatmap_playcounts
                    .and_then(|section| section.count)
                    .ok_or_else(|| {
                        CatalogError::MissingField {
                            field: "beatmap_playcounts.count",
                        }
                        .into()
                    })
            });

        match count {
            Ok(count) => count,
            Err(e) => {
                warn!(user_id = user_id.0, error = %e, "Error fetching play counts");
                0
            }
        }
    }

    /// Page through the most-played listing and collect unique beatmap sets
    ///
    /// Offsets step by the configured page size from 0 while below
    /// `total_count`. The first failing page ends pagination; whatever was
    /// collected up to that point is returned. A single record that does not
    /// decode is skipped without affecting the rest of its page, and a record
    /// without a title is kept with an empty one.
    pub async fn list_items(&self, user_id: UserId, total_count: u64) -> Vec<CatalogItem> {
        let page_size = self.config.catalog.page_size.max(1);
        let mut items = Vec::new();
        let mut seen = HashSet::new();
        let mut offset = 0;

        while offset < total_count {
            info!(
                user_id = user_id.0,
                remaining = total_count - offset,
                "Remaining beatmaps to extract"
            );
            let url = format!(
                "{}/users/{}/beatmapsets/most_played?limit={}&offset={}",
                self.config.base_url(),
                user_id,
                page_size,
                offset
            );

            let records = match self.get_json::<Vec<serde_json::Value>>(&url).await {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(user_id = user_id.0, offset, error = %e, "Error fetching beatmaps, stopping");
                    break;
                }
            };

            let before = items.len();
            for record in records {
                let entry = match serde_json::from_value::<MostPlayedEntry>(record) {
                    Ok(entry) => entry,
                    Err(e) => {
                        warn!(user_id = user_id.0, offset, error = %e, "Skipping malformed beatmap record");
                        continue;
                    }
                };
                let Some(id) = entry.beatmap.beatmapset_id.filter(|id| *id != 0) else {
                    continue;
                };
                if seen.insert(id) {
                    items.push(CatalogItem {
                        id: BeatmapsetId(id),
                        title: entry.beatmapset.title.unwrap_or_default(),
                    });
                }
            }
            debug!(offset, new_items = items.len() - before, "Fetched most-played page");

            if !self.config.catalog.page_delay.is_zero() {
                tokio::time::sleep(self.config.catalog.page_delay).await;
            }
            offset += page_size;
        }

        items
    }

    /// GET a JSON document with the catalog request timeout
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self
            .client
            .standard()
            .get(url)
            .timeout(self.config.catalog.request_timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            }
            .into());
        }

        Ok(response.json::<T>().await?)
    }
}

/// Extract the user id from a `Redirecting to {base}/users/{digits}` notice
fn parse_redirect_notice(body: &str, base_url: &str) -> Option<u64> {
    let pattern = format!(r"Redirecting to {}/users/(\d+)", regex::escape(base_url));
    let re = Regex::new(&pattern).ok()?;
    re.captures(body)?.get(1)?.as_str().parse().ok()
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
