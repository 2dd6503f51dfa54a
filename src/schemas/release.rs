// Defines the release data model: the raw shape returned by the registry API
// (which is also what the release cache persists) and the normalized `Release`
// the installer works with.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A release entry exactly as the registry API returns it.
///
/// Only the fields the installer consumes are modelled; everything else in the
/// API response is ignored on the way in, so the cache file stays small.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRelease {
    /// The release tag, e.g. `"v1.12.1"`.
    pub tag_name: String,
    /// Publication time. Draft releases carry `null` here.
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    /// `true` for releases flagged as pre-release on the registry.
    #[serde(default)]
    pub prerelease: bool,
    /// Uploaded binary assets. May be empty for source-only releases.
    #[serde(default)]
    pub assets: Vec<RawAsset>,
    /// Link to the automatically generated source archive of the tag.
    #[serde(default)]
    pub zipball_url: Option<String>,
}

/// A downloadable file attached to a [`RawRelease`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawAsset {
    #[serde(default)]
    pub content_type: String,
    pub name: String,
    pub browser_download_url: String,
}

/// A usable release: not a pre-release and with at least one asset.
#[derive(Debug, Clone, PartialEq)]
pub struct Release {
    pub tag: String,
    pub published_at: Option<DateTime<Utc>>,
    pub assets: Vec<Asset>,
}

/// A single downloadable file of a [`Release`].
#[derive(Debug, Clone, PartialEq)]
pub struct Asset {
    pub content_type: String,
    pub name: String,
    pub download_url: String,
}

impl From<&RawAsset> for Asset {
    fn from(raw: &RawAsset) -> Self {
        Asset {
            content_type: raw.content_type.clone(),
            name: raw.name.clone(),
            download_url: raw.browser_download_url.clone(),
        }
    }
}

impl Release {
    /// Normalizes a raw registry entry into a usable release.
    ///
    /// # Arguments
    /// * `raw`: The entry as returned by the registry.
    /// * `repository`: `owner/repo` id, used to name a synthesized source archive asset.
    /// * `source_archive_fallback`: Whether a release without assets may fall back
    ///   to its source archive (`zipball_url`).
    ///
    /// # Returns
    /// * `None` for pre-releases and for releases with nothing to download.
    pub fn from_raw(raw: &RawRelease, repository: &str, source_archive_fallback: bool) -> Option<Release> {
        if raw.prerelease {
            return None;
        }

        let assets: Vec<Asset> = if !raw.assets.is_empty() {
            raw.assets.iter().map(Asset::from).collect()
        } else if source_archive_fallback {
            let url = raw.zipball_url.as_ref()?;
            let repo_name = repository.rsplit('/').next().unwrap_or(repository);
            vec![Asset {
                content_type: "application/zip".to_string(),
                name: format!("{}-{}.zip", repo_name, raw.tag_name),
                download_url: url.clone(),
            }]
        } else {
            return None;
        };

        Some(Release {
            tag: raw.tag_name.clone(),
            published_at: raw.published_at,
            assets,
        })
    }

    /// Names of all assets, for diagnostics.
    pub fn asset_names(&self) -> Vec<String> {
        self.assets.iter().map(|a| a.name.clone()).collect()
    }
}
