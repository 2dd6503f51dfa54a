// Talks to the release registry (the GitHub REST API) and downloads release assets.
//
// The installer only sees the two traits below, so tests can swap in fakes and
// nothing in the install pipeline depends on the network directly.

use crate::error::{Error, Result};
use crate::schemas::release::RawRelease;
use crate::{log_debug, log_info};
use colored::Colorize;
use std::fs::File;
use std::io;
use std::path::Path;

/// Identifies us to the registry; the API rejects requests without a user agent.
pub const USER_AGENT: &str = "ninja-master";
/// Upper bound on redirect hops for API calls and downloads.
pub const MAX_REDIRECTS: u32 = 8;
const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Source of a tool's release list.
pub trait ReleaseRegistry {
    /// Lists all releases of `repository` (`owner/repo`), newest first.
    fn list_releases(&self, repository: &str) -> Result<Vec<RawRelease>>;
}

/// Transport for release assets.
pub trait Downloader {
    /// Streams `url` into the file at `dest`.
    ///
    /// # Returns
    /// * The advisory filename from the `Content-Disposition` header, if the server sent one.
    fn download(&self, url: &str, dest: &Path) -> Result<Option<String>>;
}

/// Blocking client for the GitHub REST API and its asset downloads.
pub struct GitHubClient {
    agent: ureq::Agent,
    api_base: String,
}

impl GitHubClient {
    pub fn new() -> Self {
        Self::with_api_base(DEFAULT_API_BASE)
    }

    /// Client against a different API root (GitHub Enterprise, mirrors).
    pub fn with_api_base(api_base: &str) -> Self {
        let agent = ureq::AgentBuilder::new()
            .user_agent(USER_AGENT)
            .redirects(MAX_REDIRECTS)
            .build();
        GitHubClient {
            agent,
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }
}

impl Default for GitHubClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ReleaseRegistry for GitHubClient {
    fn list_releases(&self, repository: &str) -> Result<Vec<RawRelease>> {
        let url = format!("{}/repos/{}/releases?per_page=100", self.api_base, repository);
        log_debug!("[Registry] GET {}", url.blue());

        let response = self
            .agent
            .get(&url)
            .set("Accept", "application/json")
            .call()
            .map_err(|e| http_error(&url, e))?;

        let releases: Vec<RawRelease> = response.into_json().map_err(|e| Error::Http {
            url: url.clone(),
            reason: format!("unexpected response body: {}", e),
        })?;
        log_debug!("[Registry] {} returned {} releases", repository, releases.len());
        Ok(releases)
    }
}

impl Downloader for GitHubClient {
    fn download(&self, url: &str, dest: &Path) -> Result<Option<String>> {
        log_info!("[Download] Downloading {}...", url.cyan());

        let response = self.agent.get(url).call().map_err(|e| http_error(url, e))?;
        let filename = response
            .header("content-disposition")
            .and_then(advisory_filename);

        let mut file = File::create(dest)?;
        let mut reader = response.into_reader();
        let bytes = io::copy(&mut reader, &mut file)?;

        log_debug!(
            "[Download] Wrote {} bytes to {} (advisory name: {:?})",
            bytes,
            dest.display().to_string().green(),
            filename
        );
        Ok(filename)
    }
}

/// Converts a ureq failure into our error type, keeping the body of non-2xx responses.
fn http_error(url: &str, err: ureq::Error) -> Error {
    match err {
        ureq::Error::Status(status, response) => Error::DownloadFailed {
            url: url.to_string(),
            status,
            body: response.into_string().unwrap_or_default(),
        },
        ureq::Error::Transport(transport) => Error::Http {
            url: url.to_string(),
            reason: transport.to_string(),
        },
    }
}

/// Extracts the filename from a `Content-Disposition` header value.
///
/// Prefers the RFC 5987 `filename*=` form and falls back to plain `filename=`.
/// Any directory part is stripped so the name can be used as a file name safely.
pub fn advisory_filename(header: &str) -> Option<String> {
    let params: Vec<(&str, &str)> = header
        .split(';')
        .filter_map(|part| part.trim().split_once('='))
        .map(|(k, v)| (k.trim(), v.trim()))
        .collect();

    let extended = params
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("filename*"))
        .map(|(_, v)| v.rsplit("''").next().unwrap_or(*v));
    let plain = params
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("filename"))
        .map(|(_, v)| *v);

    let raw = extended.or(plain)?.trim_matches('"');
    let name = raw.rsplit(['/', '\\']).next().unwrap_or(raw);
    if name.is_empty() { None } else { Some(name.to_string()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advisory_filename_from_plain_parameter() {
        assert_eq!(
            advisory_filename("attachment; filename=microsoft-vcpkg-2024.02.14-0-gfe1cde6.zip"),
            Some("microsoft-vcpkg-2024.02.14-0-gfe1cde6.zip".to_string())
        );
        assert_eq!(
            advisory_filename(r#"attachment; filename="ninja-win.zip""#),
            Some("ninja-win.zip".to_string())
        );
    }

    #[test]
    fn advisory_filename_prefers_extended_parameter_and_strips_directories() {
        assert_eq!(
            advisory_filename("attachment; filename=\"fallback.zip\"; filename*=UTF-8''real.zip"),
            Some("real.zip".to_string())
        );
        assert_eq!(
            advisory_filename("attachment; filename=\"../../etc/evil.zip\""),
            Some("evil.zip".to_string())
        );
    }

    #[test]
    fn advisory_filename_absent() {
        assert_eq!(advisory_filename("inline"), None);
        assert_eq!(advisory_filename("attachment; filename=\"\""), None);
    }
}
