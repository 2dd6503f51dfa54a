//! Error types shared by the release cache, installer, toolchain locator and
//! environment bridge.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the provisioning core
#[derive(Error, Debug)]
pub enum Error {
    #[error("no cached release list for {tool}")]
    CacheMiss { tool: String },

    #[error("release registry unavailable for {tool}: {reason}")]
    RegistryUnavailable { tool: String, reason: String },

    #[error("no asset of release {tag} matches '{pattern}' (available assets: {})", .assets.join(", "))]
    AssetNotFound {
        tag: String,
        pattern: String,
        assets: Vec<String>,
    },

    #[error("release {tag} has more than one candidate asset: {}", .candidates.join(", "))]
    AmbiguousAsset { tag: String, candidates: Vec<String> },

    #[error("there's no {tool} release {version}, available releases: {}", .known.join(", "))]
    VersionNotFound {
        tool: String,
        version: String,
        known: Vec<String>,
    },

    #[error("{tool} is not installed")]
    NotInstalled { tool: String },

    #[error("{tool} installation is corrupt, {reason} ({})", .path.display())]
    CorruptInstall {
        tool: String,
        reason: String,
        path: PathBuf,
    },

    #[error("{tool} executable {} was not produced by the installation", .path.display())]
    ExecutableMissing { tool: String, path: PathBuf },

    #[error("post-install step for {tool} failed: {reason}")]
    PostInstallFailed { tool: String, reason: String },

    #[error("no Visual Studio toolchain with C++ build tools is available")]
    NoToolchainFound,

    #[error("no toolchain found by id {instance_id}, available: {}", .choices.join(", "))]
    ToolchainNotFound {
        instance_id: String,
        choices: Vec<String>,
    },

    #[error("toolchain {instance_id} has no developer environment script")]
    MissingInitScript { instance_id: String },

    #[error("toolchain probe failed: {0}")]
    ProbeFailed(String),

    #[error("command exited with code {code}")]
    CommandFailed { code: i32 },

    #[error("download of {url} failed with HTTP {status}: {body}")]
    DownloadFailed {
        url: String,
        status: u16,
        body: String,
    },

    #[error("request to {url} failed: {reason}")]
    Http { url: String, reason: String },

    #[error("invalid asset pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

impl Error {
    /// Exit code to hand back to the shell for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::CommandFailed { code } if *code != 0 => *code,
            _ => 1,
        }
    }
}
