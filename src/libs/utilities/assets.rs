// Picks the one release asset a tool should download.
//
// Selection never guesses: unless exactly one asset qualifies, the caller gets
// an error listing the candidates so the pattern (or the release) can be fixed.

use crate::error::{Error, Result};
use crate::log_debug;
use crate::schemas::release::{Asset, Release};
use colored::Colorize;
use regex::Regex;

/// Selects the single asset of `release` matching `pattern`.
///
/// # Arguments
/// * `release`: The release to pick from.
/// * `pattern`: Regex matched against asset names. With `None` the release
///   must carry exactly one asset.
///
/// # Returns
/// * The matching asset, or
/// * `AssetNotFound` when nothing matches,
/// * `AmbiguousAsset` when more than one asset qualifies.
pub fn select_asset<'r>(release: &'r Release, pattern: Option<&str>) -> Result<&'r Asset> {
    let candidates: Vec<&Asset> = match pattern {
        Some(pattern) => {
            let matcher = Regex::new(pattern)?;
            release.assets.iter().filter(|a| matcher.is_match(&a.name)).collect()
        }
        None => release.assets.iter().collect(),
    };

    match candidates.as_slice() {
        [single] => {
            log_debug!("[Assets] Selected {} from release {}", single.name.bold(), release.tag);
            Ok(single)
        }
        [] => Err(Error::AssetNotFound {
            tag: release.tag.clone(),
            pattern: pattern.unwrap_or("<any>").to_string(),
            assets: release.asset_names(),
        }),
        many => Err(Error::AmbiguousAsset {
            tag: release.tag.clone(),
            candidates: many.iter().map(|a| a.name.clone()).collect(),
        }),
    }
}
