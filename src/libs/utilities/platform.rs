// Small platform facts the tool descriptors and the environment bridge need.

/// Asset name pattern of the ninja release archive built for this platform.
pub fn ninja_asset_pattern() -> &'static str {
    if cfg!(windows) {
        r"win\.zip$"
    } else if cfg!(target_os = "macos") {
        r"mac\.zip$"
    } else {
        r"linux\.zip$"
    }
}

/// Name of the search-path environment variable, compared case-insensitively.
pub const PATH_VAR: &str = "PATH";

/// Separator between search-path entries.
#[cfg(windows)]
pub const PATH_SEPARATOR: char = ';';
#[cfg(not(windows))]
pub const PATH_SEPARATOR: char = ':';
