// Unpacks downloaded release archives into a staging directory.
// Zip is the common case (ninja releases, registry source archives);
// gzipped tarballs are handled for tools that publish those instead.

use crate::error::{Error, Result};
use crate::log_debug;
use colored::Colorize;
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io;
use std::path::Path;
use tar::Archive;
use zip::ZipArchive;

/// Archive formats we know how to unpack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    TarGz,
}

impl ArchiveKind {
    /// Picks the archive format from a file name, defaulting to zip: source
    /// archives and most Windows assets are zips even when the name says little.
    pub fn from_file_name(name: &str) -> ArchiveKind {
        let lower = name.to_lowercase();
        if lower.ends_with(".tar.gz") || lower.ends_with(".tgz") {
            ArchiveKind::TarGz
        } else {
            ArchiveKind::Zip
        }
    }
}

/// Extracts the archive at `src` into `dest`.
///
/// # Arguments
/// * `src` - The downloaded archive
/// * `dest` - Directory that receives the archive's contents (created if missing)
/// * `kind` - Archive format, usually from [`ArchiveKind::from_file_name`]
pub fn extract_archive(src: &Path, dest: &Path, kind: ArchiveKind) -> Result<()> {
    log_debug!(
        "[Extract] Unpacking {} ({:?}) into {}",
        src.display().to_string().blue(),
        kind,
        dest.display().to_string().cyan()
    );
    fs::create_dir_all(dest)?;

    match kind {
        ArchiveKind::Zip => {
            let mut archive = ZipArchive::new(File::open(src)?)?;
            archive.extract(dest)?;
        }
        ArchiveKind::TarGz => {
            let mut archive = Archive::new(GzDecoder::new(File::open(src)?));
            archive.unpack(dest).map_err(|e| {
                Error::Io(io::Error::new(
                    e.kind(),
                    format!("failed to unpack {}: {}", src.display(), e),
                ))
            })?;
        }
    }

    log_debug!("[Extract] Archive contents available at {}", dest.display().to_string().green());
    Ok(())
}
