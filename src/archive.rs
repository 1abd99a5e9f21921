//! One-shot zip archiving of a served directory.
//!
//! Archives are written to disk once at startup and removed again when the
//! owning [`ArchiveDescriptor`] is dropped.

use std::fs::OpenOptions;
use std::io::{Seek, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info, warn};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::config::Compression;
use crate::error::{BoarError, Result};

const ARCHIVE_SUFFIX: &str = "boar.zip.tmp";

/// A finished archive on disk
#[derive(Debug)]
pub struct ArchiveDescriptor {
    /// Absolute path of the archive file, never sent to clients
    pub path: PathBuf,
    /// Download name offered to clients
    pub name: String,
    /// Size of the finished archive
    pub size: u64,
    keep: bool,
}

impl ArchiveDescriptor {
    /// Leave the archive on disk when this descriptor is dropped.
    pub fn keep(&mut self) {
        self.keep = true;
    }
}

impl Drop for ArchiveDescriptor {
    fn drop(&mut self) {
        if self.keep {
            debug!("Keeping archive: {}", self.path.display());
            return;
        }
        if let Err(err) = remove_archive(&self.path) {
            warn!("Failed to remove archive {}: {}", self.path.display(), err);
        }
    }
}

/// Options for a single archive run
#[derive(Debug, Clone)]
pub struct ArchiveOptions {
    /// Directory the archive file is created in
    pub archive_dir: PathBuf,
    pub compression: Compression,
    /// Distinguishes archives created within the same millisecond
    pub sequence: Option<usize>,
}

/// Remove an archive file. A file that is already gone is not an error.
pub fn remove_archive(path: &Path) -> std::io::Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            info!("Removed archive: {}", path.display());
            Ok(())
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err),
    }
}

/// Temporary archive path made of the parent, a millisecond timestamp and a fixed suffix.
pub fn temp_archive_path(parent: &Path, millis: u128, sequence: Option<usize>) -> PathBuf {
    let token = match sequence {
        Some(n) => format!("{millis}-{n}"),
        None => millis.to_string(),
    };
    parent.join(format!("{token}{ARCHIVE_SUFFIX}"))
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

/// Entry name for `path` inside an archive of `root`, always `/`-separated.
fn entry_name(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect();
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}

fn zip_error(error: zip::result::ZipError) -> BoarError {
    BoarError::Archive(error.to_string())
}

/// Archive every regular file under `dir` into a new temporary zip.
///
/// On any error the partial archive is removed and the error returned.
pub fn create_archive(dir: &Path, options: &ArchiveOptions) -> Result<ArchiveDescriptor> {
    let path = temp_archive_path(&options.archive_dir, now_millis(), options.sequence);
    info!("Archiving {} into {}", dir.display(), path.display());

    let file = OpenOptions::new()
        .write(true)
        .read(true)
        .create_new(true)
        .open(&path)
        .map_err(|err| BoarError::Archive(format!("cannot create {}: {err}", path.display())))?;

    // Owns the file from here on, so an early return cleans it up
    let mut archive = ArchiveDescriptor {
        path,
        name: format!("{}.zip", crate::target::display_name(dir)),
        size: 0,
        keep: false,
    };

    let entries = write_archive(file, dir, &archive.path, options.compression)?;
    archive.size = std::fs::metadata(&archive.path)?.len();

    info!(
        "Archived {} files from {} ({} bytes)",
        entries,
        dir.display(),
        archive.size
    );
    Ok(archive)
}

fn write_archive<W: Write + Seek>(
    writer: W,
    dir: &Path,
    archive_path: &Path,
    compression: Compression,
) -> Result<usize> {
    let mut zip = ZipWriter::new(writer);
    let options = SimpleFileOptions::default()
        .compression_method(compression.into())
        .unix_permissions(0o644)
        .large_file(true);

    let mut entries = 0;
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|err| BoarError::Archive(err.to_string()))?;
        let entry_path = entry.path();

        if entry_path == archive_path {
            continue;
        }

        let file_type = entry.file_type();
        let is_file = file_type.is_file() || (file_type.is_symlink() && entry_path.is_file());
        if !is_file {
            continue;
        }

        let Some(name) = entry_name(dir, entry_path) else {
            continue;
        };
        debug!("Adding {}", name);

        let mut input = std::fs::File::open(entry_path).map_err(|err| {
            BoarError::Archive(format!("cannot open {}: {err}", entry_path.display()))
        })?;
        zip.start_file(name.as_str(), options).map_err(zip_error)?;
        std::io::copy(&mut input, &mut zip).map_err(|err| {
            BoarError::Archive(format!("cannot read {}: {err}", entry_path.display()))
        })?;
        entries += 1;
    }

    let mut writer = zip.finish().map_err(zip_error)?;
    writer.flush()?;
    Ok(entries)
}
