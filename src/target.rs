//! Classification of the served path and the descriptors built from it.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::archive::ArchiveDescriptor;
use crate::error::{BoarError, Result};

/// What kind of filesystem object is being served
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    File,
    Directory,
}

/// A single downloadable file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    /// Absolute path on the serving machine, never sent to clients
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
}

impl FileDescriptor {
    /// Describe a single file target, reading its size from disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        let metadata = std::fs::metadata(path).map_err(|source| BoarError::Stat {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            name: display_name(path),
            size: metadata.len(),
        })
    }
}

/// An archive of one immediate subdirectory, offered in children mode
#[derive(Debug)]
pub struct ChildArchive {
    /// Name of the subdirectory
    pub name: String,
    pub archive: ArchiveDescriptor,
}

/// A served directory with its listing and archives
#[derive(Debug)]
pub struct DirectoryDescriptor {
    pub name: String,
    pub path: PathBuf,
    /// Immediate regular-file children in enumeration order
    pub files: Vec<FileDescriptor>,
    /// Archive of the whole tree, absent with `--nozip`
    pub archive: Option<ArchiveDescriptor>,
    pub children: Vec<ChildArchive>,
}

/// The immutable thing a server instance serves
#[derive(Debug)]
pub enum Target {
    Directory(DirectoryDescriptor),
    File(FileDescriptor),
}

impl Target {
    pub fn name(&self) -> &str {
        match self {
            Target::Directory(dir) => &dir.name,
            Target::File(file) => &file.name,
        }
    }

    pub fn kind(&self) -> TargetKind {
        match self {
            Target::Directory(_) => TargetKind::Directory,
            Target::File(_) => TargetKind::File,
        }
    }

    /// Look up a downloadable file by its opaque id.
    pub fn file(&self, id: usize) -> Option<&FileDescriptor> {
        match self {
            Target::Directory(dir) => dir.files.get(id),
            Target::File(file) if id == 0 => Some(file),
            Target::File(_) => None,
        }
    }
}

/// Last path component as a display name, falling back to the whole path for `/`.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Classify a path as a file or a directory.
pub fn inspect(path: &Path) -> Result<TargetKind> {
    if path.as_os_str().is_empty() {
        return Err(BoarError::EmptyPath);
    }

    let metadata = match std::fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(BoarError::NotFound(path.to_path_buf()));
        }
        Err(source) => {
            return Err(BoarError::Stat {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    if metadata.is_dir() {
        Ok(TargetKind::Directory)
    } else {
        Ok(TargetKind::File)
    }
}

/// List the immediate regular-file children of a directory.
///
/// The first read or metadata error aborts the listing.
pub fn list_directory(dir: &Path) -> Result<Vec<FileDescriptor>> {
    let read_dir_err = |source| BoarError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_dir_err)? {
        let entry = entry.map_err(read_dir_err)?;
        let entry_path = entry.path();

        // Follows symlinks so linked files report their real size
        let metadata = match std::fs::metadata(&entry_path) {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                warn!("Skipping dangling link: {}", entry_path.display());
                continue;
            }
            Err(source) => {
                return Err(BoarError::Stat {
                    path: entry_path,
                    source,
                });
            }
        };

        if !metadata.is_file() {
            debug!("Not listing non-file entry: {}", entry_path.display());
            continue;
        }

        files.push(FileDescriptor {
            name: entry.file_name().to_string_lossy().to_string(),
            path: entry_path,
            size: metadata.len(),
        });
    }

    Ok(files)
}

/// Immediate subdirectories of `dir`, sorted by name.
pub fn list_subdirectories(dir: &Path) -> Result<Vec<PathBuf>> {
    let read_dir_err = |source| BoarError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_dir_err)? {
        let entry = entry.map_err(read_dir_err)?;
        if entry.file_type().map_err(read_dir_err)?.is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_inspect_classifies_file_and_directory() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("report.pdf");
        std::fs::write(&file, "pdf").unwrap();

        assert_eq!(inspect(temp_dir.path()).unwrap(), TargetKind::Directory);
        assert_eq!(inspect(&file).unwrap(), TargetKind::File);
    }

    #[test]
    fn test_inspect_rejects_empty_and_missing() {
        assert!(matches!(inspect(Path::new("")), Err(BoarError::EmptyPath)));

        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing");
        assert!(matches!(inspect(&missing), Err(BoarError::NotFound(p)) if p == missing));
    }

    #[test]
    fn test_list_directory_sizes_and_skips_subdirectories() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        std::fs::write(root.join("a.txt"), "hello").unwrap();
        std::fs::write(root.join("b.txt"), "0123456789").unwrap();
        std::fs::create_dir(root.join("nested")).unwrap();
        std::fs::write(root.join("nested/c.txt"), "deep").unwrap();

        let mut files = list_directory(root).unwrap();
        files.sort_by(|a, b| a.name.cmp(&b.name));

        assert_eq!(files.len(), 2);
        assert_eq!(files[0].name, "a.txt");
        assert_eq!(files[0].size, 5);
        assert_eq!(files[0].path, root.join("a.txt"));
        assert_eq!(files[1].name, "b.txt");
        assert_eq!(files[1].size, 10);
    }

    #[test]
    fn test_list_directory_empty() {
        let temp_dir = TempDir::new().unwrap();
        assert!(list_directory(temp_dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_list_directory_missing_fails() {
        let temp_dir = TempDir::new().unwrap();
        let result = list_directory(&temp_dir.path().join("gone"));
        assert!(matches!(result, Err(BoarError::ReadDir { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_list_directory_follows_file_links_and_skips_dangling() {
        use std::os::unix::fs::symlink;

        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        std::fs::write(root.join("real.txt"), "abc").unwrap();
        symlink(root.join("real.txt"), root.join("link.txt")).unwrap();
        symlink(root.join("nowhere"), root.join("dangling")).unwrap();

        let mut files = list_directory(root).unwrap();
        files.sort_by(|a, b| a.name.cmp(&b.name));
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["link.txt", "real.txt"]);
        assert!(files.iter().all(|f| f.size == 3));
    }

    #[test]
    fn test_list_subdirectories_sorted() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        std::fs::create_dir(root.join("zeta")).unwrap();
        std::fs::create_dir(root.join("alpha")).unwrap();
        std::fs::write(root.join("file.txt"), "x").unwrap();

        let dirs = list_subdirectories(root).unwrap();
        assert_eq!(dirs, vec![root.join("alpha"), root.join("zeta")]);
    }

    #[test]
    fn test_file_descriptor_from_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("report.pdf");
        std::fs::write(&path, vec![0u8; 2048]).unwrap();

        let file = FileDescriptor::from_path(&path).unwrap();
        assert_eq!(file.name, "report.pdf");
        assert_eq!(file.size, 2048);

        let target = Target::File(file);
        assert_eq!(target.kind(), TargetKind::File);
        assert!(target.file(0).is_some());
        assert!(target.file(1).is_none());
    }
}
