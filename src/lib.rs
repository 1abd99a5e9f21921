//! Share a single file or a directory over HTTP.
//!
//! A target is inspected, listed and archived once at startup into an
//! immutable [`Target`]; every request is then answered from that snapshot.
//! The pieces are usable as a library so several independent servers can run
//! in one process.

pub mod archive;
pub mod config;
pub mod error;
pub mod handlers;
pub mod render;
pub mod routes;
pub mod server;
pub mod target;

use std::sync::Arc;

use tracing::{info, warn};

pub use config::{Compression, Config, Settings};
pub use error::BoarError;
pub use target::{DirectoryDescriptor, FileDescriptor, Target, TargetKind};

use archive::ArchiveOptions;
use target::ChildArchive;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// What is being served, fixed at startup
    pub target: Arc<Target>,
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Wrap an already prepared target.
    pub fn new(target: Target, settings: Settings) -> Self {
        Self {
            target: Arc::new(target),
            settings: Arc::new(settings),
        }
    }

    /// Inspect, list and archive the configured target.
    ///
    /// Blocking; every error here is a startup failure.
    pub fn prepare(settings: Settings) -> error::Result<Self> {
        let target = prepare_target(&settings)?;
        Ok(Self::new(target, settings))
    }
}

fn prepare_target(settings: &Settings) -> error::Result<Target> {
    let path = &settings.target;
    let kind = target::inspect(path)?;
    info!("The argument is a {:?}: {}", kind, path.display());

    if kind == TargetKind::File {
        if settings.children {
            warn!("--children has no effect when serving a single file");
        }
        return Ok(Target::File(FileDescriptor::from_path(path)?));
    }

    let files = target::list_directory(path)?;

    let mut archive = None;
    let mut children = Vec::new();
    if settings.nozip {
        info!("Archiving disabled");
    } else {
        let mut options = ArchiveOptions {
            archive_dir: settings.archive_dir.clone(),
            compression: settings.compression,
            sequence: None,
        };
        let mut whole = archive::create_archive(path, &options)?;
        if settings.keep_archive {
            whole.keep();
        }
        archive = Some(whole);

        if settings.children {
            for (n, child) in target::list_subdirectories(path)?.iter().enumerate() {
                options.sequence = Some(n + 1);
                let mut child_archive = archive::create_archive(child, &options)?;
                if settings.keep_archive {
                    child_archive.keep();
                }
                children.push(ChildArchive {
                    name: target::display_name(child),
                    archive: child_archive,
                });
            }
        }
    }

    Ok(Target::Directory(DirectoryDescriptor {
        name: target::display_name(path),
        path: path.clone(),
        files,
        archive,
        children,
    }))
}
