use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BoarError, Result};

/// Compression used for archive entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    Deflated,
    Stored,
}

impl From<Compression> for zip::CompressionMethod {
    fn from(value: Compression) -> Self {
        match value {
            Compression::Deflated => zip::CompressionMethod::Deflated,
            Compression::Stored => zip::CompressionMethod::Stored,
        }
    }
}

/// Options read from an optional TOML config file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Address to bind to when no `--bind` is given
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Directory the temporary archives are written to
    #[serde(default = "default_archive_dir")]
    pub archive_dir: PathBuf,

    /// Compression method for archive entries
    #[serde(default)]
    pub compression: Compression,

    /// Leave archives on disk after shutdown
    #[serde(default)]
    pub keep_archive: bool,
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_archive_dir() -> PathBuf {
    std::env::temp_dir()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            archive_dir: default_archive_dir(),
            compression: Compression::default(),
            keep_archive: false,
        }
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|err| {
            BoarError::Config(format!("cannot read {}: {err}", path.display()))
        })?;
        Self::from_toml(&content)
            .map_err(|err| BoarError::Config(format!("{}: {err}", path.display())))
    }

    fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

/// Fully resolved runtime settings: command line values layered over the config file.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Absolute path of the file or directory being served
    pub target: PathBuf,
    pub addr: SocketAddr,
    /// Skip archiving entirely
    pub nozip: bool,
    /// Archive each immediate subdirectory on its own
    pub children: bool,
    pub archive_dir: PathBuf,
    pub compression: Compression,
    pub keep_archive: bool,
}

impl Settings {
    /// Build settings from the raw target argument, port, bind override and flags.
    pub fn resolve(
        target: &Path,
        port: u16,
        bind: Option<&str>,
        nozip: bool,
        children: bool,
        config: Config,
    ) -> Result<Self> {
        if target.as_os_str().is_empty() {
            return Err(BoarError::EmptyPath);
        }
        let target = std::path::absolute(target)?;

        let bind = bind.unwrap_or(&config.bind);
        let ip: IpAddr = bind
            .parse()
            .map_err(|_| BoarError::Config(format!("invalid bind address: {bind}")))?;

        Ok(Self {
            target,
            addr: SocketAddr::new(ip, port),
            nozip,
            children,
            archive_dir: config.archive_dir,
            compression: config.compression,
            keep_archive: config.keep_archive,
        })
    }
}
