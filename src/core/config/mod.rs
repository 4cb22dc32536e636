//! core::config
//!
//! Configuration schema and loading.
//!
//! # Precedence
//!
//! The first configuration file found wins:
//! 1. An explicit path (the `--config` flag)
//! 2. `$TAGVAULT_CONFIG` if set
//! 3. `$XDG_CONFIG_HOME/tagvault/config.toml`
//! 4. `~/.tagvault/config.toml`
//!
//! Missing files are not an error (defaults are used). An explicit path
//! that does not exist is.
//!
//! # Example
//!
//! ```no_run
//! use tagvault::core::config::Config;
//!
//! let config = Config::load(None).unwrap();
//! println!("storage root: {}", config.root.display());
//! ```

pub mod schema;

pub use schema::FileConfig;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::core::paths::RegistryPaths;
use crate::core::types::Identity;

/// Environment variable naming a configuration file.
pub const CONFIG_ENV: &str = "TAGVAULT_CONFIG";

const DEFAULT_REPO_EXT: &str = ".git";
const DEFAULT_EXPORT_MARKER: &str = "git-daemon-export-ok";
const DEFAULT_BRANCH: &str = "master";
const DEFAULT_LOCK_TIMEOUT_MS: u64 = 30_000;
const SYSTEM_NAME: &str = "tagvault";
const SYSTEM_EMAIL: &str = "tagvault@localhost";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Resolved registry configuration.
///
/// Passed explicitly into [`crate::registry::Registry::new`]; there is no
/// global configuration state.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Absolute storage root
    pub root: PathBuf,
    /// Repository suffix convention
    pub repo_ext: String,
    /// Visibility marker file name
    pub export_marker: String,
    /// Branch each version is committed on
    pub branch: String,
    /// Committer of every version commit
    pub committer: Identity,
    /// Tagger of every version tag
    pub tagger: Identity,
    /// Per-package lock timeout; `None` disables locking
    pub lock_timeout: Option<Duration>,
    loaded_from: Option<PathBuf>,
}

impl Config {
    /// Default configuration rooted at `root`.
    ///
    /// # Example
    ///
    /// ```
    /// use tagvault::core::config::Config;
    ///
    /// let config = Config::with_root("/srv/repos");
    /// assert_eq!(config.repo_ext, ".git");
    /// assert_eq!(config.branch, "master");
    /// assert!(config.lock_timeout.is_some());
    /// ```
    pub fn with_root(root: impl AsRef<Path>) -> Self {
        Self {
            root: absolutize(root.as_ref()),
            repo_ext: DEFAULT_REPO_EXT.to_string(),
            export_marker: DEFAULT_EXPORT_MARKER.to_string(),
            branch: DEFAULT_BRANCH.to_string(),
            committer: system_identity(),
            tagger: system_identity(),
            lock_timeout: Some(Duration::from_millis(DEFAULT_LOCK_TIMEOUT_MS)),
            loaded_from: None,
        }
    }

    /// Load configuration from the first file found (see module docs).
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read, parsed
    /// or validated, or if `explicit` names a missing file.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            return Self::from_file(path);
        }

        for path in Self::search_paths() {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Self::from_file_config(FileConfig::default(), None)
    }

    /// Load configuration from a specific file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let file: FileConfig = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        Self::from_file_config(file, Some(path.to_path_buf()))
    }

    /// Apply defaults to a parsed file.
    pub fn from_file_config(
        file: FileConfig,
        loaded_from: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        file.validate()?;

        let root = file.storage.root.unwrap_or_else(default_root);
        let mut config = Self::with_root(root);

        if let Some(ext) = file.storage.repo_ext {
            config.repo_ext = ext;
        }
        if let Some(marker) = file.storage.export_marker {
            config.export_marker = marker;
        }
        if let Some(branch) = file.storage.branch {
            config.branch = branch;
        }
        if let Some(committer) = file.identity.committer {
            config.committer = committer;
        }
        if let Some(tagger) = file.identity.tagger {
            config.tagger = tagger;
        }
        config.lock_timeout = match file.locking.enabled {
            Some(false) => None,
            _ => Some(Duration::from_millis(
                file.locking.timeout_ms.unwrap_or(DEFAULT_LOCK_TIMEOUT_MS),
            )),
        };
        config.loaded_from = loaded_from;

        Ok(config)
    }

    /// Candidate config file locations in precedence order.
    fn search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            paths.push(PathBuf::from(path));
        }
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            paths.push(PathBuf::from(xdg_home).join("tagvault/config.toml"));
        }
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".tagvault/config.toml"));
        }
        paths
    }

    /// Override the storage root (the `--root` flag).
    pub fn set_root(&mut self, root: impl AsRef<Path>) {
        self.root = absolutize(root.as_ref());
    }

    /// Path routing for this configuration.
    pub fn paths(&self) -> RegistryPaths {
        RegistryPaths::new(&self.root, &self.repo_ext, &self.export_marker)
    }

    /// Get the path to the loaded config file.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.loaded_from.as_deref()
    }
}

fn system_identity() -> Identity {
    Identity {
        name: SYSTEM_NAME.to_string(),
        email: SYSTEM_EMAIL.to_string(),
    }
}

fn default_root() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("tagvault"))
        .unwrap_or_else(|| PathBuf::from("tagvault"))
}

fn absolutize(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
