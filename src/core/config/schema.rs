//! core::config::schema
//!
//! Configuration file schema.
//!
//! # Example
//!
//! ```toml
//! [storage]
//! root = "/var/lib/tagvault"
//! repo_ext = ".git"
//! export_marker = "git-daemon-export-ok"
//! branch = "master"
//!
//! [identity.committer]
//! name = "tagvault"
//! email = "tagvault@localhost"
//!
//! [identity.tagger]
//! name = "tagvault"
//! email = "tagvault@localhost"
//!
//! [locking]
//! enabled = true
//! timeout_ms = 30000
//! ```
//!
//! # Validation
//!
//! Values are validated after parsing: suffixes and marker names must not
//! smuggle path separators, the branch must be a valid branch name, and
//! identities must be writable as git signatures.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::types::Identity;
use crate::git::Git;

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Where and how repositories are stored
    pub storage: StorageConfig,

    /// Fixed identities for generated commits and tags
    pub identity: IdentityConfig,

    /// Per-package locking
    pub locking: LockingConfig,
}

/// `[storage]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    /// Storage root for all package repositories
    pub root: Option<PathBuf>,

    /// Suffix appended to package names (default: ".git")
    pub repo_ext: Option<String>,

    /// Visibility marker file name (default: "git-daemon-export-ok")
    pub export_marker: Option<String>,

    /// Branch each version is committed on (default: "master")
    pub branch: Option<String>,
}

/// `[identity]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct IdentityConfig {
    pub committer: Option<Identity>,
    pub tagger: Option<Identity>,
}

/// `[locking]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LockingConfig {
    /// Serialize publish/delete per package (default: true)
    pub enabled: Option<bool>,

    /// How long to wait for a package lock (default: 30000)
    pub timeout_ms: Option<u64>,
}

impl FileConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.storage.validate()?;
        self.identity.validate()?;
        Ok(())
    }
}

impl StorageConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(root) = &self.root {
            if root.as_os_str().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "storage.root cannot be empty".to_string(),
                ));
            }
        }

        if let Some(ext) = &self.repo_ext {
            if !ext.is_empty() && !ext.starts_with('.') {
                return Err(ConfigError::InvalidValue(format!(
                    "storage.repo_ext '{ext}' must be empty or start with '.'"
                )));
            }
            if has_separator(ext) {
                return Err(ConfigError::InvalidValue(format!(
                    "storage.repo_ext '{ext}' cannot contain path separators"
                )));
            }
        }

        if let Some(marker) = &self.export_marker {
            if marker.is_empty() || marker == "." || marker == ".." || has_separator(marker) {
                return Err(ConfigError::InvalidValue(format!(
                    "storage.export_marker '{marker}' must be a plain file name"
                )));
            }
        }

        if let Some(branch) = &self.branch {
            if !Git::is_valid_branch_name(branch) {
                return Err(ConfigError::InvalidValue(format!(
                    "storage.branch '{branch}' is not a valid branch name"
                )));
            }
        }

        Ok(())
    }
}

impl IdentityConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        for (field, identity) in [("committer", &self.committer), ("tagger", &self.tagger)] {
            if let Some(identity) = identity {
                identity.validate().map_err(|e| {
                    ConfigError::InvalidValue(format!("identity.{field}: {e}"))
                })?;
            }
        }
        Ok(())
    }
}

fn has_separator(s: &str) -> bool {
    s.contains('/') || s.contains('\\')
}
