//! core::paths
//!
//! Centralized path routing for package repositories.
//!
//! # Architecture
//!
//! Every on-disk location the registry touches is computed here. No other
//! module joins package names onto the storage root.
//!
//! # Storage Layout
//!
//! ```text
//! <root>/
//!   <name><ext>/                      canonical bare repository
//!     git-daemon-export-ok            visibility marker
//!   <name><ext>-<uuid>.corrupted/     quarantined repository
//!   <name><ext>-<timestamp>.deleted/  soft-deleted repository
//!   .locks/<name>.lock                per-package lock file
//! ```
//!
//! # Example
//!
//! ```
//! use tagvault::core::paths::RegistryPaths;
//! use tagvault::core::types::PackageName;
//! use std::path::PathBuf;
//!
//! let paths = RegistryPaths::new("/srv/repos", ".git", "git-daemon-export-ok");
//! let name = PackageName::new("foo").unwrap();
//!
//! assert_eq!(paths.repo_path(&name), PathBuf::from("/srv/repos/foo.git"));
//! assert_eq!(
//!     paths.export_marker_path(&paths.repo_path(&name)),
//!     PathBuf::from("/srv/repos/foo.git/git-daemon-export-ok")
//! );
//! ```

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};
use uuid::Uuid;

use crate::core::types::PackageName;

/// Format of the timestamp embedded in soft-deleted repository paths.
pub const DELETED_TIMESTAMP_FORMAT: &str = "%Y_%m_%dT%H_%M_%S";

/// Why a repository was moved out of the active namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveStatus {
    /// Structurally invalid data moved aside by repository resolution.
    Corrupted,
    /// Soft-deleted package.
    Deleted,
}

impl ArchiveStatus {
    /// The path extension carrying this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            ArchiveStatus::Corrupted => "corrupted",
            ArchiveStatus::Deleted => "deleted",
        }
    }
}

impl std::fmt::Display for ArchiveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A quarantined or soft-deleted repository sitting next to the canonical path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivedRepo {
    pub path: PathBuf,
    pub status: ArchiveStatus,
}

/// Path routing for the registry's storage root.
///
/// # Invariants
///
/// - Every path is a pure function of the root, the suffix convention and
///   a validated [`PackageName`]
/// - Quarantine and deletion paths never equal the canonical path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryPaths {
    root: PathBuf,
    repo_ext: String,
    export_marker: String,
}

impl RegistryPaths {
    /// Create path routing for a storage root.
    ///
    /// `root` should already be absolute; configuration loading takes care
    /// of that.
    pub fn new(
        root: impl Into<PathBuf>,
        repo_ext: impl Into<String>,
        export_marker: impl Into<String>,
    ) -> Self {
        Self {
            root: root.into(),
            repo_ext: repo_ext.into(),
            export_marker: export_marker.into(),
        }
    }

    /// The storage root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory name of a package's repository (`<name><ext>`).
    pub fn repo_dir_name(&self, name: &PackageName) -> String {
        format!("{}{}", name.as_str(), self.repo_ext)
    }

    /// Canonical location of a package's bare repository.
    pub fn repo_path(&self, name: &PackageName) -> PathBuf {
        self.root.join(self.repo_dir_name(name))
    }

    /// Location of the visibility marker inside a repository.
    pub fn export_marker_path(&self, repo_path: &Path) -> PathBuf {
        repo_path.join(&self.export_marker)
    }

    /// Quarantine destination for a corrupted repository.
    ///
    /// A fresh v4 UUID makes the path unique.
    pub fn corrupted_path(&self, repo_path: &Path) -> PathBuf {
        with_suffix(
            repo_path,
            &Uuid::new_v4().to_string(),
            ArchiveStatus::Corrupted,
        )
    }

    /// Soft-delete destination for a repository deleted at `at`.
    pub fn deleted_path(&self, repo_path: &Path, at: DateTime<Utc>) -> PathBuf {
        with_suffix(
            repo_path,
            &at.format(DELETED_TIMESTAMP_FORMAT).to_string(),
            ArchiveStatus::Deleted,
        )
    }

    /// Directory holding per-package lock files.
    pub fn locks_dir(&self) -> PathBuf {
        self.root.join(".locks")
    }

    /// Lock file guarding mutations of one package.
    ///
    /// The file outlives the package; see [`crate::core::lock`].
    pub fn lock_path(&self, name: &PackageName) -> PathBuf {
        self.locks_dir().join(format!("{}.lock", name.as_str()))
    }

    /// List quarantined and soft-deleted repositories of a package.
    ///
    /// A sibling only counts when its suffix has the exact shape this module
    /// generates (`-<uuid>.corrupted` or `-<timestamp>.deleted`), so copies
    /// belonging to a package whose name extends this one are not listed.
    /// Results are sorted by path. A missing storage root yields an empty list.
    pub fn archived(&self, name: &PackageName) -> std::io::Result<Vec<ArchivedRepo>> {
        let prefix = format!("{}-", self.repo_dir_name(name));
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut found = Vec::new();
        for entry in entries {
            let entry = entry?;
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            let Some(rest) = file_name.strip_prefix(&prefix) else {
                continue;
            };
            let Some(status) = archive_status(rest) else {
                continue;
            };
            found.push(ArchivedRepo {
                path: entry.path(),
                status,
            });
        }

        found.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(found)
    }
}

/// Classify the part of a sibling's name after `<name><ext>-`.
fn archive_status(rest: &str) -> Option<ArchiveStatus> {
    let (suffix, status) = rest.rsplit_once('.')?;
    match status {
        "corrupted" => Uuid::parse_str(suffix)
            .ok()
            .map(|_| ArchiveStatus::Corrupted),
        "deleted" => NaiveDateTime::parse_from_str(suffix, DELETED_TIMESTAMP_FORMAT)
            .ok()
            .map(|_| ArchiveStatus::Deleted),
        _ => None,
    }
}

fn with_suffix(repo_path: &Path, suffix: &str, status: ArchiveStatus) -> PathBuf {
    let mut name: OsString = repo_path.as_os_str().to_owned();
    name.push(format!("-{suffix}.{status}"));
    PathBuf::from(name)
}
