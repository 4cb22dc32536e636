//! core::visibility
//!
//! Controls whether a repository may be served to VCS clients.
//!
//! A repository is visible iff its export marker file exists. Repository
//! data existing is not the same as being servable: repositories still
//! initializing, quarantined or deleted must never carry the marker.
//!
//! All three operations are idempotent.

use std::fs::{self, OpenOptions};
use std::io::{self, ErrorKind};
use std::path::Path;

use crate::core::paths::RegistryPaths;

/// Create the export marker if absent.
pub fn make_visible(paths: &RegistryPaths, repo_path: &Path) -> io::Result<()> {
    let marker = paths.export_marker_path(repo_path);
    match OpenOptions::new().write(true).create_new(true).open(&marker) {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(e),
    }
}

/// Remove the export marker if present.
pub fn hide(paths: &RegistryPaths, repo_path: &Path) -> io::Result<()> {
    if !repo_path.is_dir() {
        return Ok(());
    }
    let marker = paths.export_marker_path(repo_path);
    let result = match fs::symlink_metadata(&marker) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(&marker),
        Ok(_) => fs::remove_file(&marker),
        Err(e) => Err(e),
    };
    match result {
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// Report whether the export marker exists.
pub fn is_visible(paths: &RegistryPaths, repo_path: &Path) -> io::Result<bool> {
    // Garbage at the repository path may be a plain file.
    if !repo_path.is_dir() {
        return Ok(false);
    }
    paths.export_marker_path(repo_path).try_exists()
}
