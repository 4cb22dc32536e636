//! core::state
//!
//! Filesystem probe for the lifecycle state of a package repository.
//!
//! # States
//!
//! ```text
//! Absent -> Initializing -> Hidden -> Visible
//!                              |         |
//!                              v         v
//!                         Quarantined  Deleted
//! ```
//!
//! The filesystem is the source of truth. Only the states observable at
//! the canonical path are reported by [`probe`]:
//!
//! - `Absent`: nothing at the canonical path
//! - `Hidden`: something at the canonical path without the export marker
//!   (initializing, never published, or interrupted)
//! - `Visible`: export marker present
//!
//! Quarantined and deleted repositories live at sibling paths (see
//! [`crate::core::paths::ArchiveStatus`]) and are never reported here.
//!
//! Whether hidden or visible data is a structurally valid repository is a
//! question for the git layer; the registry combines both answers.

use std::io;
use std::path::Path;

use crate::core::paths::RegistryPaths;
use crate::core::visibility;

/// Observable state of a package's canonical repository path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepoState {
    Absent,
    Hidden,
    Visible,
}

impl RepoState {
    /// Check if anything exists at the canonical path.
    pub fn exists(&self) -> bool {
        !matches!(self, RepoState::Absent)
    }

    /// Check if the repository is servable.
    pub fn is_visible(&self) -> bool {
        matches!(self, RepoState::Visible)
    }

    /// Get a human-readable description of the state.
    pub fn description(&self) -> &'static str {
        match self {
            RepoState::Absent => "absent",
            RepoState::Hidden => "hidden",
            RepoState::Visible => "visible",
        }
    }
}

impl std::fmt::Display for RepoState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}

/// Probe the state of the repository at `repo_path`.
pub fn probe(paths: &RegistryPaths, repo_path: &Path) -> io::Result<RepoState> {
    if !repo_path.try_exists()? {
        return Ok(RepoState::Absent);
    }
    if visibility::is_visible(paths, repo_path)? {
        Ok(RepoState::Visible)
    } else {
        Ok(RepoState::Hidden)
    }
}
