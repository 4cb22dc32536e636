//! registry::staging
//!
//! Per-publish scratch directories.
//!
//! # Invariants
//!
//! - Each publish attempt gets its own uniquely named directory
//! - The directory is removed when the workspace is dropped, on success
//!   and failure alike

use std::fs;
use std::io;
use std::path::Path;

use tempfile::TempDir;

use crate::core::types::PackageName;

const VCS_DIR: &str = ".git";

/// An exclusively owned scratch directory for one publish attempt.
#[derive(Debug)]
pub struct StagingWorkspace {
    dir: TempDir,
}

impl StagingWorkspace {
    /// Create a fresh workspace under the system temp directory.
    pub fn create(name: &PackageName) -> io::Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(&format!("tagvault-{}-", name.as_str()))
            .tempdir()?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Remove everything except repository metadata.
    ///
    /// Returns the number of top-level entries removed.
    pub fn clear_content(&self) -> io::Result<usize> {
        let mut removed = 0;
        for entry in fs::read_dir(self.path())? {
            let entry = entry?;
            if entry.file_name() == VCS_DIR {
                continue;
            }
            if entry.file_type()?.is_dir() {
                fs::remove_dir_all(entry.path())?;
            } else {
                fs::remove_file(entry.path())?;
            }
            removed += 1;
        }
        Ok(removed)
    }
}
