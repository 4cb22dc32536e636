//! archive
//!
//! Gzip-compressed tar extraction into a staging workspace.
//!
//! # Invariants
//!
//! - Entries never land outside the destination directory: absolute paths
//!   and `..` components are refused
//! - A `.git` component is refused at any depth, so package content can
//!   never overwrite the workspace's repository metadata or smuggle in a
//!   nested repository
//! - Symlink and hard link targets obey the same rules as entry paths:
//!   relative, no `..`, no `.git`. A link can therefore never route a later
//!   entry into metadata or out of the destination
//!
//! # Example
//!
//! ```ignore
//! use tagvault::archive::extract_tar_gz;
//!
//! let file = std::fs::File::open("pkg.tar.gz")?;
//! let count = extract_tar_gz(file, workspace.path())?;
//! ```

use std::io::Read;
use std::path::{Component, Path};

use flate2::read::GzDecoder;
use tar::{Archive, EntryType};
use thiserror::Error;

/// Directory name reserved for repository metadata.
const VCS_DIR: &str = ".git";

/// Errors from archive extraction.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The stream is not a readable gzip tar archive.
    #[error("failed to decode archive: {0}")]
    Decode(#[source] std::io::Error),

    /// An entry path escapes the destination or names reserved metadata.
    #[error("archive entry has an unsafe path: {0}")]
    UnsafePath(String),

    /// A link entry points outside the destination or into reserved metadata.
    #[error("archive entry '{path}' links to an unsafe target: {target}")]
    UnsafeLink { path: String, target: String },

    /// Writing an entry to disk failed.
    #[error("failed to extract '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Decompress and unpack a `.tar.gz` stream into `dest`.
///
/// Returns the number of entries extracted (directories included).
///
/// # Errors
///
/// - [`ArchiveError::Decode`] if the stream is not gzip/tar
/// - [`ArchiveError::UnsafePath`] for traversal or `.git` entries
/// - [`ArchiveError::UnsafeLink`] for links with absolute, `..` or `.git` targets
/// - [`ArchiveError::Write`] if an entry cannot be written
pub fn extract_tar_gz<R: Read>(reader: R, dest: &Path) -> Result<usize, ArchiveError> {
    let mut archive = Archive::new(GzDecoder::new(reader));
    let entries = archive.entries().map_err(ArchiveError::Decode)?;

    let mut count = 0;
    for entry in entries {
        let mut entry = entry.map_err(ArchiveError::Decode)?;
        let path = entry.path().map_err(ArchiveError::Decode)?.into_owned();
        let display = path.display().to_string();

        check_entry_path(&path)?;
        if matches!(entry.header().entry_type(), EntryType::Symlink | EntryType::Link) {
            let target = entry.link_name().map_err(ArchiveError::Decode)?;
            let target = target.as_deref().unwrap_or_else(|| Path::new(""));
            if !is_safe_relative(target) {
                return Err(ArchiveError::UnsafeLink {
                    path: display,
                    target: target.display().to_string(),
                });
            }
        }

        let unpacked = entry.unpack_in(dest).map_err(|source| ArchiveError::Write {
            path: display.clone(),
            source,
        })?;
        if !unpacked {
            return Err(ArchiveError::UnsafePath(display));
        }
        count += 1;
    }

    Ok(count)
}

fn check_entry_path(path: &Path) -> Result<(), ArchiveError> {
    if is_safe_relative(path) || path.components().all(|c| c == Component::CurDir) {
        Ok(())
    } else {
        Err(ArchiveError::UnsafePath(path.display().to_string()))
    }
}

/// A non-empty relative path made only of normal components, none of them `.git`.
fn is_safe_relative(path: &Path) -> bool {
    let mut normal = path
        .components()
        .filter(|c| *c != Component::CurDir)
        .peekable();
    normal.peek().is_some()
        && normal.all(|c| matches!(c, Component::Normal(part) if part != VCS_DIR))
}
