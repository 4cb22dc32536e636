//! git
//!
//! Single interface for all Git operations.
//!
//! # Architecture
//!
//! This module is the **ONLY doorway** to Git. Canonical repositories and
//! staging workspaces are created, read and written through [`Git`]. No
//! other module imports `git2`, and nothing outside this module inspects
//! repository internals.
//!
//! # Responsibilities
//!
//! - Bare repository initialization and opening
//! - Cloning a canonical repository into a staging workspace
//! - Index, commit and annotated tag creation
//! - Pushing refs back to the canonical repository
//! - Tag enumeration
//!
//! # Invariants
//!
//! - Benign engine conditions (empty remote, nothing to push) are named
//!   outcomes, never errors
//! - "No repository here" is always [`GitError::NotARepo`], so callers can
//!   tell a corrupted path apart from other failures
//! - Tags are never moved or overwritten
//!
//! # Example
//!
//! ```ignore
//! use tagvault::git::{Git, PushOutcome};
//!
//! let git = Git::open(&repo_path)?;
//! for tag in git.list_tags()? {
//!     println!("{} -> {}", tag.name, tag.oid);
//! }
//! ```

mod interface;

pub use interface::{
    CloneOutcome, CommitInfo, Git, GitError, PushOutcome, TagEntry, TagInfo, ORIGIN,
};
