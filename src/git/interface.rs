//! git::interface
//!
//! Git interface implementation using git2.
//!
//! This module provides the **single doorway** to all Git operations in the
//! registry. It exposes exactly the capabilities the repository lifecycle
//! needs, normalizes errors into typed failure categories, and reports the
//! benign conditions of the underlying engine as named outcomes instead of
//! errors.
//!
//! # Capabilities
//!
//! - [`Git::init_bare`] / [`Git::open`] - canonical storage
//! - [`Git::clone_into`] - staging workspace, reporting [`CloneOutcome::EmptyRemote`]
//! - [`Git::stage_all`] / [`Git::commit`] / [`Git::create_annotated_tag`]
//! - [`Git::push`] - reporting [`PushOutcome::UpToDate`]
//! - [`Git::list_tags`] - tag enumeration
//!
//! # Error Handling
//!
//! Git errors are categorized into typed variants:
//! - [`GitError::NotARepo`]: No repository at the path (the "repository absent" class)
//! - [`GitError::RefExists`]: A ref that must be created already exists
//! - [`GitError::PushRejected`]: The remote refused a ref update
//! - [`GitError::Transport`]: Object transfer failed
//!
//! # Example
//!
//! ```ignore
//! use tagvault::git::{Git, CloneOutcome};
//!
//! let (work, outcome) = Git::clone_into(&canonical, scratch.path(), "master")?;
//! if outcome == CloneOutcome::EmptyRemote {
//!     // first publish of this package
//! }
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::types::{Identity, Oid, TypeError};

/// Name of the remote a staging workspace pushes to.
pub const ORIGIN: &str = "origin";

/// Errors from Git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// No repository exists at the path.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was opened
        path: PathBuf,
    },

    /// Requested ref does not exist.
    #[error("ref not found: {refname}")]
    RefNotFound {
        /// The ref that was not found
        refname: String,
    },

    /// A ref that must be newly created already exists.
    #[error("ref already exists: {refname}")]
    RefExists {
        /// The conflicting ref
        refname: String,
    },

    /// The remote refused to update a ref.
    #[error("push of {refname} rejected: {message}")]
    PushRejected {
        /// The ref the remote refused
        refname: String,
        /// Reason reported by the remote
        message: String,
    },

    /// Object transfer to or from a remote failed.
    #[error("transport error: {message}")]
    Transport {
        /// Description of the failure
        message: String,
    },

    /// Invalid object id format.
    #[error("invalid object id: {oid}")]
    InvalidOid {
        /// The invalid OID string
        oid: String,
    },

    /// Invalid ref name format.
    #[error("invalid ref name: {message}")]
    InvalidRefName {
        /// Description of the problem
        message: String,
    },

    /// Permission or filesystem error.
    #[error("repository access error: {message}")]
    AccessError {
        /// Description of the error
        message: String,
    },

    /// Internal git2 error.
    #[error("git error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl GitError {
    /// Create a GitError from a git2::Error with richer context.
    fn from_git2(err: git2::Error, context: &str) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound if context.starts_with("refs/") => GitError::RefNotFound {
                refname: context.to_string(),
            },
            git2::ErrorCode::Exists => GitError::RefExists {
                refname: context.to_string(),
            },
            git2::ErrorCode::NotFastForward => GitError::PushRejected {
                refname: context.to_string(),
                message: err.message().to_string(),
            },
            git2::ErrorCode::InvalidSpec => GitError::InvalidRefName {
                message: format!("{}: {}", context, err.message()),
            },
            git2::ErrorCode::Locked => GitError::AccessError {
                message: format!("repository is locked: {}", err.message()),
            },
            _ => match err.class() {
                git2::ErrorClass::Net | git2::ErrorClass::Ssh | git2::ErrorClass::Http => {
                    GitError::Transport {
                        message: format!("{}: {}", context, err.message()),
                    }
                }
                git2::ErrorClass::Os => GitError::AccessError {
                    message: format!("{}: {}", context, err.message()),
                },
                _ => GitError::Internal {
                    message: format!("{}: {}", context, err.message()),
                },
            },
        }
    }

    /// Check if this error means no repository exists at the path.
    pub fn is_not_a_repo(&self) -> bool {
        matches!(self, GitError::NotARepo { .. })
    }
}

impl From<git2::Error> for GitError {
    fn from(err: git2::Error) -> Self {
        Self::from_git2(err, "git")
    }
}

impl From<TypeError> for GitError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidOid(oid) => GitError::InvalidOid { oid },
            other => GitError::Internal {
                message: other.to_string(),
            },
        }
    }
}

/// Result of cloning a repository into a workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloneOutcome {
    /// The branch was checked out from the source.
    Cloned,
    /// The source has no commits on the branch yet; the workspace is a
    /// fresh repository with the source configured as `origin`.
    EmptyRemote,
}

/// Result of pushing refs to a remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// At least one remote ref changed.
    Pushed,
    /// Every remote ref already had the pushed value.
    UpToDate,
}

/// A tag ref with the name it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagEntry {
    /// The tag's name: the name recorded in the tag object for annotated
    /// tags, the ref's short name otherwise
    pub name: String,
    /// The OID the tag ref points to
    pub oid: Oid,
    /// Whether the ref points at an annotated tag object
    pub annotated: bool,
}

/// Information about a commit.
#[derive(Debug, Clone)]
pub struct CommitInfo {
    /// The commit OID
    pub oid: Oid,
    /// Full commit message
    pub message: String,
    /// Author name
    pub author_name: String,
    /// Author email
    pub author_email: String,
    /// Committer name
    pub committer_name: String,
    /// Committer email
    pub committer_email: String,
}

/// Information about an annotated tag.
#[derive(Debug, Clone)]
pub struct TagInfo {
    /// Name recorded in the tag object
    pub name: String,
    /// The commit the tag points at
    pub target: Oid,
    /// Tagger name
    pub tagger_name: String,
    /// Tagger email
    pub tagger_email: String,
    /// Tag message
    pub message: String,
}

/// The Git interface.
///
/// This is the **single point of interaction** with Git. No other module
/// imports `git2` directly.
pub struct Git {
    /// The underlying git2 repository
    repo: git2::Repository,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git")
            .field("path", &self.repo.path())
            .finish()
    }
}

impl Git {
    // =========================================================================
    // Repository Creation and Opening
    // =========================================================================

    /// Initialize a new bare repository whose HEAD names `branch`.
    ///
    /// Parent directories are created as needed. Fails if a repository
    /// already exists at `path`.
    pub fn init_bare(path: &Path, branch: &str) -> Result<Self, GitError> {
        let mut opts = git2::RepositoryInitOptions::new();
        opts.bare(true)
            .no_reinit(true)
            .mkpath(true)
            .initial_head(branch);

        let repo = git2::Repository::init_opts(path, &opts)
            .map_err(|e| GitError::from_git2(e, &path.display().to_string()))?;
        Ok(Self { repo })
    }

    /// Open the repository at exactly `path` (no discovery of parents).
    ///
    /// # Errors
    ///
    /// Returns [`GitError::NotARepo`] if no valid repository exists there.
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::open(path).map_err(|e| match e.code() {
            git2::ErrorCode::NotFound => GitError::NotARepo {
                path: path.to_path_buf(),
            },
            _ => GitError::from_git2(e, &path.display().to_string()),
        })?;
        Ok(Self { repo })
    }

    /// Clone `branch` of the repository at `source` into the empty
    /// directory `dest`.
    ///
    /// A source without the branch is not an error: `dest` becomes a fresh
    /// repository on `branch` with `source` as its `origin`, and the
    /// outcome is [`CloneOutcome::EmptyRemote`].
    pub fn clone_into(
        source: &Path,
        dest: &Path,
        branch: &str,
    ) -> Result<(Self, CloneOutcome), GitError> {
        let url = source.to_str().ok_or_else(|| GitError::AccessError {
            message: format!("non UTF-8 repository path: {}", source.display()),
        })?;

        let remote = Self::open(source)?;
        if remote.try_resolve_ref(&branch_ref(branch))?.is_none() {
            let mut opts = git2::RepositoryInitOptions::new();
            opts.initial_head(branch);
            let repo = git2::Repository::init_opts(dest, &opts)
                .map_err(|e| GitError::from_git2(e, &dest.display().to_string()))?;
            repo.remote(ORIGIN, url)
                .map_err(|e| GitError::from_git2(e, ORIGIN))?;
            return Ok((Self { repo }, CloneOutcome::EmptyRemote));
        }

        let repo = git2::build::RepoBuilder::new()
            .branch(branch)
            .clone(url, dest)
            .map_err(|e| GitError::from_git2(e, url))?;
        Ok((Self { repo }, CloneOutcome::Cloned))
    }

    /// Check whether `name` is usable as a branch name.
    ///
    /// # Example
    ///
    /// ```
    /// use tagvault::git::Git;
    ///
    /// assert!(Git::is_valid_branch_name("master"));
    /// assert!(!Git::is_valid_branch_name("bad..name"));
    /// assert!(!Git::is_valid_branch_name(""));
    /// ```
    pub fn is_valid_branch_name(name: &str) -> bool {
        !name.is_empty() && git2::Reference::is_valid_name(&branch_ref(name))
    }

    // =========================================================================
    // Repository Info
    // =========================================================================

    /// Path to the git directory (the repository itself when bare).
    pub fn git_dir(&self) -> &Path {
        self.repo.path()
    }

    /// Path to the working tree, if any.
    pub fn work_dir(&self) -> Option<&Path> {
        self.repo.workdir()
    }

    /// Check if the repository is bare.
    pub fn is_bare(&self) -> bool {
        self.repo.is_bare()
    }

    /// Check if the repository holds any refs at all.
    pub fn has_refs(&self) -> Result<bool, GitError> {
        let refs = self
            .repo
            .references()
            .map_err(|e| GitError::from_git2(e, "references"))?;
        for reference in refs {
            let reference = reference.map_err(|e| GitError::from_git2(e, "references"))?;
            if reference.name().is_some_and(|n| n.starts_with("refs/")) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    // =========================================================================
    // Ref Operations
    // =========================================================================

    /// Resolve a ref to the OID it points to (without peeling).
    pub fn resolve_ref(&self, refname: &str) -> Result<Oid, GitError> {
        self.try_resolve_ref(refname)?
            .ok_or_else(|| GitError::RefNotFound {
                refname: refname.to_string(),
            })
    }

    /// Resolve a ref, returning None if it doesn't exist.
    pub fn try_resolve_ref(&self, refname: &str) -> Result<Option<Oid>, GitError> {
        match self.repo.find_reference(refname) {
            Ok(reference) => {
                let resolved = reference
                    .resolve()
                    .map_err(|e| GitError::from_git2(e, refname))?;
                match resolved.target() {
                    Some(oid) => Ok(Some(Oid::new(oid.to_string())?)),
                    None => Ok(None),
                }
            }
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(GitError::from_git2(e, refname)),
        }
    }

    /// Enumerate every tag ref in the repository.
    ///
    /// Order is unspecified.
    pub fn list_tags(&self) -> Result<Vec<TagEntry>, GitError> {
        let refs = self
            .repo
            .references_glob("refs/tags/*")
            .map_err(|e| GitError::from_git2(e, "refs/tags/*"))?;

        let mut tags = Vec::new();
        for reference in refs {
            let reference = reference.map_err(|e| GitError::from_git2(e, "refs/tags/*"))?;
            let Some(target) = reference.target() else {
                continue;
            };
            let short = reference
                .shorthand()
                .unwrap_or_default()
                .to_string();

            let entry = match self.repo.find_tag(target) {
                Ok(tag) => TagEntry {
                    name: tag.name().map(str::to_string).unwrap_or(short),
                    oid: Oid::new(target.to_string())?,
                    annotated: true,
                },
                Err(_) => TagEntry {
                    name: short,
                    oid: Oid::new(target.to_string())?,
                    annotated: false,
                },
            };
            tags.push(entry);
        }
        Ok(tags)
    }

    // =========================================================================
    // Working Tree, Commits and Tags
    // =========================================================================

    /// Replace the index with every file in the working tree.
    ///
    /// Ignore rules are not applied: the index becomes an exact snapshot of
    /// the working tree (the `.git` directory excluded). Returns the number
    /// of index entries.
    pub fn stage_all(&self) -> Result<usize, GitError> {
        let mut index = self
            .repo
            .index()
            .map_err(|e| GitError::from_git2(e, "index"))?;
        index.clear().map_err(|e| GitError::from_git2(e, "index"))?;
        index
            .add_all(["*"].iter(), git2::IndexAddOption::FORCE, None)
            .map_err(|e| GitError::from_git2(e, "index"))?;
        index.write().map_err(|e| GitError::from_git2(e, "index"))?;
        Ok(index.len())
    }

    /// Commit the index onto `branch`.
    ///
    /// The branch's current tip (if any) becomes the parent, and the branch
    /// ref is advanced to the new commit.
    pub fn commit(
        &self,
        branch: &str,
        author: &Identity,
        committer: &Identity,
        message: &str,
    ) -> Result<Oid, GitError> {
        let refname = branch_ref(branch);
        let author = signature(author)?;
        let committer = signature(committer)?;

        let mut index = self
            .repo
            .index()
            .map_err(|e| GitError::from_git2(e, "index"))?;
        let tree_oid = index
            .write_tree()
            .map_err(|e| GitError::from_git2(e, "index"))?;
        let tree = self
            .repo
            .find_tree(tree_oid)
            .map_err(|e| GitError::from_git2(e, &tree_oid.to_string()))?;

        let parent = match self.repo.find_reference(&refname) {
            Ok(reference) => Some(
                reference
                    .peel_to_commit()
                    .map_err(|e| GitError::from_git2(e, &refname))?,
            ),
            Err(e) if e.code() == git2::ErrorCode::NotFound => None,
            Err(e) => return Err(GitError::from_git2(e, &refname)),
        };
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

        let oid = self
            .repo
            .commit(
                Some(&refname),
                &author,
                &committer,
                message,
                &tree,
                &parents,
            )
            .map_err(|e| GitError::from_git2(e, &refname))?;
        Ok(Oid::new(oid.to_string())?)
    }

    /// Create an annotated tag `name` pointing at commit `target`.
    ///
    /// # Errors
    ///
    /// Returns [`GitError::RefExists`] if the tag already exists; tags are
    /// never moved.
    pub fn create_annotated_tag(
        &self,
        name: &str,
        target: &Oid,
        tagger: &Identity,
        message: &str,
    ) -> Result<Oid, GitError> {
        let refname = format!("refs/tags/{name}");
        let tagger = signature(tagger)?;
        let target = self.find_object(target, Some(git2::ObjectType::Commit))?;

        let oid = self
            .repo
            .tag(name, &target, &tagger, message, false)
            .map_err(|e| GitError::from_git2(e, &refname))?;
        Ok(Oid::new(oid.to_string())?)
    }

    /// Push `refspecs` to the named remote.
    ///
    /// # Errors
    ///
    /// Returns [`GitError::PushRejected`] if the remote refuses any ref, or
    /// [`GitError::Transport`] if the transfer itself fails.
    pub fn push(&self, remote: &str, refspecs: &[String]) -> Result<PushOutcome, GitError> {
        let mut remote = self
            .repo
            .find_remote(remote)
            .map_err(|e| GitError::from_git2(e, remote))?;

        let mut changed = 0usize;
        let mut rejected: Vec<(String, String)> = Vec::new();
        {
            let mut callbacks = git2::RemoteCallbacks::new();
            callbacks.push_negotiation(|updates| {
                changed = updates.iter().filter(|u| u.src() != u.dst()).count();
                Ok(())
            });
            callbacks.push_update_reference(|refname, status| {
                if let Some(message) = status {
                    rejected.push((refname.to_string(), message.to_string()));
                }
                Ok(())
            });

            let mut opts = git2::PushOptions::new();
            opts.remote_callbacks(callbacks);
            remote
                .push(refspecs, Some(&mut opts))
                .map_err(|e| match e.code() {
                    git2::ErrorCode::NotFastForward => GitError::PushRejected {
                        refname: refspecs.join(" "),
                        message: e.message().to_string(),
                    },
                    _ => GitError::Transport {
                        message: e.message().to_string(),
                    },
                })?;
        }

        if let Some((refname, message)) = rejected.into_iter().next() {
            return Err(GitError::PushRejected { refname, message });
        }

        if changed == 0 {
            Ok(PushOutcome::UpToDate)
        } else {
            Ok(PushOutcome::Pushed)
        }
    }

    // =========================================================================
    // Object Inspection
    // =========================================================================

    /// Get information about a commit (a tag is peeled to its commit).
    pub fn commit_info(&self, oid: &Oid) -> Result<CommitInfo, GitError> {
        let commit = self
            .find_object(oid, None)?
            .peel_to_commit()
            .map_err(|e| GitError::from_git2(e, oid.as_str()))?;

        let author = commit.author();
        let committer = commit.committer();
        Ok(CommitInfo {
            oid: Oid::new(commit.id().to_string())?,
            message: commit.message().unwrap_or_default().to_string(),
            author_name: author.name().unwrap_or_default().to_string(),
            author_email: author.email().unwrap_or_default().to_string(),
            committer_name: committer.name().unwrap_or_default().to_string(),
            committer_email: committer.email().unwrap_or_default().to_string(),
        })
    }

    /// Get information about an annotated tag by tag name.
    pub fn tag_info(&self, name: &str) -> Result<TagInfo, GitError> {
        let refname = format!("refs/tags/{name}");
        let oid = self.resolve_ref(&refname)?;
        let tag = self
            .find_object(&oid, Some(git2::ObjectType::Tag))?
            .peel_to_tag()
            .map_err(|e| GitError::from_git2(e, &refname))?;

        let (tagger_name, tagger_email) = match tag.tagger() {
            Some(sig) => (
                sig.name().unwrap_or_default().to_string(),
                sig.email().unwrap_or_default().to_string(),
            ),
            None => (String::new(), String::new()),
        };
        Ok(TagInfo {
            name: tag.name().unwrap_or_default().to_string(),
            target: Oid::new(tag.target_id().to_string())?,
            tagger_name,
            tagger_email,
            message: tag.message().unwrap_or_default().to_string(),
        })
    }

    /// List the file paths in the tree of a commit (or tag pointing to one).
    ///
    /// Paths use `/` separators and are sorted.
    pub fn tree_files(&self, oid: &Oid) -> Result<Vec<String>, GitError> {
        let tree = self
            .find_object(oid, None)?
            .peel_to_tree()
            .map_err(|e| GitError::from_git2(e, oid.as_str()))?;

        let mut files = Vec::new();
        tree.walk(git2::TreeWalkMode::PreOrder, |root, entry| {
            if entry.kind() != Some(git2::ObjectType::Tree) {
                if let Some(name) = entry.name() {
                    files.push(format!("{root}{name}"));
                }
            }
            git2::TreeWalkResult::Ok
        })
        .map_err(|e| GitError::from_git2(e, oid.as_str()))?;

        files.sort();
        Ok(files)
    }

    fn find_object(
        &self,
        oid: &Oid,
        kind: Option<git2::ObjectType>,
    ) -> Result<git2::Object<'_>, GitError> {
        let raw = git2::Oid::from_str(oid.as_str()).map_err(|_| GitError::InvalidOid {
            oid: oid.to_string(),
        })?;
        self.repo
            .find_object(raw, kind)
            .map_err(|e| GitError::from_git2(e, oid.as_str()))
    }
}

fn branch_ref(branch: &str) -> String {
    format!("refs/heads/{branch}")
}

fn signature(identity: &Identity) -> Result<git2::Signature<'static>, GitError> {
    git2::Signature::now(&identity.name, &identity.email).map_err(|e| GitError::Internal {
        message: format!("invalid signature '{}': {}", identity, e.message()),
    })
}
