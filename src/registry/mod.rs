//! registry
//!
//! Package repository lifecycle.
//!
//! # Architecture
//!
//! [`Registry`] owns every per-package repository under the configured
//! storage root. It resolves (and repairs) repositories, publishes new
//! versions through a [`StagingWorkspace`], answers existence queries, and
//! soft-deletes packages. All Git access goes through [`crate::git::Git`].
//!
//! # State Machine
//!
//! A repository's state is inferred from the filesystem by
//! [`Registry::repository_state`]:
//!
//! ```text
//! Absent ──init──▶ Hidden ──publish──▶ Visible
//!                    │                   │
//!                    └──corrupt──▶ Quarantined (<path>-<uuid>.corrupted)
//!                                        │
//!                          Visible ──delete──▶ Deleted (<path>-<ts>.deleted)
//! ```
//!
//! # Invariants
//!
//! - A version tag, once pushed, is never rewritten
//! - The canonical repository only changes by the final push of a fully
//!   formed commit and tag
//! - Quarantined and deleted data is moved aside and hidden, never erased
//! - Publish and delete of one package are serialized by a package lock
//!   (unless locking is disabled)
//!
//! # Example
//!
//! ```ignore
//! use tagvault::core::config::Config;
//! use tagvault::registry::Registry;
//!
//! let registry = Registry::new(Config::with_root("/srv/repos"));
//! let archive = std::fs::File::open("foo-1.0.0.tar.gz")?;
//! registry.register_package(&meta, archive)?;
//! assert!(registry.package_exists("foo")?);
//! ```

mod error;
mod meta;
mod staging;

pub use error::{BoxError, RegistryError, Stage};
pub use meta::ValidatedMeta;
pub use staging::StagingWorkspace;

use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::Utc;
use semver::Version;
use tracing::{debug, info, instrument, warn};

use crate::archive::{self, ArchiveError};
use crate::core::config::Config;
use crate::core::lock::{LockError, PackageLock};
use crate::core::paths::{ArchivedRepo, RegistryPaths};
use crate::core::state::{self, RepoState};
use crate::core::types::{Oid, PackageMeta, PackageName, PackageType};
use crate::core::version::{parse_version, same_release, TagName};
use crate::core::visibility;
use crate::git::{Git, GitError, PushOutcome, ORIGIN};
use meta::parse_name;

/// Result of a successful publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub name: PackageName,
    pub tag: TagName,
    /// The commit the version tag points at
    pub commit: Oid,
    /// Entries extracted from the archive
    pub entries: usize,
    /// Whether the push changed the canonical repository
    pub push: PushOutcome,
}

/// The package registry backend.
#[derive(Debug, Clone)]
pub struct Registry {
    config: Config,
    paths: RegistryPaths,
}

impl Registry {
    pub fn new(config: Config) -> Self {
        let paths = config.paths();
        Self { config, paths }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn paths(&self) -> &RegistryPaths {
        &self.paths
    }

    /// Canonical repository path of a package.
    pub fn repo_path(&self, name: &str) -> Result<PathBuf, RegistryError> {
        Ok(self.paths.repo_path(&parse_name(name)?))
    }

    /// Current lifecycle state of a package's canonical repository.
    ///
    /// Every other operation decides what to do from this probe.
    pub fn repository_state(&self, name: &str) -> Result<RepoState, RegistryError> {
        let name = parse_name(name)?;
        self.probe(&name)
    }

    /// Make sure a structurally valid bare repository exists for `name`.
    ///
    /// Corrupted data is quarantined and replaced by a fresh repository.
    /// Calling this twice in a row changes nothing the second time.
    pub fn resolve_repository(&self, name: &str) -> Result<PathBuf, RegistryError> {
        let name = parse_name(name)?;
        let _lock = self.lock(&name)?;
        self.resolve(&name)?;
        Ok(self.paths.repo_path(&name))
    }

    // =========================================================================
    // Publishing
    // =========================================================================

    /// Publish a version, dispatching on the package type.
    pub fn register_package<R: Read>(
        &self,
        meta: &PackageMeta,
        content: R,
    ) -> Result<Published, RegistryError> {
        match meta.package_type {
            PackageType::Public => self.register_public_package(meta, content),
            PackageType::Private => self.register_private_package(meta, content),
        }
    }

    /// Publish a new version of a public package.
    ///
    /// `content` is a gzip-compressed tar archive holding the complete
    /// package contents; it replaces whatever the previous version held.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::InvalidName`], [`RegistryError::InvalidVersion`] or
    ///   [`RegistryError::InvalidMeta`] for a malformed descriptor
    /// - [`RegistryError::VersionAlreadyExists`] if the version is tagged
    /// - [`RegistryError::UnsafeContent`] if the archive escapes the workspace
    ///   or touches repository metadata
    /// - [`RegistryError::Busy`] if the package lock could not be taken
    /// - [`RegistryError::Storage`] for any filesystem or Git failure
    #[instrument(skip_all, fields(package = %meta.name, version = %meta.version))]
    pub fn register_public_package<R: Read>(
        &self,
        meta: &PackageMeta,
        content: R,
    ) -> Result<Published, RegistryError> {
        let valid = meta.validate()?;
        let name = &valid.name;
        let package = name.as_str();

        let _lock = self.lock(name)?;

        let canonical = self.resolve(name)?;
        if self.has_version(&canonical, name, &valid.version)? {
            return Err(RegistryError::VersionAlreadyExists {
                package: package.to_string(),
                version: meta.version.clone(),
            });
        }
        drop(canonical);

        let repo_path = self.paths.repo_path(name);
        let branch = &self.config.branch;

        let workspace = StagingWorkspace::create(name)
            .map_err(|e| RegistryError::storage(package, Stage::Workspace, e))?;
        let (work, cloned) = Git::clone_into(&repo_path, workspace.path(), branch)
            .map_err(|e| RegistryError::storage(package, Stage::Workspace, e))?;
        debug!(workspace = %workspace.path().display(), ?cloned, "workspace ready");

        workspace
            .clear_content()
            .map_err(|e| RegistryError::storage(package, Stage::Workspace, e))?;
        let entries =
            archive::extract_tar_gz(content, workspace.path()).map_err(|e| match e {
                ArchiveError::UnsafePath(_) | ArchiveError::UnsafeLink { .. } => {
                    warn!(error = %e, "rejected archive entry");
                    RegistryError::UnsafeContent(e.to_string())
                }
                other => RegistryError::storage(package, Stage::Extract, other),
            })?;
        debug!(entries, "archive extracted");

        let staged = work
            .stage_all()
            .map_err(|e| RegistryError::storage(package, Stage::Commit, e))?;
        let commit = work
            .commit(
                branch,
                &valid.author,
                &self.config.committer,
                &commit_message(&valid.tag),
            )
            .map_err(|e| RegistryError::storage(package, Stage::Commit, e))?;
        debug!(%commit, staged, "committed");

        work.create_annotated_tag(
            valid.tag.as_str(),
            &commit,
            &self.config.tagger,
            &tag_message(&valid.tag),
        )
        .map_err(|e| RegistryError::storage(package, Stage::Tag, e))?;

        let refspecs = [
            format!("{0}:{0}", valid.tag.refname()),
            format!("+refs/heads/{branch}:refs/heads/{branch}"),
        ];
        let push = work
            .push(ORIGIN, &refspecs)
            .map_err(|e| RegistryError::storage(package, Stage::Push, e))?;
        debug!(?push, "pushed");

        visibility::make_visible(&self.paths, &repo_path)
            .map_err(|e| RegistryError::storage(package, Stage::Export, e))?;

        info!(tag = %valid.tag, %commit, "published");
        Ok(Published {
            name: valid.name.clone(),
            tag: valid.tag.clone(),
            commit,
            entries,
            push,
        })
    }

    /// Private packages are not supported.
    pub fn register_private_package<R: Read>(
        &self,
        _meta: &PackageMeta,
        _content: R,
    ) -> Result<Published, RegistryError> {
        Err(RegistryError::NotSupported("private packages".to_string()))
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Check whether `version` is already tagged for a visible package.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::NotFound`] if the package is not visible
    /// - [`RegistryError::RepositoryCorrupted`] if it cannot be opened
    /// - [`RegistryError::Storage`] if a tag name is not a version
    pub fn version_exists(&self, name: &str, version: &str) -> Result<bool, RegistryError> {
        let version = parse_version(version)?;
        let name = parse_name(name)?;
        let git = self.open_visible(&name)?;
        self.has_version(&git, &name, &version)
    }

    /// True iff the package's repository exists and is visible.
    pub fn package_exists(&self, name: &str) -> Result<bool, RegistryError> {
        Ok(self.repository_state(name)?.is_visible())
    }

    /// All published versions of a visible package, ascending.
    pub fn list_versions(&self, name: &str) -> Result<Vec<Version>, RegistryError> {
        let name = parse_name(name)?;
        let git = self.open_visible(&name)?;
        let mut versions = self.tagged_versions(&git, &name)?;
        versions.sort();
        Ok(versions)
    }

    /// Quarantined and soft-deleted repositories left behind for `name`.
    pub fn archived(&self, name: &str) -> Result<Vec<ArchivedRepo>, RegistryError> {
        let name = parse_name(name)?;
        self.paths
            .archived(&name)
            .map_err(|e| RegistryError::storage(name.as_str(), Stage::Resolve, e))
    }

    // =========================================================================
    // Deletion
    // =========================================================================

    /// Soft-delete a package.
    ///
    /// The repository is renamed to `<path>-<YYYY_MM_DDTHH_MM_SS>.deleted`
    /// and hidden. Returns the new location.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::NotFound`] if the package is not visible
    /// - [`RegistryError::Storage`] if the rename or hide fails, including
    ///   when a deletion in the same second already claimed the path
    #[instrument(skip(self))]
    pub fn delete_package(&self, name: &str) -> Result<PathBuf, RegistryError> {
        let name = parse_name(name)?;
        let package = name.as_str();
        let _lock = self.lock(&name)?;

        if !self.probe(&name)?.is_visible() {
            return Err(RegistryError::NotFound(package.to_string()));
        }

        let repo_path = self.paths.repo_path(&name);
        let deleted = self.paths.deleted_path(&repo_path, Utc::now());
        move_aside(&repo_path, &deleted)
            .map_err(|e| RegistryError::storage(package, Stage::Delete, e))?;
        visibility::hide(&self.paths, &deleted)
            .map_err(|e| RegistryError::storage(package, Stage::Delete, e))?;

        info!(to = %deleted.display(), "package deleted");
        Ok(deleted)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn probe(&self, name: &PackageName) -> Result<RepoState, RegistryError> {
        state::probe(&self.paths, &self.paths.repo_path(name))
            .map_err(|e| RegistryError::storage(name.as_str(), Stage::Resolve, e))
    }

    fn lock(&self, name: &PackageName) -> Result<Option<PackageLock>, RegistryError> {
        let Some(timeout) = self.config.lock_timeout else {
            return Ok(None);
        };
        match PackageLock::acquire_timeout(&self.paths.lock_path(name), timeout) {
            Ok(lock) => Ok(Some(lock)),
            Err(LockError::Timeout(timeout)) => Err(RegistryError::Busy {
                package: name.to_string(),
                timeout,
            }),
            Err(e) => Err(RegistryError::storage(name.as_str(), Stage::Lock, e)),
        }
    }

    /// Open or create the canonical repository, quarantining corrupted data.
    ///
    /// Caller holds the package lock.
    fn resolve(&self, name: &PackageName) -> Result<Git, RegistryError> {
        let package = name.as_str();
        let repo_path = self.paths.repo_path(name);

        match self.probe(name)? {
            RepoState::Absent => return self.init(name, &repo_path),
            RepoState::Visible => match Git::open(&repo_path) {
                Ok(git) => return Ok(git),
                Err(e) if e.is_not_a_repo() => {
                    warn!(package, error = %e, "visible repository is corrupted");
                }
                Err(e) => return Err(RegistryError::storage(package, Stage::Resolve, e)),
            },
            RepoState::Hidden => match Git::open(&repo_path) {
                Ok(git) => {
                    let has_refs = git
                        .has_refs()
                        .map_err(|e| RegistryError::storage(package, Stage::Resolve, e))?;
                    if !has_refs {
                        debug!(package, "reusing unpublished repository");
                        return Ok(git);
                    }
                    warn!(package, "hidden repository holds refs of an interrupted publish");
                }
                Err(e) => {
                    warn!(package, error = %e, "hidden repository cannot be opened");
                }
            },
        }

        self.quarantine(name, &repo_path)?;
        self.init(name, &repo_path)
    }

    fn init(&self, name: &PackageName, repo_path: &Path) -> Result<Git, RegistryError> {
        let git = Git::init_bare(repo_path, &self.config.branch)
            .map_err(|e| RegistryError::storage(name.as_str(), Stage::Init, e))?;
        info!(package = %name, path = %repo_path.display(), "initialized repository");
        Ok(git)
    }

    fn quarantine(&self, name: &PackageName, repo_path: &Path) -> Result<PathBuf, RegistryError> {
        let package = name.as_str();
        let corrupted = self.paths.corrupted_path(repo_path);
        move_aside(repo_path, &corrupted)
            .map_err(|e| RegistryError::storage(package, Stage::Quarantine, e))?;
        visibility::hide(&self.paths, &corrupted)
            .map_err(|e| RegistryError::storage(package, Stage::Quarantine, e))?;
        warn!(package, to = %corrupted.display(), "quarantined repository");
        Ok(corrupted)
    }

    /// Open a visible repository for a read-only query.
    fn open_visible(&self, name: &PackageName) -> Result<Git, RegistryError> {
        if !self.probe(name)?.is_visible() {
            return Err(RegistryError::NotFound(name.to_string()));
        }
        Git::open(&self.paths.repo_path(name)).map_err(|e| match e {
            GitError::NotARepo { .. } => RegistryError::RepositoryCorrupted(name.to_string()),
            other => RegistryError::storage(name.as_str(), Stage::VersionCheck, other),
        })
    }

    /// Membership test over the tag namespace; order does not matter.
    fn has_version(
        &self,
        git: &Git,
        name: &PackageName,
        version: &Version,
    ) -> Result<bool, RegistryError> {
        Ok(self
            .tagged_versions(git, name)?
            .iter()
            .any(|tagged| same_release(tagged, version)))
    }

    fn tagged_versions(&self, git: &Git, name: &PackageName) -> Result<Vec<Version>, RegistryError> {
        let package = name.as_str();
        let tags = git
            .list_tags()
            .map_err(|e| RegistryError::storage(package, Stage::VersionCheck, e))?;
        tags.iter()
            .map(|tag| {
                parse_version(&tag.name)
                    .map_err(|e| RegistryError::storage(package, Stage::VersionCheck, e))
            })
            .collect()
    }
}

fn commit_message(tag: &TagName) -> String {
    format!("Update package to version {tag}")
}

fn tag_message(tag: &TagName) -> String {
    format!("Released {tag}")
}

/// Rename `from` to `to`, refusing to replace anything already at `to`.
fn move_aside(from: &Path, to: &Path) -> std::io::Result<()> {
    if to.symlink_metadata().is_ok() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            format!("{} already exists", to.display()),
        ));
    }
    std::fs::rename(from, to)
}
