//! registry::error
//!
//! Boundary error type for registry operations.
//!
//! Every failure a caller can observe is a [`RegistryError`]. Domain
//! failures (malformed input, missing package, duplicate version) carry
//! specific messages. Storage failures carry the package and the [`Stage`]
//! that failed, for logs, but present a generic message to clients.

use std::time::Duration;

use thiserror::Error;

use crate::core::version::VersionError;

/// Boxed underlying cause of a storage failure.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The step of a registry operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Resolve,
    Quarantine,
    Init,
    VersionCheck,
    Lock,
    Workspace,
    Extract,
    Commit,
    Tag,
    Push,
    Export,
    Delete,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Resolve => "resolve",
            Stage::Quarantine => "quarantine",
            Stage::Init => "init",
            Stage::VersionCheck => "version-check",
            Stage::Lock => "lock",
            Stage::Workspace => "workspace",
            Stage::Extract => "extract",
            Stage::Commit => "commit",
            Stage::Tag => "tag",
            Stage::Push => "push",
            Stage::Export => "export",
            Stage::Delete => "delete",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The requested version is not a semantic version.
    #[error("invalid version '{version}': {reason}")]
    InvalidVersion { version: String, reason: String },

    /// The package name cannot be used as a repository name.
    #[error("invalid package name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    /// The package descriptor is unusable (owner identity, for example).
    #[error("invalid package meta: {0}")]
    InvalidMeta(String),

    /// The package archive holds an entry that may not be extracted.
    #[error("unsafe package content: {0}")]
    UnsafeContent(String),

    /// The version is already tagged in the package repository.
    #[error("package version already exists: {version} [{package}]")]
    VersionAlreadyExists { package: String, version: String },

    /// The operation is not supported (private packages).
    #[error("{0} is not supported")]
    NotSupported(String),

    /// No visible package with this name.
    #[error("package not found: {0}")]
    NotFound(String),

    /// A visible repository is structurally invalid.
    ///
    /// Publishing repairs this by quarantine; read-only queries report it.
    #[error("package repository is corrupted: {0}")]
    RepositoryCorrupted(String),

    /// Another operation held the package lock for the whole timeout.
    #[error("package '{package}' is busy (waited {timeout:?})")]
    Busy { package: String, timeout: Duration },

    /// Filesystem or VCS failure.
    #[error("storage failure at {stage} [{package}]: {source}")]
    Storage {
        package: String,
        stage: Stage,
        #[source]
        source: BoxError,
    },
}

impl RegistryError {
    /// Build a storage error for `package` at `stage`.
    pub fn storage(
        package: impl Into<String>,
        stage: Stage,
        source: impl Into<BoxError>,
    ) -> Self {
        RegistryError::Storage {
            package: package.into(),
            stage,
            source: source.into(),
        }
    }

    /// The HTTP status a transport should answer with.
    ///
    /// # Example
    ///
    /// ```
    /// use tagvault::registry::RegistryError;
    ///
    /// assert_eq!(RegistryError::NotFound("foo".into()).status_code(), 404);
    /// assert_eq!(RegistryError::NotSupported("private packages".into()).status_code(), 501);
    /// ```
    pub fn status_code(&self) -> u16 {
        match self {
            RegistryError::InvalidVersion { .. }
            | RegistryError::InvalidName { .. }
            | RegistryError::InvalidMeta(_)
            | RegistryError::UnsafeContent(_) => 400,
            RegistryError::NotFound(_) => 404,
            RegistryError::VersionAlreadyExists { .. } => 409,
            RegistryError::NotSupported(_) => 501,
            RegistryError::Busy { .. } => 503,
            RegistryError::RepositoryCorrupted(_) | RegistryError::Storage { .. } => 500,
        }
    }

    /// Whether the caller, rather than the server, is at fault.
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }

    /// Message safe to show to clients.
    ///
    /// Internal failures collapse to a generic message; nothing about
    /// storage paths or engine errors leaks.
    pub fn public_message(&self) -> String {
        match self {
            RegistryError::RepositoryCorrupted(_) | RegistryError::Storage { .. } => {
                "internal server error".to_string()
            }
            RegistryError::Busy { package, .. } => {
                format!("package '{package}' is busy, try again later")
            }
            other => other.to_string(),
        }
    }
}

impl From<VersionError> for RegistryError {
    fn from(err: VersionError) -> Self {
        match err {
            VersionError::Invalid { version, reason } => {
                RegistryError::InvalidVersion { version, reason }
            }
        }
    }
}
