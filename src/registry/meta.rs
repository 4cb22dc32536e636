//! registry::meta
//!
//! Validation of publish descriptors before any storage is touched.

use semver::Version;

use super::RegistryError;
use crate::core::types::{Identity, PackageMeta, PackageName};
use crate::core::version::{parse_version, TagName};

/// A [`PackageMeta`] whose fields have all been checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedMeta {
    pub name: PackageName,
    pub version: Version,
    pub tag: TagName,
    pub author: Identity,
}

impl PackageMeta {
    /// Check the name, version and owner of this descriptor.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::InvalidName`] for a name unusable as a repository name
    /// - [`RegistryError::InvalidVersion`] for a malformed version
    /// - [`RegistryError::InvalidMeta`] if the owner cannot sign a commit
    ///
    /// # Example
    ///
    /// ```
    /// use tagvault::core::types::{PackageMeta, PackageOwner, PackageType};
    ///
    /// let meta = PackageMeta {
    ///     package_type: PackageType::Public,
    ///     name: "foo".into(),
    ///     version: "2.1.0-beta".into(),
    ///     owner: PackageOwner {
    ///         name: "Ann".into(),
    ///         public_email: "ann@x.io".into(),
    ///         username: "ann".into(),
    ///     },
    /// };
    /// let valid = meta.validate().unwrap();
    /// assert_eq!(valid.tag.as_str(), "v2.1.0-beta");
    /// ```
    pub fn validate(&self) -> Result<ValidatedMeta, RegistryError> {
        let name = parse_name(&self.name)?;
        let version = parse_version(&self.version)?;
        let tag = TagName::from_version(&version);

        if self.owner.username.trim().is_empty() {
            return Err(RegistryError::InvalidMeta(
                "owner username cannot be empty".to_string(),
            ));
        }
        let author = self
            .owner
            .author()
            .map_err(|e| RegistryError::InvalidMeta(format!("owner: {e}")))?;

        Ok(ValidatedMeta {
            name,
            version,
            tag,
            author,
        })
    }
}

/// Validate a raw package name.
pub(crate) fn parse_name(name: &str) -> Result<PackageName, RegistryError> {
    PackageName::new(name).map_err(|e| RegistryError::InvalidName {
        name: name.to_string(),
        reason: e.to_string(),
    })
}
