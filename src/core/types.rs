//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`PackageName`] - Validated package identifier, safe to use as a path component
//! - [`Oid`] - Git object identifier
//! - [`PackageType`] - Public or private visibility tier requested by the publisher
//! - [`PackageOwner`] - Owner identity used for commit authorship
//! - [`PackageMeta`] - Descriptor supplied alongside a publish request
//! - [`Identity`] - Fixed system identity for auto-generated commits and tags
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, preventing entire classes of bugs.
//!
//! # Examples
//!
//! ```
//! use tagvault::core::types::PackageName;
//!
//! let name = PackageName::new("left-pad").unwrap();
//! assert_eq!(name.as_str(), "left-pad");
//!
//! // Path traversal attempts fail at creation time
//! assert!(PackageName::new("../etc").is_err());
//! assert!(PackageName::new("a/b").is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid package name: {0}")]
    InvalidPackageName(String),

    #[error("invalid identity: {0}")]
    InvalidIdentity(String),

    #[error("invalid object id: {0}")]
    InvalidOid(String),

    #[error("unknown package type: {0}")]
    UnknownPackageType(String),
}

/// A validated package name.
///
/// Package names become a single path component under the storage root,
/// so anything that could escape that directory is rejected:
/// - Cannot be empty
/// - Cannot be `.` or `..`, or start with `.` or `-`
/// - Cannot contain `/`, `\`, `:` or ASCII control characters
///
/// # Example
///
/// ```
/// use tagvault::core::types::PackageName;
///
/// assert!(PackageName::new("foo").is_ok());
/// assert!(PackageName::new("foo.bar_baz-1").is_ok());
///
/// assert!(PackageName::new("").is_err());
/// assert!(PackageName::new("..").is_err());
/// assert!(PackageName::new(".hidden").is_err());
/// assert!(PackageName::new("a\\b").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PackageName(String);

impl PackageName {
    /// Create a new validated package name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidPackageName` if the name could not be used
    /// safely as a single path component.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    fn validate(name: &str) -> Result<(), TypeError> {
        if name.is_empty() {
            return Err(TypeError::InvalidPackageName(
                "package name cannot be empty".into(),
            ));
        }

        if name == "." || name == ".." {
            return Err(TypeError::InvalidPackageName(format!(
                "package name cannot be '{name}'"
            )));
        }

        if name.starts_with('.') {
            return Err(TypeError::InvalidPackageName(
                "package name cannot start with '.'".into(),
            ));
        }
        if name.starts_with('-') {
            return Err(TypeError::InvalidPackageName(
                "package name cannot start with '-'".into(),
            ));
        }

        const SEPARATORS: [char; 3] = ['/', '\\', ':'];
        for c in SEPARATORS {
            if name.contains(c) {
                return Err(TypeError::InvalidPackageName(format!(
                    "package name cannot contain '{c}'"
                )));
            }
        }

        if name.chars().any(|c| c.is_ascii_control()) {
            return Err(TypeError::InvalidPackageName(
                "package name cannot contain control characters".into(),
            ));
        }

        Ok(())
    }

    /// Get the package name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PackageName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<PackageName> for String {
    fn from(name: PackageName) -> Self {
        name.0
    }
}

impl AsRef<str> for PackageName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PackageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A git object identifier, normalized to lowercase hex.
///
/// # Example
///
/// ```
/// use tagvault::core::types::Oid;
///
/// let oid = Oid::new("ABC123DEF4567890ABC123DEF4567890ABC12345").unwrap();
/// assert_eq!(oid.as_str(), "abc123def4567890abc123def4567890abc12345");
/// assert_eq!(oid.short(7), "abc123d");
/// assert!(Oid::new("not-a-sha").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Oid(String);

impl Oid {
    /// Create a new validated object id (40 or 64 hex characters).
    pub fn new(oid: impl Into<String>) -> Result<Self, TypeError> {
        let oid = oid.into().to_ascii_lowercase();
        if !matches!(oid.len(), 40 | 64) || !oid.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidOid(oid));
        }
        Ok(Self(oid))
    }

    /// Get the full hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get an abbreviated form.
    pub fn short(&self, len: usize) -> &str {
        &self.0[..len.min(self.0.len())]
    }
}

impl TryFrom<String> for Oid {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Oid> for String {
    fn from(oid: Oid) -> Self {
        oid.0
    }
}

impl std::fmt::Display for Oid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Visibility tier requested for a package.
///
/// On the wire this is either the integer code (`0` public, `1` private)
/// or its lowercase name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "PackageTypeRepr", into = "u8")]
pub enum PackageType {
    #[default]
    Public,
    Private,
}

impl PackageType {
    /// Get the lowercase name of the tier.
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageType::Public => "public",
            PackageType::Private => "private",
        }
    }
}

impl std::fmt::Display for PackageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<PackageType> for u8 {
    fn from(t: PackageType) -> Self {
        match t {
            PackageType::Public => 0,
            PackageType::Private => 1,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PackageTypeRepr {
    Code(u8),
    Name(String),
}

impl TryFrom<PackageTypeRepr> for PackageType {
    type Error = TypeError;

    fn try_from(repr: PackageTypeRepr) -> Result<Self, Self::Error> {
        match repr {
            PackageTypeRepr::Code(0) => Ok(PackageType::Public),
            PackageTypeRepr::Code(1) => Ok(PackageType::Private),
            PackageTypeRepr::Code(n) => Err(TypeError::UnknownPackageType(n.to_string())),
            PackageTypeRepr::Name(s) => match s.as_str() {
                "public" => Ok(PackageType::Public),
                "private" => Ok(PackageType::Private),
                _ => Err(TypeError::UnknownPackageType(s)),
            },
        }
    }
}

/// A name/email pair used as a git signature.
///
/// # Example
///
/// ```
/// use tagvault::core::types::Identity;
///
/// let id = Identity::new("tagvault", "tagvault@localhost").unwrap();
/// assert_eq!(id.to_string(), "tagvault <tagvault@localhost>");
///
/// assert!(Identity::new("", "a@b").is_err());
/// assert!(Identity::new("<evil>", "a@b").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

impl Identity {
    /// Create a validated identity.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidIdentity` if either part is blank or
    /// contains angle brackets (git cannot record such a signature).
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Result<Self, TypeError> {
        let identity = Self {
            name: name.into(),
            email: email.into(),
        };
        identity.validate()?;
        Ok(identity)
    }

    /// Check that this identity can be written as a git signature.
    pub fn validate(&self) -> Result<(), TypeError> {
        for (field, value) in [("name", &self.name), ("email", &self.email)] {
            if value.trim().is_empty() {
                return Err(TypeError::InvalidIdentity(format!(
                    "{field} cannot be empty"
                )));
            }
            if value.contains('<') || value.contains('>') {
                return Err(TypeError::InvalidIdentity(format!(
                    "{field} cannot contain angle brackets"
                )));
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

/// The account that owns a package.
///
/// Only used to attribute the commit of each published version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageOwner {
    pub name: String,
    pub public_email: String,
    pub username: String,
}

impl PackageOwner {
    /// The commit author for versions published by this owner.
    ///
    /// The display name is `Name(username)`.
    ///
    /// # Example
    ///
    /// ```
    /// use tagvault::core::types::PackageOwner;
    ///
    /// let owner = PackageOwner {
    ///     name: "Ann".into(),
    ///     public_email: "ann@x.io".into(),
    ///     username: "ann".into(),
    /// };
    /// let author = owner.author().unwrap();
    /// assert_eq!(author.to_string(), "Ann(ann) <ann@x.io>");
    /// ```
    pub fn author(&self) -> Result<Identity, TypeError> {
        Identity::new(
            format!("{}({})", self.name, self.username),
            self.public_email.clone(),
        )
    }
}

/// Descriptor of a package version being published.
///
/// Deserializes from the JSON `meta` document the transport receives:
///
/// ```json
/// {
///   "type": 0,
///   "name": "foo",
///   "version": "2.1.0-beta",
///   "owner": { "name": "Ann", "publicEmail": "ann@x.io", "username": "ann" }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageMeta {
    #[serde(rename = "type", default)]
    pub package_type: PackageType,
    pub name: String,
    pub version: String,
    pub owner: PackageOwner,
}
