//! core::version
//!
//! Conversion between semantic versions and version tag names.
//!
//! # Tag Format
//!
//! Every published version is marked by exactly one tag named
//! `v<major>.<minor>.<patch>` with `-<prerelease>` appended when a
//! prerelease label is present. Build metadata never appears in a tag.
//!
//! # Parsing
//!
//! Version strings are parsed leniently, matching what publishers send in
//! practice:
//! - an optional leading `v`/`V`
//! - missing minor/patch components default to `0` (`1.2` is `1.2.0`)
//! - numeric components may carry leading zeros (`01.02.03` is `1.2.3`)
//!
//! Prerelease and build identifiers follow semver grammar.
//!
//! # Example
//!
//! ```
//! use tagvault::core::version::{tag_name_from_version, versions_equal};
//!
//! assert_eq!(tag_name_from_version("2.1.0-beta+build.7").unwrap().as_str(), "v2.1.0-beta");
//! assert!(versions_equal("1.0.0+a", "v01.0.0").unwrap());
//! ```

use semver::{BuildMetadata, Prerelease, Version};
use thiserror::Error;

/// Errors from version parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VersionError {
    #[error("invalid semantic version '{version}': {reason}")]
    Invalid { version: String, reason: String },
}

impl VersionError {
    fn invalid(version: &str, reason: impl Into<String>) -> Self {
        VersionError::Invalid {
            version: version.to_string(),
            reason: reason.into(),
        }
    }
}

/// Name of the tag marking one published version, e.g. `v1.4.0-rc.1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TagName(String);

impl TagName {
    /// Derive the tag name for an already parsed version.
    pub fn from_version(version: &Version) -> Self {
        let mut name = format!("v{}.{}.{}", version.major, version.minor, version.patch);
        if !version.pre.is_empty() {
            name.push('-');
            name.push_str(version.pre.as_str());
        }
        Self(name)
    }

    /// Get the tag name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Full ref name of the tag (`refs/tags/<name>`).
    pub fn refname(&self) -> String {
        format!("refs/tags/{}", self.0)
    }

    /// Parse the tag name back into the version it marks.
    pub fn version(&self) -> Result<Version, VersionError> {
        parse_version(&self.0)
    }
}

impl std::fmt::Display for TagName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parse a version string into a [`Version`].
///
/// # Errors
///
/// Returns `VersionError::Invalid` if the string does not follow
/// semantic-versioning grammar (see module docs for the accepted leniency).
///
/// # Example
///
/// ```
/// use tagvault::core::version::parse_version;
///
/// let v = parse_version("v1.2").unwrap();
/// assert_eq!((v.major, v.minor, v.patch), (1, 2, 0));
///
/// assert!(parse_version("1.x").is_err());
/// assert!(parse_version("").is_err());
/// ```
pub fn parse_version(input: &str) -> Result<Version, VersionError> {
    let raw = input.trim();
    let raw = raw
        .strip_prefix('v')
        .or_else(|| raw.strip_prefix('V'))
        .unwrap_or(raw);

    if raw.is_empty() {
        return Err(VersionError::invalid(input, "empty version"));
    }

    let (rest, build) = match raw.split_once('+') {
        Some((rest, build)) => (rest, Some(build)),
        None => (raw, None),
    };
    let (core, pre) = match rest.split_once('-') {
        Some((core, pre)) => (core, Some(pre)),
        None => (rest, None),
    };

    let parts: Vec<&str> = core.split('.').collect();
    if parts.len() > 3 {
        return Err(VersionError::invalid(input, "too many version components"));
    }

    let mut numbers = [0u64; 3];
    for (slot, part) in numbers.iter_mut().zip(&parts) {
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(VersionError::invalid(
                input,
                format!("'{part}' is not a numeric version component"),
            ));
        }
        *slot = part
            .parse()
            .map_err(|_| VersionError::invalid(input, format!("'{part}' is out of range")))?;
    }

    let mut version = Version::new(numbers[0], numbers[1], numbers[2]);

    if let Some(pre) = pre {
        version.pre = Prerelease::new(pre)
            .map_err(|e| VersionError::invalid(input, format!("prerelease: {e}")))?;
        if version.pre.is_empty() {
            return Err(VersionError::invalid(input, "empty prerelease"));
        }
    }
    if let Some(build) = build {
        version.build = BuildMetadata::new(build)
            .map_err(|e| VersionError::invalid(input, format!("build metadata: {e}")))?;
        if version.build.is_empty() {
            return Err(VersionError::invalid(input, "empty build metadata"));
        }
    }

    Ok(version)
}

/// Derive the tag name for a version string.
///
/// # Errors
///
/// Returns `VersionError::Invalid` if `version` is not a semantic version.
pub fn tag_name_from_version(version: &str) -> Result<TagName, VersionError> {
    parse_version(version).map(|v| TagName::from_version(&v))
}

/// Compare two parsed versions, ignoring build metadata.
pub fn same_release(a: &Version, b: &Version) -> bool {
    a.major == b.major && a.minor == b.minor && a.patch == b.patch && a.pre == b.pre
}

/// Check whether two version strings name the same release.
///
/// Major, minor, patch and prerelease must match; build metadata and
/// formatting differences are ignored.
///
/// # Errors
///
/// Returns `VersionError::Invalid` if either string fails to parse.
pub fn versions_equal(a: &str, b: &str) -> Result<bool, VersionError> {
    Ok(same_release(&parse_version(a)?, &parse_version(b)?))
}
