//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;
use tempfile::TempDir;

use tagvault::core::config::Config;
use tagvault::core::types::{Identity, PackageMeta, PackageOwner, PackageType};
use tagvault::registry::Registry;

/// Build an in-memory `.tar.gz` archive from `(path, contents)` pairs.
pub fn tar_gz(files: &[(&str, &str)]) -> Vec<u8> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    for (path, contents) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, path, contents.as_bytes())
            .expect("append entry");
    }
    builder
        .into_inner()
        .expect("finish tar")
        .finish()
        .expect("finish gzip")
}

/// Build an archive from raw `(path, kind, link target, contents)` headers.
///
/// The builder's own path validation is bypassed, so hostile entries can be
/// expressed.
pub fn tar_gz_raw(entries: &[(&str, tar::EntryType, &str, &str)]) -> Vec<u8> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    for (path, kind, link, contents) in entries {
        let mut header = tar::Header::new_old();
        header.as_old_mut().name[..path.len()].copy_from_slice(path.as_bytes());
        header.as_old_mut().linkname[..link.len()].copy_from_slice(link.as_bytes());
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        header.set_entry_type(*kind);
        header.set_cksum();
        builder
            .append(&header, contents.as_bytes())
            .expect("append entry");
    }
    builder
        .into_inner()
        .expect("finish tar")
        .finish()
        .expect("finish gzip")
}

/// Write an archive to `path`.
pub fn write_tar_gz(path: &Path, files: &[(&str, &str)]) {
    std::fs::write(path, tar_gz(files)).expect("write archive");
}

/// A public package descriptor owned by Ann.
pub fn meta(name: &str, version: &str) -> PackageMeta {
    PackageMeta {
        package_type: PackageType::Public,
        name: name.to_string(),
        version: version.to_string(),
        owner: PackageOwner {
            name: "Ann".to_string(),
            public_email: "ann@x.io".to_string(),
            username: "ann".to_string(),
        },
    }
}

/// Meta JSON as the transport sends it.
pub fn meta_json(name: &str, version: &str) -> String {
    format!(
        r#"{{"type":0,"name":"{name}","version":"{version}","owner":{{"name":"Ann","publicEmail":"ann@x.io","username":"ann"}}}}"#
    )
}

/// The fixed identity test registries commit and tag with.
pub fn system_identity() -> Identity {
    Identity::new("Registry Bot", "bot@registry.test").expect("valid identity")
}

/// A registry rooted in a fresh temp directory.
pub struct TestRegistry {
    pub dir: TempDir,
    pub registry: Registry,
}

impl TestRegistry {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let mut config = Config::with_root(dir.path().join("repos"));
        config.committer = system_identity();
        config.tagger = system_identity();
        Self {
            registry: Registry::new(config),
            dir,
        }
    }

    pub fn root(&self) -> &Path {
        self.registry.paths().root()
    }

    /// Publish `files` as `version` of `name`.
    pub fn publish(
        &self,
        name: &str,
        version: &str,
        files: &[(&str, &str)],
    ) -> Result<tagvault::registry::Published, tagvault::registry::RegistryError> {
        self.registry
            .register_package(&meta(name, version), tar_gz(files).as_slice())
    }
}
