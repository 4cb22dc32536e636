//! Read-only commands: exists, version-exists, versions, archived

use std::process::ExitCode;

use anyhow::Result;

use super::answer;
use crate::cli::{report, Context};
use crate::core::version::TagName;

/// Print whether a package is visible.
pub fn exists(ctx: &Context, name: &str) -> Result<ExitCode> {
    let found = ctx.registry.package_exists(name).map_err(report)?;
    Ok(answer(found))
}

/// Print whether a version of a package is published.
pub fn version_exists(ctx: &Context, name: &str, version: &str) -> Result<ExitCode> {
    let found = ctx
        .registry
        .version_exists(name, version)
        .map_err(report)?;
    Ok(answer(found))
}

/// Print every published version with its tag, oldest first.
pub fn versions(ctx: &Context, name: &str) -> Result<ExitCode> {
    let versions = ctx.registry.list_versions(name).map_err(report)?;
    if versions.is_empty() {
        println!("No versions published for '{name}'");
    }
    for version in versions {
        println!("{}\t{}", version, TagName::from_version(&version));
    }
    Ok(ExitCode::SUCCESS)
}

/// Print quarantined and deleted copies of a package.
pub fn archived(ctx: &Context, name: &str) -> Result<ExitCode> {
    for repo in ctx.registry.archived(name).map_err(report)? {
        println!("{}\t{}", repo.status, repo.path.display());
    }
    Ok(ExitCode::SUCCESS)
}
