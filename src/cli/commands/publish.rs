//! publish command - Publish a package version from an archive

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context as _, Result};

use crate::cli::{report, Context};
use crate::core::types::PackageMeta;
use crate::git::PushOutcome;

/// Publish the archive at `archive` (or stdin for `-`) described by `meta`.
pub fn publish(ctx: &Context, meta: &Path, archive: &Path) -> Result<ExitCode> {
    let raw = fs::read_to_string(meta)
        .with_context(|| format!("failed to read meta file '{}'", meta.display()))?;
    let meta: PackageMeta = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse meta file '{}'", meta.display()))?;

    let content: Box<dyn Read> = if archive == Path::new("-") {
        Box::new(io::stdin().lock())
    } else {
        Box::new(
            File::open(archive)
                .with_context(|| format!("failed to open archive '{}'", archive.display()))?,
        )
    };

    let published = ctx
        .registry
        .register_package(&meta, content)
        .map_err(report)?;

    println!(
        "Published {} {} ({} entries, commit {})",
        published.name,
        published.tag,
        published.entries,
        published.commit.short(7)
    );
    if published.push == PushOutcome::UpToDate {
        println!("  canonical repository was already up to date");
    }
    Ok(ExitCode::SUCCESS)
}
