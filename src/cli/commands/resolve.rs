//! resolve command - Ensure a package has a valid repository

use std::process::ExitCode;

use anyhow::Result;

use crate::cli::{report, Context};

/// Resolve (and if needed repair) the repository of `name`.
pub fn resolve(ctx: &Context, name: &str) -> Result<ExitCode> {
    let before = ctx.registry.repository_state(name).map_err(report)?;
    let path = ctx.registry.resolve_repository(name).map_err(report)?;
    let archived = ctx.registry.archived(name).map_err(report)?;

    println!("{}", path.display());
    println!("  was: {before}");
    if !archived.is_empty() {
        println!("  archived copies:");
        for repo in archived {
            println!("    {} ({})", repo.path.display(), repo.status);
        }
    }
    Ok(ExitCode::SUCCESS)
}
