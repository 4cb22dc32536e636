//! delete command - Soft-delete a package

use std::process::ExitCode;

use anyhow::Result;

use crate::cli::{report, Context};

/// Soft-delete `name` and print where its data now lives.
pub fn delete(ctx: &Context, name: &str) -> Result<ExitCode> {
    let moved_to = ctx.registry.delete_package(name).map_err(report)?;
    println!("Deleted '{}' (data kept at {})", name, moved_to.display());
    Ok(ExitCode::SUCCESS)
}
