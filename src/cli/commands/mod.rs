//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Reads command-specific input (files, stdin)
//! 2. Calls the registry
//! 3. Formats and displays output on stdout
//!
//! Handlers return an [`ExitCode`] so predicates like `exists` can answer
//! through the exit status.

mod completion;
mod delete;
mod publish;
mod query;
mod resolve;

pub use completion::completion;
pub use delete::delete;
pub use publish::publish;
pub use query::{archived, exists, version_exists, versions};
pub use resolve::resolve;

use std::process::ExitCode;

use anyhow::Result;

use crate::cli::args::{Cli, Command};
use crate::cli::Context;

/// Dispatch a command to its handler.
pub fn dispatch(cli: &Cli) -> Result<ExitCode> {
    if let Command::Completion { shell } = &cli.command {
        completion::completion(*shell)?;
        return Ok(ExitCode::SUCCESS);
    }

    let ctx = Context::from_cli(cli)?;
    match &cli.command {
        Command::Publish { meta, archive } => publish::publish(&ctx, meta, archive),
        Command::Delete { name } => delete::delete(&ctx, name),
        Command::Exists { name } => query::exists(&ctx, name),
        Command::VersionExists { name, version } => query::version_exists(&ctx, name, version),
        Command::Versions { name } => query::versions(&ctx, name),
        Command::Resolve { name } => resolve::resolve(&ctx, name),
        Command::Archived { name } => query::archived(&ctx, name),
        Command::Completion { .. } => Ok(ExitCode::SUCCESS),
    }
}

/// Exit status for a yes/no question.
fn answer(yes: bool) -> ExitCode {
    println!("{yes}");
    if yes {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
