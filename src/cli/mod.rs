//! cli
//!
//! Command-line interface layer for tagvault.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Load configuration and install logging
//! - Delegate to command handlers
//! - Does NOT touch repositories directly
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap and dispatches to
//! [`crate::registry::Registry`]. Registry failures are logged in full and
//! reported to the user with their public message only.

pub mod args;
pub mod commands;
pub mod logging;

pub use args::{Cli, Shell};

use std::process::ExitCode;

use anyhow::{Context as _, Result};

use crate::core::config::Config;
use crate::registry::{Registry, RegistryError};

/// Everything a command handler needs.
pub struct Context {
    pub registry: Registry,
}

impl Context {
    /// Build the context from global flags.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let mut config =
            Config::load(cli.config.as_deref()).context("failed to load configuration")?;
        if let Some(root) = &cli.root {
            config.set_root(root);
        }
        if let Some(path) = config.loaded_from() {
            tracing::debug!(config = %path.display(), "loaded configuration");
        }
        tracing::debug!(root = %config.root.display(), "storage root");

        Ok(Self {
            registry: Registry::new(config),
        })
    }
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<ExitCode> {
    let cli = Cli::parse_args();
    logging::init_global_subscriber(cli.verbose, cli.quiet);

    commands::dispatch(&cli)
}

/// Log a registry failure in full and turn it into a user-facing error.
pub(crate) fn report(err: RegistryError) -> anyhow::Error {
    if err.is_client_error() {
        tracing::debug!(error = %err, status = err.status_code(), "request rejected");
    } else {
        tracing::error!(error = %err, status = err.status_code(), "operation failed");
    }
    anyhow::anyhow!(err.public_message())
}
