//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--config <file>`: Use this configuration file
//! - `--root <dir>`: Override the storage root
//! - `--verbose` / `-v`: More logging (repeat for trace)
//! - `--quiet` / `-q`: Only warnings and errors

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// tagvault - package registry storage backed by per-package git repositories
#[derive(Parser, Debug)]
#[command(name = "tagvault")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (overrides the search path)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Storage root (overrides the configuration file)
    #[arg(long, global = true, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Increase logging verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Publish a new package version from a .tar.gz archive
    #[command(
        name = "publish",
        long_about = "Publish a new package version from a .tar.gz archive.\n\n\
            The archive holds the complete contents of the version; it replaces \
            whatever the previous version contained. The version is committed, \
            tagged as v<major>.<minor>.<patch>[-<prerelease>] and the package \
            repository becomes servable. Publishing a version that already \
            exists is rejected.",
        after_help = "\
EXAMPLES:
    # Publish from a file
    tagvault publish --meta foo.json foo-2.1.0.tar.gz

    # Publish from stdin
    tar -czf - -C build . | tagvault publish --meta foo.json -

META FILE:
    {
      \"type\": 0,
      \"name\": \"foo\",
      \"version\": \"2.1.0-beta\",
      \"owner\": { \"name\": \"Ann\", \"publicEmail\": \"ann@x.io\", \"username\": \"ann\" }
    }"
    )]
    Publish {
        /// JSON package descriptor
        #[arg(long, value_name = "META.json")]
        meta: PathBuf,

        /// Archive to publish, or `-` for stdin
        #[arg(value_name = "ARCHIVE")]
        archive: PathBuf,
    },

    /// Soft-delete a package
    #[command(
        name = "delete",
        long_about = "Soft-delete a package.\n\n\
            The repository is renamed to <name><ext>-<timestamp>.deleted and hidden. \
            No data is erased."
    )]
    Delete {
        /// Package name
        name: String,
    },

    /// Check whether a package exists (exit status 0 if it does)
    Exists {
        /// Package name
        name: String,
    },

    /// Check whether a version is published (exit status 0 if it is)
    #[command(name = "version-exists")]
    VersionExists {
        /// Package name
        name: String,
        /// Semantic version
        version: String,
    },

    /// List published versions of a package
    Versions {
        /// Package name
        name: String,
    },

    /// Ensure a valid repository exists, quarantining corrupted data
    Resolve {
        /// Package name
        name: String,
    },

    /// List quarantined and deleted repositories of a package
    Archived {
        /// Package name
        name: String,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        after_help = "\
EXAMPLES:
    # Bash (add to ~/.bashrc)
    tagvault completion bash >> ~/.bashrc

    # Zsh (add to ~/.zshrc)
    tagvault completion zsh >> ~/.zshrc

    # Fish
    tagvault completion fish > ~/.config/fish/completions/tagvault.fish"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
