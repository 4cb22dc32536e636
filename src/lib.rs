//! tagvault - package registry storage on per-package git repositories
//!
//! Every package lives in its own bare git repository. Each published
//! version is a complete snapshot committed on a single branch and marked
//! by an immutable annotated tag (`v<major>.<minor>.<patch>[-<prerelease>]`).
//! A repository is only servable while it carries an export marker.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to the registry)
//! - [`registry`] - Repository lifecycle: resolve, publish, query, delete
//! - [`archive`] - `.tar.gz` extraction into staging workspaces
//! - [`core`] - Domain types, version tags, paths, visibility, config, locking
//! - [`git`] - Single interface for all Git operations
//!
//! # Correctness Invariants
//!
//! tagvault maintains the following invariants:
//!
//! 1. A version tag, once published, is never rewritten
//! 2. Clients never observe a partially published version
//! 3. Corrupted or deleted repositories are moved aside, never erased
//! 4. Scratch workspaces never outlive the publish that created them

pub mod archive;
pub mod cli;
pub mod core;
pub mod git;
pub mod registry;
