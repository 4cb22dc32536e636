//! core
//!
//! Core domain types and storage rules for tagvault.
//!
//! # Modules
//!
//! - [`types`] - Strong types: PackageName, PackageMeta, Identity, Oid
//! - [`version`] - Version parsing and the version tag codec
//! - [`paths`] - Centralized path routing for repository storage
//! - [`visibility`] - Export marker handling
//! - [`state`] - Repository state probe
//! - [`config`] - Configuration schema and loading
//! - [`lock`] - Per-package locking
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - The filesystem is the source of truth for repository state
//! - All path derivation is deterministic

pub mod config;
pub mod lock;
pub mod paths;
pub mod state;
pub mod types;
pub mod version;
pub mod visibility;
