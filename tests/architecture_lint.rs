//! Architecture enforcement tests.
//!
//! The layering described in `src/lib.rs` is only worth something if it
//! holds. These tests scan the source tree so violations are caught in CI.
//!
//! # Test Categories
//!
//! 1. **Git Doorway** - Only `src/git/` may use `git2`
//! 2. **Error Layering** - Only `src/cli/` may use `anyhow`
//! 3. **Thin CLI** - Command handlers go through the registry, never Git
//! 4. **Archive Isolation** - Only `src/archive.rs` decodes archives

use std::fs;
use std::path::{Path, PathBuf};

/// Collect every `.rs` file under `dir`.
fn rust_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(&dir).expect("Failed to read source directory") {
            let path = entry.expect("Failed to read entry").path();
            if path.is_dir() {
                pending.push(path);
            } else if path.extension().is_some_and(|e| e == "rs") {
                files.push(path);
            }
        }
    }
    files.sort();
    files
}

/// Files outside `allowed` whose contents contain any of `patterns`.
fn violations(allowed: &[&str], patterns: &[&str]) -> Vec<String> {
    rust_files(Path::new("src"))
        .into_iter()
        .filter(|path| {
            let shown = path.to_string_lossy().replace('\\', "/");
            !allowed.iter().any(|prefix| shown.starts_with(prefix))
        })
        .filter_map(|path| {
            let content = fs::read_to_string(&path).expect("Failed to read source file");
            patterns
                .iter()
                .find(|p| content.contains(*p))
                .map(|p| format!("{}: contains `{}`", path.display(), p))
        })
        .collect()
}

#[test]
fn only_git_module_uses_git2() {
    let found = violations(&["src/git/"], &["git2::", "use git2"]);
    assert!(
        found.is_empty(),
        "git2 used outside the Git interface:\n  {}",
        found.join("\n  ")
    );
}

#[test]
fn only_cli_uses_anyhow() {
    let found = violations(&["src/cli/", "src/main.rs"], &["anyhow::", "use anyhow"]);
    assert!(
        found.is_empty(),
        "anyhow used below the CLI layer:\n  {}",
        found.join("\n  ")
    );
}

#[test]
fn commands_do_not_touch_git() {
    let found = rust_files(Path::new("src/cli/commands"))
        .into_iter()
        .filter_map(|path| {
            let content = fs::read_to_string(&path).expect("Failed to read source file");
            content
                .contains("Git::")
                .then(|| format!("{}: calls Git directly", path.display()))
        })
        .collect::<Vec<_>>();
    assert!(
        found.is_empty(),
        "Command handlers must go through the registry:\n  {}",
        found.join("\n  ")
    );
}

#[test]
fn only_archive_module_decodes_archives() {
    let found = violations(&["src/archive.rs"], &["flate2::", "tar::"]);
    assert!(
        found.is_empty(),
        "Archive decoding outside src/archive.rs:\n  {}",
        found.join("\n  ")
    );
}
