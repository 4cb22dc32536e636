//! Integration tests for the registry lifecycle.
//!
//! Every test runs against a private storage root and inspects the
//! resulting repositories through the Git interface.

mod common;

use std::fs;
use std::sync::Arc;
use std::thread;

use common::{meta, system_identity, tar_gz_raw, TestRegistry};
use tagvault::core::paths::ArchiveStatus;
use tagvault::core::state::RepoState;
use tagvault::git::{Git, PushOutcome};
use tagvault::registry::{RegistryError, Stage};

// =============================================================================
// Resolution
// =============================================================================

mod resolve {
    use super::*;

    #[test]
    fn idempotent_on_fresh_repository() {
        let t = TestRegistry::new();
        let path = t.registry.resolve_repository("foo").unwrap();
        let head = fs::read_to_string(path.join("HEAD")).unwrap();

        let again = t.registry.resolve_repository("foo").unwrap();

        assert_eq!(path, again);
        assert_eq!(fs::read_to_string(again.join("HEAD")).unwrap(), head);
        assert_eq!(t.registry.repository_state("foo").unwrap(), RepoState::Hidden);
        assert!(t.registry.archived("foo").unwrap().is_empty());
    }

    #[test]
    fn new_repository_is_bare_and_hidden() {
        let t = TestRegistry::new();
        let path = t.registry.resolve_repository("foo").unwrap();

        let git = Git::open(&path).unwrap();
        assert!(git.is_bare());
        assert!(!git.has_refs().unwrap());
        assert!(!t.registry.package_exists("foo").unwrap());
    }

    #[test]
    fn quarantines_visible_garbage() {
        let t = TestRegistry::new();
        let path = t.registry.repo_path("foo").unwrap();
        fs::create_dir_all(&path).unwrap();
        fs::write(path.join("garbage"), "not a repository").unwrap();
        fs::write(path.join("git-daemon-export-ok"), "").unwrap();

        t.registry.resolve_repository("foo").unwrap();

        assert!(Git::open(&path).is_ok());
        let archived = t.registry.archived("foo").unwrap();
        assert_eq!(archived.len(), 1);
        assert_eq!(archived[0].status, ArchiveStatus::Corrupted);
        assert!(archived[0].path.join("garbage").exists());
        assert!(!archived[0].path.join("git-daemon-export-ok").exists());
    }

    #[test]
    fn quarantines_plain_file() {
        let t = TestRegistry::new();
        let path = t.registry.repo_path("foo").unwrap();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "junk").unwrap();

        t.registry.resolve_repository("foo").unwrap();

        assert!(path.is_dir());
        let archived = t.registry.archived("foo").unwrap();
        assert_eq!(archived.len(), 1);
        assert!(archived[0].path.is_file());
    }

    #[test]
    fn quarantines_interrupted_publish() {
        let t = TestRegistry::new();
        t.publish("foo", "1.0.0", &[("a.txt", "a")]).unwrap();
        let path = t.registry.repo_path("foo").unwrap();
        fs::remove_file(path.join("git-daemon-export-ok")).unwrap();

        t.registry.resolve_repository("foo").unwrap();

        assert!(!Git::open(&path).unwrap().has_refs().unwrap());
        assert_eq!(t.registry.archived("foo").unwrap().len(), 1);
    }
}

// =============================================================================
// Publishing
// =============================================================================

mod publish {
    use super::*;

    #[test]
    fn scenario_prerelease_by_ann() {
        let t = TestRegistry::new();
        let published = t
            .publish("foo", "2.1.0-beta", &[("a.txt", "alpha"), ("b.txt", "beta")])
            .unwrap();

        assert_eq!(published.tag.as_str(), "v2.1.0-beta");
        assert_eq!(published.entries, 2);
        assert_eq!(published.push, PushOutcome::Pushed);
        assert!(t.registry.package_exists("foo").unwrap());

        let git = Git::open(&t.registry.repo_path("foo").unwrap()).unwrap();
        let tag = git.tag_info("v2.1.0-beta").unwrap();
        assert_eq!(tag.target, published.commit);
        assert_eq!(tag.tagger_name, "Registry Bot");
        assert_eq!(tag.tagger_email, "bot@registry.test");
        assert_eq!(tag.message.trim(), "Released v2.1.0-beta");

        let commit = git.commit_info(&published.commit).unwrap();
        assert_eq!(commit.author_name, "Ann(ann)");
        assert_eq!(commit.author_email, "ann@x.io");
        assert_eq!(commit.committer_name, system_identity().name);
        assert_eq!(commit.committer_email, system_identity().email);
        assert_eq!(commit.message.trim(), "Update package to version v2.1.0-beta");

        let tag_oid = git.resolve_ref("refs/tags/v2.1.0-beta").unwrap();
        assert_eq!(git.tree_files(&tag_oid).unwrap(), vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn duplicate_version_rejected() {
        let t = TestRegistry::new();
        t.publish("foo", "1.0.0", &[("a.txt", "1")]).unwrap();

        let err = t.publish("foo", "1.0.0", &[("a.txt", "2")]).unwrap_err();
        assert!(matches!(err, RegistryError::VersionAlreadyExists { .. }));
        assert_eq!(err.status_code(), 409);

        t.publish("foo", "1.0.1", &[("a.txt", "3")]).unwrap();
        assert!(t.registry.version_exists("foo", "1.0.0").unwrap());
        assert!(t.registry.version_exists("foo", "1.0.1").unwrap());
        assert!(!t.registry.version_exists("foo", "1.0.2").unwrap());
    }

    #[test]
    fn equal_versions_collide() {
        let t = TestRegistry::new();
        t.publish("foo", "1.2.0", &[("a.txt", "1")]).unwrap();

        for same in ["v1.2.0", "1.2", "01.02.00", "1.2.0+build.7"] {
            let err = t.publish("foo", same, &[("a.txt", "2")]).unwrap_err();
            assert!(
                matches!(err, RegistryError::VersionAlreadyExists { .. }),
                "{same} should collide"
            );
        }
        assert!(t.publish("foo", "1.2.0-rc.1", &[("a.txt", "3")]).is_ok());
    }

    #[test]
    fn versions_are_full_snapshots() {
        let t = TestRegistry::new();
        let first = t
            .publish("foo", "1.0.0", &[("old.txt", "x"), ("keep.txt", "1")])
            .unwrap();
        let second = t.publish("foo", "1.1.0", &[("keep.txt", "2")]).unwrap();

        let git = Git::open(&t.registry.repo_path("foo").unwrap()).unwrap();
        assert_eq!(
            git.tree_files(&first.commit).unwrap(),
            vec!["keep.txt", "old.txt"]
        );
        assert_eq!(git.tree_files(&second.commit).unwrap(), vec!["keep.txt"]);
        assert_eq!(
            git.resolve_ref("refs/heads/master").unwrap(),
            second.commit
        );
    }

    #[test]
    fn nested_directories_published() {
        let t = TestRegistry::new();
        let published = t
            .publish("foo", "1.0.0", &[("src/lib.go", "package foo"), ("README", "hi")])
            .unwrap();

        let git = Git::open(&t.registry.repo_path("foo").unwrap()).unwrap();
        assert_eq!(
            git.tree_files(&published.commit).unwrap(),
            vec!["README", "src/lib.go"]
        );
    }

    #[test]
    fn list_versions_sorted() {
        let t = TestRegistry::new();
        for v in ["1.10.0", "1.2.0", "1.2.0-beta", "0.9.0"] {
            t.publish("foo", v, &[("a.txt", v)]).unwrap();
        }

        let versions: Vec<String> = t
            .registry
            .list_versions("foo")
            .unwrap()
            .iter()
            .map(|v| v.to_string())
            .collect();
        assert_eq!(versions, vec!["0.9.0", "1.2.0-beta", "1.2.0", "1.10.0"]);
    }

    #[test]
    fn self_heals_corrupted_repository() {
        let t = TestRegistry::new();
        let path = t.registry.repo_path("foo").unwrap();
        fs::create_dir_all(&path).unwrap();
        fs::write(path.join("HEAD"), "garbage").unwrap();
        fs::write(path.join("git-daemon-export-ok"), "").unwrap();

        t.publish("foo", "1.0.0", &[("a.txt", "a")]).unwrap();

        assert!(t.registry.package_exists("foo").unwrap());
        assert!(t.registry.version_exists("foo", "1.0.0").unwrap());

        let archived = t.registry.archived("foo").unwrap();
        assert_eq!(archived.len(), 1);
        assert_eq!(archived[0].status, ArchiveStatus::Corrupted);
        assert!(archived[0]
            .path
            .to_string_lossy()
            .ends_with(".corrupted"));
        assert!(!archived[0].path.join("git-daemon-export-ok").exists());
    }

    #[test]
    fn bad_archive_leaves_package_unpublished() {
        let t = TestRegistry::new();
        let err = t
            .registry
            .register_package(&meta("foo", "1.0.0"), &b"not an archive"[..])
            .unwrap_err();

        assert!(matches!(
            err,
            RegistryError::Storage {
                stage: Stage::Extract,
                ..
            }
        ));
        assert_eq!(err.public_message(), "internal server error");
        assert!(!t.registry.package_exists("foo").unwrap());

        // The failed attempt left a pristine repository that a retry reuses.
        t.publish("foo", "1.0.0", &[("a.txt", "a")]).unwrap();
        assert!(t.registry.archived("foo").unwrap().is_empty());
    }

    #[test]
    fn bad_archive_keeps_previous_version() {
        let t = TestRegistry::new();
        let first = t.publish("foo", "1.0.0", &[("a.txt", "a")]).unwrap();

        let result = t
            .registry
            .register_package(&meta("foo", "1.1.0"), &b"garbage"[..]);
        assert!(result.is_err());

        let git = Git::open(&t.registry.repo_path("foo").unwrap()).unwrap();
        assert_eq!(git.resolve_ref("refs/heads/master").unwrap(), first.commit);
        assert!(!t.registry.version_exists("foo", "1.1.0").unwrap());
        assert!(t.registry.package_exists("foo").unwrap());
    }

    #[test]
    fn symlinked_metadata_cannot_redirect_push() {
        let t = TestRegistry::new();
        let bar = t.publish("bar", "1.0.0", &[("a.txt", "a")]).unwrap();
        let bar_path = t.registry.repo_path("bar").unwrap();

        let config = format!(
            "[core]\n\trepositoryformatversion = 0\n\tbare = false\n\
             [remote \"origin\"]\n\turl = {}\n\tfetch = +refs/heads/*:refs/remotes/origin/*\n",
            bar_path.display()
        );
        let archive = tar_gz_raw(&[
            ("g", tar::EntryType::Symlink, ".git", ""),
            ("g/config", tar::EntryType::Regular, "", config.as_str()),
        ]);

        let err = t
            .registry
            .register_package(&meta("foo", "9.9.9"), archive.as_slice())
            .unwrap_err();
        assert!(matches!(err, RegistryError::UnsafeContent(_)));
        assert_eq!(err.status_code(), 400);

        let git = Git::open(&bar_path).unwrap();
        let tags: Vec<_> = git.list_tags().unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(tags, vec!["v1.0.0"]);
        assert_eq!(git.resolve_ref("refs/heads/master").unwrap(), bar.commit);
        assert!(!t.registry.package_exists("foo").unwrap());
    }

    #[test]
    fn nested_git_directory_is_client_error() {
        let t = TestRegistry::new();
        let err = t
            .publish(
                "foo",
                "1.0.0",
                &[("a.txt", "a"), ("sub/.git/HEAD", "ref"), ("sub/x.txt", "x")],
            )
            .unwrap_err();

        assert!(matches!(err, RegistryError::UnsafeContent(_)));
        assert!(err.is_client_error());
        assert!(!t.registry.package_exists("foo").unwrap());
    }

    #[test]
    fn invalid_input_touches_nothing() {
        let t = TestRegistry::new();

        let err = t.publish("../foo", "1.0.0", &[]).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidName { .. }));

        let err = t.publish("foo", "latest", &[]).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidVersion { .. }));

        assert!(!t.root().join("foo.git").exists());
    }

    #[test]
    fn staging_workspaces_cleaned_up() {
        let t = TestRegistry::new();
        let before = staging_dirs("tagvault-cleanup-");

        t.publish("cleanup", "1.0.0", &[("a.txt", "a")]).unwrap();
        let _ = t
            .registry
            .register_package(&meta("cleanup", "1.1.0"), &b"garbage"[..]);

        assert_eq!(staging_dirs("tagvault-cleanup-"), before);
    }

    fn staging_dirs(prefix: &str) -> usize {
        fs::read_dir(std::env::temp_dir())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().starts_with(prefix))
            .count()
    }
}

// =============================================================================
// Deletion
// =============================================================================

mod delete {
    use super::*;

    #[test]
    fn existence_lifecycle() {
        let t = TestRegistry::new();
        assert!(!t.registry.package_exists("foo").unwrap());

        t.publish("foo", "1.0.0", &[("a.txt", "a")]).unwrap();
        assert!(t.registry.package_exists("foo").unwrap());

        let deleted = t.registry.delete_package("foo").unwrap();
        assert!(!t.registry.package_exists("foo").unwrap());
        assert_eq!(t.registry.repository_state("foo").unwrap(), RepoState::Absent);

        assert!(deleted.is_dir());
        assert!(deleted.to_string_lossy().ends_with(".deleted"));
        assert!(!deleted.join("git-daemon-export-ok").exists());
        assert!(Git::open(&deleted).unwrap().has_refs().unwrap());

        let archived = t.registry.archived("foo").unwrap();
        assert_eq!(archived.len(), 1);
        assert_eq!(archived[0].status, ArchiveStatus::Deleted);
    }

    #[test]
    fn deleted_name_can_be_republished() {
        let t = TestRegistry::new();
        t.publish("foo", "1.0.0", &[("a.txt", "a")]).unwrap();
        t.registry.delete_package("foo").unwrap();

        t.publish("foo", "1.0.0", &[("a.txt", "again")]).unwrap();
        assert!(t.registry.package_exists("foo").unwrap());
        assert_eq!(t.registry.list_versions("foo").unwrap().len(), 1);
    }

    #[test]
    fn lock_file_outlives_delete() {
        let t = TestRegistry::new();
        t.publish("foo", "1.0.0", &[("a.txt", "a")]).unwrap();
        let lock = t.root().join(".locks/foo.lock");
        assert!(lock.is_file());

        t.registry.delete_package("foo").unwrap();
        assert!(lock.is_file());

        t.publish("foo", "1.0.0", &[("a.txt", "again")]).unwrap();
        assert!(t.registry.package_exists("foo").unwrap());
    }

    #[test]
    fn hidden_package_not_found() {
        let t = TestRegistry::new();
        t.registry.resolve_repository("foo").unwrap();

        let err = t.registry.delete_package("foo").unwrap_err();
        assert!(matches!(err, RegistryError::NotFound(_)));
        assert!(t.registry.repo_path("foo").unwrap().exists());
    }

    #[test]
    fn queries_after_delete_are_not_found() {
        let t = TestRegistry::new();
        t.publish("foo", "1.0.0", &[("a.txt", "a")]).unwrap();
        t.registry.delete_package("foo").unwrap();

        assert!(matches!(
            t.registry.version_exists("foo", "1.0.0"),
            Err(RegistryError::NotFound(_))
        ));
        assert!(matches!(
            t.registry.list_versions("foo"),
            Err(RegistryError::NotFound(_))
        ));
    }
}

// =============================================================================
// Concurrency
// =============================================================================

mod concurrency {
    use super::*;

    #[test]
    fn different_packages_do_not_interfere() {
        let t = Arc::new(TestRegistry::new());

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let t = Arc::clone(&t);
                thread::spawn(move || {
                    let name = format!("pkg{i}");
                    let body = format!("content {i}");
                    t.publish(&name, "1.0.0", &[("a.txt", body.as_str())])
                        .map(|p| (name, p))
                })
            })
            .collect();

        for handle in handles {
            let (name, published) = handle.join().unwrap().unwrap();
            assert!(t.registry.package_exists(&name).unwrap());
            let git = Git::open(&t.registry.repo_path(&name).unwrap()).unwrap();
            assert_eq!(git.tree_files(&published.commit).unwrap(), vec!["a.txt"]);
        }
    }

    #[test]
    fn same_version_published_once() {
        let t = Arc::new(TestRegistry::new());

        let handles: Vec<_> = (0..2)
            .map(|i| {
                let t = Arc::clone(&t);
                thread::spawn(move || {
                    let body = format!("attempt {i}");
                    t.publish("foo", "1.0.0", &[("a.txt", body.as_str())])
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let ok = results.iter().filter(|r| r.is_ok()).count();
        let dup = results
            .iter()
            .filter(|r| matches!(r, Err(RegistryError::VersionAlreadyExists { .. })))
            .count();

        assert_eq!((ok, dup), (1, 1));
        assert_eq!(t.registry.list_versions("foo").unwrap().len(), 1);
    }

    #[test]
    fn different_versions_of_same_package_serialize() {
        let t = Arc::new(TestRegistry::new());

        let handles: Vec<_> = ["1.0.0", "2.0.0", "3.0.0"]
            .into_iter()
            .map(|v| {
                let t = Arc::clone(&t);
                thread::spawn(move || t.publish("foo", v, &[("v.txt", v)]))
            })
            .collect();

        for handle in handles {
            handle.join().unwrap().unwrap();
        }
        assert_eq!(t.registry.list_versions("foo").unwrap().len(), 3);
    }
}
