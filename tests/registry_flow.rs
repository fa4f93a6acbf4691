//! End-to-end command flows against a real git repository.

mod common;

use std::path::Path;

use common::{
    FakeRemote, canonical, commit_count, git, head, head_subject, head_tree, read_json, setup_repo,
    status,
};
use registry::commands::Registry;
use registry::commands::add::AddRequest;
use registry::commands::list::list_ports;
use registry::commands::update::UpdateOutcome;
use registry::commands::update_versions::UpdateVersionsOutcome;
use registry::config::RegistryConfig;
use registry::error::RegistryError;
use registry::layout::RegistryLayout;
use registry::model::PortName;
use registry_git::{ExecutionMode, GixRepo};

const SHA_1: &str = "abc1234def5678900000000000000000000000000";
const SHA_2: &str = "bbbbbbb111111111111111111111111111111111";

fn add_request(port: &str) -> AddRequest {
    AddRequest {
        port: PortName::new(port).unwrap(),
        repo: format!("octo/{port}").parse().unwrap(),
        latest: false,
        reference: None,
        dependencies: vec!["zlib".to_owned()],
        options: vec!["BUILD_TESTING=OFF".parse().unwrap()],
    }
}

fn port(name: &str) -> PortName {
    PortName::new(name).unwrap()
}

/// Run `f` with a live registry rooted at `root`.
fn with_registry<T>(
    root: &Path,
    mode: ExecutionMode,
    remote: &FakeRemote,
    f: impl FnOnce(&Registry<'_>) -> T,
) -> T {
    let config = RegistryConfig::default();
    let git = GixRepo::open(root, mode).unwrap();
    let registry = Registry::new(RegistryLayout::new(root), &config, &git, remote);
    f(&registry)
}

// ===========================================================================
// add / list
// ===========================================================================

#[test]
fn add_commits_port_and_records_its_tree() {
    let dir = setup_repo();
    let root = canonical(dir.path());
    let remote = FakeRemote::new(SHA_1, "2024-01-01T10:00:00Z");

    let outcome = with_registry(&root, ExecutionMode::Live, &remote, |r| {
        r.add(&add_request("foo-bar")).unwrap()
    });

    assert_eq!(outcome.version, "2024-01-01-abc1234");
    assert_eq!(commit_count(&root), 1);
    assert_eq!(head_subject(&root), "Add new port foo-bar");
    assert_eq!(status(&root), "", "everything is committed");

    let tree = head_tree(&root, "ports/foo-bar");
    assert_eq!(outcome.git_tree, tree);
    assert_eq!(
        read_json(&root.join("versions/f-/foo-bar.json")),
        serde_json::json!({
            "versions": [{"version-string": "2024-01-01-abc1234", "git-tree": tree}]
        })
    );
    assert_eq!(
        read_json(&root.join("versions/baseline.json")),
        serde_json::json!({
            "default": {"foo-bar": {"baseline": "2024-01-01-abc1234", "port-version": 0}}
        })
    );
    let manifest = read_json(&root.join("ports/foo-bar/vcpkg.json"));
    assert_eq!(manifest["description"], "The foo-bar library");
    assert_eq!(manifest["dependencies"][2], "zlib");

    let committed = git(&root, &["ls-tree", "-r", "--name-only", "HEAD"]);
    let files: Vec<_> = committed.lines().collect();
    assert_eq!(
        files,
        vec![
            "ports/foo-bar/portfile.cmake",
            "ports/foo-bar/vcpkg.json",
            "versions/baseline.json",
            "versions/f-/foo-bar.json",
        ]
    );
}

#[test]
fn add_then_list() {
    let dir = setup_repo();
    let root = canonical(dir.path());
    let remote = FakeRemote::new(SHA_1, "2024-01-01T10:00:00Z");

    with_registry(&root, ExecutionMode::Live, &remote, |r| {
        r.add(&add_request("zlib-ng")).unwrap();
        r.add(&add_request("foo")).unwrap();

        let ports = list_ports(r.ledger()).unwrap();
        let names: Vec<_> = ports.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["foo", "zlib-ng"]);
        assert!(
            ports
                .iter()
                .all(|p| p.version.as_deref() == Some("2024-01-01-abc1234"))
        );
    });
    assert_eq!(commit_count(&root), 2);
}

#[test]
fn add_existing_port_fails_without_commit() {
    let dir = setup_repo();
    let root = canonical(dir.path());
    let remote = FakeRemote::new(SHA_1, "2024-01-01T10:00:00Z");

    with_registry(&root, ExecutionMode::Live, &remote, |r| {
        r.add(&add_request("foo")).unwrap();
        let err = r.add(&add_request("foo")).unwrap_err();
        assert!(matches!(err, RegistryError::PortExists { .. }));
    });
    assert_eq!(commit_count(&root), 1);
}

// ===========================================================================
// update
// ===========================================================================

#[test]
fn update_appends_version_and_is_idempotent() {
    let dir = setup_repo();
    let root = canonical(dir.path());
    let remote = FakeRemote::new(SHA_1, "2024-01-01T10:00:00Z");

    with_registry(&root, ExecutionMode::Live, &remote, |r| {
        r.add(&add_request("foo-bar")).unwrap();
    });
    let first_tree = head_tree(&root, "ports/foo-bar");

    remote.set_commit(SHA_2, "2024-02-01T10:00:00Z");
    let outcome = with_registry(&root, ExecutionMode::Live, &remote, |r| {
        r.update(&port("foo-bar"), None).unwrap()
    });

    let second_tree = head_tree(&root, "ports/foo-bar");
    assert_ne!(first_tree, second_tree);
    assert_eq!(
        outcome,
        UpdateOutcome::Updated {
            previous_ref: SHA_1.to_owned(),
            version: "2024-02-01-bbbbbbb".to_owned(),
            git_tree: second_tree.clone(),
        }
    );
    assert_eq!(commit_count(&root), 2);
    assert_eq!(head_subject(&root), "Update foo-bar to 2024-02-01-bbbbbbb");
    assert_eq!(status(&root), "");
    assert_eq!(
        read_json(&root.join("versions/f-/foo-bar.json")),
        serde_json::json!({
            "versions": [
                {"version-string": "2024-01-01-abc1234", "git-tree": first_tree},
                {"version-string": "2024-02-01-bbbbbbb", "git-tree": second_tree},
            ]
        })
    );
    let portfile = std::fs::read_to_string(root.join("ports/foo-bar/portfile.cmake")).unwrap();
    assert!(portfile.contains(&format!("REF {SHA_2}\n")));

    // Same upstream commit again: nothing changes.
    let head_before = head(&root);
    let history_before = std::fs::read(root.join("versions/f-/foo-bar.json")).unwrap();
    let outcome = with_registry(&root, ExecutionMode::Live, &remote, |r| {
        r.update(&port("foo-bar"), None).unwrap()
    });
    assert!(matches!(outcome, UpdateOutcome::AlreadyUpToDate { .. }));
    assert_eq!(head(&root), head_before);
    assert_eq!(
        std::fs::read(root.join("versions/f-/foo-bar.json")).unwrap(),
        history_before
    );
    assert_eq!(status(&root), "");
}

// ===========================================================================
// update-versions
// ===========================================================================

#[test]
fn update_versions_rerecords_edited_port() {
    let dir = setup_repo();
    let root = canonical(dir.path());
    let remote = FakeRemote::new(SHA_1, "2024-01-01T10:00:00Z");

    with_registry(&root, ExecutionMode::Live, &remote, |r| {
        r.add(&add_request("foo")).unwrap();
    });
    let portfile = root.join("ports/foo/portfile.cmake");
    let mut text = std::fs::read_to_string(&portfile).unwrap();
    text.push_str("vcpkg_copy_pdbs()\n");
    std::fs::write(&portfile, text).unwrap();

    let outcome = with_registry(&root, ExecutionMode::Live, &remote, |r| {
        r.update_versions(&port("foo")).unwrap()
    });

    let tree = head_tree(&root, "ports/foo");
    match outcome {
        UpdateVersionsOutcome::Updated { git_tree, version, .. } => {
            assert_eq!(git_tree, tree);
            assert_eq!(version, "2024-01-01-abc1234");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(commit_count(&root), 2);
    assert!(head_subject(&root).starts_with("Update foo 2024-01-01-abc1234 ("));
    assert_eq!(status(&root), "");
    let history = read_json(&root.join("versions/f-/foo.json"));
    assert_eq!(history["versions"].as_array().unwrap().len(), 1);
    assert_eq!(history["versions"][0]["git-tree"], tree.as_str());

    // Nothing edited since: no new commit.
    let outcome = with_registry(&root, ExecutionMode::Live, &remote, |r| {
        r.update_versions(&port("foo")).unwrap()
    });
    assert!(matches!(outcome, UpdateVersionsOutcome::AlreadyUpToDate { .. }));
    assert_eq!(commit_count(&root), 2);
}

// ===========================================================================
// remove
// ===========================================================================

#[test]
fn remove_deletes_port_history_and_baseline_entry() {
    let dir = setup_repo();
    let root = canonical(dir.path());
    let remote = FakeRemote::new(SHA_1, "2024-01-01T10:00:00Z");

    with_registry(&root, ExecutionMode::Live, &remote, |r| {
        r.add(&add_request("foo")).unwrap();
        r.add(&add_request("fmt")).unwrap();

        let outcome = r.remove(&port("foo")).unwrap();
        assert!(outcome.port_dir_removed);
        assert!(outcome.ledger.history_removed);
        assert!(!outcome.ledger.shard_pruned);
        assert!(outcome.committed);
    });

    assert_eq!(commit_count(&root), 3);
    assert_eq!(head_subject(&root), "Removed foo");
    assert_eq!(status(&root), "");
    assert_eq!(git(&root, &["ls-tree", "HEAD", "ports/foo"]), "");
    assert_eq!(git(&root, &["ls-tree", "HEAD", "versions/f-/foo.json"]), "");
    let baseline = read_json(&root.join("versions/baseline.json"));
    assert!(baseline["default"].get("foo").is_none());
    assert!(baseline["default"].get("fmt").is_some());

    with_registry(&root, ExecutionMode::Live, &remote, |r| {
        let outcome = r.remove(&port("fmt")).unwrap();
        assert!(outcome.ledger.shard_pruned);
    });
    assert!(!root.join("versions/f-").exists());
    assert_eq!(status(&root), "");
    assert_eq!(
        read_json(&root.join("versions/baseline.json")),
        serde_json::json!({"default": {}})
    );
}

#[test]
fn remove_unknown_port_fails() {
    let dir = setup_repo();
    let root = canonical(dir.path());
    let remote = FakeRemote::new(SHA_1, "2024-01-01T10:00:00Z");

    let err = with_registry(&root, ExecutionMode::Live, &remote, |r| {
        r.remove(&port("ghost")).unwrap_err()
    });
    assert!(matches!(err, RegistryError::PortNotFound { .. }));
    assert_eq!(head(&root), None);
}

// ===========================================================================
// dry run and layout
// ===========================================================================

#[test]
fn dry_run_writes_and_stages_but_never_commits() {
    let dir = setup_repo();
    let root = canonical(dir.path());
    let remote = FakeRemote::new(SHA_1, "2024-01-01T10:00:00Z");

    let outcome = with_registry(&root, ExecutionMode::DryRun, &remote, |r| {
        r.add(&add_request("foo")).unwrap()
    });

    assert_eq!(head(&root), None);
    assert_eq!(outcome.git_tree, "");
    assert!(root.join("ports/foo/portfile.cmake").exists());
    let staged = git(&root, &["diff", "--cached", "--name-only"]);
    assert!(staged.contains("ports/foo/portfile.cmake"), "{staged}");
    assert!(staged.contains("versions/baseline.json"), "{staged}");
}

#[test]
fn registry_below_repository_root() {
    let dir = setup_repo();
    let repo_root = canonical(dir.path());
    let root = repo_root.join("registry");
    std::fs::create_dir_all(&root).unwrap();
    let remote = FakeRemote::new(SHA_1, "2024-01-01T10:00:00Z");

    let outcome = with_registry(&root, ExecutionMode::Live, &remote, |r| {
        r.add(&add_request("foo")).unwrap()
    });

    assert_eq!(outcome.git_tree, head_tree(&repo_root, "registry/ports/foo"));
    assert_eq!(status(&repo_root), "");
}
