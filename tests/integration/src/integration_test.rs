//! End-to-end integration test for the reconciliation flow
//!
//! Exercises the complete path: source scan -> desired state -> check ->
//! apply -> re-check, against real certificate files on disk.

use std::fs;
use std::path::{Path, PathBuf};

use assert_fs::prelude::*;
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use trust_core::{CheckStatus, SyncEngine, build_desired_state};
use trust_fs::walk;

fn fixture(name: &str) -> Vec<u8> {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../test-fixtures/certs")
        .join(name);
    fs::read(path).unwrap()
}

fn stage(source: &Path, rel: &str, fixture_name: &str) {
    let path = source.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, fixture(fixture_name)).unwrap();
}

#[test]
fn test_full_reconciliation_flow() {
    let source = TempDir::new().unwrap();
    stage(source.path(), "cert1.pem", "cert1.pem");
    stage(source.path(), "cert1.der", "cert1.der");
    stage(source.path(), "intermediate/cert2.pem", "cert2.pem");
    stage(source.path(), "legacy/cert3_no_headers.pem", "cert3_no_headers.pem");

    let desired = build_desired_state(source.path(), true).unwrap();

    let target = assert_fs::TempDir::new().unwrap();
    let engine = SyncEngine::new(target.path());

    // Fresh target: everything is missing
    let before = engine.check(&desired, true).unwrap();
    assert_eq!(before.status, CheckStatus::Missing);
    assert!(!before.in_sync());

    let report = engine.apply(&desired, true).unwrap();
    assert!(report.success, "apply failed: {:?}", report.errors);

    // Certificates mirrored, directory skeleton included
    target.child("cert1.pem").assert(predicate::path::exists());
    target.child("cert1.der").assert(predicate::path::exists());
    target
        .child("intermediate/cert2.pem")
        .assert(predicate::path::exists());
    target
        .child("legacy/cert3_no_headers.pem")
        .assert(predicate::path::exists());

    // Hash links: cert1.pem and cert1.der share a subject, so they get
    // consecutive slots in path order
    assert_eq!(
        fs::read_link(target.path().join("e1ebff0b.0")).unwrap(),
        PathBuf::from("cert1.der")
    );
    assert_eq!(
        fs::read_link(target.path().join("e1ebff0b.1")).unwrap(),
        PathBuf::from("cert1.pem")
    );
    assert_eq!(
        fs::read_link(target.path().join("98899f41.0")).unwrap(),
        PathBuf::from("intermediate/cert2.pem")
    );
    assert_eq!(
        fs::read_link(target.path().join("ecdbcd44.0")).unwrap(),
        PathBuf::from("legacy/cert3_no_headers.pem")
    );

    // Bundles: everything concatenated, delimiter-free variant alongside
    let mut want = fixture("cert1.der");
    want.extend(fixture("cert1.pem"));
    want.extend(fixture("cert2.pem"));
    want.extend(fixture("cert3_no_headers.pem"));
    assert_eq!(fs::read(target.path().join("cacerts.pem")).unwrap(), want);
    target
        .child("cacerts_no_headers.pem")
        .assert(predicate::str::contains("-----BEGIN").not());

    // Converged target passes a purge check
    assert!(engine.check(&desired, true).unwrap().in_sync());

    // And a second apply finds nothing to do
    let second = engine.apply(&desired, true).unwrap();
    assert_eq!(second.actions, Vec::<String>::new());
}

#[test]
fn test_hash_collision_slots_fill_around_reserved_indices() {
    // Seven files share one subject. Three carry pre-hashed names that
    // pin slots 0, 3 and 9; the rest fill the remaining indices in
    // lexicographic path order.
    let source = TempDir::new().unwrap();
    stage(source.path(), "cert_a.pem", "cert3.pem");
    stage(source.path(), "cert_a_no_headers.pem", "cert3_no_headers.pem");
    stage(source.path(), "dir1/cert_a.pem", "cert3.pem");
    stage(source.path(), "dir1/cert_a_no_headers.pem", "cert3_no_headers.pem");
    stage(source.path(), "ecdbcd44.0", "cert3.pem");
    stage(source.path(), "ecdbcd44.3", "cert3.pem");
    stage(source.path(), "ecdbcd44.9", "cert3_no_headers.pem");

    let desired = build_desired_state(source.path(), true).unwrap();
    let target = TempDir::new().unwrap();
    let engine = SyncEngine::new(target.path());
    engine.apply(&desired, true).unwrap();

    // Pre-hashed names keep their own slots as regular files
    for name in ["ecdbcd44.0", "ecdbcd44.3", "ecdbcd44.9"] {
        let meta = target.path().join(name).symlink_metadata().unwrap();
        assert!(meta.is_file(), "{name} should be a copied file, not a link");
    }

    // The rest fill the gaps
    let expected_links = [
        ("ecdbcd44.1", "cert_a.pem"),
        ("ecdbcd44.2", "cert_a_no_headers.pem"),
        ("ecdbcd44.4", "dir1/cert_a.pem"),
        ("ecdbcd44.5", "dir1/cert_a_no_headers.pem"),
    ];
    for (link, points_at) in expected_links {
        assert_eq!(
            fs::read_link(target.path().join(link)).unwrap(),
            PathBuf::from(points_at),
            "wrong target for {link}"
        );
    }

    assert!(engine.check(&desired, true).unwrap().in_sync());
}

#[test]
fn test_two_targets_from_one_source_are_identical() {
    let source = TempDir::new().unwrap();
    stage(source.path(), "cert1.pem", "cert1.pem");
    stage(source.path(), "dir1/cert2.pem", "cert2.pem");
    stage(source.path(), "dup_a.pem", "dup_a.pem");
    stage(source.path(), "dup_b.pem", "dup_b.pem");

    let target_a = TempDir::new().unwrap();
    let target_b = TempDir::new().unwrap();

    let desired_a = build_desired_state(source.path(), true).unwrap();
    SyncEngine::new(target_a.path()).apply(&desired_a, true).unwrap();
    let desired_b = build_desired_state(source.path(), true).unwrap();
    SyncEngine::new(target_b.path()).apply(&desired_b, true).unwrap();

    let listing_a = walk::walk(target_a.path()).unwrap();
    let listing_b = walk::walk(target_b.path()).unwrap();
    assert_eq!(listing_a.files, listing_b.files);
    assert_eq!(listing_a.directories, listing_b.directories);
    assert_eq!(listing_a.symlinks, listing_b.symlinks);

    for link in &listing_a.symlinks {
        assert_eq!(
            fs::read_link(link.resolve(target_a.path())).unwrap(),
            fs::read_link(link.resolve(target_b.path())).unwrap(),
        );
    }
    assert_eq!(
        fs::read(target_a.path().join("cacerts.pem")).unwrap(),
        fs::read(target_b.path().join("cacerts.pem")).unwrap()
    );
}

#[test]
fn test_malformed_files_do_not_poison_the_store() {
    let source = TempDir::new().unwrap();
    stage(source.path(), "cert1.pem", "cert1.pem");
    fs::write(source.path().join("notes.txt"), "operator notes").unwrap();
    fs::write(source.path().join("broken.pem"), "-----BEGIN CERTIFICATE-----\ngarbage\n").unwrap();

    let desired = build_desired_state(source.path(), true).unwrap();
    let target = TempDir::new().unwrap();
    let engine = SyncEngine::new(target.path());
    let report = engine.apply(&desired, true).unwrap();

    assert!(report.success);
    assert!(!target.path().join("notes.txt").exists());
    assert!(!target.path().join("broken.pem").exists());
    assert_eq!(
        fs::read(target.path().join("cacerts.pem")).unwrap(),
        fixture("cert1.pem")
    );
}

#[test]
fn test_reports_serialize_for_external_consumers() {
    let source = TempDir::new().unwrap();
    stage(source.path(), "cert1.pem", "cert1.pem");
    let desired = build_desired_state(source.path(), true).unwrap();

    let target = TempDir::new().unwrap();
    let engine = SyncEngine::new(target.path());

    let check = engine.check(&desired, true).unwrap();
    let json: serde_json::Value = serde_json::to_value(&check).unwrap();
    assert_eq!(json["status"], "missing");
    assert!(json["missing"].as_array().unwrap().len() >= 3);

    let apply = engine.apply(&desired, true).unwrap();
    let json: serde_json::Value = serde_json::to_value(&apply).unwrap();
    assert_eq!(json["success"], true);
    assert!(!json["actions"].as_array().unwrap().is_empty());
}
