//! Multi-run convergence scenarios
//!
//! A trust store lives through certificate rollouts, renewals, and
//! revocations. Each scenario here replays one of those lifecycles as a
//! sequence of scan/apply rounds against the same target.

use std::fs;
use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use tempfile::TempDir;
use trust_core::{CheckStatus, SyncEngine, build_desired_state};

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

fn converge(engine: &SyncEngine, source: &Path) {
    // RUST_LOG=debug surfaces engine tracing when a scenario misbehaves
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let desired = build_desired_state(source, true).unwrap();
    let report = engine.apply(&desired, true).unwrap();
    assert!(report.success, "apply failed: {:?}", report.errors);
    assert!(engine.check(&desired, true).unwrap().in_sync());
}

#[test]
fn test_certificate_rollout() {
    let source = TempDir::new().unwrap();
    let target = TempDir::new().unwrap();
    let engine = SyncEngine::new(target.path());

    stage(source.path(), "cert1.pem", "cert1.pem");
    converge(&engine, source.path());

    // A new CA lands in the source
    stage(source.path(), "cert2.pem", "cert2.pem");
    let desired = build_desired_state(source.path(), true).unwrap();
    let report = engine.check(&desired, true).unwrap();
    assert_eq!(report.status, CheckStatus::Missing);

    converge(&engine, source.path());
    assert!(target.path().join("cert2.pem").exists());
    assert_eq!(
        fs::read_link(target.path().join("98899f41.0")).unwrap(),
        PathBuf::from("cert2.pem")
    );
    let mut want = fixture("cert1.pem");
    want.extend(fixture("cert2.pem"));
    assert_eq!(fs::read(target.path().join("cacerts.pem")).unwrap(), want);
}

#[test]
fn test_certificate_renewal_moves_the_hash_link() {
    let source = TempDir::new().unwrap();
    let target = TempDir::new().unwrap();
    let engine = SyncEngine::new(target.path());

    stage(source.path(), "ca.pem", "cert1.pem");
    converge(&engine, source.path());
    assert!(target.path().join("e1ebff0b.0").symlink_metadata().is_ok());

    // The CA is replaced by one with a different subject; the old hash
    // link becomes stray and a new one appears.
    stage(source.path(), "ca.pem", "cert2.pem");
    converge(&engine, source.path());

    assert!(target.path().join("e1ebff0b.0").symlink_metadata().is_err());
    assert_eq!(
        fs::read_link(target.path().join("98899f41.0")).unwrap(),
        PathBuf::from("ca.pem")
    );
    assert_eq!(
        fs::read(target.path().join("ca.pem")).unwrap(),
        fixture("cert2.pem")
    );
}

#[test]
fn test_certificate_revocation_with_purge() {
    let source = TempDir::new().unwrap();
    let target = TempDir::new().unwrap();
    let engine = SyncEngine::new(target.path());

    stage(source.path(), "keep.pem", "cert1.pem");
    stage(source.path(), "revoked/bad.pem", "cert2.pem");
    converge(&engine, source.path());

    fs::remove_file(source.path().join("revoked/bad.pem")).unwrap();
    fs::remove_dir(source.path().join("revoked")).unwrap();

    let desired = build_desired_state(source.path(), true).unwrap();
    let report = engine.check(&desired, true).unwrap();
    assert_eq!(report.status, CheckStatus::Extra);

    converge(&engine, source.path());
    assert!(!target.path().join("revoked").exists());
    assert!(target.path().join("98899f41.0").symlink_metadata().is_err());
    assert_eq!(
        fs::read(target.path().join("cacerts.pem")).unwrap(),
        fixture("cert1.pem")
    );
}

#[test]
fn test_store_rebuild_after_manual_damage() {
    let source = TempDir::new().unwrap();
    let target = TempDir::new().unwrap();
    let engine = SyncEngine::new(target.path());

    stage(source.path(), "cert1.pem", "cert1.pem");
    stage(source.path(), "dir1/cert2.pem", "cert2.pem");
    converge(&engine, source.path());

    // Someone hand-edits the store
    fs::write(target.path().join("cert1.pem"), "edited by hand").unwrap();
    fs::remove_file(target.path().join("98899f41.0")).unwrap();
    fs::write(target.path().join("rogue.pem"), "added by hand").unwrap();
    fs::write(target.path().join("cacerts.pem"), "truncated").unwrap();

    let desired = build_desired_state(source.path(), true).unwrap();
    let report = engine.check(&desired, true).unwrap();
    assert_eq!(report.status, CheckStatus::Drifted);
    assert!(!report.missing.is_empty());
    assert!(!report.drifted.is_empty());
    assert!(!report.extra.is_empty());

    converge(&engine, source.path());
    assert_eq!(
        fs::read(target.path().join("cert1.pem")).unwrap(),
        fixture("cert1.pem")
    );
    assert!(!target.path().join("rogue.pem").exists());
}
