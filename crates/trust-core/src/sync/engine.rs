//! Reconciliation engine
//!
//! Compares a target root against a [`DesiredState`] and, on apply,
//! converges it. Check is strictly read-only; it never creates the
//! target root and never writes anything. Check and apply share one
//! extras computation, so a purge check names exactly the entries a
//! purging apply would remove.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use trust_fs::{DirListing, TreePath, compare, io, walk};

use crate::Result;
use crate::bundle::{self, CACERTS_FILE, CACERTS_NO_HEADERS_FILE};
use crate::state::DesiredState;
use crate::sync::check::{CheckReport, DriftItem, EntryKind};

/// Outcome of an apply run.
///
/// Per-entry failures are collected rather than aborting the run, so one
/// unreadable certificate does not leave the rest of the store stale.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplyReport {
    /// Whether the run completed without per-entry failures
    pub success: bool,
    /// Changes made, in execution order
    pub actions: Vec<String>,
    /// Per-entry failures that did not stop the run
    pub errors: Vec<String>,
    /// Source files that vanished mid-run
    pub skipped: Vec<String>,
}

/// Reconciles one target root against a desired layout.
#[derive(Debug, Clone)]
pub struct SyncEngine {
    target_root: PathBuf,
}

impl SyncEngine {
    pub fn new(target_root: impl Into<PathBuf>) -> Self {
        Self {
            target_root: target_root.into(),
        }
    }

    pub fn target_root(&self) -> &Path {
        &self.target_root
    }

    /// Report every way the target deviates from the desired layout.
    ///
    /// With `purge` set, entries outside the layout are reported as
    /// extra; without it they are ignored. An absent target root is
    /// reported as everything missing, not created.
    pub fn check(&self, desired: &DesiredState, purge: bool) -> Result<CheckReport> {
        let snapshot = self.snapshot()?;
        let mut missing = Vec::new();
        let mut drifted = Vec::new();

        for dir in &desired.directories {
            if !contains(&snapshot.directories, dir) {
                missing.push(DriftItem::new(
                    dir.as_str(),
                    EntryKind::Directory,
                    "directory absent",
                ));
            }
        }

        for (rel, link) in &desired.links {
            if bundle::is_bundle_name(rel.as_str()) {
                continue;
            }

            if !contains(&snapshot.files, rel) {
                missing.push(DriftItem::new(rel.as_str(), EntryKind::File, "file absent"));
            } else {
                let source_path = rel.resolve(&desired.source_root);
                let target_path = rel.resolve(&self.target_root);
                if compare::files_differ(&source_path, &target_path)? {
                    drifted.push(DriftItem::new(
                        rel.as_str(),
                        EntryKind::File,
                        "content differs from source",
                    ));
                }
            }

            if link.as_str() != rel.as_str() {
                self.check_link(rel, link, &snapshot, &mut missing, &mut drifted)?;
            }
        }

        for (name, content) in [
            (CACERTS_FILE, desired.bundle.as_slice()),
            (CACERTS_NO_HEADERS_FILE, desired.bundle_no_headers.as_slice()),
        ] {
            if !contains(&snapshot.files, &TreePath::new(name)) {
                missing.push(DriftItem::new(name, EntryKind::Bundle, "bundle absent"));
            } else if compare::file_differs_from(&self.target_root.join(name), content)? {
                drifted.push(DriftItem::new(name, EntryKind::Bundle, "content out of date"));
            }
        }

        let mut extra = Vec::new();
        if purge {
            for (rel, kind) in extras(desired, &snapshot) {
                extra.push(DriftItem::new(
                    rel.as_str(),
                    kind,
                    "not part of the desired layout",
                ));
            }
        }

        Ok(CheckReport::from_parts(missing, drifted, extra))
    }

    fn check_link(
        &self,
        rel: &TreePath,
        link: &str,
        snapshot: &DirListing,
        missing: &mut Vec<DriftItem>,
        drifted: &mut Vec<DriftItem>,
    ) -> Result<()> {
        let link_rel = TreePath::new(link);
        if contains(&snapshot.symlinks, &link_rel) {
            let points_at = io::symlink_target(&link_rel.resolve(&self.target_root))?;
            if TreePath::new(&points_at) != *rel {
                drifted.push(DriftItem::new(
                    link,
                    EntryKind::Symlink,
                    format!("points at '{}' instead of '{rel}'", points_at.display()),
                ));
            }
        } else if contains(&snapshot.files, &link_rel) || contains(&snapshot.directories, &link_rel)
        {
            drifted.push(DriftItem::new(
                link,
                EntryKind::Symlink,
                "name occupied by a non-symlink",
            ));
        } else {
            missing.push(DriftItem::new(link, EntryKind::Symlink, "link absent"));
        }
        Ok(())
    }

    /// Converge the target root onto the desired layout.
    ///
    /// Order: create the root, purge extras, create directories, copy
    /// changed files, fix links, write bundles. Individual failures are
    /// collected in the report; only a failure to create the root itself
    /// is fatal.
    pub fn apply(&self, desired: &DesiredState, purge: bool) -> Result<ApplyReport> {
        let mut report = ApplyReport::default();

        fs::create_dir_all(&self.target_root)
            .map_err(|e| trust_fs::Error::io(&self.target_root, e))?;

        if purge {
            let snapshot = self.snapshot()?;
            for (rel, _) in extras(desired, &snapshot) {
                let path = rel.resolve(&self.target_root);
                tracing::info!(path = %rel, "purging entry outside the desired layout");
                match io::remove_entry(&path) {
                    Ok(true) => report.actions.push(format!("Purged '{rel}'")),
                    Ok(false) => {}
                    Err(e) => report.errors.push(format!("failed to purge '{rel}': {e}")),
                }
            }
        }

        for dir in &desired.directories {
            let path = dir.resolve(&self.target_root);
            if !path.is_dir() {
                match fs::create_dir_all(&path) {
                    Ok(()) => report.actions.push(format!("Created directory '{dir}'")),
                    Err(e) => {
                        report
                            .errors
                            .push(format!("failed to create directory '{dir}': {e}"));
                    }
                }
            }
        }

        for (rel, link) in &desired.links {
            if bundle::is_bundle_name(rel.as_str()) {
                continue;
            }
            self.apply_entry(desired, rel, link, &mut report);
        }

        for (name, content) in [
            (CACERTS_FILE, desired.bundle.as_slice()),
            (CACERTS_NO_HEADERS_FILE, desired.bundle_no_headers.as_slice()),
        ] {
            match bundle::write_if_changed(&self.target_root, name, content) {
                Ok(true) => report.actions.push(format!("Wrote '{name}'")),
                Ok(false) => {}
                Err(e) => report.errors.push(format!("failed to write '{name}': {e}")),
            }
        }

        report.success = report.errors.is_empty();
        Ok(report)
    }

    /// Copy one certificate and fix its link, recording the outcome in
    /// the report. A copy failure abandons the entry before the link
    /// step so a fresh link never points at stale content.
    fn apply_entry(
        &self,
        desired: &DesiredState,
        rel: &TreePath,
        link: &str,
        report: &mut ApplyReport,
    ) {
        let source_path = rel.resolve(&desired.source_root);
        let target_path = rel.resolve(&self.target_root);

        let differs = match compare::files_differ(&source_path, &target_path) {
            Ok(differs) => differs,
            Err(e) => {
                report.errors.push(format!("failed to compare '{rel}': {e}"));
                return;
            }
        };
        if differs {
            match fs::copy(&source_path, &target_path) {
                Ok(_) => report.actions.push(format!("Copied '{rel}'")),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    tracing::warn!(path = %rel, "source file vanished before copy, skipping");
                    report.skipped.push(rel.as_str().to_string());
                    return;
                }
                Err(e) => {
                    report.errors.push(format!("failed to copy '{rel}': {e}"));
                    return;
                }
            }
        }

        if link != rel.as_str() {
            let link_path = TreePath::new(link).resolve(&self.target_root);
            let points_at = Path::new(rel.as_str());
            let needs_link = match fs::read_link(&link_path) {
                Ok(existing) => existing != points_at,
                Err(_) => true,
            };
            if needs_link {
                match io::replace_symlink(&link_path, points_at) {
                    Ok(()) => report.actions.push(format!("Linked '{link}' -> '{rel}'")),
                    Err(e) => report.errors.push(format!("failed to link '{link}': {e}")),
                }
            }
        }
    }

    /// List the target root, or pretend it is empty when absent.
    fn snapshot(&self) -> Result<DirListing> {
        if !self.target_root.is_dir() {
            return Ok(DirListing::default());
        }
        Ok(walk::walk(&self.target_root)?)
    }
}

fn contains(sorted: &[TreePath], path: &TreePath) -> bool {
    sorted.binary_search(path).is_ok()
}

/// Entries in the snapshot that a purging run removes.
///
/// A directory survives when it shelters any desired entry, so purging
/// never tears down ancestors of managed paths. Symlinks are only
/// considered when link management is on; an unmanaged store may carry
/// foreign symlinks freely.
fn extras(desired: &DesiredState, snapshot: &DirListing) -> Vec<(TreePath, EntryKind)> {
    let expected_files: BTreeSet<&TreePath> = desired.links.keys().collect();
    let expected_links: BTreeSet<TreePath> = desired
        .links
        .iter()
        .filter(|(rel, link)| link.as_str() != rel.as_str())
        .map(|(_, link)| TreePath::new(link))
        .collect();
    let expected_dirs: BTreeSet<&TreePath> = desired.directories.iter().collect();

    let mut out = Vec::new();
    for file in &snapshot.files {
        if !expected_files.contains(file) && !expected_links.contains(file) {
            out.push((file.clone(), EntryKind::File));
        }
    }
    for dir in &snapshot.directories {
        if expected_dirs.contains(dir) {
            continue;
        }
        let shelters = expected_files.iter().any(|p| dir.is_ancestor_of(p))
            || expected_dirs.iter().any(|p| dir.is_ancestor_of(p))
            || expected_links.iter().any(|p| dir.is_ancestor_of(p));
        if !shelters {
            out.push((dir.clone(), EntryKind::Directory));
        }
    }
    if desired.manage_links {
        for link in &snapshot.symlinks {
            if !expected_links.contains(link) {
                out.push((link.clone(), EntryKind::Symlink));
            }
        }
    }
    out
}
