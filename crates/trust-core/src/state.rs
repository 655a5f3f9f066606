//! Desired trust-store layout
//!
//! Scans a source directory once and condenses it into a [`DesiredState`]:
//! the certificate files to mirror, the hash links they should carry, the
//! directory skeleton, and the two assembled bundles. The result is a
//! plain value; nothing here touches the target root.

use std::fs;
use std::path::{Path, PathBuf};

use trust_fs::{TreePath, walk};

use crate::bundle::{self, CACERTS_FILE, CACERTS_NO_HEADERS_FILE};
use crate::cert;
use crate::links::{self, LinkAssignment};
use crate::{Error, Result};

/// Everything the target root should look like for one source tree.
#[derive(Debug, Clone)]
pub struct DesiredState {
    /// Source root the certificate files are copied from
    pub source_root: PathBuf,
    /// Whether hash links are generated and stray symlinks purged
    pub manage_links: bool,
    /// Certificate path to link name; bundles map to themselves
    pub links: LinkAssignment,
    /// Directory skeleton mirrored from the source, sorted
    pub directories: Vec<TreePath>,
    /// Concatenation of every accepted certificate, in path order
    pub bundle: Vec<u8>,
    /// Same concatenation with PEM delimiter lines stripped
    pub bundle_no_headers: Vec<u8>,
}

impl DesiredState {
    /// Scan `source_root` and build the desired target layout.
    ///
    /// Files that do not parse as certificates are logged and skipped,
    /// as are files that vanish between listing and read; neither fails
    /// the scan. A missing or non-directory source root is fatal.
    pub fn build(source_root: &Path, generate_hash_links: bool) -> Result<Self> {
        if !source_root.is_dir() {
            return Err(Error::SourceNotADirectory {
                path: source_root.to_path_buf(),
            });
        }

        let listing = walk::walk(source_root)?;

        let mut entries = Vec::new();
        for rel in &listing.files {
            // A previously deployed aggregate sitting in the source
            // would otherwise feed back into itself on every run.
            if bundle::is_bundle_name(rel.as_str()) {
                continue;
            }

            let path = rel.resolve(source_root);
            let bytes = match fs::read(&path) {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    tracing::warn!(path = %rel, "source file vanished during scan, skipping");
                    continue;
                }
                Err(e) => return Err(trust_fs::Error::io(&path, e).into()),
            };

            match cert::classify(rel, &bytes) {
                Ok(entry) => entries.push(entry),
                Err(err) => {
                    tracing::warn!(path = %rel, %err, "skipping file");
                }
            }
        }

        let reserved = links::reserved_slots(&entries);
        let mut link_map = links::assign_links(&entries, &reserved, generate_hash_links);

        let mut bundle = Vec::new();
        let mut bundle_no_headers = Vec::new();
        for entry in &entries {
            bundle.extend_from_slice(&entry.content);
            bundle_no_headers.extend(bundle::strip_pem_headers(&entry.content));
        }

        // Self-mapped so the purge pass counts them as part of the layout.
        link_map.insert(TreePath::new(CACERTS_FILE), CACERTS_FILE.to_string());
        link_map.insert(
            TreePath::new(CACERTS_NO_HEADERS_FILE),
            CACERTS_NO_HEADERS_FILE.to_string(),
        );

        Ok(Self {
            source_root: source_root.to_path_buf(),
            manage_links: generate_hash_links,
            links: link_map,
            directories: listing.directories,
            bundle,
            bundle_no_headers,
        })
    }
}

/// Convenience wrapper over [`DesiredState::build`].
pub fn build_desired_state(source_root: &Path, generate_hash_links: bool) -> Result<DesiredState> {
    DesiredState::build(source_root, generate_hash_links)
}
