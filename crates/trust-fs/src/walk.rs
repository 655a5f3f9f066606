//! Deterministic recursive directory listing

use std::fs;
use std::path::Path;

use crate::{Error, Result, TreePath};

/// Everything found under a walk root, split by entry kind.
///
/// Paths are relative to the root and sorted lexicographically, so two
/// walks of identical trees produce identical listings.
#[derive(Debug, Default, Clone)]
pub struct DirListing {
    /// Regular files
    pub files: Vec<TreePath>,
    /// Directories, at all depths, excluding the root itself
    pub directories: Vec<TreePath>,
    /// Symlinks, never followed
    pub symlinks: Vec<TreePath>,
}

/// Recursively list a directory tree.
///
/// Symlinks are reported but never followed, so a symlinked directory
/// appears once as a symlink and its target is not descended into.
/// An entry that vanishes between listing and inspection is skipped.
pub fn walk(root: &Path) -> Result<DirListing> {
    if !root.is_dir() {
        return Err(Error::NotADirectory {
            path: root.to_path_buf(),
        });
    }

    let mut listing = DirListing::default();
    walk_into(root, &TreePath::new(""), &mut listing)?;
    listing.files.sort();
    listing.directories.sort();
    listing.symlinks.sort();
    Ok(listing)
}

fn walk_into(root: &Path, prefix: &TreePath, listing: &mut DirListing) -> Result<()> {
    let dir = prefix.resolve(root);
    let entries = fs::read_dir(&dir).map_err(|e| Error::io(&dir, e))?;

    for entry in entries {
        let entry = entry.map_err(|e| Error::io(&dir, e))?;
        let rel = prefix.join(&entry.file_name().to_string_lossy());

        let meta = match fs::symlink_metadata(entry.path()) {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %rel, "entry vanished during walk, skipping");
                continue;
            }
            Err(e) => return Err(Error::io(entry.path(), e)),
        };

        let file_type = meta.file_type();
        if file_type.is_symlink() {
            listing.symlinks.push(rel);
        } else if file_type.is_dir() {
            listing.directories.push(rel.clone());
            walk_into(root, &rel, listing)?;
        } else {
            listing.files.push(rel);
        }
    }

    Ok(())
}
