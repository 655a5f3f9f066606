//! Relative tree paths with forward-slash normalization

use std::path::{Path, PathBuf};

/// A forward-slash path relative to some tree root.
///
/// Every name the sync layer tracks is relative to either the source or
/// the target root. Normalizing to forward slashes once keeps comparisons
/// identical across platforms; conversion to the native representation
/// happens only at I/O boundaries via [`TreePath::resolve`].
///
/// Ordering is lexicographic on the normalized string. That ordering is
/// the deterministic processing order used throughout the workspace.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TreePath {
    /// Internal representation always uses forward slashes
    inner: String,
}

impl TreePath {
    /// Create a new TreePath from any path-like input.
    ///
    /// Backslashes become forward slashes; leading `./` and trailing
    /// slashes are dropped.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let raw = path.as_ref().to_string_lossy().replace('\\', "/");
        let mut s = raw.as_str();
        while let Some(rest) = s.strip_prefix("./") {
            s = rest;
        }
        let s = s.trim_end_matches('/');
        Self {
            inner: s.to_string(),
        }
    }

    /// Get the normalized relative string representation.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Resolve against a tree root, producing a native path for I/O.
    pub fn resolve(&self, root: &Path) -> PathBuf {
        let mut out = root.to_path_buf();
        for component in self.inner.split('/').filter(|c| !c.is_empty()) {
            out.push(component);
        }
        out
    }

    /// Join this path with a child segment.
    pub fn join(&self, segment: &str) -> Self {
        if self.inner.is_empty() {
            Self::new(segment)
        } else {
            Self::new(format!("{}/{}", self.inner, segment))
        }
    }

    /// Get the parent path, if any.
    pub fn parent(&self) -> Option<Self> {
        let idx = self.inner.rfind('/')?;
        Some(Self {
            inner: self.inner[..idx].to_string(),
        })
    }

    /// Get the final path component.
    pub fn file_name(&self) -> &str {
        self.inner.rsplit('/').next().unwrap_or("")
    }

    /// Get the file name up to its final `.`, if present.
    pub fn file_stem(&self) -> Option<&str> {
        let name = self.file_name();
        match name.rfind('.') {
            Some(idx) if idx > 0 => Some(&name[..idx]),
            _ => None,
        }
    }

    /// Get the extension after the final `.`, if present.
    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name();
        match name.rfind('.') {
            Some(idx) if idx > 0 => Some(&name[idx + 1..]),
            _ => None,
        }
    }

    /// Check whether `other` lives strictly below this path.
    pub fn is_ancestor_of(&self, other: &TreePath) -> bool {
        !self.inner.is_empty()
            && other.inner.len() > self.inner.len()
            && other.inner.starts_with(&self.inner)
            && other.inner.as_bytes()[self.inner.len()] == b'/'
    }
}

impl AsRef<str> for TreePath {
    fn as_ref(&self) -> &str {
        &self.inner
    }
}

impl std::fmt::Display for TreePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<&str> for TreePath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for TreePath {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&Path> for TreePath {
    fn from(p: &Path) -> Self {
        Self::new(p)
    }
}

impl From<PathBuf> for TreePath {
    fn from(p: PathBuf) -> Self {
        Self::new(p)
    }
}
