//! Error types for trust-core

use std::path::PathBuf;

/// Result type for trust-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in trust-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Source tree missing or not a directory; fatal for the whole cycle
    #[error("'{path}' is not a valid directory")]
    SourceNotADirectory { path: PathBuf },

    // Transparent wrappers for underlying crate errors
    /// Filesystem error from trust-fs
    #[error(transparent)]
    Fs(#[from] trust_fs::Error),
}
