//! Filesystem primitives for the trust store reconciler
//!
//! Provides relative-path handling, deterministic directory walks,
//! chunked content comparison, and atomic write operations.

pub mod compare;
pub mod error;
pub mod io;
pub mod path;
pub mod walk;

pub use error::{Error, Result};
pub use path::TreePath;
pub use walk::DirListing;
