//! Certificate bundle assembly
//!
//! The reconciler maintains two aggregate files at the target root: one
//! concatenation of every accepted certificate as found, and one with
//! the PEM delimiter lines stripped for consumers that want bare base64
//! bodies.

use std::path::Path;

use trust_fs::{compare, io};

use crate::Result;

/// Aggregate bundle with PEM delimiter lines intact.
pub const CACERTS_FILE: &str = "cacerts.pem";

/// Aggregate bundle with PEM delimiter lines stripped.
pub const CACERTS_NO_HEADERS_FILE: &str = "cacerts_no_headers.pem";

/// Whether a root-relative name is one of the aggregate bundles.
///
/// Bundle names are special-cased in two places: the scanner never
/// treats them as certificate sources, and the engine writes them from
/// assembled content instead of copying them.
pub fn is_bundle_name(name: &str) -> bool {
    name == CACERTS_FILE || name == CACERTS_NO_HEADERS_FILE
}

/// Remove PEM delimiter lines, keeping everything else untouched.
///
/// Only lines whose first non-blank content is a `-----BEGIN` or
/// `-----END` marker are dropped. Input without delimiters passes
/// through unchanged, so stripping is idempotent.
pub fn strip_pem_headers(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());
    let mut start = 0;
    while start < input.len() {
        let end = input[start..]
            .iter()
            .position(|&b| b == b'\n')
            .map(|i| start + i + 1)
            .unwrap_or(input.len());
        let line = &input[start..end];
        if !is_delimiter_line(line) {
            out.extend_from_slice(line);
        }
        start = end;
    }
    out
}

fn is_delimiter_line(line: &[u8]) -> bool {
    let trimmed = line.trim_ascii_start();
    trimmed.starts_with(b"-----BEGIN") || trimmed.starts_with(b"-----END")
}

/// Write a bundle only when the on-disk content differs.
///
/// Returns whether a write happened. The write is atomic, so readers of
/// the bundle never observe partial content.
pub fn write_if_changed(target_root: &Path, name: &str, content: &[u8]) -> Result<bool> {
    let path = target_root.join(name);
    if !compare::file_differs_from(&path, content)? {
        return Ok(false);
    }
    io::write_atomic(&path, content)?;
    Ok(true)
}
