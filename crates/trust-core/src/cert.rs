//! Certificate classification
//!
//! Decides whether a source file holds an X.509 certificate and, when it
//! does, computes the subject name hash that drives link allocation.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use x509_parser::pem::parse_x509_pem;
use x509_parser::prelude::{FromDer, X509Certificate};

use trust_fs::TreePath;

use crate::name_hash;

const PEM_CERT_HEADER: &[u8] = b"-----BEGIN CERTIFICATE-----";

/// A source file recognized as an X.509 certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateEntry {
    /// Path relative to the source root
    pub rel_path: TreePath,
    /// OpenSSL subject name hash, eight lowercase hex digits
    pub subject_hash: String,
    /// Original file bytes, byte for byte
    pub content: Vec<u8>,
}

/// Returned when a file cannot be parsed as a certificate in any
/// accepted encoding. Recoverable: the caller logs and skips the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("not an X.509 certificate in any accepted encoding")]
pub struct NotACertificate;

/// Decide whether a source file is a certificate.
///
/// Accepted encodings, tried in order:
/// 1. PEM, the first `BEGIN CERTIFICATE` block
/// 2. Raw DER
/// 3. Header-less base64 DER (delimiter lines absent)
///
/// The returned entry keeps the file's original bytes: bundles are
/// concatenations of inputs as found, not re-encodings.
pub fn classify(rel_path: &TreePath, bytes: &[u8]) -> Result<CertificateEntry, NotACertificate> {
    let subject_hash = subject_hash_of(bytes).ok_or(NotACertificate)?;
    Ok(CertificateEntry {
        rel_path: rel_path.clone(),
        subject_hash,
        content: bytes.to_vec(),
    })
}

fn subject_hash_of(bytes: &[u8]) -> Option<String> {
    if let Some(block) = find_cert_block(bytes) {
        let (_, pem) = parse_x509_pem(block).ok()?;
        let (_, cert) = X509Certificate::from_der(&pem.contents).ok()?;
        return name_hash::subject_hash(cert.subject().as_raw());
    }

    if let Ok((_, cert)) = X509Certificate::from_der(bytes) {
        return name_hash::subject_hash(cert.subject().as_raw());
    }

    // Some trust-store drops carry the base64 body without delimiters.
    let stripped: Vec<u8> = bytes
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    let der = BASE64.decode(&stripped).ok()?;
    let (_, cert) = X509Certificate::from_der(&der).ok()?;
    name_hash::subject_hash(cert.subject().as_raw())
}

fn find_cert_block(bytes: &[u8]) -> Option<&[u8]> {
    let pos = bytes
        .windows(PEM_CERT_HEADER.len())
        .position(|w| w == PEM_CERT_HEADER)?;
    Some(&bytes[pos..])
}
