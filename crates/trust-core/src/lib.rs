//! Certificate trust store reconciliation
//!
//! Builds the desired trust-store layout for a source directory of X.509
//! certificates and reconciles a target directory against it, implementing:
//!
//! - **Classifier**: accepts PEM, raw DER, and header-less base64 certificates
//! - **Subject hashing**: OpenSSL-compatible canonical subject name hashes
//! - **Link allocation**: deterministic `<subjecthash>.<n>` link names
//! - **SyncEngine**: read-only check and converging apply for a target root
//!
//! # Architecture
//!
//! `trust-core` sits above the filesystem primitives; a CLI or resource
//! layer would sit above it:
//!
//! ```text
//!   resource layer (out of scope)
//!               |
//!          trust-core
//!               |
//!           trust-fs
//! ```
//!
//! # Example
//!
//! ```ignore
//! use trust_core::{SyncEngine, build_desired_state};
//!
//! fn reconcile() -> trust_core::Result<()> {
//!     let desired = build_desired_state("/etc/pki/source".as_ref(), true)?;
//!     let engine = SyncEngine::new("/etc/pki/cacerts");
//!     if !engine.check(&desired, true)?.in_sync() {
//!         engine.apply(&desired, true)?;
//!     }
//!     Ok(())
//! }
//! ```

pub mod bundle;
pub mod cert;
pub mod error;
pub mod links;
pub mod name_hash;
pub mod state;
pub mod sync;

pub use cert::{CertificateEntry, NotACertificate};
pub use error::{Error, Result};
pub use links::LinkAssignment;
pub use state::{DesiredState, build_desired_state};
pub use sync::{ApplyReport, CheckReport, CheckStatus, DriftItem, EntryKind, SyncEngine};
