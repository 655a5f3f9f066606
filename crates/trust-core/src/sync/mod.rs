//! Target-root reconciliation
//!
//! [`check`] reports drift without modifying anything; [`engine`] holds
//! the engine that produces reports and converges the target.
//!
//! [`check`]: crate::sync::check

pub mod check;
pub mod engine;

pub use check::{CheckReport, CheckStatus, DriftItem, EntryKind};
pub use engine::{ApplyReport, SyncEngine};
