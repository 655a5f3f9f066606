//! Drift reports produced by check runs

use serde::{Deserialize, Serialize};

/// Overall verdict of a check run.
///
/// Variants are ordered by severity, worst last, so the report status is
/// simply the maximum over its findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    /// Target matches the desired layout exactly
    InSync,
    /// Entries present that the desired layout does not contain
    Extra,
    /// Desired entries absent from the target
    Missing,
    /// Entries present but with the wrong content or link target
    Drifted,
}

/// What kind of target entry a finding refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
    Bundle,
}

/// One entry that is out of step with the desired layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriftItem {
    /// Path relative to the target root
    pub path: String,
    pub kind: EntryKind,
    /// Short explanation of the finding
    pub description: String,
}

impl DriftItem {
    pub fn new(path: impl Into<String>, kind: EntryKind, description: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            description: description.into(),
        }
    }
}

/// Full result of a check run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckReport {
    pub status: CheckStatus,
    /// Desired entries the target lacks
    pub missing: Vec<DriftItem>,
    /// Entries present with wrong content or target
    pub drifted: Vec<DriftItem>,
    /// Entries a purging apply would remove
    pub extra: Vec<DriftItem>,
}

impl CheckReport {
    /// Assemble a report, deriving the status from the findings.
    pub fn from_parts(
        missing: Vec<DriftItem>,
        drifted: Vec<DriftItem>,
        extra: Vec<DriftItem>,
    ) -> Self {
        let mut status = CheckStatus::InSync;
        if !extra.is_empty() {
            status = status.max(CheckStatus::Extra);
        }
        if !missing.is_empty() {
            status = status.max(CheckStatus::Missing);
        }
        if !drifted.is_empty() {
            status = status.max(CheckStatus::Drifted);
        }
        Self {
            status,
            missing,
            drifted,
            extra,
        }
    }

    /// Whether the target needs no changes at all.
    pub fn in_sync(&self) -> bool {
        self.status == CheckStatus::InSync
    }
}
