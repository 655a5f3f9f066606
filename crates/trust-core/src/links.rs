//! Hash link-name allocation
//!
//! Assigns each certificate a `<subjecthash>.<n>` link name. Allocation
//! is a pure function of the entry order and the reserved-slot set, so
//! identical source trees always produce identical link maps.

use std::collections::{BTreeMap, BTreeSet};

use trust_fs::TreePath;

use crate::cert::CertificateEntry;

/// Mapping from source-relative path to the name its link gets in the
/// target root. An entry mapping to its own path gets no symlink.
pub type LinkAssignment = BTreeMap<TreePath, String>;

/// Slot indices already spoken for, per subject hash.
pub type ReservedSlots = BTreeMap<String, BTreeSet<u32>>;

/// Collect the slots that pre-hashed file names claim for themselves.
///
/// A file whose stem equals its own subject hash and whose extension is
/// a non-negative integer is pre-hashed; its index is off limits to
/// ordinary allocation even before the claiming entry is processed.
pub fn reserved_slots(entries: &[CertificateEntry]) -> ReservedSlots {
    let mut reserved = ReservedSlots::new();
    for entry in entries {
        if let Some(slot) = claimed_slot(entry) {
            reserved
                .entry(entry.subject_hash.clone())
                .or_default()
                .insert(slot);
        }
    }
    reserved
}

/// Assign a link name to every entry.
///
/// Entries are processed in the order given; the builder passes them in
/// lexicographic path order. A pre-hashed name keeps its own index when
/// it is first to claim it; everything else receives the smallest index
/// neither reserved nor already handed out for that hash.
///
/// With `generate_hash_links` disabled the mapping is the identity and
/// no link names are invented.
pub fn assign_links(
    entries: &[CertificateEntry],
    reserved: &ReservedSlots,
    generate_hash_links: bool,
) -> LinkAssignment {
    let mut assignment = LinkAssignment::new();

    if !generate_hash_links {
        for entry in entries {
            assignment.insert(entry.rel_path.clone(), entry.rel_path.as_str().to_string());
        }
        return assignment;
    }

    let mut taken: BTreeMap<&str, BTreeSet<u32>> = BTreeMap::new();
    for entry in entries {
        let hash = entry.subject_hash.as_str();
        let used = taken.entry(hash).or_default();
        let slot = match claimed_slot(entry) {
            Some(want) if !used.contains(&want) => want,
            _ => next_free(used, reserved.get(hash)),
        };
        used.insert(slot);
        assignment.insert(entry.rel_path.clone(), format!("{hash}.{slot}"));
    }
    assignment
}

fn claimed_slot(entry: &CertificateEntry) -> Option<u32> {
    if entry.rel_path.file_stem() == Some(entry.subject_hash.as_str()) {
        entry.rel_path.extension()?.parse().ok()
    } else {
        None
    }
}

fn next_free(used: &BTreeSet<u32>, reserved: Option<&BTreeSet<u32>>) -> u32 {
    let mut slot = 0u32;
    loop {
        let blocked =
            used.contains(&slot) || reserved.is_some_and(|r| r.contains(&slot));
        if !blocked {
            return slot;
        }
        slot += 1;
    }
}
