//! Deterministic selection among duplicate manifest entries.
//!
//! Entries sharing a label set behave like a multi-value register; picking is
//! the register's merge function. It is a maximum over the total order
//! `(mod_time, id)`, so every reader picks the same entry from the same set
//! regardless of the order the backend listed it in.

use std::cmp::Ordering;

use crate::model::{EntryMetadata, ManifestId};

/// Total order used to rank entries: later `mod_time` first, then greater id.
#[must_use]
pub fn compare_entries(left: &EntryMetadata, right: &EntryMetadata) -> Ordering {
    left.mod_time
        .cmp(&right.mod_time)
        .then_with(|| left.id.cmp(&right.id))
}

/// Pick the identifier of the latest entry, or `None` for an empty slice.
///
/// Callers are expected to handle the empty case before picking.
#[must_use]
pub fn pick_latest_id(entries: &[EntryMetadata]) -> Option<ManifestId> {
    pick_latest(entries).map(|entry| entry.id.clone())
}

/// Borrowing variant of [`pick_latest_id`].
#[must_use]
pub fn pick_latest(entries: &[EntryMetadata]) -> Option<&EntryMetadata> {
    entries.iter().max_by(|left, right| compare_entries(left, right))
}
