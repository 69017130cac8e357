//! Ordering and de-duplication of collected status entries.

use std::collections::HashSet;

use super::record::StatusEntry;

/// Returns EPP-linked entries first, then the rest, keeping the first
/// occurrence of every status token (compared case-insensitively).
///
/// Relative order inside each group is preserved. A free-text entry whose token
/// already appeared as an EPP entry is dropped.
pub fn dedup_statuses(entries: Vec<StatusEntry>) -> Vec<StatusEntry> {
    let (epp, other): (Vec<_>, Vec<_>) = entries.into_iter().partition(|e| e.is_epp_linked());

    let mut seen = HashSet::new();
    epp.into_iter()
        .chain(other)
        .filter(|entry| seen.insert(entry.status.to_lowercase()))
        .collect()
}
