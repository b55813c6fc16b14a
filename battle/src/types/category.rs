//! Damage-class classification for legality checks

use tandem_protocol::{MoveCategory, MoveEntry};

/// Normalized id fragments of common non-damaging moves.
///
/// Only consulted when the authority did not tag the move with a
/// [`MoveCategory`]. Matching is by substring, so "toxic" also covers
/// "toxic-spikes" and "protect" covers "max-protect".
const NON_DAMAGING_FRAGMENTS: &[&str] = &[
    "protect",
    "substitute",
    "swordsdance",
    "toxic",
    "roost",
    "recover",
    "willowisp",
    "calmmind",
    "nastyplot",
    "spikes",
    "stealthrock",
    "taunt",
    "defog",
];

/// Normalize a move id: lowercase, no spaces, dashes, underscores or apostrophes
pub fn normalize_id(id: &str) -> String {
    id.to_lowercase().replace([' ', '-', '_', '\''], "")
}

/// Check whether two ids name the same move after normalization
pub fn same_move(a: &str, b: &str) -> bool {
    normalize_id(a) == normalize_id(b)
}

/// Best-effort damage class of a move entry
///
/// Returns `Some(MoveCategory::Status)` for untagged moves whose id looks
/// non-damaging, and `None` when nothing is known.
pub fn classify(entry: &MoveEntry) -> Option<MoveCategory> {
    if entry.category.is_some() {
        return entry.category;
    }

    let normalized = normalize_id(&entry.id);
    NON_DAMAGING_FRAGMENTS
        .iter()
        .any(|fragment| normalized.contains(fragment))
        .then_some(MoveCategory::Status)
}

/// Check whether a move is blocked by forced silence
pub fn is_non_damaging(entry: &MoveEntry) -> bool {
    classify(entry).is_some_and(|c| !c.is_damaging())
}
