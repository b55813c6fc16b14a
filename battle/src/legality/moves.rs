//! Move verdicts for the active combatant

use tandem_protocol::{MoveEntry, PrivateMirror, PublicVolatiles};

use crate::types::{BlockReason, MoveVerdict, is_non_damaging, same_move};

/// Annotate every known move of the active combatant.
///
/// Rules are checked in order and the first match wins:
///
/// 1. no remaining uses
/// 2. must recharge (blocks every move)
/// 3. locked into a different move
/// 4. forced to repeat a different move
/// 5. this move is blocked
/// 6. silenced and the move is non-damaging
/// 7. the authority already flagged the move
///
/// Rules 3 and 4 compare ids exactly, so a formatting mismatch leaves the
/// move disabled. Rule 5 compares normalized ids, so a formatting mismatch
/// still disables it. Either way an uncertain match errs toward disabled.
///
/// Returns an empty list when the mirror has no active combatant.
pub fn resolve_moves(mirror: &PrivateMirror, volatiles: &PublicVolatiles) -> Vec<MoveVerdict> {
    let Some(active) = mirror.active() else {
        return Vec::new();
    };

    active
        .moves
        .iter()
        .map(|entry| match block_reason(entry, mirror, volatiles) {
            Some(reason) => MoveVerdict::blocked(&entry.id, entry.pp, entry.max_pp, reason),
            None => MoveVerdict::allowed(&entry.id, entry.pp, entry.max_pp),
        })
        .collect()
}

fn block_reason(
    entry: &MoveEntry,
    mirror: &PrivateMirror,
    volatiles: &PublicVolatiles,
) -> Option<BlockReason> {
    if entry.is_exhausted() {
        return Some(BlockReason::NoUsesLeft);
    }

    if volatiles.must_recharge() {
        return Some(BlockReason::MustRecharge);
    }

    if mirror.locked_move().is_some_and(|locked| locked != entry.id) {
        return Some(BlockReason::LockedToPriorChoice);
    }

    if mirror.forced_move().is_some_and(|forced| forced != entry.id) {
        return Some(BlockReason::MustRepeat);
    }

    if mirror.blocked_move().is_some_and(|blocked| same_move(blocked, &entry.id)) {
        return Some(BlockReason::Blocked);
    }

    if volatiles.is_silenced() && is_non_damaging(entry) {
        return Some(BlockReason::Silenced);
    }

    if entry.disabled {
        return Some(BlockReason::Authority(entry.reason.clone()));
    }

    None
}
