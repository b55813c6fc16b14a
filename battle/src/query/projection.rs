//! Redacting a private mirror into a public side

use std::collections::{BTreeMap, BTreeSet};

use tandem_protocol::{
    PrivateMirror, PublicBenchEntry, PublicCombatant, PublicSide, PublicVolatiles, RosterMember,
    StatStages,
};

/// Moves of `member` that appear in `revealed`, in roster order.
///
/// Ids in `revealed` that the member does not actually know are dropped,
/// so a bad reveal list can never invent moves.
pub fn revealed_moves(member: &RosterMember, revealed: &BTreeSet<String>) -> Vec<String> {
    member
        .moves
        .iter()
        .filter(|m| revealed.contains(&m.id))
        .map(|m| m.id.clone())
        .collect()
}

/// Build the public side for a private mirror.
///
/// `revealed` maps roster indices to the move ids that have been used in
/// front of the opponent. Remaining uses, item, ability and unrevealed
/// moves are dropped. Returns `None` when the roster is empty.
pub fn project_side(
    mirror: &PrivateMirror,
    volatiles: PublicVolatiles,
    boosts: StatStages,
    revealed: &BTreeMap<usize, BTreeSet<String>>,
) -> Option<PublicSide> {
    let active = mirror.active()?;
    let empty = BTreeSet::new();

    let bench_public = mirror
        .bench()
        .map(|(idx, member)| PublicBenchEntry {
            species: member.species.clone(),
            fainted: !member.is_alive(),
            revealed_moves: revealed_moves(member, revealed.get(&idx).unwrap_or(&empty)),
        })
        .collect();

    Some(PublicSide {
        active: PublicCombatant {
            species: active.species.clone(),
            level: active.level,
            types: active.types.clone(),
            hp: active.hp,
            status: active.status,
            boosts,
            volatiles,
        },
        bench_public,
    })
}
