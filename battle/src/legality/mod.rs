//! Client-side legality hints
//!
//! These verdicts exist to render disabled affordances and to avoid
//! sending obviously illegal choices. They are NOT authoritative: the
//! authority re-validates every submitted choice, and nothing here should
//! be the only thing standing between a player and an illegal submission.

mod moves;
mod switches;

pub use moves::resolve_moves;
pub use switches::switch_targets;

use tandem_protocol::{PrivateMirror, PublicVolatiles};

use crate::types::MoveVerdict;

/// Legality hints for one decision point
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LegalActions {
    pub moves: Vec<MoveVerdict>,
    pub switches: Vec<usize>,
}

impl LegalActions {
    pub fn resolve(mirror: &PrivateMirror, volatiles: &PublicVolatiles) -> Self {
        Self {
            moves: resolve_moves(mirror, volatiles),
            switches: switch_targets(mirror),
        }
    }

    /// Moves that are not disabled
    pub fn usable_moves(&self) -> impl Iterator<Item = &MoveVerdict> {
        self.moves.iter().filter(|m| !m.disabled)
    }

    /// Check whether the player has nothing but a forfeit
    pub fn is_forced_pass(&self) -> bool {
        self.usable_moves().next().is_none() && self.switches.is_empty()
    }
}
