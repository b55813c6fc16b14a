//! Per-move legality verdicts

use std::borrow::Cow;

/// Why a move is currently unusable
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum BlockReason {
    /// Zero remaining uses
    NoUsesLeft,
    /// The active combatant must recharge this turn
    MustRecharge,
    /// Locked into a different move
    LockedToPriorChoice,
    /// Forced to repeat a different move
    MustRepeat,
    /// This move is currently disabled
    Blocked,
    /// Non-damaging move under forced silence
    Silenced,
    /// The authority already marked the move unusable
    Authority(Option<String>),
}

impl BlockReason {
    /// Human-readable explanation
    pub fn as_str(&self) -> Cow<'_, str> {
        match self {
            BlockReason::NoUsesLeft => "No uses left".into(),
            BlockReason::MustRecharge => "Must recharge".into(),
            BlockReason::LockedToPriorChoice => "Locked to prior choice".into(),
            BlockReason::MustRepeat => "Must repeat".into(),
            BlockReason::Blocked => "Blocked".into(),
            BlockReason::Silenced => "Silenced".into(),
            BlockReason::Authority(Some(reason)) if !reason.is_empty() => reason.as_str().into(),
            BlockReason::Authority(_) => "Unavailable".into(),
        }
    }
}

impl std::fmt::Display for BlockReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_str())
    }
}

/// Legality hint for one known move of the active combatant
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MoveVerdict {
    pub id: String,
    pub pp: u32,
    pub max_pp: u32,
    pub disabled: bool,
    pub reason: Option<BlockReason>,
}

impl MoveVerdict {
    pub fn allowed(id: impl Into<String>, pp: u32, max_pp: u32) -> Self {
        Self {
            id: id.into(),
            pp,
            max_pp,
            disabled: false,
            reason: None,
        }
    }

    pub fn blocked(id: impl Into<String>, pp: u32, max_pp: u32, reason: BlockReason) -> Self {
        Self {
            id: id.into(),
            pp,
            max_pp,
            disabled: true,
            reason: Some(reason),
        }
    }

    /// Reason text, if the move is disabled
    pub fn reason_text(&self) -> Option<String> {
        self.reason.as_ref().map(|r| r.as_str().into_owned())
    }
}
