//! Documents written by players

use serde::{Deserialize, Serialize};

use crate::path::{BattleId, DocumentPath};
use crate::server::{Player, PlayerId};

/// What a player commits to for one turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "payload", rename_all = "lowercase")]
pub enum ChoiceAction {
    /// {"action":"move","payload":{"moveId":"...","target":"p2"}}
    #[serde(rename_all = "camelCase")]
    Move { move_id: String, target: Player },

    /// {"action":"switch","payload":{"switchToIndex":2}}
    #[serde(rename_all = "camelCase")]
    Switch { switch_to_index: usize },

    /// {"action":"forfeit","payload":{}}
    Forfeit {},
}

impl ChoiceAction {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Move { .. } => "move",
            Self::Switch { .. } => "switch",
            Self::Forfeit {} => "forfeit",
        }
    }
}

/// A turn choice tagged with the metadata version it was computed against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnChoice {
    #[serde(flatten)]
    pub action: ChoiceAction,

    /// Fencing token: `meta.version` observed when the choice was made
    pub client_version: u64,
}

impl TurnChoice {
    pub fn new(action: ChoiceAction, client_version: u64) -> Self {
        Self {
            action,
            client_version,
        }
    }

    pub fn move_to(move_id: impl Into<String>, target: Player, client_version: u64) -> Self {
        Self::new(
            ChoiceAction::Move {
                move_id: move_id.into(),
                target,
            },
            client_version,
        )
    }

    pub fn switch_to(index: usize, client_version: u64) -> Self {
        Self::new(
            ChoiceAction::Switch {
                switch_to_index: index,
            },
            client_version,
        )
    }

    pub fn forfeit(client_version: u64) -> Self {
        Self::new(ChoiceAction::Forfeit {}, client_version)
    }
}

/// Address of one player's choice slot for one turn
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChoiceKey {
    pub battle_id: BattleId,
    pub turn: u32,
    pub player: PlayerId,
}

impl ChoiceKey {
    pub fn new(battle_id: BattleId, turn: u32, player: PlayerId) -> Self {
        Self {
            battle_id,
            turn,
            player,
        }
    }

    pub fn path(&self) -> DocumentPath {
        DocumentPath::Choice(self.clone())
    }
}

impl std::fmt::Display for ChoiceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "battles/{}/turns/{}/choices/{}",
            self.battle_id, self.turn, self.player
        )
    }
}
