//! Private mirror document (`battles/{id}/private/{uid}`)
//!
//! Only the owning player can read their mirror. It carries exact
//! remaining uses and the move restriction records that the public
//! projection deliberately leaves out.

use serde::{Deserialize, Serialize};

use super::public::{Hp, Status};

/// Uses assumed for a move stored as a bare id
pub const DEFAULT_MOVE_PP: u32 = 20;

/// Damage class of a move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveCategory {
    Physical,
    Special,
    /// Non-damaging
    Status,
}

impl MoveCategory {
    pub fn is_damaging(&self) -> bool {
        !matches!(self, MoveCategory::Status)
    }
}

/// One known move with its exact remaining uses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawMoveEntry")]
pub struct MoveEntry {
    /// Move ID (lowercase, hyphenated, e.g. "swords-dance")
    pub id: String,

    /// Remaining uses
    pub pp: u32,

    pub max_pp: u32,

    /// Damage class, when the authority tags it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<MoveCategory>,

    /// Set by the authority when it already knows the move is unusable
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub disabled: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl MoveEntry {
    pub fn new(id: impl Into<String>, pp: u32, max_pp: u32) -> Self {
        Self {
            id: id.into(),
            pp,
            max_pp,
            category: None,
            disabled: false,
            reason: None,
        }
    }

    pub fn with_category(mut self, category: MoveCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn is_exhausted(&self) -> bool {
        self.pp == 0
    }
}

/// Move entries are stored either as a bare id or as a full object
#[derive(Deserialize)]
#[serde(untagged)]
enum RawMoveEntry {
    Id(String),
    Full(RawMoveObject),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMoveObject {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, alias = "remainingPp")]
    pp: Option<u32>,
    #[serde(default)]
    max_pp: Option<u32>,
    #[serde(default)]
    category: Option<MoveCategory>,
    #[serde(default)]
    disabled: bool,
    #[serde(default)]
    reason: Option<String>,
}

impl From<RawMoveEntry> for MoveEntry {
    fn from(raw: RawMoveEntry) -> Self {
        match raw {
            RawMoveEntry::Id(id) => MoveEntry::new(id.trim(), DEFAULT_MOVE_PP, DEFAULT_MOVE_PP),
            RawMoveEntry::Full(obj) => {
                let id = obj.id.or(obj.name).unwrap_or_default();
                let max_pp = obj.max_pp.or(obj.pp).unwrap_or(DEFAULT_MOVE_PP);
                MoveEntry {
                    id: id.trim().to_string(),
                    pp: obj.pp.unwrap_or(max_pp),
                    max_pp,
                    category: obj.category,
                    disabled: obj.disabled,
                    reason: obj.reason,
                }
            }
        }
    }
}

/// Base stats of a roster member
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseStats {
    pub hp: u32,
    pub atk: u32,
    pub def: u32,
    pub spa: u32,
    pub spd: u32,
    pub spe: u32,
}

/// A roster member with everything its owner is allowed to know
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawRosterMember")]
pub struct RosterMember {
    pub species: String,
    pub level: u8,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub stats: BaseStats,
    pub hp: Hp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ability: Option<String>,
    #[serde(default)]
    pub moves: Vec<MoveEntry>,
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default)]
    pub fainted: bool,
}

impl RosterMember {
    /// Check if this member can still fight
    pub fn is_alive(&self) -> bool {
        !self.fainted && self.hp.cur > 0
    }
}

/// Some authorities track current HP in `stats.hp` and omit the `hp` object
#[derive(Deserialize)]
struct RawRosterMember {
    species: String,
    level: u8,
    #[serde(default)]
    types: Vec<String>,
    #[serde(default)]
    stats: BaseStats,
    #[serde(default)]
    hp: Option<Hp>,
    #[serde(default)]
    item: Option<String>,
    #[serde(default)]
    ability: Option<String>,
    #[serde(default)]
    moves: Vec<MoveEntry>,
    #[serde(default)]
    status: Option<Status>,
    #[serde(default)]
    fainted: bool,
}

impl From<RawRosterMember> for RosterMember {
    fn from(raw: RawRosterMember) -> Self {
        RosterMember {
            hp: raw.hp.unwrap_or(Hp::new(raw.stats.hp, raw.stats.hp)),
            species: raw.species,
            level: raw.level,
            types: raw.types,
            stats: raw.stats,
            item: raw.item,
            ability: raw.ability,
            moves: raw.moves,
            status: raw.status,
            fainted: raw.fainted,
        }
    }
}

/// Restriction to a single move (e.g. a choice item)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceLock {
    #[serde(default)]
    pub move_id: Option<String>,
    #[serde(default)]
    pub locked: bool,
}

/// One move currently forbidden
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisableRecord {
    #[serde(default)]
    pub move_id: Option<String>,
    #[serde(default)]
    pub turns_left: Option<u32>,
}

/// A player's private view of their own side
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivateMirror {
    /// Full roster; index 0 is the active combatant
    #[serde(default)]
    pub team: Vec<RosterMember>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choice_lock: Option<ChoiceLock>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable: Option<DisableRecord>,

    /// Move the active combatant must repeat
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encore_move_id: Option<String>,
}

impl PrivateMirror {
    pub fn active(&self) -> Option<&RosterMember> {
        self.team.first()
    }

    /// Bench members with their roster indices (index 0 is never included)
    pub fn bench(&self) -> impl Iterator<Item = (usize, &RosterMember)> {
        self.team.iter().enumerate().skip(1)
    }

    /// Move the active combatant is locked into, if the lock is engaged
    pub fn locked_move(&self) -> Option<&str> {
        self.choice_lock
            .as_ref()
            .filter(|lock| lock.locked)
            .and_then(|lock| lock.move_id.as_deref())
    }

    pub fn blocked_move(&self) -> Option<&str> {
        self.disable.as_ref().and_then(|d| d.move_id.as_deref())
    }

    pub fn forced_move(&self) -> Option<&str> {
        self.encore_move_id.as_deref()
    }
}
