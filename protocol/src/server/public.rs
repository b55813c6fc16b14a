//! Public projection document (`battles/{id}/public`)
//!
//! Everything here is visible to both players. None of these types has a
//! field that could carry remaining-uses counters, held item or ability
//! identity, or unrevealed moves; private data lives in
//! [`PrivateMirror`](super::PrivateMirror) only.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::meta::PlayerId;

/// Current and maximum HP
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hp {
    pub cur: u32,
    pub max: u32,
}

impl Hp {
    pub fn new(cur: u32, max: u32) -> Self {
        Self { cur, max }
    }

    /// Get HP as percentage (0-100)
    pub fn percent(&self) -> u32 {
        if self.max == 0 {
            return 0;
        }
        let percent = u64::from(self.cur) * 100 / u64::from(self.max);
        percent.min(100) as u32
    }

    pub fn is_empty(&self) -> bool {
        self.cur == 0
    }
}

/// Non-volatile status conditions (persist through switching)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "PAR")]
    Paralysis,
    #[serde(rename = "PSN")]
    Poison,
    #[serde(rename = "BRN")]
    Burn,
    #[serde(rename = "SLP")]
    Sleep,
    #[serde(rename = "FRZ")]
    Freeze,
}

impl Status {
    /// Parse from document code ("PAR", "PSN", "BRN", "SLP", "FRZ")
    pub fn from_protocol(s: &str) -> Option<Self> {
        match s {
            "PAR" => Some(Status::Paralysis),
            "PSN" => Some(Status::Poison),
            "BRN" => Some(Status::Burn),
            "SLP" => Some(Status::Sleep),
            "FRZ" => Some(Status::Freeze),
            _ => None,
        }
    }

    pub fn to_protocol(&self) -> &'static str {
        match self {
            Status::Paralysis => "PAR",
            Status::Poison => "PSN",
            Status::Burn => "BRN",
            Status::Sleep => "SLP",
            Status::Freeze => "FRZ",
        }
    }

    /// Get display name
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Paralysis => "Paralysis",
            Status::Poison => "Poison",
            Status::Burn => "Burn",
            Status::Sleep => "Sleep",
            Status::Freeze => "Freeze",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Stat stages (-6 to +6)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatStages {
    pub atk: i8,
    pub def: i8,
    pub spa: i8,
    pub spd: i8,
    pub spe: i8,
    #[serde(alias = "acc")]
    pub accuracy: i8,
    #[serde(alias = "eva")]
    pub evasion: i8,
}

impl StatStages {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Remaining duration of a timed volatile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnsLeft {
    pub turns_left: u32,
}

/// Short-lived flags on the active combatant that both players can see
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PublicVolatiles {
    /// Forced silence: non-damaging moves are unusable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub taunt: Option<TurnsLeft>,

    /// Forced repeat of the last move (exact move lives in the private mirror)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encore: Option<TurnsLeft>,

    /// Must recharge this turn
    pub recharge: bool,

    /// Last action was a block (consecutive protection tends to fail)
    pub protect_used_last_turn: bool,

    /// Remaining substitute HP
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_hp: Option<u32>,
}

impl PublicVolatiles {
    pub fn is_silenced(&self) -> bool {
        self.taunt.is_some()
    }

    pub fn must_recharge(&self) -> bool {
        self.recharge
    }
}

/// Public attributes of a side's active combatant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicCombatant {
    pub species: String,
    pub level: u8,
    #[serde(default)]
    pub types: Vec<String>,
    pub hp: Hp,
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default)]
    pub boosts: StatStages,
    #[serde(default)]
    pub volatiles: PublicVolatiles,
}

/// A benched roster member as seen by everyone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicBenchEntry {
    pub species: String,
    #[serde(default)]
    pub fainted: bool,
    /// Moves that have been used in front of the opponent
    #[serde(default)]
    pub revealed_moves: Vec<String>,
}

/// One player's side of the public projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicSide {
    pub active: PublicCombatant,
    #[serde(default)]
    pub bench_public: Vec<PublicBenchEntry>,
}

impl PublicSide {
    /// Count non-fainted members, active included
    pub fn alive_count(&self) -> usize {
        let active = usize::from(!self.active.hp.is_empty());
        active + self.bench_public.iter().filter(|b| !b.fainted).count()
    }
}

/// Entry hazards on one side
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Hazards {
    pub sr: bool,
    pub spikes: u8,
    pub t_spikes: u8,
    pub web: bool,
}

/// Screen turns remaining on one side
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Screens {
    pub reflect: u8,
    pub light_screen: u8,
}

/// Field conditions, each map keyed by the uid of the side it covers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldState {
    pub hazards: BTreeMap<PlayerId, Hazards>,
    pub screens: BTreeMap<PlayerId, Screens>,

    /// Turns of status protection left
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub safeguard: BTreeMap<PlayerId, u32>,

    /// Turns of stat-drop protection left
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub mist: BTreeMap<PlayerId, u32>,
}

/// The public projection of a battle
///
/// Sides sit at the top level of the document next to `field`, keyed by
/// the uid of the player who owns them. Map a slot to its uid through
/// [`Players::get`](super::Players::get).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicProjection {
    #[serde(default)]
    pub field: FieldState,

    /// Human-readable summary of the last resolved turn
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_result_summary: Option<String>,

    #[serde(flatten)]
    pub sides: BTreeMap<PlayerId, PublicSide>,
}

impl PublicProjection {
    pub fn side(&self, uid: &PlayerId) -> Option<&PublicSide> {
        self.sides.get(uid)
    }

    /// Volatile flags on a side's active combatant, empty if the side is missing
    pub fn volatiles(&self, uid: &PlayerId) -> PublicVolatiles {
        self.side(uid)
            .map(|s| s.active.volatiles.clone())
            .unwrap_or_default()
    }
}
