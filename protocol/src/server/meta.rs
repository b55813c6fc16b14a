//! Session metadata document (`battles/{id}/meta`)

use serde::{Deserialize, Serialize};

/// Player slot in a battle (p1 or p2)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Player {
    P1,
    P2,
}

impl Player {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "p1" => Some(Player::P1),
            "p2" => Some(Player::P2),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Player::P1 => "p1",
            Player::P2 => "p2",
        }
    }

    /// The other slot
    pub fn opponent(&self) -> Self {
        match self {
            Player::P1 => Player::P2,
            Player::P2 => Player::P1,
        }
    }
}

impl std::fmt::Display for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable user identity as issued by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRef {
    pub uid: PlayerId,
}

/// Both seats of a battle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Players {
    pub p1: PlayerRef,
    pub p2: PlayerRef,
}

impl Players {
    pub fn get(&self, slot: Player) -> &PlayerId {
        match slot {
            Player::P1 => &self.p1.uid,
            Player::P2 => &self.p2.uid,
        }
    }

    /// Find which slot an identity occupies
    pub fn slot_of(&self, id: &PlayerId) -> Option<Player> {
        if &self.p1.uid == id {
            Some(Player::P1)
        } else if &self.p2.uid == id {
            Some(Player::P2)
        } else {
            None
        }
    }
}

/// Coordinator phase, advanced only by the authority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Both players may submit a choice for the current turn
    Choosing,
    /// The authority is resolving committed choices
    Resolving,
    Ended,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Choosing => "choosing",
            Phase::Resolving => "resolving",
            Phase::Ended => "ended",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a battle ended early
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndReason {
    Forfeit,
    Timeout,
}

/// Battle-wide metadata published by the authority.
///
/// `version` is bumped on every change and doubles as the fencing token
/// carried by submitted choices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMeta {
    /// Authority-clock creation time (epoch millis)
    #[serde(default)]
    pub created_at: Option<i64>,

    /// Battle format (e.g., "singles")
    #[serde(default)]
    pub format: String,

    /// Rule set identifier (e.g., "gen9-no-weather")
    #[serde(default)]
    pub rule_set: String,

    pub players: Players,

    pub phase: Phase,

    /// Current turn number
    pub turn: u32,

    pub version: u64,

    /// Authority-clock deadline for the current choosing phase (epoch millis)
    #[serde(default)]
    pub deadline_at: i64,

    #[serde(default)]
    pub winner_uid: Option<PlayerId>,

    #[serde(default)]
    pub ended_reason: Option<EndReason>,
}

impl SessionMeta {
    /// Check if choices are currently being accepted
    pub fn is_choosing(&self) -> bool {
        self.phase == Phase::Choosing
    }

    pub fn is_ended(&self) -> bool {
        self.phase == Phase::Ended
    }

    pub fn is_participant(&self, id: &PlayerId) -> bool {
        self.players.slot_of(id).is_some()
    }

    /// Identity of the player facing `id`, if `id` is seated
    pub fn opponent_of(&self, id: &PlayerId) -> Option<&PlayerId> {
        let slot = self.players.slot_of(id)?;
        Some(self.players.get(slot.opponent()))
    }
}
