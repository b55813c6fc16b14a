//! Store paths for battle documents

use serde::{Deserialize, Serialize};

use crate::client::ChoiceKey;
use crate::server::PlayerId;

/// Path of the store's server-clock offset read-back
pub const SERVER_TIME_OFFSET_PATH: &str = ".info/serverTimeOffset";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BattleId(pub String);

impl BattleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BattleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The three streams a player subscribes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    Meta,
    Public,
    Private,
}

impl StreamKind {
    pub const ALL: [StreamKind; 3] = [StreamKind::Meta, StreamKind::Public, StreamKind::Private];

    pub fn as_str(&self) -> &'static str {
        match self {
            StreamKind::Meta => "meta",
            StreamKind::Public => "public",
            StreamKind::Private => "private",
        }
    }

    /// Position in per-stream arrays
    pub fn index(&self) -> usize {
        match self {
            StreamKind::Meta => 0,
            StreamKind::Public => 1,
            StreamKind::Private => 2,
        }
    }
}

impl std::fmt::Display for StreamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A keyed document in the store
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DocumentPath {
    Meta(BattleId),
    Public(BattleId),
    Private(BattleId, PlayerId),
    Choice(ChoiceKey),
}

impl DocumentPath {
    /// Path of the stream `kind` as seen by `me`
    pub fn for_stream(kind: StreamKind, battle: &BattleId, me: &PlayerId) -> Self {
        match kind {
            StreamKind::Meta => DocumentPath::Meta(battle.clone()),
            StreamKind::Public => DocumentPath::Public(battle.clone()),
            StreamKind::Private => DocumentPath::Private(battle.clone(), me.clone()),
        }
    }
}

impl std::fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentPath::Meta(battle) => write!(f, "battles/{}/meta", battle),
            DocumentPath::Public(battle) => write!(f, "battles/{}/public", battle),
            DocumentPath::Private(battle, uid) => write!(f, "battles/{}/private/{}", battle, uid),
            DocumentPath::Choice(key) => write!(f, "{}", key),
        }
    }
}
