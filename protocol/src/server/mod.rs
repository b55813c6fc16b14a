mod meta;
mod private;
mod public;

use serde::de::DeserializeOwned;

use crate::DecodeError;
use crate::path::StreamKind;

pub use meta::{EndReason, Phase, Player, PlayerId, PlayerRef, Players, SessionMeta};
pub use private::{
    BaseStats, ChoiceLock, DEFAULT_MOVE_PP, DisableRecord, MoveCategory, MoveEntry, PrivateMirror,
    RosterMember,
};
pub use public::{
    FieldState, Hazards, Hp, PublicBenchEntry, PublicCombatant, PublicProjection, PublicSide,
    PublicVolatiles, Screens, StatStages, Status, TurnsLeft,
};

/// Decode a document delivered on `stream`
pub fn decode_document<T: DeserializeOwned>(
    stream: StreamKind,
    value: serde_json::Value,
) -> Result<T, DecodeError> {
    serde_json::from_value(value).map_err(|source| DecodeError::InvalidDocument { stream, source })
}
