//! Document shapes for synchronized two-player battle sessions.
//!
//! The authority publishes three documents per battle and players write
//! one choice per turn:
//!
//! ```text
//! battles/{id}/meta                      SessionMeta       (everyone)
//! battles/{id}/public                    PublicProjection  (everyone)
//! battles/{id}/private/{uid}             PrivateMirror     (owner only)
//! battles/{id}/turns/{turn}/choices/{uid} TurnChoice       (written by owner)
//! ```

use thiserror::Error;

pub mod client;
pub mod fencing;
pub mod path;
pub mod server;

pub use client::{ChoiceAction, ChoiceKey, TurnChoice};
pub use fencing::{FenceError, check_fence};
pub use path::{BattleId, DocumentPath, SERVER_TIME_OFFSET_PATH, StreamKind};
pub use server::{
    BaseStats, ChoiceLock, DisableRecord, EndReason, FieldState, Hazards, Hp, MoveCategory,
    MoveEntry, Phase, Player, PlayerId, PlayerRef, Players, PrivateMirror, PublicBenchEntry,
    PublicCombatant, PublicProjection, PublicSide, PublicVolatiles, RosterMember, Screens,
    SessionMeta, StatStages, Status, TurnsLeft, decode_document,
};

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Invalid {stream} document: {source}")]
    InvalidDocument {
        stream: StreamKind,
        #[source]
        source: serde_json::Error,
    },
}
