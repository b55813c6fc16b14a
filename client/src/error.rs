use tandem_protocol::{Phase, PlayerId, StreamKind};
use thiserror::Error;

use crate::store::StoreError;

/// Errors surfaced by a [`BattleSession`](crate::BattleSession)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("No identity: sign in before opening a battle session")]
    NotAuthenticated,

    #[error("{0} is not a player in this battle")]
    NotParticipant(PlayerId),

    #[error("{stream} stream failed: {message}")]
    Subscription { stream: StreamKind, message: String },

    #[error("Choices are not accepted while the battle is {phase}")]
    WrongPhase { phase: Phase },

    #[error("Roster slot {index} cannot be switched in")]
    IllegalSwitch { index: usize },

    #[error("Battle metadata has not arrived yet")]
    NoMetadata,

    #[error("Session closed")]
    Closed,

    #[error(transparent)]
    Store(#[from] StoreError),
}
