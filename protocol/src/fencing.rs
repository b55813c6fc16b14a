//! Version fencing for submitted choices
//!
//! The authority runs [`check_fence`] on every choice it reads back from
//! the store. A choice computed against stale metadata is discarded rather
//! than applied to a turn its author never saw.

use thiserror::Error;

use crate::client::{ChoiceKey, TurnChoice};
use crate::server::{Phase, SessionMeta};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FenceError {
    #[error("Choice arrived while battle is {0}")]
    NotChoosing(Phase),

    #[error("Choice is for turn {choice} but battle is on turn {current}")]
    WrongTurn { choice: u32, current: u32 },

    #[error("Choice was made against version {client} but battle is at version {current}")]
    StaleVersion { client: u64, current: u64 },

    #[error("{0} is not seated in this battle")]
    NotParticipant(String),
}

/// Check a stored choice against the authority's current metadata
pub fn check_fence(meta: &SessionMeta, key: &ChoiceKey, choice: &TurnChoice) -> Result<(), FenceError> {
    if !meta.is_choosing() {
        return Err(FenceError::NotChoosing(meta.phase));
    }

    if !meta.is_participant(&key.player) {
        return Err(FenceError::NotParticipant(key.player.to_string()));
    }

    if key.turn != meta.turn {
        return Err(FenceError::WrongTurn {
            choice: key.turn,
            current: meta.turn,
        });
    }

    if choice.client_version != meta.version {
        return Err(FenceError::StaleVersion {
            client: choice.client_version,
            current: meta.version,
        });
    }

    Ok(())
}
