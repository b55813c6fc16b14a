//! Version-fenced choice submission

use std::sync::Arc;

use tandem_battle::{BattleView, switch_targets};
use tandem_protocol::{ChoiceAction, ChoiceKey, TurnChoice};

use crate::config::WritePolicy;
use crate::error::SessionError;
use crate::receiver::SessionEvent;
use crate::replica::StateReplica;
use crate::store::{DocumentStore, StoreError};

/// Writes turn choices to the store on behalf of one player.
///
/// A choice is only sent while the battle is accepting choices. It goes to
/// the slot of the turn the replica currently shows, carrying whatever
/// `client_version` the caller stamped on it; the authority discards it if
/// that version is stale.
#[derive(Clone)]
pub struct ChoiceSubmitter {
    store: Arc<dyn DocumentStore>,
    replica: StateReplica,
    policy: WritePolicy,
}

impl ChoiceSubmitter {
    pub fn new(store: Arc<dyn DocumentStore>, replica: StateReplica, policy: WritePolicy) -> Self {
        Self {
            store,
            replica,
            policy,
        }
    }

    /// Submit a choice for the current turn, replacing any earlier one
    pub async fn submit(&self, choice: TurnChoice) -> Result<(), SessionError> {
        let key = self.prepare(&self.replica.view(), &choice)?;

        tracing::debug!(
            key = %key,
            action = choice.action.kind(),
            client_version = choice.client_version,
            "Submitting choice"
        );
        self.write_with_retry(&key, &choice).await?;

        if self.replica.is_closed() {
            tracing::debug!(key = %key, "Session closed before the choice settled, ignoring");
            return Ok(());
        }

        tracing::info!(
            key = %key,
            action = choice.action.kind(),
            client_version = choice.client_version,
            "Choice committed"
        );
        self.replica.emit(SessionEvent::ChoiceCommitted {
            turn: key.turn,
            choice,
        });
        Ok(())
    }

    /// Local checks; nothing is written when these fail
    fn prepare(&self, view: &BattleView, choice: &TurnChoice) -> Result<ChoiceKey, SessionError> {
        if self.replica.is_closed() {
            return Err(SessionError::Closed);
        }

        let meta = view.meta.as_ref().ok_or(SessionError::NoMetadata)?;

        if !meta.is_choosing() {
            return Err(SessionError::WrongPhase { phase: meta.phase });
        }

        if !meta.is_participant(view.identity()) {
            return Err(SessionError::NotParticipant(view.identity().clone()));
        }

        if let ChoiceAction::Switch { switch_to_index } = choice.action {
            let legal = view
                .private
                .as_ref()
                .map(|private| switch_targets(private).contains(&switch_to_index))
                .unwrap_or(false);
            if !legal {
                return Err(SessionError::IllegalSwitch {
                    index: switch_to_index,
                });
            }
        }

        Ok(ChoiceKey::new(
            self.replica.battle_id().clone(),
            meta.turn,
            view.identity().clone(),
        ))
    }

    /// Write with backoff on transient errors. Gives up quietly once the
    /// session is closed, so nothing reaches the store after teardown.
    async fn write_with_retry(&self, key: &ChoiceKey, choice: &TurnChoice) -> Result<(), StoreError> {
        let mut delay = self.policy.initial_delay;
        let mut attempt = 1;

        loop {
            match self.store.write_choice(key, choice).await {
                Ok(()) => return Ok(()),
                Err(e) if e.is_transient() && attempt < self.policy.max_attempts => {
                    tracing::warn!(
                        key = %key,
                        attempt = attempt,
                        max_attempts = self.policy.max_attempts,
                        error = %e,
                        "Choice write failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    if self.replica.is_closed() {
                        tracing::debug!(
                            key = %key,
                            attempt = attempt,
                            "Session closed during backoff, dropping choice"
                        );
                        return Ok(());
                    }
                    attempt += 1;
                    delay = self.policy.next_delay(delay);
                }
                Err(e) => {
                    tracing::warn!(key = %key, attempt = attempt, error = %e, "Choice write failed");
                    return Err(e);
                }
            }
        }
    }
}
