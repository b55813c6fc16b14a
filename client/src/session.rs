//! BattleSession - the facade a UI talks to

use std::sync::{Arc, Mutex};

use tandem_battle::{BattleView, MoveVerdict};
use tandem_protocol::{BattleId, Phase, Player, PlayerId, TurnChoice};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::clock::{ClockSync, LocalClock, SystemClock};
use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::receiver::SessionReceiver;
use crate::replica::StateReplica;
use crate::store::DocumentStore;
use crate::submit::ChoiceSubmitter;

/// Whether every document has arrived
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Loading,
    Ready,
    Closed,
}

/// One player's live connection to a battle.
///
/// Opening a session subscribes to the battle's documents and starts the
/// clock feed; dropping it (or calling [`close`](Self::close)) stops both.
/// Everything read through the session reflects the latest documents the
/// store has pushed. Phase changes only ever come from the authority.
pub struct BattleSession {
    replica: StateReplica,
    submitter: ChoiceSubmitter,
    clock: Arc<ClockSync>,
    clock_task: Mutex<Option<JoinHandle<()>>>,
    /// Last reported countdown and the meta version it was computed for
    countdown: Mutex<Option<(u64, u64)>>,
}

impl BattleSession {
    /// Open a session using the system clock
    pub async fn open(
        store: Arc<dyn DocumentStore>,
        battle_id: BattleId,
        identity: Option<PlayerId>,
        config: SessionConfig,
    ) -> Result<(Self, SessionReceiver), SessionError> {
        Self::open_with_clock(store, battle_id, identity, config, Arc::new(SystemClock)).await
    }

    /// Open a session with an injected local clock
    pub async fn open_with_clock(
        store: Arc<dyn DocumentStore>,
        battle_id: BattleId,
        identity: Option<PlayerId>,
        config: SessionConfig,
        local: Arc<dyn LocalClock>,
    ) -> Result<(Self, SessionReceiver), SessionError> {
        let identity = identity.ok_or(SessionError::NotAuthenticated)?;

        tracing::info!(battle_id = %battle_id, player = %identity, "Opening battle session");

        let clock = Arc::new(ClockSync::new(local));
        clock.refresh(store.as_ref()).await;
        let clock_task = clock.spawn_refresh(store.clone(), config.clock.refresh_interval);

        let (replica, receiver) = StateReplica::open(store.as_ref(), battle_id, identity);
        let submitter = ChoiceSubmitter::new(store, replica.clone(), config.write);

        let session = Self {
            replica,
            submitter,
            clock,
            clock_task: Mutex::new(Some(clock_task)),
            countdown: Mutex::new(None),
        };
        Ok((session, receiver))
    }

    pub fn battle_id(&self) -> &BattleId {
        self.replica.battle_id()
    }

    /// Current view of the three documents
    pub fn snapshot(&self) -> BattleView {
        self.replica.view()
    }

    pub fn status(&self) -> SessionStatus {
        if self.replica.is_closed() {
            SessionStatus::Closed
        } else if self.replica.is_ready() {
            SessionStatus::Ready
        } else {
            SessionStatus::Loading
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status() == SessionStatus::Ready
    }

    /// Phase from the latest metadata
    pub fn phase(&self) -> Option<Phase> {
        self.snapshot().phase()
    }

    /// Our slot, once metadata names us
    pub fn perspective(&self) -> Option<Player> {
        self.snapshot().perspective()
    }

    /// Latest stream error, if any stream is currently failing
    pub fn last_error(&self) -> Option<SessionError> {
        self.replica.last_error()
    }

    /// Watch channel that ticks on every document update
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.replica.subscribe()
    }

    /// Estimated authority time in epoch milliseconds
    pub fn server_now_millis(&self) -> i64 {
        self.clock.now_millis()
    }

    /// Whole seconds left before the turn deadline.
    ///
    /// Zero unless choices are being accepted and a deadline is set. For a
    /// given metadata version the value never goes up, even if a clock
    /// refresh moves the estimated authority time backwards.
    pub fn time_remaining_seconds(&self) -> u64 {
        let view = self.snapshot();
        let Some(meta) = view.meta.as_ref() else {
            return 0;
        };
        if !meta.is_choosing() || meta.deadline_at == 0 {
            return 0;
        }

        let remaining_ms = meta.deadline_at.saturating_sub(self.clock.now_millis());
        let seconds = if remaining_ms <= 0 {
            0
        } else {
            (remaining_ms as u64).div_ceil(1000)
        };

        let mut countdown = self.countdown.lock().unwrap_or_else(|p| p.into_inner());
        let seconds = match *countdown {
            Some((version, last)) if version == meta.version => seconds.min(last),
            _ => seconds,
        };
        *countdown = Some((meta.version, seconds));
        seconds
    }

    /// Move verdicts for our active combatant, or `None` while loading
    pub fn legal_moves(&self) -> Option<Vec<MoveVerdict>> {
        self.snapshot().legal_actions().map(|legal| legal.moves)
    }

    /// Roster indices we may switch to, or `None` while loading
    pub fn legal_switch_targets(&self) -> Option<Vec<usize>> {
        self.snapshot().legal_actions().map(|legal| legal.switches)
    }

    /// Choose a move. Without a target, the opponent's slot is used.
    pub async fn choose_move(
        &self,
        move_id: impl Into<String>,
        target: Option<Player>,
    ) -> Result<(), SessionError> {
        let view = self.snapshot();
        let version = fencing_version(&view)?;
        let target = match target {
            Some(target) => target,
            None => view
                .perspective()
                .map(|slot| slot.opponent())
                .ok_or_else(|| SessionError::NotParticipant(view.identity().clone()))?,
        };
        self.submit(TurnChoice::move_to(move_id, target, version)).await
    }

    /// Choose to switch to roster index `index`
    pub async fn choose_switch(&self, index: usize) -> Result<(), SessionError> {
        let version = fencing_version(&self.snapshot())?;
        self.submit(TurnChoice::switch_to(index, version)).await
    }

    pub async fn forfeit(&self) -> Result<(), SessionError> {
        let version = fencing_version(&self.snapshot())?;
        self.submit(TurnChoice::forfeit(version)).await
    }

    /// Submit a prepared choice as-is, including its `client_version`
    pub async fn submit(&self, choice: TurnChoice) -> Result<(), SessionError> {
        self.submitter.submit(choice).await
    }

    /// Stop the subscriptions and the clock feed. Idempotent.
    pub fn close(&self) {
        if let Some(task) = self.clock_task.lock().unwrap_or_else(|p| p.into_inner()).take() {
            task.abort();
        }
        if !self.replica.is_closed() {
            tracing::info!(battle_id = %self.battle_id(), "Closing battle session");
        }
        self.replica.close();
    }
}

impl Drop for BattleSession {
    fn drop(&mut self) {
        self.close();
    }
}

/// Metadata version to stamp on a new choice
fn fencing_version(view: &BattleView) -> Result<u64, SessionError> {
    view.version().ok_or(SessionError::NoMetadata)
}
