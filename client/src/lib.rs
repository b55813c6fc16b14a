//! Live battle sessions over a replicated document store.
//!
//! A [`BattleSession`] keeps one player's copy of a battle in sync: it
//! subscribes to the meta, public and private documents, tracks the
//! authority's clock for the turn countdown, and writes version-fenced
//! choices back to the store.
//!
//! ```ignore
//! let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
//! let (session, mut events) =
//!     BattleSession::open(store, BattleId::new("b1"), Some(me), SessionConfig::default()).await?;
//!
//! tokio::spawn(async move { events.run(&mut MyHandler).await });
//!
//! if let Some(moves) = session.legal_moves() {
//!     if let Some(first) = moves.iter().find(|m| !m.disabled) {
//!         session.choose_move(&first.id, None).await?;
//!     }
//! }
//! ```

mod clock;
mod config;
mod error;
mod handler;
mod memory;
mod receiver;
mod replica;
mod session;
mod store;
mod submit;

pub use clock::{ClockSync, LocalClock, ManualClock, SystemClock};
pub use config::{
    CLOCK_REFRESH_ENV, ClockPolicy, SessionConfig, WRITE_ATTEMPTS_ENV, WRITE_BACKOFF_ENV,
    WritePolicy,
};
pub use error::SessionError;
pub use handler::SessionHandler;
pub use memory::{MemoryStore, WriteHold};
pub use receiver::{SessionEvent, SessionReceiver};
pub use replica::StateReplica;
pub use session::{BattleSession, SessionStatus};
pub use store::{DocumentStore, StoreError, StoreItem, Subscription};
pub use submit::ChoiceSubmitter;

pub use tandem_battle::{BattleView, BlockReason, LegalActions, MoveVerdict};
pub use tandem_protocol::{
    BattleId, ChoiceAction, ChoiceKey, DocumentPath, Phase, Player, PlayerId, StreamKind,
    TurnChoice,
};
