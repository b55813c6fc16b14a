//! Perspective views and legality hints for synchronized battles.
//!
//! # Overview
//!
//! `tandem-battle` sits between `tandem-protocol` (document shapes) and the
//! async session layer:
//!
//! ```text
//! tandem-protocol (documents)
//!        │
//!        ▼
//! tandem-battle (views + legality) ← THIS CRATE
//!        │
//!        └─> tandem-client (replica, submitter, session facade)
//! ```
//!
//! Everything here is synchronous and pure.
//!
//! # Main Types
//!
//! - [`BattleView`] - one player's combined view of meta, public and private documents
//! - [`LegalActions`] - move verdicts and switch targets for the current decision
//! - [`MoveVerdict`] / [`BlockReason`] - why a move is or is not usable
//! - [`project_side`] - redact a private mirror into the public side
//!
//! # Example Usage
//!
//! ```ignore
//! use tandem_battle::BattleView;
//!
//! if let Some(legal) = view.legal_actions() {
//!     for verdict in &legal.moves {
//!         println!("{}: {:?}", verdict.id, verdict.reason_text());
//!     }
//! } else {
//!     println!("loading...");
//! }
//! ```
//!
//! Legality verdicts are hints. The authority validates every choice on its
//! own and remains the only gate.

pub mod legality;
pub mod query;
pub mod tracking;
pub mod types;

pub use legality::{LegalActions, resolve_moves, switch_targets};
pub use query::{project_side, revealed_moves};
pub use tracking::BattleView;
pub use types::{BlockReason, MoveVerdict, classify, is_non_damaging, normalize_id, same_move};

pub use tandem_protocol::{MoveCategory, Phase, Player, PlayerId};
