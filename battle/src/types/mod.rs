//! Domain types for legality hints

mod category;
mod verdict;

pub use category::{classify, is_non_damaging, normalize_id, same_move};
pub use verdict::{BlockReason, MoveVerdict};
