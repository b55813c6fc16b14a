//! Query helpers over private state
//!
//! This module derives what a player's side looks like to everyone else.

mod projection;

pub use projection::{project_side, revealed_moves};
