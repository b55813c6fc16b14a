//! Perspective over the three replicated documents

mod view;

pub use view::BattleView;
