//! BattleView - one player's combined view of a battle

use std::sync::Arc;

use tandem_protocol::{
    Phase, Player, PlayerId, PrivateMirror, PublicProjection, PublicSide, PublicVolatiles,
    RosterMember, SessionMeta,
};

use crate::legality::LegalActions;

/// A battle as seen by one player
///
/// Each document is replicated independently, so a view can pair, for
/// example, a meta snapshot for turn 5 with a private mirror that still
/// describes turn 4. Accessors never assume the documents agree; anything
/// that needs two documents simply reflects whatever each one currently
/// says.
#[derive(Debug, Clone)]
pub struct BattleView {
    identity: PlayerId,

    /// Latest session metadata
    pub meta: Option<Arc<SessionMeta>>,

    /// Latest public projection
    pub public: Option<Arc<PublicProjection>>,

    /// Latest private mirror for `identity`
    pub private: Option<Arc<PrivateMirror>>,
}

impl BattleView {
    /// Create an empty view for a player
    pub fn new(identity: PlayerId) -> Self {
        Self {
            identity,
            meta: None,
            public: None,
            private: None,
        }
    }

    pub fn identity(&self) -> &PlayerId {
        &self.identity
    }

    /// Check that every document has arrived at least once
    pub fn is_ready(&self) -> bool {
        self.meta.is_some() && self.public.is_some() && self.private.is_some()
    }

    pub fn phase(&self) -> Option<Phase> {
        self.meta.as_ref().map(|m| m.phase)
    }

    pub fn turn(&self) -> Option<u32> {
        self.meta.as_ref().map(|m| m.turn)
    }

    /// Metadata version, the fencing token for new choices
    pub fn version(&self) -> Option<u64> {
        self.meta.as_ref().map(|m| m.version)
    }

    /// Which slot we occupy, once metadata is known
    pub fn perspective(&self) -> Option<Player> {
        self.meta.as_ref()?.players.slot_of(&self.identity)
    }

    pub fn is_participant(&self) -> bool {
        self.perspective().is_some()
    }

    pub fn opponent_id(&self) -> Option<&PlayerId> {
        self.meta.as_ref()?.opponent_of(&self.identity)
    }

    /// Get our public side (only once metadata confirms we are seated)
    pub fn me(&self) -> Option<&PublicSide> {
        self.perspective()?;
        self.public.as_ref()?.side(&self.identity)
    }

    /// Get the opponent's public side
    pub fn opponent(&self) -> Option<&PublicSide> {
        let uid = self.opponent_id()?;
        self.public.as_ref()?.side(uid)
    }

    /// Our active combatant with full private detail
    pub fn my_active(&self) -> Option<&RosterMember> {
        self.private.as_ref()?.active()
    }

    /// Public volatile flags on our active combatant
    pub fn my_volatiles(&self) -> Option<&PublicVolatiles> {
        self.me().map(|side| &side.active.volatiles)
    }

    /// Legality hints, or `None` while documents are still loading.
    ///
    /// Also `None` while our public side is missing: without it recharge
    /// and silence flags are unknown, and guessing "no flags" could
    /// advertise a move the authority would refuse.
    pub fn legal_actions(&self) -> Option<LegalActions> {
        if !self.is_ready() {
            return None;
        }
        let private = self.private.as_ref()?;
        let volatiles = self.my_volatiles()?;
        Some(LegalActions::resolve(private, volatiles))
    }

    pub fn is_over(&self) -> bool {
        self.phase() == Some(Phase::Ended)
    }

    pub fn winner(&self) -> Option<&PlayerId> {
        self.meta.as_ref()?.winner_uid.as_ref()
    }

    /// Check if we won (false while the battle is running or ended without a winner)
    pub fn is_winner(&self) -> bool {
        self.winner() == Some(&self.identity)
    }
}
