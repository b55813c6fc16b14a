#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tandem_battle::project_side;
use tandem_client::{
    BattleSession, ClockPolicy, ManualClock, MemoryStore, SessionConfig, SessionReceiver,
    WritePolicy,
};
use tandem_protocol::{
    BaseStats, BattleId, DocumentPath, Hp, MoveEntry, Phase, PlayerId, PlayerRef, Players,
    PrivateMirror, PublicProjection, PublicVolatiles, RosterMember, SessionMeta, StatStages,
};

pub fn alice() -> PlayerId {
    PlayerId::new("alice")
}

pub fn bob() -> PlayerId {
    PlayerId::new("bob")
}

pub fn meta(phase: Phase, turn: u32, version: u64, deadline_at: i64) -> SessionMeta {
    SessionMeta {
        created_at: Some(0),
        format: "singles".into(),
        rule_set: "standard".into(),
        players: Players {
            p1: PlayerRef { uid: alice() },
            p2: PlayerRef { uid: bob() },
        },
        phase,
        turn,
        version,
        deadline_at,
        winner_uid: None,
        ended_reason: None,
    }
}

pub fn member(species: &str, moves: Vec<MoveEntry>, hp_cur: u32) -> RosterMember {
    RosterMember {
        species: species.into(),
        level: 80,
        types: vec!["normal".into()],
        stats: BaseStats::default(),
        hp: Hp::new(hp_cur, 200),
        item: Some("leftovers".into()),
        ability: Some("pressure".into()),
        moves,
        status: None,
        fainted: hp_cur == 0,
    }
}

/// Active metagross with one exhausted move; bench: gengar, fainted tyranitar, rotom
pub fn mirror() -> PrivateMirror {
    PrivateMirror {
        team: vec![
            member(
                "metagross",
                vec![
                    MoveEntry::new("meteor-mash", 16, 16),
                    MoveEntry::new("protect", 10, 10),
                    MoveEntry::new("earthquake", 0, 16),
                ],
                200,
            ),
            member("gengar", vec![MoveEntry::new("shadow-ball", 24, 24)], 150),
            member("tyranitar", vec![MoveEntry::new("crunch", 24, 24)], 0),
            member("rotom", vec![MoveEntry::new("volt-switch", 32, 32)], 90),
        ],
        choice_lock: None,
        disable: None,
        encore_move_id: None,
    }
}

/// Public projection with both sides derived from the same mirror
pub fn public(volatiles: PublicVolatiles) -> PublicProjection {
    let side = project_side(&mirror(), volatiles, StatStages::new(), &BTreeMap::new()).unwrap();
    PublicProjection {
        sides: [(alice(), side.clone()), (bob(), side)].into_iter().collect(),
        ..PublicProjection::default()
    }
}

pub fn fast_config() -> SessionConfig {
    SessionConfig {
        clock: ClockPolicy {
            refresh_interval: Duration::from_millis(20),
        },
        write: WritePolicy {
            initial_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(20),
            ..WritePolicy::default()
        },
    }
}

/// A battle hosted on an in-memory store, with the test playing the authority
pub struct Arena {
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
    pub battle: BattleId,
}

impl Arena {
    pub fn new() -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
            clock: Arc::new(ManualClock::new(0)),
            battle: BattleId::new("b1"),
        }
    }

    pub fn meta_path(&self) -> DocumentPath {
        DocumentPath::Meta(self.battle.clone())
    }

    pub fn public_path(&self) -> DocumentPath {
        DocumentPath::Public(self.battle.clone())
    }

    pub fn private_path(&self, who: &PlayerId) -> DocumentPath {
        DocumentPath::Private(self.battle.clone(), who.clone())
    }

    pub fn publish_meta(&self, meta: &SessionMeta) {
        self.store.publish(&self.meta_path(), meta).unwrap();
    }

    pub fn publish_public(&self, public: &PublicProjection) {
        self.store.publish(&self.public_path(), public).unwrap();
    }

    pub fn publish_private(&self, who: &PlayerId, mirror: &PrivateMirror) {
        self.store.publish(&self.private_path(who), mirror).unwrap();
    }

    /// Publish a choosing-phase battle with quiet volatiles
    pub fn publish_all(&self, meta: &SessionMeta) {
        self.publish_meta(meta);
        self.publish_public(&public(PublicVolatiles::default()));
        self.publish_private(&alice(), &mirror());
        self.publish_private(&bob(), &mirror());
    }

    pub async fn open(&self, who: PlayerId) -> (BattleSession, SessionReceiver) {
        self.open_with(who, fast_config()).await
    }

    pub async fn open_with(
        &self,
        who: PlayerId,
        config: SessionConfig,
    ) -> (BattleSession, SessionReceiver) {
        BattleSession::open_with_clock(
            self.store.clone(),
            self.battle.clone(),
            Some(who),
            config,
            self.clock.clone(),
        )
        .await
        .unwrap()
    }
}

/// Wait until `condition` holds, re-checking on every document update
pub async fn wait_for<F>(session: &BattleSession, condition: F)
where
    F: Fn(&BattleSession) -> bool,
{
    let mut revisions = session.subscribe();
    tokio::time::timeout(Duration::from_secs(2), async {
        while !condition(session) {
            if revisions.changed().await.is_err() {
                break;
            }
        }
    })
    .await
    .expect("condition not reached in time");
}

/// Give listener tasks a moment to drain pending deliveries
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(30)).await;
}
