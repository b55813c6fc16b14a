mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use common::*;
use tandem_client::{
    BattleSession, BlockReason, SessionConfig, SessionError, SessionHandler, SessionStatus,
    StoreError,
};
use tandem_protocol::{
    BattleId, ChoiceKey, DisableRecord, FenceError, Phase, Player, PublicVolatiles, StreamKind,
    TurnChoice, TurnsLeft, check_fence,
};

#[tokio::test]
async fn test_loading_until_all_documents_arrive() {
    let arena = Arena::new();
    let (session, _events) = arena.open(alice()).await;
    settle().await;

    assert_eq!(session.status(), SessionStatus::Loading);
    assert_eq!(session.legal_moves(), None);
    assert_eq!(session.legal_switch_targets(), None);
    assert_eq!(session.phase(), None);

    arena.publish_meta(&meta(Phase::Choosing, 1, 1, 0));
    wait_for(&session, |s| s.phase().is_some()).await;
    assert_eq!(session.status(), SessionStatus::Loading);
    assert_eq!(session.legal_moves(), None);

    arena.publish_public(&public(PublicVolatiles::default()));
    arena.publish_private(&alice(), &mirror());
    wait_for(&session, |s| s.is_ready()).await;

    assert_eq!(session.phase(), Some(Phase::Choosing));
    assert_eq!(session.perspective(), Some(Player::P1));
    assert_eq!(session.legal_switch_targets(), Some(vec![1, 3]));
}

#[tokio::test]
async fn test_authority_documents_keyed_by_uid() {
    let arena = Arena::new();
    arena.publish_meta(&meta(Phase::Choosing, 1, 1, 0));
    arena.store.publish_raw(
        &arena.public_path(),
        serde_json::json!({
            "field": {
                "hazards": { "alice": { "sr": false, "spikes": 0, "tSpikes": 0, "web": false } },
                "screens": { "alice": { "reflect": 0, "lightScreen": 0 } }
            },
            "alice": {
                "active": {
                    "species": "metagross",
                    "level": 50,
                    "types": ["steel", "psychic"],
                    "hp": { "cur": 160, "max": 160 },
                    "status": null,
                    "boosts": { "atk": 0, "def": 0, "spa": 0, "spd": 0, "spe": 0, "acc": 0, "eva": 0 },
                    "volatiles": {}
                },
                "benchPublic": [{ "species": "gengar", "fainted": false, "revealedMoves": [] }]
            },
            "bob": {
                "active": {
                    "species": "snorlax",
                    "level": 50,
                    "types": ["normal"],
                    "hp": { "cur": 220, "max": 220 },
                    "status": null,
                    "boosts": { "atk": 0, "def": 0, "spa": 0, "spd": 0, "spe": 0 },
                    "volatiles": { "recharge": true }
                },
                "benchPublic": []
            },
            "lastResultSummary": "Battle started."
        }),
    );
    arena.store.publish_raw(
        &arena.private_path(&alice()),
        serde_json::json!({
            "team": [
                {
                    "species": "metagross",
                    "level": 50,
                    "types": ["steel", "psychic"],
                    "stats": { "hp": 160, "atk": 135, "def": 130, "spa": 95, "spd": 90, "spe": 70 },
                    "moves": [{ "id": "meteor-mash", "pp": 16 }, { "id": "protect", "pp": 0 }]
                },
                {
                    "species": "gengar",
                    "level": 50,
                    "types": ["ghost", "poison"],
                    "stats": { "hp": 120, "atk": 65, "def": 60, "spa": 130, "spd": 75, "spe": 110 },
                    "moves": [{ "id": "shadow-ball", "pp": 24 }]
                },
                {
                    "species": "tyranitar",
                    "level": 50,
                    "types": ["rock", "dark"],
                    "stats": { "hp": 0, "atk": 134, "def": 110, "spa": 95, "spd": 100, "spe": 61 },
                    "moves": [{ "id": "crunch", "pp": 24 }]
                }
            ],
            "choiceLock": {},
            "disable": null,
            "encoreMoveId": null
        }),
    );

    let (session, _events) = arena.open(alice()).await;
    wait_for(&session, |s| s.is_ready()).await;

    assert_eq!(session.last_error(), None);
    assert_eq!(session.legal_switch_targets(), Some(vec![1]));
    let moves = session.legal_moves().unwrap();
    assert!(!moves.iter().find(|m| m.id == "meteor-mash").unwrap().disabled);
    assert_eq!(
        moves.iter().find(|m| m.id == "protect").unwrap().reason,
        Some(BlockReason::NoUsesLeft)
    );

    let view = session.snapshot();
    assert_eq!(view.me().unwrap().active.species, "metagross");
    assert!(view.opponent().unwrap().active.volatiles.must_recharge());
}

#[tokio::test]
async fn test_exhausted_move_reported() {
    let arena = Arena::new();
    arena.publish_all(&meta(Phase::Choosing, 1, 1, 0));
    let (session, _events) = arena.open(alice()).await;
    wait_for(&session, |s| s.is_ready()).await;

    let moves = session.legal_moves().unwrap();
    let earthquake = moves.iter().find(|m| m.id == "earthquake").unwrap();
    assert!(earthquake.disabled);
    assert_eq!(earthquake.reason_text().as_deref(), Some("No uses left"));

    let meteor_mash = moves.iter().find(|m| m.id == "meteor-mash").unwrap();
    assert!(!meteor_mash.disabled);
    assert_eq!(meteor_mash.pp, 16);
}

#[tokio::test]
async fn test_silenced_protect() {
    let arena = Arena::new();
    arena.publish_meta(&meta(Phase::Choosing, 1, 1, 0));
    arena.publish_public(&public(PublicVolatiles {
        taunt: Some(TurnsLeft { turns_left: 2 }),
        ..PublicVolatiles::default()
    }));
    arena.publish_private(&alice(), &mirror());

    let (session, _events) = arena.open(alice()).await;
    wait_for(&session, |s| s.is_ready()).await;

    let moves = session.legal_moves().unwrap();
    let protect = moves.iter().find(|m| m.id == "protect").unwrap();
    assert_eq!(protect.reason, Some(BlockReason::Silenced));
    assert!(!moves.iter().find(|m| m.id == "meteor-mash").unwrap().disabled);
}

#[tokio::test]
async fn test_block_record_follows_private_updates() {
    let arena = Arena::new();
    arena.publish_all(&meta(Phase::Choosing, 1, 1, 0));
    let (session, _events) = arena.open(alice()).await;
    wait_for(&session, |s| s.is_ready()).await;

    let mut blocked = mirror();
    blocked.disable = Some(DisableRecord {
        move_id: Some("meteor-mash".into()),
        turns_left: Some(3),
    });
    arena.publish_private(&alice(), &blocked);

    wait_for(&session, |s| {
        s.legal_moves()
            .map(|moves| moves.iter().any(|m| m.reason == Some(BlockReason::Blocked)))
            .unwrap_or(false)
    })
    .await;
}

#[tokio::test]
async fn test_stream_failure_does_not_stop_siblings() {
    let arena = Arena::new();
    let (session, _events) = arena.open(alice()).await;
    settle().await;

    arena
        .store
        .fail(&arena.public_path(), StoreError::PermissionDenied("public".into()));
    arena.publish_meta(&meta(Phase::Choosing, 1, 1, 0));
    arena.publish_private(&alice(), &mirror());

    wait_for(&session, |s| {
        let view = s.snapshot();
        view.meta.is_some() && view.private.is_some() && s.last_error().is_some()
    })
    .await;

    assert_eq!(session.status(), SessionStatus::Loading);
    assert!(matches!(
        session.last_error(),
        Some(SessionError::Subscription {
            stream: StreamKind::Public,
            ..
        })
    ));
    assert_eq!(session.legal_moves(), None);

    arena.publish_public(&public(PublicVolatiles::default()));
    wait_for(&session, |s| s.is_ready() && s.last_error().is_none()).await;
}

#[tokio::test]
async fn test_submit_outside_choosing_writes_nothing() {
    for phase in [Phase::Resolving, Phase::Ended] {
        let arena = Arena::new();
        arena.publish_all(&meta(phase, 2, 5, 0));
        let (session, _events) = arena.open(alice()).await;
        wait_for(&session, |s| s.is_ready()).await;

        assert_eq!(session.forfeit().await, Err(SessionError::WrongPhase { phase }));
        assert_eq!(
            session.choose_move("meteor-mash", None).await,
            Err(SessionError::WrongPhase { phase })
        );
        assert_eq!(
            session.submit(TurnChoice::switch_to(1, 5)).await,
            Err(SessionError::WrongPhase { phase })
        );
        assert_eq!(arena.store.write_count(), 0);
    }
}

#[tokio::test]
async fn test_submit_without_metadata() {
    let arena = Arena::new();
    let (session, _events) = arena.open(alice()).await;
    settle().await;

    assert_eq!(session.forfeit().await, Err(SessionError::NoMetadata));
    assert_eq!(
        session.submit(TurnChoice::forfeit(0)).await,
        Err(SessionError::NoMetadata)
    );
    assert_eq!(arena.store.write_count(), 0);
}

#[tokio::test]
async fn test_choose_switch_stores_fenced_choice() {
    let arena = Arena::new();
    arena.publish_all(&meta(Phase::Choosing, 3, 7, 0));
    let (session, _events) = arena.open(alice()).await;
    wait_for(&session, |s| s.is_ready()).await;

    session.choose_switch(3).await.unwrap();

    let key = ChoiceKey::new(arena.battle.clone(), 3, alice());
    assert_eq!(arena.store.choice(&key), Some(TurnChoice::switch_to(3, 7)));
    assert_eq!(
        arena.store.get(&key.path()),
        Some(serde_json::json!({
            "action": "switch",
            "payload": { "switchToIndex": 3 },
            "clientVersion": 7
        }))
    );
}

#[tokio::test]
async fn test_illegal_switch_writes_nothing() {
    let arena = Arena::new();
    arena.publish_all(&meta(Phase::Choosing, 1, 1, 0));
    let (session, _events) = arena.open(alice()).await;
    wait_for(&session, |s| s.is_ready()).await;

    // 0 is active, 2 is fainted, 9 does not exist
    for index in [0, 2, 9] {
        assert_eq!(
            session.choose_switch(index).await,
            Err(SessionError::IllegalSwitch { index })
        );
    }
    assert_eq!(arena.store.write_count(), 0);
}

#[tokio::test]
async fn test_forfeit_accepted_while_choosing() {
    let arena = Arena::new();
    arena.publish_all(&meta(Phase::Choosing, 4, 9, 0));
    let (session, _events) = arena.open(bob()).await;
    wait_for(&session, |s| s.is_ready()).await;

    session.forfeit().await.unwrap();

    let key = ChoiceKey::new(arena.battle.clone(), 4, bob());
    assert_eq!(arena.store.choice(&key), Some(TurnChoice::forfeit(9)));
}

#[tokio::test]
async fn test_move_targets_opponent_by_default() {
    let arena = Arena::new();
    arena.publish_all(&meta(Phase::Choosing, 1, 2, 0));
    let (session, _events) = arena.open(bob()).await;
    wait_for(&session, |s| s.is_ready()).await;

    session.choose_move("meteor-mash", None).await.unwrap();

    let key = ChoiceKey::new(arena.battle.clone(), 1, bob());
    assert_eq!(
        arena.store.choice(&key),
        Some(TurnChoice::move_to("meteor-mash", Player::P1, 2))
    );
}

#[tokio::test]
async fn test_resubmit_overwrites() {
    let arena = Arena::new();
    arena.publish_all(&meta(Phase::Choosing, 1, 1, 0));
    let (session, _events) = arena.open(alice()).await;
    wait_for(&session, |s| s.is_ready()).await;

    session.choose_move("meteor-mash", Some(Player::P2)).await.unwrap();
    session.choose_switch(1).await.unwrap();

    let key = ChoiceKey::new(arena.battle.clone(), 1, alice());
    assert_eq!(arena.store.write_count(), 2);
    assert_eq!(arena.store.choice(&key), Some(TurnChoice::switch_to(1, 1)));
}

#[tokio::test]
async fn test_stale_choice_rejected_by_authority() {
    let arena = Arena::new();
    arena.publish_all(&meta(Phase::Choosing, 2, 3, 0));
    let (session, _events) = arena.open(alice()).await;
    wait_for(&session, |s| s.is_ready()).await;

    // Computed against version 3, sent after the authority moved on to 4
    let observed = session.snapshot().version().unwrap();
    let current = meta(Phase::Choosing, 2, 4, 0);
    arena.publish_meta(&current);
    wait_for(&session, |s| s.snapshot().version() == Some(4)).await;

    session.submit(TurnChoice::switch_to(1, observed)).await.unwrap();

    let (key, choice) = arena.store.writes().pop().unwrap();
    assert_eq!(key, ChoiceKey::new(arena.battle.clone(), 2, alice()));
    assert_eq!(
        check_fence(&current, &key, &choice),
        Err(FenceError::StaleVersion { client: 3, current: 4 })
    );
}

#[derive(Clone, Default)]
struct CommitLog {
    committed: Arc<Mutex<Vec<(u32, TurnChoice)>>>,
    metas: Arc<Mutex<Vec<u64>>>,
}

#[async_trait]
impl SessionHandler for CommitLog {
    async fn on_meta(&mut self, meta: Arc<tandem_protocol::SessionMeta>) {
        self.metas.lock().unwrap().push(meta.version);
    }

    async fn on_choice_committed(&mut self, turn: u32, choice: &TurnChoice) {
        self.committed.lock().unwrap().push((turn, choice.clone()));
    }
}

#[tokio::test]
async fn test_handler_sees_updates_and_commits() {
    let arena = Arena::new();
    arena.publish_all(&meta(Phase::Choosing, 1, 1, 0));
    let (session, mut events) = arena.open(alice()).await;

    let log = CommitLog::default();
    let mut handler = log.clone();
    let runner = tokio::spawn(async move { events.run(&mut handler).await });

    wait_for(&session, |s| s.is_ready()).await;
    session.forfeit().await.unwrap();
    settle().await;

    session.close();
    runner.await.unwrap();

    assert_eq!(*log.metas.lock().unwrap(), vec![1]);
    assert_eq!(*log.committed.lock().unwrap(), vec![(1, TurnChoice::forfeit(1))]);
}

#[tokio::test]
async fn test_teardown_with_write_in_flight() {
    let arena = Arena::new();
    arena.publish_all(&meta(Phase::Choosing, 1, 1, 0));
    let (session, mut events) = arena.open(alice()).await;
    wait_for(&session, |s| s.is_ready()).await;

    let log = CommitLog::default();
    let mut handler = log.clone();
    let runner = tokio::spawn(async move { events.run(&mut handler).await });
    settle().await;

    let hold = arena.store.hold_writes().await;
    let closer = &session;
    let (result, ()) = tokio::join!(session.forfeit(), async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        closer.close();
        drop(hold);
    });

    assert_eq!(result, Ok(()));
    assert_eq!(arena.store.write_count(), 1);
    assert_eq!(session.status(), SessionStatus::Closed);

    runner.await.unwrap();
    assert!(log.committed.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_close_during_backoff_drops_retry() {
    let arena = Arena::new();
    arena.publish_all(&meta(Phase::Choosing, 1, 1, 0));
    let mut config = fast_config();
    config.write.initial_delay = Duration::from_millis(300);
    config.write.max_delay = Duration::from_millis(300);
    let (session, _events) = arena.open_with(alice(), config).await;
    wait_for(&session, |s| s.is_ready()).await;

    arena.store.fail_next_write(StoreError::Unavailable("blip".into()));
    let closer = &session;
    let (result, ()) = tokio::join!(session.forfeit(), async move {
        tokio::time::sleep(Duration::from_millis(30)).await;
        closer.close();
    });

    assert_eq!(result, Ok(()));
    assert_eq!(session.status(), SessionStatus::Closed);
    settle().await;
    assert_eq!(arena.store.write_count(), 0);
    let key = ChoiceKey::new(arena.battle.clone(), 1, alice());
    assert_eq!(arena.store.choice(&key), None);
}

#[tokio::test]
async fn test_submit_after_close() {
    let arena = Arena::new();
    arena.publish_all(&meta(Phase::Choosing, 1, 1, 0));
    let (session, _events) = arena.open(alice()).await;
    wait_for(&session, |s| s.is_ready()).await;

    session.close();
    assert_eq!(session.forfeit().await, Err(SessionError::Closed));
    assert_eq!(arena.store.write_count(), 0);
}

#[tokio::test]
async fn test_close_releases_subscriptions() {
    let arena = Arena::new();
    let (session, _events) = arena.open(alice()).await;
    settle().await;

    let paths = [
        arena.meta_path(),
        arena.public_path(),
        arena.private_path(&alice()),
    ];
    assert!(paths.iter().all(|p| arena.store.subscriber_count(p) == 1));

    drop(session);
    settle().await;
    assert!(paths.iter().all(|p| arena.store.subscriber_count(p) == 0));
}

#[tokio::test]
async fn test_time_remaining_zero_unless_choosing() {
    let arena = Arena::new();
    arena.publish_all(&meta(Phase::Resolving, 1, 1, 30_000));
    let (session, _events) = arena.open(alice()).await;
    wait_for(&session, |s| s.is_ready()).await;
    assert_eq!(session.time_remaining_seconds(), 0);

    arena.publish_meta(&meta(Phase::Choosing, 1, 2, 0));
    wait_for(&session, |s| s.snapshot().version() == Some(2)).await;
    assert_eq!(session.time_remaining_seconds(), 0);

    arena.publish_meta(&meta(Phase::Choosing, 1, 3, 30_000));
    wait_for(&session, |s| s.snapshot().version() == Some(3)).await;
    assert_eq!(session.time_remaining_seconds(), 30);

    arena.clock.advance(Duration::from_secs(45));
    assert_eq!(session.time_remaining_seconds(), 0);
}

#[tokio::test]
async fn test_time_remaining_survives_extreme_deadlines() {
    let arena = Arena::new();
    arena.clock.advance(Duration::from_secs(1));
    arena.publish_all(&meta(Phase::Choosing, 1, 1, i64::MIN));
    let (session, _events) = arena.open(alice()).await;
    wait_for(&session, |s| s.is_ready()).await;
    assert_eq!(session.time_remaining_seconds(), 0);

    arena.clock.set(-1_000);
    arena.publish_meta(&meta(Phase::Choosing, 1, 2, i64::MAX));
    wait_for(&session, |s| s.snapshot().version() == Some(2)).await;
    assert_eq!(
        session.time_remaining_seconds(),
        (i64::MAX as u64).div_ceil(1000)
    );
}

#[tokio::test]
async fn test_time_remaining_never_rises_within_version() {
    let arena = Arena::new();
    arena.publish_all(&meta(Phase::Choosing, 1, 3, 30_000));
    let (session, _events) = arena.open(alice()).await;
    wait_for(&session, |s| s.is_ready()).await;

    assert_eq!(session.time_remaining_seconds(), 30);

    arena.clock.advance(Duration::from_millis(1_500));
    assert_eq!(session.time_remaining_seconds(), 29);

    // The clock feed now says the authority is 5s behind us
    arena.store.set_server_offset(-5_000);
    tokio::time::timeout(Duration::from_secs(2), async {
        while session.server_now_millis() != -3_500 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();
    assert_eq!(session.time_remaining_seconds(), 29);

    // A new version resets the countdown
    arena.publish_meta(&meta(Phase::Choosing, 2, 4, 30_000));
    wait_for(&session, |s| s.snapshot().version() == Some(4)).await;
    assert_eq!(session.time_remaining_seconds(), 34);
}

#[tokio::test]
async fn test_clock_feed_failure_keeps_offset() {
    let arena = Arena::new();
    arena.store.set_server_offset(2_000);
    arena.publish_all(&meta(Phase::Choosing, 1, 1, 10_000));
    let (session, _events) = arena.open(alice()).await;
    wait_for(&session, |s| s.is_ready()).await;

    assert_eq!(session.server_now_millis(), 2_000);
    assert_eq!(session.time_remaining_seconds(), 8);

    arena
        .store
        .fail_server_offset(StoreError::Unavailable("offline".into()));
    settle().await;

    assert_eq!(session.server_now_millis(), 2_000);
    assert_eq!(session.time_remaining_seconds(), 8);
}

#[tokio::test]
async fn test_open_without_identity() {
    let arena = Arena::new();
    let result = BattleSession::open(
        arena.store.clone(),
        BattleId::new("b1"),
        None,
        SessionConfig::default(),
    )
    .await;

    assert!(matches!(result, Err(SessionError::NotAuthenticated)));
    assert_eq!(arena.store.subscriber_count(&arena.meta_path()), 0);
}

#[tokio::test]
async fn test_spectator_cannot_submit() {
    let arena = Arena::new();
    arena.publish_all(&meta(Phase::Choosing, 1, 1, 0));
    let mallory = tandem_protocol::PlayerId::new("mallory");
    let (session, _events) = arena.open(mallory.clone()).await;
    wait_for(&session, |s| s.snapshot().meta.is_some()).await;

    assert_eq!(session.perspective(), None);
    assert_eq!(
        session.forfeit().await,
        Err(SessionError::NotParticipant(mallory))
    );
    assert_eq!(arena.store.write_count(), 0);
}

#[tokio::test]
async fn test_transient_write_failures_retried() {
    let arena = Arena::new();
    arena.publish_all(&meta(Phase::Choosing, 1, 1, 0));
    let (session, _events) = arena.open(alice()).await;
    wait_for(&session, |s| s.is_ready()).await;

    arena.store.fail_next_write(StoreError::Unavailable("blip".into()));
    arena.store.fail_next_write(StoreError::Unavailable("blip".into()));
    session.forfeit().await.unwrap();
    assert_eq!(arena.store.write_count(), 1);
}

#[tokio::test]
async fn test_permission_denied_not_retried() {
    let arena = Arena::new();
    arena.publish_all(&meta(Phase::Choosing, 1, 1, 0));
    let (session, _events) = arena.open(alice()).await;
    wait_for(&session, |s| s.is_ready()).await;

    arena
        .store
        .fail_next_write(StoreError::PermissionDenied("rules".into()));
    assert_eq!(
        session.forfeit().await,
        Err(SessionError::Store(StoreError::PermissionDenied("rules".into())))
    );
    assert_eq!(arena.store.write_count(), 0);

    session.forfeit().await.unwrap();
    assert_eq!(arena.store.write_count(), 1);
}

#[tokio::test]
async fn test_retries_give_up() {
    let arena = Arena::new();
    arena.publish_all(&meta(Phase::Choosing, 1, 1, 0));
    let (session, _events) = arena.open(alice()).await;
    wait_for(&session, |s| s.is_ready()).await;

    for _ in 0..3 {
        arena.store.fail_next_write(StoreError::Unavailable("down".into()));
    }
    assert!(matches!(
        session.forfeit().await,
        Err(SessionError::Store(StoreError::Unavailable(_)))
    ));
    assert_eq!(arena.store.write_count(), 0);
}
