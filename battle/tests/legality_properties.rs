use proptest::prelude::*;

use tandem_battle::{BlockReason, resolve_moves, switch_targets};
use tandem_protocol::{
    BaseStats, ChoiceLock, DisableRecord, Hp, MoveEntry, PrivateMirror, PublicVolatiles,
    RosterMember, TurnsLeft,
};

const MOVE_POOL: &[&str] = &[
    "earthquake",
    "outrage",
    "protect",
    "swords-dance",
    "toxic",
    "scald",
    "roost",
    "hyper-beam",
];

fn arb_move() -> impl Strategy<Value = MoveEntry> {
    (prop::sample::select(MOVE_POOL), 0u32..4, any::<bool>()).prop_map(|(id, pp, flagged)| {
        let mut entry = MoveEntry::new(id, pp, 16);
        entry.disabled = flagged;
        entry
    })
}

fn arb_member() -> impl Strategy<Value = RosterMember> {
    (prop::collection::vec(arb_move(), 0..5), 0u32..3, any::<bool>()).prop_map(
        |(moves, cur, fainted)| RosterMember {
            species: "Mew".into(),
            level: 50,
            types: vec![],
            stats: BaseStats::default(),
            hp: Hp::new(cur, 2),
            item: None,
            ability: None,
            moves,
            status: None,
            fainted,
        },
    )
}

fn maybe_move() -> impl Strategy<Value = Option<String>> {
    prop::option::of(prop::sample::select(MOVE_POOL).prop_map(String::from))
}

fn arb_mirror() -> impl Strategy<Value = PrivateMirror> {
    (
        prop::collection::vec(arb_member(), 0..6),
        maybe_move(),
        any::<bool>(),
        maybe_move(),
        maybe_move(),
    )
        .prop_map(|(team, lock, locked, disable, encore)| PrivateMirror {
            team,
            choice_lock: lock.map(|move_id| ChoiceLock {
                move_id: Some(move_id),
                locked,
            }),
            disable: disable.map(|move_id| DisableRecord {
                move_id: Some(move_id),
                turns_left: Some(2),
            }),
            encore_move_id: encore,
        })
}

fn arb_volatiles() -> impl Strategy<Value = PublicVolatiles> {
    (any::<bool>(), any::<bool>()).prop_map(|(taunted, recharge)| PublicVolatiles {
        taunt: taunted.then_some(TurnsLeft { turns_left: 2 }),
        recharge,
        ..Default::default()
    })
}

proptest! {
    #[test]
    fn exhausted_moves_are_never_legal(mirror in arb_mirror(), volatiles in arb_volatiles()) {
        for verdict in resolve_moves(&mirror, &volatiles) {
            if verdict.pp == 0 {
                prop_assert!(verdict.disabled);
                prop_assert_eq!(verdict.reason, Some(BlockReason::NoUsesLeft));
            }
        }
    }

    #[test]
    fn recharge_blocks_every_move(mirror in arb_mirror(), volatiles in arb_volatiles()) {
        let volatiles = PublicVolatiles { recharge: true, ..volatiles };
        for verdict in resolve_moves(&mirror, &volatiles) {
            prop_assert!(verdict.disabled);
            if verdict.pp > 0 {
                prop_assert_eq!(verdict.reason, Some(BlockReason::MustRecharge));
            }
        }
    }

    #[test]
    fn lock_blocks_every_other_move(mirror in arb_mirror(), locked_to in prop::sample::select(MOVE_POOL)) {
        let mirror = PrivateMirror {
            choice_lock: Some(ChoiceLock { move_id: Some(locked_to.to_string()), locked: true }),
            encore_move_id: None,
            disable: None,
            ..mirror
        };
        let known = mirror.active().map(|a| a.moves.clone()).unwrap_or_default();
        let verdicts = resolve_moves(&mirror, &PublicVolatiles::default());
        for (verdict, entry) in verdicts.iter().zip(&known) {
            if verdict.id != locked_to && verdict.pp > 0 {
                prop_assert_eq!(&verdict.reason, &Some(BlockReason::LockedToPriorChoice));
            }
            if verdict.id == locked_to && verdict.pp > 0 {
                prop_assert_eq!(verdict.disabled, entry.disabled);
                if !entry.disabled {
                    prop_assert_eq!(&verdict.reason, &None);
                }
            }
        }
    }

    #[test]
    fn verdicts_follow_known_moves(mirror in arb_mirror(), volatiles in arb_volatiles()) {
        let verdicts = resolve_moves(&mirror, &volatiles);
        let known = mirror.active().map(|a| a.moves.len()).unwrap_or(0);
        prop_assert_eq!(verdicts.len(), known);
        for verdict in &verdicts {
            prop_assert_eq!(verdict.disabled, verdict.reason.is_some());
        }
    }

    #[test]
    fn switch_targets_are_alive_bench_members(mirror in arb_mirror()) {
        let targets = switch_targets(&mirror);
        for idx in &targets {
            prop_assert!(*idx >= 1);
            let member = &mirror.team[*idx];
            prop_assert!(!member.fainted);
            prop_assert!(member.hp.cur > 0);
        }
        prop_assert_eq!(switch_targets(&mirror), targets);
    }
}
