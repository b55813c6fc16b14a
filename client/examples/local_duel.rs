//! Local Duel Example
//!
//! Two bots play each other through an in-memory store while a toy
//! authority resolves turns. Each bot only sees its own private mirror and
//! picks random moves among the ones its session reports as usable.
//!
//! Run with `RUST_LOG=tandem_client=debug` to watch the replication.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use rand::Rng;
use rand::seq::SliceRandom;
use tandem_battle::{LegalActions, project_side};
use tandem_client::{
    BattleSession, DocumentPath, LocalClock, MemoryStore, SessionConfig, SystemClock,
};
use tandem_protocol::{
    BaseStats, BattleId, ChoiceAction, ChoiceKey, EndReason, Hp, MoveCategory, MoveEntry, Phase,
    Player, PlayerId, PlayerRef, Players, PrivateMirror, PublicProjection, PublicVolatiles,
    RosterMember, SessionMeta, StatStages, TurnChoice, check_fence,
};
use tracing_subscriber::EnvFilter;

const TURN_MILLIS: i64 = 30_000;
const MAX_TURNS: u32 = 60;

fn member(species: &str, hp: u32, moves: &[(&str, u32, MoveCategory)]) -> RosterMember {
    RosterMember {
        species: species.into(),
        level: 80,
        types: Vec::new(),
        stats: BaseStats::default(),
        hp: Hp::new(hp, hp),
        item: None,
        ability: None,
        moves: moves
            .iter()
            .map(|(id, pp, category)| MoveEntry::new(*id, *pp, *pp).with_category(*category))
            .collect(),
        status: None,
        fainted: false,
    }
}

fn team() -> PrivateMirror {
    use MoveCategory::*;
    PrivateMirror {
        team: vec![
            member(
                "snorlax",
                320,
                &[("body-slam", 24, Physical), ("hyper-beam", 5, Special), ("protect", 10, Status)],
            ),
            member("gengar", 210, &[("shadow-ball", 24, Special), ("toxic", 16, Status)]),
            member("lucario", 230, &[("close-combat", 8, Physical), ("swords-dance", 32, Status)]),
        ],
        ..PrivateMirror::default()
    }
}

/// Per-side state only the authority sees in full
struct SideState {
    mirror: PrivateMirror,
    revealed: BTreeMap<usize, BTreeSet<String>>,
    volatiles: PublicVolatiles,
}

impl SideState {
    fn new() -> Self {
        Self {
            mirror: team(),
            revealed: BTreeMap::new(),
            volatiles: PublicVolatiles::default(),
        }
    }

    fn switch_in(&mut self, index: usize) {
        self.mirror.team.swap(0, index);
        let active = self.revealed.remove(&0);
        if let Some(bench) = self.revealed.remove(&index) {
            self.revealed.insert(0, bench);
        }
        if let Some(active) = active {
            self.revealed.insert(index, active);
        }
        self.volatiles = PublicVolatiles::default();
    }

    fn replace_fainted(&mut self) -> bool {
        let next = self.mirror.bench().find(|(_, m)| m.is_alive()).map(|(i, _)| i);
        match next {
            Some(index) => {
                self.switch_in(index);
                true
            }
            None => false,
        }
    }
}

/// A stand-in for the real resolver: publishes documents and reads choices back
struct Authority {
    store: Arc<MemoryStore>,
    battle: BattleId,
    meta: SessionMeta,
    sides: BTreeMap<Player, SideState>,
    summary: Option<String>,
}

impl Authority {
    fn new(store: Arc<MemoryStore>, battle: BattleId, p1: PlayerId, p2: PlayerId) -> Self {
        let meta = SessionMeta {
            created_at: Some(SystemClock.now_millis()),
            format: "singles".into(),
            rule_set: "local".into(),
            players: Players {
                p1: PlayerRef { uid: p1 },
                p2: PlayerRef { uid: p2 },
            },
            phase: Phase::Choosing,
            turn: 1,
            version: 1,
            deadline_at: SystemClock.now_millis() + TURN_MILLIS,
            winner_uid: None,
            ended_reason: None,
        };
        let sides = [(Player::P1, SideState::new()), (Player::P2, SideState::new())]
            .into_iter()
            .collect();

        Self {
            store,
            battle,
            meta,
            sides,
            summary: None,
        }
    }

    fn publish(&self) -> Result<()> {
        let mut public = PublicProjection {
            last_result_summary: self.summary.clone(),
            ..PublicProjection::default()
        };

        for (slot, side) in &self.sides {
            let uid = self.meta.players.get(*slot).clone();
            if let Some(projected) = project_side(
                &side.mirror,
                side.volatiles.clone(),
                StatStages::new(),
                &side.revealed,
            ) {
                public.sides.insert(uid.clone(), projected);
            }
            self.store
                .publish(&DocumentPath::Private(self.battle.clone(), uid), &side.mirror)
                .context("Failed to publish private mirror")?;
        }

        self.store
            .publish(&DocumentPath::Public(self.battle.clone()), &public)
            .context("Failed to publish public projection")?;
        self.publish_meta()
    }

    fn publish_meta(&self) -> Result<()> {
        self.store
            .publish(&DocumentPath::Meta(self.battle.clone()), &self.meta)
            .context("Failed to publish meta")
    }

    fn bump(&mut self, phase: Phase) {
        self.meta.phase = phase;
        self.meta.version += 1;
    }

    /// Fenced choices for the current turn, once both players have one
    fn collect(&self) -> Option<BTreeMap<Player, TurnChoice>> {
        let mut choices = BTreeMap::new();
        for slot in [Player::P1, Player::P2] {
            let key = ChoiceKey::new(
                self.battle.clone(),
                self.meta.turn,
                self.meta.players.get(slot).clone(),
            );
            let choice = self.store.choice(&key)?;
            if let Err(e) = check_fence(&self.meta, &key, &choice) {
                tracing::warn!(key = %key, error = %e, "Ignoring fenced-out choice");
                return None;
            }
            choices.insert(slot, choice);
        }
        Some(choices)
    }

    fn end(&mut self, winner: Option<Player>, reason: Option<EndReason>) {
        self.meta.winner_uid = winner.map(|slot| self.meta.players.get(slot).clone());
        self.meta.ended_reason = reason;
        self.bump(Phase::Ended);
    }

    fn resolve(&mut self, choices: BTreeMap<Player, TurnChoice>) {
        let mut log = Vec::new();

        for (slot, choice) in &choices {
            if let ChoiceAction::Forfeit {} = choice.action {
                log.push(format!("{} forfeited", slot));
                self.summary = Some(log.join("; "));
                return self.end(Some(slot.opponent()), Some(EndReason::Forfeit));
            }
        }

        for (slot, choice) in &choices {
            if let ChoiceAction::Switch { switch_to_index } = choice.action
                && let Some(side) = self.sides.get_mut(slot)
            {
                side.switch_in(switch_to_index);
                log.push(format!("{} switched", slot));
            }
        }

        for (slot, choice) in &choices {
            let ChoiceAction::Move { move_id, target } = &choice.action else {
                continue;
            };
            if let Some(line) = self.use_move(*slot, move_id, *target) {
                log.push(line);
            }
            if self.meta.phase == Phase::Ended {
                break;
            }
        }

        self.summary = Some(log.join("; "));
    }

    fn use_move(&mut self, slot: Player, move_id: &str, target: Player) -> Option<String> {
        let attacker = self.sides.get_mut(&slot)?;
        if attacker.volatiles.recharge {
            attacker.volatiles.recharge = false;
            return Some(format!("{} recharged", slot));
        }

        let active = attacker.mirror.team.first_mut()?;
        let entry = active.moves.iter_mut().find(|m| m.id == move_id)?;
        entry.pp = entry.pp.saturating_sub(1);
        let category = entry.category;
        let species = active.species.clone();
        attacker.revealed.entry(0).or_default().insert(move_id.to_string());
        attacker.volatiles.protect_used_last_turn = move_id == "protect";
        attacker.volatiles.recharge = move_id == "hyper-beam";

        if category == Some(MoveCategory::Status) {
            return Some(format!("{} used {}", species, move_id));
        }

        let damage = rand::thread_rng().gen_range(40..=120);
        let defender = self.sides.get_mut(&target)?;
        let victim = defender.mirror.team.first_mut()?;
        victim.hp.cur = victim.hp.cur.saturating_sub(damage);
        let mut line = format!("{} used {} on {} ({} dmg)", species, move_id, victim.species, damage);

        if victim.hp.cur == 0 {
            victim.fainted = true;
            line.push_str(&format!(", {} fainted", victim.species));
            if !defender.replace_fainted() {
                self.end(Some(slot), None);
            }
        }
        Some(line)
    }

    async fn run(&mut self) -> Result<()> {
        self.publish()?;

        while self.meta.phase != Phase::Ended {
            tokio::time::sleep(Duration::from_millis(25)).await;

            if SystemClock.now_millis() > self.meta.deadline_at {
                tracing::info!(turn = self.meta.turn, "Turn timed out");
                self.end(None, Some(EndReason::Timeout));
                break;
            }

            let Some(choices) = self.collect() else {
                continue;
            };

            self.bump(Phase::Resolving);
            self.publish_meta()?;

            self.resolve(choices);
            if let Some(summary) = &self.summary {
                println!("[turn {}] {}", self.meta.turn, summary);
            }
            if self.meta.phase != Phase::Ended {
                if self.meta.turn >= MAX_TURNS {
                    self.end(None, Some(EndReason::Timeout));
                } else {
                    self.meta.turn += 1;
                    self.meta.deadline_at = SystemClock.now_millis() + TURN_MILLIS;
                    self.bump(Phase::Choosing);
                }
            }
            self.publish()?;
        }

        self.publish()?;
        Ok(())
    }
}

enum Pick {
    Move(String),
    Switch(usize),
    Forfeit,
}

fn pick(legal: &LegalActions) -> Pick {
    let mut rng = rand::thread_rng();
    let mut options: Vec<Pick> = legal
        .usable_moves()
        .map(|m| Pick::Move(m.id.clone()))
        .collect();
    if options.is_empty() || rng.gen_bool(0.1) {
        options.extend(legal.switches.iter().map(|&i| Pick::Switch(i)));
    }

    match options.choose(&mut rng) {
        Some(Pick::Move(id)) => Pick::Move(id.clone()),
        Some(Pick::Switch(i)) => Pick::Switch(*i),
        // Nothing usable: send any move and let the authority sort it out
        _ => match legal.moves.first() {
            Some(first) => Pick::Move(first.id.clone()),
            None => Pick::Forfeit,
        },
    }
}

async fn play(session: BattleSession, name: &str) -> Result<()> {
    let mut revisions = session.subscribe();
    let mut answered = None;

    loop {
        let view = session.snapshot();
        if view.is_over() {
            let outcome = if view.is_winner() { "won" } else { "did not win" };
            println!("{} {}", name, outcome);
            break;
        }

        if let (Some(meta), Some(legal)) = (view.meta.as_ref(), view.legal_actions())
            && meta.is_choosing()
            && answered != Some(meta.version)
        {
            answered = Some(meta.version);
            let result = match pick(&legal) {
                Pick::Move(id) => session.choose_move(id, None).await,
                Pick::Switch(index) => session.choose_switch(index).await,
                Pick::Forfeit => session.forfeit().await,
            };
            if let Err(e) = result {
                tracing::warn!(player = name, error = %e, "Choice not sent");
            }
        }

        if revisions.changed().await.is_err() {
            break;
        }
    }

    session.close();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = SessionConfig::from_env()?;
    let store = Arc::new(MemoryStore::new());
    let battle = BattleId::new("local-duel");
    let (red, blue) = (PlayerId::new("red"), PlayerId::new("blue"));

    let mut authority = Authority::new(store.clone(), battle.clone(), red.clone(), blue.clone());

    let (red_session, _red_events) =
        BattleSession::open(store.clone(), battle.clone(), Some(red), config.clone()).await?;
    let (blue_session, _blue_events) =
        BattleSession::open(store.clone(), battle, Some(blue), config).await?;

    let (authority_result, red_result, blue_result) = futures_util::future::join3(
        authority.run(),
        play(red_session, "red"),
        play(blue_session, "blue"),
    )
    .await;

    authority_result?;
    red_result?;
    blue_result?;

    println!("{} choices written", store.write_count());
    Ok(())
}
