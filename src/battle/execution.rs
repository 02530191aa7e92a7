//! Battle execution loop
//!
//! Each tick: danger field -> unit behaviours (roster order, per-role
//! cadence) -> end check

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::battle::ai::{update_unit, TickContext};
use crate::battle::battle_map::BattleMap;
use crate::battle::coord::GridCoord;
use crate::battle::danger::DangerField;
use crate::battle::units::Roster;
use crate::core::config::TacticsConfig;
use crate::core::types::{Team, Tick, UnitId};

/// Battle phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BattlePhase {
    #[default]
    Deployment,
    Active,
    Finished,
}

/// Battle outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BattleOutcome {
    #[default]
    Undecided,
    Victory(Team),
    Draw,
}

/// Log entry for battle events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleEvent {
    pub tick: Tick,
    pub event_type: BattleEventType,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BattleEventType {
    BattleStarted,
    ShotFired { shooter: UnitId, target: UnitId, damage: i32 },
    GrenadeThrown { thrower: UnitId, target: UnitId, damage: i32 },
    HealPerformed { medic: UnitId, patient: UnitId },
    ResupplyPerformed { supplier: UnitId, recipient: UnitId },
    OrderIssued { commander: UnitId, recipient: UnitId, target: GridCoord },
    OrderRefused { recipient: UnitId },
    Recharged { unit_id: UnitId },
    UnitKilled { unit_id: UnitId, by: UnitId },
    LoopBroken { unit_id: UnitId },
    ConcealmentEscape { unit_id: UnitId },
    Surrounded { unit_id: UnitId },
    BattleEnded { outcome: BattleOutcome },
}

/// Log of events from a single tick
#[derive(Debug, Clone, Default)]
pub struct BattleEventLog {
    pub events: Vec<BattleEvent>,
}

impl BattleEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event_type: BattleEventType, description: String, tick: Tick) {
        self.events.push(BattleEvent {
            tick,
            event_type,
            description,
        });
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Running totals over a whole match
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleStats {
    pub shots: u32,
    pub grenades: u32,
    pub heals: u32,
    pub resupplies: u32,
    pub orders: u32,
    pub refused_orders: u32,
    pub kills: u32,
    pub loops_broken: u32,
    pub concealment_escapes: u32,
}

impl BattleStats {
    pub fn record(&mut self, events: &BattleEventLog) {
        for event in &events.events {
            match event.event_type {
                BattleEventType::ShotFired { .. } => self.shots += 1,
                BattleEventType::GrenadeThrown { .. } => self.grenades += 1,
                BattleEventType::HealPerformed { .. } => self.heals += 1,
                BattleEventType::ResupplyPerformed { .. } => self.resupplies += 1,
                BattleEventType::OrderIssued { .. } => self.orders += 1,
                BattleEventType::OrderRefused { .. } => self.refused_orders += 1,
                BattleEventType::UnitKilled { .. } => self.kills += 1,
                BattleEventType::LoopBroken { .. } => self.loops_broken += 1,
                BattleEventType::ConcealmentEscape { .. } => self.concealment_escapes += 1,
                _ => {}
            }
        }
    }
}

/// End-of-match report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BattleSummary {
    pub outcome: BattleOutcome,
    pub ticks: Tick,
    pub blue_survivors: usize,
    pub orange_survivors: usize,
    pub stats: BattleStats,
}

/// Complete battle state
#[derive(Debug, Clone)]
pub struct BattleState {
    pub map: BattleMap,
    pub roster: Roster,
    pub danger: DangerField,
    pub config: TacticsConfig,

    // Time
    pub tick: Tick,
    pub phase: BattlePhase,
    pub outcome: BattleOutcome,

    pub stats: BattleStats,
    pub battle_log: Vec<BattleEvent>,

    rng: ChaCha8Rng,
}

impl BattleState {
    /// Build a battle from a prepared map and roster
    ///
    /// The config is taken as given. Callers building their own config
    /// should run `TacticsConfig::validate` first, as `standard_battle` does.
    /// A unit with a zero move frequency never acts.
    pub fn new(map: BattleMap, roster: Roster, config: TacticsConfig, seed: u64) -> Self {
        let danger = DangerField::new(map.size);
        Self {
            map,
            roster,
            danger,
            config,
            tick: 0,
            phase: BattlePhase::Deployment,
            outcome: BattleOutcome::Undecided,
            stats: BattleStats::default(),
            battle_log: Vec::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Is the battle finished?
    pub fn is_finished(&self) -> bool {
        matches!(self.phase, BattlePhase::Finished)
    }

    /// Start the battle (transition from deployment to active)
    pub fn start_battle(&mut self) {
        self.phase = BattlePhase::Active;
        self.log_event(BattleEventType::BattleStarted, "Battle has begun!".into());
    }

    /// Log a battle event
    pub fn log_event(&mut self, event_type: BattleEventType, description: String) {
        self.battle_log.push(BattleEvent {
            tick: self.tick,
            event_type,
            description,
        });
    }

    /// End the battle with an outcome
    pub fn end_battle(&mut self, outcome: BattleOutcome) {
        self.phase = BattlePhase::Finished;
        self.outcome = outcome;
        info!(tick = self.tick, ?outcome, "battle ended");
        self.log_event(
            BattleEventType::BattleEnded { outcome },
            format!("Battle ended: {:?}", outcome),
        );
    }

    /// Run one simulation tick
    ///
    /// Units whose move frequency divides the new tick act in roster order.
    /// A unit killed earlier in the same tick does not act.
    pub fn advance_tick(&mut self) -> BattleEventLog {
        let mut events = BattleEventLog::new();

        if self.is_finished() {
            return events;
        }
        if self.phase == BattlePhase::Deployment {
            self.start_battle();
        }

        self.tick += 1;
        self.danger.recompute(&self.map, &self.roster, &self.config);

        let tick = self.tick;
        let due: Vec<usize> = self
            .roster
            .iter()
            .enumerate()
            .filter(|(_, u)| u.alive && tick.checked_rem(u.move_frequency) == Some(0))
            .map(|(idx, _)| idx)
            .collect();

        let ctx = TickContext {
            map: &self.map,
            danger: &self.danger,
            config: &self.config,
            tick,
        };
        for idx in due {
            update_unit(&mut self.roster, idx, &ctx, &mut self.rng, &mut events);
        }

        if !events.is_empty() {
            debug!(tick = self.tick, count = events.len(), "tick events");
        }
        self.stats.record(&events);
        self.battle_log.extend(events.events.iter().cloned());

        if let Some(outcome) = check_battle_end(self) {
            self.end_battle(outcome);
        }

        events
    }

    /// Run until one side is eliminated or `max_ticks` have passed
    ///
    /// Hitting the tick limit ends the battle as a draw.
    pub fn run(&mut self, max_ticks: Tick) -> BattleOutcome {
        while !self.is_finished() && self.tick < max_ticks {
            self.advance_tick();
        }
        if !self.is_finished() {
            self.end_battle(BattleOutcome::Draw);
        }
        self.outcome
    }

    pub fn summary(&self) -> BattleSummary {
        BattleSummary {
            outcome: self.outcome,
            ticks: self.tick,
            blue_survivors: self.roster.living_count(Team::Blue),
            orange_survivors: self.roster.living_count(Team::Orange),
            stats: self.stats,
        }
    }
}

/// Check if battle should end
///
/// A team with no living units has lost; if both are gone it is a draw.
pub fn check_battle_end(state: &BattleState) -> Option<BattleOutcome> {
    let blue = state.roster.living_count(Team::Blue);
    let orange = state.roster.living_count(Team::Orange);

    match (blue, orange) {
        (0, 0) => Some(BattleOutcome::Draw),
        (0, _) => Some(BattleOutcome::Victory(Team::Orange)),
        (_, 0) => Some(BattleOutcome::Victory(Team::Blue)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::units::Role;

    fn duel(blue: (i32, i32), orange: (i32, i32)) -> BattleState {
        let map = BattleMap::new(20);
        let config = TacticsConfig::default();
        let mut roster = Roster::new();
        roster.spawn(&map, Team::Blue, Role::Assault, blue.into(), &config).unwrap();
        roster.spawn(&map, Team::Orange, Role::Assault, orange.into(), &config).unwrap();
        BattleState::new(map, roster, config, 7)
    }

    #[test]
    fn test_battle_starts_on_first_tick() {
        let mut state = duel((2, 2), (17, 17));
        assert_eq!(state.phase, BattlePhase::Deployment);

        state.advance_tick();
        assert_eq!(state.phase, BattlePhase::Active);
        assert_eq!(state.tick, 1);
        assert!(matches!(state.battle_log[0].event_type, BattleEventType::BattleStarted));
    }

    #[test]
    fn test_units_only_act_on_their_cadence() {
        let mut state = duel((2, 2), (17, 17));
        let start = state.roster.get(UnitId::new(0)).unwrap().position;

        for _ in 0..29 {
            state.advance_tick();
        }
        assert_eq!(state.roster.get(UnitId::new(0)).unwrap().position, start);

        state.advance_tick();
        assert_ne!(state.roster.get(UnitId::new(0)).unwrap().position, start);
    }

    #[test]
    fn test_zero_cadence_unit_never_acts() {
        let mut state = duel((2, 2), (17, 17));
        state.roster.get_mut(UnitId::new(0)).unwrap().move_frequency = 0;
        let start = state.roster.get(UnitId::new(0)).unwrap().position;

        for _ in 0..60 {
            state.advance_tick();
        }
        assert_eq!(state.roster.get(UnitId::new(0)).unwrap().position, start);
        assert_ne!(state.roster.get(UnitId::new(1)).unwrap().position, GridCoord::new(17, 17));
    }

    #[test]
    fn test_check_battle_end() {
        let mut state = duel((2, 2), (17, 17));
        assert_eq!(check_battle_end(&state), None);

        state.roster.get_mut(UnitId::new(1)).unwrap().take_damage(500);
        assert_eq!(check_battle_end(&state), Some(BattleOutcome::Victory(Team::Blue)));

        state.roster.get_mut(UnitId::new(0)).unwrap().take_damage(500);
        assert_eq!(check_battle_end(&state), Some(BattleOutcome::Draw));
    }

    #[test]
    fn test_duel_reaches_an_outcome() {
        let mut state = duel((5, 5), (5, 12));
        let outcome = state.run(20_000);

        assert!(state.is_finished());
        assert_ne!(outcome, BattleOutcome::Undecided);
        assert!(state.stats.shots > 0);
        assert!(matches!(
            state.battle_log.last().map(|e| &e.event_type),
            Some(BattleEventType::BattleEnded { .. })
        ));
    }

    #[test]
    fn test_timeout_is_draw() {
        let mut state = duel((0, 0), (19, 19));
        let outcome = state.run(5);
        assert_eq!(outcome, BattleOutcome::Draw);
        assert_eq!(state.tick, 5);
    }

    #[test]
    fn test_same_seed_same_battle() {
        let mut a = duel((5, 5), (5, 12));
        let mut b = duel((5, 5), (5, 12));
        a.run(3_000);
        b.run(3_000);

        assert_eq!(a.outcome, b.outcome);
        assert_eq!(a.tick, b.tick);
        assert_eq!(a.battle_log, b.battle_log);
    }
}
