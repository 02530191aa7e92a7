//! Command unit behaviour
//!
//! The command unit never fights. It merges what its team sees, decides
//! between defense and normal posture, sends medics and resupply units to
//! assault units in need, and keeps itself out of danger.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::battle::ai::TickContext;
use crate::battle::coord::GridCoord;
use crate::battle::execution::{BattleEventLog, BattleEventType};
use crate::battle::movement::{evade, is_available, step_to_lowest_danger, try_unstuck};
use crate::battle::units::{Others, Role, RoleState, Unit};
use crate::battle::visibility::VisibilitySet;
use crate::core::types::UnitId;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandState {
    pub defense_mode: bool,
    /// Low-health evasion overrides everything else
    pub retreating: bool,
    /// Union of every living teammate's visibility
    pub team_visibility: VisibilitySet,
    pub enemy_seen: bool,
    pub last_seen: Option<GridCoord>,
}

impl CommandState {
    pub fn mode_label(&self) -> &'static str {
        if self.retreating {
            "RETREAT_LOW_HEALTH"
        } else if self.defense_mode {
            "DEFENSE_MODE"
        } else {
            "NORMAL_MODE"
        }
    }
}

/// One command behaviour invocation
pub fn update(unit: &mut Unit, others: &mut Others, ctx: &TickContext, events: &mut BattleEventLog) {
    let RoleState::Command(slot) = &mut unit.role else {
        return;
    };
    let mut state = std::mem::take(slot);

    tick_state(unit, &mut state, others, ctx, events);

    if let RoleState::Command(slot) = &mut unit.role {
        *slot = state;
    }
}

fn tick_state(
    unit: &mut Unit,
    state: &mut CommandState,
    others: &mut Others,
    ctx: &TickContext,
    events: &mut BattleEventLog,
) {
    if unit.is_critical(ctx.config) {
        state.retreating = true;
        evade(unit, others, ctx);
        return;
    }
    state.retreating = false;

    rebuild_team_visibility(unit, state, others);
    update_posture(unit, state, others);
    dispatch(unit, others, ctx, events);
    reposition(unit, others, ctx);
}

/// Merge team visibility and look for enemies in it
pub fn rebuild_team_visibility(unit: &Unit, state: &mut CommandState, others: &Others) {
    state.team_visibility = unit.visibility.clone();
    for ally in others.allies(unit.team) {
        state.team_visibility.union_with(&ally.visibility);
    }

    state.enemy_seen = false;
    for enemy in others.enemies(unit.team) {
        if state.team_visibility.contains(enemy.position) {
            state.enemy_seen = true;
            state.last_seen = Some(enemy.position);
        }
    }
}

/// Defense when the team is down to two or nobody sees an enemy; normal
/// once two assault units are up and an enemy is in sight. Otherwise the
/// posture holds.
pub fn update_posture(unit: &Unit, state: &mut CommandState, others: &Others) {
    let team_size = 1 + others.allies(unit.team).count();
    let assault = others
        .allies(unit.team)
        .filter(|u| u.is_role(Role::Assault))
        .count();

    let was_defending = state.defense_mode;
    if team_size <= 2 || !state.enemy_seen {
        state.defense_mode = true;
    } else if assault >= 2 {
        state.defense_mode = false;
    }

    if was_defending != state.defense_mode {
        debug!(unit = %unit.id, team = %unit.team, label = state.mode_label(), "posture changed");
    }
}

/// Send a free medic to each critically wounded assault unit and a free
/// resupply unit to each one low on ammo
pub fn dispatch(unit: &Unit, others: &mut Others, ctx: &TickContext, events: &mut BattleEventLog) {
    let config = ctx.config;
    let needs: Vec<(UnitId, GridCoord, bool, bool)> = others
        .allies(unit.team)
        .filter(|u| u.is_role(Role::Assault))
        .map(|u| (u.id, u.position, u.needs_medic(config), u.needs_ammo(config)))
        .collect();

    for (patient, at, needs_medic, needs_ammo) in needs {
        if needs_medic {
            issue_order(unit, others, Role::Medic, patient, at, ctx, events);
        }
        if needs_ammo {
            issue_order(unit, others, Role::Supply, patient, at, ctx, events);
        }
    }
}

/// Order the first free helper of `role`
///
/// A helper that already has an order is skipped. If every free helper is
/// out of charges the first one is asked anyway and refuses.
fn issue_order(
    unit: &Unit,
    others: &mut Others,
    role: Role,
    patient: UnitId,
    at: GridCoord,
    ctx: &TickContext,
    events: &mut BattleEventLog,
) {
    let team = unit.team;
    let free = |u: &Unit| u.is_ally_of(team) && u.is_role(role) && !u.has_active_order();

    let charged = others.iter().find(|u| free(*u) && u.has_available_charge()).map(|u| u.id);
    let chosen = charged.or_else(|| others.iter().find(|u| free(*u)).map(|u| u.id));
    let Some(helper) = chosen.and_then(|id| others.get_mut(id)) else {
        return;
    };

    if helper.receive_order(at) {
        info!(commander = %unit.id, helper = %helper.id, ?role, patient = %patient, "order issued");
        events.push(
            BattleEventType::OrderIssued {
                commander: unit.id,
                recipient: helper.id,
                target: at,
            },
            format!("{} {} sent {} to {:?}", unit.team, unit.id, helper.id, at),
            ctx.tick,
        );
    } else {
        debug!(commander = %unit.id, helper = %helper.id, ?role, "order refused, no charge");
        events.push(
            BattleEventType::OrderRefused { recipient: helper.id },
            format!("{} {} has no charge for {}", unit.team, helper.id, patient),
            ctx.tick,
        );
    }
}

/// Step away from danger, or off a depot cell
fn reposition(unit: &mut Unit, others: &Others, ctx: &TickContext) {
    if ctx.danger.get(unit.position) > ctx.config.logistics.danger_threshold {
        if !step_to_lowest_danger(unit, others, ctx) {
            try_unstuck(unit, others, ctx.map);
        }
        return;
    }

    if ctx.map.is_depot(unit.position) {
        let off = unit
            .position
            .neighbors()
            .into_iter()
            .find(|c| is_available(ctx.map, others, *c) && !ctx.map.is_depot(*c));
        if let Some(next) = off {
            unit.position = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::ai::logistics::LogisticsMode;
    use crate::battle::battle_map::BattleMap;
    use crate::battle::danger::DangerField;
    use crate::battle::terrain::CellKind;
    use crate::battle::units::Roster;
    use crate::core::config::TacticsConfig;
    use crate::core::types::Team;

    struct Fixture {
        map: BattleMap,
        danger: DangerField,
        config: TacticsConfig,
        roster: Roster,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                map: BattleMap::new(30),
                danger: DangerField::new(30),
                config: TacticsConfig::default(),
                roster: Roster::new(),
            }
        }

        fn spawn(&mut self, team: Team, role: Role, pos: (i32, i32)) -> UnitId {
            self.roster.spawn(&self.map, team, role, pos.into(), &self.config).unwrap()
        }

        fn update(&mut self, id: UnitId, events: &mut BattleEventLog) {
            let ctx = TickContext {
                map: &self.map,
                danger: &self.danger,
                config: &self.config,
                tick: 0,
            };
            let (unit, mut others) = self.roster.split_actor(id.index()).unwrap();
            unit.update_visibility(ctx.map, ctx.config.perception.visibility_range);
            update(unit, &mut others, &ctx, events);
        }

        fn state(&self, id: UnitId) -> CommandState {
            self.roster.get(id).unwrap().command().unwrap().clone()
        }
    }

    #[test]
    fn test_small_team_forces_defense() {
        let mut f = Fixture::new();
        let cmd = f.spawn(Team::Blue, Role::Command, (5, 5));
        f.spawn(Team::Blue, Role::Assault, (5, 7));
        f.spawn(Team::Orange, Role::Assault, (5, 12));
        let mut events = BattleEventLog::new();

        f.update(cmd, &mut events);
        let state = f.state(cmd);
        assert!(state.enemy_seen);
        assert!(state.defense_mode);
        assert_eq!(state.mode_label(), "DEFENSE_MODE");
    }

    #[test]
    fn test_normal_mode_with_two_assault_and_contact() {
        let mut f = Fixture::new();
        let cmd = f.spawn(Team::Blue, Role::Command, (5, 5));
        f.spawn(Team::Blue, Role::Assault, (5, 7));
        f.spawn(Team::Blue, Role::Assault, (7, 5));
        f.spawn(Team::Orange, Role::Assault, (5, 14));
        let mut events = BattleEventLog::new();

        f.update(cmd, &mut events);
        let state = f.state(cmd);
        assert!(!state.defense_mode);
        assert_eq!(state.last_seen, Some(GridCoord::new(5, 14)));
    }

    #[test]
    fn test_no_contact_means_defense() {
        let mut f = Fixture::new();
        let cmd = f.spawn(Team::Blue, Role::Command, (2, 2));
        f.spawn(Team::Blue, Role::Assault, (2, 4));
        f.spawn(Team::Blue, Role::Assault, (4, 2));
        f.spawn(Team::Orange, Role::Assault, (27, 27));
        let mut events = BattleEventLog::new();

        f.update(cmd, &mut events);
        let state = f.state(cmd);
        assert!(!state.enemy_seen);
        assert!(state.defense_mode);
    }

    #[test]
    fn test_posture_holds_on_ambiguous_counts() {
        let mut f = Fixture::new();
        let cmd = f.spawn(Team::Blue, Role::Command, (5, 5));
        f.spawn(Team::Blue, Role::Assault, (5, 7));
        f.spawn(Team::Blue, Role::Medic, (7, 5));
        f.spawn(Team::Orange, Role::Assault, (5, 14));
        let mut events = BattleEventLog::new();

        // Three alive, enemy seen, only one assault unit: stays normal
        f.update(cmd, &mut events);
        assert!(!f.state(cmd).defense_mode);
    }

    #[test]
    fn test_dispatch_medic_once_per_tick() {
        let mut f = Fixture::new();
        let cmd = f.spawn(Team::Blue, Role::Command, (5, 5));
        let first = f.spawn(Team::Blue, Role::Assault, (10, 10));
        let second = f.spawn(Team::Blue, Role::Assault, (12, 12));
        let medic = f.spawn(Team::Blue, Role::Medic, (6, 1));
        f.roster.get_mut(first).unwrap().take_damage(70);
        f.roster.get_mut(second).unwrap().take_damage(70);
        let mut events = BattleEventLog::new();

        f.update(cmd, &mut events);

        let state = f.roster.get(medic).unwrap().logistics().unwrap().mode;
        assert_eq!(
            state,
            LogisticsMode::OrderedEnRoute {
                target: GridCoord::new(10, 10)
            }
        );
        let issued = events
            .events
            .iter()
            .filter(|e| matches!(e.event_type, BattleEventType::OrderIssued { .. }))
            .count();
        assert_eq!(issued, 1);
    }

    #[test]
    fn test_dispatch_refused_when_out_of_charges() {
        let mut f = Fixture::new();
        let cmd = f.spawn(Team::Blue, Role::Command, (5, 5));
        let thirsty = f.spawn(Team::Blue, Role::Assault, (10, 10));
        let supply = f.spawn(Team::Blue, Role::Supply, (1, 7));
        f.roster.get_mut(thirsty).unwrap().assault_mut().unwrap().ammo = 1;
        {
            let state = f.roster.get_mut(supply).unwrap().logistics_mut().unwrap();
            state.charges = 0;
            state.mode = LogisticsMode::RechargeReturn;
        }
        let mut events = BattleEventLog::new();

        f.update(cmd, &mut events);

        assert_eq!(
            f.roster.get(supply).unwrap().logistics().unwrap().mode,
            LogisticsMode::RechargeReturn
        );
        assert!(matches!(events.events[0].event_type, BattleEventType::OrderRefused { .. }));
    }

    #[test]
    fn test_steps_off_depot() {
        let mut f = Fixture::new();
        f.map.set_terrain(GridCoord::new(1, 6), CellKind::AmmoDepot);
        let cmd = f.spawn(Team::Blue, Role::Command, (1, 6));
        let mut events = BattleEventLog::new();

        f.update(cmd, &mut events);
        assert_eq!(f.roster.get(cmd).unwrap().position, GridCoord::new(1, 7));
    }

    #[test]
    fn test_moves_out_of_danger() {
        let mut f = Fixture::new();
        let cmd = f.spawn(Team::Blue, Role::Command, (10, 10));
        f.danger.raise(GridCoord::new(10, 12), 10, 100, 10);
        let mut events = BattleEventLog::new();

        f.update(cmd, &mut events);
        assert_eq!(f.roster.get(cmd).unwrap().position, GridCoord::new(9, 10));
    }

    #[test]
    fn test_critical_command_retreats() {
        let mut f = Fixture::new();
        let cmd = f.spawn(Team::Blue, Role::Command, (10, 10));
        f.roster.get_mut(cmd).unwrap().take_damage(65);
        let mut events = BattleEventLog::new();

        f.update(cmd, &mut events);
        assert_eq!(f.state(cmd).mode_label(), "RETREAT_LOW_HEALTH");
        assert_eq!(f.roster.get(cmd).unwrap().state_label(), "RETREAT_LOW_HEALTH");
    }
}
