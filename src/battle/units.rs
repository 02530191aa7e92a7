//! Battle units and the shared roster
//!
//! A unit owns all of its own mutable state. Role-specific data lives in
//! [`RoleState`], one variant per role, so no unit ever needs to be cast to
//! reach its role.

use serde::{Deserialize, Serialize};

use crate::battle::ai::assault::AssaultState;
use crate::battle::ai::command::CommandState;
use crate::battle::ai::logistics::{LogisticsKind, LogisticsState};
use crate::battle::battle_map::BattleMap;
use crate::battle::constants::MAX_HEALTH;
use crate::battle::coord::GridCoord;
use crate::battle::stability::StabilityGuard;
use crate::battle::visibility::VisibilitySet;
use crate::core::config::TacticsConfig;
use crate::core::error::{Result, SkirmishError};
use crate::core::types::{Team, UnitId};

/// Unit role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Command,
    Assault,
    Medic,
    Supply,
}

impl Role {
    /// Ticks between behaviour invocations for this role
    pub fn move_frequency(&self, config: &TacticsConfig) -> u64 {
        match self {
            Role::Command => config.cadence.command,
            Role::Assault => config.cadence.assault,
            Role::Medic => config.cadence.medic,
            Role::Supply => config.cadence.supply,
        }
    }

    pub fn symbol(&self) -> char {
        match self {
            Role::Command => 'C',
            Role::Assault => 'W',
            Role::Medic => 'M',
            Role::Supply => 'S',
        }
    }
}

/// Role-specific state, one variant per role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RoleState {
    Command(CommandState),
    Assault(AssaultState),
    Medic(LogisticsState),
    Supply(LogisticsState),
}

impl RoleState {
    pub fn new(role: Role, config: &TacticsConfig) -> Self {
        match role {
            Role::Command => RoleState::Command(CommandState::default()),
            Role::Assault => RoleState::Assault(AssaultState::new(config)),
            Role::Medic => RoleState::Medic(LogisticsState::new(config)),
            Role::Supply => RoleState::Supply(LogisticsState::new(config)),
        }
    }

    pub fn role(&self) -> Role {
        match self {
            RoleState::Command(_) => Role::Command,
            RoleState::Assault(_) => Role::Assault,
            RoleState::Medic(_) => Role::Medic,
            RoleState::Supply(_) => Role::Supply,
        }
    }
}

/// A planned path, consumed one cell per behaviour tick
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Route {
    steps: Vec<GridCoord>,
    next: usize,
    /// Cell the route was planned toward
    target: Option<GridCoord>,
}

impl Route {
    pub fn set(&mut self, steps: Vec<GridCoord>, target: GridCoord) {
        self.steps = steps;
        self.next = 0;
        self.target = Some(target);
    }

    pub fn clear(&mut self) {
        self.steps.clear();
        self.next = 0;
        self.target = None;
    }

    pub fn target(&self) -> Option<GridCoord> {
        self.target
    }

    pub fn peek(&self) -> Option<GridCoord> {
        self.steps.get(self.next).copied()
    }

    pub fn advance(&mut self) {
        self.next += 1;
    }

    /// No steps left (or never planned)
    pub fn is_exhausted(&self) -> bool {
        self.next >= self.steps.len()
    }

    pub fn remaining(&self) -> &[GridCoord] {
        &self.steps[self.next.min(self.steps.len())..]
    }
}

/// A single combatant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub team: Team,
    pub position: GridCoord,
    pub health: i32,
    pub alive: bool,
    pub move_frequency: u64,
    pub visibility: VisibilitySet,
    pub guard: StabilityGuard,
    pub route: Route,
    pub role: RoleState,
}

impl Unit {
    pub fn new(id: UnitId, team: Team, role: Role, position: GridCoord, config: &TacticsConfig) -> Self {
        Self {
            id,
            team,
            position,
            health: MAX_HEALTH,
            alive: true,
            move_frequency: role.move_frequency(config),
            visibility: VisibilitySet::default(),
            guard: StabilityGuard::default(),
            route: Route::default(),
            role: RoleState::new(role, config),
        }
    }

    pub fn role(&self) -> Role {
        self.role.role()
    }

    pub fn is_role(&self, role: Role) -> bool {
        self.role() == role
    }

    /// Living member of `team`
    pub fn is_ally_of(&self, team: Team) -> bool {
        self.alive && self.team == team
    }

    /// Living member of the opposing side
    pub fn is_enemy_of(&self, team: Team) -> bool {
        self.alive && self.team != team
    }

    /// Apply damage, returns true if this killed the unit
    pub fn take_damage(&mut self, amount: i32) -> bool {
        if !self.alive {
            return false;
        }
        self.health = (self.health - amount.max(0)).max(0);
        if self.health == 0 {
            self.alive = false;
            self.route.clear();
            return true;
        }
        false
    }

    pub fn heal(&mut self, amount: i32) {
        if self.alive {
            self.health = (self.health + amount.max(0)).min(MAX_HEALTH);
        }
    }

    pub fn is_critical(&self, config: &TacticsConfig) -> bool {
        self.health < config.combat.critical_health
    }

    pub fn assault(&self) -> Option<&AssaultState> {
        match &self.role {
            RoleState::Assault(state) => Some(state),
            _ => None,
        }
    }

    pub fn assault_mut(&mut self) -> Option<&mut AssaultState> {
        match &mut self.role {
            RoleState::Assault(state) => Some(state),
            _ => None,
        }
    }

    pub fn logistics(&self) -> Option<&LogisticsState> {
        match &self.role {
            RoleState::Medic(state) | RoleState::Supply(state) => Some(state),
            _ => None,
        }
    }

    pub fn logistics_mut(&mut self) -> Option<&mut LogisticsState> {
        match &mut self.role {
            RoleState::Medic(state) | RoleState::Supply(state) => Some(state),
            _ => None,
        }
    }

    pub fn logistics_kind(&self) -> Option<LogisticsKind> {
        match self.role {
            RoleState::Medic(_) => Some(LogisticsKind::Medic),
            RoleState::Supply(_) => Some(LogisticsKind::Supply),
            _ => None,
        }
    }

    pub fn command(&self) -> Option<&CommandState> {
        match &self.role {
            RoleState::Command(state) => Some(state),
            _ => None,
        }
    }

    /// Assault unit below critical health
    pub fn needs_medic(&self, config: &TacticsConfig) -> bool {
        self.alive && self.assault().is_some() && self.is_critical(config)
    }

    /// Assault unit below the low-ammo mark
    pub fn needs_ammo(&self, config: &TacticsConfig) -> bool {
        self.alive
            && self
                .assault()
                .is_some_and(|a| a.ammo < config.combat.low_ammo)
    }

    /// Logistics unit holding a charge it is free to spend
    pub fn has_available_charge(&self) -> bool {
        self.alive && self.logistics().is_some_and(|l| l.has_available_charge())
    }

    pub fn has_active_order(&self) -> bool {
        self.logistics().is_some_and(|l| l.has_active_order())
    }

    /// Hand a logistics unit an order to service the unit at `target`
    ///
    /// Refused (returns false, nothing changes) when the unit has no charge
    /// or is not a logistics unit.
    pub fn receive_order(&mut self, target: GridCoord) -> bool {
        let Some(state) = self.logistics_mut() else {
            return false;
        };
        if !state.receive_order(target) {
            return false;
        }
        self.route.clear();
        true
    }

    /// Recompute what this unit can see
    pub fn update_visibility(&mut self, map: &BattleMap, range: u32) {
        self.visibility = VisibilitySet::compute(map, self.position, range);
    }

    /// Short label for the unit's current behaviour state
    pub fn state_label(&self) -> &'static str {
        if !self.alive {
            return "DEAD";
        }
        if self.guard.is_escaping() {
            return "ESCAPING";
        }
        match &self.role {
            RoleState::Command(state) => state.mode_label(),
            RoleState::Assault(state) => state.mode.label(),
            RoleState::Medic(state) | RoleState::Supply(state) => state.mode.label(),
        }
    }
}

/// All units in the match, both teams, in processing order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Roster {
    units: Vec<Unit>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a new unit, which must stand on a walkable cell
    pub fn spawn(
        &mut self,
        map: &BattleMap,
        team: Team,
        role: Role,
        position: GridCoord,
        config: &TacticsConfig,
    ) -> Result<UnitId> {
        if !map.in_bounds(position) {
            return Err(SkirmishError::OutOfBounds(position, map.size));
        }
        if !map.is_walkable(position) {
            return Err(SkirmishError::BlockedCell(position));
        }

        let id = UnitId::new(self.units.len() as u32);
        let mut unit = Unit::new(id, team, role, position, config);
        unit.update_visibility(map, config.perception.visibility_range);
        self.units.push(unit);
        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn get(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(id.index())
    }

    pub fn get_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.get_mut(id.index())
    }

    /// Lookup that reports a missing id as an error
    pub fn unit(&self, id: UnitId) -> Result<&Unit> {
        self.get(id).ok_or(SkirmishError::UnitNotFound(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Unit> {
        self.units.iter_mut()
    }

    /// Living units of one team
    pub fn living(&self, team: Team) -> impl Iterator<Item = &Unit> {
        self.units.iter().filter(move |u| u.is_ally_of(team))
    }

    pub fn living_count(&self, team: Team) -> usize {
        self.living(team).count()
    }

    /// Split the roster into the acting unit and everyone else
    pub fn split_actor(&mut self, index: usize) -> Option<(&mut Unit, Others<'_>)> {
        if index >= self.units.len() {
            return None;
        }
        let (before, rest) = self.units.split_at_mut(index);
        let (actor, after) = rest.split_first_mut()?;
        Some((actor, Others { before, after }))
    }
}

/// Every unit except the one currently acting
pub struct Others<'a> {
    before: &'a mut [Unit],
    after: &'a mut [Unit],
}

impl<'a> Others<'a> {
    pub fn iter(&self) -> impl Iterator<Item = &Unit> {
        self.before.iter().chain(self.after.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Unit> {
        self.before.iter_mut().chain(self.after.iter_mut())
    }

    pub fn get(&self, id: UnitId) -> Option<&Unit> {
        self.iter().find(|u| u.id == id)
    }

    pub fn get_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.iter_mut().find(|u| u.id == id)
    }

    /// Does a living unit other than the actor stand here?
    pub fn is_occupied(&self, coord: GridCoord) -> bool {
        self.iter().any(|u| u.alive && u.position == coord)
    }

    /// Living teammates of `team`
    pub fn allies(&self, team: Team) -> impl Iterator<Item = &Unit> {
        self.iter().filter(move |u| u.is_ally_of(team))
    }

    /// Living opponents of `team`
    pub fn enemies(&self, team: Team) -> impl Iterator<Item = &Unit> {
        self.iter().filter(move |u| u.is_enemy_of(team))
    }
}
