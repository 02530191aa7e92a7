//! Medic and resupply behaviour
//!
//! Both roles share one state machine. A unit carries a single charge:
//! spending it on an adjacent teammate sends the unit back to its depot to
//! recharge. Orders from the command unit point it at a teammate in need.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::battle::ai::TickContext;
use crate::battle::constants::MAX_HEALTH;
use crate::battle::coord::GridCoord;
use crate::battle::execution::{BattleEventLog, BattleEventType};
use crate::battle::movement::{approach, evade, step_to_lowest_danger};
use crate::battle::terrain::DepotKind;
use crate::battle::units::{Others, Role, Unit};
use crate::core::config::TacticsConfig;

/// Which service a logistics unit provides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogisticsKind {
    Medic,
    Supply,
}

impl LogisticsKind {
    pub fn depot(&self) -> DepotKind {
        match self {
            LogisticsKind::Medic => DepotKind::Medical,
            LogisticsKind::Supply => DepotKind::Ammo,
        }
    }

    /// Could `unit` use this service right now?
    ///
    /// Medics treat assault units below full health; once no assault unit is
    /// left, any wounded non-medic. Resupply tops up assault units below max
    /// ammo.
    pub fn can_service(&self, unit: &Unit, config: &TacticsConfig, assault_alive: bool) -> bool {
        if !unit.alive {
            return false;
        }
        match self {
            LogisticsKind::Medic if assault_alive => {
                unit.is_role(Role::Assault) && unit.health < MAX_HEALTH
            }
            LogisticsKind::Medic => !unit.is_role(Role::Medic) && unit.health < MAX_HEALTH,
            LogisticsKind::Supply => unit
                .assault()
                .is_some_and(|a| a.ammo < config.combat.max_ammo),
        }
    }

    /// Is `unit` in urgent need: critically wounded, or low on ammo?
    pub fn is_urgent(&self, unit: &Unit, config: &TacticsConfig, assault_alive: bool) -> bool {
        if !unit.alive {
            return false;
        }
        match self {
            LogisticsKind::Medic if assault_alive => unit.needs_medic(config),
            LogisticsKind::Medic => !unit.is_role(Role::Medic) && unit.is_critical(config),
            LogisticsKind::Supply => unit.needs_ammo(config),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LogisticsMode {
    #[default]
    IdleWithCharge,
    OrderedEnRoute {
        target: GridCoord,
    },
    RechargeReturn,
    RetreatLowHealth,
}

impl LogisticsMode {
    pub fn label(&self) -> &'static str {
        match self {
            LogisticsMode::IdleWithCharge => "IDLE_WITH_CHARGE",
            LogisticsMode::OrderedEnRoute { .. } => "ORDERED_EN_ROUTE",
            LogisticsMode::RechargeReturn => "RECHARGE_RETURN",
            LogisticsMode::RetreatLowHealth => "RETREAT_LOW_HEALTH",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogisticsState {
    pub mode: LogisticsMode,
    pub charges: u8,
    /// Team depot, looked up once
    pub depot: Option<GridCoord>,
}

impl LogisticsState {
    pub fn new(config: &TacticsConfig) -> Self {
        Self {
            mode: LogisticsMode::IdleWithCharge,
            charges: config.logistics.max_charges,
            depot: None,
        }
    }

    /// Holds a charge and is not on its way to recharge
    pub fn has_available_charge(&self) -> bool {
        self.charges > 0 && self.mode != LogisticsMode::RechargeReturn
    }

    pub fn has_active_order(&self) -> bool {
        matches!(self.mode, LogisticsMode::OrderedEnRoute { .. })
    }

    /// Accept an order toward `target`; refused without a charge
    pub fn receive_order(&mut self, target: GridCoord) -> bool {
        if self.charges == 0 {
            return false;
        }
        self.mode = LogisticsMode::OrderedEnRoute { target };
        true
    }
}

/// One medic or resupply behaviour invocation
pub fn update(unit: &mut Unit, others: &mut Others, ctx: &TickContext, events: &mut BattleEventLog) {
    let (Some(kind), Some(mut state)) = (unit.logistics_kind(), unit.logistics().copied()) else {
        return;
    };

    tick_state(unit, &mut state, kind, others, ctx, events);

    if let Some(slot) = unit.logistics_mut() {
        *slot = state;
    }
}

fn tick_state(
    unit: &mut Unit,
    state: &mut LogisticsState,
    kind: LogisticsKind,
    others: &mut Others,
    ctx: &TickContext,
    events: &mut BattleEventLog,
) {
    if unit.is_critical(ctx.config) {
        if state.mode != LogisticsMode::RetreatLowHealth {
            debug!(unit = %unit.id, ?kind, health = unit.health, "retreating, order dropped");
            state.mode = LogisticsMode::RetreatLowHealth;
            unit.route.clear();
        }
        evade(unit, others, ctx);
        return;
    }

    if state.mode == LogisticsMode::RetreatLowHealth {
        state.mode = if state.charges > 0 {
            LogisticsMode::IdleWithCharge
        } else {
            LogisticsMode::RechargeReturn
        };
        unit.route.clear();
    }

    if state.has_available_charge() && service_adjacent(unit, state, kind, others, ctx, events) {
        return;
    }

    match state.mode {
        LogisticsMode::RechargeReturn => recharge_return(unit, state, kind, others, ctx, events),
        LogisticsMode::OrderedEnRoute { target } => en_route(unit, state, kind, others, ctx, target),
        LogisticsMode::IdleWithCharge | LogisticsMode::RetreatLowHealth => {}
    }
}

fn assault_alive(unit: &Unit, others: &Others) -> bool {
    others
        .allies(unit.team)
        .any(|u| u.is_role(Role::Assault))
}

/// Spend the charge on an adjacent teammate that can use it
fn service_adjacent(
    unit: &mut Unit,
    state: &mut LogisticsState,
    kind: LogisticsKind,
    others: &mut Others,
    ctx: &TickContext,
    events: &mut BattleEventLog,
) -> bool {
    let config = ctx.config;
    let assault_alive = assault_alive(unit, others);
    let (team, position) = (unit.team, unit.position);

    let Some(patient) = others.iter_mut().find(|u| {
        u.is_ally_of(team)
            && u.position.distance(&position) <= 1
            && kind.can_service(u, config, assault_alive)
    }) else {
        return false;
    };

    let event = match kind {
        LogisticsKind::Medic => {
            patient.heal(config.logistics.heal_amount);
            info!(medic = %unit.id, patient = %patient.id, health = patient.health, "healed");
            BattleEventType::HealPerformed {
                medic: unit.id,
                patient: patient.id,
            }
        }
        LogisticsKind::Supply => {
            if let Some(assault) = patient.assault_mut() {
                assault.resupply(config);
            }
            info!(supplier = %unit.id, recipient = %patient.id, "resupplied");
            BattleEventType::ResupplyPerformed {
                supplier: unit.id,
                recipient: patient.id,
            }
        }
    };
    events.push(
        event,
        format!("{} {} serviced {}", unit.team, unit.id, patient.id),
        ctx.tick,
    );

    state.charges = state.charges.saturating_sub(1);
    state.mode = LogisticsMode::RechargeReturn;
    unit.route.clear();
    true
}

fn recharge_return(
    unit: &mut Unit,
    state: &mut LogisticsState,
    kind: LogisticsKind,
    others: &Others,
    ctx: &TickContext,
    events: &mut BattleEventLog,
) {
    if state.depot.is_none() {
        let corner = GridCoord::from(unit.team.home_corner(ctx.map.size));
        state.depot = ctx.map.nearest_depot(kind.depot(), corner);
    }
    let Some(depot) = state.depot else {
        warn!(unit = %unit.id, team = %unit.team, ?kind, "no depot to recharge at");
        state.mode = LogisticsMode::IdleWithCharge;
        return;
    };

    if unit.position.distance(&depot) > 1 {
        approach(unit, others, ctx, depot);
        return;
    }

    let max = ctx.config.logistics.max_charges;
    if state.charges < max {
        state.charges = max;
        debug!(unit = %unit.id, ?kind, "recharged");
        events.push(
            BattleEventType::Recharged { unit_id: unit.id },
            format!("{} {} recharged at {:?}", unit.team, unit.id, depot),
            ctx.tick,
        );
    }
    state.mode = LogisticsMode::IdleWithCharge;
    unit.route.clear();

    if ctx.danger.get(unit.position) > ctx.config.logistics.danger_threshold {
        step_to_lowest_danger(unit, others, ctx);
        return;
    }

    if let Some(target) = most_urgent(unit, kind, others, ctx.config) {
        debug!(unit = %unit.id, ?kind, ?target, "self-assigned");
        state.mode = LogisticsMode::OrderedEnRoute { target };
    }
}

/// Most urgent visible teammate: lowest health for medics, lowest ammo for
/// resupply
fn most_urgent(
    unit: &Unit,
    kind: LogisticsKind,
    others: &Others,
    config: &TacticsConfig,
) -> Option<GridCoord> {
    let assault_alive = assault_alive(unit, others);
    others
        .allies(unit.team)
        .filter(|u| unit.visibility.contains(u.position) && kind.is_urgent(u, config, assault_alive))
        .min_by_key(|u| match kind {
            LogisticsKind::Medic => u.health,
            LogisticsKind::Supply => u.assault().map_or(i32::MAX, |a| a.ammo as i32),
        })
        .map(|u| u.position)
}

fn en_route(
    unit: &mut Unit,
    state: &mut LogisticsState,
    kind: LogisticsKind,
    others: &Others,
    ctx: &TickContext,
    target: GridCoord,
) {
    let assault_alive = assault_alive(unit, others);
    let patient = others
        .allies(unit.team)
        .filter(|u| kind.is_urgent(u, ctx.config, assault_alive))
        .min_by_key(|u| u.position.distance(&target))
        .map(|u| u.position);

    match patient {
        Some(at) => {
            approach(unit, others, ctx, at);
        }
        None => {
            debug!(unit = %unit.id, ?kind, "nobody left to service, returning to depot");
            state.mode = LogisticsMode::RechargeReturn;
            unit.route.clear();
        }
    }
}
