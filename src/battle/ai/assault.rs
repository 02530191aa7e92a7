//! Assault unit behaviour
//!
//! Attack mode chases the nearest enemy. Below critical health the unit
//! switches to defense until healed back to the threshold: it looks for a
//! medic, then for resupply if low on ammo, then for cover. Both modes fire
//! at whatever is in range.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::battle::ai::TickContext;
use crate::battle::coord::GridCoord;
use crate::battle::execution::{BattleEventLog, BattleEventType};
use crate::battle::movement::{approach, evade, Evasion};
use crate::battle::units::{Others, Role, Unit};
use crate::core::config::TacticsConfig;
use crate::core::types::UnitId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AssaultMode {
    #[default]
    Attack,
    Defense,
    SeekCover,
    RetreatToMedic,
    RetreatToSupply,
}

impl AssaultMode {
    /// Any of the low-health modes
    pub fn is_defensive(&self) -> bool {
        !matches!(self, AssaultMode::Attack)
    }

    pub fn label(&self) -> &'static str {
        match self {
            AssaultMode::Attack => "ATTACK",
            AssaultMode::Defense => "DEFENSE",
            AssaultMode::SeekCover => "SEEK_COVER",
            AssaultMode::RetreatToMedic => "RETREAT_TO_MEDIC",
            AssaultMode::RetreatToSupply => "RETREAT_TO_SUPPLY",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssaultState {
    pub mode: AssaultMode,
    pub ammo: u32,
    pub grenades: u32,
    /// Enemy being chased and where it was when the route was planned
    pub chase: Option<(UnitId, GridCoord)>,
}

impl AssaultState {
    pub fn new(config: &TacticsConfig) -> Self {
        Self {
            mode: AssaultMode::Attack,
            ammo: config.combat.max_ammo,
            grenades: config.combat.max_grenades,
            chase: None,
        }
    }

    /// Add ammunition and grenades, capped at the maximums
    pub fn resupply(&mut self, config: &TacticsConfig) {
        self.ammo = (self.ammo + config.logistics.resupply_ammo).min(config.combat.max_ammo);
        self.grenades =
            (self.grenades + config.logistics.resupply_grenades).min(config.combat.max_grenades);
    }
}

/// Roll weapon damage: floor(factor × uniform(lo..=hi)), at least 1
pub fn roll_damage(rng: &mut impl Rng, (lo, hi): (i32, i32), factor: f64) -> i32 {
    let roll = rng.gen_range(lo..=hi);
    ((roll as f64 * factor).floor() as i32).max(1)
}

/// One assault behaviour invocation
pub fn update(
    unit: &mut Unit,
    others: &mut Others,
    ctx: &TickContext,
    rng: &mut impl Rng,
    events: &mut BattleEventLog,
) {
    let Some(mut state) = unit.assault().copied() else {
        return;
    };

    let critical = unit.is_critical(ctx.config);
    if critical && !state.mode.is_defensive() {
        debug!(unit = %unit.id, health = unit.health, "entering defense");
        state.mode = AssaultMode::Defense;
        state.chase = None;
        unit.route.clear();
    } else if !critical && state.mode.is_defensive() {
        debug!(unit = %unit.id, health = unit.health, "back to attack");
        state.mode = AssaultMode::Attack;
        unit.route.clear();
    }

    // Fire from the cell the visibility set was computed at
    shoot_at_enemy(unit, &mut state, others, ctx, rng, events);
    throw_grenade(unit, &mut state, others, ctx, rng, events);

    if state.mode.is_defensive() {
        defend(unit, &mut state, others, ctx);
    } else {
        attack(unit, &mut state, others, ctx);
    }

    if let Some(slot) = unit.assault_mut() {
        *slot = state;
    }
}

fn defend(unit: &mut Unit, state: &mut AssaultState, others: &Others, ctx: &TickContext) {
    let config = ctx.config;

    if unit.is_critical(config) {
        if let Some(medic) = nearest_helper(unit, others, Role::Medic) {
            state.mode = AssaultMode::RetreatToMedic;
            approach(unit, others, ctx, medic);
            return;
        }
    }

    if state.ammo < config.combat.low_ammo {
        if let Some(supply) = nearest_helper(unit, others, Role::Supply) {
            state.mode = AssaultMode::RetreatToSupply;
            approach(unit, others, ctx, supply);
            return;
        }
    }

    state.mode = match evade(unit, others, ctx) {
        Evasion::Cover => AssaultMode::SeekCover,
        Evasion::Sidestep => AssaultMode::Defense,
    };
}

/// Nearest teammate of `role` with a charge to spend
fn nearest_helper(unit: &Unit, others: &Others, role: Role) -> Option<GridCoord> {
    others
        .allies(unit.team)
        .filter(|u| u.is_role(role) && u.has_available_charge())
        .min_by_key(|u| u.position.distance(&unit.position))
        .map(|u| u.position)
}

fn attack(unit: &mut Unit, state: &mut AssaultState, others: &Others, ctx: &TickContext) {
    let target = others
        .enemies(unit.team)
        .min_by_key(|e| e.position.distance(&unit.position))
        .map(|e| (e.id, e.position));

    let Some((enemy, at)) = target else {
        state.chase = None;
        return;
    };

    if state.chase != Some((enemy, at)) {
        unit.route.clear();
        state.chase = Some((enemy, at));
    }
    approach(unit, others, ctx, at);
}

/// Fire one bullet at the first enemy in range and in sight
///
/// Sight is checked from the shooter's current cell. Returns true if a
/// shot was fired.
pub fn shoot_at_enemy(
    unit: &Unit,
    state: &mut AssaultState,
    others: &mut Others,
    ctx: &TickContext,
    rng: &mut impl Rng,
    events: &mut BattleEventLog,
) -> bool {
    let combat = &ctx.config.combat;
    if state.ammo == 0 {
        return false;
    }

    let range = combat.shooting_range;
    let Some(target) = others.iter_mut().find(|e| {
        e.is_enemy_of(unit.team)
            && unit.position.distance(&e.position) <= range
            && unit.visibility.contains(e.position)
            && ctx.map.has_line_of_sight(unit.position, e.position)
    }) else {
        return false;
    };

    let damage = roll_damage(rng, combat.bullet_damage, combat.damage_factor);
    state.ammo -= 1;
    let killed = target.take_damage(damage);

    events.push(
        BattleEventType::ShotFired {
            shooter: unit.id,
            target: target.id,
            damage,
        },
        format!("{} {} shot {} for {}", unit.team, unit.id, target.id, damage),
        ctx.tick,
    );
    if killed {
        report_kill(unit, target, ctx, events);
    }
    true
}

/// Throw one grenade at the first enemy in grenade range and in sight
pub fn throw_grenade(
    unit: &Unit,
    state: &mut AssaultState,
    others: &mut Others,
    ctx: &TickContext,
    rng: &mut impl Rng,
    events: &mut BattleEventLog,
) -> bool {
    let combat = &ctx.config.combat;
    if state.grenades == 0 {
        return false;
    }

    let Some(target) = others.iter_mut().find(|e| {
        let distance = unit.position.distance(&e.position);
        e.is_enemy_of(unit.team)
            && distance > combat.grenade_min_range
            && distance <= combat.grenade_max_range
            && unit.visibility.contains(e.position)
            && ctx.map.has_line_of_sight(unit.position, e.position)
    }) else {
        return false;
    };

    let damage = roll_damage(rng, combat.grenade_damage, combat.damage_factor);
    state.grenades -= 1;
    let killed = target.take_damage(damage);

    events.push(
        BattleEventType::GrenadeThrown {
            thrower: unit.id,
            target: target.id,
            damage,
        },
        format!("{} {} threw a grenade at {} for {}", unit.team, unit.id, target.id, damage),
        ctx.tick,
    );
    if killed {
        report_kill(unit, target, ctx, events);
    }
    true
}

fn report_kill(killer: &Unit, victim: &Unit, ctx: &TickContext, events: &mut BattleEventLog) {
    tracing::info!(killer = %killer.id, victim = %victim.id, team = %victim.team, "unit killed");
    events.push(
        BattleEventType::UnitKilled {
            unit_id: victim.id,
            by: killer.id,
        },
        format!("{} {} was killed by {}", victim.team, victim.id, killer.id),
        ctx.tick,
    );
}
