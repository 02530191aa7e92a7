//! Unit behaviour: one state machine per role
//!
//! Each invocation runs perception, then the stability guard, then the
//! role's own state machine. A unit commits at most one position change per
//! invocation.

pub mod assault;
pub mod command;
pub mod escape;
pub mod logistics;

pub use assault::{AssaultMode, AssaultState};
pub use command::CommandState;
pub use logistics::{LogisticsKind, LogisticsMode, LogisticsState};

use rand::Rng;

use crate::battle::battle_map::BattleMap;
use crate::battle::danger::DangerField;
use crate::battle::execution::BattleEventLog;
use crate::battle::stability::{run_guard, GuardOutcome};
use crate::battle::units::{RoleState, Roster};
use crate::core::config::TacticsConfig;
use crate::core::types::Tick;

/// Read-only world inputs for one tick
#[derive(Debug, Clone, Copy)]
pub struct TickContext<'a> {
    pub map: &'a BattleMap,
    pub danger: &'a DangerField,
    pub config: &'a TacticsConfig,
    pub tick: Tick,
}

/// Run one behaviour invocation for the unit at `index` in the roster
///
/// Dead units are skipped. The caller decides the cadence.
pub fn update_unit(
    roster: &mut Roster,
    index: usize,
    ctx: &TickContext,
    rng: &mut impl Rng,
    events: &mut BattleEventLog,
) {
    let Some((unit, mut others)) = roster.split_actor(index) else {
        return;
    };
    if !unit.alive {
        return;
    }

    unit.update_visibility(ctx.map, ctx.config.perception.visibility_range);

    match run_guard(unit, &others, ctx, events) {
        GuardOutcome::Moved => return,
        GuardOutcome::Escaping => {
            escape::step(unit, &others, ctx, events);
            return;
        }
        GuardOutcome::Clear => {}
    }

    match unit.role {
        RoleState::Assault(_) => assault::update(unit, &mut others, ctx, rng, events),
        RoleState::Medic(_) | RoleState::Supply(_) => logistics::update(unit, &mut others, ctx, events),
        RoleState::Command(_) => command::update(unit, &mut others, ctx, events),
    }
}
