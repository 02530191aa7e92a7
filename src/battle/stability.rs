//! Stability guard: cyclic-movement detection and concealment timeout
//!
//! Both checks run before any role behaviour. When either fires the unit's
//! route is dropped.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::battle::ai::TickContext;
use crate::battle::constants::POSITION_HISTORY_LEN;
use crate::battle::coord::GridCoord;
use crate::battle::execution::{BattleEventLog, BattleEventType};
use crate::battle::movement::is_available;
use crate::battle::units::{Others, Unit};

/// Ring buffer of recently recorded positions, oldest first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionHistory {
    cells: VecDeque<GridCoord>,
}

impl PositionHistory {
    pub fn push(&mut self, coord: GridCoord) {
        if self.cells.len() == POSITION_HISTORY_LEN {
            self.cells.pop_front();
        }
        self.cells.push_back(coord);
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Look for a repeating cycle of period 2, 3 or 4 at the end of the history
    ///
    /// A period-p cycle needs the last 2p entries to repeat with period p,
    /// with the p cells of one period all different. Returns the cells of the
    /// cycle.
    pub fn detect_cycle(&self) -> Option<Vec<GridCoord>> {
        (2..=4).find_map(|period| self.cycle_of(period))
    }

    fn cycle_of(&self, period: usize) -> Option<Vec<GridCoord>> {
        let window = period * 2;
        if self.cells.len() < window {
            return None;
        }
        let recent: Vec<GridCoord> = self.cells.iter().skip(self.cells.len() - window).copied().collect();

        if (period..window).any(|i| recent[i] != recent[i - period]) {
            return None;
        }

        let pattern = &recent[..period];
        let distinct = pattern
            .iter()
            .enumerate()
            .all(|(i, a)| pattern[i + 1..].iter().all(|b| a != b));
        distinct.then(|| pattern.to_vec())
    }
}

/// Per-unit anti-stall state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StabilityGuard {
    pub history: PositionHistory,
    /// Remaining invocations with loop detection suspended
    pub cooldown: u32,
    /// Weighted ticks spent on the current concealment cell run
    pub concealed_for: u64,
    escaping: bool,
    /// Weighted ticks spent in concealment since escaping began
    pub escape_elapsed: u64,
}

impl StabilityGuard {
    pub fn is_escaping(&self) -> bool {
        self.escaping
    }

    /// Record a position and check for a movement cycle
    ///
    /// Nothing is recorded while the cooldown runs.
    pub fn observe_position(&mut self, coord: GridCoord) -> Option<Vec<GridCoord>> {
        if self.cooldown > 0 {
            self.cooldown -= 1;
            return None;
        }
        self.history.push(coord);
        self.history.detect_cycle()
    }

    /// Forget the history and suspend detection for `cooldown` invocations
    pub fn arm_cooldown(&mut self, cooldown: u32) {
        self.history.clear();
        self.cooldown = cooldown;
    }

    /// Accumulate concealment time; returns true when escape must start
    pub fn update_concealment(&mut self, concealed: bool, weight: u64, limit: u64) -> bool {
        if !concealed {
            self.concealed_for = 0;
            return false;
        }

        self.concealed_for += weight;
        if self.escaping {
            self.escape_elapsed += weight;
            return false;
        }
        if self.concealed_for >= limit {
            self.escaping = true;
            self.escape_elapsed = 0;
            return true;
        }
        false
    }

    pub fn end_escape(&mut self) {
        self.escaping = false;
        self.concealed_for = 0;
        self.escape_elapsed = 0;
    }
}

/// What the guard decided for this invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Nothing to do, run the role behaviour
    Clear,
    /// The guard moved the unit; it is done for this tick
    Moved,
    /// The unit must leave concealment before anything else
    Escaping,
}

/// Run both checks for one behaviour invocation
pub fn run_guard(
    unit: &mut Unit,
    others: &Others,
    ctx: &TickContext,
    events: &mut BattleEventLog,
) -> GuardOutcome {
    let stability = &ctx.config.stability;
    let concealed = ctx.map.is_concealment(unit.position);

    if unit.guard.is_escaping() && !concealed {
        unit.guard.end_escape();
        unit.route.clear();
    }

    if let Some(pattern) = unit.guard.observe_position(unit.position) {
        let exit = unit
            .position
            .neighbors8()
            .into_iter()
            .find(|c| !pattern.contains(c) && is_available(ctx.map, others, *c));

        unit.guard.arm_cooldown(stability.loop_break_cooldown);
        unit.route.clear();

        info!(unit = %unit.id, team = %unit.team, period = pattern.len(), "movement loop broken");
        events.push(
            BattleEventType::LoopBroken { unit_id: unit.id },
            format!("{} {} broke a period-{} loop", unit.team, unit.id, pattern.len()),
            ctx.tick,
        );

        if let Some(exit) = exit {
            unit.position = exit;
            return GuardOutcome::Moved;
        }
    }

    if unit
        .guard
        .update_concealment(concealed, unit.move_frequency, stability.concealment_limit)
    {
        unit.route.clear();
        info!(unit = %unit.id, team = %unit.team, at = ?unit.position, "concealment limit reached");
        events.push(
            BattleEventType::ConcealmentEscape { unit_id: unit.id },
            format!("{} {} must leave concealment at {:?}", unit.team, unit.id, unit.position),
            ctx.tick,
        );
    }

    if unit.guard.is_escaping() {
        GuardOutcome::Escaping
    } else {
        GuardOutcome::Clear
    }
}
