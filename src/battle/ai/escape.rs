//! Leaving concealment after the hiding limit
//!
//! Route to the nearest open cell first. If that fails, take any free
//! non-concealment neighbour. Assault units that have been at it too long
//! take any free neighbour at all.

use tracing::{debug, warn};

use crate::battle::ai::TickContext;
use crate::battle::execution::{BattleEventLog, BattleEventType};
use crate::battle::movement::{is_available, plan_route_onto, step_route};
use crate::battle::pathfinding::find_nearest_open;
use crate::battle::units::{Others, Role, Unit};

/// One escape step; returns true if the unit moved
pub fn step(unit: &mut Unit, others: &Others, ctx: &TickContext, events: &mut BattleEventLog) -> bool {
    let forced_after = ctx.config.stability.forced_escape;
    if unit.is_role(Role::Assault) && unit.guard.escape_elapsed >= forced_after {
        let any = unit
            .position
            .neighbors8()
            .into_iter()
            .find(|c| is_available(ctx.map, others, *c));
        if let Some(next) = any {
            debug!(unit = %unit.id, to = ?next, "forced out of concealment");
            unit.position = next;
            unit.route.clear();
            return true;
        }
    }

    if unit.route.is_exhausted() {
        if let Some(open) = find_nearest_open(ctx.map, unit.position, ctx.config.search.max_depth) {
            plan_route_onto(unit, others, ctx, open);
        }
    }
    if step_route(unit, others, ctx.map) {
        return true;
    }

    let fallback = unit
        .position
        .neighbors8()
        .into_iter()
        .find(|c| is_available(ctx.map, others, *c) && !ctx.map.is_concealment(*c));
    match fallback {
        Some(next) => {
            unit.position = next;
            unit.route.clear();
            true
        }
        None => {
            warn!(unit = %unit.id, team = %unit.team, at = ?unit.position, "surrounded, holding position");
            events.push(
                BattleEventType::Surrounded { unit_id: unit.id },
                format!("{} {} has nowhere to go", unit.team, unit.id),
                ctx.tick,
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::battle_map::BattleMap;
    use crate::battle::coord::GridCoord;
    use crate::battle::danger::DangerField;
    use crate::battle::terrain::CellKind;
    use crate::battle::units::Roster;
    use crate::core::config::TacticsConfig;
    use crate::core::types::Team;

    fn forest(size: usize, from: i32, to: i32) -> BattleMap {
        let mut map = BattleMap::new(size);
        for row in from..to {
            for col in from..to {
                map.set_terrain(GridCoord::new(row, col), CellKind::Tree);
            }
        }
        map
    }

    #[test]
    fn test_escape_walks_out_of_forest() {
        let map = forest(12, 3, 8);
        let danger = DangerField::new(12);
        let config = TacticsConfig::default();
        let mut roster = Roster::new();
        roster.spawn(&map, Team::Blue, Role::Medic, GridCoord::new(5, 5), &config).unwrap();
        let ctx = TickContext { map: &map, danger: &danger, config: &config, tick: 0 };
        let mut events = BattleEventLog::new();

        let (unit, others) = roster.split_actor(0).unwrap();
        let mut steps = 0;
        while map.is_concealment(unit.position) {
            assert!(step(unit, &others, &ctx, &mut events));
            steps += 1;
            assert!(steps <= 4);
        }
        assert_eq!(steps, 3);
    }

    #[test]
    fn test_surrounded_unit_stays_put() {
        let mut map = BattleMap::new(5);
        map.set_terrain(GridCoord::new(2, 2), CellKind::Tree);
        for n in GridCoord::new(2, 2).neighbors8() {
            map.set_terrain(n, CellKind::Rock);
        }
        let danger = DangerField::new(5);
        let config = TacticsConfig::default();
        let mut roster = Roster::new();
        roster.spawn(&map, Team::Orange, Role::Assault, GridCoord::new(2, 2), &config).unwrap();
        let ctx = TickContext { map: &map, danger: &danger, config: &config, tick: 3 };
        let mut events = BattleEventLog::new();

        let (unit, others) = roster.split_actor(0).unwrap();
        assert!(!step(unit, &others, &ctx, &mut events));
        assert_eq!(unit.position, GridCoord::new(2, 2));
        assert!(matches!(events.events[0].event_type, BattleEventType::Surrounded { .. }));
    }

    #[test]
    fn test_assault_forced_into_any_cell() {
        // Only tree cells around
        let map = forest(9, 0, 9);
        let danger = DangerField::new(9);
        let config = TacticsConfig::default();
        let mut roster = Roster::new();
        roster.spawn(&map, Team::Blue, Role::Assault, GridCoord::new(4, 4), &config).unwrap();
        let ctx = TickContext { map: &map, danger: &danger, config: &config, tick: 0 };
        let mut events = BattleEventLog::new();

        let (unit, others) = roster.split_actor(0).unwrap();
        unit.guard.escape_elapsed = config.stability.forced_escape;
        assert!(step(unit, &others, &ctx, &mut events));
        assert_eq!(unit.position, GridCoord::new(4, 5));
    }
}
