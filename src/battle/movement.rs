//! Single-step movement helpers shared by every role
//!
//! All of these commit at most one position change. They return true when
//! the unit moved.

use crate::battle::ai::TickContext;
use crate::battle::battle_map::BattleMap;
use crate::battle::coord::{Direction, GridCoord};
use crate::battle::pathfinding::{find_nearest_cover, find_path};
use crate::battle::units::{Others, Unit};

/// Walkable and not held by another living unit
pub fn is_available(map: &BattleMap, others: &Others, coord: GridCoord) -> bool {
    map.is_walkable(coord) && !others.is_occupied(coord)
}

/// Plan a route to a cell next to `target`
///
/// Returns false (and leaves the route empty) when no path exists.
pub fn plan_route(unit: &mut Unit, others: &Others, ctx: &TickContext, target: GridCoord) -> bool {
    let path = find_path(
        ctx.map,
        ctx.danger,
        &ctx.config.search,
        unit.position,
        target,
        |c| others.is_occupied(c),
    );
    match path {
        Some(steps) => {
            unit.route.set(steps, target);
            true
        }
        None => {
            unit.route.clear();
            false
        }
    }
}

/// Plan a route that ends on `dest` itself rather than beside it
pub fn plan_route_onto(unit: &mut Unit, others: &Others, ctx: &TickContext, dest: GridCoord) -> bool {
    let path = find_path(
        ctx.map,
        ctx.danger,
        &ctx.config.search,
        unit.position,
        dest,
        |c| others.is_occupied(c),
    );
    match path {
        Some(mut steps) => {
            if unit.position != dest {
                steps.push(dest);
            }
            unit.route.set(steps, dest);
            true
        }
        None => {
            unit.route.clear();
            false
        }
    }
}

/// Take the next step of the current route
///
/// A blocked step drops the route; the caller replans next time.
pub fn step_route(unit: &mut Unit, others: &Others, map: &BattleMap) -> bool {
    while unit.route.peek() == Some(unit.position) {
        unit.route.advance();
    }

    let Some(next) = unit.route.peek() else {
        return false;
    };

    if next.is_adjacent(&unit.position) && is_available(map, others, next) {
        unit.position = next;
        unit.route.advance();
        true
    } else {
        unit.route.clear();
        false
    }
}

/// Follow (planning if needed) a route to a cell beside `target`
///
/// Replans when the route is used up or was planned toward another cell.
/// Falls back to a greedy step when no path exists.
pub fn approach(unit: &mut Unit, others: &Others, ctx: &TickContext, target: GridCoord) -> bool {
    if unit.position.distance(&target) <= 1 {
        unit.route.clear();
        return false;
    }

    if unit.route.is_exhausted() || unit.route.target() != Some(target) {
        plan_route(unit, others, ctx, target);
    }

    step_route(unit, others, ctx.map) || move_towards(unit, others, ctx.map, target)
}

/// Greedy step toward `target`
///
/// Tries the axis with the larger gap first, then the other axis, then any
/// direction in right, up, down, left order.
pub fn move_towards(unit: &mut Unit, others: &Others, map: &BattleMap, target: GridCoord) -> bool {
    let dr = target.row - unit.position.row;
    let dc = target.col - unit.position.col;

    let vertical = match dr.signum() {
        1 => Some(Direction::Down),
        -1 => Some(Direction::Up),
        _ => None,
    };
    let horizontal = match dc.signum() {
        1 => Some(Direction::Right),
        -1 => Some(Direction::Left),
        _ => None,
    };
    let (first, second) = if dr.abs() > dc.abs() {
        (vertical, horizontal)
    } else {
        (horizontal, vertical)
    };

    let candidates = [first, second]
        .into_iter()
        .flatten()
        .chain(Direction::ORTHOGONAL);

    for direction in candidates {
        let next = unit.position.offset(direction);
        if is_available(map, others, next) {
            unit.position = next;
            return true;
        }
    }
    false
}

/// First free orthogonal neighbour, right/up/down/left
pub fn try_unstuck(unit: &mut Unit, others: &Others, map: &BattleMap) -> bool {
    let free = unit
        .position
        .neighbors()
        .into_iter()
        .find(|c| is_available(map, others, *c));
    match free {
        Some(next) => {
            unit.position = next;
            unit.route.clear();
            true
        }
        None => false,
    }
}

/// Step to the orthogonal neighbour with strictly less danger than here
pub fn step_to_lowest_danger(unit: &mut Unit, others: &Others, ctx: &TickContext) -> bool {
    let mut best = unit.position;
    let mut best_danger = ctx.danger.get(unit.position);

    for neighbor in unit.position.neighbors() {
        if !is_available(ctx.map, others, neighbor) {
            continue;
        }
        let danger = ctx.danger.get(neighbor);
        if danger < best_danger {
            best = neighbor;
            best_danger = danger;
        }
    }

    if best == unit.position {
        return false;
    }
    unit.position = best;
    unit.route.clear();
    true
}

/// How an evasion step went
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evasion {
    /// Holding or heading for cover
    Cover,
    /// No cover in reach; stepped away from danger or tried to unstick
    Sidestep,
}

/// Low-health evasion shared by all roles
///
/// Heads for the nearest cover and holds there; without cover in reach,
/// steps to lower danger or tries to get unstuck.
pub fn evade(unit: &mut Unit, others: &Others, ctx: &TickContext) -> Evasion {
    let routed_to_cover = unit.route.target().is_some_and(|t| ctx.map.is_cover(t));
    if routed_to_cover && !unit.route.is_exhausted() {
        if step_route(unit, others, ctx.map) {
            return Evasion::Cover;
        }
    } else if ctx.map.is_cover(unit.position) {
        unit.route.clear();
        return Evasion::Cover;
    }

    if let Some(cover) = find_nearest_cover(ctx.map, unit.position, ctx.config.search.max_depth) {
        if plan_route_onto(unit, others, ctx, cover) {
            step_route(unit, others, ctx.map);
            return Evasion::Cover;
        }
    }

    if !step_to_lowest_danger(unit, others, ctx) {
        try_unstuck(unit, others, ctx.map);
    }
    Evasion::Sidestep
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::danger::DangerField;
    use crate::battle::terrain::CellKind;
    use crate::battle::units::{Role, Roster};
    use crate::core::config::TacticsConfig;
    use crate::core::types::Team;

    struct Fixture {
        map: BattleMap,
        danger: DangerField,
        config: TacticsConfig,
        roster: Roster,
    }

    impl Fixture {
        fn new(size: usize) -> Self {
            Self {
                map: BattleMap::new(size),
                danger: DangerField::new(size),
                config: TacticsConfig::default(),
                roster: Roster::new(),
            }
        }

        fn spawn(&mut self, team: Team, pos: (i32, i32)) {
            self.roster
                .spawn(&self.map, team, Role::Assault, pos.into(), &self.config)
                .unwrap();
        }

        fn ctx(&self) -> TickContext<'_> {
            TickContext {
                map: &self.map,
                danger: &self.danger,
                config: &self.config,
                tick: 0,
            }
        }
    }

    #[test]
    fn test_move_towards_prefers_dominant_axis() {
        let mut f = Fixture::new(10);
        f.spawn(Team::Blue, (5, 5));
        let (map, roster) = (&f.map, &mut f.roster);
        let (unit, others) = roster.split_actor(0).unwrap();

        assert!(move_towards(unit, &others, map, GridCoord::new(9, 6)));
        assert_eq!(unit.position, GridCoord::new(6, 5));

        assert!(move_towards(unit, &others, map, GridCoord::new(6, 0)));
        assert_eq!(unit.position, GridCoord::new(6, 4));
    }

    #[test]
    fn test_move_towards_falls_back_when_blocked() {
        let mut f = Fixture::new(10);
        f.map.set_terrain(GridCoord::new(5, 6), CellKind::Rock);
        f.spawn(Team::Blue, (5, 5));
        let (map, roster) = (&f.map, &mut f.roster);
        let (unit, others) = roster.split_actor(0).unwrap();

        // Straight right is blocked and there is no vertical gap
        assert!(move_towards(unit, &others, map, GridCoord::new(5, 9)));
        assert_eq!(unit.position, GridCoord::new(4, 5));
    }

    #[test]
    fn test_try_unstuck_order() {
        let mut f = Fixture::new(10);
        f.spawn(Team::Blue, (5, 5));
        f.spawn(Team::Orange, (5, 6));
        let (map, roster) = (&f.map, &mut f.roster);
        let (unit, others) = roster.split_actor(0).unwrap();

        assert!(try_unstuck(unit, &others, map));
        assert_eq!(unit.position, GridCoord::new(4, 5));
    }

    #[test]
    fn test_step_to_lowest_danger() {
        let mut f = Fixture::new(10);
        f.danger.raise(GridCoord::new(5, 8), 10, 100, 10);
        f.spawn(Team::Blue, (5, 5));
        let ctx = TickContext {
            map: &f.map,
            danger: &f.danger,
            config: &f.config,
            tick: 0,
        };
        let (unit, others) = f.roster.split_actor(0).unwrap();

        // Up, down and left tie at 60; the first one checked wins
        assert!(step_to_lowest_danger(unit, &others, &ctx));
        assert_eq!(unit.position, GridCoord::new(4, 5));
    }

    #[test]
    fn test_no_safer_neighbor_means_no_move() {
        let mut f = Fixture::new(10);
        f.spawn(Team::Blue, (5, 5));
        let ctx = TickContext {
            map: &f.map,
            danger: &f.danger,
            config: &f.config,
            tick: 0,
        };
        let (unit, others) = f.roster.split_actor(0).unwrap();
        assert!(!step_to_lowest_danger(unit, &others, &ctx));
        assert_eq!(unit.position, GridCoord::new(5, 5));
    }

    #[test]
    fn test_approach_stops_beside_target() {
        let mut f = Fixture::new(10);
        f.spawn(Team::Blue, (0, 0));
        let ctx = TickContext {
            map: &f.map,
            danger: &f.danger,
            config: &f.config,
            tick: 0,
        };
        let (unit, others) = f.roster.split_actor(0).unwrap();
        let target = GridCoord::new(0, 4);

        let mut moves = 0;
        while approach(unit, &others, &ctx, target) {
            moves += 1;
            assert!(moves < 10);
        }
        assert_eq!(moves, 3);
        assert_eq!(unit.position, GridCoord::new(0, 3));
    }

    #[test]
    fn test_step_route_drops_blocked_route() {
        let mut f = Fixture::new(10);
        f.spawn(Team::Blue, (0, 0));
        f.spawn(Team::Orange, (0, 2));
        let (map, roster) = (&f.map, &mut f.roster);
        let (unit, others) = roster.split_actor(0).unwrap();

        unit.route.set(vec![GridCoord::new(0, 1), GridCoord::new(0, 2)], GridCoord::new(0, 3));
        assert!(step_route(unit, &others, map));
        assert!(!step_route(unit, &others, map));
        assert!(unit.route.is_exhausted());
        assert_eq!(unit.position, GridCoord::new(0, 1));
    }

    #[test]
    fn test_evade_heads_for_cover() {
        let mut f = Fixture::new(12);
        f.map.set_terrain(GridCoord::new(5, 9), CellKind::Rock);
        f.spawn(Team::Blue, (5, 5));
        let ctx = f.ctx();
        let mut roster = f.roster.clone();
        let (unit, others) = roster.split_actor(0).unwrap();

        let mut steps = 0;
        while !ctx.map.is_cover(unit.position) {
            assert_eq!(evade(unit, &others, &ctx), Evasion::Cover);
            steps += 1;
            assert!(steps < 10);
        }
        assert_eq!(unit.position, GridCoord::new(5, 8));

        // Holds once there
        assert_eq!(evade(unit, &others, &ctx), Evasion::Cover);
        assert_eq!(unit.position, GridCoord::new(5, 8));
    }
}
