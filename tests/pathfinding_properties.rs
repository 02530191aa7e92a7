//! Property tests for grid search and unit health bookkeeping

use std::collections::{HashMap, VecDeque};

use proptest::prelude::*;

use skirmish_ai::battle::*;
use skirmish_ai::core::config::TacticsConfig;
use skirmish_ai::core::types::{Team, UnitId};

const SIZE: usize = 12;

fn cell_strategy() -> impl Strategy<Value = CellKind> {
    prop_oneof![
        6 => Just(CellKind::Open),
        2 => Just(CellKind::Rock),
        1 => Just(CellKind::Water),
        2 => Just(CellKind::Tree),
    ]
}

fn map_strategy() -> impl Strategy<Value = BattleMap> {
    prop::collection::vec(cell_strategy(), SIZE * SIZE).prop_map(|cells| {
        let mut map = BattleMap::new(SIZE);
        for (i, kind) in cells.into_iter().enumerate() {
            map.set_terrain(GridCoord::new((i / SIZE) as i32, (i % SIZE) as i32), kind);
        }
        map
    })
}

fn coord_strategy() -> impl Strategy<Value = GridCoord> {
    (0..SIZE as i32, 0..SIZE as i32).prop_map(|(row, col)| GridCoord::new(row, col))
}

/// Hops from `start` to the nearest cell next to `target`, by plain BFS
fn bfs_hops(map: &BattleMap, start: GridCoord, target: GridCoord) -> Option<usize> {
    let mut seen = HashMap::new();
    let mut queue = VecDeque::new();
    seen.insert(start, 0usize);
    queue.push_back(start);

    while let Some(coord) = queue.pop_front() {
        let hops = seen[&coord];
        if coord.distance(&target) <= 1 {
            return Some(hops);
        }
        for next in coord.neighbors() {
            if map.is_walkable(next) && !seen.contains_key(&next) {
                seen.insert(next, hops + 1);
                queue.push_back(next);
            }
        }
    }
    None
}

proptest! {
    /// Property: a found path is a connected walk ending next to the target
    #[test]
    fn prop_path_is_connected_and_ends_adjacent(
        map in map_strategy(),
        start in coord_strategy(),
        target in coord_strategy(),
    ) {
        let config = TacticsConfig::default();
        let danger = DangerField::new(SIZE);

        if let Some(path) = find_path(&map, &danger, &config.search, start, target, |_| false) {
            if start.distance(&target) > 1 {
                prop_assert!(!path.is_empty());
            }
            let end = path.last().copied().unwrap_or(start);
            prop_assert!(end.distance(&target) <= 1);

            let mut previous = start;
            for step in &path {
                prop_assert!(previous.is_adjacent(step));
                prop_assert!(map.is_walkable(*step));
                previous = *step;
            }
        }
    }

    /// Property: rock and water targets are never routed to
    #[test]
    fn prop_blocked_target_has_no_path(
        map in map_strategy(),
        start in coord_strategy(),
        target in coord_strategy(),
    ) {
        prop_assume!(!map.is_walkable(target));
        let config = TacticsConfig::default();
        let danger = DangerField::new(SIZE);

        prop_assert!(find_path(&map, &danger, &config.search, start, target, |_| false).is_none());
    }

    /// Property: with no danger and no traffic the search finds the
    /// shortest walk exactly when one exists
    #[test]
    fn prop_calm_search_matches_bfs(
        map in map_strategy(),
        start in coord_strategy(),
        target in coord_strategy(),
    ) {
        prop_assume!(map.is_walkable(target));
        let config = TacticsConfig::default();
        let danger = DangerField::new(SIZE);

        let found = find_path(&map, &danger, &config.search, start, target, |_| false);
        let expected = bfs_hops(&map, start, target);
        prop_assert_eq!(found.map(|p| p.len()), expected);
    }

    /// Property: health stays within 0..=100 and death is exactly health 0
    #[test]
    fn prop_health_is_clamped(
        hits in prop::collection::vec(-20i32..150, 1..12),
        heal_first in any::<bool>(),
    ) {
        let map = BattleMap::new(SIZE);
        let config = TacticsConfig::default();
        let mut roster = Roster::new();
        let id = roster.spawn(&map, Team::Blue, Role::Assault, GridCoord::new(3, 3), &config).unwrap();
        let unit = roster.get_mut(id).unwrap();

        if heal_first {
            unit.heal(config.logistics.heal_amount);
            prop_assert_eq!(unit.health, MAX_HEALTH);
        }
        for amount in hits {
            unit.take_damage(amount);
            prop_assert!((0..=MAX_HEALTH).contains(&unit.health));
            prop_assert_eq!(unit.alive, unit.health > 0);
        }
    }

    /// Property: an empty medic never takes an order
    #[test]
    fn prop_no_order_without_charge(target in coord_strategy(), recharge in any::<bool>()) {
        let map = BattleMap::new(SIZE);
        let config = TacticsConfig::default();
        let mut roster = Roster::new();
        roster.spawn(&map, Team::Orange, Role::Medic, GridCoord::new(6, 6), &config).unwrap();
        let medic = roster.get_mut(UnitId(0)).unwrap();

        medic.logistics_mut().unwrap().charges = 0;
        prop_assert!(!medic.receive_order(target));

        if recharge {
            medic.logistics_mut().unwrap().charges = config.logistics.max_charges;
            prop_assert!(medic.receive_order(target));
        }
        prop_assert!(medic.logistics().unwrap().charges <= 1);
    }
}
