//! Search engine: A* toward a goal and bounded breadth-first searches
//!
//! A* nodes live in an arena for the duration of one call and point at
//! their predecessor by index.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet, VecDeque};

use ordered_float::OrderedFloat;

use crate::battle::battle_map::BattleMap;
use crate::battle::coord::GridCoord;
use crate::battle::danger::DangerField;
use crate::core::config::SearchConfig;

/// Arena entry for one discovered cell
#[derive(Debug, Clone)]
struct SearchNode {
    coord: GridCoord,
    g_cost: f64,
    depth: u32,
    parent: Option<usize>,
}

/// Frontier key: (total cost, discovery order, arena index)
///
/// Equal totals pop in discovery order.
type FrontierEntry = Reverse<(OrderedFloat<f64>, u64, usize)>;

/// Cost of stepping onto `coord`
pub fn step_cost(
    danger: &DangerField,
    config: &SearchConfig,
    coord: GridCoord,
    occupied: bool,
) -> f64 {
    let mut cost = 1.0 + danger.get(coord) as f64 / config.danger_divisor;
    if occupied {
        cost += config.occupied_penalty;
    }
    cost
}

/// Find a path from `start` to a cell within distance 1 of `target`
///
/// The returned path excludes `start`. An empty path means the unit is
/// already next to the target. Returns None when the target cell cannot be
/// stood on or no cell next to it is reachable.
///
/// `is_occupied` reports cells held by other living units; they stay
/// passable but carry a heavy surcharge.
pub fn find_path(
    map: &BattleMap,
    danger: &DangerField,
    config: &SearchConfig,
    start: GridCoord,
    target: GridCoord,
    is_occupied: impl Fn(GridCoord) -> bool,
) -> Option<Vec<GridCoord>> {
    if !map.is_walkable(target) {
        return None;
    }
    if start.distance(&target) <= 1 {
        return Some(Vec::new());
    }

    let mut nodes: Vec<SearchNode> = Vec::new();
    let mut frontier: BinaryHeap<FrontierEntry> = BinaryHeap::new();
    // Best frontier node per cell
    let mut open: HashMap<GridCoord, usize> = HashMap::new();
    let mut closed: HashSet<GridCoord> = HashSet::new();
    let mut seq: u64 = 0;

    nodes.push(SearchNode {
        coord: start,
        g_cost: 0.0,
        depth: 0,
        parent: None,
    });
    open.insert(start, 0);
    frontier.push(Reverse((
        OrderedFloat(start.distance(&target) as f64),
        seq,
        0,
    )));

    while let Some(Reverse((_, _, idx))) = frontier.pop() {
        let current = nodes[idx].clone();

        // Stale entry: the cell was finalized or relabeled since this push
        if closed.contains(&current.coord) || open.get(&current.coord) != Some(&idx) {
            continue;
        }
        open.remove(&current.coord);
        closed.insert(current.coord);

        if current.coord.distance(&target) <= 1 {
            return Some(reconstruct_path(&nodes, idx));
        }

        for neighbor in current.coord.neighbors() {
            if !map.is_walkable(neighbor) || closed.contains(&neighbor) {
                continue;
            }

            let tentative_g =
                current.g_cost + step_cost(danger, config, neighbor, is_occupied(neighbor));

            if let Some(&existing) = open.get(&neighbor) {
                // Equal cost keeps the earlier entry
                if tentative_g >= nodes[existing].g_cost {
                    continue;
                }
            }

            let node_idx = nodes.len();
            nodes.push(SearchNode {
                coord: neighbor,
                g_cost: tentative_g,
                depth: current.depth + 1,
                parent: Some(idx),
            });
            open.insert(neighbor, node_idx);
            seq += 1;
            let f_cost = tentative_g + neighbor.distance(&target) as f64;
            frontier.push(Reverse((OrderedFloat(f_cost), seq, node_idx)));
        }
    }

    None
}

/// Walk parent indices back to the root, dropping the start cell
fn reconstruct_path(nodes: &[SearchNode], goal: usize) -> Vec<GridCoord> {
    let mut path = Vec::with_capacity(nodes[goal].depth as usize);
    let mut current = Some(goal);
    while let Some(idx) = current {
        let node = &nodes[idx];
        if node.parent.is_some() {
            path.push(node.coord);
        }
        current = node.parent;
    }
    path.reverse();
    path
}

/// Total step cost of walking a path
pub fn path_cost(
    danger: &DangerField,
    config: &SearchConfig,
    path: &[GridCoord],
    is_occupied: impl Fn(GridCoord) -> bool,
) -> f64 {
    path.iter()
        .map(|c| step_cost(danger, config, *c, is_occupied(*c)))
        .sum()
}

/// Breadth-first search for the nearest cell matching `predicate`
///
/// Expands 4-directionally through walkable cells up to `max_depth` hops.
/// The start cell never matches.
pub fn bounded_search(
    map: &BattleMap,
    start: GridCoord,
    max_depth: u32,
    predicate: impl Fn(GridCoord) -> bool,
) -> Option<GridCoord> {
    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();
    visited.insert(start);
    queue.push_back((start, 0u32));

    while let Some((coord, depth)) = queue.pop_front() {
        if coord != start && predicate(coord) {
            return Some(coord);
        }
        if depth >= max_depth {
            continue;
        }
        for neighbor in coord.neighbors() {
            if map.is_walkable(neighbor) && visited.insert(neighbor) {
                queue.push_back((neighbor, depth + 1));
            }
        }
    }

    None
}

/// Nearest cell next to rock or tree
pub fn find_nearest_cover(map: &BattleMap, start: GridCoord, max_depth: u32) -> Option<GridCoord> {
    bounded_search(map, start, max_depth, |c| map.is_cover(c))
}

/// Nearest cell outside concealment
pub fn find_nearest_open(map: &BattleMap, start: GridCoord, max_depth: u32) -> Option<GridCoord> {
    bounded_search(map, start, max_depth, |c| !map.is_concealment(c))
}
