//! Standard skirmish deployment
//!
//! Each team starts in a cleared corner with its two depots and five units.
//! Orange mirrors Blue across the grid's diagonal.

use tracing::debug;

use crate::battle::battle_map::BattleMap;
use crate::battle::constants::HOME_CLEARING_SIZE;
use crate::battle::coord::GridCoord;
use crate::battle::execution::BattleState;
use crate::battle::terrain::CellKind;
use crate::battle::units::{Role, Roster};
use crate::core::config::TacticsConfig;
use crate::core::error::{Result, SkirmishError};
use crate::core::types::Team;

/// Smallest grid that fits both home clearings without overlap
pub const MIN_SCENARIO_SIZE: usize = 2 * HOME_CLEARING_SIZE;

fn mirror(size: usize, row: i32, col: i32) -> GridCoord {
    let n = size as i32;
    GridCoord::new(n - 1 - row, n - 1 - col)
}

fn place(size: usize, team: Team, row: i32, col: i32) -> GridCoord {
    match team {
        Team::Blue => GridCoord::new(row, col),
        Team::Orange => mirror(size, row, col),
    }
}

/// Starting cells in roster order: command, two assault, medic, supply
pub fn starting_positions(size: usize, team: Team) -> [(Role, GridCoord); 5] {
    [
        (Role::Command, place(size, team, 2, 2)),
        (Role::Assault, place(size, team, 2, 4)),
        (Role::Assault, place(size, team, 4, 2)),
        (Role::Medic, place(size, team, 6, 2)),
        (Role::Supply, place(size, team, 2, 6)),
    ]
}

/// Depot cells for a team as (ammo, medical)
pub fn depot_positions(size: usize, team: Team) -> (GridCoord, GridCoord) {
    (place(size, team, 1, 6), place(size, team, 6, 1))
}

/// Clear both home corners and lay down the depots
pub fn prepare_map(map: &mut BattleMap) -> Result<()> {
    if map.size < MIN_SCENARIO_SIZE {
        return Err(SkirmishError::MapTooSmall {
            size: map.size,
            min: MIN_SCENARIO_SIZE,
        });
    }

    let clearing = HOME_CLEARING_SIZE as i32;
    for row in 0..clearing {
        for col in 0..clearing {
            map.set_terrain(GridCoord::new(row, col), CellKind::Open);
            map.set_terrain(mirror(map.size, row, col), CellKind::Open);
        }
    }

    for team in Team::all() {
        let (ammo, medical) = depot_positions(map.size, team);
        map.set_terrain(ammo, CellKind::AmmoDepot);
        map.set_terrain(medical, CellKind::MedicalDepot);
    }
    Ok(())
}

/// Spawn both teams, Blue first
pub fn deploy(map: &BattleMap, config: &TacticsConfig) -> Result<Roster> {
    let mut roster = Roster::new();
    for team in Team::all() {
        for (role, pos) in starting_positions(map.size, team) {
            roster.spawn(map, team, role, pos, config)?;
        }
    }
    debug!(units = roster.len(), size = map.size, "deployed");
    Ok(roster)
}

/// Prepared map, deployed roster, ready to tick
pub fn standard_battle(mut map: BattleMap, config: TacticsConfig, seed: u64) -> Result<BattleState> {
    config.validate()?;
    prepare_map(&mut map)?;
    let roster = deploy(&map, &config)?;
    Ok(BattleState::new(map, roster, config, seed))
}
