//! Battle system constants - all tunable defaults in one place
//!
//! `TacticsConfig::default()` is built from these values. Time values are in
//! ticks at the 60-tick-per-second reference rate.

// Map
pub const DEFAULT_MAP_SIZE: usize = 30;
pub const HOME_CLEARING_SIZE: usize = 8;

// Health
pub const MAX_HEALTH: i32 = 100;
pub const CRITICAL_HEALTH: i32 = 40;

// Perception (Manhattan cells)
pub const VISIBILITY_RANGE: u32 = 15;

// Weapons
pub const MAX_AMMO: u32 = 15;
pub const LOW_AMMO: u32 = 5;
pub const MAX_GRENADES: u32 = 3;
pub const SHOOTING_RANGE: u32 = 8;
pub const GRENADE_MAX_RANGE: u32 = 6;
pub const GRENADE_MIN_RANGE: u32 = 2; // exclusive
pub const BULLET_DAMAGE_MIN: i32 = 5;
pub const BULLET_DAMAGE_MAX: i32 = 10;
pub const GRENADE_DAMAGE_MIN: i32 = 10;
pub const GRENADE_DAMAGE_MAX: i32 = 20;
pub const DAMAGE_FACTOR: f64 = 0.85;

// Logistics
pub const HEAL_AMOUNT: i32 = 100;
pub const RESUPPLY_AMMO: u32 = 10;
pub const RESUPPLY_GRENADES: u32 = 3;
pub const MAX_CHARGES: u8 = 1;
pub const DANGER_THRESHOLD: i32 = 30;

// Search
pub const MAX_SEARCH_DEPTH: u32 = 20;
pub const OCCUPIED_PENALTY: f64 = 50.0;
pub const DANGER_COST_DIVISOR: f64 = 10.0;

// Stability guard
pub const POSITION_HISTORY_LEN: usize = 8;
pub const LOOP_BREAK_COOLDOWN: u32 = 240;
pub const CONCEALMENT_LIMIT_TICKS: u64 = 600; // 10 seconds
pub const FORCED_ESCAPE_TICKS: u64 = 300; // 5 seconds

// Cadence (ticks between moves)
pub const ASSAULT_MOVE_FREQ: u64 = 30;
pub const MEDIC_MOVE_FREQ: u64 = 8;
pub const SUPPLY_MOVE_FREQ: u64 = 8;
pub const COMMAND_MOVE_FREQ: u64 = 30;

// Danger field
pub const DANGER_PEAK: i32 = 100;
pub const DANGER_FALLOFF: i32 = 10;
pub const DANGER_RADIUS_MARGIN: u32 = 2;
