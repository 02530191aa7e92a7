//! Tactics configuration loaded from TOML
//!
//! Every section falls back to the defaults in `battle::constants`, so a
//! config file only needs to name the values it changes.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::battle::constants::*;
use crate::core::error::{Result, SkirmishError};

/// Line-of-sight settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerceptionConfig {
    /// Maximum Manhattan distance a unit can see
    pub visibility_range: u32,
}

impl Default for PerceptionConfig {
    fn default() -> Self {
        Self {
            visibility_range: VISIBILITY_RANGE,
        }
    }
}

/// Weapons, health thresholds and damage rolls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    pub shooting_range: u32,
    /// Grenades reach targets with min < distance <= max
    pub grenade_min_range: u32,
    pub grenade_max_range: u32,
    pub bullet_damage: (i32, i32),
    pub grenade_damage: (i32, i32),
    /// Applied to every roll, result floored with a minimum of 1
    pub damage_factor: f64,
    pub max_ammo: u32,
    pub max_grenades: u32,
    /// Below this an assault unit asks for resupply
    pub low_ammo: u32,
    /// Below this any unit is critically wounded
    pub critical_health: i32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            shooting_range: SHOOTING_RANGE,
            grenade_min_range: GRENADE_MIN_RANGE,
            grenade_max_range: GRENADE_MAX_RANGE,
            bullet_damage: (BULLET_DAMAGE_MIN, BULLET_DAMAGE_MAX),
            grenade_damage: (GRENADE_DAMAGE_MIN, GRENADE_DAMAGE_MAX),
            damage_factor: DAMAGE_FACTOR,
            max_ammo: MAX_AMMO,
            max_grenades: MAX_GRENADES,
            low_ammo: LOW_AMMO,
            critical_health: CRITICAL_HEALTH,
        }
    }
}

/// Medic and resupply settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogisticsConfig {
    pub heal_amount: i32,
    pub resupply_ammo: u32,
    pub resupply_grenades: u32,
    pub max_charges: u8,
    /// Danger above this makes a unit step away from where it stands
    pub danger_threshold: i32,
}

impl Default for LogisticsConfig {
    fn default() -> Self {
        Self {
            heal_amount: HEAL_AMOUNT,
            resupply_ammo: RESUPPLY_AMMO,
            resupply_grenades: RESUPPLY_GRENADES,
            max_charges: MAX_CHARGES,
            danger_threshold: DANGER_THRESHOLD,
        }
    }
}

/// Path and breadth-limited search costs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub max_depth: u32,
    pub occupied_penalty: f64,
    /// Danger value is divided by this to get the per-step surcharge
    pub danger_divisor: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_depth: MAX_SEARCH_DEPTH,
            occupied_penalty: OCCUPIED_PENALTY,
            danger_divisor: DANGER_COST_DIVISOR,
        }
    }
}

/// Anti-stall safeguards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilityConfig {
    /// Behaviour invocations during which loop detection is suspended
    pub loop_break_cooldown: u32,
    /// Weighted ticks a unit may stay in concealment
    pub concealment_limit: u64,
    /// Weighted ticks of escaping after which assault units take any free cell
    pub forced_escape: u64,
}

impl Default for StabilityConfig {
    fn default() -> Self {
        Self {
            loop_break_cooldown: LOOP_BREAK_COOLDOWN,
            concealment_limit: CONCEALMENT_LIMIT_TICKS,
            forced_escape: FORCED_ESCAPE_TICKS,
        }
    }
}

/// Ticks between behaviour invocations per role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CadenceConfig {
    pub assault: u64,
    pub medic: u64,
    pub supply: u64,
    pub command: u64,
}

impl Default for CadenceConfig {
    fn default() -> Self {
        Self {
            assault: ASSAULT_MOVE_FREQ,
            medic: MEDIC_MOVE_FREQ,
            supply: SUPPLY_MOVE_FREQ,
            command: COMMAND_MOVE_FREQ,
        }
    }
}

/// Threat field falloff around sighted enemies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DangerConfig {
    pub peak: i32,
    pub falloff: i32,
    /// Added to the shooting range to get the stamp radius
    pub radius_margin: u32,
}

impl Default for DangerConfig {
    fn default() -> Self {
        Self {
            peak: DANGER_PEAK,
            falloff: DANGER_FALLOFF,
            radius_margin: DANGER_RADIUS_MARGIN,
        }
    }
}

/// Complete tactics configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TacticsConfig {
    pub perception: PerceptionConfig,
    pub combat: CombatConfig,
    pub logistics: LogisticsConfig,
    pub search: SearchConfig,
    pub stability: StabilityConfig,
    pub cadence: CadenceConfig,
    pub danger: DangerConfig,
}

impl TacticsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from TOML text and validate it
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: TacticsConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&contents)
    }

    /// Radius of the danger stamp around each sighted enemy
    pub fn danger_radius(&self) -> u32 {
        self.combat.shooting_range + self.danger.radius_margin
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        let combat = &self.combat;

        if combat.grenade_min_range >= combat.grenade_max_range {
            return Err(SkirmishError::InvalidConfig(format!(
                "grenade_min_range ({}) must be < grenade_max_range ({})",
                combat.grenade_min_range, combat.grenade_max_range
            )));
        }

        for (name, (lo, hi)) in [
            ("bullet_damage", combat.bullet_damage),
            ("grenade_damage", combat.grenade_damage),
        ] {
            if lo > hi || lo < 0 {
                return Err(SkirmishError::InvalidConfig(format!(
                    "{name} range ({lo}, {hi}) is empty or negative"
                )));
            }
        }

        if combat.critical_health <= 0 || combat.critical_health > MAX_HEALTH {
            return Err(SkirmishError::InvalidConfig(format!(
                "critical_health ({}) must be within 1..={}",
                combat.critical_health, MAX_HEALTH
            )));
        }

        if combat.low_ammo > combat.max_ammo {
            return Err(SkirmishError::InvalidConfig(format!(
                "low_ammo ({}) should be <= max_ammo ({})",
                combat.low_ammo, combat.max_ammo
            )));
        }

        if self.logistics.max_charges == 0 {
            return Err(SkirmishError::InvalidConfig(
                "max_charges must be at least 1".into(),
            ));
        }

        let cadence = &self.cadence;
        if [cadence.assault, cadence.medic, cadence.supply, cadence.command].contains(&0) {
            return Err(SkirmishError::InvalidConfig(
                "move frequencies must be non-zero".into(),
            ));
        }

        if self.search.danger_divisor <= 0.0 {
            return Err(SkirmishError::InvalidConfig(
                "danger_divisor must be positive".into(),
            ));
        }

        if self.stability.forced_escape > self.stability.concealment_limit {
            return Err(SkirmishError::InvalidConfig(format!(
                "forced_escape ({}) should be <= concealment_limit ({})",
                self.stability.forced_escape, self.stability.concealment_limit
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(TacticsConfig::default().validate().is_ok());
    }

    #[test]
    fn test_danger_radius() {
        let config = TacticsConfig::default();
        assert_eq!(config.danger_radius(), 10);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = TacticsConfig::from_toml_str(
            r#"
            [combat]
            shooting_range = 10

            [cadence]
            medic = 4
            "#,
        )
        .unwrap();

        assert_eq!(config.combat.shooting_range, 10);
        assert_eq!(config.combat.max_ammo, MAX_AMMO);
        assert_eq!(config.cadence.medic, 4);
        assert_eq!(config.cadence.assault, ASSAULT_MOVE_FREQ);
        assert_eq!(config.perception, PerceptionConfig::default());
    }

    #[test]
    fn test_invalid_grenade_window_rejected() {
        let result = TacticsConfig::from_toml_str(
            r#"
            [combat]
            grenade_min_range = 6
            grenade_max_range = 6
            "#,
        );
        assert!(matches!(result, Err(SkirmishError::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_cadence_rejected() {
        let mut config = TacticsConfig::default();
        config.cadence.supply = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_toml_is_error() {
        let result = TacticsConfig::from_toml_str("[combat\nshooting_range = ");
        assert!(matches!(result, Err(SkirmishError::TomlError(_))));
    }
}
