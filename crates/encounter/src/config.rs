use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Highest stage any skill chain can reach.
pub const MAX_SKILL_STAGE: u8 = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    pub normal_speed: f32,
    pub dash_speed: f32,
    pub dash_duration_seconds: f32,
    pub dash_cooldown_seconds: f32,
    pub berserk_dash_cooldown_seconds: f32,
    pub berserk_duration_seconds: f32,
    pub berserk_speed_multiplier: f32,
    /// Speed multiplier restored when a dash ends while berserk is active.
    pub post_dash_berserk_multiplier: f32,
    pub skill_stage_window_seconds: f32,
    pub skill1_lockout_seconds: f32,
    pub max_skill_stage: u8,
    pub turn_rate: f32,
    pub input_rotation_degrees: f32,
    pub max_health: u32,
    pub max_entropy: u32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            normal_speed: 4.5,
            dash_speed: 100.0,
            dash_duration_seconds: 0.05,
            dash_cooldown_seconds: 1.5,
            berserk_dash_cooldown_seconds: 0.5,
            berserk_duration_seconds: 10.0,
            berserk_speed_multiplier: 1.9,
            post_dash_berserk_multiplier: 1.5,
            skill_stage_window_seconds: 1.5,
            skill1_lockout_seconds: 0.4,
            max_skill_stage: MAX_SKILL_STAGE,
            turn_rate: 15.0,
            input_rotation_degrees: -45.0,
            max_health: 100,
            max_entropy: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyTuning {
    pub starting_health: u32,
    pub sight_range: f32,
    pub attack_range: f32,
    pub time_between_attacks_seconds: f32,
    pub walk_point_range: f32,
    pub walk_point_arrival_distance: f32,
    pub ground_probe_distance: f32,
    pub health_per_reward_drop: u32,
}

impl Default for EnemyTuning {
    fn default() -> Self {
        Self {
            starting_health: 30,
            sight_range: 10.0,
            attack_range: 2.0,
            time_between_attacks_seconds: 1.5,
            walk_point_range: 6.0,
            walk_point_arrival_distance: 1.0,
            ground_probe_distance: 2.0,
            health_per_reward_drop: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponTuning {
    pub base_damage: u32,
    pub attack_range: f32,
    pub probe_radius: f32,
    pub stage2_multiplier: f32,
    pub stage3_multiplier: f32,
    pub attack_point_offset: f32,
}

impl Default for WeaponTuning {
    fn default() -> Self {
        Self {
            base_damage: 10,
            attack_range: 2.0,
            probe_radius: 0.5,
            stage2_multiplier: 1.5,
            stage3_multiplier: 2.5,
            attack_point_offset: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClawTuning {
    pub damage: u32,
}

impl Default for ClawTuning {
    fn default() -> Self {
        Self { damage: 10 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverTuning {
    pub max_tick_dt_seconds: f32,
    pub rng_seed: u64,
    pub life_drop_heal: u32,
}

impl Default for DriverTuning {
    fn default() -> Self {
        Self {
            max_tick_dt_seconds: 0.25,
            rng_seed: 0,
            life_drop_heal: 5,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncounterConfig {
    pub player: PlayerTuning,
    pub enemy: EnemyTuning,
    pub weapon: WeaponTuning,
    pub claw: ClawTuning,
    pub driver: DriverTuning,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("parse config json: {source}")]
    Parse {
        #[source]
        source: serde_json::Error,
    },
    #[error("parse config json at {path}: {source}")]
    ParseAt {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config at {path}: expected {expected}, got {actual}")]
    Invalid {
        path: &'static str,
        expected: &'static str,
        actual: String,
    },
}

impl EncounterConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        let config = match serde_path_to_error::deserialize::<_, Self>(&mut deserializer) {
            Ok(config) => config,
            Err(error) => {
                let path = error.path().to_string();
                let source = error.into_inner();
                return Err(if path.is_empty() || path == "." {
                    ConfigError::Parse { source }
                } else {
                    ConfigError::ParseAt { path, source }
                });
            }
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let player = &self.player;
        positive("player.normal_speed", player.normal_speed)?;
        positive("player.dash_speed", player.dash_speed)?;
        positive("player.dash_duration_seconds", player.dash_duration_seconds)?;
        non_negative("player.dash_cooldown_seconds", player.dash_cooldown_seconds)?;
        non_negative(
            "player.berserk_dash_cooldown_seconds",
            player.berserk_dash_cooldown_seconds,
        )?;
        positive(
            "player.berserk_duration_seconds",
            player.berserk_duration_seconds,
        )?;
        positive(
            "player.berserk_speed_multiplier",
            player.berserk_speed_multiplier,
        )?;
        positive(
            "player.post_dash_berserk_multiplier",
            player.post_dash_berserk_multiplier,
        )?;
        positive(
            "player.skill_stage_window_seconds",
            player.skill_stage_window_seconds,
        )?;
        non_negative("player.skill1_lockout_seconds", player.skill1_lockout_seconds)?;
        positive("player.turn_rate", player.turn_rate)?;
        finite("player.input_rotation_degrees", player.input_rotation_degrees)?;
        if !(1..=MAX_SKILL_STAGE).contains(&player.max_skill_stage) {
            return Err(invalid(
                "player.max_skill_stage",
                "integer in 1..=3",
                player.max_skill_stage,
            ));
        }
        at_least_one("player.max_health", player.max_health)?;

        let enemy = &self.enemy;
        at_least_one("enemy.starting_health", enemy.starting_health)?;
        non_negative("enemy.sight_range", enemy.sight_range)?;
        non_negative("enemy.attack_range", enemy.attack_range)?;
        non_negative(
            "enemy.time_between_attacks_seconds",
            enemy.time_between_attacks_seconds,
        )?;
        positive("enemy.walk_point_range", enemy.walk_point_range)?;
        positive(
            "enemy.walk_point_arrival_distance",
            enemy.walk_point_arrival_distance,
        )?;
        positive("enemy.ground_probe_distance", enemy.ground_probe_distance)?;
        at_least_one("enemy.health_per_reward_drop", enemy.health_per_reward_drop)?;

        let weapon = &self.weapon;
        at_least_one("weapon.base_damage", weapon.base_damage)?;
        positive("weapon.attack_range", weapon.attack_range)?;
        positive("weapon.probe_radius", weapon.probe_radius)?;
        positive("weapon.stage2_multiplier", weapon.stage2_multiplier)?;
        positive("weapon.stage3_multiplier", weapon.stage3_multiplier)?;
        finite("weapon.attack_point_offset", weapon.attack_point_offset)?;

        positive(
            "driver.max_tick_dt_seconds",
            self.driver.max_tick_dt_seconds,
        )?;
        Ok(())
    }
}

fn invalid(path: &'static str, expected: &'static str, actual: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        path,
        expected,
        actual: actual.to_string(),
    }
}

fn finite(path: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(invalid(path, "finite number", value))
    }
}

fn positive(path: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(path, "finite number > 0", value))
    }
}

fn non_negative(path: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(path, "finite number >= 0", value))
    }
}

fn at_least_one(path: &'static str, value: u32) -> Result<(), ConfigError> {
    if value >= 1 {
        Ok(())
    } else {
        Err(invalid(path, "integer >= 1", value))
    }
}
