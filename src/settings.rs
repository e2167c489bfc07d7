//! Simulation settings and tuning
//!
//! Loaded from JSON by the host; every field falls back to `consts`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{ConfigError, ensure_positive, ensure_range};

/// Arena size presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ArenaSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl ArenaSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArenaSize::Small => "Small",
            ArenaSize::Medium => "Medium",
            ArenaSize::Large => "Large",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "small" | "s" => Some(ArenaSize::Small),
            "medium" | "med" | "m" => Some(ArenaSize::Medium),
            "large" | "l" => Some(ArenaSize::Large),
            _ => None,
        }
    }

    /// Grid dimensions (width, depth) in cells
    pub fn dimensions(&self) -> (usize, usize) {
        match self {
            ArenaSize::Small => (10, 10),
            ArenaSize::Medium => (20, 20),
            ArenaSize::Large => (32, 28),
        }
    }
}

/// Physics and level layout tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimSettings {
    // === Player physics ===
    /// Gravity acceleration (units/s²)
    pub gravity: f32,
    /// Horizontal velocity multiplier per grounded tick, in (0, 1]
    pub ground_friction: f32,
    /// Input authority while airborne, in (0, 1]
    pub air_control: f32,
    /// Input acceleration (units/s²)
    pub move_accel: f32,
    /// Horizontal speed cap
    pub max_move_speed: f32,
    /// Vertical velocity set by a jump
    pub jump_impulse: f32,
    pub player_radius: f32,
    pub player_height: f32,

    // === Projectiles ===
    /// Gravity applied to projectiles before their own scale
    pub projectile_gravity: f32,

    // === Level layout ===
    /// World size of one grid cell
    pub cell_size: f32,
    pub wall_height: f32,
    /// Gap between the maze edge and the boundary walls
    pub world_margin: f32,
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            ground_friction: GROUND_FRICTION,
            air_control: AIR_CONTROL,
            move_accel: MOVE_ACCEL,
            max_move_speed: MAX_MOVE_SPEED,
            jump_impulse: JUMP_IMPULSE,
            player_radius: PLAYER_RADIUS,
            player_height: PLAYER_HEIGHT,

            projectile_gravity: PROJECTILE_GRAVITY,

            cell_size: CELL_SIZE,
            wall_height: WALL_HEIGHT,
            world_margin: WORLD_MARGIN,
        }
    }
}

impl SimSettings {
    /// Parse settings from JSON (missing fields take defaults)
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let settings: Self = serde_json::from_str(json).map_err(|e| ConfigError::Parse {
            details: e.to_string(),
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load and validate settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            details: e.to_string(),
        })?;
        let settings = Self::from_json_str(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            details: e.to_string(),
        })
    }

    /// Reject degenerate tunables
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_positive("gravity", self.gravity)?;
        ensure_range("ground_friction", self.ground_friction, f32::MIN_POSITIVE, 1.0)?;
        ensure_range("air_control", self.air_control, f32::MIN_POSITIVE, 1.0)?;
        ensure_positive("move_accel", self.move_accel)?;
        ensure_positive("max_move_speed", self.max_move_speed)?;
        ensure_positive("jump_impulse", self.jump_impulse)?;
        ensure_positive("player_radius", self.player_radius)?;
        ensure_positive("player_height", self.player_height)?;
        ensure_range("projectile_gravity", self.projectile_gravity, 0.0, f32::MAX)?;
        ensure_positive("cell_size", self.cell_size)?;
        ensure_positive("wall_height", self.wall_height)?;
        ensure_range("world_margin", self.world_margin, 0.0, f32::MAX)?;
        Ok(())
    }

    /// Half-size of the square world enclosed by the boundary walls
    pub fn world_size(&self, width: usize, depth: usize) -> f32 {
        let half_x = width as f32 * self.cell_size / 2.0;
        let half_z = depth as f32 * self.cell_size / 2.0;
        half_x.max(half_z) + self.world_margin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(SimSettings::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let settings = SimSettings::from_json_str(r#"{ "gravity": 12.5, "cell_size": 2.0 }"#).unwrap();
        assert!((settings.gravity - 12.5).abs() < 1e-6);
        assert!((settings.cell_size - 2.0).abs() < 1e-6);
        assert!((settings.air_control - AIR_CONTROL).abs() < 1e-6);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            SimSettings::from_json_str(r#"{ "player_radius": 0.0 }"#),
            Err(ConfigError::NonPositive { field: "player_radius", .. })
        ));
        assert!(matches!(
            SimSettings::from_json_str(r#"{ "air_control": 1.5 }"#),
            Err(ConfigError::OutOfRange { field: "air_control", .. })
        ));
        assert!(matches!(
            SimSettings::from_json_str("not json"),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let err = SimSettings::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_json_round_trip() {
        let settings = SimSettings::default();
        let json = settings.to_json().unwrap();
        assert_eq!(SimSettings::from_json_str(&json).unwrap(), settings);
    }

    #[test]
    fn test_arena_size_presets() {
        assert_eq!(ArenaSize::from_str("MED"), Some(ArenaSize::Medium));
        assert_eq!(ArenaSize::from_str("huge"), None);
        assert_eq!(ArenaSize::Small.dimensions(), (10, 10));
        assert_eq!(ArenaSize::Large.as_str(), "Large");
    }

    #[test]
    fn test_world_size() {
        let settings = SimSettings {
            cell_size: 4.0,
            world_margin: 8.0,
            ..Default::default()
        };
        // 10 x 6 cells -> half extents 20 x 12, plus margin
        assert!((settings.world_size(10, 6) - 28.0).abs() < 1e-6);
    }
}
