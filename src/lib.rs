//! Arena Core - simulation core of a first-person maze arena shooter
//!
//! Core modules:
//! - `level`: Seeded maze carving, wall decoration anchors, obstacle boxes
//! - `sim`: Deterministic simulation (kinematics, collisions, projectiles)
//! - `settings`: Data-driven physics and level tuning
//! - `error`: Configuration errors rejected at the API boundary
//!
//! Rendering, input capture, audio and networking live outside this crate;
//! they call [`sim::tick`] once per frame and read back positions and events.

pub mod error;
pub mod level;
pub mod settings;
pub mod sim;

pub use error::ConfigError;
pub use level::{Level, generate_level};
pub use settings::{ArenaSize, SimSettings};

use glam::Vec3;

/// Simulation configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Largest dt a single tick will integrate (guards against frame hitches)
    pub const MAX_DT: f32 = 0.1;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Gravity acceleration (units/s²)
    pub const GRAVITY: f32 = 30.0;
    /// Horizontal velocity multiplier applied each grounded tick
    pub const GROUND_FRICTION: f32 = 0.85;
    /// Fraction of input acceleration available while airborne
    pub const AIR_CONTROL: f32 = 0.3;
    /// Input acceleration (units/s²)
    pub const MOVE_ACCEL: f32 = 90.0;
    /// Horizontal speed cap for the player
    pub const MAX_MOVE_SPEED: f32 = 12.0;
    /// Vertical velocity set by a jump
    pub const JUMP_IMPULSE: f32 = 10.0;
    /// Ground plane height
    pub const GROUND_Y: f32 = 0.0;

    /// Player capsule defaults
    pub const PLAYER_RADIUS: f32 = 0.5;
    pub const PLAYER_HEIGHT: f32 = 3.0;
    /// Eye height above the capsule center
    pub const PLAYER_EYE_OFFSET: f32 = 1.2;
    /// Radians of look per unit of look delta
    pub const LOOK_SENSITIVITY: f32 = 0.002;
    /// Pitch clamp (~89 degrees)
    pub const MAX_PITCH: f32 = 1.553;

    /// Level layout defaults
    pub const CELL_SIZE: f32 = 4.0;
    pub const WALL_HEIGHT: f32 = 6.0;
    /// Space between the maze edge and the boundary walls
    pub const WORLD_MARGIN: f32 = 8.0;
    pub const BOUNDARY_THICKNESS: f32 = 1.0;
    /// Smallest grid that still fits a border, an exit and its 3-cell corridor
    pub const MIN_GRID_SIZE: usize = 5;

    /// Skin distance left between capsule and wall after a push-out
    pub const CAPSULE_SKIN: f32 = 0.001;
    /// Distance a bouncing projectile is moved off the surface it hit
    pub const BOUNCE_SEPARATION: f32 = 0.01;
    /// Bounce projectiles slower than this are deactivated
    pub const MIN_BOUNCE_SPEED: f32 = 1.0;
    /// Time an exploded projectile lingers so the fade-out can play
    pub const EXPLOSION_GRACE: f32 = 0.5;
    /// Gravity applied to projectiles (scaled per projectile)
    pub const PROJECTILE_GRAVITY: f32 = 20.0;

    /// Cluster children
    pub const CLUSTER_CHILD_DAMAGE_FACTOR: f32 = 0.4;
    pub const CLUSTER_CHILD_RADIUS_FACTOR: f32 = 0.5;
    pub const CLUSTER_CHILD_MIN_SPEED: f32 = 8.0;
    pub const CLUSTER_CHILD_MAX_SPEED: f32 = 16.0;
    pub const CLUSTER_CHILD_MIN_LIFETIME: f32 = 0.8;
    pub const CLUSTER_CHILD_MAX_LIFETIME: f32 = 1.6;
}

/// Convert a grid cell to the world position of its center (at `y`)
///
/// The maze is centered on the origin: grid X maps to world X, grid Z to world Z.
#[inline]
pub fn grid_to_world(x: usize, z: usize, width: usize, depth: usize, cell_size: f32, y: f32) -> Vec3 {
    Vec3::new(
        (x as f32 + 0.5) * cell_size - width as f32 * cell_size / 2.0,
        y,
        (z as f32 + 0.5) * cell_size - depth as f32 * cell_size / 2.0,
    )
}

/// Unit vector along the dominant axis of `v`, keeping its sign
///
/// Ties resolve X, then Y, then Z. A zero vector yields +Y.
#[inline]
pub fn dominant_axis(v: Vec3) -> Vec3 {
    let a = v.abs();
    if a.x >= a.y && a.x >= a.z && a.x > 0.0 {
        Vec3::new(v.x.signum(), 0.0, 0.0)
    } else if a.y >= a.z && a.y > 0.0 {
        Vec3::new(0.0, v.y.signum(), 0.0)
    } else if a.z > 0.0 {
        Vec3::new(0.0, 0.0, v.z.signum())
    } else {
        Vec3::Y
    }
}

/// Clamp a frame delta into the range a tick can integrate
#[inline]
pub fn sanitize_dt(dt: f32) -> f32 {
    if dt.is_finite() && dt > 0.0 {
        dt.min(consts::MAX_DT)
    } else {
        0.0
    }
}
