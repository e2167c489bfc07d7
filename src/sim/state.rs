//! Session state: the current level, the player and live projectiles
//!
//! Everything a tick reads or writes lives here.

use glam::Vec3;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::kinematics::Capsule;
use super::projectile::{Owner, ProjectileKind, WeaponParams};
use super::projectiles::ProjectileSimulator;
use crate::consts::GROUND_Y;
use crate::error::ConfigError;
use crate::level::{Level, Obstacle, generate_level};
use crate::settings::SimSettings;

/// Stream offset so projectile randomness never mirrors the spawn search
const PROJECTILE_STREAM: u64 = 0x9e37_79b9_7f4a_7c15;

/// Complete simulation session
#[derive(Debug, Clone)]
pub struct GameState {
    /// Seed of the current level
    pub seed: u64,
    pub settings: SimSettings,
    /// Replaced wholesale on regeneration, never edited in place
    pub level: Level,
    pub player: Capsule,
    pub projectiles: ProjectileSimulator,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Spawn search RNG
    rng: Pcg32,
}

impl GameState {
    /// Generate a level and place the player on an open cell
    pub fn new(width: usize, depth: usize, seed: u64, settings: SimSettings) -> Result<Self, ConfigError> {
        settings.validate()?;
        let level = generate_level(width, depth, seed, &settings)?;
        let mut rng = Pcg32::seed_from_u64(seed);
        let player = spawn_player(&level, &settings, &mut rng)?;
        let projectiles = ProjectileSimulator::new(seed ^ PROJECTILE_STREAM, settings.projectile_gravity);

        log::info!(
            "Session started: {}x{} maze, seed {}, player at ({:.1}, {:.1})",
            width,
            depth,
            seed,
            player.position.x,
            player.position.z
        );

        Ok(Self {
            seed,
            settings,
            level,
            player,
            projectiles,
            time_ticks: 0,
            rng,
        })
    }

    /// Build a fresh level of the same size and swap it in
    ///
    /// On error the current level, player and projectiles are untouched.
    pub fn regenerate_level(&mut self, seed: u64) -> Result<(), ConfigError> {
        let (width, depth) = (self.level.grid.width(), self.level.grid.depth());
        let level = generate_level(width, depth, seed, &self.settings)?;
        let mut rng = Pcg32::seed_from_u64(seed);
        let player = spawn_player(&level, &self.settings, &mut rng)?;

        self.level = level;
        self.player = Capsule {
            yaw: self.player.yaw,
            pitch: self.player.pitch,
            ..player
        };
        self.rng = rng;
        self.seed = seed;
        self.projectiles.clear();

        log::info!("Level regenerated with seed {seed}");
        Ok(())
    }

    /// Fire a player-owned projectile from the eye along the look direction
    pub fn fire(&mut self, kind: ProjectileKind, params: &WeaponParams) -> Result<u32, ConfigError> {
        let origin = self.player.eye_position();
        let direction = self.player.look_direction();
        self.projectiles.fire(kind, origin, direction, params, Owner::Player)
    }

    /// Put the player back on a random open cell of the current level
    pub fn respawn_player(&mut self) {
        let y = GROUND_Y + self.player.height / 2.0;
        self.player.position = self.level.find_spawn(&mut self.rng, y);
        self.player.velocity = Vec3::ZERO;
        self.player.on_ground = true;
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        self.level.world.obstacles()
    }

    /// Whether the player is standing in the exit cell
    pub fn at_exit(&self) -> bool {
        self.level.world_to_grid(self.player.position) == Some(self.level.grid.exit())
    }
}

fn spawn_player(level: &Level, settings: &SimSettings, rng: &mut Pcg32) -> Result<Capsule, ConfigError> {
    let y = GROUND_Y + settings.player_height / 2.0;
    let mut player = Capsule::new(level.find_spawn(rng, y), settings.player_radius, settings.player_height)?;
    player.on_ground = true;
    Ok(player)
}
