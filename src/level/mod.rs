//! Procedural level generation
//!
//! Built once per level load and immutable afterwards:
//! - `grid`: seeded maze carving with a single exit
//! - `anchors`: decoration points on exposed wall faces
//! - `world`: box colliders for walls and the world boundary

pub mod anchors;
pub mod grid;
pub mod world;

pub use anchors::{AnchorTier, WallAnchor, extract};
pub use grid::{Direction, Grid};
pub use world::{Obstacle, SpatialWorld};

use glam::Vec3;
use rand::Rng;

use crate::error::{ConfigError, ensure_positive};
use crate::grid_to_world;
use crate::settings::SimSettings;

/// Random cells tried before a spawn falls back to the world center
const SPAWN_ATTEMPTS: usize = 64;

/// A generated level: grid, colliders, anchors and exit
#[derive(Debug, Clone)]
pub struct Level {
    pub seed: u64,
    pub grid: Grid,
    pub world: SpatialWorld,
    pub anchors: Vec<WallAnchor>,
    /// Ground-level center of the exit cell
    pub exit_position: Vec3,
    pub cell_size: f32,
}

/// Generate a level and everything derived from its grid
pub fn generate_level(width: usize, depth: usize, seed: u64, settings: &SimSettings) -> Result<Level, ConfigError> {
    ensure_positive("cell_size", settings.cell_size)?;
    ensure_positive("wall_height", settings.wall_height)?;

    let grid = Grid::generate(width, depth, seed)?;
    let world_size = settings.world_size(width, depth);
    let world = SpatialWorld::build(&grid, settings.cell_size, settings.wall_height, world_size);
    let anchors = anchors::extract(&grid, settings.cell_size, settings.wall_height);
    let (ex, ez) = grid.exit();
    let exit_position = grid_to_world(ex, ez, width, depth, settings.cell_size, 0.0);

    log::info!(
        "Level ready: {} obstacles, {} wall anchors, exit at ({:.1}, {:.1})",
        world.obstacles().len(),
        anchors.len(),
        exit_position.x,
        exit_position.z
    );

    Ok(Level {
        seed,
        grid,
        world,
        anchors,
        exit_position,
        cell_size: settings.cell_size,
    })
}

impl Level {
    /// World position of a cell center at height `y`
    pub fn cell_center(&self, x: usize, z: usize, y: f32) -> Vec3 {
        grid_to_world(x, z, self.grid.width(), self.grid.depth(), self.cell_size, y)
    }

    /// Grid cell containing a world position, if inside the maze
    pub fn world_to_grid(&self, pos: Vec3) -> Option<(usize, usize)> {
        let gx = (pos.x + self.grid.width() as f32 * self.cell_size / 2.0) / self.cell_size;
        let gz = (pos.z + self.grid.depth() as f32 * self.cell_size / 2.0) / self.cell_size;
        if !gx.is_finite() || !gz.is_finite() || gx < 0.0 || gz < 0.0 {
            return None;
        }
        let (x, z) = (gx.floor() as usize, gz.floor() as usize);
        (x < self.grid.width() && z < self.grid.depth()).then_some((x, z))
    }

    /// Pick a random open interior cell for spawning at height `y`
    ///
    /// Falls back to the world center once the attempts run out.
    pub fn find_spawn<R: Rng>(&self, rng: &mut R, y: f32) -> Vec3 {
        let (w, d) = (self.grid.width(), self.grid.depth());
        for _ in 0..SPAWN_ATTEMPTS {
            let x = rng.random_range(1..w - 1);
            let z = rng.random_range(1..d - 1);
            if self.grid.is_open(x, z) && (x, z) != self.grid.exit() {
                return self.cell_center(x, z, y);
            }
        }
        log::warn!("Spawn search exhausted after {SPAWN_ATTEMPTS} attempts, using world center");
        Vec3::new(0.0, y, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_generate_level_bundle() {
        let settings = SimSettings::default();
        let level = generate_level(12, 10, 99, &settings).unwrap();

        assert_eq!(level.world.obstacles().len(), level.world.wall_count() + 4);
        assert!(!level.anchors.is_empty());
        assert_eq!(level.world_to_grid(level.exit_position), Some(level.grid.exit()));
        assert_eq!(level.exit_position.y, 0.0);
    }

    #[test]
    fn test_generate_level_rejects_bad_layout() {
        let settings = SimSettings {
            cell_size: 0.0,
            ..Default::default()
        };
        assert!(generate_level(10, 10, 1, &settings).is_err());
        assert!(generate_level(2, 10, 1, &SimSettings::default()).is_err());
    }

    #[test]
    fn test_world_to_grid_round_trip() {
        let level = generate_level(10, 8, 5, &SimSettings::default()).unwrap();
        for (x, z) in [(0, 0), (3, 5), (9, 7)] {
            let p = level.cell_center(x, z, 1.0);
            assert_eq!(level.world_to_grid(p), Some((x, z)));
        }
        assert_eq!(level.world_to_grid(Vec3::new(1000.0, 0.0, 0.0)), None);
        assert_eq!(level.world_to_grid(Vec3::new(f32::NAN, 0.0, 0.0)), None);
    }

    #[test]
    fn test_find_spawn_lands_in_open_cell() {
        let level = generate_level(10, 10, 42, &SimSettings::default()).unwrap();
        let mut rng = Pcg32::seed_from_u64(1);
        for _ in 0..20 {
            let spawn = level.find_spawn(&mut rng, 1.5);
            let (x, z) = level.world_to_grid(spawn).unwrap();
            assert!(level.grid.is_open(x, z));
            assert_ne!((x, z), level.grid.exit());
            assert!((spawn.y - 1.5).abs() < 1e-6);
        }
    }

    #[test]
    fn test_find_spawn_falls_back_to_center() {
        let mut level = generate_level(10, 10, 42, &SimSettings::default()).unwrap();
        // Solid interior: nothing to spawn in
        level.grid = Grid::from_ascii(&["##E##", "#####", "#####", "#####", "#####"]);
        let mut rng = Pcg32::seed_from_u64(3);
        assert_eq!(level.find_spawn(&mut rng, 2.0), Vec3::new(0.0, 2.0, 0.0));
    }
}
