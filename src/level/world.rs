//! Static obstacle set: one box per wall cell plus four boundary walls
//!
//! The list is shared behind an `Arc` and only ever replaced whole, so a
//! resolver never observes a half-built level.

use std::sync::Arc;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::grid::Grid;
use crate::consts::BOUNDARY_THICKNESS;
use crate::grid_to_world;

/// Axis-aligned box collider
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub center: Vec3,
    pub half_extents: Vec3,
}

impl Obstacle {
    pub fn new(center: Vec3, half_extents: Vec3) -> Self {
        Self { center, half_extents }
    }

    #[inline]
    pub fn min(&self) -> Vec3 {
        self.center - self.half_extents
    }

    #[inline]
    pub fn max(&self) -> Vec3 {
        self.center + self.half_extents
    }

    /// Closest point of the box to `p` (p itself when inside)
    #[inline]
    pub fn closest_point(&self, p: Vec3) -> Vec3 {
        p.clamp(self.min(), self.max())
    }

    /// Distance from `p` to the box surface (0 when inside)
    #[inline]
    pub fn distance_to(&self, p: Vec3) -> f32 {
        (p - self.closest_point(p)).length()
    }

    /// Point overlap with the box padded by `pad` on all six faces
    #[inline]
    pub fn contains_expanded(&self, p: Vec3, pad: f32) -> bool {
        let d = (p - self.center).abs();
        let limit = self.half_extents + Vec3::splat(pad);
        d.x <= limit.x && d.y <= limit.y && d.z <= limit.z
    }
}

/// Obstacles queried by the collision resolver
#[derive(Debug, Clone)]
pub struct SpatialWorld {
    obstacles: Arc<[Obstacle]>,
    world_size: f32,
    wall_count: usize,
}

impl SpatialWorld {
    /// Box every wall cell and enclose the world at `±world_size`
    pub fn build(grid: &Grid, cell_size: f32, wall_height: f32, world_size: f32) -> Self {
        let half_cell = cell_size / 2.0;
        let half_height = wall_height / 2.0;
        let mut obstacles = Vec::new();

        for z in 0..grid.depth() {
            for x in 0..grid.width() {
                if grid.is_wall(x, z) {
                    let center = grid_to_world(x, z, grid.width(), grid.depth(), cell_size, half_height);
                    obstacles.push(Obstacle::new(center, Vec3::new(half_cell, half_height, half_cell)));
                }
            }
        }
        let wall_count = obstacles.len();

        obstacles.extend(boundary_walls(world_size, wall_height));

        log::debug!("Built spatial world: {} wall boxes + 4 boundary walls", wall_count);

        Self {
            obstacles: obstacles.into(),
            world_size,
            wall_count,
        }
    }

    /// World from an explicit obstacle list (no boundary added)
    pub fn from_obstacles(obstacles: Vec<Obstacle>, world_size: f32) -> Self {
        let wall_count = obstacles.len();
        Self {
            obstacles: obstacles.into(),
            world_size,
            wall_count,
        }
    }

    #[inline]
    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    /// Cheap handle to the current obstacle list
    pub fn shared(&self) -> Arc<[Obstacle]> {
        Arc::clone(&self.obstacles)
    }

    /// Half-size of the enclosed world
    pub fn world_size(&self) -> f32 {
        self.world_size
    }

    /// Number of carved-wall boxes (boundary walls follow them)
    pub fn wall_count(&self) -> usize {
        self.wall_count
    }
}

/// Thin full-perimeter boxes at ±world_size
fn boundary_walls(world_size: f32, wall_height: f32) -> [Obstacle; 4] {
    let half_t = BOUNDARY_THICKNESS / 2.0;
    let half_len = world_size + BOUNDARY_THICKNESS;
    let y = wall_height / 2.0;
    let along_x = Vec3::new(half_len, y, half_t);
    let along_z = Vec3::new(half_t, y, half_len);
    [
        Obstacle::new(Vec3::new(0.0, y, -world_size), along_x),
        Obstacle::new(Vec3::new(0.0, y, world_size), along_x),
        Obstacle::new(Vec3::new(-world_size, y, 0.0), along_z),
        Obstacle::new(Vec3::new(world_size, y, 0.0), along_z),
    ]
}
