//! Wall-surface anchors for decoration placement
//!
//! Each wall cell that borders open space gets one facing (first open
//! neighbor in west, east, north, south order) and three anchors stacked
//! on that face.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::grid::{Direction, Grid};
use crate::grid_to_world;

/// Neighbor test order; the first open side wins
const FACING_PRIORITY: [Direction; 4] = [Direction::West, Direction::East, Direction::North, Direction::South];

/// How far in front of the wall face anchors sit
const SURFACE_OFFSET: f32 = 0.05;

/// Vertical placement of an anchor on its wall
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnchorTier {
    Low,
    Mid,
    High,
}

impl AnchorTier {
    pub const ALL: [AnchorTier; 3] = [AnchorTier::Low, AnchorTier::Mid, AnchorTier::High];

    /// Offset from the wall's vertical center, as a fraction of wall height
    pub fn height_fraction(&self) -> f32 {
        match self {
            AnchorTier::Low => -0.25,
            AnchorTier::Mid => 0.0,
            AnchorTier::High => 0.25,
        }
    }
}

/// A decoration point on a wall face
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WallAnchor {
    pub world_position: Vec3,
    /// Side of the wall cell that faces open space
    pub facing: Direction,
    pub grid_x: usize,
    pub grid_z: usize,
    pub tier: AnchorTier,
}

/// Facing of a wall cell, if any side is open
pub fn wall_facing(grid: &Grid, x: usize, z: usize) -> Option<Direction> {
    if grid.is_open(x, z) {
        return None;
    }
    FACING_PRIORITY.into_iter().find(|&dir| grid.is_open_toward(x, z, dir))
}

/// Scan the finished grid for exposed wall faces
pub fn extract(grid: &Grid, cell_size: f32, wall_height: f32) -> Vec<WallAnchor> {
    let mut anchors = Vec::new();
    let center_y = wall_height / 2.0;

    for z in 0..grid.depth() {
        for x in 0..grid.width() {
            let Some(facing) = wall_facing(grid, x, z) else {
                continue;
            };
            let center = grid_to_world(x, z, grid.width(), grid.depth(), cell_size, center_y);
            let face = center + facing.to_vec3() * (cell_size / 2.0 + SURFACE_OFFSET);

            for tier in AnchorTier::ALL {
                anchors.push(WallAnchor {
                    world_position: face + Vec3::Y * (tier.height_fraction() * wall_height),
                    facing,
                    grid_x: x,
                    grid_z: z,
                    tier,
                });
            }
        }
    }

    anchors
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_single_facing_priority() {
        // Center wall (2,2) is open west and east: west wins
        let grid = Grid::from_ascii(&[
            "##E##", //
            "#...#",
            "#.#.#",
            "#...#",
            "#####",
        ]);
        assert_eq!(wall_facing(&grid, 2, 2), Some(Direction::West));
        // Top-left corner has no open neighbor
        assert_eq!(wall_facing(&grid, 0, 0), None);
        // Open cells are never anchored
        assert_eq!(wall_facing(&grid, 1, 1), None);
        // North border wall next to the exit only sees the exit sideways
        assert_eq!(wall_facing(&grid, 1, 0), Some(Direction::East));
    }

    #[test]
    fn test_three_tiers_per_cell() {
        let grid = Grid::from_ascii(&["##E##", "#...#", "#.#.#", "#...#", "#####"]);
        let anchors = extract(&grid, 2.0, 4.0);
        let center: Vec<_> = anchors.iter().filter(|a| a.grid_x == 2 && a.grid_z == 2).collect();
        assert_eq!(center.len(), 3);
        assert!(center.iter().all(|a| a.facing == Direction::West));

        let heights: Vec<f32> = center.iter().map(|a| a.world_position.y).collect();
        assert!((heights[0] - 1.0).abs() < 1e-5);
        assert!((heights[1] - 2.0).abs() < 1e-5);
        assert!((heights[2] - 3.0).abs() < 1e-5);

        // Anchor sits on the west face of the cell centered at x = 0
        assert!((center[1].world_position.x - (-1.05)).abs() < 1e-5);
        assert_eq!(anchors.len() % 3, 0);
    }

    proptest! {
        #[test]
        fn prop_anchors_face_open_space(seed in any::<u64>(), width in 5usize..24, depth in 5usize..24) {
            let grid = Grid::generate(width, depth, seed).unwrap();
            for anchor in extract(&grid, 4.0, 6.0) {
                prop_assert!(grid.is_wall(anchor.grid_x, anchor.grid_z));
                prop_assert!(grid.is_open_toward(anchor.grid_x, anchor.grid_z, anchor.facing));
            }
        }
    }
}
