//! Events handed back to the host after each tick
//!
//! The host turns these into effects, sounds and health changes.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::projectile::ProjectileKind;

/// What a projectile touched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Surface {
    Ground,
    /// Index into the obstacle list
    Obstacle(usize),
    Player,
}

/// Result of a projectile's collision response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollisionOutcome {
    Deactivated,
    Bounced { bounce_count: u8 },
    Split { children: u8 },
    /// Mesh hidden; the projectile lingers briefly for the fade-out
    Exploded,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollisionEvent {
    pub projectile_id: u32,
    pub kind: ProjectileKind,
    pub surface: Surface,
    pub point: Vec3,
    pub normal: Vec3,
    pub outcome: CollisionOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageTarget {
    Player,
    /// Index into the obstacle list
    Obstacle(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamageEvent {
    pub target: DamageTarget,
    pub amount: i32,
    /// Impact or blast center
    pub source: Vec3,
}
