//! Projectile list ownership and the per-tick update pass

use glam::Vec3;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::Serialize;

use super::collision::resolve_projectile;
use super::events::{CollisionEvent, DamageEvent};
use super::kinematics::Capsule;
use super::projectile::{CollisionContext, Owner, Projectile, ProjectileKind, WeaponParams, fire};
use crate::error::ConfigError;
use crate::level::Obstacle;
use crate::sanitize_dt;

/// What happened during one update pass
#[derive(Debug, Clone, Default, Serialize)]
pub struct StepReport {
    pub collisions: Vec<CollisionEvent>,
    pub damage: Vec<DamageEvent>,
    /// Ids inserted this pass (cluster children)
    pub spawned: Vec<u32>,
    /// Ids reclaimed this pass
    pub removed: Vec<u32>,
}

/// Owns every live projectile (sorted by id)
///
/// Children produced mid-pass are staged and only join the live list once
/// the pass completes.
#[derive(Debug, Clone)]
pub struct ProjectileSimulator {
    projectiles: Vec<Projectile>,
    staged: Vec<Projectile>,
    rng: Pcg32,
    next_id: u32,
    gravity: f32,
}

impl ProjectileSimulator {
    pub fn new(seed: u64, gravity: f32) -> Self {
        Self {
            projectiles: Vec::new(),
            staged: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
            next_id: 1,
            gravity,
        }
    }

    /// Insert a projectile, assigning its id
    pub fn spawn(&mut self, mut projectile: Projectile) -> u32 {
        projectile.id = self.next_id;
        self.next_id += 1;
        let id = projectile.id;
        self.projectiles.push(projectile);
        id
    }

    /// Build a projectile from weapon parameters and insert it
    pub fn fire(
        &mut self,
        kind: ProjectileKind,
        origin: Vec3,
        direction: Vec3,
        params: &WeaponParams,
        owner: Owner,
    ) -> Result<u32, ConfigError> {
        let projectile = fire(kind, origin, direction, params)?.with_owner(owner);
        Ok(self.spawn(projectile))
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    pub fn get(&self, id: u32) -> Option<&Projectile> {
        self.projectiles.iter().find(|p| p.id == id)
    }

    pub fn len(&self) -> usize {
        self.projectiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projectiles.is_empty()
    }

    /// Drop everything (level change)
    pub fn clear(&mut self) {
        self.projectiles.clear();
        self.staged.clear();
    }

    /// Advance, collide and reclaim all projectiles for one tick
    pub fn step(&mut self, dt: f32, obstacles: &[Obstacle], player: &Capsule) -> StepReport {
        let mut report = StepReport::default();
        let dt = sanitize_dt(dt);
        if dt == 0.0 {
            return report;
        }

        let gravity = self.gravity;
        let mut ctx = CollisionContext {
            obstacles,
            player,
            rng: &mut self.rng,
            spawned: &mut self.staged,
            damage: &mut report.damage,
        };

        for projectile in self.projectiles.iter_mut().filter(|p| p.active) {
            projectile.apply_gravity(gravity, dt);
            projectile.integrate(dt);

            if let Some(event) = resolve_projectile(projectile, &mut ctx) {
                report.collisions.push(event);
            }

            // Lifetime runs independently of the collision state machine
            if projectile.tick_lifetime(dt) {
                log::debug!("Projectile {} expired", projectile.id);
            }
        }

        let removed = &mut report.removed;
        self.projectiles.retain(|p| {
            if !p.active {
                removed.push(p.id);
            }
            p.active
        });

        for mut child in self.staged.drain(..) {
            child.id = self.next_id;
            self.next_id += 1;
            report.spawned.push(child.id);
            self.projectiles.push(child);
        }

        report
    }
}
