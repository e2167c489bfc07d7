//! Projectile types and per-variant collision behavior
//!
//! Four variants share one struct; the behavior enum carries the
//! variant-specific state and every response is an exhaustive match.

use glam::Vec3;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::{Contact, reflect_velocity};
use super::events::{DamageEvent, DamageTarget};
use super::kinematics::Capsule;
use crate::consts::*;
use crate::error::{ConfigError, ensure_positive, ensure_range};
use crate::level::Obstacle;

/// Projectile variant tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectileKind {
    Straight,
    Bounce,
    Cluster,
    Explosive,
}

/// Who fired the projectile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Owner {
    /// Passes through the player capsule
    #[default]
    Player,
    /// Collides with and damages the player
    Hostile,
}

/// Variant-specific state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Behavior {
    Straight,
    Bounce {
        bounce_count: u8,
        max_bounces: u8,
        /// Fraction of speed lost per bounce, in (0, 1)
        energy_loss: f32,
    },
    Cluster {
        has_split: bool,
        child_count: u8,
    },
    Explosive {
        explosion_radius: f32,
        max_explosion_damage: i32,
        has_exploded: bool,
    },
}

/// Weapon tunables supplied by the weapon configuration layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeaponParams {
    pub speed: f32,
    pub damage: i32,
    pub lifetime: f32,
    pub radius: f32,
    /// Packed RGB, passed through to the renderer
    pub color: u32,
    /// Multiplier on projectile gravity (0 = flies straight)
    pub gravity_scale: f32,
    pub max_bounces: u8,
    pub energy_loss: f32,
    pub cluster_count: u8,
    pub explosion_radius: f32,
    pub max_explosion_damage: i32,
}

impl Default for WeaponParams {
    fn default() -> Self {
        Self::rifle()
    }
}

impl WeaponParams {
    pub fn rifle() -> Self {
        Self {
            speed: 60.0,
            damage: 20,
            lifetime: 2.0,
            radius: 0.1,
            color: 0xffd84a,
            gravity_scale: 0.0,
            max_bounces: 0,
            energy_loss: 0.0,
            cluster_count: 0,
            explosion_radius: 0.0,
            max_explosion_damage: 0,
        }
    }

    pub fn bouncer() -> Self {
        Self {
            speed: 45.0,
            damage: 15,
            lifetime: 4.0,
            radius: 0.2,
            color: 0x4ad8ff,
            gravity_scale: 1.0,
            max_bounces: 3,
            energy_loss: 0.25,
            ..Self::rifle()
        }
    }

    pub fn cluster() -> Self {
        Self {
            speed: 30.0,
            damage: 25,
            lifetime: 3.0,
            radius: 0.3,
            color: 0xff7a2e,
            gravity_scale: 1.0,
            cluster_count: 6,
            ..Self::rifle()
        }
    }

    pub fn rocket() -> Self {
        Self {
            speed: 25.0,
            damage: 0,
            lifetime: 5.0,
            radius: 0.25,
            color: 0xff3b3b,
            gravity_scale: 0.25,
            explosion_radius: 6.0,
            max_explosion_damage: 100,
            ..Self::rifle()
        }
    }

    /// Preset matching a variant
    pub fn for_kind(kind: ProjectileKind) -> Self {
        match kind {
            ProjectileKind::Straight => Self::rifle(),
            ProjectileKind::Bounce => Self::bouncer(),
            ProjectileKind::Cluster => Self::cluster(),
            ProjectileKind::Explosive => Self::rocket(),
        }
    }
}

/// Shared collision context for one simulation pass
///
/// Children and damage are written to buffers owned by the caller and
/// merged after the pass.
pub struct CollisionContext<'a> {
    pub obstacles: &'a [Obstacle],
    pub player: &'a Capsule,
    pub rng: &'a mut Pcg32,
    pub spawned: &'a mut Vec<Projectile>,
    pub damage: &'a mut Vec<DamageEvent>,
}

/// A live projectile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    /// Assigned by the simulator (0 until inserted)
    pub id: u32,
    pub owner: Owner,
    pub position: Vec3,
    pub velocity: Vec3,
    pub radius: f32,
    pub color: u32,
    pub damage: i32,
    pub remaining_lifetime: f32,
    pub active: bool,
    /// Cleared when the mesh should be hidden (after an explosion)
    pub visible: bool,
    pub gravity_scale: f32,
    pub behavior: Behavior,
}

/// Build a projectile from weapon parameters
pub fn fire(
    kind: ProjectileKind,
    origin: Vec3,
    direction: Vec3,
    params: &WeaponParams,
) -> Result<Projectile, ConfigError> {
    if !origin.is_finite() {
        return Err(ConfigError::NonFinite { field: "origin" });
    }
    if !direction.is_finite() {
        return Err(ConfigError::NonFinite { field: "direction" });
    }
    let direction = direction.try_normalize().ok_or(ConfigError::ZeroDirection)?;
    ensure_positive("speed", params.speed)?;
    ensure_positive("lifetime", params.lifetime)?;
    ensure_positive("radius", params.radius)?;
    ensure_range("damage", params.damage as f32, 0.0, f32::MAX)?;
    ensure_range("gravity_scale", params.gravity_scale, 0.0, f32::MAX)?;

    let behavior = match kind {
        ProjectileKind::Straight => Behavior::Straight,
        ProjectileKind::Bounce => {
            ensure_range("max_bounces", params.max_bounces as f32, 1.0, u8::MAX as f32)?;
            ensure_range("energy_loss", params.energy_loss, 0.0, 1.0)?;
            if params.energy_loss <= 0.0 || params.energy_loss >= 1.0 {
                return Err(ConfigError::OutOfRange {
                    field: "energy_loss",
                    value: params.energy_loss,
                    min: 0.0,
                    max: 1.0,
                });
            }
            Behavior::Bounce {
                bounce_count: 0,
                max_bounces: params.max_bounces,
                energy_loss: params.energy_loss,
            }
        }
        ProjectileKind::Cluster => {
            ensure_range("cluster_count", params.cluster_count as f32, 1.0, u8::MAX as f32)?;
            Behavior::Cluster {
                has_split: false,
                child_count: params.cluster_count,
            }
        }
        ProjectileKind::Explosive => {
            ensure_positive("explosion_radius", params.explosion_radius)?;
            ensure_range("max_explosion_damage", params.max_explosion_damage as f32, 0.0, f32::MAX)?;
            Behavior::Explosive {
                explosion_radius: params.explosion_radius,
                max_explosion_damage: params.max_explosion_damage,
                has_exploded: false,
            }
        }
    };

    Ok(Projectile {
        id: 0,
        owner: Owner::Player,
        position: origin,
        velocity: direction * params.speed,
        radius: params.radius,
        color: params.color,
        damage: params.damage,
        remaining_lifetime: params.lifetime,
        active: true,
        visible: true,
        gravity_scale: params.gravity_scale,
        behavior,
    })
}

/// Linear falloff: `max_damage` at the center, 0 at and beyond `radius`
pub fn explosion_damage(distance: f32, radius: f32, max_damage: i32) -> i32 {
    // Written so NaN distances fall through to 0
    if !(radius > 0.0 && distance < radius) {
        return 0;
    }
    let falloff = 1.0 - distance.max(0.0) / radius;
    ((max_damage as f32 * falloff).round() as i32).clamp(0, max_damage.max(0))
}

/// Uniform direction in the hemisphere around `normal`
fn random_hemisphere_direction(rng: &mut Pcg32, normal: Vec3) -> Vec3 {
    for _ in 0..16 {
        let v = Vec3::new(
            rng.random_range(-1.0..=1.0),
            rng.random_range(-1.0..=1.0),
            rng.random_range(-1.0..=1.0),
        );
        let len_sq = v.length_squared();
        if len_sq > 1e-4 && len_sq <= 1.0 {
            let dir = v / len_sq.sqrt();
            return if dir.dot(normal) < 0.0 { -dir } else { dir };
        }
    }
    normal
}

impl Projectile {
    /// Builder-style owner override
    pub fn with_owner(mut self, owner: Owner) -> Self {
        self.owner = owner;
        self
    }

    pub fn kind(&self) -> ProjectileKind {
        match self.behavior {
            Behavior::Straight => ProjectileKind::Straight,
            Behavior::Bounce { .. } => ProjectileKind::Bounce,
            Behavior::Cluster { .. } => ProjectileKind::Cluster,
            Behavior::Explosive { .. } => ProjectileKind::Explosive,
        }
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    /// Exploded projectiles only linger for their fade-out
    pub fn collides(&self) -> bool {
        !matches!(self.behavior, Behavior::Explosive { has_exploded: true, .. })
    }

    pub fn apply_gravity(&mut self, gravity: f32, dt: f32) {
        match self.behavior {
            Behavior::Explosive { has_exploded: true, .. } => {}
            Behavior::Straight | Behavior::Bounce { .. } | Behavior::Cluster { .. } | Behavior::Explosive { .. } => {
                self.velocity.y -= gravity * self.gravity_scale * dt;
            }
        }
    }

    pub fn integrate(&mut self, dt: f32) {
        if self.collides() {
            self.position += self.velocity * dt;
        }
    }

    /// Count down lifetime; returns true when this tick expired it
    pub fn tick_lifetime(&mut self, dt: f32) -> bool {
        self.remaining_lifetime -= dt;
        if self.remaining_lifetime <= 0.0 {
            self.remaining_lifetime = 0.0;
            let expired = self.active;
            self.active = false;
            return expired;
        }
        false
    }

    /// Collision with a wall or the player; returns true to deactivate
    pub fn on_collision(&mut self, contact: &Contact, ctx: &mut CollisionContext<'_>) -> bool {
        match self.kind() {
            ProjectileKind::Straight => true,
            ProjectileKind::Bounce => self.bounce(contact),
            ProjectileKind::Cluster => self.split(contact, ctx),
            ProjectileKind::Explosive => self.explode(ctx),
        }
    }

    /// Collision with the ground plane; returns true to deactivate
    pub fn on_ground_collision(&mut self, ctx: &mut CollisionContext<'_>) -> bool {
        let contact = Contact::ground(self.position, self.radius);
        self.on_collision(&contact, ctx)
    }

    fn bounce(&mut self, contact: &Contact) -> bool {
        let Behavior::Bounce {
            bounce_count,
            max_bounces,
            energy_loss,
        } = &mut self.behavior
        else {
            return true;
        };

        self.velocity = reflect_velocity(self.velocity, contact.normal) * (1.0 - *energy_loss);
        *bounce_count = bounce_count.saturating_add(1);
        let spent = *bounce_count >= *max_bounces;

        self.position = contact.exit_position + contact.normal * BOUNCE_SEPARATION;
        spent || self.velocity.length() < MIN_BOUNCE_SPEED
    }

    fn split(&mut self, contact: &Contact, ctx: &mut CollisionContext<'_>) -> bool {
        let Behavior::Cluster { has_split, child_count } = &mut self.behavior else {
            return true;
        };
        if *has_split {
            return true;
        }
        *has_split = true;
        let count = *child_count;

        let child_radius = self.radius * CLUSTER_CHILD_RADIUS_FACTOR;
        // At least 1 so children of a damaging parent still hurt, never above the parent
        let child_damage = ((self.damage as f32 * CLUSTER_CHILD_DAMAGE_FACTOR).round() as i32)
            .max(1)
            .min(self.damage);
        let origin = contact.exit_position + contact.normal * child_radius;

        for _ in 0..count {
            let dir = random_hemisphere_direction(ctx.rng, contact.normal);
            let speed = ctx.rng.random_range(CLUSTER_CHILD_MIN_SPEED..CLUSTER_CHILD_MAX_SPEED);
            let lifetime = ctx.rng.random_range(CLUSTER_CHILD_MIN_LIFETIME..CLUSTER_CHILD_MAX_LIFETIME);
            ctx.spawned.push(Projectile {
                id: 0,
                owner: self.owner,
                position: origin,
                velocity: dir * speed,
                radius: child_radius,
                color: self.color,
                damage: child_damage,
                remaining_lifetime: lifetime,
                active: true,
                visible: true,
                gravity_scale: self.gravity_scale,
                behavior: Behavior::Straight,
            });
        }

        log::debug!("Cluster {} split into {} children at {:?}", self.id, count, origin);
        true
    }

    /// Falloff damage around the blast; stays nominally active for the fade-out
    fn explode(&mut self, ctx: &mut CollisionContext<'_>) -> bool {
        let Behavior::Explosive {
            explosion_radius,
            max_explosion_damage,
            has_exploded,
        } = &mut self.behavior
        else {
            return true;
        };
        if *has_exploded {
            return false;
        }
        *has_exploded = true;
        let (radius, max_damage) = (*explosion_radius, *max_explosion_damage);
        let center = self.position;

        for (index, obstacle) in ctx.obstacles.iter().enumerate() {
            let amount = explosion_damage(obstacle.distance_to(center), radius, max_damage);
            if amount > 0 {
                ctx.damage.push(DamageEvent {
                    target: DamageTarget::Obstacle(index),
                    amount,
                    source: center,
                });
            }
        }

        let amount = explosion_damage(ctx.player.distance_to(center), radius, max_damage);
        if amount > 0 {
            ctx.damage.push(DamageEvent {
                target: DamageTarget::Player,
                amount,
                source: center,
            });
        }

        self.velocity = Vec3::ZERO;
        self.visible = false;
        self.remaining_lifetime = self.remaining_lifetime.min(EXPLOSION_GRACE);
        log::debug!("Projectile {} exploded at {:?}", self.id, center);
        false
    }
}
