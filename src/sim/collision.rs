//! Collision detection and response against axis-aligned boxes
//!
//! Discrete per-tick overlap tests: the player capsule is pushed out along
//! the single axis of least penetration, projectiles are tested as points
//! against boxes padded by their radius and hand the hit to their variant.

use glam::Vec3;

use super::events::{CollisionEvent, CollisionOutcome, DamageEvent, DamageTarget, Surface};
use super::kinematics::Capsule;
use super::projectile::{Behavior, CollisionContext, Owner, Projectile};
use crate::consts::{CAPSULE_SKIN, GROUND_Y};
use crate::dominant_axis;
use crate::level::Obstacle;

/// Pushes with a vertical component above this count as floor contact
const VERTICAL_PUSH_EPSILON: f32 = 1e-4;

/// Result of a capsule-vs-box check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether a collision occurred
    pub hit: bool,
    /// Axis to push the capsule along (unit, single axis)
    pub normal: Vec3,
    /// Penetration depth along `normal`
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            normal: Vec3::ZERO,
            penetration: 0.0,
        }
    }
}

/// Where and how a projectile touched something
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Projectile center at the moment of contact
    pub point: Vec3,
    /// Approximate surface normal (dominant axis, not a true face normal)
    pub normal: Vec3,
    /// Nearest position where the projectile no longer overlaps the surface
    pub exit_position: Vec3,
}

impl Contact {
    /// Contact with the ground plane
    pub fn ground(position: Vec3, radius: f32) -> Self {
        Self {
            point: Vec3::new(position.x, GROUND_Y, position.z),
            normal: Vec3::Y,
            exit_position: Vec3::new(position.x, GROUND_Y + radius, position.z),
        }
    }
}

/// Standard reflection: v' = v - 2(v·n)n
#[inline]
pub fn reflect_velocity(velocity: Vec3, normal: Vec3) -> Vec3 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Capsule-vs-box penetration in the XZ plane (Minkowski slack)
///
/// Only the axis with the smaller correction is reported. The capsule can
/// also land on a box top when its center is above it and that push is the
/// smallest.
pub fn capsule_box_penetration(capsule: &Capsule, obstacle: &Obstacle) -> CollisionResult {
    let (bmin, bmax) = (obstacle.min(), obstacle.max());
    if capsule.bottom() >= bmax.y || capsule.top() <= bmin.y {
        return CollisionResult::miss();
    }

    let d = capsule.position - obstacle.center;
    let dx = d.x.abs() - (obstacle.half_extents.x + capsule.radius);
    let dz = d.z.abs() - (obstacle.half_extents.z + capsule.radius);
    if dx > 0.0 || dz > 0.0 {
        return CollisionResult::miss();
    }

    let (pen_x, pen_z) = (-dx, -dz);
    let pen_y = bmax.y - capsule.bottom();
    let sign = |v: f32| if v >= 0.0 { 1.0 } else { -1.0 };

    let (normal, penetration) = if capsule.position.y > bmax.y && pen_y < pen_x.min(pen_z) {
        (Vec3::Y, pen_y)
    } else if pen_x <= pen_z {
        (Vec3::new(sign(d.x), 0.0, 0.0), pen_x)
    } else {
        (Vec3::new(0.0, 0.0, sign(d.z)), pen_z)
    };

    CollisionResult {
        hit: true,
        normal,
        penetration,
    }
}

/// Push the capsule out of every overlapping obstacle; returns the total displacement
pub fn resolve_capsule(capsule: &mut Capsule, obstacles: &[Obstacle]) -> Vec3 {
    let start = capsule.position;

    for obstacle in obstacles {
        let result = capsule_box_penetration(capsule, obstacle);
        if !result.hit {
            continue;
        }

        let push = result.normal * (result.penetration + CAPSULE_SKIN);
        capsule.position += push;

        if push.y.abs() > VERTICAL_PUSH_EPSILON {
            capsule.velocity.y = 0.0;
            if push.y > 0.0 {
                capsule.on_ground = true;
            }
        } else {
            // Drop the velocity component driving into the wall
            let into = capsule.velocity.dot(result.normal);
            if into < 0.0 {
                capsule.velocity -= result.normal * into;
            }
        }
    }

    capsule.position - start
}

/// Dominant-axis normal from the box center toward the contact point
#[inline]
pub fn approximate_normal(obstacle: &Obstacle, point: Vec3) -> Vec3 {
    dominant_axis(point - obstacle.center)
}

/// Projectile contact with a box padded by the projectile radius
pub fn projectile_box_contact(position: Vec3, radius: f32, obstacle: &Obstacle) -> Option<Contact> {
    if !obstacle.contains_expanded(position, radius) {
        return None;
    }
    let normal = approximate_normal(obstacle, position);
    let axis = normal.abs();
    let face = obstacle.center + normal * (obstacle.half_extents + Vec3::splat(radius));
    Some(Contact {
        point: position,
        normal,
        exit_position: position * (Vec3::ONE - axis) + face * axis,
    })
}

/// Projectile sphere against the player capsule
pub fn projectile_capsule_contact(position: Vec3, radius: f32, capsule: &Capsule) -> Option<Contact> {
    let axis_point = capsule.closest_axis_point(position);
    let offset = position - axis_point;
    let reach = capsule.radius + radius;
    if offset.length_squared() >= reach * reach {
        return None;
    }
    let normal = offset.normalize_or(Vec3::Y);
    Some(Contact {
        point: position,
        normal,
        exit_position: axis_point + normal * reach,
    })
}

/// First contact for a projectile: ground, then obstacles in order, then the player
pub fn find_contact(projectile: &Projectile, obstacles: &[Obstacle], player: &Capsule) -> Option<(Surface, Contact)> {
    let (p, r) = (projectile.position, projectile.radius);

    if p.y <= GROUND_Y + r {
        return Some((Surface::Ground, Contact::ground(p, r)));
    }

    let wall_hit = obstacles
        .iter()
        .enumerate()
        .find_map(|(i, ob)| projectile_box_contact(p, r, ob).map(|c| (Surface::Obstacle(i), c)));
    if wall_hit.is_some() {
        return wall_hit;
    }

    if projectile.owner == Owner::Hostile {
        return projectile_capsule_contact(p, r, player).map(|c| (Surface::Player, c));
    }

    None
}

/// Detect a contact and run the projectile's collision response
pub fn resolve_projectile(projectile: &mut Projectile, ctx: &mut CollisionContext<'_>) -> Option<CollisionEvent> {
    if !projectile.active || !projectile.collides() {
        return None;
    }
    let (surface, contact) = find_contact(projectile, ctx.obstacles, ctx.player)?;

    // Explosives deal their damage through the blast instead
    if surface == Surface::Player && !matches!(projectile.behavior, Behavior::Explosive { .. }) {
        ctx.damage.push(DamageEvent {
            target: DamageTarget::Player,
            amount: projectile.damage,
            source: contact.point,
        });
    }

    let deactivate = match surface {
        Surface::Ground => projectile.on_ground_collision(ctx),
        Surface::Obstacle(_) | Surface::Player => projectile.on_collision(&contact, ctx),
    };
    if deactivate {
        projectile.active = false;
    }

    let outcome = match projectile.behavior {
        Behavior::Cluster { child_count, .. } => CollisionOutcome::Split { children: child_count },
        Behavior::Explosive { .. } => CollisionOutcome::Exploded,
        Behavior::Bounce { bounce_count, .. } if !deactivate => CollisionOutcome::Bounced { bounce_count },
        Behavior::Straight | Behavior::Bounce { .. } => CollisionOutcome::Deactivated,
    };

    Some(CollisionEvent {
        projectile_id: projectile.id,
        kind: projectile.kind(),
        surface,
        point: contact.point,
        normal: contact.normal,
        outcome,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::projectile::{ProjectileKind, WeaponParams, fire};
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn capsule_at(x: f32, y: f32, z: f32) -> Capsule {
        Capsule::new(Vec3::new(x, y, z), 0.5, 3.0).unwrap()
    }

    #[test]
    fn test_push_out_on_x() {
        let mut capsule = capsule_at(0.0, 1.8, 0.0);
        let obstacle = Obstacle::new(Vec3::new(1.0, 1.8, 0.0), Vec3::new(0.5, 1.5, 0.5));

        resolve_capsule(&mut capsule, &[obstacle]);
        assert!(capsule.position.x <= 0.0);
        assert_eq!(capsule.position.z, 0.0);
        assert!(!capsule_box_penetration(&capsule, &obstacle).hit);
    }

    #[test]
    fn test_push_picks_smaller_axis() {
        // Deep on X, shallow on Z
        let mut capsule = capsule_at(0.9, 1.5, -0.8);
        let obstacle = Obstacle::new(Vec3::new(1.0, 1.5, 0.0), Vec3::new(0.5, 1.5, 0.5));

        let result = capsule_box_penetration(&capsule, &obstacle);
        assert!(result.hit);
        assert_eq!(result.normal, Vec3::NEG_Z);
        assert!((result.penetration - 0.2).abs() < 1e-5);

        let moved = resolve_capsule(&mut capsule, &[obstacle]);
        assert_eq!(moved.x, 0.0);
        assert!(moved.z < 0.0);
    }

    #[test]
    fn test_no_vertical_overlap_no_hit() {
        let capsule = capsule_at(1.0, 10.0, 0.0);
        let obstacle = Obstacle::new(Vec3::new(1.0, 1.5, 0.0), Vec3::new(0.5, 1.5, 0.5));
        assert!(!capsule_box_penetration(&capsule, &obstacle).hit);
    }

    #[test]
    fn test_wall_push_kills_inward_velocity() {
        let mut capsule = capsule_at(0.1, 1.5, 0.0);
        capsule.velocity = Vec3::new(5.0, 0.0, 2.0);
        let obstacle = Obstacle::new(Vec3::new(1.0, 1.5, 0.0), Vec3::new(0.5, 1.5, 0.5));
        resolve_capsule(&mut capsule, &[obstacle]);
        assert_eq!(capsule.velocity.x, 0.0);
        assert_eq!(capsule.velocity.z, 2.0);
    }

    #[test]
    fn test_landing_on_box_top() {
        // Low block, capsule center above its top
        let obstacle = Obstacle::new(Vec3::new(0.0, 0.5, 0.0), Vec3::new(2.0, 0.5, 2.0));
        let mut capsule = capsule_at(0.0, 2.4, 0.0);
        capsule.velocity.y = -3.0;

        resolve_capsule(&mut capsule, &[obstacle]);
        assert!(capsule.bottom() > 1.0);
        assert_eq!(capsule.velocity.y, 0.0);
        assert!(capsule.on_ground);
    }

    #[test]
    fn test_approximate_normal_dominant_axis() {
        let obstacle = Obstacle::new(Vec3::ZERO, Vec3::splat(1.0));
        assert_eq!(approximate_normal(&obstacle, Vec3::new(1.1, 0.3, -0.2)), Vec3::X);
        assert_eq!(approximate_normal(&obstacle, Vec3::new(0.2, 0.1, -1.05)), Vec3::NEG_Z);
    }

    #[test]
    fn test_projectile_box_contact_exit_clears_box() {
        let obstacle = Obstacle::new(Vec3::new(0.0, 1.0, 0.0), Vec3::splat(1.0));
        let contact = projectile_box_contact(Vec3::new(1.05, 1.2, 0.3), 0.2, &obstacle).unwrap();
        assert_eq!(contact.normal, Vec3::X);
        assert!((contact.exit_position.x - 1.2).abs() < 1e-5);
        assert!((contact.exit_position.y - 1.2).abs() < 1e-5);

        assert!(projectile_box_contact(Vec3::new(1.5, 1.0, 0.0), 0.2, &obstacle).is_none());
    }

    #[test]
    fn test_ground_checked_before_obstacles() {
        let obstacle = Obstacle::new(Vec3::ZERO, Vec3::splat(1.0));
        let player = capsule_at(50.0, 1.5, 50.0);
        let p = fire(ProjectileKind::Straight, Vec3::new(0.5, 0.05, 0.0), Vec3::X, &WeaponParams::rifle()).unwrap();
        let (surface, _) = find_contact(&p, &[obstacle], &player).unwrap();
        assert_eq!(surface, Surface::Ground);
    }

    #[test]
    fn test_player_hit_only_for_hostile() {
        let player = capsule_at(0.0, 1.5, 0.0);
        let origin = Vec3::new(0.3, 1.5, 0.0);
        let friendly = fire(ProjectileKind::Straight, origin, Vec3::X, &WeaponParams::rifle()).unwrap();
        assert!(find_contact(&friendly, &[], &player).is_none());

        let hostile = friendly.clone().with_owner(Owner::Hostile);
        let (surface, contact) = find_contact(&hostile, &[], &player).unwrap();
        assert_eq!(surface, Surface::Player);
        assert_eq!(contact.normal, Vec3::X);
    }

    #[test]
    fn test_resolve_projectile_direct_hit_damage() {
        let player = capsule_at(0.0, 1.5, 0.0);
        let mut rng = Pcg32::seed_from_u64(5);
        let mut spawned = Vec::new();
        let mut damage = Vec::new();
        let mut ctx = CollisionContext {
            obstacles: &[],
            player: &player,
            rng: &mut rng,
            spawned: &mut spawned,
            damage: &mut damage,
        };

        let mut p = fire(ProjectileKind::Straight, Vec3::new(0.3, 1.5, 0.0), Vec3::NEG_X, &WeaponParams::rifle())
            .unwrap()
            .with_owner(Owner::Hostile);
        let event = resolve_projectile(&mut p, &mut ctx).unwrap();
        assert_eq!(event.surface, Surface::Player);
        assert_eq!(event.outcome, CollisionOutcome::Deactivated);
        assert!(!p.active);
        assert_eq!(damage.len(), 1);
        assert_eq!(damage[0].target, DamageTarget::Player);
        assert_eq!(damage[0].amount, WeaponParams::rifle().damage);
    }

    #[test]
    fn test_reflect_velocity() {
        let reflected = reflect_velocity(Vec3::new(3.0, -4.0, 0.0), Vec3::Y);
        assert!((reflected - Vec3::new(3.0, 4.0, 0.0)).length() < 1e-5);
    }

    proptest! {
        #[test]
        fn prop_capsule_correction_idempotent(
            x in -2.0f32..2.0,
            z in -2.0f32..2.0,
            y in 0.5f32..4.0,
            radius in 0.2f32..1.0,
        ) {
            let obstacle = Obstacle::new(Vec3::new(0.0, 1.5, 0.0), Vec3::new(0.75, 1.5, 0.5));
            let mut capsule = Capsule::new(Vec3::new(x, y, z), radius, 3.0).unwrap();

            resolve_capsule(&mut capsule, &[obstacle]);
            let second = resolve_capsule(&mut capsule, &[obstacle]);
            prop_assert_eq!(second, Vec3::ZERO);
        }
    }
}
