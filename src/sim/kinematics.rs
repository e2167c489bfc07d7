//! Player capsule kinematics
//!
//! Gravity, ground snapping, friction and input acceleration. Walls are
//! handled afterwards by the collision resolver.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::consts::{GROUND_Y, LOOK_SENSITIVITY, MAX_PITCH, PLAYER_EYE_OFFSET};
use crate::error::{ConfigError, ensure_positive};
use crate::sanitize_dt;
use crate::settings::SimSettings;

/// Player collision volume. `position` is the capsule center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Capsule {
    pub position: Vec3,
    pub velocity: Vec3,
    pub radius: f32,
    pub height: f32,
    pub on_ground: bool,
    /// Heading in radians (0 looks down -Z)
    pub yaw: f32,
    /// Look elevation in radians
    pub pitch: f32,
}

impl Capsule {
    /// Validated capsule at rest
    pub fn new(position: Vec3, radius: f32, height: f32) -> Result<Self, ConfigError> {
        if !position.is_finite() {
            return Err(ConfigError::NonFinite { field: "position" });
        }
        ensure_positive("radius", radius)?;
        ensure_positive("height", height)?;
        if height < 2.0 * radius {
            return Err(ConfigError::OutOfRange {
                field: "height",
                value: height,
                min: 2.0 * radius,
                max: f32::MAX,
            });
        }
        Ok(Self {
            position,
            velocity: Vec3::ZERO,
            radius,
            height,
            on_ground: false,
            yaw: 0.0,
            pitch: 0.0,
        })
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.position.y - self.height / 2.0
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.position.y + self.height / 2.0
    }

    /// Center height at which the capsule stands on the ground plane
    #[inline]
    pub fn ground_height(&self) -> f32 {
        GROUND_Y + self.height / 2.0
    }

    pub fn eye_position(&self) -> Vec3 {
        self.position + Vec3::Y * PLAYER_EYE_OFFSET
    }

    /// Unit look vector from yaw and pitch
    pub fn look_direction(&self) -> Vec3 {
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        Vec3::new(-sy * cp, sp, -cy * cp)
    }

    /// Closest point to `p` on the capsule's inner axis segment
    pub fn closest_axis_point(&self, p: Vec3) -> Vec3 {
        let half = (self.height / 2.0 - self.radius).max(0.0);
        let y = p.y.clamp(self.position.y - half, self.position.y + half);
        Vec3::new(self.position.x, y, self.position.z)
    }

    /// Distance from `p` to the capsule surface (0 when inside)
    pub fn distance_to(&self, p: Vec3) -> f32 {
        ((p - self.closest_axis_point(p)).length() - self.radius).max(0.0)
    }

    pub fn horizontal_speed(&self) -> f32 {
        Vec2::new(self.velocity.x, self.velocity.z).length()
    }
}

/// Movement snapshot for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MovementInput {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub jump: bool,
    /// Mouse delta since the last tick
    pub look_delta: Vec2,
}

impl MovementInput {
    /// Unit horizontal direction for the held keys, relative to `yaw`
    pub fn wish_direction(&self, yaw: f32) -> Vec3 {
        let mut local = Vec2::ZERO;
        if self.forward {
            local.y += 1.0;
        }
        if self.back {
            local.y -= 1.0;
        }
        if self.right {
            local.x += 1.0;
        }
        if self.left {
            local.x -= 1.0;
        }
        let local = local.normalize_or_zero();

        let (s, c) = yaw.sin_cos();
        let forward = Vec3::new(-s, 0.0, -c);
        let right = Vec3::new(c, 0.0, -s);
        forward * local.y + right * local.x
    }
}

/// Apply look delta; non-finite deltas are dropped
fn apply_look(capsule: &mut Capsule, look_delta: Vec2) {
    if !look_delta.is_finite() {
        return;
    }
    capsule.yaw -= look_delta.x * LOOK_SENSITIVITY;
    capsule.pitch = (capsule.pitch - look_delta.y * LOOK_SENSITIVITY).clamp(-MAX_PITCH, MAX_PITCH);
}

/// Advance the capsule by one tick (ground plane only, no walls)
///
/// `on_ground` left set by the previous wall correction (standing on a box
/// top) still counts as support for this tick's friction and control. The
/// flag itself is only kept for the ground plane; the resolver sets it again
/// while the capsule rests on a box.
pub fn step(capsule: &mut Capsule, input: &MovementInput, dt: f32, settings: &SimSettings) {
    apply_look(capsule, input.look_delta);

    let dt = sanitize_dt(dt);
    if dt == 0.0 {
        return;
    }

    let mut supported = capsule.on_ground;
    if input.jump && capsule.on_ground {
        capsule.velocity.y = settings.jump_impulse;
        capsule.on_ground = false;
        supported = false;
    }

    capsule.velocity.y -= settings.gravity * dt;

    let ground = capsule.ground_height();
    if capsule.position.y <= ground && capsule.velocity.y <= 0.0 {
        capsule.position.y = ground;
        capsule.velocity.y = 0.0;
        capsule.on_ground = true;
        supported = true;
    } else {
        capsule.on_ground = false;
    }

    if supported {
        capsule.velocity.x *= settings.ground_friction;
        capsule.velocity.z *= settings.ground_friction;
    }

    let control = if supported { 1.0 } else { settings.air_control };
    let accel = input.wish_direction(capsule.yaw) * settings.move_accel * control * dt;
    capsule.velocity.x += accel.x;
    capsule.velocity.z += accel.z;

    let horizontal = Vec2::new(capsule.velocity.x, capsule.velocity.z);
    if horizontal.length() > settings.max_move_speed {
        let clamped = horizontal.normalize() * settings.max_move_speed;
        capsule.velocity.x = clamped.x;
        capsule.velocity.z = clamped.y;
    }

    capsule.position += capsule.velocity * dt;

    // Never sink through the floor between ticks
    if capsule.position.y < ground {
        capsule.position.y = ground;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;

    fn standing() -> Capsule {
        let mut c = Capsule::new(Vec3::new(0.0, 1.5, 0.0), 0.5, 3.0).unwrap();
        c.on_ground = true;
        c
    }

    #[test]
    fn test_capsule_validation() {
        assert!(Capsule::new(Vec3::ZERO, 0.0, 3.0).is_err());
        assert!(Capsule::new(Vec3::ZERO, 0.5, -1.0).is_err());
        assert!(Capsule::new(Vec3::new(f32::NAN, 0.0, 0.0), 0.5, 3.0).is_err());
        assert!(matches!(
            Capsule::new(Vec3::ZERO, 1.0, 1.5),
            Err(ConfigError::OutOfRange { field: "height", .. })
        ));
        assert!(Capsule::new(Vec3::ZERO, 0.5, 3.0).is_ok());
    }

    #[test]
    fn test_falls_and_lands() {
        let settings = SimSettings::default();
        let mut c = Capsule::new(Vec3::new(0.0, 5.0, 0.0), 0.5, 3.0).unwrap();
        let input = MovementInput::default();

        step(&mut c, &input, SIM_DT, &settings);
        assert!(c.velocity.y < 0.0);
        assert!(!c.on_ground);

        for _ in 0..240 {
            step(&mut c, &input, SIM_DT, &settings);
        }
        assert!(c.on_ground);
        assert!((c.position.y - c.ground_height()).abs() < 1e-5);
        assert_eq!(c.velocity.y, 0.0);
    }

    #[test]
    fn test_jump_only_from_ground() {
        let settings = SimSettings::default();
        let mut c = standing();
        let jump = MovementInput {
            jump: true,
            ..Default::default()
        };

        step(&mut c, &jump, SIM_DT, &settings);
        assert!(!c.on_ground);
        let expected = settings.jump_impulse - settings.gravity * SIM_DT;
        assert!((c.velocity.y - expected).abs() < 1e-4);

        // Holding jump mid-air does not re-trigger
        let vy = c.velocity.y;
        step(&mut c, &jump, SIM_DT, &settings);
        assert!(c.velocity.y < vy);
    }

    #[test]
    fn test_forward_moves_along_look() {
        let settings = SimSettings::default();
        let mut c = standing();
        let input = MovementInput {
            forward: true,
            ..Default::default()
        };
        for _ in 0..30 {
            step(&mut c, &input, SIM_DT, &settings);
        }
        // Yaw 0 faces -Z
        assert!(c.position.z < 0.0);
        assert!(c.position.x.abs() < 1e-4);
        assert!(c.horizontal_speed() <= settings.max_move_speed + 1e-4);
    }

    #[test]
    fn test_air_control_is_weaker() {
        let settings = SimSettings::default();
        let input = MovementInput {
            right: true,
            ..Default::default()
        };

        let mut grounded = standing();
        step(&mut grounded, &input, SIM_DT, &settings);

        let mut airborne = Capsule::new(Vec3::new(0.0, 10.0, 0.0), 0.5, 3.0).unwrap();
        step(&mut airborne, &input, SIM_DT, &settings);

        assert!(airborne.velocity.x > 0.0);
        assert!(airborne.velocity.x < grounded.velocity.x);
    }

    #[test]
    fn test_friction_only_on_ground() {
        let settings = SimSettings::default();
        let idle = MovementInput::default();

        let mut grounded = standing();
        grounded.velocity.x = 5.0;
        step(&mut grounded, &idle, SIM_DT, &settings);
        assert!((grounded.velocity.x - 5.0 * settings.ground_friction).abs() < 1e-5);

        let mut airborne = Capsule::new(Vec3::new(0.0, 10.0, 0.0), 0.5, 3.0).unwrap();
        airborne.velocity.x = 5.0;
        step(&mut airborne, &idle, SIM_DT, &settings);
        assert!((airborne.velocity.x - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_support_lapses_after_one_tick() {
        let settings = SimSettings::default();
        let idle = MovementInput::default();
        // Resting on something above the plane, which then disappears
        let mut c = Capsule::new(Vec3::new(0.0, 4.0, 0.0), 0.5, 3.0).unwrap();
        c.on_ground = true;
        c.velocity.x = 5.0;

        step(&mut c, &idle, SIM_DT, &settings);
        assert!((c.velocity.x - 5.0 * settings.ground_friction).abs() < 1e-5);
        assert!(!c.on_ground);

        let vx = c.velocity.x;
        step(&mut c, &idle, SIM_DT, &settings);
        assert!((c.velocity.x - vx).abs() < 1e-5);
        assert!(c.velocity.y < 0.0);
    }

    #[test]
    fn test_look_clamps_and_ignores_nan() {
        let settings = SimSettings::default();
        let mut c = standing();
        let look_up = MovementInput {
            look_delta: Vec2::new(0.0, -1.0e6),
            ..Default::default()
        };
        step(&mut c, &look_up, SIM_DT, &settings);
        assert!((c.pitch - MAX_PITCH).abs() < 1e-6);

        let garbage = MovementInput {
            look_delta: Vec2::new(f32::NAN, 0.0),
            ..Default::default()
        };
        let yaw = c.yaw;
        step(&mut c, &garbage, SIM_DT, &settings);
        assert_eq!(c.yaw, yaw);
    }

    #[test]
    fn test_invalid_dt_is_noop() {
        let settings = SimSettings::default();
        let mut c = Capsule::new(Vec3::new(0.0, 5.0, 0.0), 0.5, 3.0).unwrap();
        let before = c;
        step(&mut c, &MovementInput::default(), f32::NAN, &settings);
        assert_eq!(c, before);
    }

    #[test]
    fn test_capsule_distance() {
        let c = Capsule::new(Vec3::new(0.0, 1.5, 0.0), 0.5, 3.0).unwrap();
        // Beside the axis
        assert!((c.distance_to(Vec3::new(2.0, 1.5, 0.0)) - 1.5).abs() < 1e-5);
        // Above the top cap (axis ends at y = 2.5)
        assert!((c.distance_to(Vec3::new(0.0, 4.0, 0.0)) - 1.0).abs() < 1e-5);
        assert_eq!(c.distance_to(c.position), 0.0);
    }
}
