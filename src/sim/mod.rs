//! Deterministic simulation module
//!
//! All per-tick logic lives here. This module must stay deterministic:
//! - Caller-supplied dt, sanitized and clamped
//! - Seeded RNG only
//! - Stable iteration order (by projectile id, obstacles by index)
//! - No rendering or platform dependencies

pub mod collision;
pub mod events;
pub mod kinematics;
pub mod projectile;
pub mod projectiles;
pub mod state;
pub mod tick;

pub use collision::{CollisionResult, Contact, capsule_box_penetration, reflect_velocity, resolve_capsule};
pub use events::{CollisionEvent, CollisionOutcome, DamageEvent, DamageTarget, Surface};
pub use kinematics::{Capsule, MovementInput};
pub use projectile::{Behavior, Owner, Projectile, ProjectileKind, WeaponParams, explosion_damage, fire};
pub use projectiles::{ProjectileSimulator, StepReport};
pub use state::GameState;
pub use tick::{FireCommand, TickInput, TickReport, step_player, tick};
