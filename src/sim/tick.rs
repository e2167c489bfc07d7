//! Per-tick driver
//!
//! One call advances the whole session: player kinematics, wall correction,
//! optional firing, then the projectile pass against the same obstacles.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::collision::resolve_capsule;
use super::events::{CollisionEvent, DamageEvent};
use super::kinematics::{self, Capsule, MovementInput};
use super::projectile::{ProjectileKind, WeaponParams};
use super::state::GameState;
use crate::level::Obstacle;
use crate::sanitize_dt;
use crate::settings::SimSettings;

/// A weapon trigger pulled this tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FireCommand {
    pub kind: ProjectileKind,
    pub params: WeaponParams,
}

impl FireCommand {
    /// Trigger with the preset for `kind`
    pub fn preset(kind: ProjectileKind) -> Self {
        Self {
            kind,
            params: WeaponParams::for_kind(kind),
        }
    }
}

/// Input commands for a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TickInput {
    pub movement: MovementInput,
    pub fire: Option<FireCommand>,
}

/// Everything the host needs to read back after a tick
#[derive(Debug, Clone, Default, Serialize)]
pub struct TickReport {
    pub collisions: Vec<CollisionEvent>,
    pub damage: Vec<DamageEvent>,
    pub spawned: Vec<u32>,
    pub removed: Vec<u32>,
    /// Id of the projectile fired this tick
    pub fired: Option<u32>,
    /// Wall correction applied to the player
    pub player_correction: Vec3,
    pub reached_exit: bool,
}

/// Move the player and push it back out of any wall it entered
pub fn step_player(
    capsule: &mut Capsule,
    input: &MovementInput,
    dt: f32,
    obstacles: &[Obstacle],
    settings: &SimSettings,
) -> Vec3 {
    kinematics::step(capsule, input, dt, settings);
    resolve_capsule(capsule, obstacles)
}

/// Advance the session by one timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) -> TickReport {
    let dt = sanitize_dt(dt);

    let player_correction = step_player(
        &mut state.player,
        &input.movement,
        dt,
        state.level.world.obstacles(),
        &state.settings,
    );

    let fired = input.fire.and_then(|cmd| match state.fire(cmd.kind, &cmd.params) {
        Ok(id) => Some(id),
        Err(e) => {
            log::warn!("Rejected {:?} shot: {e}", cmd.kind);
            None
        }
    });

    let step = state
        .projectiles
        .step(dt, state.level.world.obstacles(), &state.player);

    if dt > 0.0 {
        state.time_ticks += 1;
    }

    TickReport {
        collisions: step.collisions,
        damage: step.damage,
        spawned: step.spawned,
        removed: step.removed,
        fired,
        player_correction,
        reached_exit: state.at_exit(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::sim::collision::capsule_box_penetration;

    fn walk_forward() -> TickInput {
        TickInput {
            movement: MovementInput {
                forward: true,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_tick_counts_and_settles() {
        let mut state = GameState::new(10, 10, 42, SimSettings::default()).unwrap();
        for _ in 0..10 {
            tick(&mut state, &TickInput::default(), SIM_DT);
        }
        assert_eq!(state.time_ticks, 10);
        assert!(state.player.on_ground);

        tick(&mut state, &TickInput::default(), f32::NAN);
        assert_eq!(state.time_ticks, 10);
    }

    #[test]
    fn test_walking_never_leaves_world() {
        let mut state = GameState::new(10, 10, 42, SimSettings::default()).unwrap();
        let limit = state.level.world.world_size();
        for i in 0..600 {
            let mut input = walk_forward();
            input.movement.look_delta.x = if i % 120 < 60 { 4.0 } else { -2.0 };
            tick(&mut state, &input, SIM_DT);
            assert!(state.player.position.x.abs() < limit);
            assert!(state.player.position.z.abs() < limit);
        }
    }

    #[test]
    fn test_wall_blocks_player() {
        let mut state = GameState::new(10, 10, 42, SimSettings::default()).unwrap();
        let wall = Obstacle::new(Vec3::new(0.0, 3.0, -2.0), Vec3::new(4.0, 3.0, 0.5));
        state.player.position = Vec3::new(0.0, state.player.ground_height(), 0.0);
        state.player.yaw = 0.0;

        for _ in 0..120 {
            step_player(&mut state.player, &walk_forward().movement, SIM_DT, &[wall], &state.settings);
            assert!(!capsule_box_penetration(&state.player, &wall).hit);
        }
        // Wall face at z = -1.5, so the center rests one radius short of it
        assert!((state.player.position.z + 1.0).abs() < 0.05);
    }

    #[test]
    fn test_box_top_has_ground_friction() {
        let settings = SimSettings::default();
        let block = Obstacle::new(Vec3::new(0.0, 0.5, 0.0), Vec3::new(3.0, 0.5, 3.0));
        let mut player = Capsule::new(Vec3::new(0.0, 2.501, 0.0), 0.5, 3.0).unwrap();
        player.on_ground = true;
        player.velocity.x = 5.0;

        for _ in 0..3 {
            let vx = player.velocity.x;
            step_player(&mut player, &MovementInput::default(), SIM_DT, &[block], &settings);
            assert!((player.velocity.x - vx * settings.ground_friction).abs() < 1e-4);
            assert!(player.on_ground);
            assert!(player.bottom() >= 1.0);
        }
    }

    #[test]
    fn test_fire_command_reports_id() {
        let mut state = GameState::new(10, 10, 8, SimSettings::default()).unwrap();
        let input = TickInput {
            fire: Some(FireCommand::preset(ProjectileKind::Bounce)),
            ..Default::default()
        };
        let report = tick(&mut state, &input, SIM_DT);
        let id = report.fired.unwrap();
        assert_eq!(state.projectiles.get(id).unwrap().kind(), ProjectileKind::Bounce);

        let bad = TickInput {
            fire: Some(FireCommand {
                kind: ProjectileKind::Straight,
                params: WeaponParams {
                    speed: -1.0,
                    ..WeaponParams::rifle()
                },
            }),
            ..Default::default()
        };
        assert_eq!(tick(&mut state, &bad, SIM_DT).fired, None);
    }

    #[test]
    fn test_reaching_exit_is_reported() {
        let mut state = GameState::new(10, 10, 42, SimSettings::default()).unwrap();
        let (ex, ez) = state.level.grid.exit();
        state.player.position = state.level.cell_center(ex, ez, state.player.ground_height());
        let report = tick(&mut state, &TickInput::default(), SIM_DT);
        assert!(report.reached_exit);
    }

    #[test]
    fn test_deterministic_replay() {
        let script = |i: u32| TickInput {
            movement: MovementInput {
                forward: i % 90 < 60,
                right: i % 50 < 10,
                jump: i % 75 == 0,
                look_delta: glam::Vec2::new(3.0, 0.5),
                ..Default::default()
            },
            fire: (i % 40 == 0).then(|| FireCommand::preset(ProjectileKind::Cluster)),
        };

        let run = || {
            let mut state = GameState::new(14, 12, 77, SimSettings::default()).unwrap();
            let mut events = 0;
            for i in 0..300 {
                events += tick(&mut state, &script(i), SIM_DT).collisions.len();
            }
            (state.player.position, state.projectiles.projectiles().to_vec(), events)
        };

        assert_eq!(run(), run());
    }
}
