//! Arena Core headless runner
//!
//! Generates a level, drives a scripted session through the fixed-timestep
//! loop and logs what happened. Usage:
//!
//! ```text
//! arena-core [small|medium|large] [seed] [--settings path.json] [--dump]
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use glam::{Vec2, Vec3};
use serde::Serialize;

use arena_core::consts::{MAX_SUBSTEPS, SIM_DT};
use arena_core::level::{Obstacle, WallAnchor};
use arena_core::sim::{
    CollisionOutcome, DamageTarget, FireCommand, GameState, MovementInput, ProjectileKind, TickInput, tick,
};
use arena_core::{ArenaSize, ConfigError, Level, SimSettings};

/// Ticks in the scripted session (10 s at 60 Hz)
const SCRIPT_TICKS: u32 = 600;
/// Frame length the fake render loop reports (slightly slower than the sim)
const FRAME_DT: f32 = 1.0 / 50.0;

const WEAPON_CYCLE: [ProjectileKind; 4] = [
    ProjectileKind::Straight,
    ProjectileKind::Bounce,
    ProjectileKind::Cluster,
    ProjectileKind::Explosive,
];

#[derive(Parser)]
#[command(author, version, about = "Arena Core headless runner", long_about = None)]
struct Args {
    /// Arena size preset: small, medium or large
    #[arg(value_parser = parse_size, default_value = "medium")]
    size: ArenaSize,

    /// Level seed
    #[arg(default_value_t = 42)]
    seed: u64,

    /// JSON file overriding the default simulation settings
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Print the generated level as JSON before simulating
    #[arg(long, default_value_t = false)]
    dump: bool,
}

fn parse_size(s: &str) -> Result<ArenaSize, String> {
    ArenaSize::from_str(s).ok_or_else(|| format!("unknown arena size '{s}' (expected small, medium or large)"))
}

/// JSON view of a generated level
#[derive(Serialize)]
struct LevelSnapshot<'a> {
    seed: u64,
    width: usize,
    depth: usize,
    /// One string per row, `#` wall, `.` open, `E` exit
    rows: Vec<String>,
    exit_position: Vec3,
    anchors: &'a [WallAnchor],
    obstacles: &'a [Obstacle],
}

impl<'a> LevelSnapshot<'a> {
    fn new(level: &'a Level) -> Self {
        let grid = &level.grid;
        let rows = (0..grid.depth())
            .map(|z| {
                (0..grid.width())
                    .map(|x| match ((x, z) == grid.exit(), grid.is_open(x, z)) {
                        (true, _) => 'E',
                        (false, true) => '.',
                        (false, false) => '#',
                    })
                    .collect()
            })
            .collect();

        Self {
            seed: level.seed,
            width: grid.width(),
            depth: grid.depth(),
            rows,
            exit_position: level.exit_position,
            anchors: &level.anchors,
            obstacles: level.world.obstacles(),
        }
    }
}

/// Scripted input: walk in arcs, hop now and then, cycle weapons
fn scripted_input(t: u32) -> TickInput {
    let movement = MovementInput {
        forward: t % 120 < 90,
        left: (200..260).contains(&(t % 300)),
        jump: t % 150 == 75,
        look_delta: Vec2::new(if t % 240 < 120 { 6.0 } else { -4.0 }, 0.0),
        ..Default::default()
    };
    let fire = (t % 45 == 0).then(|| FireCommand::preset(WEAPON_CYCLE[(t / 45) as usize % WEAPON_CYCLE.len()]));
    TickInput { movement, fire }
}

#[derive(Default)]
struct SessionStats {
    fired: usize,
    bounces: usize,
    splits: usize,
    explosions: usize,
    player_damage: i32,
    wall_damage: i32,
    exit_reached_at: Option<u64>,
}

fn run(args: &Args) -> Result<(), ConfigError> {
    let settings = match &args.settings {
        Some(path) => SimSettings::load(path)?,
        None => SimSettings::default(),
    };
    let (width, depth) = args.size.dimensions();
    let mut state = GameState::new(width, depth, args.seed, settings)?;

    if args.dump {
        let json = serde_json::to_string_pretty(&LevelSnapshot::new(&state.level))
            .map_err(|e| ConfigError::Parse { details: e.to_string() })?;
        println!("{json}");
    }

    let mut stats = SessionStats::default();
    let mut accumulator = 0.0;
    let mut script_tick = 0;

    while script_tick < SCRIPT_TICKS {
        accumulator += FRAME_DT;
        let mut substeps = 0;
        while accumulator >= SIM_DT && substeps < MAX_SUBSTEPS && script_tick < SCRIPT_TICKS {
            let report = tick(&mut state, &scripted_input(script_tick), SIM_DT);
            accumulator -= SIM_DT;
            substeps += 1;
            script_tick += 1;

            stats.fired += usize::from(report.fired.is_some());
            for event in &report.collisions {
                match event.outcome {
                    CollisionOutcome::Bounced { .. } => stats.bounces += 1,
                    CollisionOutcome::Split { .. } => stats.splits += 1,
                    CollisionOutcome::Exploded => stats.explosions += 1,
                    CollisionOutcome::Deactivated => {}
                }
            }
            for hit in &report.damage {
                match hit.target {
                    DamageTarget::Player => stats.player_damage += hit.amount,
                    DamageTarget::Obstacle(_) => stats.wall_damage += hit.amount,
                }
            }
            if report.reached_exit && stats.exit_reached_at.is_none() {
                stats.exit_reached_at = Some(state.time_ticks);
                log::info!("Exit reached at tick {}", state.time_ticks);
            }
        }
    }

    log::info!(
        "Session done after {} ticks: {} shots, {} bounces, {} splits, {} explosions, {} projectiles live",
        state.time_ticks,
        stats.fired,
        stats.bounces,
        stats.splits,
        stats.explosions,
        state.projectiles.len()
    );
    log::info!(
        "Damage dealt: {} to walls, {} to player; player ended at ({:.2}, {:.2}, {:.2})",
        stats.wall_damage,
        stats.player_damage,
        state.player.position.x,
        state.player.position.y,
        state.player.position.z
    );
    Ok(())
}

fn main() -> ExitCode {
    #[cfg(not(target_arch = "wasm32"))]
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    log::info!("Arena Core starting: {} arena, seed {}", args.size.as_str(), args.seed);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
