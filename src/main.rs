//! Drift Rocks - headless runner
//!
//! Usage: `drift-rocks [tuning.json] [seed]`
//!
//! Plays a scripted session with a simple autopilot and logs what happens.
//! Set `RUST_LOG=debug` to follow spawns, splits and respawns.

#[cfg(not(target_arch = "wasm32"))]
use drift_rocks::effects::{FrameInput, LogEffects, ScoreBoard};
#[cfg(not(target_arch = "wasm32"))]
use drift_rocks::sim::{GameEvent, Simulation};
#[cfg(not(target_arch = "wasm32"))]
use drift_rocks::Tuning;

/// Frames in a scripted session (60 fps)
#[cfg(not(target_arch = "wasm32"))]
const SESSION_FRAMES: u32 = 60 * 90;
#[cfg(not(target_arch = "wasm32"))]
const FRAME_DT: f32 = 1.0 / 60.0;
#[cfg(not(target_arch = "wasm32"))]
const DEFAULT_SEED: u64 = 12345;

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Drift Rocks (headless) starting...");

    let mut args = std::env::args().skip(1);
    let tuning = match args.next() {
        Some(path) => match Tuning::load(&path) {
            Ok(tuning) => tuning,
            Err(e) => {
                log::error!("Failed to load tuning from {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => Tuning::default(),
    };
    let seed = match args.next() {
        Some(raw) => match raw.parse::<u64>() {
            Ok(seed) => seed,
            Err(e) => {
                log::error!("Invalid seed '{}': {}", raw, e);
                std::process::exit(1);
            }
        },
        None => DEFAULT_SEED,
    };

    let mut sim = Simulation::new(tuning, seed);
    let mut effects = LogEffects::default();
    let mut score = ScoreBoard::default();
    let mut asteroids_destroyed = 0u32;
    let mut ship_deaths = 0u32;

    for frame in 0..SESSION_FRAMES {
        let input = autopilot(&sim, frame);
        sim.frame(&input, FRAME_DT);

        for event in sim.drain_events() {
            match event {
                GameEvent::AsteroidDestroyed { .. } => asteroids_destroyed += 1,
                GameEvent::ShipDestroyed { .. } => ship_deaths += 1,
                _ => {}
            }
            event.dispatch(&mut effects, &mut score);
        }
    }

    let director = sim.director();
    log::info!(
        "Session over after {:.1}s: score {}, {} asteroids destroyed, {} ship deaths",
        sim.state().now_secs(),
        score.score,
        asteroids_destroyed,
        ship_deaths
    );
    log::info!(
        "Director: {} of {} top-level spawns issued, {} live, delay {:.2}s",
        director.spawned_top_level(),
        sim.tuning().director.asteroids_to_spawn,
        director.live_count(),
        director.current_delay()
    );
    log::info!(
        "Requests: {} effects, {} sounds",
        effects.effects_played,
        effects.sounds_played
    );
}

/// Turn toward the nearest live asteroid, creep forward, shoot when lined up
#[cfg(not(target_arch = "wasm32"))]
fn autopilot(sim: &Simulation, frame: u32) -> FrameInput {
    let ship = &sim.state().ship;
    let forward = ship.forward();
    let nearest = sim
        .director()
        .live_positions(sim.state())
        .map(|p| p - ship.body.position)
        .min_by(|a, b| a.length_squared().total_cmp(&b.length_squared()));

    let Some(to_target) = nearest else {
        return FrameInput {
            rotate: 0.5,
            ..Default::default()
        };
    };

    let to_target = to_target.normalize_or_zero();
    // Positive axis turns +Z toward +X, which is a positive Y cross product
    let side = forward.cross(to_target).y;
    let aligned = forward.dot(to_target) > 0.95;

    FrameInput {
        rotate: if side > 0.0 { 1.0 } else { -1.0 },
        thrust: frame % 120 < 20,
        shoot: aligned && frame % 6 == 0,
        teleport: frame % 1800 == 1799,
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The simulation is embedded by a host on the web; there is no entry point here
}
