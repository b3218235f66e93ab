//! Game state and simulation events
//!
//! Everything the fixed-step simulation mutates lives in [`GameState`].

use glam::Vec3;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::asteroid::{Asteroid, AsteroidSize};
use super::entity::{Bullet, EntityId};
use super::spaceship::Spaceship;
use crate::consts::SIM_DT;
use crate::effects::{EffectKind, EffectSink, ScoreSink, SoundEffect};
use crate::tuning::SpaceshipTuning;

/// Requests and notifications produced by the simulation, in emission order
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameEvent {
    /// Play a visual effect at a position
    Effect { kind: EffectKind, position: Vec3 },
    /// Play a sound clip
    Sound(SoundEffect),
    /// Add points to the score display
    Score(u32),
    /// An entity jumped (wrap or teleport); its trail should be cleared
    TrailCleared(EntityId),
    AsteroidDestroyed { id: EntityId, size: AsteroidSize },
    ShipDestroyed { position: Vec3 },
    ShipRespawned { position: Vec3 },
}

impl GameEvent {
    /// Forward this event to the collaborators that care about it
    pub fn dispatch(&self, effects: &mut dyn EffectSink, score: &mut dyn ScoreSink) {
        match *self {
            GameEvent::Effect { kind, position } => effects.play_effect(kind, position),
            GameEvent::Sound(sound) => effects.play_sound(sound),
            GameEvent::Score(points) => score.add_score(points),
            GameEvent::TrailCleared(id) => effects.clear_trail(id.0),
            GameEvent::AsteroidDestroyed { .. }
            | GameEvent::ShipDestroyed { .. }
            | GameEvent::ShipRespawned { .. } => {}
        }
    }
}

/// Complete simulation state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    /// Physics tick counter
    pub time_ticks: u64,
    pub ship: Spaceship,
    /// Every asteroid with a body, including those pending destruction
    pub asteroids: Vec<Asteroid>,
    pub bullets: Vec<Bullet>,
    /// Events not yet drained by the host
    pub events: Vec<GameEvent>,
    next_id: u32,
}

impl GameState {
    /// Create a new game state with the given seed
    pub fn new(seed: u64, ship_tuning: &SpaceshipTuning) -> Self {
        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            time_ticks: 0,
            ship: Spaceship::new(EntityId(0), Vec3::ZERO, ship_tuning),
            asteroids: Vec::new(),
            bullets: Vec::new(),
            events: Vec::new(),
            next_id: 1,
        };
        state.ship.id = state.next_entity_id();
        state
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        EntityId(id)
    }

    /// Simulation time in seconds
    pub fn now_secs(&self) -> f32 {
        self.time_ticks as f32 * SIM_DT
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn asteroid_index(&self, id: EntityId) -> Option<usize> {
        self.asteroids.iter().position(|a| a.id == id)
    }

    pub fn asteroid(&self, id: EntityId) -> Option<&Asteroid> {
        self.asteroids.iter().find(|a| a.id == id)
    }
}
