//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Delays run through the tick-keyed scheduler, never wall-clock time
//! - No rendering, audio, or platform dependencies

pub mod asteroid;
pub mod collision;
pub mod director;
pub mod entity;
pub mod flow_field;
pub mod flow_manager;
pub mod schedule;
pub mod spaceship;
pub mod state;
pub mod tick;

pub use asteroid::{Asteroid, AsteroidSize, AsteroidState};
pub use director::SpawnDirector;
pub use entity::{Body, Bullet, EntityId, EntityKind, EntityMut};
pub use flow_field::{FlowZone, Rotation};
pub use flow_manager::{FlowFieldManager, FlowPreset, FlowTarget};
pub use schedule::{Scheduler, Task};
pub use spaceship::{ShipPhase, Spaceship};
pub use state::{GameEvent, GameState};
pub use tick::Simulation;
