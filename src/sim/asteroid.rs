//! Asteroid lifecycle
//!
//! `Alive -> PendingDestruction -> removed from storage`. A lethal bullet hit
//! awards points, unregisters the asteroid from the director immediately,
//! splits it into children, and queues the final removal so the explosion
//! can play out.

use std::collections::BTreeSet;

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::director::SpawnDirector;
use super::entity::{Body, EntityId};
use super::schedule::{Scheduler, Task};
use super::state::{GameEvent, GameState};
use crate::effects::{EffectKind, SoundEffect};
use crate::random_planar_unit;
use crate::tuning::{AsteroidTuning, DuplicationTuning};

/// Asteroid size classes, smallest first
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum AsteroidSize {
    Small,
    Medium,
    #[default]
    Big,
}

impl AsteroidSize {
    pub const ALL: [AsteroidSize; 3] = [AsteroidSize::Small, AsteroidSize::Medium, AsteroidSize::Big];

    /// Direction of the creation-time acceleration adjustment.
    ///
    /// Splitting sizes get slower, small ones faster.
    pub fn randomization_sign(self) -> f32 {
        match self {
            AsteroidSize::Small => 1.0,
            AsteroidSize::Medium | AsteroidSize::Big => -1.0,
        }
    }

    /// Velocity scale this size imparts on its children when it splits
    pub fn split_velocity_multiplier(self, dup: &DuplicationTuning) -> Option<f32> {
        match self {
            AsteroidSize::Small => None,
            AsteroidSize::Medium => Some(dup.max_velocity_multiplier),
            AsteroidSize::Big => Some(dup.min_velocity_multiplier),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AsteroidState {
    Alive,
    /// Hit and waiting for its removal task; ignored by every collision check
    PendingDestruction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asteroid {
    pub id: EntityId,
    pub size: AsteroidSize,
    pub body: Body,
    pub points: u32,
    pub state: AsteroidState,
    /// Other asteroids currently overlapping this one
    pub nearby: BTreeSet<EntityId>,
}

impl Asteroid {
    /// Build an asteroid, randomizing its acceleration scalar by size
    pub fn new<R: Rng + ?Sized>(
        id: EntityId,
        size: AsteroidSize,
        position: Vec3,
        tuning: &AsteroidTuning,
        rng: &mut R,
    ) -> Self {
        let mut body = Body::new(position, &tuning.body);
        let spread = tuning.acceleration_randomization.clamp(0.0, 1.0);
        let roll = rng.random_range(0.0..=spread);
        body.acceleration_scalar *= 1.0 + size.randomization_sign() * roll;

        Self {
            id,
            size,
            body,
            points: tuning.points,
            state: AsteroidState::Alive,
            nearby: BTreeSet::new(),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.state == AsteroidState::Alive
    }
}

/// Launch directions (already scaled) for the children of a dying asteroid.
///
/// `bullet_dir` is the lethal bullet's normalized travel direction. With easy
/// duplication the children inherit it and random components pointing back
/// toward the shooter (dot below `dot_offset`) are dropped.
pub fn split_directions<R: Rng + ?Sized>(
    rng: &mut R,
    parent: AsteroidSize,
    dup: &DuplicationTuning,
    bullet_dir: Vec3,
) -> Vec<Vec3> {
    let Some(multiplier) = parent.split_velocity_multiplier(dup) else {
        return Vec::new();
    };

    (0..dup.count)
        .map(|_| {
            let mut random = random_planar_unit(rng);
            if dup.easy_duplication {
                if random.dot(bullet_dir) < dup.dot_offset {
                    random = Vec3::ZERO;
                }
                bullet_dir + random * multiplier
            } else {
                random * multiplier
            }
        })
        .collect()
}

/// Resolve a lethal bullet hit on the asteroid at `index`.
///
/// Returns false (and does nothing) if the asteroid is already pending
/// destruction.
pub fn kill_asteroid(
    state: &mut GameState,
    director: &mut SpawnDirector,
    scheduler: &mut Scheduler,
    index: usize,
    bullet_dir: Vec3,
) -> bool {
    let Some(asteroid) = state.asteroids.get_mut(index) else {
        return false;
    };
    if !asteroid.is_alive() {
        return false;
    }

    asteroid.state = AsteroidState::PendingDestruction;
    asteroid.body.collider_enabled = false;
    asteroid.body.visible = false;
    let (id, size, position, points) = (
        asteroid.id,
        asteroid.size,
        asteroid.body.position,
        asteroid.points,
    );

    director.remove(id);
    state.emit(GameEvent::Score(points));

    let duplication = director.prefab(size).duplication;
    if let Some(dup) = duplication {
        let directions = split_directions(&mut state.rng, size, &dup, bullet_dir);
        for direction in directions {
            director.spawn(state, dup.child, position, direction);
        }
        log::debug!(
            "Asteroid {} ({:?}) split into {} x {:?}",
            id.0,
            size,
            dup.count,
            dup.child
        );
    }

    state.emit(GameEvent::Effect {
        kind: EffectKind::AsteroidExplosion,
        position,
    });
    state.emit(GameEvent::Sound(SoundEffect::AsteroidExplosion));
    state.emit(GameEvent::AsteroidDestroyed { id, size });

    scheduler.schedule_after(
        state.time_ticks,
        director.destroy_delay(),
        Task::RemoveAsteroid(id),
    );
    true
}

/// Final removal once the destruction delay has elapsed.
///
/// No-op unless the asteroid still exists and is pending destruction.
pub fn finish_removal(state: &mut GameState, id: EntityId) -> bool {
    let Some(index) = state.asteroid_index(id) else {
        return false;
    };
    if state.asteroids[index].is_alive() {
        return false;
    }
    state.asteroids.remove(index);
    for other in &mut state.asteroids {
        other.nearby.remove(&id);
    }
    log::trace!("Asteroid {} removed", id.0);
    true
}

/// Refresh every asteroid's set of overlapping siblings
pub fn update_proximity(asteroids: &mut [Asteroid]) {
    for i in 0..asteroids.len() {
        let (head, tail) = asteroids.split_at_mut(i + 1);
        let a = &mut head[i];
        for b in tail.iter_mut() {
            let touching = a.body.overlaps(&b.body);
            if touching {
                if a.nearby.insert(b.id) {
                    log::trace!("Asteroids {} and {} in range", a.id.0, b.id.0);
                }
                b.nearby.insert(a.id);
            } else if a.nearby.remove(&b.id) {
                b.nearby.remove(&a.id);
                log::trace!("Asteroids {} and {} out of range", a.id.0, b.id.0);
            }
        }
    }
}
