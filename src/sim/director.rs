//! Spawn director: the live asteroid registry and the top-level spawn loop
//!
//! Registry membership is authoritative: an asteroid that is not listed here
//! is not in play for population limits, flow-field targeting, or respawn
//! placement, even if its body still exists while its explosion plays.

use glam::Vec3;

use super::asteroid::{Asteroid, AsteroidSize};
use super::entity::EntityId;
use super::schedule::{Scheduler, Task};
use super::spaceship::ShipPhase;
use super::state::GameState;
use crate::consts::SPAWN_PLACEMENT_ATTEMPTS;
use crate::sim::collision::planar_distance;
use crate::tuning::{AsteroidTuning, AsteroidsTuning, DirectorTuning};
use crate::{random_planar_unit, random_point_in_square};

#[derive(Debug, Clone)]
pub struct SpawnDirector {
    tuning: DirectorTuning,
    prefabs: AsteroidsTuning,
    live: Vec<EntityId>,
    spawned_top_level: u32,
    current_delay: f32,
}

impl SpawnDirector {
    pub fn new(tuning: DirectorTuning, prefabs: AsteroidsTuning) -> Self {
        Self {
            current_delay: tuning.initial_spawn_delay.max(tuning.min_spawn_delay),
            tuning,
            prefabs,
            live: Vec::new(),
            spawned_top_level: 0,
        }
    }

    /// Queue the first iteration of the spawn loop for the next tick
    pub fn start(&self, scheduler: &mut Scheduler, now_tick: u64) {
        scheduler.schedule_at(now_tick + 1, Task::SpawnAsteroid);
    }

    /// Tuning for a size class
    pub fn prefab(&self, size: AsteroidSize) -> &AsteroidTuning {
        self.prefabs.for_size(size)
    }

    /// Seconds between a lethal hit and final removal
    pub fn destroy_delay(&self) -> f32 {
        self.prefabs.destroy_delay
    }

    /// Create an asteroid, launch it along `direction`, and register it
    pub fn spawn(
        &mut self,
        state: &mut GameState,
        size: AsteroidSize,
        position: Vec3,
        direction: Vec3,
    ) -> EntityId {
        let id = state.next_entity_id();
        let mut asteroid = Asteroid::new(id, size, position, self.prefab(size), &mut state.rng);
        asteroid.body.set_acceleration(direction);
        asteroid.body.apply_forces(false);

        log::debug!(
            "Spawned {:?} asteroid {} at ({:.2}, {:.2})",
            size,
            id.0,
            asteroid.body.position.x,
            asteroid.body.position.z
        );
        state.asteroids.push(asteroid);
        self.live.push(id);
        id
    }

    /// Drop an asteroid from the registry; false if it was not registered
    pub fn remove(&mut self, id: EntityId) -> bool {
        match self.live.iter().position(|&live| live == id) {
            Some(index) => {
                self.live.swap_remove(index);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.live.contains(&id)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn live_ids(&self) -> &[EntityId] {
        &self.live
    }

    /// Positions of every registered asteroid
    pub fn live_positions<'a>(&'a self, state: &'a GameState) -> impl Iterator<Item = Vec3> + 'a {
        self.live
            .iter()
            .filter_map(move |&id| state.asteroid(id))
            .map(|asteroid| asteroid.body.position)
    }

    /// Mean position of the registry, if it is not empty
    pub fn live_centroid(&self, state: &GameState) -> Option<Vec3> {
        let (sum, count) = self
            .live_positions(state)
            .fold((Vec3::ZERO, 0u32), |(sum, n), p| (sum + p, n + 1));
        (count > 0).then(|| sum / count as f32)
    }

    pub fn spawned_top_level(&self) -> u32 {
        self.spawned_top_level
    }

    pub fn current_delay(&self) -> f32 {
        self.current_delay
    }

    pub fn quota_reached(&self) -> bool {
        self.spawned_top_level >= self.tuning.asteroids_to_spawn
    }

    /// One iteration of the periodic spawn loop.
    ///
    /// Spawns a big asteroid when under the on-screen cap, shortens the delay
    /// toward its floor, and re-queues itself until the quota is spent.
    pub fn run_spawn_loop(&mut self, state: &mut GameState, scheduler: &mut Scheduler, half_extent: f32) {
        if self.quota_reached() {
            return;
        }

        if self.live.len() < self.tuning.max_asteroids_on_screen {
            let position = self.sample_spawn_position(state, half_extent);
            let direction = random_planar_unit(&mut state.rng);
            self.spawn(state, AsteroidSize::Big, position, direction);
            self.spawned_top_level += 1;
            self.current_delay =
                (self.current_delay - self.tuning.spawn_delay_step).max(self.tuning.min_spawn_delay);

            if self.quota_reached() {
                log::info!(
                    "Spawn quota reached ({} asteroids)",
                    self.tuning.asteroids_to_spawn
                );
                return;
            }
        }

        scheduler.schedule_after(state.time_ticks, self.current_delay, Task::SpawnAsteroid);
    }

    /// Random arena point at least `spawn_clearance` from the ship, resampled a bounded number of times
    fn sample_spawn_position(&self, state: &mut GameState, half_extent: f32) -> Vec3 {
        let avoid = match state.ship.phase {
            ShipPhase::Respawning { position } => position,
            _ => state.ship.body.position,
        };
        let clearance = self.tuning.spawn_clearance;

        let mut candidate = random_point_in_square(&mut state.rng, half_extent);
        for _ in 0..SPAWN_PLACEMENT_ATTEMPTS {
            if planar_distance(candidate, avoid) >= clearance {
                return candidate;
            }
            candidate = random_point_in_square(&mut state.rng, half_extent);
        }

        log::warn!(
            "Spawn clearance {:.2} not met after {} attempts",
            clearance,
            SPAWN_PLACEMENT_ATTEMPTS
        );
        candidate
    }
}
