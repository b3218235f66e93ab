//! Fixed timestep simulation tick
//!
//! [`Simulation`] owns the game state plus the collaborators that act on it
//! (spawn director, task scheduler, flow field grid) and advances them on one
//! timeline: a variable-rate frame tick for input and a fixed-rate physics
//! tick for everything else.

use glam::Vec3;

use super::asteroid::{AsteroidSize, finish_removal, kill_asteroid, update_proximity};
use super::director::SpawnDirector;
use super::entity::{Body, Bullet, EntityId};
use super::flow_manager::{FlowFieldManager, FlowPreset, FlowTarget};
use super::schedule::{Scheduler, Task};
use super::spaceship::{ShipPhase, destroy_ship, run_ship_task};
use super::state::{GameEvent, GameState};
use crate::consts::*;
use crate::effects::{ArenaBounds, EffectSink, FixedBounds, InputSource, ScoreSink, SoundEffect};
use crate::tuning::Tuning;

/// Longest frame the accumulator accepts (seconds)
const MAX_FRAME_DT: f32 = 0.1;

pub struct Simulation {
    state: GameState,
    director: SpawnDirector,
    scheduler: Scheduler,
    flow: FlowFieldManager,
    tuning: Tuning,
    bounds: Box<dyn ArenaBounds>,
    accumulator: f32,
}

impl Simulation {
    /// Simulation over a fixed arena of `tuning.arena.half_extent`
    pub fn new(tuning: Tuning, seed: u64) -> Self {
        let bounds = FixedBounds(tuning.arena.half_extent);
        Self::with_bounds(tuning, seed, Box::new(bounds))
    }

    /// Simulation whose arena size is read from `bounds`
    ///
    /// `tuning` is expected to have passed [`Tuning::validate`]; values loaded
    /// through [`Tuning::load`] or [`Tuning::from_json_str`] always have.
    pub fn with_bounds(tuning: Tuning, seed: u64, bounds: Box<dyn ArenaBounds>) -> Self {
        debug_assert!(
            tuning.validate().is_ok(),
            "simulation built from invalid tuning: {:?}",
            tuning.validate()
        );
        let half_extent = bounds.visible_half_extent();
        let state = GameState::new(seed, &tuning.spaceship);
        let director = SpawnDirector::new(tuning.director, tuning.asteroids);
        let mut flow = FlowFieldManager::new(&tuning.flow, half_extent);
        flow.target = tuning.flow.target;

        let mut sim = Self {
            state,
            director,
            scheduler: Scheduler::new(),
            flow,
            tuning,
            bounds,
            accumulator: 0.0,
        };
        sim.director.start(&mut sim.scheduler, sim.state.time_ticks);
        sim.set_preset(sim.tuning.flow.preset);

        log::info!(
            "Simulation started (seed {}, half extent {:.1}, {} flow zones)",
            seed,
            half_extent,
            sim.flow.zones().len()
        );
        sim
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn director(&self) -> &SpawnDirector {
        &self.director
    }

    pub fn flow(&self) -> &FlowFieldManager {
        &self.flow
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn half_extent(&self) -> f32 {
        self.bounds.visible_half_extent()
    }

    /// Switch the flow field preset
    pub fn set_preset(&mut self, preset: FlowPreset) {
        let t = self.state.now_secs();
        let target = self.target_point();
        self.flow.apply_preset(preset, &mut self.state.rng, t, target);
    }

    /// Change the point followed by the target presets
    pub fn set_flow_target(&mut self, target: FlowTarget) {
        self.flow.target = target;
    }

    /// Spawn and register an asteroid through the director
    pub fn spawn_asteroid(&mut self, size: AsteroidSize, position: Vec3, direction: Vec3) -> EntityId {
        self.director.spawn(&mut self.state, size, position, direction)
    }

    /// Fire a bullet from `position` along `direction`
    pub fn spawn_bullet(&mut self, position: Vec3, direction: Vec3) -> EntityId {
        let id = self.state.next_entity_id();
        let mut body = Body::new(position, &self.tuning.bullet.body);
        body.set_acceleration(direction);
        body.apply_forces(false);
        self.state.bullets.push(Bullet {
            id,
            body,
            spawn_tick: self.state.time_ticks,
            lifetime: self.tuning.bullet.lifetime,
        });
        id
    }

    /// Frame tick: sample input, update zones, then run due physics steps.
    ///
    /// Returns the number of physics steps taken.
    pub fn frame(&mut self, input: &impl InputSource, frame_dt: f32) -> u32 {
        self.sample_input(input);

        let t = self.state.now_secs();
        let target = self.target_point();
        self.flow.update(t, target);

        self.accumulator += frame_dt.clamp(0.0, MAX_FRAME_DT);
        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            self.physics_step();
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        substeps
    }

    /// Advance the simulation by one fixed timestep
    pub fn physics_step(&mut self) {
        let half_extent = self.bounds.visible_half_extent();
        self.state.time_ticks += 1;
        let now = self.state.time_ticks;

        while let Some(task) = self.scheduler.pop_due(now) {
            self.run_task(task, half_extent);
        }

        // Entity forces: ship thrust in its own frame, everything else in world space
        let ship = &mut self.state.ship;
        if ship.is_alive() {
            ship.rotate(SIM_DT);
            ship.apply_thrust();
        }
        for asteroid in &mut self.state.asteroids {
            asteroid.body.apply_forces(false);
        }
        for bullet in &mut self.state.bullets {
            bullet.body.apply_forces(false);
        }

        self.state.ship.body.integrate(SIM_DT);
        for asteroid in &mut self.state.asteroids {
            asteroid.body.integrate(SIM_DT);
        }
        for bullet in &mut self.state.bullets {
            bullet.body.integrate(SIM_DT);
        }

        self.state.bullets.retain(|bullet| !bullet.expired(now));

        self.flow.apply_to_entities(&mut self.state);

        self.resolve_bullet_hits();
        self.resolve_ship_contact(half_extent);
        update_proximity(&mut self.state.asteroids);

        self.wrap_entities(half_extent);
    }

    /// Take every queued event, oldest first
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.state.events)
    }

    /// Forward queued events to the collaborators; returns how many were sent
    pub fn dispatch(&mut self, effects: &mut dyn EffectSink, score: &mut dyn ScoreSink) -> usize {
        let events = self.drain_events();
        for event in &events {
            event.dispatch(effects, score);
        }
        events.len()
    }

    fn run_task(&mut self, task: Task, half_extent: f32) {
        log::trace!("Running {:?} at tick {}", task, self.state.time_ticks);
        match task {
            Task::RemoveAsteroid(id) => {
                finish_removal(&mut self.state, id);
            }
            Task::SpawnAsteroid => {
                self.director
                    .run_spawn_loop(&mut self.state, &mut self.scheduler, half_extent);
            }
            Task::RespawnShip | Task::BlinkShip { .. } | Task::EndInvincibility { .. } => {
                run_ship_task(&mut self.state, &mut self.scheduler, task);
            }
        }
    }

    fn sample_input(&mut self, input: &impl InputSource) {
        self.state
            .ship
            .set_controls(input.rotate_axis(), input.thrust_held());

        if input.shoot_pressed() {
            let now = self.state.now_secs();
            if let Some((muzzle, direction)) = self.state.ship.try_shoot(now) {
                self.spawn_bullet(muzzle, direction);
                self.state.emit(GameEvent::Sound(SoundEffect::Shoot));
            }
        }

        if input.teleport_pressed() {
            let half_extent = self.bounds.visible_half_extent();
            if self.state.ship.teleport(&mut self.state.rng, half_extent) {
                let (id, position) = (self.state.ship.id, self.state.ship.body.position);
                self.state.emit(GameEvent::TrailCleared(id));
                self.state.emit(GameEvent::Sound(SoundEffect::Teleport));
                log::debug!("Ship teleported to ({:.2}, {:.2})", position.x, position.z);
            }
        }
    }

    /// Where the target presets point this frame
    fn target_point(&self) -> Option<Vec3> {
        let ship = &self.state.ship;
        let ship_position = ship.is_alive().then_some(ship.body.position);
        let centroid = match self.flow.target {
            FlowTarget::AsteroidCentroid => self.director.live_centroid(&self.state),
            _ => None,
        };
        self.flow
            .target
            .resolve(self.state.now_secs(), ship_position, centroid)
    }

    /// Bullets against live asteroids; the first asteroid hit absorbs the bullet.
    ///
    /// Children spawned by a split this tick are not hit until the next one.
    fn resolve_bullet_hits(&mut self) {
        let existing = self.state.asteroids.len();
        let mut i = 0;
        while i < self.state.bullets.len() {
            let bullet_body = &self.state.bullets[i].body;
            let hit = self.state.asteroids[..existing]
                .iter()
                .position(|asteroid| asteroid.is_alive() && asteroid.body.overlaps(bullet_body));

            match hit {
                Some(index) => {
                    let bullet = self.state.bullets.remove(i);
                    let direction = bullet.body.velocity.normalize_or_zero();
                    kill_asteroid(
                        &mut self.state,
                        &mut self.director,
                        &mut self.scheduler,
                        index,
                        direction,
                    );
                }
                None => i += 1,
            }
        }
    }

    fn resolve_ship_contact(&mut self, half_extent: f32) {
        if self.state.ship.phase != ShipPhase::Active {
            return;
        }
        let ship_body = &self.state.ship.body;
        let touching = self
            .state
            .asteroids
            .iter()
            .any(|asteroid| asteroid.is_alive() && asteroid.body.overlaps(ship_body));
        if touching {
            destroy_ship(&mut self.state, &self.director, &mut self.scheduler, half_extent);
        }
    }

    fn wrap_entities(&mut self, half_extent: f32) {
        let state = &mut self.state;
        if state.ship.is_alive() && state.ship.body.integrate_boundary(half_extent) {
            state.events.push(GameEvent::TrailCleared(state.ship.id));
        }
        for asteroid in &mut state.asteroids {
            if asteroid.body.integrate_boundary(half_extent) {
                state.events.push(GameEvent::TrailCleared(asteroid.id));
            }
        }
        for bullet in &mut state.bullets {
            if bullet.body.integrate_boundary(half_extent) {
                state.events.push(GameEvent::TrailCleared(bullet.id));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::{FrameInput, LogEffects, ScoreBoard};
    use crate::sim::schedule::delay_to_ticks;
    use crate::tuning::DirectorTuning;

    /// Tuning with the spawn loop disabled and no creation randomness
    fn quiet_tuning() -> Tuning {
        let mut tuning = Tuning::default();
        tuning.director.asteroids_to_spawn = 0;
        tuning.asteroids.small.acceleration_randomization = 0.0;
        tuning.asteroids.medium.acceleration_randomization = 0.0;
        tuning.asteroids.big.acceleration_randomization = 0.0;
        tuning
    }

    fn count_events(events: &[GameEvent], pred: impl Fn(&GameEvent) -> bool) -> usize {
        events.iter().filter(|e| pred(*e)).count()
    }

    #[test]
    fn test_end_to_end_hit_split_and_removal() {
        let mut sim = Simulation::new(quiet_tuning(), 12345);
        let accel = sim.tuning().asteroids.big.body.acceleration_scalar;
        let id = sim.spawn_asteroid(AsteroidSize::Big, Vec3::new(5.0, 0.0, 5.0), Vec3::X);

        sim.physics_step();
        let moved = sim.state().asteroid(id).unwrap().body.position;
        assert!((moved - Vec3::new(5.0 + accel * SIM_DT, 0.0, 5.0)).length() < 1e-5);

        sim.spawn_bullet(moved - Vec3::X * 0.5, Vec3::X);
        sim.physics_step();

        let asteroid = sim.state().asteroid(id).unwrap();
        assert!(!asteroid.is_alive());
        assert!(!asteroid.body.collider_enabled);
        assert!(!sim.director().contains(id));
        assert!(sim.state().bullets.is_empty());

        // Children exist and are registered in the same tick
        let children: Vec<_> = sim
            .state()
            .asteroids
            .iter()
            .filter(|a| a.id != id)
            .collect();
        assert_eq!(children.len(), 2);
        assert!(children.iter().all(|c| c.size == AsteroidSize::Medium));
        assert!(children.iter().all(|c| sim.director().contains(c.id)));
        assert_eq!(sim.director().live_count(), 2);

        let mut effects = LogEffects::default();
        let mut score = ScoreBoard::default();
        sim.dispatch(&mut effects, &mut score);
        assert_eq!(score.score, u64::from(sim.tuning().asteroids.big.points));

        // Removal only after the destruction delay, and no second award
        let delay = delay_to_ticks(sim.tuning().asteroids.destroy_delay);
        for _ in 0..delay - 1 {
            sim.physics_step();
        }
        assert!(sim.state().asteroid(id).is_some());
        sim.physics_step();
        assert!(sim.state().asteroid(id).is_none());

        sim.dispatch(&mut effects, &mut score);
        assert_eq!(score.score, u64::from(sim.tuning().asteroids.big.points));
    }

    #[test]
    fn test_stale_tasks_are_ignored() {
        let mut sim = Simulation::new(quiet_tuning(), 77);
        let half = sim.tuning().arena.half_extent;
        let id = sim.spawn_asteroid(AsteroidSize::Medium, Vec3::new(4.0, 0.0, -4.0), Vec3::ZERO);
        sim.drain_events();

        // Removal of a live asteroid or an unknown id changes nothing
        sim.run_task(Task::RemoveAsteroid(id), half);
        sim.run_task(Task::RemoveAsteroid(EntityId(999)), half);
        assert_eq!(sim.state().asteroids.len(), 1);
        assert!(sim.state().asteroid(id).unwrap().is_alive());
        assert!(sim.director().contains(id));
        assert_eq!(sim.director().live_count(), 1);

        // A respawn that arrives while the ship is active is dropped
        let position = sim.state().ship.body.position;
        let life = sim.state().ship.life;
        let queued = sim.scheduler.len();
        sim.run_task(Task::RespawnShip, half);

        let ship = &sim.state().ship;
        assert_eq!(ship.phase, ShipPhase::Active);
        assert_eq!(ship.body.position, position);
        assert_eq!(ship.life, life);
        assert_eq!(sim.scheduler.len(), queued);
        for life in [life, life + 1] {
            assert!(!sim.scheduler.contains(Task::BlinkShip { life }));
            assert!(!sim.scheduler.contains(Task::EndInvincibility { life }));
        }
        assert!(sim.drain_events().is_empty());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "invalid tuning")]
    fn test_invalid_tuning_is_rejected_in_debug() {
        let mut tuning = quiet_tuning();
        tuning.director.min_spawn_delay = 0.0;
        let _ = Simulation::new(tuning, 5);
    }

    #[test]
    fn test_small_asteroid_does_not_split() {
        let mut sim = Simulation::new(quiet_tuning(), 1);
        let id = sim.spawn_asteroid(AsteroidSize::Small, Vec3::new(-5.0, 0.0, 5.0), Vec3::ZERO);
        sim.spawn_bullet(Vec3::new(-5.0, 0.0, 5.0), Vec3::Z);
        sim.physics_step();

        assert_eq!(sim.director().live_count(), 0);
        assert_eq!(sim.state().asteroids.len(), 1);
        assert!(!sim.state().asteroid(id).unwrap().is_alive());
        let events = sim.drain_events();
        assert_eq!(
            count_events(&events, |e| matches!(e, GameEvent::AsteroidDestroyed { .. })),
            1
        );
    }

    #[test]
    fn test_one_bullet_kills_one_asteroid() {
        let mut sim = Simulation::new(quiet_tuning(), 2);
        let p = Vec3::new(5.0, 0.0, -5.0);
        sim.spawn_asteroid(AsteroidSize::Small, p, Vec3::ZERO);
        sim.spawn_asteroid(AsteroidSize::Small, p, Vec3::ZERO);
        sim.spawn_bullet(p, Vec3::X);
        sim.physics_step();

        let alive = sim.state().asteroids.iter().filter(|a| a.is_alive()).count();
        assert_eq!(alive, 1);
        let events = sim.drain_events();
        assert_eq!(count_events(&events, |e| matches!(e, GameEvent::Score(_))), 1);
    }

    #[test]
    fn test_spawn_loop_respects_cap_and_quota() {
        let mut tuning = Tuning::default();
        tuning.director = DirectorTuning {
            max_asteroids_on_screen: 3,
            asteroids_to_spawn: 5,
            initial_spawn_delay: 0.1,
            min_spawn_delay: 0.1,
            spawn_delay_step: 0.0,
            spawn_clearance: 4.0,
        };
        tuning.asteroids.big.duplication = None;
        let mut sim = Simulation::new(tuning, 77);

        for _ in 0..200 {
            sim.physics_step();
            assert!(sim.director().live_count() <= 3);
        }
        assert_eq!(sim.director().spawned_top_level(), 3);

        // Free every slot; only the remaining quota is spawned
        let bullets: Vec<Vec3> = sim.director().live_positions(sim.state()).collect();
        for p in bullets {
            sim.spawn_bullet(p, Vec3::X);
        }
        sim.physics_step();
        assert_eq!(sim.director().live_count(), 0);

        for _ in 0..200 {
            sim.physics_step();
            assert!(sim.director().live_count() <= 3);
        }
        assert_eq!(sim.director().spawned_top_level(), 5);
        assert!(sim.director().quota_reached());
        assert!(!sim.scheduler().contains(Task::SpawnAsteroid));
    }

    #[test]
    fn test_invincibility_blocks_contact_until_it_expires() {
        let mut sim = Simulation::new(quiet_tuning(), 5);
        let rock = sim.spawn_asteroid(AsteroidSize::Big, Vec3::ZERO, Vec3::ZERO);
        sim.physics_step();
        assert!(matches!(sim.state().ship.phase, ShipPhase::Respawning { .. }));
        assert!(!sim.state().ship.body.visible);

        // Wait out the respawn delay
        let respawn = delay_to_ticks(sim.tuning().spaceship.respawn_delay);
        for _ in 0..respawn {
            sim.physics_step();
        }
        assert!(sim.state().ship.is_invincible());
        let respawn_at = sim.state().ship.body.position;
        let room = (respawn_at - sim.state().asteroid(rock).unwrap().body.position).length();
        assert!(room >= sim.tuning().spaceship.respawn_clearance * 0.5);

        // Park the asteroid on the ship for the whole window
        let window = delay_to_ticks(sim.tuning().spaceship.invincibility_duration);
        let mut ticks = 0;
        while sim.state().ship.phase == ShipPhase::Invincible {
            let index = sim.state.asteroid_index(rock).unwrap();
            sim.state.asteroids[index].body.position = sim.state.ship.body.position;
            sim.physics_step();
            ticks += 1;
            assert!(ticks <= window, "invincibility never ended");
        }
        assert_eq!(ticks, window);

        // The window closed and the overlap destroyed the ship on that tick
        assert!(matches!(sim.state().ship.phase, ShipPhase::Respawning { .. }));
        let events = sim.drain_events();
        assert_eq!(
            count_events(&events, |e| matches!(e, GameEvent::ShipDestroyed { .. })),
            2
        );
        assert_eq!(
            count_events(&events, |e| matches!(e, GameEvent::ShipRespawned { .. })),
            1
        );
    }

    #[test]
    fn test_shoot_and_teleport_input() {
        let mut sim = Simulation::new(quiet_tuning(), 9);
        let input = FrameInput {
            shoot: true,
            teleport: true,
            ..Default::default()
        };
        sim.frame(&input, SIM_DT);
        assert_eq!(sim.state().bullets.len(), 1);
        let events = sim.drain_events();
        assert!(events.contains(&GameEvent::Sound(SoundEffect::Shoot)));
        assert!(events.contains(&GameEvent::Sound(SoundEffect::Teleport)));
        assert!(events.contains(&GameEvent::TrailCleared(sim.state().ship.id)));

        // Cooldown blocks an immediate second shot
        sim.frame(&input, SIM_DT);
        assert_eq!(sim.state().bullets.len(), 1);
    }

    #[test]
    fn test_bullets_expire() {
        let mut sim = Simulation::new(quiet_tuning(), 4);
        sim.spawn_bullet(Vec3::ZERO, Vec3::X);
        let lifetime = delay_to_ticks(sim.tuning().bullet.lifetime);
        for _ in 0..lifetime - 5 {
            sim.physics_step();
        }
        assert_eq!(sim.state().bullets.len(), 1);
        for _ in 0..10 {
            sim.physics_step();
        }
        assert!(sim.state().bullets.is_empty());
    }

    #[test]
    fn test_wrap_clears_trail() {
        let mut sim = Simulation::new(quiet_tuning(), 6);
        let edge = sim.half_extent() + BORDER_MARGIN;
        let id = sim.spawn_asteroid(AsteroidSize::Small, Vec3::new(edge - 0.01, 0.0, 3.0), Vec3::X);
        sim.physics_step();
        let asteroid = sim.state().asteroid(id).unwrap();
        assert_eq!(asteroid.body.position.x, -edge);
        assert_eq!(asteroid.body.position.z, 3.0);
        assert!(sim.drain_events().contains(&GameEvent::TrailCleared(id)));
    }

    #[test]
    fn test_flow_preset_pushes_ship() {
        let mut sim = Simulation::new(quiet_tuning(), 8);
        sim.set_preset(FlowPreset::Gravity);
        sim.physics_step();
        assert!(sim.state().ship.body.velocity.z < 0.0);

        sim.set_preset(FlowPreset::None);
        sim.state.ship.body.velocity = Vec3::ZERO;
        sim.physics_step();
        assert_eq!(sim.state().ship.body.velocity, Vec3::ZERO);
    }

    #[test]
    fn test_frame_substeps_are_capped() {
        let mut sim = Simulation::new(quiet_tuning(), 3);
        let input = FrameInput::default();
        assert_eq!(sim.frame(&input, 0.0), 0);
        let steps = sim.frame(&input, 10.0);
        assert!((4..=MAX_SUBSTEPS).contains(&steps));
        assert_eq!(sim.state().time_ticks, u64::from(steps));
    }

    #[test]
    fn test_determinism() {
        let run = |seed: u64| {
            let mut tuning = Tuning::default();
            tuning.flow.preset = FlowPreset::Random;
            tuning.flow.target = FlowTarget::Spaceship;
            let mut sim = Simulation::new(tuning, seed);
            let mut events = Vec::new();
            for frame in 0..400u32 {
                if frame == 200 {
                    sim.set_preset(FlowPreset::TowardTarget);
                }
                let input = FrameInput {
                    rotate: if frame % 90 < 45 { 1.0 } else { -0.5 },
                    thrust: frame % 3 != 0,
                    shoot: frame % 12 == 0,
                    teleport: frame == 150,
                };
                sim.frame(&input, SIM_DT);
                events.extend(sim.drain_events());
            }
            let rocks: Vec<(EntityId, Vec3)> = sim
                .state()
                .asteroids
                .iter()
                .map(|a| (a.id, a.body.position))
                .collect();
            (sim.state().ship.body.position, rocks, events)
        };

        let a = run(2024);
        let b = run(2024);
        assert_eq!(a.0, b.0);
        assert_eq!(a.1, b.1);
        assert_eq!(a.2, b.2);
        assert!(!a.1.is_empty());
    }
}
