//! Player ship: controls, shooting, teleport and the respawn cycle
//!
//! Phases: `Active -> (destroyed) -> Respawning -> Invincible -> Active`.
//! Destruction itself is the transition performed by [`destroy_ship`]; the
//! ship then waits hidden in `Respawning` until its respawn task fires.

use glam::{Quat, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::director::SpawnDirector;
use super::entity::{Body, EntityId};
use super::schedule::{Scheduler, Task};
use super::state::{GameEvent, GameState};
use crate::consts::*;
use crate::effects::{EffectKind, SoundEffect};
use crate::tuning::SpaceshipTuning;
use crate::{heading_forward, random_point_in_square};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ShipPhase {
    /// Flying and vulnerable
    Active,
    /// Hidden, collider off, waiting to reappear at `position`
    Respawning { position: Vec3 },
    /// Flying, blinking, immune to asteroid contact
    Invincible,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spaceship {
    pub id: EntityId,
    pub body: Body,
    pub phase: ShipPhase,
    /// Forward input held this frame
    pub thrusting: bool,
    /// Rotation axis sampled this frame, in [-1, 1]
    pub rotation_input: f32,
    /// Seconds of the last shot, if any
    pub last_shoot_time: Option<f32>,
    /// Incremented on every respawn; stale blink/invincibility tasks compare against it
    pub life: u32,
    pub tuning: SpaceshipTuning,
}

impl Spaceship {
    pub fn new(id: EntityId, position: Vec3, tuning: &SpaceshipTuning) -> Self {
        let mut body = Body::new(position, &tuning.body);
        body.drag = tuning.idle_drag;
        Self {
            id,
            body,
            phase: ShipPhase::Active,
            thrusting: false,
            rotation_input: 0.0,
            last_shoot_time: None,
            life: 0,
            tuning: *tuning,
        }
    }

    /// Flying (active or invincible)
    pub fn is_alive(&self) -> bool {
        !matches!(self.phase, ShipPhase::Respawning { .. })
    }

    pub fn is_invincible(&self) -> bool {
        self.phase == ShipPhase::Invincible
    }

    pub fn forward(&self) -> Vec3 {
        heading_forward(self.body.rotation)
    }

    /// Latch frame input; ignored while respawning
    pub fn set_controls(&mut self, rotate: f32, thrust: bool) {
        if !self.is_alive() {
            self.rotation_input = 0.0;
            self.thrusting = false;
            return;
        }
        self.rotation_input = rotate.clamp(-1.0, 1.0);
        self.thrusting = thrust;
        self.body.drag = if thrust {
            self.tuning.thrust_drag
        } else {
            self.tuning.idle_drag
        };
    }

    /// Turn toward a heading one rotation step away, slerped by rate and `dt`
    pub fn rotate(&mut self, dt: f32) {
        if self.rotation_input == 0.0 {
            return;
        }
        let step = self.rotation_input.signum() * self.tuning.rotation_speed.to_radians();
        let target = Quat::from_rotation_y(step) * self.body.rotation;
        let t = (self.tuning.rotation_speed * dt).clamp(0.0, 1.0);
        self.body.rotation = self.body.rotation.slerp(target, t).normalize();
    }

    /// Inject forward thrust (local space) and fold all pending forces in
    pub fn apply_thrust(&mut self) {
        if self.thrusting {
            self.body.set_acceleration(Vec3::Z);
        }
        self.body.apply_forces(true);
    }

    /// Claim a shot if the cooldown has elapsed.
    ///
    /// Returns the muzzle position and the firing direction.
    pub fn try_shoot(&mut self, now: f32) -> Option<(Vec3, Vec3)> {
        if !self.is_alive() {
            return None;
        }
        if let Some(last) = self.last_shoot_time {
            if last + self.tuning.shoot_cooldown >= now {
                return None;
            }
        }
        self.last_shoot_time = Some(now);
        let forward = self.forward();
        Some((self.body.position + forward * self.tuning.shoot_offset, forward))
    }

    /// Jump to a random point inside the bordered arena
    pub fn teleport<R: Rng + ?Sized>(&mut self, rng: &mut R, half_extent: f32) -> bool {
        if !self.is_alive() {
            return false;
        }
        self.body.position = random_point_in_square(rng, half_extent - BORDER_OFFSET);
        true
    }

    /// Reappear at the stored position and start the invincibility window
    pub fn respawn(&mut self) -> Option<Vec3> {
        let ShipPhase::Respawning { position } = self.phase else {
            return None;
        };
        self.body.position = position;
        self.body.velocity = Vec3::ZERO;
        self.body.pending = Vec3::ZERO;
        self.body.visible = true;
        self.body.collider_enabled = true;
        self.phase = ShipPhase::Invincible;
        self.life += 1;
        Some(position)
    }

    /// Toggle visibility for a blink; false once the window is over
    pub fn blink(&mut self, life: u32) -> bool {
        if life != self.life || !self.is_invincible() {
            return false;
        }
        self.body.visible = !self.body.visible;
        true
    }

    /// Close the invincibility window of respawn `life`
    pub fn end_invincibility(&mut self, life: u32) -> bool {
        if life != self.life || !self.is_invincible() {
            return false;
        }
        self.body.visible = true;
        self.phase = ShipPhase::Active;
        true
    }
}

/// Pick a respawn point clear of every hazard.
///
/// Candidates are sampled inside the bordered arena. After
/// `RESPAWN_STRICT_ATTEMPTS` misses the clearance drops to half; after
/// `RESPAWN_MAX_ATTEMPTS` the candidate with the most room wins, so the
/// search always terminates.
pub fn find_respawn_position<R: Rng + ?Sized>(
    rng: &mut R,
    half_extent: f32,
    clearance: f32,
    hazards: &[Vec3],
) -> Vec3 {
    let area = half_extent - BORDER_OFFSET;
    let mut best = Vec3::ZERO;
    let mut best_room = f32::NEG_INFINITY;

    for attempt in 0..RESPAWN_MAX_ATTEMPTS {
        let required = if attempt < RESPAWN_STRICT_ATTEMPTS {
            clearance
        } else {
            clearance * 0.5
        };
        let candidate = random_point_in_square(rng, area);
        let room = super::collision::min_distance_to(candidate, hazards.iter().copied());
        if room >= required {
            if attempt >= RESPAWN_STRICT_ATTEMPTS {
                log::debug!("Respawn clearance relaxed after {} attempts", attempt);
            }
            return candidate;
        }
        if room > best_room {
            best_room = room;
            best = candidate;
        }
    }

    log::warn!(
        "No respawn point with {:.2} clearance; using best found ({:.2})",
        clearance * 0.5,
        best_room
    );
    best
}

/// Kill the ship: effects, hide, pick a respawn point and queue the respawn.
///
/// No-op if the ship is invincible or already respawning.
pub fn destroy_ship(
    state: &mut GameState,
    director: &SpawnDirector,
    scheduler: &mut Scheduler,
    half_extent: f32,
) -> bool {
    if state.ship.phase != ShipPhase::Active {
        return false;
    }

    let position = state.ship.body.position;
    state.emit(GameEvent::Effect {
        kind: EffectKind::ShipExplosion,
        position,
    });
    state.emit(GameEvent::Sound(SoundEffect::ShipExplosion));
    state.emit(GameEvent::ShipDestroyed { position });

    let hazards: Vec<Vec3> = director.live_positions(state).collect();
    let clearance = state.ship.tuning.respawn_clearance;
    let respawn_at = find_respawn_position(&mut state.rng, half_extent, clearance, &hazards);

    let ship = &mut state.ship;
    ship.body.velocity = Vec3::ZERO;
    ship.body.pending = Vec3::ZERO;
    ship.body.visible = false;
    ship.body.collider_enabled = false;
    ship.thrusting = false;
    ship.rotation_input = 0.0;
    ship.phase = ShipPhase::Respawning {
        position: respawn_at,
    };
    let delay = ship.tuning.respawn_delay;

    log::debug!(
        "Ship destroyed at ({:.2}, {:.2}); respawning at ({:.2}, {:.2})",
        position.x,
        position.z,
        respawn_at.x,
        respawn_at.z
    );
    scheduler.schedule_after(state.time_ticks, delay, Task::RespawnShip);
    true
}

/// Run a ship task popped from the scheduler
pub fn run_ship_task(state: &mut GameState, scheduler: &mut Scheduler, task: Task) {
    let now = state.time_ticks;
    match task {
        Task::RespawnShip => {
            let Some(position) = state.ship.respawn() else {
                return;
            };
            let life = state.ship.life;
            let tuning = state.ship.tuning;
            state.emit(GameEvent::TrailCleared(state.ship.id));
            state.emit(GameEvent::Sound(SoundEffect::Respawn));
            state.emit(GameEvent::ShipRespawned { position });
            scheduler.schedule_after(now, tuning.blink_interval, Task::BlinkShip { life });
            scheduler.schedule_after(
                now,
                tuning.invincibility_duration,
                Task::EndInvincibility { life },
            );
            log::info!("Ship respawned ({} respawns so far)", life);
        }
        Task::BlinkShip { life } => {
            if state.ship.blink(life) {
                scheduler.schedule_after(now, state.ship.tuning.blink_interval, task);
            }
        }
        Task::EndInvincibility { life } => {
            if state.ship.end_invincibility(life) {
                log::debug!("Ship invincibility ended");
            }
        }
        Task::RemoveAsteroid(_) | Task::SpawnAsteroid => {}
    }
}
