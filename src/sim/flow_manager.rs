//! Flow field manager: the zone grid and its direction presets
//!
//! Zones tile the arena as an N x N grid, stored row-major (rows along Z,
//! columns along X). A preset is applied once when selected; the target
//! presets are re-evaluated every frame against a moving point.

use std::f32::consts::TAU;

use glam::Vec3;
use noise::{NoiseFn, Perlin};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::entity::EntityMut;
use super::flow_field::{FlowZone, Rotation};
use super::state::GameState;
use crate::tuning::FlowTuning;
use crate::{planar, planar_from_angle, random_planar_unit, remap};

/// Named direction patterns for the zone grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowPreset {
    /// Every zone inert
    #[default]
    None,
    /// Independent random direction per zone
    Random,
    /// Uniform push toward -Z
    Gravity,
    /// One shared random axis on even zones (random sign each), odd zones inert
    Alternating,
    Clockwise,
    CounterClockwise,
    TowardCenter,
    AwayFromCenter,
    TowardTarget,
    AwayFromTarget,
    /// Directions sampled from Perlin noise
    Wave,
}

impl FlowPreset {
    pub const ALL: [FlowPreset; 11] = [
        FlowPreset::None,
        FlowPreset::Random,
        FlowPreset::Gravity,
        FlowPreset::Alternating,
        FlowPreset::Clockwise,
        FlowPreset::CounterClockwise,
        FlowPreset::TowardCenter,
        FlowPreset::AwayFromCenter,
        FlowPreset::TowardTarget,
        FlowPreset::AwayFromTarget,
        FlowPreset::Wave,
    ];

    /// Presets that follow a moving point and must be recomputed every frame
    pub fn requires_continuous(self) -> bool {
        matches!(self, FlowPreset::TowardTarget | FlowPreset::AwayFromTarget)
    }
}

/// Reference point for the target presets
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowTarget {
    Point(Vec3),
    /// Circles the arena origin
    Orbit {
        radius: f32,
        /// Radians per second
        angular_speed: f32,
        clockwise: bool,
    },
    Spaceship,
    /// Mean position of the live asteroid registry
    AsteroidCentroid,
}

impl Default for FlowTarget {
    fn default() -> Self {
        FlowTarget::Orbit {
            radius: 5.0,
            angular_speed: 1.0,
            clockwise: true,
        }
    }
}

impl FlowTarget {
    /// Where the target is at time `t`.
    ///
    /// `ship` and `centroid` are the current ship position (if flying) and
    /// live asteroid centroid (if any); `None` when the target has no position.
    pub fn resolve(&self, t: f32, ship: Option<Vec3>, centroid: Option<Vec3>) -> Option<Vec3> {
        match *self {
            FlowTarget::Point(p) => Some(planar(p)),
            FlowTarget::Orbit {
                radius,
                angular_speed,
                clockwise,
            } => {
                let angle = angular_speed * t;
                let angle = if clockwise { -angle } else { angle };
                Some(planar_from_angle(angle) * radius)
            }
            FlowTarget::Spaceship => ship,
            FlowTarget::AsteroidCentroid => centroid,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FlowFieldManager {
    zones: Vec<FlowZone>,
    grid_size: usize,
    wave_step: f32,
    preset: FlowPreset,
    pub target: FlowTarget,
}

impl FlowFieldManager {
    /// Lay out the zone grid over `[-half_extent, half_extent]`
    pub fn new(tuning: &FlowTuning, half_extent: f32) -> Self {
        let n = tuning.grid_size.max(1) as usize;
        let cell = 2.0 * half_extent / n as f32;
        let half_size = cell * 0.5;

        let mut zones = Vec::with_capacity(n * n);
        for row in 0..n {
            for col in 0..n {
                let center = Vec3::new(
                    -half_extent + cell * (col as f32 + 0.5),
                    0.0,
                    -half_extent + cell * (row as f32 + 0.5),
                );
                zones.push(FlowZone::new(center, half_size, tuning.multipliers));
            }
        }

        Self {
            zones,
            grid_size: n,
            wave_step: tuning.wave_step,
            preset: FlowPreset::None,
            target: FlowTarget::default(),
        }
    }

    pub fn zones(&self) -> &[FlowZone] {
        &self.zones
    }

    pub fn preset(&self) -> FlowPreset {
        self.preset
    }

    /// Reconfigure every zone for `preset`.
    ///
    /// Rotation is cleared on every zone first so nothing carries over from
    /// the previous preset. `t` is the elapsed time used for the rotating
    /// presets' shared phase; `target_point` seeds the target presets.
    pub fn apply_preset<R: Rng + ?Sized>(
        &mut self,
        preset: FlowPreset,
        rng: &mut R,
        t: f32,
        target_point: Option<Vec3>,
    ) {
        for zone in &mut self.zones {
            zone.set_rotation(None);
        }

        match preset {
            FlowPreset::None => self.set_all(Vec3::ZERO),
            FlowPreset::Random => {
                for zone in &mut self.zones {
                    zone.direction = random_planar_unit(rng);
                }
            }
            FlowPreset::Gravity => self.set_all(Vec3::NEG_Z),
            FlowPreset::Alternating => {
                let shared = random_planar_unit(rng);
                for (i, zone) in self.zones.iter_mut().enumerate() {
                    zone.direction = if i % 2 == 0 {
                        let sign = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
                        shared * sign
                    } else {
                        Vec3::ZERO
                    };
                }
            }
            FlowPreset::Clockwise | FlowPreset::CounterClockwise => {
                let rotation = if preset == FlowPreset::Clockwise {
                    Rotation::Clockwise
                } else {
                    Rotation::CounterClockwise
                };
                for zone in &mut self.zones {
                    zone.set_rotation(Some(rotation));
                    zone.update(t);
                }
            }
            FlowPreset::TowardCenter => self.point_at(Vec3::ZERO, false),
            FlowPreset::AwayFromCenter => self.point_at(Vec3::ZERO, true),
            FlowPreset::TowardTarget | FlowPreset::AwayFromTarget => match target_point {
                Some(point) => self.point_at(point, preset == FlowPreset::AwayFromTarget),
                None => self.set_all(Vec3::ZERO),
            },
            FlowPreset::Wave => self.apply_wave(rng),
        }

        if preset != self.preset {
            log::info!("Flow preset: {:?} -> {:?}", self.preset, preset);
        }
        self.preset = preset;
    }

    /// Per-frame update: advance rotating zones and follow the target.
    ///
    /// A target preset whose target has no position keeps its last directions.
    pub fn update(&mut self, t: f32, target_point: Option<Vec3>) {
        for zone in &mut self.zones {
            zone.update(t);
        }
        if self.preset.requires_continuous() {
            if let Some(point) = target_point {
                self.point_at(point, self.preset == FlowPreset::AwayFromTarget);
            }
        }
    }

    /// Push every ship and asteroid overlapping a zone, zone by zone.
    ///
    /// Returns the number of zone pushes applied.
    pub fn apply_to_entities(&self, state: &mut GameState) -> usize {
        let mut pushes = 0;
        for zone in &self.zones {
            if zone.direction == Vec3::ZERO {
                continue;
            }

            let ship = &mut state.ship;
            if ship.body.collider_enabled && zone.contains(ship.body.position, ship.body.radius) {
                pushes += usize::from(zone.on_entity_present(EntityMut::Spaceship(ship)));
            }

            for asteroid in &mut state.asteroids {
                if asteroid.body.collider_enabled
                    && zone.contains(asteroid.body.position, asteroid.body.radius)
                {
                    pushes += usize::from(zone.on_entity_present(EntityMut::Asteroid(asteroid)));
                }
            }
        }
        pushes
    }

    fn set_all(&mut self, direction: Vec3) {
        for zone in &mut self.zones {
            zone.direction = direction;
        }
    }

    fn point_at(&mut self, point: Vec3, away: bool) {
        for zone in &mut self.zones {
            let toward = planar(point - zone.center).normalize_or_zero();
            zone.direction = if away { -toward } else { toward };
        }
    }

    fn apply_wave<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let perlin = Perlin::new(rng.random());
        let step = self.wave_step;
        let mut x_off = 0.0f32;

        for row in self.zones.chunks_mut(self.grid_size) {
            let mut y_off: f32 = if step > 0.0 {
                rng.random_range(0.0..step)
            } else {
                0.0
            };
            for zone in row {
                let sample = perlin.get([f64::from(x_off), f64::from(y_off)]) as f32;
                let unit = (sample * 0.5 + 0.5).clamp(0.0, 1.0);
                zone.direction = planar_from_angle(remap(unit, 0.0, 1.0, 0.0, TAU));
                y_off += step;
            }
            x_off += step;
        }
    }
}
