//! A single flow field zone
//!
//! A square region of the arena that pushes every ship or asteroid inside it
//! along its direction. Forces are applied immediately per zone, so an entity
//! straddling several zones is integrated once per zone it touches.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::collision::circle_square_overlap;
use super::entity::{EntityKind, EntityMut};
use crate::consts::THRUSTING_FLOW_MULTIPLIER;
use crate::tuning::ForceMultipliers;

/// Continuous rotation of a zone's direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rotation {
    Clockwise,
    CounterClockwise,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowZone {
    pub center: Vec3,
    pub half_size: f32,
    /// Unit vector, or zero for an inert zone
    pub direction: Vec3,
    pub multipliers: ForceMultipliers,
    /// When set, `direction` is a function of elapsed time
    pub rotation: Option<Rotation>,
}

impl FlowZone {
    pub fn new(center: Vec3, half_size: f32, multipliers: ForceMultipliers) -> Self {
        Self {
            center,
            half_size,
            direction: Vec3::ZERO,
            multipliers,
            rotation: None,
        }
    }

    pub fn set_rotation(&mut self, rotation: Option<Rotation>) {
        self.rotation = rotation;
    }

    /// Recompute a rotating direction for elapsed time `t` (seconds)
    pub fn update(&mut self, t: f32) {
        match self.rotation {
            Some(Rotation::Clockwise) => self.direction = Vec3::new(t.cos(), 0.0, -t.sin()),
            Some(Rotation::CounterClockwise) => self.direction = Vec3::new(t.cos(), 0.0, t.sin()),
            None => {}
        }
    }

    /// Whether a circle at `position` touches this zone
    pub fn contains(&self, position: Vec3, radius: f32) -> bool {
        circle_square_overlap(position, radius, self.center, self.half_size)
    }

    /// Force scale for an entity kind; `None` means the zone ignores it
    pub fn multiplier_for(&self, kind: EntityKind) -> Option<f32> {
        match kind {
            EntityKind::Spaceship { thrusting } => Some(if thrusting {
                self.multipliers.spaceship * THRUSTING_FLOW_MULTIPLIER
            } else {
                self.multipliers.spaceship
            }),
            EntityKind::Asteroid(size) => Some(self.multipliers.for_size(size)),
            EntityKind::Bullet => None,
        }
    }

    /// Push an entity that overlaps this zone.
    ///
    /// Returns true if a force was applied.
    pub fn on_entity_present(&self, mut entity: EntityMut<'_>) -> bool {
        if self.direction == Vec3::ZERO {
            return false;
        }
        let Some(multiplier) = self.multiplier_for(entity.kind()) else {
            return false;
        };
        let body = entity.body_mut();
        body.set_acceleration(self.direction * multiplier);
        body.apply_forces(false);
        true
    }
}
