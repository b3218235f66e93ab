//! Moving bodies and the tagged entity representation
//!
//! Every ship, asteroid and bullet wraps a [`Body`]. Behaviour that differs
//! per type is dispatched by matching on [`EntityKind`] / [`EntityMut`].

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::asteroid::{Asteroid, AsteroidSize};
use super::spaceship::Spaceship;
use crate::consts::*;
use crate::planar;
use crate::tuning::BodyTuning;

/// Stable entity handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// Physical state shared by every entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    pub position: Vec3,
    pub velocity: Vec3,
    /// Heading around the Y axis; forward is local +Z
    pub rotation: Quat,
    /// Forces injected this tick, cleared by [`Body::apply_forces`]
    pub pending: Vec3,
    pub acceleration_scalar: f32,
    pub max_velocity: f32,
    pub radius: f32,
    /// Linear drag coefficient (per second)
    pub drag: f32,
    pub collider_enabled: bool,
    pub visible: bool,
}

impl Body {
    pub fn new(position: Vec3, params: &BodyTuning) -> Self {
        Self {
            position: planar(position),
            velocity: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            pending: Vec3::ZERO,
            acceleration_scalar: params.acceleration_scalar,
            max_velocity: params.max_velocity,
            radius: params.radius,
            drag: 0.0,
            collider_enabled: true,
            visible: true,
        }
    }

    /// Accumulate a force, scaled by this body's acceleration scalar
    pub fn set_acceleration(&mut self, force: Vec3) {
        self.pending += force * self.acceleration_scalar;
    }

    /// Fold pending acceleration into velocity, clamp, and clear it.
    ///
    /// With `local_space` the pending vector is expressed in the body's own
    /// frame (forward = +Z) and rotated into world space first.
    pub fn apply_forces(&mut self, local_space: bool) {
        let accel = if local_space {
            self.rotation * self.pending
        } else {
            self.pending
        };
        self.velocity = planar(self.velocity + accel).clamp_length_max(self.max_velocity);
        self.pending = Vec3::ZERO;
    }

    /// Advance position by one fixed step and apply drag
    pub fn integrate(&mut self, dt: f32) {
        self.position = planar(self.position + self.velocity * dt);
        if self.drag > 0.0 {
            self.velocity *= (1.0 - self.drag * dt).max(0.0);
        }
    }

    /// Wrap to the opposite edge when past the visible area plus margin.
    ///
    /// X and Z are checked independently, so a corner exit wraps both in one
    /// call. Returns true if the body moved (its trail should be cleared).
    pub fn integrate_boundary(&mut self, half_extent: f32) -> bool {
        let edge = half_extent + BORDER_MARGIN;
        let mut wrapped = false;

        if self.position.x < -edge {
            self.position.x = edge;
            wrapped = true;
        } else if self.position.x > edge {
            self.position.x = -edge;
            wrapped = true;
        }

        if self.position.z < -edge {
            self.position.z = edge;
            wrapped = true;
        } else if self.position.z > edge {
            self.position.z = -edge;
            wrapped = true;
        }

        wrapped
    }

    /// Whether two enabled colliders overlap on the plane
    pub fn overlaps(&self, other: &Body) -> bool {
        if !self.collider_enabled || !other.collider_enabled {
            return false;
        }
        super::collision::circles_overlap(self.position, self.radius, other.position, other.radius)
    }
}

/// A fired projectile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bullet {
    pub id: EntityId,
    pub body: Body,
    /// Tick the bullet was fired on
    pub spawn_tick: u64,
    /// Seconds before the bullet expires
    pub lifetime: f32,
}

impl Bullet {
    /// True once the bullet has outlived its lifetime
    pub fn expired(&self, now_tick: u64) -> bool {
        let age = now_tick.saturating_sub(self.spawn_tick) as f32 * SIM_DT;
        age > self.lifetime
    }
}

/// What an entity is, without borrowing it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Spaceship { thrusting: bool },
    Asteroid(AsteroidSize),
    Bullet,
}

/// Mutable view over any entity
pub enum EntityMut<'a> {
    Spaceship(&'a mut Spaceship),
    Asteroid(&'a mut Asteroid),
    Bullet(&'a mut Bullet),
}

impl EntityMut<'_> {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityMut::Spaceship(ship) => EntityKind::Spaceship {
                thrusting: ship.thrusting,
            },
            EntityMut::Asteroid(asteroid) => EntityKind::Asteroid(asteroid.size),
            EntityMut::Bullet(_) => EntityKind::Bullet,
        }
    }

    pub fn body(&self) -> &Body {
        match self {
            EntityMut::Spaceship(ship) => &ship.body,
            EntityMut::Asteroid(asteroid) => &asteroid.body,
            EntityMut::Bullet(bullet) => &bullet.body,
        }
    }

    pub fn body_mut(&mut self) -> &mut Body {
        match self {
            EntityMut::Spaceship(ship) => &mut ship.body,
            EntityMut::Asteroid(asteroid) => &mut asteroid.body,
            EntityMut::Bullet(bullet) => &mut bullet.body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn body(accel: f32, max: f32) -> Body {
        Body::new(
            Vec3::ZERO,
            &BodyTuning {
                acceleration_scalar: accel,
                max_velocity: max,
                radius: 0.5,
            },
        )
    }

    #[test]
    fn test_set_acceleration_is_deferred() {
        let mut b = body(2.0, 10.0);
        b.set_acceleration(Vec3::X);
        assert_eq!(b.velocity, Vec3::ZERO);
        assert_eq!(b.pending, Vec3::new(2.0, 0.0, 0.0));
        b.apply_forces(false);
        assert_eq!(b.velocity, Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(b.pending, Vec3::ZERO);
    }

    #[test]
    fn test_local_space_forces_follow_heading() {
        let mut b = body(1.0, 10.0);
        b.rotation = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
        b.set_acceleration(Vec3::Z);
        b.apply_forces(true);
        assert!((b.velocity - Vec3::X).length() < 1e-5);
    }

    #[test]
    fn test_wrap_diagonal_in_one_call() {
        let mut b = body(1.0, 1.0);
        b.position = Vec3::new(11.0, 0.0, -11.0);
        assert!(b.integrate_boundary(10.0));
        assert_eq!(b.position, Vec3::new(-10.5, 0.0, 10.5));
    }

    #[test]
    fn test_no_wrap_inside_margin() {
        let mut b = body(1.0, 1.0);
        b.position = Vec3::new(10.4, 0.0, -10.5);
        assert!(!b.integrate_boundary(10.0));
        assert_eq!(b.position, Vec3::new(10.4, 0.0, -10.5));
    }

    #[test]
    fn test_drag_slows_body() {
        let mut b = body(1.0, 10.0);
        b.velocity = Vec3::new(4.0, 0.0, 0.0);
        b.drag = 1.0;
        b.integrate(0.5);
        assert!((b.position.x - 2.0).abs() < 1e-6);
        assert!((b.velocity.x - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_disabled_collider_never_overlaps() {
        let a = body(1.0, 1.0);
        let mut b = body(1.0, 1.0);
        assert!(a.overlaps(&b));
        b.collider_enabled = false;
        assert!(!a.overlaps(&b));
    }

    proptest! {
        #[test]
        fn prop_velocity_never_exceeds_cap(
            max in 0.1f32..20.0,
            accel in 0.0f32..5.0,
            forces in proptest::collection::vec((-50.0f32..50.0, -50.0f32..50.0, any::<bool>()), 1..40),
        ) {
            let mut b = body(accel, max);
            b.rotation = Quat::from_rotation_y(0.7);
            for (x, z, local) in forces {
                b.set_acceleration(Vec3::new(x, 0.0, z));
                b.apply_forces(local);
                prop_assert!(b.velocity.length() <= max * (1.0 + 1e-5));
                prop_assert_eq!(b.pending, Vec3::ZERO);
            }
        }

        #[test]
        fn prop_wrap_moves_only_offending_axis(
            half in 1.0f32..50.0,
            over in 0.01f32..5.0,
            other in -0.99f32..0.99,
            negative in any::<bool>(),
        ) {
            let edge = half + BORDER_MARGIN;
            let x = if negative { -(edge + over) } else { edge + over };
            let z = other * half;
            let mut b = body(1.0, 1.0);
            b.position = Vec3::new(x, 0.0, z);

            prop_assert!(b.integrate_boundary(half));
            let expected = if negative { edge } else { -edge };
            prop_assert_eq!(b.position.x, expected);
            prop_assert_eq!(b.position.z, z);
        }
    }
}
