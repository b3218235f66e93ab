//! Drift Rocks - simulation core for a top-down asteroids arena
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entities, flow fields, asteroid lifecycle, spawning)
//! - `effects`: Collaborator interfaces (effects/audio, score, input, arena bounds)
//! - `tuning`: Data-driven game balance

pub mod effects;
pub mod sim;
pub mod tuning;

pub use effects::{ArenaBounds, EffectKind, EffectSink, InputSource, ScoreSink, SoundEffect};
pub use tuning::{Tuning, TuningError};

use glam::{Quat, Vec3};
use rand::Rng;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (50 Hz physics)
    pub const SIM_DT: f32 = 1.0 / 50.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Distance past the visible half-extent before an entity wraps
    pub const BORDER_MARGIN: f32 = 0.5;
    /// Inset from the visible edge used for teleport and respawn placement
    pub const BORDER_OFFSET: f32 = 1.5;

    /// Flow-field force scale applied to a ship that is thrusting forward
    pub const THRUSTING_FLOW_MULTIPLIER: f32 = 0.25;

    /// Respawn attempts at full clearance before relaxing to half clearance
    pub const RESPAWN_STRICT_ATTEMPTS: u32 = 4;
    /// Hard cap on respawn candidates; the best candidate seen wins
    pub const RESPAWN_MAX_ATTEMPTS: u32 = 64;
    /// Resample cap for top-level asteroid placement
    pub const SPAWN_PLACEMENT_ATTEMPTS: u32 = 32;
}

/// Project onto the horizontal plane (Y is always zero in the arena)
#[inline]
pub fn planar(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Linearly remap `value` from `[from1, to1]` into `[from2, to2]`
#[inline]
pub fn remap(value: f32, from1: f32, to1: f32, from2: f32, to2: f32) -> f32 {
    (value - from1) / (to1 - from1) * (to2 - from2) + from2
}

/// Random unit vector on the horizontal plane.
///
/// X and Z are drawn independently from [-1, 1] before normalizing, so the
/// distribution is biased toward the diagonals. Degenerate draws are redrawn.
pub fn random_planar_unit<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    loop {
        let v = Vec3::new(rng.random_range(-1.0..=1.0), 0.0, rng.random_range(-1.0..=1.0));
        if v.length_squared() > 1e-6 {
            return v.normalize();
        }
    }
}

/// Uniform random point in the square `[-half, half]` on X and Z
pub fn random_point_in_square<R: Rng + ?Sized>(rng: &mut R, half: f32) -> Vec3 {
    let half = half.max(0.0);
    if half == 0.0 {
        return Vec3::ZERO;
    }
    Vec3::new(rng.random_range(-half..=half), 0.0, rng.random_range(-half..=half))
}

/// Forward (+Z) direction for a heading rotation
#[inline]
pub fn heading_forward(rotation: Quat) -> Vec3 {
    planar(rotation * Vec3::Z).normalize_or_zero()
}

/// Unit direction on the plane for an angle, measured from +X toward +Z
#[inline]
pub fn planar_from_angle(angle: f32) -> Vec3 {
    Vec3::new(angle.cos(), 0.0, angle.sin())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_remap() {
        assert!((remap(0.5, 0.0, 1.0, 0.0, 10.0) - 5.0).abs() < 1e-6);
        assert!((remap(2.0, 1.0, 3.0, -1.0, 1.0)).abs() < 1e-6);
    }

    #[test]
    fn test_random_planar_unit_is_unit_and_flat() {
        let mut rng = Pcg32::seed_from_u64(7);
        for _ in 0..200 {
            let v = random_planar_unit(&mut rng);
            assert_eq!(v.y, 0.0);
            assert!((v.length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_random_point_in_square_bounds() {
        let mut rng = Pcg32::seed_from_u64(3);
        for _ in 0..200 {
            let p = random_point_in_square(&mut rng, 4.0);
            assert!(p.x.abs() <= 4.0 && p.z.abs() <= 4.0);
            assert_eq!(p.y, 0.0);
        }
        assert_eq!(random_point_in_square(&mut rng, -1.0), Vec3::ZERO);
    }

    #[test]
    fn test_heading_forward() {
        let f = heading_forward(Quat::IDENTITY);
        assert!((f - Vec3::Z).length() < 1e-6);
        let right = heading_forward(Quat::from_rotation_y(std::f32::consts::FRAC_PI_2));
        assert!((right - Vec3::X).length() < 1e-5);
    }
}
