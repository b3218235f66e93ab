//! Overlap tests on the arena plane
//!
//! Every collider is a circle on X/Z; flow field zones are axis-aligned
//! squares. Touching counts as overlapping.

use glam::{Vec2, Vec3};

#[inline]
fn flat(v: Vec3) -> Vec2 {
    Vec2::new(v.x, v.z)
}

/// Circle vs circle
#[inline]
pub fn circles_overlap(a: Vec3, a_radius: f32, b: Vec3, b_radius: f32) -> bool {
    let reach = a_radius + b_radius;
    flat(a).distance_squared(flat(b)) <= reach * reach
}

/// Circle vs axis-aligned square centred on `center`
pub fn circle_square_overlap(circle: Vec3, radius: f32, center: Vec3, half_size: f32) -> bool {
    let offset = flat(circle) - flat(center);
    let closest = offset.clamp(Vec2::splat(-half_size), Vec2::splat(half_size));
    offset.distance_squared(closest) <= radius * radius
}

/// Planar distance, ignoring Y
#[inline]
pub fn planar_distance(a: Vec3, b: Vec3) -> f32 {
    flat(a).distance(flat(b))
}

/// Smallest planar distance from `point` to any of `others`, or `f32::INFINITY`
pub fn min_distance_to<I>(point: Vec3, others: I) -> f32
where
    I: IntoIterator<Item = Vec3>,
{
    others
        .into_iter()
        .map(|p| planar_distance(point, p))
        .fold(f32::INFINITY, f32::min)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circles() {
        assert!(circles_overlap(Vec3::ZERO, 1.0, Vec3::new(1.5, 0.0, 0.0), 0.5));
        assert!(!circles_overlap(Vec3::ZERO, 1.0, Vec3::new(1.6, 0.0, 0.0), 0.5));
        // Y is ignored
        assert!(circles_overlap(Vec3::ZERO, 1.0, Vec3::new(0.0, 50.0, 0.0), 0.5));
    }

    #[test]
    fn test_circle_square() {
        let center = Vec3::new(2.0, 0.0, 2.0);
        assert!(circle_square_overlap(Vec3::new(2.5, 0.0, 2.5), 0.1, center, 1.0));
        assert!(circle_square_overlap(Vec3::new(3.2, 0.0, 2.0), 0.3, center, 1.0));
        assert!(!circle_square_overlap(Vec3::new(3.2, 0.0, 2.0), 0.1, center, 1.0));
        // Corner: distance to (3, 3) is sqrt(0.5) ~ 0.707
        assert!(!circle_square_overlap(Vec3::new(3.5, 0.0, 3.5), 0.7, center, 1.0));
        assert!(circle_square_overlap(Vec3::new(3.5, 0.0, 3.5), 0.71, center, 1.0));
    }

    #[test]
    fn test_min_distance() {
        let d = min_distance_to(
            Vec3::ZERO,
            [Vec3::new(3.0, 0.0, 4.0), Vec3::new(0.0, 0.0, -2.0)],
        );
        assert!((d - 2.0).abs() < 1e-6);
        assert_eq!(min_distance_to(Vec3::ZERO, Vec::<Vec3>::new()), f32::INFINITY);
    }
}
