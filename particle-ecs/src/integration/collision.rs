// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Collision response against fixed circular obstacles

use crate::vector::Vec2;

/// A fixed circular obstacle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    /// Center in world units
    pub center: Vec2,
    /// Radius in world units
    pub radius: f64,
}

impl Circle {
    /// Create a circle
    pub const fn new(center: Vec2, radius: f64) -> Self {
        Circle { center, radius }
    }

    /// Whether `point` lies inside or on the boundary
    pub fn contains(&self, point: &Vec2) -> bool {
        point.minus(&self.center).length2() <= self.radius * self.radius
    }
}

/// Bounce a particle off `circle` with coefficient of restitution `e`
///
/// Applies when the particle is inside or on the circle and moving inward.
/// The new velocity is `v' = v + k n` with `n = p - C`, where `k` solves
/// `|n|² k² + 2(v·n) k + (1 - e²)|v|² = 0`. The discriminant is clamped
/// to zero when no real root exists. The position is then projected onto
/// the surface.
///
/// Returns `true` if a bounce was applied. A particle exactly at the
/// center has no defined normal and is left untouched.
pub fn bounce(position: &mut Vec2, velocity: &mut Vec2, circle: &Circle, restitution: f64) -> bool {
    let n = position.minus(&circle.center);
    let n2 = n.length2();
    if n2 == 0.0 || n2 > circle.radius * circle.radius {
        return false;
    }

    let vn = velocity.dot(&n);
    if vn >= 0.0 {
        return false;
    }

    let a = n2;
    let b = 2.0 * vn;
    let c = (1.0 - restitution * restitution) * velocity.length2();
    let discriminant = (b * b - 4.0 * a * c).max(0.0);
    let k = (-b + discriminant.sqrt()) / (2.0 * a);

    velocity.add(&n.scaled_by(k));

    let mut surface = n.scaled_by(circle.radius / n2.sqrt());
    surface.add(&circle.center);
    position.copy_from(&surface);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-12;

    fn unit_circle() -> Circle {
        Circle::new(Vec2::zero(), 1.0)
    }

    #[test]
    fn test_elastic_head_on_reflection_at_surface() {
        let mut p = Vec2::new(1.0, 0.0);
        let mut v = Vec2::new(-3.0, 0.0);

        assert!(bounce(&mut p, &mut v, &unit_circle(), 1.0));

        assert!((v.x - 3.0).abs() < EPSILON);
        assert!(v.y.abs() < EPSILON);
        assert_eq!(p, Vec2::new(1.0, 0.0));
    }

    #[test]
    fn test_elastic_oblique_reflection_preserves_speed() {
        let circle = Circle::new(Vec2::new(5.0, 5.0), 2.0);
        let mut p = Vec2::new(5.0, 6.5);
        let mut v = Vec2::new(2.0, -4.0);
        let speed = v.length();

        assert!(bounce(&mut p, &mut v, &circle, 1.0));

        assert!((v.length() - speed).abs() < 1e-9);
        // Tangential component unchanged, normal component flipped
        assert!((v.x - 2.0).abs() < 1e-9);
        assert!((v.y - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_position_projected_onto_surface() {
        let circle = Circle::new(Vec2::new(1.0, 1.0), 2.0);
        let mut p = Vec2::new(1.0, 0.0);
        let mut v = Vec2::new(0.0, 1.0);

        assert!(bounce(&mut p, &mut v, &circle, 0.8));

        assert!((p.minus(&circle.center).length() - 2.0).abs() < EPSILON);
        assert!((p.x - 1.0).abs() < EPSILON);
        assert!((p.y + 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_outward_velocity_is_ignored() {
        let mut p = Vec2::new(0.5, 0.0);
        let mut v = Vec2::new(1.0, 0.0);

        assert!(!bounce(&mut p, &mut v, &unit_circle(), 1.0));
        assert_eq!(p, Vec2::new(0.5, 0.0));
        assert_eq!(v, Vec2::new(1.0, 0.0));
    }

    #[test]
    fn test_outside_circle_is_ignored() {
        let mut p = Vec2::new(2.0, 0.0);
        let mut v = Vec2::new(-1.0, 0.0);
        assert!(!bounce(&mut p, &mut v, &unit_circle(), 1.0));
    }

    #[test]
    fn test_center_is_ignored() {
        let mut p = Vec2::zero();
        let mut v = Vec2::new(-1.0, 0.0);
        assert!(!bounce(&mut p, &mut v, &unit_circle(), 1.0));
        assert_eq!(v, Vec2::new(-1.0, 0.0));
    }

    #[test]
    fn test_negative_discriminant_is_clamped() {
        // Grazing approach with low restitution has no real root
        let mut p = Vec2::new(0.0, 1.0);
        let mut v = Vec2::new(10.0, -0.1);

        assert!(bounce(&mut p, &mut v, &unit_circle(), 0.1));
        assert!(v.is_valid());
        // Normal component no longer points inward
        assert!(v.dot(&p) >= -1e-12);
    }

    #[test]
    fn test_inelastic_head_on_loses_speed() {
        let mut p = Vec2::new(0.0, 1.0);
        let mut v = Vec2::new(0.0, -2.0);

        assert!(bounce(&mut p, &mut v, &unit_circle(), 0.5));
        assert!((v.y - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_contains() {
        assert!(unit_circle().contains(&Vec2::new(1.0, 0.0)));
        assert!(!unit_circle().contains(&Vec2::new(1.0, 0.1)));
    }
}
