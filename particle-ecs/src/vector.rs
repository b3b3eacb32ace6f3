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
//! Two-dimensional vector value type
//!
//! [`Vec2`] comes with paired operations: the non-mutating ones (`plus`,
//! `minus`, `scaled_by`) return a new value, the mutating ones (`add`,
//! `subtract`, `scale`) update `self` in place. Hot loops use the mutating
//! forms on scratch values taken from a [`VectorPool`].

use crate::pool::PoolAllocator;

/// A 2D vector with double-precision components
///
/// # Examples
///
/// ```
/// use particle_ecs::vector::Vec2;
///
/// let mut v = Vec2::new(3.0, 4.0);
/// assert_eq!(v.length(), 5.0);
///
/// v.scale(2.0);
/// assert_eq!(v, Vec2::new(6.0, 8.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    /// Horizontal component
    pub x: f64,
    /// Vertical component (positive is up)
    pub y: f64,
}

/// Free-list pool of scratch vectors
///
/// A vector handed back with [`PoolAllocator::recycle`] must not be read
/// again by its former owner.
pub type VectorPool = PoolAllocator<Vec2>;

impl Vec2 {
    /// Create a vector from its components
    pub const fn new(x: f64, y: f64) -> Self {
        Vec2 { x, y }
    }

    /// The zero vector
    pub const fn zero() -> Self {
        Vec2::new(0.0, 0.0)
    }

    /// Sum of `self` and `other`
    pub fn plus(&self, other: &Vec2) -> Vec2 {
        Vec2::new(self.x + other.x, self.y + other.y)
    }

    /// Difference `self - other`
    pub fn minus(&self, other: &Vec2) -> Vec2 {
        Vec2::new(self.x - other.x, self.y - other.y)
    }

    /// Dot product
    pub fn dot(&self, other: &Vec2) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// `self` scaled by `scalar`
    pub fn scaled_by(&self, scalar: f64) -> Vec2 {
        Vec2::new(self.x * scalar, self.y * scalar)
    }

    /// Squared length
    pub fn length2(&self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    /// Euclidean length
    pub fn length(&self) -> f64 {
        self.length2().sqrt()
    }

    /// Add `other` in place
    pub fn add(&mut self, other: &Vec2) {
        self.x += other.x;
        self.y += other.y;
    }

    /// Subtract `other` in place
    pub fn subtract(&mut self, other: &Vec2) {
        self.x -= other.x;
        self.y -= other.y;
    }

    /// Scale in place
    pub fn scale(&mut self, scalar: f64) {
        self.x *= scalar;
        self.y *= scalar;
    }

    /// Overwrite both components
    pub fn set(&mut self, x: f64, y: f64) {
        self.x = x;
        self.y = y;
    }

    /// Overwrite with the components of `other`
    pub fn copy_from(&mut self, other: &Vec2) {
        self.x = other.x;
        self.y = other.y;
    }

    /// Reset to zero
    pub fn clear(&mut self) {
        self.set(0.0, 0.0);
    }

    /// Check if both components are finite (not NaN or infinite)
    pub fn is_valid(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_mutating_operations() {
        let a = Vec2::new(1.0, 2.0);
        let b = Vec2::new(3.0, -1.0);

        assert_eq!(a.plus(&b), Vec2::new(4.0, 1.0));
        assert_eq!(a.minus(&b), Vec2::new(-2.0, 3.0));
        assert_eq!(a.dot(&b), 1.0);
        assert_eq!(a.scaled_by(3.0), Vec2::new(3.0, 6.0));

        // Inputs are untouched
        assert_eq!(a, Vec2::new(1.0, 2.0));
        assert_eq!(b, Vec2::new(3.0, -1.0));
    }

    #[test]
    fn test_mutating_operations() {
        let mut v = Vec2::new(1.0, 1.0);
        v.add(&Vec2::new(2.0, 3.0));
        assert_eq!(v, Vec2::new(3.0, 4.0));

        v.subtract(&Vec2::new(1.0, 1.0));
        assert_eq!(v, Vec2::new(2.0, 3.0));

        v.scale(0.5);
        assert_eq!(v, Vec2::new(1.0, 1.5));

        v.copy_from(&Vec2::new(-7.0, 8.0));
        assert_eq!(v, Vec2::new(-7.0, 8.0));

        v.clear();
        assert_eq!(v, Vec2::zero());
    }

    #[test]
    fn test_length() {
        let v = Vec2::new(3.0, 4.0);
        assert_eq!(v.length2(), 25.0);
        assert_eq!(v.length(), 5.0);
    }

    #[test]
    fn test_validation() {
        assert!(Vec2::new(1.0, 2.0).is_valid());
        assert!(!Vec2::new(f64::NAN, 2.0).is_valid());
        assert!(!Vec2::new(1.0, f64::INFINITY).is_valid());
    }

    #[test]
    fn test_vector_pool_reuses_released_values() {
        let mut pool = VectorPool::new();
        let mut v = pool.acquire();
        v.set(5.0, 6.0);
        pool.recycle(v);

        // Pooled values come back stale; callers overwrite what they use
        let reused = pool.acquire();
        assert_eq!(reused, Vec2::new(5.0, 6.0));
        assert_eq!(pool.stats().hits, 1);
    }
}
