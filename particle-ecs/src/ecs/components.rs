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
//! Particle components
//!
//! Plain data records attached to particle entities. All of them are
//! pool-allocated, so every field is overwritten when a particle is spawned
//! or reset.

use crate::ecs::{Component, ComponentType, Context};
use crate::pool::{PoolAllocator, PoolConfig, TrackedPoolAllocator};
use crate::vector::{Vec2, VectorPool};

/// Masses at or below this threshold are treated as immovable
pub const IMMOVABLE_MASS_THRESHOLD: f64 = 1e-10;

/// Mass and force accumulator of a particle
///
/// Force providers add into `force` during a tick; the acceleration system
/// consumes it and clears it.
///
/// # Examples
///
/// ```
/// use particle_ecs::ecs::components::RigidBody;
/// use particle_ecs::vector::Vec2;
///
/// let mut body = RigidBody::default();
/// body.set(2.0);
/// body.force.add(&Vec2::new(0.0, -19.6));
/// assert_eq!(body.inverse_mass(), 0.5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RigidBody {
    /// Force accumulated during the current tick, in Newtons
    pub force: Vec2,
    /// Mass in kilograms
    pub mass: f64,
}

impl RigidBody {
    /// Overwrite every field: set the mass and clear the accumulator
    ///
    /// # Panics
    ///
    /// Panics if mass is negative, NaN, or infinite
    pub fn set(&mut self, mass: f64) {
        assert!(
            mass >= 0.0 && mass.is_finite(),
            "Mass must be non-negative and finite"
        );
        self.mass = mass;
        self.force.clear();
    }

    /// Check if this body is immovable (mass at or near zero)
    pub fn is_immovable(&self) -> bool {
        self.mass <= IMMOVABLE_MASS_THRESHOLD
    }

    /// Get the inverse mass (1/m), or 0 for immovable bodies
    pub fn inverse_mass(&self) -> f64 {
        if self.is_immovable() {
            0.0
        } else {
            1.0 / self.mass
        }
    }
}

impl Component for RigidBody {}

/// Age and lifespan of a short-lived particle, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Temporary {
    /// Time lived so far
    pub age: f64,
    /// Time after which the particle is torn down
    pub lifespan: f64,
}

impl Temporary {
    /// Overwrite every field
    pub fn set(&mut self, lifespan: f64) {
        self.age = 0.0;
        self.lifespan = lifespan;
    }

    /// Check if the particle has outlived its lifespan
    pub fn is_expired(&self) -> bool {
        self.age > self.lifespan
    }
}

impl Component for Temporary {}

/// An RGBA color with 8 bits per channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Color {
    /// Red
    pub r: u8,
    /// Green
    pub g: u8,
    /// Blue
    pub b: u8,
    /// Alpha
    pub a: u8,
}

impl Color {
    /// Create an opaque color
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b, a: 255 }
    }
}

/// Fixed-capacity ring buffer of recent positions
///
/// Pushing into a full trail overwrites the oldest point.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trail {
    points: Vec<Vec2>,
    head: usize,
    capacity: usize,
}

impl Trail {
    /// Create an empty trail holding at most `capacity` points
    pub fn with_capacity(capacity: usize) -> Self {
        let mut trail = Trail::default();
        trail.reset(capacity);
        trail
    }

    /// Drop every point and change the capacity
    ///
    /// Keeps the existing allocation when it is large enough.
    pub fn reset(&mut self, capacity: usize) {
        self.points.clear();
        self.points.reserve(capacity);
        self.head = 0;
        self.capacity = capacity;
    }

    /// Record a point, evicting the oldest one if the trail is full
    pub fn push(&mut self, point: Vec2) {
        if self.capacity == 0 {
            return;
        }
        if self.points.len() < self.capacity {
            self.points.push(point);
        } else {
            self.points[self.head] = point;
            self.head = (self.head + 1) % self.capacity;
        }
    }

    /// Iterate from the oldest to the newest point
    pub fn iter(&self) -> impl Iterator<Item = &Vec2> + '_ {
        let (newer, older) = self.points.split_at(self.head);
        older.iter().chain(newer.iter())
    }

    /// Most recently recorded point
    pub fn latest(&self) -> Option<&Vec2> {
        if self.points.len() < self.capacity || self.head == 0 {
            self.points.last()
        } else {
            self.points.get(self.head - 1)
        }
    }

    /// Number of recorded points
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if no points are recorded
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Maximum number of points kept
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// What the renderer needs to draw a particle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParticleAppearance {
    /// Draw radius in world units
    pub radius: f64,
    /// Fill color
    pub color: Color,
    /// Recent positions, oldest first
    pub trail: Trail,
}

impl ParticleAppearance {
    /// Overwrite every field
    pub fn set(&mut self, radius: f64, color: Color, trail_length: usize) {
        self.radius = radius;
        self.color = color;
        self.trail.reset(trail_length);
    }
}

impl Component for ParticleAppearance {}

/// Handles for the component types that make up a particle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParticleComponents {
    /// Position in world units
    pub position: ComponentType<Vec2>,
    /// Velocity in world units per second
    pub velocity: ComponentType<Vec2>,
    /// Mass and force accumulator
    pub body: ComponentType<RigidBody>,
    /// Age and lifespan, only attached to particles that expire
    pub temporary: ComponentType<Temporary>,
    /// Render data
    pub appearance: ComponentType<ParticleAppearance>,
}

impl ParticleComponents {
    /// Register every particle component type with `ctx`
    ///
    /// Rigid bodies use the tracked pool so a double release is caught.
    pub fn register(ctx: &mut Context, pool: &PoolConfig) -> Self {
        ParticleComponents {
            position: ctx.register_component("Position", VectorPool::with_config(pool.clone())),
            velocity: ctx.register_component("Velocity", VectorPool::with_config(pool.clone())),
            body: ctx.register_component("RigidBody", TrackedPoolAllocator::with_config(pool.clone())),
            temporary: ctx.register_component("Temporary", PoolAllocator::with_config(pool.clone())),
            appearance: ctx
                .register_component("ParticleAppearance", PoolAllocator::with_config(pool.clone())),
        }
    }
}
