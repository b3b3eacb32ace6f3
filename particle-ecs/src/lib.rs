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
//! # Particle ECS
//!
//! A small Entity Component System coupled to a fixed-timestep particle
//! integrator.
//!
//! ## Features
//!
//! - **Pooled storage**: entity records and components are recycled through
//!   free-list allocators instead of being reallocated
//! - **Incremental queries**: groups are kept current by change notifications
//!   on every component add and remove
//! - **Particle physics**: gravity, quadratic or linear drag with wind,
//!   semi-implicit Euler integration and an elastic bounce solve
//! - **Deterministic**: a seeded emitter makes every run reproducible
//! - **SIMD**: optional vectorized bulk update for fixed populations
//!
//! ## Example
//!
//! ```rust
//! use particle_ecs::ecs::Context;
//! use particle_ecs::pool::PoolAllocator;
//! use particle_ecs::vector::Vec2;
//!
//! let mut ctx = Context::new();
//! let position = ctx.register_component::<Vec2>("Position", PoolAllocator::new());
//! let velocity = ctx.register_component::<Vec2>("Velocity", PoolAllocator::new());
//! let moving = ctx.create_group(&[position.id(), velocity.id()]);
//!
//! let entity = ctx.create_entity();
//! ctx.add_component(entity, position).set(0.0, 10.0);
//! ctx.add_component(entity, velocity).set(1.0, 0.0);
//! assert!(ctx.group(moving).contains(entity));
//!
//! ctx.each2(moving, position, velocity, |_, p, v| p.add(&v.scaled_by(0.5)));
//! assert_eq!(*ctx.get_component(entity, position), Vec2::new(0.5, 10.0));
//! ```

#![warn(missing_docs)]

/// Simulation configuration
pub mod config;

/// Entity Component System implementation
pub mod ecs;

/// Seeded particle emitter
pub mod emitter;

/// Error types
pub mod error;

/// Numerical integration and force models
pub mod integration;

/// Memory pooling for reducing allocation churn
pub mod pool;

/// SIMD vectorization support
#[cfg(feature = "simd")]
pub mod simd;

/// The particle simulation stepper
pub mod simulation;

/// Two-dimensional vectors
pub mod vector;

pub use config::SimulationConfig;
pub use ecs::{Context, EntityId};
pub use error::{ConfigError, EcsError, IntegrationError};
pub use simulation::Simulation;
pub use vector::Vec2;
