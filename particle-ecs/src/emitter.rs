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
//! Seeded particle emitter
//!
//! Every launch draws the same sequence of values from a ChaCha stream, so
//! two simulations built with the same seed evolve identically.

use crate::config::EmitterConfig;
use crate::ecs::components::{Color, ParticleAppearance, ParticleComponents};
use crate::ecs::{Context, EntityId};
use crate::vector::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Initial state drawn for one particle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Launch {
    /// Spawn position
    pub position: Vec2,
    /// Launch velocity
    pub velocity: Vec2,
    /// Mass in kilograms
    pub mass: f64,
    /// Lifespan in seconds
    pub lifespan: f64,
    /// Fill color
    pub color: Color,
}

/// Spawns and resets particles
#[derive(Debug, Clone)]
pub struct Emitter {
    config: EmitterConfig,
    trail_length: usize,
    rng: ChaCha8Rng,
}

impl Emitter {
    /// Create an emitter with its own random stream
    pub fn new(config: EmitterConfig, trail_length: usize, seed: u64) -> Self {
        Emitter {
            config,
            trail_length,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Emitter parameters
    pub fn config(&self) -> &EmitterConfig {
        &self.config
    }

    /// Draw the initial state of the next particle
    pub fn sample(&mut self) -> Launch {
        let cfg = &self.config;
        let rng = &mut self.rng;

        let jitter = cfg.position_jitter;
        let position = Vec2::new(
            cfg.origin.x + rng.gen_range(-jitter..=jitter),
            cfg.origin.y + rng.gen_range(-jitter..=jitter),
        );
        let spread = cfg.velocity_jitter;
        let velocity = Vec2::new(
            cfg.velocity.x + rng.gen_range(-spread..=spread),
            cfg.velocity.y + rng.gen_range(-spread..=spread),
        );
        let mass = rng.gen_range(cfg.mass_range.0..=cfg.mass_range.1);
        let lifespan = rng.gen_range(cfg.lifespan_range.0..=cfg.lifespan_range.1);
        let color = cfg.palette[rng.gen_range(0..cfg.palette.len())];

        Launch {
            position,
            velocity,
            mass,
            lifespan,
            color,
        }
    }

    /// Create a particle entity with freshly drawn state
    ///
    /// `Temporary` is only attached when `expires` is set.
    pub fn spawn(&mut self, ctx: &mut Context, particles: &ParticleComponents, expires: bool) -> EntityId {
        let launch = self.sample();
        let entity = ctx.create_entity();

        ctx.add_component(entity, particles.position).copy_from(&launch.position);
        ctx.add_component(entity, particles.velocity).copy_from(&launch.velocity);
        ctx.add_component(entity, particles.body).set(launch.mass);
        if expires {
            ctx.add_component(entity, particles.temporary).set(launch.lifespan);
        }
        ctx.add_component(entity, particles.appearance)
            .set(self.config.radius, launch.color, self.trail_length);

        entity
    }

    /// Relaunch an existing particle in place
    ///
    /// Overwrites position, velocity and appearance. The mass is kept.
    pub fn reset(&mut self, position: &mut Vec2, velocity: &mut Vec2, appearance: &mut ParticleAppearance) {
        let launch = self.sample();
        position.copy_from(&launch.position);
        velocity.copy_from(&launch.velocity);
        appearance.set(self.config.radius, launch.color, self.trail_length);
    }
}
