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
//! The particle simulation stepper
//!
//! [`Simulation`] owns the entity store, registers the particle component
//! types, builds every system once and then advances the whole population
//! with [`Simulation::step`]. Rendering pulls state out through
//! [`Simulation::each_renderable`]; the stepper never draws.
//!
//! # Example
//!
//! ```
//! use particle_ecs::config::SimulationConfig;
//! use particle_ecs::simulation::Simulation;
//!
//! let mut sim = Simulation::new(SimulationConfig::default().with_seed(3)).unwrap();
//! sim.spawn_particles(100);
//!
//! for _ in 0..60 {
//!     sim.step(1.0 / 60.0);
//! }
//!
//! let mut drawn = 0;
//! sim.each_renderable(|_, _position, _appearance| drawn += 1);
//! assert_eq!(drawn, 100);
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use crate::config::{LifecyclePolicy, SimulationConfig};
use crate::ecs::components::{ParticleAppearance, ParticleComponents};
use crate::ecs::scheduler::{stages, Scheduler};
use crate::ecs::systems;
use crate::ecs::{Context, EntityId, GroupId};
use crate::emitter::Emitter;
use crate::error::{ConfigError, IntegrationError};
use crate::integration::{assert_timestep, kinetic_energy, validate_timestep};
use crate::vector::{Vec2, VectorPool};

/// A particle system driven by a fixed timestep
pub struct Simulation {
    config: SimulationConfig,
    ctx: Context,
    particles: ParticleComponents,
    scheduler: Scheduler,
    emitter: Rc<RefCell<Emitter>>,
    render_group: GroupId,
    body_group: GroupId,
    scratch: VectorPool,
    ticks: u64,
    elapsed: f64,
}

impl Simulation {
    /// Validate `config` and build the stepper
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut ctx = Context::with_pool_config(config.pool.clone());
        let particles = ParticleComponents::register(&mut ctx, &config.pool);
        let emitter = Rc::new(RefCell::new(Emitter::new(
            config.emitter.clone(),
            config.trail_length,
            config.seed,
        )));
        let mut scratch = VectorPool::with_config(config.pool.clone());

        let render_group = ctx.create_group(&[particles.position.id(), particles.appearance.id()]);
        let body_group = ctx.create_group(&[particles.velocity.id(), particles.body.id()]);

        let mut scheduler = Scheduler::new();
        scheduler.add_system(
            systems::lifecycle_system(&mut ctx, particles, config.lifecycle, Rc::clone(&emitter)),
            stages::RECYCLE,
        );
        scheduler.add_system(
            systems::gravity_system(&mut ctx, particles, config.gravity, &mut scratch),
            stages::FORCES,
        );
        scheduler.add_system(
            systems::drag_system(
                &mut ctx,
                particles,
                config.drag,
                config.wind,
                config.gravity,
                &mut scratch,
            ),
            stages::FORCES,
        );
        if let Some(attraction) = config.attraction {
            scheduler.add_system(
                systems::attraction_system(&mut ctx, particles, attraction),
                stages::FORCES,
            );
        }
        scheduler.add_system(
            systems::accelerate_system(&mut ctx, particles, &mut scratch),
            stages::ACCELERATION,
        );
        scheduler.add_system(
            systems::move_system(&mut ctx, particles, &mut scratch),
            stages::INTEGRATION,
        );
        if let Some(obstacle) = config.obstacle {
            scheduler.add_system(
                systems::bounce_system(&mut ctx, particles, obstacle, config.restitution),
                stages::CONSTRAINTS,
            );
        }
        scheduler.add_system(systems::trail_system(&mut ctx, particles), stages::POST_PROCESS);

        log::debug!(
            "simulation ready: systems = {:?}, seed = {}",
            scheduler.system_names(),
            config.seed
        );

        Ok(Simulation {
            config,
            ctx,
            particles,
            scheduler,
            emitter,
            render_group,
            body_group,
            scratch,
            ticks: 0,
            elapsed: 0.0,
        })
    }

    /// Emit `count` new particles
    pub fn spawn_particles(&mut self, count: usize) -> Vec<EntityId> {
        let expires = matches!(self.config.lifecycle, LifecyclePolicy::Age);
        let mut emitter = self.emitter.borrow_mut();
        let spawned: Vec<EntityId> = (0..count)
            .map(|_| emitter.spawn(&mut self.ctx, &self.particles, expires))
            .collect();
        log::debug!("spawned {} particles, population {}", count, self.ctx.entity_count());
        spawned
    }

    /// Advance the simulation by `dt` seconds
    ///
    /// Runs lifecycle, forces, acceleration, motion, collision and trail
    /// recording in that order. The result depends only on `dt` and the
    /// preceding state.
    ///
    /// # Panics
    ///
    /// Panics if `dt` is not positive and finite.
    pub fn step(&mut self, dt: f64) {
        assert_timestep(dt);
        if let Err(err @ (IntegrationError::TimestepTooSmall(_) | IntegrationError::TimestepTooLarge(_))) =
            validate_timestep(dt)
        {
            log::warn!("{err}");
        }

        self.scheduler.run(&mut self.ctx, dt);
        self.ticks += 1;
        self.elapsed += dt;

        log::trace!(
            "tick {} at t = {:.4}: {} particles",
            self.ticks,
            self.elapsed,
            self.ctx.entity_count()
        );
    }

    /// Visit the position and appearance of every drawable particle
    pub fn each_renderable(&self, f: impl FnMut(EntityId, &Vec2, &ParticleAppearance)) {
        self.ctx
            .view2(self.render_group, self.particles.position, self.particles.appearance, f);
    }

    /// Total kinetic energy of all bodies
    pub fn kinetic_energy(&self) -> f64 {
        let mut total = 0.0;
        self.ctx
            .view2(self.body_group, self.particles.velocity, self.particles.body, |_, v, body| {
                total += kinetic_energy(v, body);
            });
        total
    }

    /// Number of live particles
    pub fn population(&self) -> usize {
        self.ctx.entity_count()
    }

    /// Number of completed steps
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Simulated time in seconds
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Configuration this simulation was built from
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Component handles of the particle types
    pub fn particles(&self) -> &ParticleComponents {
        &self.particles
    }

    /// Entity store
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Mutable entity store, for adding custom entities or observers
    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.ctx
    }

    /// Systems in execution order
    pub fn system_names(&self) -> Vec<&str> {
        self.scheduler.system_names()
    }

    /// Scratch vectors still available to additional systems
    pub fn scratch_pool(&mut self) -> &mut VectorPool {
        &mut self.scratch
    }
}
