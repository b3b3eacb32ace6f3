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
//! Flat-buffer Euler integration for fixed populations
//!
//! Snapshots every member of a group into a contiguous buffer of
//! `[p.x, p.y, v.x, v.y]` records, applies one `state += derivative * dt`
//! pass, and writes the result back. The derivative is laid out as
//! `[v.x + a.x dt, v.y + a.y dt, a.x, a.y]`, which makes the bulk update
//! identical to semi-implicit Euler.
//!
//! The buffers are sized at construction. A group whose membership has
//! changed since then is rejected with [`IntegrationError::PopulationChanged`].

use crate::ecs::components::RigidBody;
use crate::ecs::{ComponentType, Context, GroupId};
use crate::error::IntegrationError;
use crate::vector::Vec2;

#[cfg(feature = "simd")]
use crate::simd::{select_backend, SimdBackend};

/// Number of f64 values per particle in the flat buffers
pub const STATE_ARITY: usize = 4;

/// Component handles the flat integrator reads and writes
#[derive(Debug, Clone, Copy)]
pub struct FlatLayout {
    /// Position component
    pub position: ComponentType<Vec2>,
    /// Velocity component
    pub velocity: ComponentType<Vec2>,
    /// Force accumulator and mass
    pub body: ComponentType<RigidBody>,
}

/// Bulk semi-implicit Euler integrator over a fixed-size group
pub struct FlatEulerIntegrator {
    population: usize,
    state: Vec<f64>,
    derivative: Vec<f64>,
    #[cfg(feature = "simd")]
    backend: Box<dyn SimdBackend>,
}

impl FlatEulerIntegrator {
    /// Create an integrator for exactly `population` particles
    pub fn new(population: usize) -> Self {
        #[cfg(feature = "simd")]
        let backend = {
            let backend = select_backend();
            log::debug!("flat integrator using {} backend", backend.name());
            backend
        };

        FlatEulerIntegrator {
            population,
            state: Vec::with_capacity(population * STATE_ARITY),
            derivative: Vec::with_capacity(population * STATE_ARITY),
            #[cfg(feature = "simd")]
            backend,
        }
    }

    /// Number of particles the buffers were sized for
    pub fn population(&self) -> usize {
        self.population
    }

    /// Advance every member of `group` by `dt`
    ///
    /// Consumes each body's force accumulator.
    pub fn step(
        &mut self,
        ctx: &mut Context,
        group: GroupId,
        layout: FlatLayout,
        dt: f64,
    ) -> Result<(), IntegrationError> {
        if dt <= 0.0 || !dt.is_finite() {
            return Err(IntegrationError::InvalidTimestep(dt));
        }
        let found = ctx.group(group).len();
        if found != self.population {
            return Err(IntegrationError::PopulationChanged {
                expected: self.population,
                found,
            });
        }

        self.snapshot(ctx, group, layout, dt);
        self.update(dt);
        self.write_back(ctx, group, layout);
        Ok(())
    }

    fn snapshot(&mut self, ctx: &mut Context, group: GroupId, layout: FlatLayout, dt: f64) {
        let state = &mut self.state;
        let derivative = &mut self.derivative;
        state.clear();
        derivative.clear();

        ctx.each3(group, layout.position, layout.velocity, layout.body, |_, p, v, body| {
            let inv_mass = body.inverse_mass();
            let ax = body.force.x * inv_mass;
            let ay = body.force.y * inv_mass;
            body.force.clear();

            state.extend_from_slice(&[p.x, p.y, v.x, v.y]);
            derivative.extend_from_slice(&[v.x + ax * dt, v.y + ay * dt, ax, ay]);
        });
    }

    #[cfg(feature = "simd")]
    fn update(&mut self, dt: f64) {
        // SAFETY: buffers are filled in lockstep and the backend was
        // selected from the detected CPU features
        unsafe { self.backend.scale_add(&mut self.state, &self.derivative, dt) };
    }

    #[cfg(not(feature = "simd"))]
    fn update(&mut self, dt: f64) {
        for (x, d) in self.state.iter_mut().zip(&self.derivative) {
            *x += d * dt;
        }
    }

    fn write_back(&self, ctx: &mut Context, group: GroupId, layout: FlatLayout) {
        let mut records = self.state.chunks_exact(STATE_ARITY);
        ctx.each2(group, layout.position, layout.velocity, |_, p, v| {
            if let Some(record) = records.next() {
                p.set(record[0], record[1]);
                v.set(record[2], record[3]);
            }
        });
    }
}
