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
//! Numerical integration for particle dynamics
//!
//! The per-tick pipeline is semi-implicit (symplectic) Euler:
//!
//! - forces are accumulated into [`RigidBody::force`]
//! - `v' = v + (F/m) dt`, after which the accumulator is cleared
//! - `p' = p + v' dt`, using the updated velocity
//!
//! [`FlatEulerIntegrator`] performs the same update over a contiguous
//! snapshot buffer for fixed populations.
//!
//! # Timestep Guidelines
//!
//! - Recommended: dt = 1/60 (60 FPS)
//! - Too small: numerical precision issues and wasted computation
//! - Too large: instability and tunneling through obstacles

use crate::ecs::components::RigidBody;
use crate::error::IntegrationError;
use crate::vector::Vec2;

mod collision;
mod flat;
mod forces;

pub use collision::{bounce, Circle};
pub use flat::{FlatEulerIntegrator, FlatLayout, STATE_ARITY};
pub use forces::{accumulate_attraction, apply_drag, apply_gravity, quadratic_drag_coefficient, DragModel};

/// Check a timestep for legality and numerical sanity
///
/// Returns [`IntegrationError::InvalidTimestep`] for non-positive or
/// non-finite values, and a warning-style error for extreme values.
pub fn validate_timestep(dt: f64) -> Result<(), IntegrationError> {
    if dt <= 0.0 || !dt.is_finite() {
        return Err(IntegrationError::InvalidTimestep(dt));
    }
    if dt < 1e-9 {
        return Err(IntegrationError::TimestepTooSmall(dt));
    }
    if dt > 1.0 {
        return Err(IntegrationError::TimestepTooLarge(dt));
    }
    Ok(())
}

/// Panic unless `dt` is positive and finite
pub(crate) fn assert_timestep(dt: f64) {
    assert!(dt > 0.0 && dt.is_finite(), "Timestep must be positive and finite");
}

/// Consume the force accumulator: `v += (F/m) dt`, then clear `F`
///
/// Immovable bodies keep their velocity. `dv` is caller-provided scratch.
pub fn accelerate(velocity: &mut Vec2, body: &mut RigidBody, dt: f64, dv: &mut Vec2) {
    dv.copy_from(&body.force);
    dv.scale(dt * body.inverse_mass());
    velocity.add(dv);
    body.force.clear();
}

/// Advance a position by its velocity: `p += v dt`
///
/// `dp` is caller-provided scratch.
pub fn advance(position: &mut Vec2, velocity: &Vec2, dt: f64, dp: &mut Vec2) {
    dp.copy_from(velocity);
    dp.scale(dt);
    position.add(dp);
}

/// Kinetic energy `0.5 m |v|²`
pub fn kinetic_energy(velocity: &Vec2, body: &RigidBody) -> f64 {
    if body.is_immovable() {
        return 0.0;
    }
    0.5 * body.mass * velocity.length2()
}
