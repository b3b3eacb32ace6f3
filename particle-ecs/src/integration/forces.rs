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
//! Force models
//!
//! Each model adds into a body's force accumulator. Scratch vectors are
//! supplied by the caller so the per-tick loop does not allocate.

use crate::ecs::components::RigidBody;
use crate::vector::Vec2;

/// Velocity-dependent drag applied against the air (velocity relative to wind)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragModel {
    /// No drag
    None,
    /// Linear drag `F = -c (v - w)`, `c` in N/(m/s)
    Linear {
        /// Drag coefficient
        coefficient: f64,
    },
    /// Quadratic drag `F = -k |v - w| (v - w)` with `k = m g / v_t²`
    ///
    /// `k` is chosen so that drag balances gravity exactly at the terminal
    /// velocity `v_t`.
    Quadratic {
        /// Terminal velocity in m/s
        terminal_velocity: f64,
    },
}

impl Default for DragModel {
    fn default() -> Self {
        DragModel::Quadratic {
            terminal_velocity: 20.0,
        }
    }
}

/// Quadratic drag coefficient `k = m |g| / v_t²`
///
/// Balances the magnitude of the weight, so `k` is never negative.
pub fn quadratic_drag_coefficient(mass: f64, gravity: f64, terminal_velocity: f64) -> f64 {
    mass * gravity.abs() / (terminal_velocity * terminal_velocity)
}

/// Add the weight `m g` (pointing down) to the accumulator
pub fn apply_gravity(body: &mut RigidBody, gravity: f64, df: &mut Vec2) {
    df.set(0.0, -gravity);
    df.scale(body.mass);
    body.force.add(df);
}

/// Add the drag force of `model` to the accumulator
///
/// `gravity` is only used by the quadratic model to derive its coefficient.
pub fn apply_drag(
    model: &DragModel,
    velocity: &Vec2,
    wind: &Vec2,
    gravity: f64,
    body: &mut RigidBody,
    relative: &mut Vec2,
) {
    relative.copy_from(velocity);
    relative.subtract(wind);

    match *model {
        DragModel::None => return,
        DragModel::Linear { coefficient } => {
            relative.scale(-coefficient);
        }
        DragModel::Quadratic { terminal_velocity } => {
            let k = quadratic_drag_coefficient(body.mass, gravity, terminal_velocity);
            let speed = relative.length();
            relative.scale(-k * speed);
        }
    }
    body.force.add(relative);
}

/// Pairwise 2D gravitation between all bodies
///
/// Each pair attracts with magnitude `G m_i m_j / r` along the separation.
/// Separations shorter than `min_distance` are clamped to it. Results are
/// added into `forces`, which must have the same length as the inputs.
pub fn accumulate_attraction(
    positions: &[Vec2],
    masses: &[f64],
    forces: &mut [Vec2],
    gravitational_constant: f64,
    min_distance: f64,
) {
    debug_assert_eq!(positions.len(), masses.len());
    debug_assert_eq!(positions.len(), forces.len());

    let min_r2 = min_distance * min_distance;
    let n = positions.len();
    for i in 0..n {
        for j in (i + 1)..n {
            // Vector from i to j
            let mut i2j = positions[j].minus(&positions[i]);
            let r2 = i2j.length2().max(min_r2);
            if r2 == 0.0 {
                continue;
            }
            i2j.scale(gravitational_constant * masses[i] * masses[j] / r2);

            forces[i].add(&i2j);
            forces[j].subtract(&i2j);
        }
    }
}
