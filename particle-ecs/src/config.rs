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
//! Simulation configuration
//!
//! [`SimulationConfig`] is a plain value with sensible defaults and
//! builder-style setters. [`Simulation::new`](crate::simulation::Simulation::new)
//! validates it before building any systems.
//!
//! # Example
//!
//! ```
//! use particle_ecs::config::{LifecyclePolicy, SimulationConfig};
//! use particle_ecs::integration::DragModel;
//! use particle_ecs::vector::Vec2;
//!
//! let config = SimulationConfig::default()
//!     .with_drag(DragModel::Linear { coefficient: 0.1 })
//!     .with_wind(Vec2::new(2.0, 0.0))
//!     .with_lifecycle(LifecyclePolicy::Age)
//!     .with_seed(7);
//! assert!(config.validate().is_ok());
//! ```

use crate::ecs::components::Color;
use crate::error::ConfigError;
use crate::integration::{Circle, DragModel};
use crate::pool::PoolConfig;
use crate::vector::Vec2;

/// How particles leave the simulation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LifecyclePolicy {
    /// Destroy particles older than their lifespan and emit replacements
    Age,
    /// Reset particles in place once they leave the rectangle
    Viewport {
        /// Lower-left corner
        min: Vec2,
        /// Upper-right corner
        max: Vec2,
    },
    /// Reset particles in place once they fall below `y`
    BelowFloor {
        /// Floor height
        y: f64,
    },
}

/// Pairwise gravitation between particles
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attraction {
    /// Gravitational constant `G`
    pub gravitational_constant: f64,
    /// Separations shorter than this are clamped to it
    pub min_distance: f64,
}

impl Default for Attraction {
    fn default() -> Self {
        Attraction {
            gravitational_constant: 100.0,
            min_distance: 1.0,
        }
    }
}

/// Where and how new particles are launched
#[derive(Debug, Clone, PartialEq)]
pub struct EmitterConfig {
    /// Center of the spawn area
    pub origin: Vec2,
    /// Half-width of the square spawn area around `origin`
    pub position_jitter: f64,
    /// Mean launch velocity
    pub velocity: Vec2,
    /// Half-width of the per-axis launch velocity spread
    pub velocity_jitter: f64,
    /// Mass range in kilograms
    pub mass_range: (f64, f64),
    /// Lifespan range in seconds
    pub lifespan_range: (f64, f64),
    /// Draw radius of every particle
    pub radius: f64,
    /// Colors picked uniformly at spawn
    pub palette: Vec<Color>,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        EmitterConfig {
            origin: Vec2::new(0.0, 0.5),
            position_jitter: 0.25,
            velocity: Vec2::new(0.0, 12.0),
            velocity_jitter: 3.0,
            mass_range: (0.5, 2.0),
            lifespan_range: (2.0, 5.0),
            radius: 0.05,
            palette: vec![
                Color::rgb(0xff, 0x6b, 0x35),
                Color::rgb(0xf7, 0xc5, 0x9f),
                Color::rgb(0x00, 0x4e, 0x89),
                Color::rgb(0x1a, 0x65, 0x9e),
            ],
        }
    }
}

impl EmitterConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        finite("emitter.origin.x", self.origin.x)?;
        finite("emitter.origin.y", self.origin.y)?;
        finite("emitter.velocity.x", self.velocity.x)?;
        finite("emitter.velocity.y", self.velocity.y)?;
        non_negative("emitter.position_jitter", self.position_jitter)?;
        non_negative("emitter.velocity_jitter", self.velocity_jitter)?;
        range("emitter.mass_range", self.mass_range)?;
        range("emitter.lifespan_range", self.lifespan_range)?;
        positive("emitter.radius", self.radius)?;
        if self.palette.is_empty() {
            return Err(ConfigError::EmptyPalette);
        }
        Ok(())
    }
}

/// Parameters of a particle simulation
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    /// Gravitational acceleration in m/s², pointing down
    pub gravity: f64,
    /// Air drag model
    pub drag: DragModel,
    /// Wind velocity the drag acts relative to
    pub wind: Vec2,
    /// Coefficient of restitution for obstacle bounces, in `[0, 1]`
    pub restitution: f64,
    /// Fixed circular obstacle, if any
    pub obstacle: Option<Circle>,
    /// How particles leave the simulation
    pub lifecycle: LifecyclePolicy,
    /// Spawn parameters
    pub emitter: EmitterConfig,
    /// Number of recent positions kept per particle
    pub trail_length: usize,
    /// Pairwise attraction, disabled by default
    pub attraction: Option<Attraction>,
    /// Seed for the emitter's random stream
    pub seed: u64,
    /// Pool settings for entity records and components
    pub pool: PoolConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            gravity: 9.8,
            drag: DragModel::default(),
            wind: Vec2::zero(),
            restitution: 1.0,
            obstacle: Some(Circle::new(Vec2::new(0.0, 5.0), 1.0)),
            lifecycle: LifecyclePolicy::BelowFloor { y: 0.0 },
            emitter: EmitterConfig::default(),
            trail_length: 8,
            attraction: None,
            seed: 0,
            pool: PoolConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Set the gravitational acceleration
    pub fn with_gravity(mut self, gravity: f64) -> Self {
        self.gravity = gravity;
        self
    }

    /// Set the drag model
    pub fn with_drag(mut self, drag: DragModel) -> Self {
        self.drag = drag;
        self
    }

    /// Set the wind velocity
    pub fn with_wind(mut self, wind: Vec2) -> Self {
        self.wind = wind;
        self
    }

    /// Set the coefficient of restitution
    pub fn with_restitution(mut self, restitution: f64) -> Self {
        self.restitution = restitution;
        self
    }

    /// Place a circular obstacle
    pub fn with_obstacle(mut self, obstacle: Circle) -> Self {
        self.obstacle = Some(obstacle);
        self
    }

    /// Remove the obstacle
    pub fn without_obstacle(mut self) -> Self {
        self.obstacle = None;
        self
    }

    /// Set the lifecycle policy
    pub fn with_lifecycle(mut self, lifecycle: LifecyclePolicy) -> Self {
        self.lifecycle = lifecycle;
        self
    }

    /// Set the emitter parameters
    pub fn with_emitter(mut self, emitter: EmitterConfig) -> Self {
        self.emitter = emitter;
        self
    }

    /// Set the trail length
    pub fn with_trail_length(mut self, trail_length: usize) -> Self {
        self.trail_length = trail_length;
        self
    }

    /// Enable pairwise attraction
    pub fn with_attraction(mut self, attraction: Attraction) -> Self {
        self.attraction = Some(attraction);
        self
    }

    /// Set the emitter seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the pool configuration
    pub fn with_pool_config(mut self, pool: PoolConfig) -> Self {
        self.pool = pool;
        self
    }

    /// Check every field for physically meaningful values
    pub fn validate(&self) -> Result<(), ConfigError> {
        finite("gravity", self.gravity)?;
        finite("wind.x", self.wind.x)?;
        finite("wind.y", self.wind.y)?;

        match self.drag {
            DragModel::None => {}
            DragModel::Linear { coefficient } => positive("drag.coefficient", coefficient)?,
            DragModel::Quadratic { terminal_velocity } => {
                positive("drag.terminal_velocity", terminal_velocity)?
            }
        }

        if !(0.0..=1.0).contains(&self.restitution) {
            return Err(ConfigError::Restitution(self.restitution));
        }

        if let Some(circle) = &self.obstacle {
            finite("obstacle.center.x", circle.center.x)?;
            finite("obstacle.center.y", circle.center.y)?;
            positive("obstacle.radius", circle.radius)?;
        }

        match self.lifecycle {
            LifecyclePolicy::Age => {}
            LifecyclePolicy::Viewport { min, max } => {
                if !min.is_valid() || !max.is_valid() || min.x >= max.x || min.y >= max.y {
                    return Err(ConfigError::EmptyViewport {
                        min_x: min.x,
                        min_y: min.y,
                        max_x: max.x,
                        max_y: max.y,
                    });
                }
            }
            LifecyclePolicy::BelowFloor { y } => finite("lifecycle.y", y)?,
        }

        if self.trail_length == 0 {
            return Err(ConfigError::EmptyTrail);
        }

        if let Some(attraction) = &self.attraction {
            positive("attraction.gravitational_constant", attraction.gravitational_constant)?;
            positive("attraction.min_distance", attraction.min_distance)?;
        }

        self.emitter.validate()
    }
}

fn finite(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NotFinite { field, value })
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value < 0.0 {
        return Err(ConfigError::NotPositive { field, value });
    }
    Ok(())
}

fn range(field: &'static str, (min, max): (f64, f64)) -> Result<(), ConfigError> {
    positive(field, min)?;
    finite(field, max)?;
    if min > max {
        return Err(ConfigError::InvertedRange { field, min, max });
    }
    Ok(())
}
