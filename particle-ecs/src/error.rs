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
//! Error types
//!
//! Store misuse (double add, missing component, unknown handles) is a
//! programming error. The panicking entry points on [`Context`](crate::ecs::Context)
//! format these values into their panic message, while the `try_*` variants
//! hand them back to the caller.

use crate::ecs::{ComponentTypeId, EntityId, GroupId, ObserverId};
use thiserror::Error;

/// Errors raised by the entity store and its allocators
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EcsError {
    /// The entity already carries a component of this type
    #[error("component `{component}` is already attached to {entity}")]
    ComponentAlreadyAttached {
        /// Entity that was targeted
        entity: EntityId,
        /// Name of the component type
        component: &'static str,
    },

    /// The entity does not carry a component of this type
    #[error("component `{component}` is not attached to {entity}")]
    ComponentMissing {
        /// Entity that was targeted
        entity: EntityId,
        /// Name of the component type
        component: &'static str,
    },

    /// The entity is not alive in this store
    #[error("{0} is not alive")]
    UnknownEntity(EntityId),

    /// The group handle does not refer to a registered group
    #[error("group {0:?} is not registered")]
    UnknownGroup(GroupId),

    /// The observer handle does not refer to a registered observer
    #[error("observer {0:?} is not registered")]
    UnknownObserver(ObserverId),

    /// A group was requested over no component types
    #[error("a group must require at least one component type")]
    EmptyGroup,

    /// The component type was registered with a different store
    #[error("component type `{name}` ({id:?}) is not registered with this store")]
    UnregisteredComponentType {
        /// Identifier of the component type
        id: ComponentTypeId,
        /// Name of the component type
        name: &'static str,
    },

    /// A tracked pool was asked to allocate for an owner that already holds an instance
    #[error("pool already holds an active instance for {0}")]
    AlreadyAllocated(EntityId),

    /// A tracked pool was asked to release an instance it never handed out
    #[error("pool has no active instance for {0}")]
    UntrackedRelease(EntityId),
}

/// Errors raised by the integrators
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IntegrationError {
    /// The timestep is zero, negative, NaN or infinite
    #[error("Invalid timestep: {0}. Must be positive and finite.")]
    InvalidTimestep(f64),

    /// The timestep is legal but likely to lose precision
    #[error("Timestep {0} is extremely small and may cause precision loss with f64")]
    TimestepTooSmall(f64),

    /// The timestep is legal but likely to be unstable
    #[error("Timestep {0} is large and may cause instability")]
    TimestepTooLarge(f64),

    /// The flat integrator was sized for a different population
    #[error("flat integrator sized for {expected} entities but the group holds {found}")]
    PopulationChanged {
        /// Population the buffers were sized for
        expected: usize,
        /// Population found in the group
        found: usize,
    },
}

/// Errors raised while validating a [`SimulationConfig`](crate::config::SimulationConfig)
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A value that must be strictly positive and finite was not
    #[error("`{field}` must be positive and finite, got {value}")]
    NotPositive {
        /// Name of the offending field
        field: &'static str,
        /// Value that was supplied
        value: f64,
    },

    /// A value that must be finite was not
    #[error("`{field}` must be finite, got {value}")]
    NotFinite {
        /// Name of the offending field
        field: &'static str,
        /// Value that was supplied
        value: f64,
    },

    /// Restitution outside of `[0, 1]`
    #[error("restitution must lie in [0, 1], got {0}")]
    Restitution(f64),

    /// A rectangle whose minimum corner is not below its maximum corner
    #[error("viewport minimum ({min_x}, {min_y}) must be below maximum ({max_x}, {max_y})")]
    EmptyViewport {
        /// Minimum x
        min_x: f64,
        /// Minimum y
        min_y: f64,
        /// Maximum x
        max_x: f64,
        /// Maximum y
        max_y: f64,
    },

    /// A `(min, max)` range whose minimum exceeds its maximum
    #[error("`{field}` range is inverted: min {min} > max {max}")]
    InvertedRange {
        /// Name of the offending field
        field: &'static str,
        /// Lower bound that was supplied
        min: f64,
        /// Upper bound that was supplied
        max: f64,
    },

    /// The emitter has no colors to pick from
    #[error("emitter palette must contain at least one color")]
    EmptyPalette,

    /// Trail ring buffers must hold at least one point
    #[error("trail length must be at least 1")]
    EmptyTrail,
}
