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
//! Groups: incrementally maintained entity queries
//!
//! A [`Group`] holds every live entity that carries a fixed set of component
//! types. Groups never rescan the store after construction. They observe
//! component additions and removals through [`ComponentObserver`] and apply
//! each change immediately, so membership is exact between any two store
//! mutations.

use crate::ecs::{ComponentSet, ComponentTypeId, EntityId};
use std::collections::HashMap;

/// Handle for a group registered with a [`Context`](crate::ecs::Context)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupId(pub(crate) usize);

/// Handle for an external observer registered with a [`Context`](crate::ecs::Context)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(pub(crate) u64);

/// Receiver of component change notifications
///
/// The store calls these after the entity's component set has been updated:
/// on addition the new type is already present, on removal it is already
/// gone (and its value already released).
pub trait ComponentObserver {
    /// A component of type `added` was attached to `entity`
    fn on_component_added(&mut self, entity: EntityId, components: &ComponentSet, added: ComponentTypeId);

    /// A component of type `removed` was detached from `entity`
    fn on_component_removed(
        &mut self,
        entity: EntityId,
        components: &ComponentSet,
        removed: ComponentTypeId,
    );
}

/// Dense list of entity ids with O(1) membership and removal
///
/// # Examples
///
/// ```
/// use particle_ecs::ecs::{EntityId, EntityList};
///
/// let mut list = EntityList::new();
/// list.push(EntityId::new(1));
/// list.push(EntityId::new(2));
/// assert!(list.remove(EntityId::new(1)));
/// assert_eq!(list.as_slice(), &[EntityId::new(2)]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct EntityList {
    entities: Vec<EntityId>,
    index: HashMap<EntityId, usize>,
}

impl EntityList {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `entity`, returning false if it is already present
    pub fn push(&mut self, entity: EntityId) -> bool {
        if self.index.contains_key(&entity) {
            return false;
        }
        self.index.insert(entity, self.entities.len());
        self.entities.push(entity);
        true
    }

    /// Swap-remove `entity`, returning false if it is absent
    ///
    /// The last element moves into the freed slot and its recorded index is
    /// updated.
    pub fn remove(&mut self, entity: EntityId) -> bool {
        let Some(index) = self.index.remove(&entity) else {
            return false;
        };
        self.entities.swap_remove(index);
        if let Some(&moved) = self.entities.get(index) {
            self.index.insert(moved, index);
        }
        true
    }

    /// Check if `entity` is present
    pub fn contains(&self, entity: EntityId) -> bool {
        self.index.contains_key(&entity)
    }

    /// Get the recorded index of `entity`
    pub fn index_of(&self, entity: EntityId) -> Option<usize> {
        self.index.get(&entity).copied()
    }

    /// Entities in dense order
    pub fn as_slice(&self) -> &[EntityId] {
        &self.entities
    }

    /// Iterate over entities in dense order
    pub fn iter(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.iter().copied()
    }

    /// Number of entities
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Check if the list is empty
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Remove everything
    pub fn clear(&mut self) {
        self.entities.clear();
        self.index.clear();
    }
}

/// Entities carrying every component type in `required`
#[derive(Debug, Clone)]
pub struct Group {
    required: Vec<ComponentTypeId>,
    members: EntityList,
}

impl Group {
    /// Create an empty group over `required`
    ///
    /// Duplicate component types are collapsed.
    pub fn new(required: &[ComponentTypeId]) -> Self {
        let mut required = required.to_vec();
        required.sort_unstable();
        required.dedup();
        Group {
            required,
            members: EntityList::new(),
        }
    }

    /// The component types every member carries
    pub fn required(&self) -> &[ComponentTypeId] {
        &self.required
    }

    /// Check the membership predicate against a component set
    pub fn matches(&self, components: &ComponentSet) -> bool {
        components.contains_all(&self.required)
    }

    /// Add `entity` if it satisfies the predicate, used for the initial scan
    pub(crate) fn seed(&mut self, entity: EntityId, components: &ComponentSet) {
        if self.matches(components) {
            self.members.push(entity);
        }
    }

    /// Current members
    pub fn entities(&self) -> &EntityList {
        &self.members
    }

    /// Check if `entity` is a member
    pub fn contains(&self, entity: EntityId) -> bool {
        self.members.contains(entity)
    }

    /// Number of members
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Check if the group has no members
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    fn cares_about(&self, ty: ComponentTypeId) -> bool {
        self.required.binary_search(&ty).is_ok()
    }
}

impl ComponentObserver for Group {
    fn on_component_added(&mut self, entity: EntityId, components: &ComponentSet, added: ComponentTypeId) {
        if self.cares_about(added) && !self.members.contains(entity) && self.matches(components) {
            self.members.push(entity);
        }
    }

    fn on_component_removed(
        &mut self,
        entity: EntityId,
        components: &ComponentSet,
        removed: ComponentTypeId,
    ) {
        if self.cares_about(removed) && self.members.contains(entity) && !self.matches(components) {
            self.members.remove(entity);
        }
    }
}
