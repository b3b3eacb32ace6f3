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
//! Entity management
//!
//! Entities are identifiers that tie together components. The store keeps
//! one [`EntityRecord`] per live entity: its id and the set of component
//! types currently attached to it. Records are pooled and reused after an
//! entity is destroyed, but ids come from a store-lifetime counter and are
//! never handed out twice.

use crate::ecs::ComponentTypeId;
use std::fmt;

/// Unique identifier for an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(u32);

impl EntityId {
    /// Create a new EntityId from a raw u32 value
    pub fn new(id: u32) -> Self {
        EntityId(id)
    }

    /// Get the raw u32 value
    pub fn raw(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

/// The component types attached to one entity
///
/// At most one entry per component type. Kept sorted so membership tests are
/// a binary search over a handful of ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentSet {
    types: Vec<ComponentTypeId>,
}

impl ComponentSet {
    /// Create an empty set
    pub fn new() -> Self {
        ComponentSet { types: Vec::new() }
    }

    /// Check if `ty` is attached
    pub fn contains(&self, ty: ComponentTypeId) -> bool {
        self.types.binary_search(&ty).is_ok()
    }

    /// Check if every type in `types` is attached
    pub fn contains_all(&self, types: &[ComponentTypeId]) -> bool {
        types.iter().all(|ty| self.contains(*ty))
    }

    /// Insert `ty`, returning false if it was already present
    pub(crate) fn insert(&mut self, ty: ComponentTypeId) -> bool {
        match self.types.binary_search(&ty) {
            Ok(_) => false,
            Err(at) => {
                self.types.insert(at, ty);
                true
            }
        }
    }

    /// Remove `ty`, returning false if it was not present
    pub(crate) fn remove(&mut self, ty: ComponentTypeId) -> bool {
        match self.types.binary_search(&ty) {
            Ok(at) => {
                self.types.remove(at);
                true
            }
            Err(_) => false,
        }
    }

    /// Remove and return the most recently ordered type, if any
    pub(crate) fn pop(&mut self) -> Option<ComponentTypeId> {
        self.types.pop()
    }

    /// Iterate over the attached types
    pub fn iter(&self) -> impl Iterator<Item = ComponentTypeId> + '_ {
        self.types.iter().copied()
    }

    /// Number of attached types
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Check if nothing is attached
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Store-side record of a live entity
///
/// Records are recycled through a pool; `reset` is applied by the store
/// before a recycled record is reissued.
#[derive(Debug, Clone)]
pub struct EntityRecord {
    id: EntityId,
    components: ComponentSet,
}

impl Default for EntityRecord {
    fn default() -> Self {
        EntityRecord {
            id: EntityId(u32::MAX),
            components: ComponentSet::new(),
        }
    }
}

impl EntityRecord {
    /// Get the entity id
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Get the attached component types
    pub fn components(&self) -> &ComponentSet {
        &self.components
    }

    pub(crate) fn components_mut(&mut self) -> &mut ComponentSet {
        &mut self.components
    }

    pub(crate) fn reset(&mut self, id: EntityId) {
        self.id = id;
        self.components.types.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id() {
        let id = EntityId::new(42);
        assert_eq!(id.raw(), 42);
        assert_eq!(id.to_string(), "Entity(42)");
    }

    #[test]
    fn test_component_set_membership() {
        let a = ComponentTypeId::from_raw(3);
        let b = ComponentTypeId::from_raw(1);
        let c = ComponentTypeId::from_raw(2);

        let mut set = ComponentSet::new();
        assert!(set.insert(a));
        assert!(set.insert(b));
        assert!(!set.insert(a));
        assert_eq!(set.len(), 2);

        assert!(set.contains(a));
        assert!(!set.contains(c));
        assert!(set.contains_all(&[a, b]));
        assert!(!set.contains_all(&[a, c]));

        assert!(set.remove(a));
        assert!(!set.remove(a));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![b]);
    }

    #[test]
    fn test_record_reset_keeps_nothing_attached() {
        let mut record = EntityRecord::default();
        record.reset(EntityId::new(1));
        record.components_mut().insert(ComponentTypeId::from_raw(9));

        record.reset(EntityId::new(2));
        assert_eq!(record.id(), EntityId::new(2));
        assert!(record.components().is_empty());
    }
}
