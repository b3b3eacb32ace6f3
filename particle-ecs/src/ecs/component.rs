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
//! Component storage and the component type registry
//!
//! Each registered component type owns one [`ComponentColumn`]: a sparse set
//! that keeps component values densely packed, maps entity ids to dense
//! indices, and draws instances from the type's [`Allocator`]. Removal uses
//! swap-remove so the dense array never has gaps.
//!
//! Columns are stored type-erased behind [`ErasedColumn`] so the store can
//! release every component of an entity during teardown without knowing the
//! static component types at the call site.

use crate::ecs::EntityId;
use crate::error::EcsError;
use crate::pool::Allocator;
use crate::vector::Vec2;
use log::debug;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU32, Ordering};

/// Trait that all components must implement
///
/// Components should be plain data structures without behavior. `Default`
/// is used by the allocators to construct fresh instances.
pub trait Component: 'static + Default {}

impl Component for Vec2 {}

static NEXT_COMPONENT_TYPE_ID: AtomicU32 = AtomicU32::new(0);

/// Process-wide unique identifier of a component type
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComponentTypeId(u32);

impl ComponentTypeId {
    fn next() -> Self {
        ComponentTypeId(NEXT_COMPONENT_TYPE_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[cfg(test)]
    pub(crate) fn from_raw(raw: u32) -> Self {
        ComponentTypeId(raw)
    }

    /// Get the raw u32 value
    pub fn raw(&self) -> u32 {
        self.0
    }
}

/// Typed handle for a registered component type
///
/// Obtained from [`Context::register_component`](crate::ecs::Context::register_component).
/// Handles are `Copy` and cheap to pass around; the same Rust type may be
/// registered several times under different names (position and velocity
/// are both [`Vec2`]).
pub struct ComponentType<T> {
    id: ComponentTypeId,
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ComponentType<T> {
    /// Get the identifier of this component type
    pub fn id(&self) -> ComponentTypeId {
        self.id
    }

    /// Get the name this type was registered under
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for ComponentType<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ComponentType<T> {}

impl<T> PartialEq for ComponentType<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for ComponentType<T> {}

impl<T> fmt::Debug for ComponentType<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentType")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

/// Sparse-set storage for one component type
pub struct ComponentColumn<T: Component> {
    name: &'static str,
    /// Mapping from entity to dense array index
    entity_to_index: HashMap<EntityId, usize>,
    /// Mapping from dense array index back to entity (for swap_remove)
    index_to_entity: Vec<EntityId>,
    components: Vec<T>,
    allocator: Box<dyn Allocator<T>>,
}

impl<T: Component> ComponentColumn<T> {
    fn new(name: &'static str, allocator: Box<dyn Allocator<T>>) -> Self {
        ComponentColumn {
            name,
            entity_to_index: HashMap::new(),
            index_to_entity: Vec::new(),
            components: Vec::new(),
            allocator,
        }
    }

    /// Allocate an instance for `owner` and append it
    ///
    /// The caller guarantees `owner` has no instance in this column yet.
    pub(crate) fn attach(&mut self, owner: EntityId) -> &mut T {
        debug_assert!(!self.entity_to_index.contains_key(&owner));

        let component = self.allocator.allocate(owner);
        let index = self.components.len();
        self.components.push(component);
        self.index_to_entity.push(owner);
        self.entity_to_index.insert(owner, index);

        &mut self.components[index]
    }

    /// Swap-remove the instance of `owner` and hand it back to the allocator
    pub(crate) fn detach(&mut self, owner: EntityId) -> bool {
        let Some(index) = self.entity_to_index.remove(&owner) else {
            return false;
        };

        let component = self.components.swap_remove(index);
        self.index_to_entity.swap_remove(index);
        if let Some(&moved) = self.index_to_entity.get(index) {
            self.entity_to_index.insert(moved, index);
        }

        debug_assert_eq!(self.entity_to_index.len(), self.index_to_entity.len());
        debug_assert_eq!(self.entity_to_index.len(), self.components.len());

        self.allocator.release(owner, component);
        true
    }

    /// Get the component of `owner`
    pub fn get(&self, owner: EntityId) -> Option<&T> {
        let index = self.entity_to_index.get(&owner)?;
        Some(&self.components[*index])
    }

    /// Get the component of `owner` mutably
    pub fn get_mut(&mut self, owner: EntityId) -> Option<&mut T> {
        let index = self.entity_to_index.get(&owner)?;
        Some(&mut self.components[*index])
    }

    /// Get the dense index for `owner`, if it has a component here
    pub fn index_of(&self, owner: EntityId) -> Option<usize> {
        self.entity_to_index.get(&owner).copied()
    }

    /// Check if `owner` has a component here
    pub fn contains(&self, owner: EntityId) -> bool {
        self.entity_to_index.contains_key(&owner)
    }

    /// Get the dense component array
    pub fn components(&self) -> &[T] {
        &self.components
    }

    /// Get the dense component array mutably
    pub fn components_mut(&mut self) -> &mut [T] {
        &mut self.components
    }

    /// Iterate over owners in dense order
    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.index_to_entity.iter().copied()
    }

    /// Number of stored components
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Check if the column is empty
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Name of the component type
    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Type-erased view of a [`ComponentColumn`]
pub trait ErasedColumn {
    /// Name of the component type
    fn name(&self) -> &'static str;

    /// Detach and release the component of `owner`, returning false if absent
    fn release(&mut self, owner: EntityId) -> bool;

    /// Allow downcasting to the concrete column type
    fn as_any(&self) -> &dyn Any;

    /// Allow mutable downcasting to the concrete column type
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> ErasedColumn for ComponentColumn<T> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn release(&mut self, owner: EntityId) -> bool {
        self.detach(owner)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Registry mapping component type ids to their columns
#[derive(Default)]
pub struct ComponentRegistry {
    columns: Vec<Box<dyn ErasedColumn>>,
    slots: HashMap<ComponentTypeId, usize>,
}

impl ComponentRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component type backed by `allocator`
    pub fn register<T: Component>(
        &mut self,
        name: &'static str,
        allocator: impl Allocator<T> + 'static,
    ) -> ComponentType<T> {
        let id = ComponentTypeId::next();
        self.slots.insert(id, self.columns.len());
        self.columns
            .push(Box::new(ComponentColumn::<T>::new(name, Box::new(allocator))));
        debug!("registered component type `{}` as {:?}", name, id);

        ComponentType {
            id,
            name,
            _marker: PhantomData,
        }
    }

    /// Check if `id` belongs to this registry
    pub fn is_registered(&self, id: ComponentTypeId) -> bool {
        self.slots.contains_key(&id)
    }

    /// Number of registered component types
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Check if no component types are registered
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Name of a registered component type
    pub fn name_of(&self, id: ComponentTypeId) -> Option<&'static str> {
        self.slots.get(&id).map(|&slot| self.columns[slot].name())
    }

    /// Release the component of `owner` in the column of `id`
    ///
    /// This is the type-erased path used during entity teardown.
    pub fn release(&mut self, id: ComponentTypeId, owner: EntityId) -> bool {
        match self.slots.get(&id) {
            Some(&slot) => self.columns[slot].release(owner),
            None => false,
        }
    }

    /// Get the typed column of `ty`
    pub fn column<T: Component>(&self, ty: ComponentType<T>) -> Result<&ComponentColumn<T>, EcsError> {
        self.slots
            .get(&ty.id)
            .and_then(|&slot| self.columns[slot].as_any().downcast_ref())
            .ok_or_else(|| unregistered(ty))
    }

    /// Get the typed column of `ty` mutably
    pub fn column_mut<T: Component>(
        &mut self,
        ty: ComponentType<T>,
    ) -> Result<&mut ComponentColumn<T>, EcsError> {
        match self.slots.get(&ty.id) {
            Some(&slot) => self.columns[slot]
                .as_any_mut()
                .downcast_mut()
                .ok_or_else(|| unregistered(ty)),
            None => Err(unregistered(ty)),
        }
    }

    /// Borrow two distinct columns mutably at once
    ///
    /// # Panics
    ///
    /// Panics if `a` and `b` are the same component type.
    pub fn columns2_mut<A: Component, B: Component>(
        &mut self,
        a: ComponentType<A>,
        b: ComponentType<B>,
    ) -> Result<(&mut ComponentColumn<A>, &mut ComponentColumn<B>), EcsError> {
        let slots = [self.slot(a)?, self.slot(b)?];
        let [ca, cb] = disjoint_mut(&mut self.columns, slots);
        Ok((downcast(ca, a)?, downcast(cb, b)?))
    }

    /// Borrow three distinct columns mutably at once
    ///
    /// # Panics
    ///
    /// Panics if any two of the component types are the same.
    #[allow(clippy::type_complexity)]
    pub fn columns3_mut<A: Component, B: Component, C: Component>(
        &mut self,
        a: ComponentType<A>,
        b: ComponentType<B>,
        c: ComponentType<C>,
    ) -> Result<
        (
            &mut ComponentColumn<A>,
            &mut ComponentColumn<B>,
            &mut ComponentColumn<C>,
        ),
        EcsError,
    > {
        let slots = [self.slot(a)?, self.slot(b)?, self.slot(c)?];
        let [ca, cb, cc] = disjoint_mut(&mut self.columns, slots);
        Ok((downcast(ca, a)?, downcast(cb, b)?, downcast(cc, c)?))
    }

    fn slot<T>(&self, ty: ComponentType<T>) -> Result<usize, EcsError> {
        self.slots.get(&ty.id).copied().ok_or_else(|| unregistered(ty))
    }
}

fn unregistered<T>(ty: ComponentType<T>) -> EcsError {
    EcsError::UnregisteredComponentType {
        id: ty.id,
        name: ty.name,
    }
}

fn downcast<T: Component>(
    column: &mut Box<dyn ErasedColumn>,
    ty: ComponentType<T>,
) -> Result<&mut ComponentColumn<T>, EcsError> {
    column
        .as_any_mut()
        .downcast_mut()
        .ok_or_else(|| unregistered(ty))
}

/// Pick `N` distinct elements of `columns` mutably
fn disjoint_mut<const N: usize>(
    columns: &mut [Box<dyn ErasedColumn>],
    slots: [usize; N],
) -> [&mut Box<dyn ErasedColumn>; N] {
    for (i, slot) in slots.iter().enumerate() {
        assert!(
            !slots[..i].contains(slot),
            "component types in a multi-column borrow must be distinct"
        );
    }

    let mut picked: [Option<&mut Box<dyn ErasedColumn>>; N] = std::array::from_fn(|_| None);
    for (slot, column) in columns.iter_mut().enumerate() {
        if let Some(k) = slots.iter().position(|&s| s == slot) {
            picked[k] = Some(column);
        }
    }
    picked.map(|column| match column {
        Some(column) => column,
        None => unreachable!("slot was resolved from this registry"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{DefaultAllocator, PoolAllocator};

    #[derive(Debug, Clone, Copy, PartialEq, Default)]
    struct TestComponent {
        x: f32,
        y: f32,
    }

    impl Component for TestComponent {}

    #[test]
    fn test_component_type_ids_are_unique() {
        let mut registry = ComponentRegistry::new();
        let a = registry.register::<Vec2>("Position", PoolAllocator::new());
        let b = registry.register::<Vec2>("Velocity", PoolAllocator::new());

        assert_ne!(a.id(), b.id());
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.name_of(b.id()), Some("Velocity"));
    }

    #[test]
    fn test_column_attach_and_get() {
        let mut registry = ComponentRegistry::new();
        let ty = registry.register::<TestComponent>("Test", DefaultAllocator::new());
        let column = registry.column_mut(ty).unwrap();

        let e = EntityId::new(1);
        *column.attach(e) = TestComponent { x: 10.0, y: 20.0 };

        assert!(column.contains(e));
        assert_eq!(column.get(e).unwrap().x, 10.0);
        assert_eq!(column.len(), 1);
    }

    #[test]
    fn test_column_swap_remove_updates_moved_index() {
        let mut registry = ComponentRegistry::new();
        let ty = registry.register::<TestComponent>("Test", PoolAllocator::new());
        let column = registry.column_mut(ty).unwrap();

        for i in 0..5 {
            column.attach(EntityId::new(i)).x = i as f32;
        }

        assert!(column.detach(EntityId::new(1)));
        assert_eq!(column.len(), 4);
        assert!(!column.contains(EntityId::new(1)));

        for i in [0, 2, 3, 4] {
            let e = EntityId::new(i);
            let index = column.index_of(e).unwrap();
            assert_eq!(column.components()[index].x, i as f32);
        }
    }

    #[test]
    fn test_column_detach_absent() {
        let mut registry = ComponentRegistry::new();
        let ty = registry.register::<TestComponent>("Test", PoolAllocator::new());
        assert!(!registry.column_mut(ty).unwrap().detach(EntityId::new(4)));
    }

    #[test]
    fn test_erased_release() {
        let mut registry = ComponentRegistry::new();
        let ty = registry.register::<TestComponent>("Test", PoolAllocator::new());
        let e = EntityId::new(5);
        registry.column_mut(ty).unwrap().attach(e);

        assert!(registry.release(ty.id(), e));
        assert!(!registry.release(ty.id(), e));
        assert!(registry.column(ty).unwrap().is_empty());
    }

    #[test]
    fn test_foreign_component_type_is_rejected() {
        let mut ours = ComponentRegistry::new();
        let mut theirs = ComponentRegistry::new();
        let foreign = theirs.register::<TestComponent>("Test", PoolAllocator::new());
        ours.register::<TestComponent>("Test", PoolAllocator::new());

        assert!(matches!(
            ours.column(foreign),
            Err(EcsError::UnregisteredComponentType { name: "Test", .. })
        ));
    }

    #[test]
    fn test_columns2_mut() {
        let mut registry = ComponentRegistry::new();
        let p = registry.register::<Vec2>("Position", PoolAllocator::new());
        let v = registry.register::<Vec2>("Velocity", PoolAllocator::new());
        let e = EntityId::new(0);

        let (positions, velocities) = registry.columns2_mut(p, v).unwrap();
        positions.attach(e).set(1.0, 1.0);
        velocities.attach(e).set(2.0, 0.0);

        let (positions, velocities) = registry.columns2_mut(p, v).unwrap();
        let vel = *velocities.get(e).unwrap();
        positions.get_mut(e).unwrap().add(&vel);
        assert_eq!(*registry.column(p).unwrap().get(e).unwrap(), Vec2::new(3.0, 1.0));
    }

    #[test]
    #[should_panic(expected = "must be distinct")]
    fn test_columns2_mut_rejects_aliasing() {
        let mut registry = ComponentRegistry::new();
        let p = registry.register::<Vec2>("Position", PoolAllocator::new());
        let _ = registry.columns2_mut(p, p);
    }
}
