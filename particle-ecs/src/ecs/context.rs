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
//! The entity store
//!
//! [`Context`] owns the live entities, the component registry, the groups and
//! any external observers. Every component addition or removal is applied in
//! full (component set, column, observers) before the call returns, so groups
//! are never stale between two store operations.
//!
//! Entity ids are issued from a store-lifetime counter and never reused.
//! Entity records are pooled; destroying an entity returns its record to the
//! pool and the next `create_entity` reuses it under a fresh id.
//!
//! # Notification order
//!
//! - `add_component`: mark the type in the entity's set, allocate the value,
//!   then notify observers.
//! - `remove_component` and each component during `destroy_entity`: unmark the
//!   type, release the value to its allocator, then notify observers.

use crate::ecs::component::{ComponentRegistry, ComponentType};
use crate::ecs::group::{ComponentObserver, Group, GroupId, ObserverId};
use crate::ecs::{Component, ComponentSet, ComponentTypeId, EntityId, EntityRecord};
use crate::error::EcsError;
use crate::pool::{Allocator, PoolAllocator, PoolConfig, PoolStats};
use log::debug;
use std::collections::HashMap;

#[derive(Clone, Copy)]
enum Change {
    Added(ComponentTypeId),
    Removed(ComponentTypeId),
}

/// The entity store
///
/// # Examples
///
/// ```
/// use particle_ecs::ecs::Context;
/// use particle_ecs::pool::PoolAllocator;
/// use particle_ecs::vector::Vec2;
///
/// let mut ctx = Context::new();
/// let position = ctx.register_component::<Vec2>("Position", PoolAllocator::new());
/// let movers = ctx.create_group(&[position.id()]);
///
/// let e = ctx.create_entity();
/// ctx.add_component(e, position).set(1.0, 2.0);
/// assert_eq!(ctx.group(movers).len(), 1);
///
/// ctx.destroy_entity(e);
/// assert!(ctx.group(movers).is_empty());
/// ```
pub struct Context {
    next_entity_id: u32,
    records: Vec<EntityRecord>,
    slots: HashMap<EntityId, usize>,
    record_pool: PoolAllocator<EntityRecord>,
    registry: ComponentRegistry,
    groups: Vec<Option<Group>>,
    observers: Vec<(ObserverId, Box<dyn ComponentObserver>)>,
    next_observer_id: u64,
}

impl Context {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::with_pool_config(PoolConfig::default())
    }

    /// Create a store whose entity-record pool uses `config`
    pub fn with_pool_config(config: PoolConfig) -> Self {
        Context {
            next_entity_id: 0,
            records: Vec::with_capacity(config.initial_capacity),
            slots: HashMap::with_capacity(config.initial_capacity),
            record_pool: PoolAllocator::with_config(config),
            registry: ComponentRegistry::new(),
            groups: Vec::new(),
            observers: Vec::new(),
            next_observer_id: 0,
        }
    }

    /// Register a component type backed by `allocator`
    pub fn register_component<T: Component>(
        &mut self,
        name: &'static str,
        allocator: impl Allocator<T> + 'static,
    ) -> ComponentType<T> {
        self.registry.register(name, allocator)
    }

    /// Get the component registry
    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    /// Create a new entity
    ///
    /// Never fails; the id has not been issued by this store before.
    pub fn create_entity(&mut self) -> EntityId {
        assert!(self.next_entity_id < u32::MAX, "entity id space exhausted");
        let id = EntityId::new(self.next_entity_id);
        self.next_entity_id += 1;

        let mut record = self.record_pool.acquire();
        record.reset(id);
        self.slots.insert(id, self.records.len());
        self.records.push(record);

        id
    }

    /// Destroy an entity, releasing every attached component
    ///
    /// # Panics
    ///
    /// Panics if the entity is not alive.
    pub fn destroy_entity(&mut self, entity: EntityId) {
        if let Err(err) = self.try_destroy_entity(entity) {
            panic!("{err}");
        }
    }

    /// Destroy an entity, failing if it is not alive
    pub fn try_destroy_entity(&mut self, entity: EntityId) -> Result<(), EcsError> {
        let slot = self.slot(entity)?;

        while let Some(ty) = self.records[slot].components_mut().pop() {
            self.registry.release(ty, entity);
            notify(
                &mut self.groups,
                &mut self.observers,
                entity,
                self.records[slot].components(),
                Change::Removed(ty),
            );
        }

        self.slots.remove(&entity);
        let record = self.records.swap_remove(slot);
        if let Some(moved) = self.records.get(slot) {
            self.slots.insert(moved.id(), slot);
        }
        self.record_pool.recycle(record);

        Ok(())
    }

    /// Destroy every live entity
    pub fn clear(&mut self) {
        while let Some(entity) = self.records.last().map(EntityRecord::id) {
            self.destroy_entity(entity);
        }
    }

    /// Check if an entity is alive
    pub fn is_alive(&self, entity: EntityId) -> bool {
        self.slots.contains_key(&entity)
    }

    /// Get the number of live entities
    pub fn entity_count(&self) -> usize {
        self.records.len()
    }

    /// Iterate over live entities in dense order
    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.records.iter().map(EntityRecord::id)
    }

    /// Get the component types attached to `entity`
    pub fn components_of(&self, entity: EntityId) -> Option<&ComponentSet> {
        let slot = self.slots.get(&entity)?;
        Some(self.records[*slot].components())
    }

    /// Statistics of the entity-record pool
    pub fn record_pool_stats(&self) -> PoolStats {
        self.record_pool.stats()
    }

    /// Attach a new component of type `ty` to `entity`
    ///
    /// The returned value may hold stale data from a pooled instance; callers
    /// must overwrite every field they rely on.
    ///
    /// # Panics
    ///
    /// Panics if the entity is not alive, the type is not registered here, or
    /// the entity already carries a component of this type.
    pub fn add_component<T: Component>(&mut self, entity: EntityId, ty: ComponentType<T>) -> &mut T {
        self.try_add_component(entity, ty)
            .unwrap_or_else(|err| panic!("{err}"))
    }

    /// Attach a new component, reporting misuse as an error
    pub fn try_add_component<T: Component>(
        &mut self,
        entity: EntityId,
        ty: ComponentType<T>,
    ) -> Result<&mut T, EcsError> {
        let slot = self.slot(entity)?;
        let column = self.registry.column_mut(ty)?;
        if !self.records[slot].components_mut().insert(ty.id()) {
            return Err(EcsError::ComponentAlreadyAttached {
                entity,
                component: ty.name(),
            });
        }
        column.attach(entity);

        notify(
            &mut self.groups,
            &mut self.observers,
            entity,
            self.records[slot].components(),
            Change::Added(ty.id()),
        );

        self.registry
            .column_mut(ty)?
            .get_mut(entity)
            .ok_or(EcsError::ComponentMissing {
                entity,
                component: ty.name(),
            })
    }

    /// Check whether `entity` carries a component of type `ty`
    pub fn has_component<T>(&self, entity: EntityId, ty: ComponentType<T>) -> bool {
        self.components_of(entity)
            .map_or(false, |set| set.contains(ty.id()))
    }

    /// Get the component of type `ty` on `entity`
    ///
    /// # Panics
    ///
    /// Panics if the component is not attached.
    pub fn get_component<T: Component>(&self, entity: EntityId, ty: ComponentType<T>) -> &T {
        self.try_get_component(entity, ty)
            .unwrap_or_else(|err| panic!("{err}"))
    }

    /// Get the component of type `ty` on `entity`, reporting misuse as an error
    pub fn try_get_component<T: Component>(
        &self,
        entity: EntityId,
        ty: ComponentType<T>,
    ) -> Result<&T, EcsError> {
        self.slot(entity)?;
        self.registry
            .column(ty)?
            .get(entity)
            .ok_or(EcsError::ComponentMissing {
                entity,
                component: ty.name(),
            })
    }

    /// Get the component of type `ty` on `entity` mutably
    ///
    /// # Panics
    ///
    /// Panics if the component is not attached.
    pub fn get_component_mut<T: Component>(&mut self, entity: EntityId, ty: ComponentType<T>) -> &mut T {
        self.try_get_component_mut(entity, ty)
            .unwrap_or_else(|err| panic!("{err}"))
    }

    /// Get the component mutably, reporting misuse as an error
    pub fn try_get_component_mut<T: Component>(
        &mut self,
        entity: EntityId,
        ty: ComponentType<T>,
    ) -> Result<&mut T, EcsError> {
        self.slot(entity)?;
        self.registry
            .column_mut(ty)?
            .get_mut(entity)
            .ok_or(EcsError::ComponentMissing {
                entity,
                component: ty.name(),
            })
    }

    /// Detach and release the component of type `ty` from `entity`
    ///
    /// # Panics
    ///
    /// Panics if the component is not attached.
    pub fn remove_component<T: Component>(&mut self, entity: EntityId, ty: ComponentType<T>) {
        if let Err(err) = self.try_remove_component(entity, ty) {
            panic!("{err}");
        }
    }

    /// Detach and release a component, reporting misuse as an error
    pub fn try_remove_component<T: Component>(
        &mut self,
        entity: EntityId,
        ty: ComponentType<T>,
    ) -> Result<(), EcsError> {
        let slot = self.slot(entity)?;
        let column = self.registry.column_mut(ty)?;
        if !self.records[slot].components_mut().remove(ty.id()) {
            return Err(EcsError::ComponentMissing {
                entity,
                component: ty.name(),
            });
        }
        column.detach(entity);

        notify(
            &mut self.groups,
            &mut self.observers,
            entity,
            self.records[slot].components(),
            Change::Removed(ty.id()),
        );
        Ok(())
    }

    /// Create a group over `types`, seeded from the current live entities
    ///
    /// # Panics
    ///
    /// Panics if `types` is empty or any type is not registered with this store.
    pub fn create_group(&mut self, types: &[ComponentTypeId]) -> GroupId {
        self.try_create_group(types)
            .unwrap_or_else(|err| panic!("{err}"))
    }

    /// Create a group, reporting unregistered component types as an error
    pub fn try_create_group(&mut self, types: &[ComponentTypeId]) -> Result<GroupId, EcsError> {
        // Entity creation and destruction alone send no notification
        if types.is_empty() {
            return Err(EcsError::EmptyGroup);
        }
        if let Some(&id) = types.iter().find(|id| !self.registry.is_registered(**id)) {
            return Err(EcsError::UnregisteredComponentType {
                id,
                name: "<unregistered>",
            });
        }

        let mut group = Group::new(types);
        for record in &self.records {
            group.seed(record.id(), record.components());
        }

        let id = GroupId(self.groups.len());
        debug!(
            "created group {:?} over {} component type(s) with {} initial member(s)",
            id,
            group.required().len(),
            group.len()
        );
        self.groups.push(Some(group));
        Ok(id)
    }

    /// Get a registered group
    ///
    /// # Panics
    ///
    /// Panics if the group was never created or has been removed.
    pub fn group(&self, id: GroupId) -> &Group {
        self.try_group(id).unwrap_or_else(|err| panic!("{err}"))
    }

    /// Get a registered group, reporting unknown handles as an error
    pub fn try_group(&self, id: GroupId) -> Result<&Group, EcsError> {
        lookup_group(&self.groups, id)
    }

    /// Unsubscribe and drop a group
    ///
    /// # Panics
    ///
    /// Panics if the group is not registered.
    pub fn remove_group(&mut self, id: GroupId) {
        let removed = self
            .groups
            .get_mut(id.0)
            .and_then(Option::take)
            .ok_or(EcsError::UnknownGroup(id));
        match removed {
            Ok(_) => debug!("removed group {:?}", id),
            Err(err) => panic!("{err}"),
        }
    }

    /// Subscribe an external observer to component changes
    pub fn add_observer(&mut self, observer: Box<dyn ComponentObserver>) -> ObserverId {
        let id = ObserverId(self.next_observer_id);
        self.next_observer_id += 1;
        self.observers.push((id, observer));
        debug!("registered observer {:?}", id);
        id
    }

    /// Unsubscribe an external observer, handing it back
    ///
    /// # Panics
    ///
    /// Panics if the observer is not registered.
    pub fn remove_observer(&mut self, id: ObserverId) -> Box<dyn ComponentObserver> {
        self.try_remove_observer(id)
            .unwrap_or_else(|err| panic!("{err}"))
    }

    /// Unsubscribe an external observer, reporting unknown handles as an error
    pub fn try_remove_observer(&mut self, id: ObserverId) -> Result<Box<dyn ComponentObserver>, EcsError> {
        let index = self
            .observers
            .iter()
            .position(|(candidate, _)| *candidate == id)
            .ok_or(EcsError::UnknownObserver(id))?;
        debug!("removed observer {:?}", id);
        Ok(self.observers.remove(index).1)
    }

    /// Visit every member of `group` with its `A` component
    ///
    /// The callback cannot reach the store, so component sets cannot change
    /// while the group is being walked.
    ///
    /// # Panics
    ///
    /// Panics if the group is unknown or does not require `A`.
    pub fn each<A: Component>(
        &mut self,
        group: GroupId,
        a: ComponentType<A>,
        mut f: impl FnMut(EntityId, &mut A),
    ) {
        let group = required_group(&self.groups, group, &[a.id()]);
        let column = self.registry.column_mut(a).unwrap_or_else(|err| panic!("{err}"));
        for entity in group.entities().iter() {
            let index = member_index(column.index_of(entity));
            f(entity, &mut column.components_mut()[index]);
        }
    }

    /// Visit every member of `group` with its `A` and `B` components
    ///
    /// # Panics
    ///
    /// Panics if the group is unknown, does not require both types, or `A`
    /// and `B` are the same component type.
    pub fn each2<A: Component, B: Component>(
        &mut self,
        group: GroupId,
        a: ComponentType<A>,
        b: ComponentType<B>,
        mut f: impl FnMut(EntityId, &mut A, &mut B),
    ) {
        let group = required_group(&self.groups, group, &[a.id(), b.id()]);
        let (ca, cb) = self
            .registry
            .columns2_mut(a, b)
            .unwrap_or_else(|err| panic!("{err}"));
        for entity in group.entities().iter() {
            let ia = member_index(ca.index_of(entity));
            let ib = member_index(cb.index_of(entity));
            f(entity, &mut ca.components_mut()[ia], &mut cb.components_mut()[ib]);
        }
    }

    /// Visit every member of `group` with its `A`, `B` and `C` components
    ///
    /// # Panics
    ///
    /// Panics if the group is unknown, does not require all three types, or
    /// any two of them are the same component type.
    pub fn each3<A: Component, B: Component, C: Component>(
        &mut self,
        group: GroupId,
        a: ComponentType<A>,
        b: ComponentType<B>,
        c: ComponentType<C>,
        mut f: impl FnMut(EntityId, &mut A, &mut B, &mut C),
    ) {
        let group = required_group(&self.groups, group, &[a.id(), b.id(), c.id()]);
        let (ca, cb, cc) = self
            .registry
            .columns3_mut(a, b, c)
            .unwrap_or_else(|err| panic!("{err}"));
        for entity in group.entities().iter() {
            let ia = member_index(ca.index_of(entity));
            let ib = member_index(cb.index_of(entity));
            let ic = member_index(cc.index_of(entity));
            f(
                entity,
                &mut ca.components_mut()[ia],
                &mut cb.components_mut()[ib],
                &mut cc.components_mut()[ic],
            );
        }
    }

    /// Read-only walk over `group` with its `A` and `B` components
    ///
    /// This is the query renderers use; it takes `&self` and hands out shared
    /// references only.
    ///
    /// # Panics
    ///
    /// Panics if the group is unknown or does not require both types.
    pub fn view2<A: Component, B: Component>(
        &self,
        group: GroupId,
        a: ComponentType<A>,
        b: ComponentType<B>,
        mut f: impl FnMut(EntityId, &A, &B),
    ) {
        let group = required_group(&self.groups, group, &[a.id(), b.id()]);
        let ca = self.registry.column(a).unwrap_or_else(|err| panic!("{err}"));
        let cb = self.registry.column(b).unwrap_or_else(|err| panic!("{err}"));
        for entity in group.entities().iter() {
            let ia = member_index(ca.index_of(entity));
            let ib = member_index(cb.index_of(entity));
            f(entity, &ca.components()[ia], &cb.components()[ib]);
        }
    }

    fn slot(&self, entity: EntityId) -> Result<usize, EcsError> {
        self.slots
            .get(&entity)
            .copied()
            .ok_or(EcsError::UnknownEntity(entity))
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

fn notify(
    groups: &mut [Option<Group>],
    observers: &mut [(ObserverId, Box<dyn ComponentObserver>)],
    entity: EntityId,
    components: &ComponentSet,
    change: Change,
) {
    for group in groups.iter_mut().flatten() {
        deliver(group, entity, components, change);
    }
    for (_, observer) in observers.iter_mut() {
        deliver(observer.as_mut(), entity, components, change);
    }
}

fn deliver(observer: &mut dyn ComponentObserver, entity: EntityId, components: &ComponentSet, change: Change) {
    match change {
        Change::Added(ty) => observer.on_component_added(entity, components, ty),
        Change::Removed(ty) => observer.on_component_removed(entity, components, ty),
    }
}

fn lookup_group(groups: &[Option<Group>], id: GroupId) -> Result<&Group, EcsError> {
    groups
        .get(id.0)
        .and_then(Option::as_ref)
        .ok_or(EcsError::UnknownGroup(id))
}

fn required_group<'a>(groups: &'a [Option<Group>], id: GroupId, types: &[ComponentTypeId]) -> &'a Group {
    let group = lookup_group(groups, id).unwrap_or_else(|err| panic!("{err}"));
    assert!(
        types.iter().all(|ty| group.required().contains(ty)),
        "group {:?} does not require every queried component type",
        id
    );
    group
}

fn member_index(index: Option<usize>) -> usize {
    match index {
        Some(index) => index,
        None => panic!("group member is missing a required component"),
    }
}
