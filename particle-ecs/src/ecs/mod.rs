//! Entity Component System (ECS) core implementation
//!
//! This module provides the entity store and everything it is built from:
//! - Entity ids and pooled entity records
//! - Type-erased component registry with sparse-set columns
//! - Groups kept current by change notification
//! - System execution framework and the particle systems

mod component;
mod context;
mod entity;
mod group;
mod system;

pub mod components;
pub mod scheduler;
pub mod systems;

pub use component::{Component, ComponentColumn, ComponentRegistry, ComponentType, ComponentTypeId};
pub use context::Context;
pub use entity::{ComponentSet, EntityId, EntityRecord};
pub use group::{ComponentObserver, EntityList, Group, GroupId, ObserverId};
pub use system::{FnSystem, System};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::PoolAllocator;
    use crate::vector::Vec2;

    #[test]
    fn test_context_creation() {
        let ctx = Context::new();
        assert_eq!(ctx.entity_count(), 0);
    }

    #[test]
    fn test_entity_creation() {
        let mut ctx = Context::new();
        let entity = ctx.create_entity();
        assert_eq!(ctx.entity_count(), 1);
        assert!(ctx.is_alive(entity));
    }

    #[test]
    fn test_group_over_three_entities() {
        let mut ctx = Context::new();
        let x = ctx.register_component::<Vec2>("X", PoolAllocator::new());
        let y = ctx.register_component::<Vec2>("Y", PoolAllocator::new());

        let a = ctx.create_entity();
        let b = ctx.create_entity();
        let c = ctx.create_entity();
        ctx.add_component(a, x);
        ctx.add_component(b, x);
        ctx.add_component(c, y);

        let group = ctx.create_group(&[x.id(), y.id()]);
        assert!(ctx.group(group).is_empty());

        ctx.add_component(b, y);
        assert_eq!(ctx.group(group).entities().as_slice(), &[b]);
    }
}
