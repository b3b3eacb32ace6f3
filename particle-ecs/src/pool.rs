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
//! Memory pooling for reducing allocation churn
//!
//! Component types draw their instances from an [`Allocator`]. Three
//! strategies are provided:
//!
//! - [`DefaultAllocator`]: constructs a fresh value every time and drops
//!   released values
//! - [`PoolAllocator`]: keeps released values on a free list and hands them
//!   out again
//! - [`TrackedPoolAllocator`]: a pool that also records which owner holds an
//!   instance and asserts on double allocation or untracked release
//!
//! Pools never reset the values they hand out. A value taken from a pool
//! carries whatever its previous owner left in it, so callers must overwrite
//! every field they rely on.
//!
//! All pools are single-threaded; they are only touched from the simulation
//! thread.

use crate::ecs::EntityId;
use crate::error::EcsError;
use log::debug;
use std::collections::HashSet;

/// Allocation strategy for one component type
///
/// `owner` is the entity the instance is (or was) attached to. Simple
/// strategies ignore it.
pub trait Allocator<T> {
    /// Produce an instance for `owner`
    fn allocate(&mut self, owner: EntityId) -> T;

    /// Take back the instance previously allocated for `owner`
    fn release(&mut self, owner: EntityId, value: T);

    /// Get the name of this allocator for debugging
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Configuration for pool behavior
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Initial capacity reserved for the free list
    pub initial_capacity: usize,
    /// Maximum number of released values kept for reuse
    pub max_pool_size: usize,
    /// Whether to log when the pool has to construct a new value
    pub log_resize_events: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        PoolConfig {
            initial_capacity: 64,
            max_pool_size: 1 << 16,
            log_resize_events: false,
        }
    }
}

impl PoolConfig {
    /// Create a new pool configuration with custom settings
    pub fn new(initial_capacity: usize, max_pool_size: usize) -> Self {
        PoolConfig {
            initial_capacity,
            max_pool_size,
            log_resize_events: false,
        }
    }

    /// Enable logging for growth events
    pub fn with_logging(mut self) -> Self {
        self.log_resize_events = true;
        self
    }
}

/// Statistics for monitoring pool performance
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoolStats {
    /// Number of allocations served from the free list
    pub hits: usize,
    /// Number of allocations that constructed a new value
    pub misses: usize,
    /// Number of released values dropped because the free list was full
    pub discarded: usize,
    /// Current number of values on the free list
    pub pool_size: usize,
    /// Peak number of values ever held on the free list
    pub peak_size: usize,
}

impl PoolStats {
    /// Calculate the hit rate as a percentage
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

/// Allocator that relies on ordinary drop for reclamation
///
/// Every allocation is a fresh `T::default()`.
#[derive(Debug)]
pub struct DefaultAllocator<T> {
    allocated: usize,
    _marker: std::marker::PhantomData<fn() -> T>,
}

impl<T> DefaultAllocator<T> {
    /// Create a new allocator
    pub fn new() -> Self {
        DefaultAllocator {
            allocated: 0,
            _marker: std::marker::PhantomData,
        }
    }

    /// Number of values constructed so far
    pub fn allocated(&self) -> usize {
        self.allocated
    }
}

impl<T> Default for DefaultAllocator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Default> Allocator<T> for DefaultAllocator<T> {
    fn allocate(&mut self, _owner: EntityId) -> T {
        self.allocated += 1;
        T::default()
    }

    fn release(&mut self, _owner: EntityId, value: T) {
        drop(value);
    }
}

/// Free-list pool allocator
///
/// `acquire` pops the most recently released value if there is one and
/// constructs `T::default()` otherwise. Released values are not reset.
///
/// # Examples
///
/// ```
/// use particle_ecs::pool::PoolAllocator;
///
/// let mut pool: PoolAllocator<Box<u32>> = PoolAllocator::new();
/// let first = pool.acquire();
/// let addr = &*first as *const u32;
/// pool.recycle(first);
///
/// let second = pool.acquire();
/// assert_eq!(&*second as *const u32, addr);
/// ```
#[derive(Debug)]
pub struct PoolAllocator<T> {
    free_list: Vec<T>,
    config: PoolConfig,
    stats: PoolStats,
}

impl<T: Default> PoolAllocator<T> {
    /// Create a new pool with default configuration
    pub fn new() -> Self {
        Self::with_config(PoolConfig::default())
    }

    /// Create a new pool with custom configuration
    pub fn with_config(config: PoolConfig) -> Self {
        PoolAllocator {
            free_list: Vec::with_capacity(config.initial_capacity),
            config,
            stats: PoolStats::default(),
        }
    }

    /// Take a value from the pool, constructing one if the free list is empty
    pub fn acquire(&mut self) -> T {
        match self.free_list.pop() {
            Some(value) => {
                self.stats.hits += 1;
                self.stats.pool_size = self.free_list.len();
                value
            }
            None => {
                self.stats.misses += 1;
                if self.config.log_resize_events {
                    debug!(
                        "{}: allocating new value (hit rate: {:.1}%)",
                        std::any::type_name::<T>(),
                        self.stats.hit_rate()
                    );
                }
                T::default()
            }
        }
    }

    /// Return a value to the pool for future reuse
    ///
    /// If the pool already holds `max_pool_size` values the value is dropped.
    pub fn recycle(&mut self, value: T) {
        if self.free_list.len() < self.config.max_pool_size {
            self.free_list.push(value);
            self.stats.pool_size = self.free_list.len();
            if self.stats.pool_size > self.stats.peak_size {
                self.stats.peak_size = self.stats.pool_size;
            }
        } else {
            self.stats.discarded += 1;
        }
    }

    /// Get current pool statistics
    pub fn stats(&self) -> PoolStats {
        self.stats.clone()
    }

    /// Drop every pooled value
    pub fn clear(&mut self) {
        self.free_list.clear();
        self.stats.pool_size = 0;
    }

    /// Get the current number of values on the free list
    pub fn len(&self) -> usize {
        self.free_list.len()
    }

    /// Check if the free list is empty
    pub fn is_empty(&self) -> bool {
        self.free_list.is_empty()
    }
}

impl<T: Default> Default for PoolAllocator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Default> Allocator<T> for PoolAllocator<T> {
    fn allocate(&mut self, _owner: EntityId) -> T {
        self.acquire()
    }

    fn release(&mut self, _owner: EntityId, value: T) {
        self.recycle(value);
    }
}

/// Pool allocator that tracks the active instance of every owner
///
/// Allocating twice for the same owner, or releasing for an owner that holds
/// nothing, is a programming error: the [`Allocator`] implementation panics.
/// The `try_*` methods report the same conditions as [`EcsError`].
///
/// Instances are moved out on allocation and moved back on release, so a
/// store that holds the value in its column between the two calls can only
/// release the instance it was handed for that owner. The tracker therefore
/// records owners, not instances.
#[derive(Debug)]
pub struct TrackedPoolAllocator<T> {
    pool: PoolAllocator<T>,
    active: HashSet<EntityId>,
}

impl<T: Default> TrackedPoolAllocator<T> {
    /// Create a new tracked pool with default configuration
    pub fn new() -> Self {
        Self::with_config(PoolConfig::default())
    }

    /// Create a new tracked pool with custom configuration
    pub fn with_config(config: PoolConfig) -> Self {
        TrackedPoolAllocator {
            pool: PoolAllocator::with_config(config),
            active: HashSet::new(),
        }
    }

    /// Allocate for `owner`, failing if it already holds an instance
    pub fn try_allocate(&mut self, owner: EntityId) -> Result<T, EcsError> {
        if !self.active.insert(owner) {
            return Err(EcsError::AlreadyAllocated(owner));
        }
        Ok(self.pool.acquire())
    }

    /// Release the instance held by `owner`, failing if it holds none
    pub fn try_release(&mut self, owner: EntityId, value: T) -> Result<(), EcsError> {
        if !self.active.remove(&owner) {
            return Err(EcsError::UntrackedRelease(owner));
        }
        self.pool.recycle(value);
        Ok(())
    }

    /// Check whether `owner` currently holds an instance
    pub fn is_active(&self, owner: EntityId) -> bool {
        self.active.contains(&owner)
    }

    /// Number of instances currently handed out
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Get current pool statistics
    pub fn stats(&self) -> PoolStats {
        self.pool.stats()
    }
}

impl<T: Default> Default for TrackedPoolAllocator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Default> Allocator<T> for TrackedPoolAllocator<T> {
    fn allocate(&mut self, owner: EntityId) -> T {
        self.try_allocate(owner).unwrap_or_else(|err| panic!("{err}"))
    }

    fn release(&mut self, owner: EntityId, value: T) {
        if let Err(err) = self.try_release(owner, value) {
            panic!("{err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_config_defaults() {
        let config = PoolConfig::default();
        assert_eq!(config.initial_capacity, 64);
        assert_eq!(config.max_pool_size, 65536);
        assert!(!config.log_resize_events);
    }

    #[test]
    fn test_pool_config_custom() {
        let config = PoolConfig::new(128, 16).with_logging();
        assert_eq!(config.initial_capacity, 128);
        assert_eq!(config.max_pool_size, 16);
        assert!(config.log_resize_events);
    }

    #[test]
    fn test_release_then_allocate_returns_same_instance() {
        let mut pool: PoolAllocator<Box<[f64; 4]>> = PoolAllocator::new();
        let owner = EntityId::new(7);

        let value = pool.allocate(owner);
        let addr = value.as_ptr();
        pool.release(owner, value);
        assert_eq!(pool.len(), 1);

        let again = pool.allocate(owner);
        assert_eq!(again.as_ptr(), addr);
        assert!(pool.is_empty());
    }

    #[test]
    fn test_empty_pool_never_returns_live_instance() {
        let mut pool: PoolAllocator<Box<u64>> = PoolAllocator::new();
        let a = pool.acquire();
        let b = pool.acquire();
        assert_ne!(&*a as *const u64, &*b as *const u64);

        let stats = pool.stats();
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.hits, 0);
    }

    #[test]
    fn test_pool_does_not_reset_values() {
        let mut pool: PoolAllocator<(f64, f64)> = PoolAllocator::new();
        pool.recycle((3.0, 4.0));
        assert_eq!(pool.acquire(), (3.0, 4.0));
    }

    #[test]
    fn test_pool_max_size() {
        let mut pool: PoolAllocator<u32> = PoolAllocator::with_config(PoolConfig::new(4, 2));
        pool.recycle(1);
        pool.recycle(2);
        pool.recycle(3);

        assert_eq!(pool.len(), 2);
        assert_eq!(pool.stats().discarded, 1);
    }

    #[test]
    fn test_pool_stats_tracking() {
        let mut pool: PoolAllocator<u32> = PoolAllocator::new();

        let v = pool.acquire(); // miss
        pool.recycle(v);
        let v = pool.acquire(); // hit
        pool.recycle(v);
        let v = pool.acquire(); // hit
        pool.recycle(v);

        let stats = pool.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.pool_size, 1);
        assert_eq!(stats.peak_size, 1);
        assert!((stats.hit_rate() - 66.666).abs() < 0.01);
    }

    #[test]
    fn test_pool_clear() {
        let mut pool: PoolAllocator<u32> = PoolAllocator::new();
        pool.recycle(1);
        pool.recycle(2);
        pool.clear();
        assert!(pool.is_empty());
        assert_eq!(pool.stats().pool_size, 0);
    }

    #[test]
    fn test_default_allocator_always_constructs() {
        let mut alloc: DefaultAllocator<Vec<u8>> = DefaultAllocator::new();
        let owner = EntityId::new(1);

        let mut v = alloc.allocate(owner);
        v.push(9);
        alloc.release(owner, v);

        assert!(alloc.allocate(owner).is_empty());
        assert_eq!(alloc.allocated(), 2);
    }

    #[test]
    fn test_tracked_pool_round_trip() {
        let mut alloc: TrackedPoolAllocator<u32> = TrackedPoolAllocator::new();
        let owner = EntityId::new(3);

        let v = alloc.allocate(owner);
        assert!(alloc.is_active(owner));
        assert_eq!(alloc.active_count(), 1);

        alloc.release(owner, v);
        assert!(!alloc.is_active(owner));
        assert_eq!(alloc.stats().pool_size, 1);
    }

    #[test]
    fn test_tracked_pool_reports_double_release() {
        let mut alloc: TrackedPoolAllocator<u32> = TrackedPoolAllocator::new();
        let owner = EntityId::new(3);

        let v = alloc.try_allocate(owner).unwrap();
        alloc.try_release(owner, v).unwrap();
        assert_eq!(
            alloc.try_release(owner, 0),
            Err(EcsError::UntrackedRelease(owner))
        );
    }

    #[test]
    fn test_tracked_pool_reports_double_allocate() {
        let mut alloc: TrackedPoolAllocator<u32> = TrackedPoolAllocator::new();
        let owner = EntityId::new(3);

        alloc.try_allocate(owner).unwrap();
        assert_eq!(
            alloc.try_allocate(owner),
            Err(EcsError::AlreadyAllocated(owner))
        );
    }

    #[test]
    #[should_panic(expected = "pool has no active instance")]
    fn test_tracked_pool_panics_on_untracked_release() {
        let mut alloc: TrackedPoolAllocator<u32> = TrackedPoolAllocator::new();
        alloc.release(EntityId::new(11), 0);
    }
}
