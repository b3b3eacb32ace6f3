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
//! System execution framework
//!
//! Systems contain the logic that operates on entities and components. A
//! simulation system is usually built once, capturing its group handle,
//! component types and scratch vectors, and then run every tick.

use crate::ecs::Context;

/// Trait for systems that operate on the entity store
pub trait System {
    /// Advance this system by `dt` seconds
    fn run(&mut self, ctx: &mut Context, dt: f64);

    /// Get the name of this system for debugging
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// A named closure run as a system
///
/// # Examples
///
/// ```
/// use particle_ecs::ecs::{Context, FnSystem, System};
///
/// let mut elapsed = 0.0;
/// let mut clock = FnSystem::new("clock", move |_ctx: &mut Context, dt: f64| {
///     elapsed += dt;
/// });
///
/// let mut ctx = Context::new();
/// clock.run(&mut ctx, 0.5);
/// assert_eq!(clock.name(), "clock");
/// ```
pub struct FnSystem {
    name: &'static str,
    tick: Box<dyn FnMut(&mut Context, f64)>,
}

impl FnSystem {
    /// Wrap `tick` as a system called `name`
    pub fn new(name: &'static str, tick: impl FnMut(&mut Context, f64) + 'static) -> Self {
        FnSystem {
            name,
            tick: Box::new(tick),
        }
    }
}

impl System for FnSystem {
    fn run(&mut self, ctx: &mut Context, dt: f64) {
        (self.tick)(ctx, dt);
    }

    fn name(&self) -> &str {
        self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct TestSystem {
        run_count: usize,
    }

    impl System for TestSystem {
        fn run(&mut self, _ctx: &mut Context, _dt: f64) {
            self.run_count += 1;
        }
    }

    #[test]
    fn test_system_run() {
        let mut ctx = Context::new();
        let mut system = TestSystem { run_count: 0 };
        system.run(&mut ctx, 0.1);
        system.run(&mut ctx, 0.1);
        assert_eq!(system.run_count, 2);
        assert!(system.name().ends_with("TestSystem"));
    }

    #[test]
    fn test_fn_system_keeps_state_between_runs() {
        let total = Rc::new(Cell::new(0.0));
        let seen = Rc::clone(&total);
        let mut system = FnSystem::new("accumulate", move |_, dt| seen.set(seen.get() + dt));

        let mut ctx = Context::new();
        system.run(&mut ctx, 0.25);
        system.run(&mut ctx, 0.25);
        assert_eq!(total.get(), 0.5);
    }
}
