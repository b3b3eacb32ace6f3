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
//! Staged system scheduler
//!
//! Systems are organized into stages that execute in ascending order. Within
//! a stage, systems run in the order they were added. Everything runs on the
//! calling thread and completes before [`Scheduler::run`] returns.

use crate::ecs::{Context, System};

/// Stage identifier for grouping systems
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StageId(pub usize);

impl StageId {
    /// Create a new stage ID
    pub fn new(id: usize) -> Self {
        StageId(id)
    }
}

/// Pre-defined stages of a particle tick
pub mod stages {
    use super::StageId;

    /// Lifecycle: age, tear down or reset particles
    pub const RECYCLE: StageId = StageId(0);

    /// Force accumulation (gravity, drag, attraction)
    pub const FORCES: StageId = StageId(1);

    /// Force to velocity
    pub const ACCELERATION: StageId = StageId(2);

    /// Velocity to position
    pub const INTEGRATION: StageId = StageId(3);

    /// Collision response
    pub const CONSTRAINTS: StageId = StageId(4);

    /// Bookkeeping for the renderer
    pub const POST_PROCESS: StageId = StageId(5);
}

struct ScheduledSystem {
    system: Box<dyn System>,
    stage: StageId,
}

/// Runs systems in a fixed stage order
///
/// # Examples
///
/// ```
/// use particle_ecs::ecs::scheduler::{Scheduler, stages};
/// use particle_ecs::ecs::{Context, FnSystem};
///
/// let mut scheduler = Scheduler::new();
/// scheduler.add_system(FnSystem::new("move", |_, _| {}), stages::INTEGRATION);
/// scheduler.add_system(FnSystem::new("gravity", |_, _| {}), stages::FORCES);
///
/// assert_eq!(scheduler.system_names(), vec!["gravity", "move"]);
/// scheduler.run(&mut Context::new(), 1.0 / 60.0);
/// ```
#[derive(Default)]
pub struct Scheduler {
    systems: Vec<ScheduledSystem>,
}

impl Scheduler {
    /// Create a new scheduler
    pub fn new() -> Self {
        Scheduler {
            systems: Vec::new(),
        }
    }

    /// Add a system to a specific stage
    ///
    /// The system runs after every system already registered at the same or
    /// an earlier stage.
    pub fn add_system<S: System + 'static>(&mut self, system: S, stage: StageId) {
        let at = self.systems.partition_point(|s| s.stage <= stage);
        self.systems.insert(
            at,
            ScheduledSystem {
                system: Box::new(system),
                stage,
            },
        );
    }

    /// Get the number of registered systems
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// Get the number of distinct stages in use
    pub fn stage_count(&self) -> usize {
        let mut stages: Vec<StageId> = self.systems.iter().map(|s| s.stage).collect();
        stages.dedup();
        stages.len()
    }

    /// Names of the registered systems in execution order
    pub fn system_names(&self) -> Vec<&str> {
        self.systems.iter().map(|s| s.system.name()).collect()
    }

    /// Run every system once, in stage order
    pub fn run(&mut self, ctx: &mut Context, dt: f64) {
        for scheduled in &mut self.systems {
            scheduled.system.run(ctx, dt);
        }
    }

    /// Clear all systems from the scheduler
    pub fn clear(&mut self) {
        self.systems.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::FnSystem;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recording(name: &'static str, log: &Rc<RefCell<Vec<&'static str>>>) -> FnSystem {
        let log = Rc::clone(log);
        FnSystem::new(name, move |_, _| log.borrow_mut().push(name))
    }

    #[test]
    fn test_stage_ordering() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut scheduler = Scheduler::new();

        scheduler.add_system(recording("bounce", &log), stages::CONSTRAINTS);
        scheduler.add_system(recording("recycle", &log), stages::RECYCLE);
        scheduler.add_system(recording("gravity", &log), stages::FORCES);
        scheduler.add_system(recording("drag", &log), stages::FORCES);
        scheduler.add_system(recording("move", &log), stages::INTEGRATION);
        scheduler.add_system(recording("accelerate", &log), stages::ACCELERATION);

        scheduler.run(&mut Context::new(), 0.1);

        assert_eq!(
            *log.borrow(),
            vec!["recycle", "gravity", "drag", "accelerate", "move", "bounce"]
        );
        assert_eq!(scheduler.system_count(), 6);
        assert_eq!(scheduler.stage_count(), 5);
    }

    #[test]
    fn test_clear() {
        let mut scheduler = Scheduler::new();
        scheduler.add_system(FnSystem::new("noop", |_, _| {}), stages::FORCES);
        scheduler.clear();
        assert_eq!(scheduler.system_count(), 0);
        assert_eq!(scheduler.stage_count(), 0);
    }
}
