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
//! Particle simulation systems
//!
//! Each builder creates the group it iterates and acquires its scratch
//! vectors once, then returns an [`FnSystem`] that captures both. Nothing
//! in the per-tick closures looks up a group or allocates.

use std::cell::RefCell;
use std::rc::Rc;

use crate::config::{Attraction, LifecyclePolicy};
use crate::ecs::components::ParticleComponents;
use crate::ecs::{Context, EntityId, FnSystem};
use crate::emitter::Emitter;
use crate::integration::{
    accelerate, accumulate_attraction, advance, apply_drag, apply_gravity, bounce, Circle,
    DragModel,
};
use crate::vector::{Vec2, VectorPool};

/// Keep the population alive according to `policy`
///
/// Under [`LifecyclePolicy::Age`] expired particles are collected during the
/// pass, destroyed afterwards and replaced by freshly emitted ones. The
/// bounds policies relaunch escaped particles in place.
pub fn lifecycle_system(
    ctx: &mut Context,
    particles: ParticleComponents,
    policy: LifecyclePolicy,
    emitter: Rc<RefCell<Emitter>>,
) -> FnSystem {
    match policy {
        LifecyclePolicy::Age => {
            let group = ctx.create_group(&[particles.temporary.id()]);
            let mut expired: Vec<EntityId> = Vec::new();

            FnSystem::new("lifecycle", move |ctx: &mut Context, dt: f64| {
                expired.clear();
                ctx.each(group, particles.temporary, |entity, temporary| {
                    temporary.age += dt;
                    if temporary.is_expired() {
                        expired.push(entity);
                    }
                });

                if expired.is_empty() {
                    return;
                }
                log::debug!("replacing {} expired particles", expired.len());

                let mut emitter = emitter.borrow_mut();
                for &entity in &expired {
                    ctx.destroy_entity(entity);
                    emitter.spawn(ctx, &particles, true);
                }
            })
        }
        LifecyclePolicy::Viewport { min, max } => {
            let escaped = move |p: &Vec2| p.x < min.x || p.x > max.x || p.y < min.y || p.y > max.y;
            bounds_system(ctx, particles, emitter, escaped)
        }
        LifecyclePolicy::BelowFloor { y } => {
            bounds_system(ctx, particles, emitter, move |p: &Vec2| p.y < y)
        }
    }
}

fn bounds_system(
    ctx: &mut Context,
    particles: ParticleComponents,
    emitter: Rc<RefCell<Emitter>>,
    escaped: impl Fn(&Vec2) -> bool + 'static,
) -> FnSystem {
    let group = ctx.create_group(&[
        particles.position.id(),
        particles.velocity.id(),
        particles.appearance.id(),
    ]);

    FnSystem::new("lifecycle", move |ctx: &mut Context, _dt: f64| {
        let mut emitter = emitter.borrow_mut();
        ctx.each3(
            group,
            particles.position,
            particles.velocity,
            particles.appearance,
            |_, p, v, appearance| {
                if escaped(&*p) {
                    emitter.reset(p, v, appearance);
                }
            },
        );
    })
}

/// Add each body's weight to its force accumulator
pub fn gravity_system(
    ctx: &mut Context,
    particles: ParticleComponents,
    gravity: f64,
    scratch: &mut VectorPool,
) -> FnSystem {
    let group = ctx.create_group(&[particles.body.id()]);
    let mut df = scratch.acquire();

    FnSystem::new("gravity", move |ctx: &mut Context, _dt: f64| {
        ctx.each(group, particles.body, |_, body| apply_gravity(body, gravity, &mut df));
    })
}

/// Add air drag relative to `wind` to each body's force accumulator
pub fn drag_system(
    ctx: &mut Context,
    particles: ParticleComponents,
    model: DragModel,
    wind: Vec2,
    gravity: f64,
    scratch: &mut VectorPool,
) -> FnSystem {
    let group = ctx.create_group(&[particles.velocity.id(), particles.body.id()]);
    let mut relative = scratch.acquire();

    FnSystem::new("drag", move |ctx: &mut Context, _dt: f64| {
        ctx.each2(group, particles.velocity, particles.body, |_, v, body| {
            apply_drag(&model, v, &wind, gravity, body, &mut relative);
        });
    })
}

/// Add pairwise gravitation between all bodies
///
/// Snapshots positions and masses, computes every pair, then adds the
/// result back in the same group order.
pub fn attraction_system(ctx: &mut Context, particles: ParticleComponents, attraction: Attraction) -> FnSystem {
    let group = ctx.create_group(&[particles.position.id(), particles.body.id()]);
    let mut positions: Vec<Vec2> = Vec::new();
    let mut masses: Vec<f64> = Vec::new();
    let mut forces: Vec<Vec2> = Vec::new();

    FnSystem::new("attraction", move |ctx: &mut Context, _dt: f64| {
        positions.clear();
        masses.clear();
        ctx.view2(group, particles.position, particles.body, |_, p, body| {
            positions.push(*p);
            masses.push(body.mass);
        });

        forces.clear();
        forces.resize(positions.len(), Vec2::zero());
        accumulate_attraction(
            &positions,
            &masses,
            &mut forces,
            attraction.gravitational_constant,
            attraction.min_distance,
        );

        let mut next = forces.iter();
        ctx.each(group, particles.body, |_, body| {
            if let Some(force) = next.next() {
                body.force.add(force);
            }
        });
    })
}

/// Consume the force accumulator: `v += (F/m) dt`
pub fn accelerate_system(ctx: &mut Context, particles: ParticleComponents, scratch: &mut VectorPool) -> FnSystem {
    let group = ctx.create_group(&[particles.velocity.id(), particles.body.id()]);
    let mut dv = scratch.acquire();

    FnSystem::new("accelerate", move |ctx: &mut Context, dt: f64| {
        ctx.each2(group, particles.velocity, particles.body, |_, v, body| {
            accelerate(v, body, dt, &mut dv);
        });
    })
}

/// Advance positions by the updated velocity: `p += v dt`
pub fn move_system(ctx: &mut Context, particles: ParticleComponents, scratch: &mut VectorPool) -> FnSystem {
    let group = ctx.create_group(&[particles.position.id(), particles.velocity.id()]);
    let mut dp = scratch.acquire();

    FnSystem::new("move", move |ctx: &mut Context, dt: f64| {
        ctx.each2(group, particles.position, particles.velocity, |entity, p, v| {
            advance(p, v, dt, &mut dp);
            if !p.is_valid() || !v.is_valid() {
                log::warn!("{entity} has non-finite state: p = {p:?}, v = {v:?}");
            }
        });
    })
}

/// Bounce particles off a fixed circular obstacle
pub fn bounce_system(
    ctx: &mut Context,
    particles: ParticleComponents,
    obstacle: Circle,
    restitution: f64,
) -> FnSystem {
    let group = ctx.create_group(&[particles.position.id(), particles.velocity.id()]);

    FnSystem::new("bounce", move |ctx: &mut Context, _dt: f64| {
        ctx.each2(group, particles.position, particles.velocity, |_, p, v| {
            bounce(p, v, &obstacle, restitution);
        });
    })
}

/// Record each particle's position into its trail
pub fn trail_system(ctx: &mut Context, particles: ParticleComponents) -> FnSystem {
    let group = ctx.create_group(&[particles.position.id(), particles.appearance.id()]);

    FnSystem::new("trail", move |ctx: &mut Context, _dt: f64| {
        ctx.each2(group, particles.position, particles.appearance, |_, p, appearance| {
            appearance.trail.push(*p);
        });
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmitterConfig;
    use crate::ecs::System;
    use crate::pool::PoolConfig;

    fn particle(ctx: &mut Context, particles: &ParticleComponents, p: Vec2, v: Vec2, mass: f64) -> EntityId {
        let e = ctx.create_entity();
        ctx.add_component(e, particles.position).copy_from(&p);
        ctx.add_component(e, particles.velocity).copy_from(&v);
        ctx.add_component(e, particles.body).set(mass);
        ctx.add_component(e, particles.appearance);
        e
    }

    fn setup() -> (Context, ParticleComponents, VectorPool) {
        let mut ctx = Context::new();
        let particles = ParticleComponents::register(&mut ctx, &PoolConfig::default());
        (ctx, particles, VectorPool::new())
    }

    fn emitter() -> Rc<RefCell<Emitter>> {
        Rc::new(RefCell::new(Emitter::new(EmitterConfig::default(), 4, 1)))
    }

    #[test]
    fn test_gravity_then_accelerate() {
        let (mut ctx, particles, mut pool) = setup();
        let e = particle(&mut ctx, &particles, Vec2::zero(), Vec2::zero(), 2.0);

        let mut gravity = gravity_system(&mut ctx, particles, 9.8, &mut pool);
        let mut accel = accelerate_system(&mut ctx, particles, &mut pool);
        gravity.run(&mut ctx, 0.5);
        assert_eq!(ctx.get_component(e, particles.body).force, Vec2::new(0.0, -19.6));

        accel.run(&mut ctx, 0.5);
        assert!((ctx.get_component(e, particles.velocity).y + 4.9).abs() < 1e-12);
        assert_eq!(ctx.get_component(e, particles.body).force, Vec2::zero());
    }

    #[test]
    fn test_move() {
        let (mut ctx, particles, mut pool) = setup();
        let e = particle(&mut ctx, &particles, Vec2::new(1.0, 1.0), Vec2::new(2.0, -4.0), 1.0);

        let mut mover = move_system(&mut ctx, particles, &mut pool);
        mover.run(&mut ctx, 0.25);
        assert_eq!(*ctx.get_component(e, particles.position), Vec2::new(1.5, 0.0));
    }

    #[test]
    fn test_drag_opposes_motion() {
        let (mut ctx, particles, mut pool) = setup();
        let e = particle(&mut ctx, &particles, Vec2::zero(), Vec2::new(5.0, 0.0), 1.0);

        let model = DragModel::Quadratic { terminal_velocity: 10.0 };
        let mut drag = drag_system(&mut ctx, particles, model, Vec2::zero(), 9.8, &mut pool);
        drag.run(&mut ctx, 0.1);

        let force = ctx.get_component(e, particles.body).force;
        // k = 9.8 / 100, |F| = k * 25
        assert!((force.x + 0.098 * 25.0).abs() < 1e-12);
    }

    #[test]
    fn test_attraction_pulls_bodies_together() {
        let (mut ctx, particles, _) = setup();
        let a = particle(&mut ctx, &particles, Vec2::new(0.0, 0.0), Vec2::zero(), 1.0);
        let b = particle(&mut ctx, &particles, Vec2::new(4.0, 0.0), Vec2::zero(), 1.0);

        let mut attract = attraction_system(&mut ctx, particles, Attraction::default());
        attract.run(&mut ctx, 0.1);

        let fa = ctx.get_component(a, particles.body).force;
        let fb = ctx.get_component(b, particles.body).force;
        assert!((fa.x - 25.0).abs() < 1e-9);
        assert!((fb.x + 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_bounce_system() {
        let (mut ctx, particles, _) = setup();
        let e = particle(&mut ctx, &particles, Vec2::new(0.0, 1.0), Vec2::new(0.0, -1.0), 1.0);

        let mut bouncer = bounce_system(&mut ctx, particles, Circle::new(Vec2::zero(), 1.0), 1.0);
        bouncer.run(&mut ctx, 0.1);

        let v = ctx.get_component(e, particles.velocity);
        assert!((v.y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_trail_records_positions() {
        let (mut ctx, particles, mut pool) = setup();
        let e = particle(&mut ctx, &particles, Vec2::zero(), Vec2::new(1.0, 0.0), 1.0);
        ctx.get_component_mut(e, particles.appearance).trail.reset(2);

        let mut mover = move_system(&mut ctx, particles, &mut pool);
        let mut trail = trail_system(&mut ctx, particles);
        for _ in 0..3 {
            mover.run(&mut ctx, 1.0);
            trail.run(&mut ctx, 1.0);
        }

        let points: Vec<Vec2> = ctx
            .get_component(e, particles.appearance)
            .trail
            .iter()
            .copied()
            .collect();
        assert_eq!(points, vec![Vec2::new(2.0, 0.0), Vec2::new(3.0, 0.0)]);
    }

    #[test]
    fn test_below_floor_resets_in_place() {
        let (mut ctx, particles, _) = setup();
        let fallen = particle(&mut ctx, &particles, Vec2::new(0.0, -1.0), Vec2::new(0.0, -9.0), 1.0);
        let flying = particle(&mut ctx, &particles, Vec2::new(0.0, 3.0), Vec2::new(0.0, -9.0), 1.0);

        let mut recycle = lifecycle_system(&mut ctx, particles, LifecyclePolicy::BelowFloor { y: 0.0 }, emitter());
        recycle.run(&mut ctx, 0.1);

        assert!(ctx.is_alive(fallen));
        assert!(ctx.get_component(fallen, particles.position).y >= 0.0);
        assert!(ctx.get_component(fallen, particles.velocity).y > 0.0);
        assert_eq!(*ctx.get_component(flying, particles.position), Vec2::new(0.0, 3.0));
        assert_eq!(ctx.entity_count(), 2);
    }

    #[test]
    fn test_viewport_resets_escaped_particles() {
        let (mut ctx, particles, _) = setup();
        let escaped = particle(&mut ctx, &particles, Vec2::new(50.0, 5.0), Vec2::zero(), 1.0);

        let policy = LifecyclePolicy::Viewport {
            min: Vec2::new(-10.0, 0.0),
            max: Vec2::new(10.0, 20.0),
        };
        let mut recycle = lifecycle_system(&mut ctx, particles, policy, emitter());
        recycle.run(&mut ctx, 0.1);

        assert!(ctx.get_component(escaped, particles.position).x.abs() <= 10.0);
    }

    #[test]
    fn test_age_replaces_expired_particles() {
        let (mut ctx, particles, _) = setup();
        let shared = emitter();
        let old = shared.borrow_mut().spawn(&mut ctx, &particles, true);
        let young = shared.borrow_mut().spawn(&mut ctx, &particles, true);
        ctx.get_component_mut(old, particles.temporary).set(0.05);
        ctx.get_component_mut(young, particles.temporary).set(10.0);

        let mut recycle = lifecycle_system(&mut ctx, particles, LifecyclePolicy::Age, shared);
        recycle.run(&mut ctx, 0.1);

        assert!(!ctx.is_alive(old));
        assert!(ctx.is_alive(young));
        assert_eq!(ctx.entity_count(), 2);
        assert!((ctx.get_component(young, particles.temporary).age - 0.1).abs() < 1e-12);
    }
}
