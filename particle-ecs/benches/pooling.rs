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
//! Benchmarks for memory pooling performance
//!
//! Measures entity and component churn with pooled versus fresh allocation.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use particle_ecs::ecs::{ComponentType, Context};
use particle_ecs::pool::{Allocator, DefaultAllocator, PoolAllocator, PoolConfig};
use particle_ecs::vector::Vec2;

fn churn(ctx: &mut Context, position: ComponentType<Vec2>, velocity: ComponentType<Vec2>, n: usize) {
    let entities: Vec<_> = (0..n)
        .map(|i| {
            let e = ctx.create_entity();
            ctx.add_component(e, position).set(i as f64, 0.0);
            ctx.add_component(e, velocity).set(1.0, 0.0);
            e
        })
        .collect();
    for e in entities {
        ctx.destroy_entity(e);
    }
}

fn pooled_context() -> (Context, ComponentType<Vec2>, ComponentType<Vec2>) {
    let mut ctx = Context::new();
    let position = ctx.register_component("Position", PoolAllocator::new());
    let velocity = ctx.register_component("Velocity", PoolAllocator::new());
    ctx.create_group(&[position.id(), velocity.id()]);
    (ctx, position, velocity)
}

fn fresh_context() -> (Context, ComponentType<Vec2>, ComponentType<Vec2>) {
    let mut ctx = Context::new();
    let position = ctx.register_component("Position", DefaultAllocator::new());
    let velocity = ctx.register_component("Velocity", DefaultAllocator::new());
    ctx.create_group(&[position.id(), velocity.id()]);
    (ctx, position, velocity)
}

fn bench_entity_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("entity_churn");

    for n_entities in [100, 1000].iter() {
        group.bench_with_input(BenchmarkId::new("pooled", n_entities), n_entities, |b, &n| {
            let (mut ctx, position, velocity) = pooled_context();
            b.iter(|| churn(black_box(&mut ctx), position, velocity, n));
        });

        group.bench_with_input(BenchmarkId::new("fresh", n_entities), n_entities, |b, &n| {
            let (mut ctx, position, velocity) = fresh_context();
            b.iter(|| churn(black_box(&mut ctx), position, velocity, n));
        });
    }

    group.finish();
}

fn bench_pool_capacity(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool_capacity");

    for max_pool_size in [16, 1 << 16].iter() {
        group.bench_with_input(
            BenchmarkId::new("vector_pool", max_pool_size),
            max_pool_size,
            |b, &max| {
                let mut pool = PoolAllocator::<Vec2>::with_config(PoolConfig::new(256, max));
                let owner = Context::new().create_entity();
                b.iter(|| {
                    let scratch: Vec<Vec2> = (0..256).map(|_| pool.allocate(owner)).collect();
                    for v in scratch {
                        pool.release(owner, black_box(v));
                    }
                });
            },
        );
    }

    group.finish();
}

fn bench_pool_stats_overhead(c: &mut Criterion) {
    let (mut ctx, position, velocity) = pooled_context();

    c.bench_function("churn_with_stats_check", |b| {
        b.iter(|| {
            churn(&mut ctx, position, velocity, 100);
            black_box(ctx.record_pool_stats());
        });
    });
}

criterion_group!(
    benches,
    bench_entity_churn,
    bench_pool_capacity,
    bench_pool_stats_overhead,
);
criterion_main!(benches);
