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
//! Particle Fountain Example
//!
//! Launches particles upward from the origin into a circular obstacle and
//! prints a coarse ASCII frame once per simulated second. Rendering pulls
//! positions through `Simulation::each_renderable`; the stepper never draws.
//!
//! # Running
//!
//! ```bash
//! cargo run --example fountain --release
//!
//! # More particles, age-based teardown, pool logging
//! RUST_LOG=debug cargo run --example fountain --release -- --particles 2000 --policy age
//!
//! # Custom seed and duration
//! cargo run --example fountain --release -- --seed 7 --seconds 10
//! ```

use particle_ecs::config::{Attraction, LifecyclePolicy, SimulationConfig};
use particle_ecs::pool::PoolConfig;
use particle_ecs::vector::Vec2;
use particle_ecs::Simulation;
use std::time::Instant;

const WIDTH: usize = 64;
const HEIGHT: usize = 24;
const VIEW_MIN: Vec2 = Vec2::new(-8.0, 0.0);
const VIEW_MAX: Vec2 = Vec2::new(8.0, 12.0);

struct DemoOptions {
    particles: usize,
    seconds: f64,
    seed: u64,
    policy: LifecyclePolicy,
    attraction: bool,
}

impl Default for DemoOptions {
    fn default() -> Self {
        DemoOptions {
            particles: 500,
            seconds: 5.0,
            seed: 12345,
            policy: LifecyclePolicy::BelowFloor { y: 0.0 },
            attraction: false,
        }
    }
}

fn parse_args() -> DemoOptions {
    let args: Vec<String> = std::env::args().collect();
    let mut options = DemoOptions::default();

    let mut i = 1;
    while i < args.len() {
        let value = args.get(i + 1);
        match (args[i].as_str(), value) {
            ("--particles", Some(v)) => match v.parse() {
                Ok(n) => options.particles = n,
                Err(_) => eprintln!("Warning: invalid particle count '{v}', using {}", options.particles),
            },
            ("--seconds", Some(v)) => match v.parse() {
                Ok(s) => options.seconds = s,
                Err(_) => eprintln!("Warning: invalid duration '{v}', using {}", options.seconds),
            },
            ("--seed", Some(v)) => match v.parse() {
                Ok(s) => options.seed = s,
                Err(_) => eprintln!("Warning: invalid seed '{v}', using {}", options.seed),
            },
            ("--policy", Some(v)) => {
                options.policy = match v.as_str() {
                    "age" => LifecyclePolicy::Age,
                    "viewport" => LifecyclePolicy::Viewport {
                        min: VIEW_MIN,
                        max: VIEW_MAX,
                    },
                    "floor" => LifecyclePolicy::BelowFloor { y: 0.0 },
                    other => {
                        eprintln!("Warning: unknown policy '{other}', using floor");
                        LifecyclePolicy::BelowFloor { y: 0.0 }
                    }
                }
            }
            ("--attraction", _) => {
                options.attraction = true;
                i += 1;
                continue;
            }
            (flag, None) => {
                eprintln!("Error: {flag} requires an argument");
                std::process::exit(1);
            }
            (flag, Some(_)) => {
                eprintln!("Error: unknown option {flag}");
                std::process::exit(1);
            }
        }
        i += 2;
    }

    options
}

fn render(sim: &Simulation) -> String {
    let mut grid = vec![[b' '; WIDTH]; HEIGHT];
    sim.each_renderable(|_, p, _| {
        let u = (p.x - VIEW_MIN.x) / (VIEW_MAX.x - VIEW_MIN.x);
        let v = (p.y - VIEW_MIN.y) / (VIEW_MAX.y - VIEW_MIN.y);
        if (0.0..1.0).contains(&u) && (0.0..1.0).contains(&v) {
            let col = (u * WIDTH as f64) as usize;
            let row = HEIGHT - 1 - (v * HEIGHT as f64) as usize;
            grid[row][col] = match grid[row][col] {
                b' ' => b'.',
                b'.' => b'o',
                _ => b'@',
            };
        }
    });

    let mut frame = String::with_capacity((WIDTH + 1) * HEIGHT);
    for row in &grid {
        frame.extend(row.iter().map(|&c| c as char));
        frame.push('\n');
    }
    frame
}

fn main() {
    env_logger::init();

    let options = parse_args();
    let mut config = SimulationConfig::default()
        .with_seed(options.seed)
        .with_lifecycle(options.policy)
        .with_pool_config(PoolConfig::new(options.particles, options.particles * 2).with_logging());
    if options.attraction {
        config = config.with_attraction(Attraction::default());
    }

    let mut sim = match Simulation::new(config) {
        Ok(sim) => sim,
        Err(err) => {
            eprintln!("Error: {err}");
            std::process::exit(1);
        }
    };
    sim.spawn_particles(options.particles);

    println!("Particle fountain: {} particles, seed {}", options.particles, options.seed);
    println!("Systems: {}", sim.system_names().join(" -> "));
    println!();

    let dt = 1.0 / 60.0;
    let steps = (options.seconds / dt).round() as usize;
    let started = Instant::now();

    for step in 1..=steps {
        sim.step(dt);
        if step % 60 == 0 {
            println!(
                "t = {:.1} s, population = {}, kinetic energy = {:.1} J",
                sim.elapsed(),
                sim.population(),
                sim.kinetic_energy()
            );
            print!("{}", render(&sim));
        }
    }

    let wall = started.elapsed();
    let stats = sim.context().record_pool_stats();
    println!();
    println!(
        "{} steps in {:.2?} ({:.1} µs/step)",
        steps,
        wall,
        wall.as_secs_f64() * 1e6 / steps.max(1) as f64
    );
    println!(
        "entity record pool: {} hits, {} misses, hit rate {:.1}%",
        stats.hits,
        stats.misses,
        stats.hit_rate()
    );
}
