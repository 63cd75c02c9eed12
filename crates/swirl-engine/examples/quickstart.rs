//! Swirl Quickstart: a rising smoke plume from scratch.
//!
//! Demonstrates:
//!   1. Building a domain: a closed box open at the top
//!   2. Creating a fluid at rest with a buoyancy factor
//!   3. Adding an inflow effect, gravity and an obstacle
//!   4. Building a WorldConfig and FluidWorld
//!   5. Stepping, reading metrics, and resetting
//!
//! Run with:
//!   cargo run --example quickstart

use std::sync::Arc;

use smallvec::smallvec;
use swirl_engine::{
    Environment, FieldEffect, Fluid, FluidWorld, Gravity, IncompressibleFlow, WorldConfig,
};
use swirl_propagators::{GridScheme, Obstacle};
use swirl_space::{Boundaries, Bounds, Domain, Geometry, Material};

// ─── Grid parameters ────────────────────────────────────────────

const SIZE: usize = 32;
const DT: f64 = 0.5;
const TICKS: u64 = 40;

// ─── Rendering ──────────────────────────────────────────────────

/// Print density as ASCII shades, top row first.
fn render(fluid: &Fluid) {
    const SHADES: &[u8] = b" .:-=+*#%@";
    let density = fluid.density();
    let peak = density.max_abs().max(1e-12);
    for y in (0..SIZE).rev().step_by(2) {
        let row: String = (0..SIZE)
            .map(|x| {
                let v = density.value_at(&[x as i64, y as i64], 0) / peak;
                let shade = (v.clamp(0.0, 1.0) * (SHADES.len() - 1) as f64).round() as usize;
                SHADES[shade] as char
            })
            .collect();
        println!("  |{row}|");
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. A square box with solid walls and an open top.
    let boundaries = Boundaries::uniform(2, Material::Closed)?.with_face(1, true, Material::Open)?;
    let domain = Domain::new(
        Bounds::from_size(&[SIZE as f64, SIZE as f64])?,
        smallvec![SIZE, SIZE],
        boundaries,
    )?;

    // 2. Fluid at rest; density drives buoyancy.
    let fluid = Fluid::builder(domain.clone()).buoyancy_factor(0.1).build()?;

    // 3. Smoke enters near the floor and rises around a cylinder.
    let inflow = FieldEffect::inflow(Geometry::sphere(smallvec![16.0, 4.0], 2.0), smallvec![0.2]);
    let environment = Environment::new(2)
        .with_gravity(Gravity::standard(2))
        .with_density_effect(Arc::new(inflow))
        .with_obstacle(Obstacle::new(Geometry::sphere(smallvec![16.0, 18.0], 3.0)));

    // 4. MacCormack advection keeps the plume sharp.
    let physics = IncompressibleFlow::builder()
        .grid_scheme(GridScheme::MacCormack {
            correction_strength: 1.0,
        })
        .build()?;
    let mut world = FluidWorld::new(WorldConfig {
        fluid,
        physics: Box::new(physics),
        environment,
        dt: DT,
        move_obstacles: false,
    })?;
    println!("{world:?}");

    // 5. Step and report.
    for _ in 0..TICKS {
        world.step_sync()?;
        let m = world.last_metrics();
        if world.current_tick().0 % 10 == 0 {
            println!(
                "tick {:>3}  t={:>5.1}  density={:>8.3}  cg={:>3}  max|div|={:.2e}  {}us",
                world.current_tick(),
                world.fluid().age(),
                m.density_total,
                m.solve_iterations,
                m.max_divergence,
                m.total_us,
            );
        }
    }
    render(world.fluid());

    // Start over from rest.
    world.reset(Fluid::builder(domain).buoyancy_factor(0.1).build()?)?;
    println!("reset to tick {}", world.current_tick());
    Ok(())
}
