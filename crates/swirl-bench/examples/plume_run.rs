//! Run the reference plume profile and print per-tick metrics.
//!
//! Run with:
//!   cargo run --release -p swirl-bench --example plume_run

use swirl_bench::reference_profile;
use swirl_engine::FluidWorld;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut world = FluidWorld::new(reference_profile()?)?;
    let mut total_us = 0u64;
    for _ in 0..100 {
        world.step_sync()?;
        let m = world.last_metrics();
        total_us += m.total_us;
        println!(
            "tick={} cg={} max_div={:.3e} density={:.3} us={}",
            world.current_tick(),
            m.solve_iterations,
            m.max_divergence,
            m.density_total,
            m.total_us
        );
    }
    println!("mean tick: {} us", total_us / world.current_tick().0.max(1));
    Ok(())
}
