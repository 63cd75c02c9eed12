//! Behavioural properties of advection and projection on whole domains.

use proptest::prelude::*;
use smallvec::smallvec;
use swirl_core::SolveError;
use swirl_propagators::{
    advect, mac_cormack, make_incompressible, points, runge_kutta_4, semi_lagrangian, Obstacle,
    SolveConfig,
};
use swirl_space::ops::divergence;
use swirl_space::{ConstantField, Extrapolation, Field, Geometry, Material, PointCloud, StaggeredGrid};
use swirl_test_utils::{
    assert_close, assert_slices_close, assert_staggered_close, open_top_box, random_density,
    random_velocity, square_domain, CountingField,
};

fn cloud(points: Vec<[f64; 2]>) -> PointCloud {
    let n = points.len();
    PointCloud::new(
        points.into_iter().map(|p| smallvec![p[0], p[1]]).collect(),
        vec![smallvec![1.0]; n],
        Extrapolation::ZERO,
    )
    .unwrap()
}

// ── Advection ───────────────────────────────────────────────────

#[test]
fn constant_fields_survive_any_velocity() {
    let d = square_domain(6, Material::Closed);
    let c: Field = ConstantField::new(smallvec![0.25, -3.0]).into();
    let v: Field = random_velocity(&d, 5.0, 11).into();
    assert_eq!(advect(&c, &v, 0.9).unwrap(), c);
}

#[test]
fn zero_velocity_leaves_grids_unchanged() {
    let d = square_domain(6, Material::Open);
    let rho = random_density(&d, 1);
    let v = d.zero_velocity();
    let sl = semi_lagrangian(&rho, &v, 1.0).unwrap();
    let mc = mac_cormack(&rho, &v, 1.0, 1.0).unwrap();
    assert_slices_close(sl.values(), rho.values(), 1e-12);
    assert_slices_close(mc.values(), rho.values(), 1e-12);

    let u = random_velocity(&d, 1.0, 2);
    assert_staggered_close(&semi_lagrangian(&u, &v, 1.0).unwrap(), &u, 1e-12);
}

#[test]
fn far_departure_points_take_the_boundary_value() {
    let n = 6;
    let d = square_domain(n, Material::Closed);
    let rho = random_density(&d, 21);
    let leftward = d.staggered_grid(|axis, _| if axis == 0 { -1.0 } else { 0.0 }).unwrap();
    let blown_up = d
        .staggered_grid(|axis, _| if axis == 0 { f64::NEG_INFINITY } else { 0.0 })
        .unwrap();
    for (v, dt) in [(&leftward, 1e300), (&blown_up, 0.1)] {
        let sl = semi_lagrangian(&rho, v, dt).unwrap();
        let mc = mac_cormack(&rho, v, dt, 1.0).unwrap();
        for x in 0..n as i64 {
            for y in 0..n as i64 {
                let edge = rho.value_at(&[n as i64 - 1, y], 0);
                assert_eq!(sl.value_at(&[x, y], 0), edge);
                assert_eq!(mc.value_at(&[x, y], 0), edge);
            }
        }
    }
}

#[test]
fn rk4_samples_velocity_four_times_per_point() {
    let c = cloud(vec![[1.0, 1.0], [2.0, 3.0], [0.5, 0.5]]);
    let v = CountingField::new(ConstantField::new(smallvec![1.0, 0.0]));
    runge_kutta_4(&c, &v, 0.1).unwrap();
    assert_eq!(v.samples(), 12);
}

#[test]
fn point_cloud_follows_grid_velocity() {
    let d = square_domain(8, Material::Open);
    let v = d.staggered_grid(|axis, _| if axis == 0 { 0.5 } else { -0.25 }).unwrap();
    let c = cloud(vec![[2.0, 2.0], [4.5, 6.0]]);
    let moved = advect(&c.into(), &v.into(), 2.0).unwrap();
    let moved = moved.as_point_cloud().unwrap();
    assert_slices_close(&moved.points()[0], &[3.0, 1.5], 1e-12);
    assert_slices_close(&moved.points()[1], &[5.5, 5.5], 1e-12);
}

proptest! {
    #[test]
    fn mac_cormack_without_correction_is_semi_lagrangian(
        seed in 0u64..500,
        dt in 0.0f64..2.0,
    ) {
        let d = square_domain(6, Material::Closed);
        let rho = random_density(&d, seed);
        let v = random_velocity(&d, 1.5, seed + 1);
        let sl = semi_lagrangian(&rho, &v, dt).unwrap();
        let mc = mac_cormack(&rho, &v, dt, 0.0).unwrap();
        for (a, b) in sl.values().iter().zip(mc.values()) {
            prop_assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn mac_cormack_never_leaves_input_range(seed in 0u64..500, s in 0.0f64..=1.0) {
        let d = square_domain(6, Material::Periodic);
        let rho = random_density(&d, seed).with_extrapolation(Extrapolation::Periodic);
        let v = random_velocity(&d, 2.0, seed + 7);
        let out = mac_cormack(&rho, &v, 0.5, s).unwrap();
        let lo = rho.values().iter().cloned().fold(f64::INFINITY, f64::min);
        let hi = rho.values().iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        prop_assert!(out.values().iter().all(|x| *x >= lo - 1e-12 && *x <= hi + 1e-12));
    }

    #[test]
    fn euler_points_are_linear(
        x in -10.0f64..10.0,
        y in -10.0f64..10.0,
        vx in -3.0f64..3.0,
        vy in -3.0f64..3.0,
        dt in 0.0f64..4.0,
    ) {
        let c = cloud(vec![[x, y]]);
        let v = PointCloud::new(c.points().to_vec(), vec![smallvec![vx, vy]], Extrapolation::ZERO).unwrap();
        let moved = points(&c, &v, dt).unwrap();
        prop_assert!((moved.points()[0][0] - (x + dt * vx)).abs() < 1e-12);
        prop_assert!((moved.points()[0][1] - (y + dt * vy)).abs() < 1e-12);
        prop_assert_eq!(moved.values(), c.values());
    }

    #[test]
    fn rk4_equals_euler_for_uniform_velocity(
        x in -10.0f64..10.0,
        y in -10.0f64..10.0,
        vx in -3.0f64..3.0,
        vy in -3.0f64..3.0,
        dt in 0.0f64..4.0,
    ) {
        let c = cloud(vec![[x, y]]);
        let uniform = ConstantField::new(smallvec![vx, vy]);
        let rk = runge_kutta_4(&c, &uniform, dt).unwrap();
        let v = PointCloud::new(c.points().to_vec(), vec![smallvec![vx, vy]], Extrapolation::ZERO).unwrap();
        let euler = points(&c, &v, dt).unwrap();
        prop_assert!((rk.points()[0][0] - euler.points()[0][0]).abs() < 1e-9);
        prop_assert!((rk.points()[0][1] - euler.points()[0][1]).abs() < 1e-9);
    }
}

// ── Projection ──────────────────────────────────────────────────

#[test]
fn open_domain_divergence_reduces_to_input_mean() {
    let d = square_domain(8, Material::Open);
    let v = random_velocity(&d, 1.0, 42);
    let config = SolveConfig {
        relative_tolerance: 1e-9,
        ..SolveConfig::default()
    };
    let projection = make_incompressible(&v, &d, &[], &config).unwrap();
    let input_mean = divergence(&v).unwrap().mean()[0];
    let after = divergence(&projection.velocity).unwrap();
    for value in after.values() {
        assert_close(*value, input_mean, 1e-6);
    }
    assert!(projection.divergence.mean()[0].abs() < 1e-12);
}

#[test]
fn solid_walls_project_to_zero_divergence() {
    let d = square_domain(10, Material::Closed);
    let v = random_velocity(&d, 1.0, 5);
    let projection = make_incompressible(&v, &d, &[], &SolveConfig::default()).unwrap();
    assert!(divergence(&projection.velocity).unwrap().max_abs() < 1e-3);
    // Wall faces stay closed.
    let vx = &projection.velocity;
    for (i, p) in vx.face_points(0).iter().enumerate() {
        if p[0] == 0.0 || p[0] == 10.0 {
            assert_eq!(vx.component(0)[i], 0.0);
        }
    }
}

#[test]
fn open_top_projection_converges() {
    let d = open_top_box(8);
    let v = random_velocity(&d, 1.0, 9);
    let projection = make_incompressible(&v, &d, &[], &SolveConfig::default()).unwrap();
    assert!(projection.iterations > 0);
    assert!(projection.pressure.values().iter().all(|p| p.is_finite()));
}

#[test]
fn stationary_obstacle_blocks_flow_through_it() {
    let d = square_domain(8, Material::Closed);
    let block = Obstacle::new(Geometry::cuboid(smallvec![3.0, 3.0], smallvec![5.0, 5.0]));
    let v = random_velocity(&d, 1.0, 21);
    let projection = make_incompressible(&v, &d, &[block], &SolveConfig::default()).unwrap();
    for (d_axis, faces) in (0..2).map(|a| (a, projection.velocity.face_points(a))) {
        for (i, p) in faces.iter().enumerate() {
            let touches = p.iter().all(|c| (3.0..=5.0).contains(c));
            if touches {
                assert_eq!(projection.velocity.component(d_axis)[i], 0.0, "face {p:?}");
            }
        }
    }
}

#[test]
fn covering_stationary_obstacle_zeroes_velocity() {
    let d = square_domain(6, Material::Open);
    let everything = Obstacle::new(Geometry::cuboid(smallvec![-1.0, -1.0], smallvec![7.0, 7.0]));
    let v = random_velocity(&d, 2.0, 3);
    let projection = make_incompressible(&v, &d, &[everything], &SolveConfig::default()).unwrap();
    assert_eq!(projection.velocity.max_abs(), 0.0);
}

#[test]
fn zero_iteration_budget_fails_reporting_zero() {
    let d = square_domain(6, Material::Closed);
    let v = random_velocity(&d, 1.0, 8);
    let config = SolveConfig {
        max_iterations: 0,
        ..SolveConfig::default()
    };
    let err = make_incompressible(&v, &d, &[], &config).unwrap_err();
    assert!(matches!(err, SolveError::NotConverged { iterations: 0, .. }));
    assert!(err.to_string().starts_with("pressure solve did not converge after 0 iterations"));
}

#[test]
fn moving_obstacle_drags_fluid_along() {
    let d = square_domain(12, Material::Open);
    let piston = Obstacle::new(Geometry::cuboid(smallvec![4.0, 4.0], smallvec![8.0, 8.0]))
        .with_velocity(smallvec![1.0, 0.0]);
    let projection =
        make_incompressible(&d.zero_velocity(), &d, &[piston], &SolveConfig::default()).unwrap();
    let total_x: f64 = projection.velocity.component(0).iter().sum();
    assert!(total_x > 0.0);
}

#[test]
fn mismatched_velocity_grid_is_rejected() {
    let d = square_domain(6, Material::Closed);
    let other = square_domain(4, Material::Closed);
    let v: StaggeredGrid = other.zero_velocity();
    assert!(matches!(
        make_incompressible(&v, &d, &[], &SolveConfig::default()),
        Err(SolveError::Field(_))
    ));
}
