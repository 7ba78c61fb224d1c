//! End-to-end scenarios exercising the full equation/method/driver stack
//! together, as opposed to the unit tests living next to each module.

use approx::assert_relative_eq;
use ballistics_core::{IntegrationSession, Vec3};
use ballistics_models::{Equation, EquationConfig, LandType};
use ballistics_solve::config::RollbackPolicy;
use ballistics_solve::{run_trajectory, Integrator, IntegratorKind, MethodConfig};

fn fixed_step(order: u8) -> MethodConfig {
    MethodConfig { order, error_dt: false, alpha: 2.0, beta: 0.5, error_time: 0.0, rollback: RollbackPolicy::None }
}

#[test]
fn free_fall_drop_matches_closed_form_within_rk4_tolerance() {
    let cfg = EquationConfig {
        r#type: 0,
        z: 100.0,
        size_type: 0,
        dt: 0.01,
        land: 0,
        t: (200.0f64 / 9.81).sqrt(),
        g: Some(9.81),
        ..Default::default()
    };
    let report = run_trajectory(cfg, fixed_step(4), IntegratorKind::RungeKutta).unwrap();
    assert_relative_eq!(report.r_numeric.z, 0.0, epsilon = 1e-6);
    assert_relative_eq!(report.v_numeric.z, -(2.0 * 9.81 * 100.0f64).sqrt(), epsilon = 1e-6);
}

#[test]
fn vacuum_parabola_lands_within_range_tolerance() {
    let cfg = EquationConfig {
        r#type: 0,
        z: 0.0,
        vx: 30.0,
        vz: 30.0,
        land: 1,
        size_type: 0,
        dt: 0.02,
        g: Some(9.81),
        ..Default::default()
    };
    let report = run_trajectory(cfg, fixed_step(2), IntegratorKind::RungeKutta).unwrap();
    let expected_range = 30.0 * 2.0 * 30.0 / 9.81;
    assert_relative_eq!(report.r_numeric.x, expected_range, epsilon = 0.01);
    assert_relative_eq!(report.t, 6.1162, epsilon = 1e-2);
}

#[test]
fn linear_drag_reaches_terminal_velocity() {
    let cfg = EquationConfig {
        r#type: 1,
        z: 1000.0,
        wx: 10.0,
        lambda: 0.1,
        land: 0,
        size_type: 0,
        dt: 0.05,
        t: 100.0,
        g: Some(9.81),
        ..Default::default()
    };
    let report = run_trajectory(cfg, fixed_step(3), IntegratorKind::RungeKutta).unwrap();
    let expected = 10.0 * (1.0 - (-10.0f64).exp());
    assert_relative_eq!(report.v_numeric.x, expected, epsilon = 1e-5);
}

#[test]
fn quadratic_drag_apex_matches_closed_form() {
    let t_c = (50.0f64 * (0.002f64 / 9.81).sqrt()).atan() / (0.002f64 * 9.81).sqrt();
    let cfg = EquationConfig {
        r#type: 2,
        z: 0.0,
        vz: 50.0,
        lambda: 0.002,
        land: 0,
        size_type: 0,
        dt: 0.01,
        t: t_c,
        g: Some(9.81),
        ..Default::default()
    };
    let eq = Equation::try_from(cfg).unwrap();
    let mut rk = ballistics_solve::RungeKutta::new(fixed_step(4)).unwrap();
    let mut session = IntegrationSession::new(eq.r0, eq.v0, Vec3::new(0.0, 0.0, -eq.g), false);
    rk.run(&eq, &mut session).unwrap();
    let (r_ana, _) = eq.closed_form(t_c);
    assert_relative_eq!(session.r.z, r_ana.z, epsilon = 1e-4);
}

#[test]
fn forced_trajectory_rk4_and_multistep_agree_on_impact() {
    let cfg = EquationConfig {
        r#type: 3,
        z: 0.0,
        vz: 100.0,
        wx: 20.0,
        lambda: 0.5,
        land: 3,
        size_type: 0,
        dt: 0.005,
        g: Some(9.81),
        ..Default::default()
    };
    assert_eq!(Equation::try_from(cfg).unwrap().land_type, LandType::Cubic);

    let rk_report = run_trajectory(cfg, fixed_step(4), IntegratorKind::RungeKutta).unwrap();
    let ms_report = run_trajectory(cfg, fixed_step(3), IntegratorKind::MultiStep).unwrap();

    assert_relative_eq!(rk_report.t, ms_report.t, epsilon = 1e-4);
    assert_relative_eq!(rk_report.r_numeric.x, ms_report.r_numeric.x, epsilon = 1e-3);
}

#[test]
fn rk_order_convergence_halves_error_at_expected_rate() {
    let base_cfg = EquationConfig {
        r#type: 1,
        z: 2000.0,
        vx: 10.0,
        vz: 5.0,
        lambda: 0.2,
        land: 0,
        size_type: 0,
        t: 5.0,
        g: Some(9.81),
        ..Default::default()
    };

    let mut dt = 0.08;
    let mut prev_err: Option<f64> = None;
    let mut ratios = Vec::new();
    for _ in 0..5 {
        let mut cfg = base_cfg;
        cfg.dt = dt;
        let eq = Equation::try_from(cfg).unwrap();
        let mut rk = Integrator::runge_kutta(fixed_step(2)).unwrap();
        let mut session = IntegrationSession::new(eq.r0, eq.v0, Vec3::new(0.0, 0.0, -eq.g), false);
        let t = rk.run(&eq, &mut session).unwrap();
        let (r_ana, _) = eq.closed_form(t);
        let err = (session.r - r_ana).norm();
        if let Some(p) = prev_err {
            ratios.push(err / p);
        }
        prev_err = Some(err);
        dt *= 0.5;
    }
    let expected = 0.25; // 2^-2 for an order-2 method
    assert!(ratios.iter().skip(1).all(|r| (r - expected).abs() / expected < 0.2));
}
