//! Single-trajectory and convergence-sweep orchestration.
//!
//! This module owns no I/O: it builds `Equation`/`Integrator` instances
//! from configuration records, runs them, and returns structured reports.
//! Writing a report to a file or stdout is the caller's job (see the crate
//! root and the workspace's `demos/` binary).

use ballistics_core::{IntegrationError, IntegrationSession, Vec3};
use ballistics_models::{Equation, EquationConfig, LandType};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::fmt;

use crate::config::{ConvergenceConfig, MethodConfig};
use crate::error::BallisticsError;
use crate::integrator::Integrator;
use crate::method::bisection_landing_time;

/// The analytical `(r, v)` to compare a numeric run against: the closed form
/// at the final time for `FinalTime` landing, or at the bisection-located
/// analytical impact time for every geometric landing type, matching the
/// reference implementation's `land_type`-dependent comparison instant
/// rather than always reusing the numeric run's elapsed time.
fn analytical_reference(eq: &Equation, t: f64) -> (Vec3, Vec3) {
    match eq.land_type {
        LandType::FinalTime(_) => eq.closed_form(t),
        LandType::Linear | LandType::Quadratic | LandType::Cubic => {
            eq.closed_form(bisection_landing_time(eq))
        }
    }
}

/// Which integrator family a driver call should build.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntegratorKind {
    RungeKutta,
    MultiStep,
}

fn build_integrator(kind: IntegratorKind, method_cfg: MethodConfig) -> Result<Integrator, BallisticsError> {
    Ok(match kind {
        IntegratorKind::RungeKutta => Integrator::runge_kutta(method_cfg)?,
        IntegratorKind::MultiStep => Integrator::multi_step(method_cfg)?,
    })
}

/// Evaluates the acceleration at the initial state and seeds the session's
/// working and backup registers with it, so the very first step (or the
/// landing detector, if it fires immediately) sees a consistent triple.
fn seed_initial_acceleration(eq: &Equation, session: &mut IntegrationSession) {
    let a0 = eq.acceleration(eq.v0, 0.0, session);
    session.a = a0;
    session.a_back = a0;
}

/// The outcome of one single-trajectory run: the numerical final state, the
/// closed-form reference at the same elapsed time, and the evaluation cost.
#[derive(Clone, Copy, Debug)]
pub struct TrajectoryReport {
    pub t: f64,
    pub r_numeric: Vec3,
    pub v_numeric: Vec3,
    pub r_analytical: Vec3,
    pub v_analytical: Vec3,
    pub nevaluations: u64,
}

impl fmt::Display for TrajectoryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "t = {:+.18e}", self.t)?;
        writeln!(
            f,
            "numeric    r = ({:+.18e}, {:+.18e}, {:+.18e})  v = ({:+.18e}, {:+.18e}, {:+.18e})",
            self.r_numeric.x, self.r_numeric.y, self.r_numeric.z,
            self.v_numeric.x, self.v_numeric.y, self.v_numeric.z,
        )?;
        writeln!(
            f,
            "analytical r = ({:+.18e}, {:+.18e}, {:+.18e})  v = ({:+.18e}, {:+.18e}, {:+.18e})",
            self.r_analytical.x, self.r_analytical.y, self.r_analytical.z,
            self.v_analytical.x, self.v_analytical.y, self.v_analytical.z,
        )?;
        write!(f, "evaluations = {}", self.nevaluations)
    }
}

/// Builds the `Equation` and `Integrator` named by `equation_cfg`/
/// `method_cfg`/`kind`, integrates one trajectory to completion, and
/// compares the result against the equation's closed-form solution.
#[tracing::instrument(skip(equation_cfg, method_cfg), fields(kind = ?kind))]
pub fn run_trajectory(
    equation_cfg: EquationConfig,
    method_cfg: MethodConfig,
    kind: IntegratorKind,
) -> Result<TrajectoryReport, BallisticsError> {
    let eq = Equation::try_from(equation_cfg)?;
    let mut integrator = build_integrator(kind, method_cfg)?;
    let mut session = IntegrationSession::new(eq.r0, eq.v0, Vec3::ZERO, false);
    seed_initial_acceleration(&eq, &mut session);

    let t = integrator.run(&eq, &mut session)?;
    let (r_analytical, v_analytical) = analytical_reference(&eq, t);
    Ok(TrajectoryReport {
        t,
        r_numeric: session.r,
        v_numeric: session.v,
        r_analytical,
        v_analytical,
        nevaluations: session.nevaluations,
    })
}

/// One row of a convergence sweep: the evaluation cost and position/
/// velocity error norms averaged over the iteration's trajectory batch, at
/// the scale parameter (`dt` or `kt`) and error tolerance in force for that
/// iteration.
#[derive(Clone, Copy, Debug)]
pub struct ConvergenceRow {
    pub nevaluations: u64,
    pub linf_position_error: f64,
    pub l2_position_error: f64,
    pub linf_velocity_error: f64,
    pub l2_velocity_error: f64,
    pub scale: f64,
    pub error_time: f64,
}

impl fmt::Display for ConvergenceRow {
    /// The normative convergence-mode output line: `nevaluations Linf(r)
    /// L2(r) Linf(v) L2(v) scale error_time`, floats at 19 significant
    /// decimal digits.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:+.18e} {:+.18e} {:+.18e} {:+.18e} {:+.18e} {:+.18e}",
            self.nevaluations,
            self.linf_position_error,
            self.l2_position_error,
            self.linf_velocity_error,
            self.l2_velocity_error,
            self.scale,
            self.error_time,
        )
    }
}

fn current_scale(cfg: &EquationConfig) -> f64 {
    if cfg.size_type == 0 { cfg.dt } else { cfg.kt }
}

/// Runs a convergence sweep: `convergence_cfg.convergence` iterations, each
/// averaging position/velocity error over `convergence_cfg.trajectories`
/// randomly-parameterised trajectories, with the scale parameter (`dt`/`kt`)
/// and `error_time` shrinking by `convergence_cfg.factor` each iteration.
///
/// The RNG is reseeded to `convergence_cfg.seed` at the start of every
/// iteration, so the same trajectory corpus is re-integrated at each point
/// of the sweep. A trajectory that raises [`IntegrationError::NonFinite`]
/// (only reachable with the session's NaN guard enabled, which this driver
/// always enables) is tallied and logged but does not abort the sweep;
/// any other error aborts it, since that indicates the configuration
/// itself, not one unlucky random draw, is broken.
#[tracing::instrument(skip(equation_cfg, method_cfg), fields(kind = ?kind))]
pub fn run_convergence(
    mut equation_cfg: EquationConfig,
    mut method_cfg: MethodConfig,
    kind: IntegratorKind,
    convergence_cfg: ConvergenceConfig,
) -> Result<Vec<ConvergenceRow>, BallisticsError> {
    convergence_cfg.validate()?;
    let mut rows = Vec::with_capacity(convergence_cfg.convergence as usize);

    for iteration in 0..convergence_cfg.convergence {
        let mut rng = ChaCha8Rng::seed_from_u64(convergence_cfg.seed);

        let mut nevaluations = 0u64;
        let mut linf_pos = 0.0f64;
        let mut linf_vel = 0.0f64;
        let mut sum_sq_pos = 0.0f64;
        let mut sum_sq_vel = 0.0f64;
        let mut nan_rows = 0u32;

        for _ in 0..convergence_cfg.trajectories {
            let mut eq = Equation::try_from(equation_cfg)?;
            eq.init_random(&mut rng);

            let mut integrator = build_integrator(kind, method_cfg)?;
            let mut session = IntegrationSession::new(eq.r0, eq.v0, Vec3::ZERO, true);
            seed_initial_acceleration(&eq, &mut session);

            match integrator.run(&eq, &mut session) {
                Ok(t) => {
                    let (r_ana, v_ana) = analytical_reference(&eq, t);
                    let dr = session.r - r_ana;
                    let dv = session.v - v_ana;
                    linf_pos = linf_pos.max(dr.norm());
                    linf_vel = linf_vel.max(dv.norm());
                    sum_sq_pos += dr.dot(dr);
                    sum_sq_vel += dv.dot(dv);
                    nevaluations += session.nevaluations;
                }
                Err(IntegrationError::NonFinite(_)) => {
                    nan_rows += 1;
                }
                Err(other) => return Err(BallisticsError::from(other)),
            }
        }

        if nan_rows > 0 {
            tracing::warn!(iteration, nan_rows, "convergence iteration had non-finite trajectories");
        }

        let n = f64::from(convergence_cfg.trajectories);
        rows.push(if nan_rows == convergence_cfg.trajectories {
            ConvergenceRow {
                nevaluations: 0,
                linf_position_error: f64::NAN,
                l2_position_error: f64::NAN,
                linf_velocity_error: f64::NAN,
                l2_velocity_error: f64::NAN,
                scale: current_scale(&equation_cfg),
                error_time: method_cfg.error_time,
            }
        } else {
            ConvergenceRow {
                nevaluations,
                linf_position_error: linf_pos,
                l2_position_error: (sum_sq_pos / n).sqrt(),
                linf_velocity_error: linf_vel,
                l2_velocity_error: (sum_sq_vel / n).sqrt(),
                scale: current_scale(&equation_cfg),
                error_time: method_cfg.error_time,
            }
        });

        equation_cfg.dt *= convergence_cfg.factor;
        equation_cfg.kt *= convergence_cfg.factor;
        method_cfg.error_time *= convergence_cfg.factor;
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RollbackPolicy;

    fn fixed_step_method(order: u8) -> MethodConfig {
        MethodConfig { order, error_dt: false, alpha: 2.0, beta: 0.5, error_time: 0.0, rollback: RollbackPolicy::None }
    }

    #[test]
    fn single_trajectory_free_fall_matches_closed_form() {
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
        let report = run_trajectory(cfg, fixed_step_method(4), IntegratorKind::RungeKutta).unwrap();
        assert!((report.r_numeric.z - report.r_analytical.z).abs() < 1e-6);
    }

    #[test]
    fn convergence_sweep_shrinks_scale_each_iteration() {
        let eq_cfg = EquationConfig {
            r#type: 1,
            random_init: true,
            z: 500.0,
            vmin: 40.0,
            vmax: 60.0,
            vertical_angle: 30.0,
            wmax: 5.0,
            lambda_min: 0.15,
            lambda_max: 0.25,
            size_type: 0,
            dt: 0.1,
            land: 0,
            t: 5.0,
            g: Some(9.81),
            ..Default::default()
        };
        let convergence_cfg = ConvergenceConfig { trajectories: 4, convergence: 3, factor: 0.5, seed: 42 };
        let rows = run_convergence(eq_cfg, fixed_step_method(2), IntegratorKind::RungeKutta, convergence_cfg).unwrap();
        assert_eq!(rows.len(), 3);
        assert!((rows[1].scale - rows[0].scale * 0.5).abs() < 1e-12);
        assert!((rows[2].scale - rows[1].scale * 0.5).abs() < 1e-12);
    }

    #[test]
    fn convergence_sweep_reseeds_rng_so_repeated_seed_reproduces_errors() {
        let eq_cfg = EquationConfig {
            r#type: 0,
            random_init: true,
            z: 200.0,
            vmin: 20.0,
            vmax: 40.0,
            vertical_angle: 45.0,
            wmax: 0.0,
            size_type: 0,
            dt: 0.05,
            land: 1,
            t: 0.0,
            g: Some(9.81),
            ..Default::default()
        };
        let convergence_cfg = ConvergenceConfig { trajectories: 3, convergence: 1, factor: 0.5, seed: 7 };
        let rows_a = run_convergence(eq_cfg, fixed_step_method(2), IntegratorKind::RungeKutta, convergence_cfg).unwrap();
        let rows_b = run_convergence(eq_cfg, fixed_step_method(2), IntegratorKind::RungeKutta, convergence_cfg).unwrap();
        assert_eq!(rows_a[0].nevaluations, rows_b[0].nevaluations);
        assert_eq!(rows_a[0].l2_position_error, rows_b[0].l2_position_error);
    }
}
