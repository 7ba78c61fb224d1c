//! The explicit Runge-Kutta integrator: single-step evaluation, embedded
//! error estimation, and the driving integration loop.

use ballistics_core::{IntegrationError, IntegrationSession, Vec3};
use ballistics_models::Equation;

use crate::config::{MethodConfig, MethodConfigError, RollbackPolicy};
use crate::method::Method;
use crate::tables::{rk_table, RungeKuttaTable};

/// A Runge-Kutta integrator of order 1 through 4, parameterised by the
/// coefficient table for `config.order`.
pub struct RungeKutta {
    table: &'static RungeKuttaTable,
    method: Method,
}

impl RungeKutta {
    pub fn new(config: MethodConfig) -> Result<Self, MethodConfigError> {
        let table = rk_table(config.order).ok_or(MethodConfigError::UnknownRungeKuttaOrder(config.order))?;
        if config.error_dt && table.e.is_none() {
            return Err(MethodConfigError::NoEmbeddedErrorAtOrderFour);
        }
        let method = Method::new(config, table.stages + 1)?;
        Ok(Self { table, method })
    }

    #[must_use]
    pub fn order(&self) -> u8 {
        self.table.order
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Advances `session` by one step of size `dt` starting at time `t_old`.
    pub fn step(&mut self, eq: &Equation, session: &mut IntegrationSession, t_old: f64, dt: f64) {
        self.method.r0[0] = session.r;
        self.method.r1[0] = session.v;
        self.method.r2[0] = session.a;

        for i in 1..=self.table.stages {
            let row = self.table.b[i - 1];
            let mut sum_r = Vec3::ZERO;
            let mut sum_v = Vec3::ZERO;
            for (j, &weight) in row.iter().enumerate() {
                sum_r += self.method.r1[j] * weight;
                sum_v += self.method.r2[j] * weight;
            }
            let r_i = session.r + sum_r * dt;
            let v_i = session.v + sum_v * dt;
            let t_i = t_old + self.table.t[i - 1] * dt;
            let a_i = eq.acceleration(v_i, t_i, session);

            self.method.r0[i] = r_i;
            self.method.r1[i] = v_i;
            self.method.r2[i] = a_i;
        }

        session.r = self.method.r0[self.table.stages];
        session.v = self.method.r1[self.table.stages];
        session.a = self.method.r2[self.table.stages];
    }

    /// Computes and accumulates this step's embedded error estimate.
    ///
    /// Panics if called on an order-4 table (checked for at construction
    /// time whenever `error_dt` is set, so this is unreachable in practice).
    pub fn error_estimate(&mut self, dt: f64) {
        let e = self
            .table
            .e
            .expect("adaptive stepping requires an embedded error row");
        let mut acc_r = Vec3::ZERO;
        let mut acc_v = Vec3::ZERO;
        for (k, &weight) in e.iter().enumerate() {
            acc_r += self.method.r1[k + 1] * weight;
            acc_v += self.method.r2[k + 1] * weight;
        }
        let e0 = (acc_r * dt).norm();
        let e1 = (acc_v * dt).norm();
        self.method.record_error(e0, e1);
    }

    /// Integrates `eq` from the current `session` state to landing (or the
    /// configured final time), returning the elapsed time.
    pub fn run(&mut self, eq: &Equation, session: &mut IntegrationSession) -> Result<f64, IntegrationError> {
        let mut dt = eq.step_size(session.v);
        let mut t = 0.0;
        let mut step_start_t = 0.0;
        session.backup();

        loop {
            if t > 0.0 && self.method.config.error_dt {
                let dt_new = self.method.next_dt(dt, self.table.order);
                if self.method.config.rollback == RollbackPolicy::Rollback
                    && dt_new < self.method.config.beta * dt
                {
                    tracing::debug!(t = step_start_t, dt, dt_new, "adaptive step rejected, rolling back");
                    session.restore();
                    self.method.undo_last_error();
                    t = step_start_t;
                }
                dt = dt_new;
            } else {
                dt = eq.step_size(session.v);
            }

            let t_old = t;
            let mut dt_mut = dt;
            let (t_new, landed) = eq.land(session, t_old, &mut dt_mut)?;
            dt = dt_mut;
            if landed {
                t = t_new;
                break;
            }

            session.backup();
            step_start_t = t_old;
            self.step(eq, session, t_old, dt);
            session.t = t_old + dt;
            session.check_finite()?;
            if let Err(err) = session.check_safety_cap() {
                tracing::warn!(t = session.t, "landing safety cap exceeded");
                return Err(err);
            }
            if self.method.config.error_dt {
                self.error_estimate(dt);
            }
            t = t_new;
        }
        Ok(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ballistics_core::Vec3;
    use ballistics_models::{EquationConfig, LandType};
    use approx::assert_relative_eq;

    fn free_fall_config() -> EquationConfig {
        EquationConfig {
            r#type: 0,
            z: 100.0,
            vz: 0.0,
            size_type: 0,
            dt: 0.01,
            land: 0,
            t: (200.0f64 / 9.81).sqrt(),
            g: Some(9.81),
            ..Default::default()
        }
    }

    fn fixed_step_cfg(order: u8) -> MethodConfig {
        MethodConfig {
            order,
            error_dt: false,
            alpha: 2.0,
            beta: 0.5,
            error_time: 0.0,
            rollback: crate::config::RollbackPolicy::None,
        }
    }

    #[test]
    fn free_fall_matches_closed_form_within_rk4_tolerance() {
        let eq = Equation::try_from(free_fall_config()).unwrap();
        let mut rk = RungeKutta::new(fixed_step_cfg(4)).unwrap();
        let mut session = IntegrationSession::new(eq.r0, eq.v0, Vec3::new(0.0, 0.0, -eq.g), false);
        let t = rk.run(&eq, &mut session).unwrap();
        let (r_ana, v_ana) = eq.closed_form(t);
        assert_relative_eq!(session.r.z, r_ana.z, epsilon = 1e-6);
        assert_relative_eq!(session.v.z, v_ana.z, epsilon = 1e-6);
        assert_relative_eq!(session.v.z, -(2.0 * 9.81 * 100.0f64).sqrt(), epsilon = 1e-1);
    }

    #[test]
    fn vacuum_parabola_lands_near_analytical_range() {
        let mut cfg = free_fall_config();
        cfg.land = 1;
        cfg.z = 0.0;
        cfg.vx = 30.0;
        cfg.vz = 30.0;
        cfg.dt = 0.02;
        let eq = Equation::try_from(cfg).unwrap();
        assert_eq!(eq.land_type, LandType::Linear);
        let mut rk = RungeKutta::new(fixed_step_cfg(2)).unwrap();
        let mut session = IntegrationSession::new(eq.r0, eq.v0, Vec3::new(0.0, 0.0, -eq.g), false);
        rk.run(&eq, &mut session).unwrap();
        let expected_range = 30.0 * 2.0 * 30.0 / 9.81;
        assert_relative_eq!(session.r.x, expected_range, epsilon = 0.01);
    }
}
