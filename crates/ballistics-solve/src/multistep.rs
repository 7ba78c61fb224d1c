//! The linear multi-step integrator: RK-bootstrapped history, single-step
//! update, embedded error estimation, and the driving integration loop.

use ballistics_core::{IntegrationError, IntegrationSession, Vec3};
use ballistics_models::Equation;

use crate::config::{MethodConfig, MethodConfigError};
use crate::method::Method;
use crate::rk::RungeKutta;
use crate::tables::{ms_table, MultiStepTable};

/// A linear multi-step integrator of order 2 or 3, bootstrapped by an
/// embedded Runge-Kutta integrator of the same order.
///
/// History is not on a uniform grid once the step size changes, so a
/// step-size change triggers a full re-bootstrap via the embedded RK
/// integrator rather than a single fallback step.
pub struct MultiStep {
    table: &'static MultiStepTable,
    method: Method,
    rk: RungeKutta,
    last_dt: Option<f64>,
}

impl MultiStep {
    pub fn new(config: MethodConfig) -> Result<Self, MethodConfigError> {
        let table = ms_table(config.order).ok_or(MethodConfigError::UnknownMultiStepOrder(config.order))?;
        let method = Method::new(config, table.slots)?;
        let rk = RungeKutta::new(config)?;
        Ok(Self { table, method, rk, last_dt: None })
    }

    #[must_use]
    pub fn order(&self) -> u8 {
        self.table.order
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Fills the `n` history slots by taking `n - 1` Runge-Kutta steps from
    /// the current session state, leaving the session at the bootstrap
    /// endpoint and `R[0]` holding that endpoint state.
    fn bootstrap(&mut self, eq: &Equation, session: &mut IntegrationSession, t0: f64, dt: f64) -> f64 {
        let n = self.table.slots;
        let mut states = Vec::with_capacity(n);
        states.push((session.r, session.v, session.a));
        let mut t = t0;
        for _ in 0..n - 1 {
            session.backup();
            self.rk.step(eq, session, t, dt);
            t += dt;
            session.t = t;
            states.push((session.r, session.v, session.a));
        }
        for (j, slot) in states.iter().rev().enumerate() {
            self.method.r0[j] = slot.0;
            self.method.r1[j] = slot.1;
            self.method.r2[j] = slot.2;
        }
        self.last_dt = Some(dt);
        t
    }

    /// Advances `session` by one multi-step update of size `dt`, assuming
    /// history was populated at this same step size.
    pub fn step(&mut self, eq: &Equation, session: &mut IntegrationSession, t_old: f64, dt: f64) {
        let n = self.table.slots;
        let mut r_new = Vec3::ZERO;
        let mut v_new = Vec3::ZERO;
        for i in 0..n {
            r_new += (self.method.r0[i] + self.method.r1[i] * (dt * self.table.c[i])) * self.table.a[i];
            v_new += (self.method.r1[i] + self.method.r2[i] * (dt * self.table.c[i])) * self.table.a[i];
        }

        let pre_step = (session.r, session.v, session.a);
        for i in (1..n).rev() {
            self.method.r0[i] = self.method.r0[i - 1];
            self.method.r1[i] = self.method.r1[i - 1];
            self.method.r2[i] = self.method.r2[i - 1];
        }
        self.method.r0[0] = pre_step.0;
        self.method.r1[0] = pre_step.1;
        self.method.r2[0] = pre_step.2;

        session.r = r_new;
        session.v = v_new;
        session.a = eq.acceleration(v_new, t_old + dt, session);
        self.last_dt = Some(dt);
    }

    /// Computes and accumulates this step's error estimate from the history
    /// slots, mirroring [`crate::rk::RungeKutta::error_estimate`]'s
    /// position/velocity split.
    pub fn error_estimate(&mut self, dt: f64) {
        let n = self.table.slots;
        let mut acc0 = Vec3::ZERO;
        let mut acc1 = Vec3::ZERO;
        for i in 0..n {
            acc0 += self.method.r0[i] * self.table.ea[i] + self.method.r1[i] * (dt * self.table.eb[i]);
            acc1 += self.method.r1[i] * self.table.ea[i] + self.method.r2[i] * (dt * self.table.eb[i]);
        }
        self.method.record_error(acc0.norm(), acc1.norm());
    }

    /// Integrates `eq` from the current `session` state to landing (or the
    /// configured final time), returning the elapsed time.
    pub fn run(&mut self, eq: &Equation, session: &mut IntegrationSession) -> Result<f64, IntegrationError> {
        let dt0 = eq.step_size(session.v);
        session.backup();
        let mut t = self.bootstrap(eq, session, 0.0, dt0);
        session.check_finite()?;
        session.check_safety_cap()?;

        let mut step_start_t = t;

        loop {
            let dt = if self.method.config.error_dt {
                let prev_dt = self.last_dt.unwrap_or(dt0);
                let dt_new = self.method.next_dt(prev_dt, self.table.order);
                if self.method.config.rollback == crate::config::RollbackPolicy::Rollback
                    && dt_new < self.method.config.beta * prev_dt
                {
                    tracing::debug!(t = step_start_t, prev_dt, dt_new, "adaptive step rejected, rolling back");
                    session.restore();
                    self.method.undo_last_error();
                    t = step_start_t;
                }
                dt_new
            } else {
                eq.step_size(session.v)
            };

            let t_old = t;
            let mut dt_mut = dt;
            let (t_new, landed) = eq.land(session, t_old, &mut dt_mut)?;
            let dt = dt_mut;
            if landed {
                t = t_new;
                break;
            }

            session.backup();
            step_start_t = t_old;
            if self.last_dt != Some(dt) {
                t = self.bootstrap(eq, session, t_old, dt);
            } else {
                self.step(eq, session, t_old, dt);
                t = t_old + dt;
            }
            session.t = t;
            session.check_finite()?;
            if let Err(err) = session.check_safety_cap() {
                tracing::warn!(t = session.t, "landing safety cap exceeded");
                return Err(err);
            }
            if self.method.config.error_dt {
                self.error_estimate(dt);
            }
        }
        Ok(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RollbackPolicy;
    use ballistics_core::Vec3;
    use ballistics_models::EquationConfig;
    use approx::assert_relative_eq;

    fn fixed_step_cfg(order: u8) -> MethodConfig {
        MethodConfig {
            order,
            error_dt: false,
            alpha: 2.0,
            beta: 0.5,
            error_time: 0.0,
            rollback: RollbackPolicy::None,
        }
    }

    #[test]
    fn linear_drag_reaches_near_terminal_velocity() {
        let cfg = EquationConfig {
            r#type: 1,
            z: 1000.0,
            wx: 10.0,
            lambda: 0.1,
            size_type: 0,
            dt: 0.05,
            land: 0,
            t: 100.0,
            g: Some(9.81),
            ..Default::default()
        };
        let eq = Equation::try_from(cfg).unwrap();
        let mut ms = MultiStep::new(fixed_step_cfg(3)).unwrap();
        let mut session = IntegrationSession::new(eq.r0, eq.v0, Vec3::new(0.0, 0.0, -eq.g), false);
        ms.run(&eq, &mut session).unwrap();
        let expected = 10.0 * (1.0 - (-10.0f64).exp());
        assert_relative_eq!(session.v.x, expected, epsilon = 1e-3);
    }

    #[test]
    fn adaptive_step_still_converges_near_closed_form() {
        let cfg = EquationConfig {
            r#type: 1,
            z: 1000.0,
            wx: 10.0,
            lambda: 0.1,
            size_type: 0,
            dt: 0.05,
            land: 0,
            t: 100.0,
            g: Some(9.81),
            ..Default::default()
        };
        let eq = Equation::try_from(cfg).unwrap();
        let adaptive_cfg = MethodConfig {
            order: 3,
            error_dt: true,
            alpha: 1.5,
            beta: 0.5,
            error_time: 1e-6,
            rollback: RollbackPolicy::None,
        };
        let mut ms = MultiStep::new(adaptive_cfg).unwrap();
        let mut session = IntegrationSession::new(eq.r0, eq.v0, Vec3::new(0.0, 0.0, -eq.g), false);
        ms.run(&eq, &mut session).unwrap();
        let expected = 10.0 * (1.0 - (-10.0f64).exp());
        assert_relative_eq!(session.v.x, expected, epsilon = 1e-2);
    }
}
