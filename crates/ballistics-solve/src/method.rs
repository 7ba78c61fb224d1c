//! Per-integrator scratch state, the adaptive step-size rule, and the
//! bisection time-finder shared by the Runge-Kutta and multi-step cores.

use ballistics_core::Vec3;
use ballistics_models::Equation;

use crate::config::{MethodConfig, MethodConfigError};

/// Owns the per-stage/per-history scratch vectors and error accumulators
/// for one integrator instance.
///
/// `R0`, `R1`, `R2` each hold `slots` entries: stage state for a
/// Runge-Kutta method (`slots = stages + 1`), or history state for a
/// multi-step method (`slots = n`).
pub struct Method {
    pub config: MethodConfig,
    pub r0: Vec<Vec3>,
    pub r1: Vec<Vec3>,
    pub r2: Vec<Vec3>,
    /// Position/velocity error magnitude of the last step.
    pub e0: f64,
    pub e1: f64,
    /// Running totals across the whole integration.
    pub total_e0: f64,
    pub total_e1: f64,
}

impl Method {
    pub fn new(config: MethodConfig, slots: usize) -> Result<Self, MethodConfigError> {
        config.validate_common()?;
        Ok(Self {
            config,
            r0: vec![Vec3::ZERO; slots],
            r1: vec![Vec3::ZERO; slots],
            r2: vec![Vec3::ZERO; slots],
            e0: 0.0,
            e1: 0.0,
            total_e0: 0.0,
            total_e1: 0.0,
        })
    }

    /// Records this step's error magnitudes and folds them into the totals.
    pub fn record_error(&mut self, e0: f64, e1: f64) {
        self.e0 = e0;
        self.e1 = e1;
        self.total_e0 += e0;
        self.total_e1 += e1;
    }

    /// Undoes the last [`Method::record_error`] call; used by the optional
    /// rollback arm to keep the totals consistent with a discarded step.
    pub fn undo_last_error(&mut self) {
        self.total_e0 -= self.e0;
        self.total_e1 -= self.e1;
    }

    /// `dt_next = dt * min(alpha, (eps_max * dt / e0)^(1/(p-1)))`.
    ///
    /// A non-positive `e0` (a step with no detectable error) grows the
    /// step by the full `alpha` cap rather than dividing by zero.
    #[must_use]
    pub fn next_dt(&self, dt: f64, order: u8) -> f64 {
        if self.e0 <= 0.0 {
            return dt * self.config.alpha;
        }
        let p = f64::from(order);
        let growth = (self.config.error_time * dt / self.e0).powf(1.0 / (p - 1.0));
        dt * growth.min(self.config.alpha)
    }
}

/// Finds the time at which the equation's closed-form solution crosses
/// `z = 0`, by doubling an upper bracket and then 64 bisection halvings.
///
/// Used by the driver to report an analytical impact time alongside the
/// numerical one; not part of the integration loop itself.
#[must_use]
pub fn bisection_landing_time(eq: &Equation) -> f64 {
    let mut t1 = 0.0;
    let mut t2 = 1.0;
    while eq.closed_form(t2).0.z > 0.0 {
        t2 *= 2.0;
    }
    for _ in 0..64 {
        let mid = 0.5 * (t1 + t2);
        if eq.closed_form(mid).0.z > 0.0 {
            t1 = mid;
        } else {
            t2 = mid;
        }
    }
    0.5 * (t1 + t2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RollbackPolicy;

    fn cfg() -> MethodConfig {
        MethodConfig { order: 2, error_dt: true, alpha: 2.0, beta: 0.5, error_time: 1e-6, rollback: RollbackPolicy::None }
    }

    #[test]
    fn next_dt_caps_growth_at_alpha_on_zero_error() {
        let m = Method::new(cfg(), 3).unwrap();
        assert_eq!(m.next_dt(0.1, 2), 0.2);
    }

    #[test]
    fn next_dt_shrinks_when_error_exceeds_target() {
        let mut m = Method::new(cfg(), 3).unwrap();
        m.record_error(1e-3, 0.0);
        let dt_next = m.next_dt(0.1, 2);
        assert!(dt_next < 0.1);
    }
}
