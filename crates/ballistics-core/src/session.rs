//! The integration session: the shared working registers every component
//! operation reads and mutates.
//!
//! The C source kept `r`, `v`, `a` and their single-step backups, plus the
//! acceleration-evaluation counter, as module globals. This struct is the
//! encapsulated replacement: one owned object per trajectory, threaded
//! through equation, method and integrator operations instead of hidden
//! behind file-scope statics.

use crate::error::IntegrationError;
use crate::vector::Vec3;

/// Safety cap on elapsed time for `land_type >= 1` trajectories that never
/// return to `z <= 0` (an upward-forced type-3 trajectory, for instance).
/// Exceeding it is a runtime error rather than an infinite loop.
pub const TF_SAFETY: f64 = 10_000.0;

/// Owns the six working 3-vectors and the evaluation counter for one
/// trajectory integration.
#[derive(Clone, Copy, Debug)]
pub struct IntegrationSession {
    /// Current position.
    pub r: Vec3,
    /// Current velocity.
    pub v: Vec3,
    /// Current acceleration.
    pub a: Vec3,
    /// Position at the start of the current step.
    pub r_back: Vec3,
    /// Velocity at the start of the current step.
    pub v_back: Vec3,
    /// Acceleration at the start of the current step.
    pub a_back: Vec3,
    /// Number of acceleration-functional evaluations so far; the primary
    /// cost metric in convergence reports.
    pub nevaluations: u64,
    /// Elapsed simulation time.
    pub t: f64,
    /// When set, a non-finite `r`/`v` after a step is reported as
    /// [`IntegrationError::NonFinite`] instead of silently propagating.
    pub nan_guard: bool,
}

impl IntegrationSession {
    #[must_use]
    pub fn new(r0: Vec3, v0: Vec3, a0: Vec3, nan_guard: bool) -> Self {
        Self {
            r: r0,
            v: v0,
            a: a0,
            r_back: r0,
            v_back: v0,
            a_back: a0,
            nevaluations: 0,
            t: 0.0,
            nan_guard,
        }
    }

    /// Copies the current working registers into the rollback backup, as
    /// required before every step attempt.
    pub fn backup(&mut self) {
        self.r_back = self.r;
        self.v_back = self.v;
        self.a_back = self.a;
    }

    /// Restores the working registers from the rollback backup (used by the
    /// optional adaptive-step rollback arm; see `RollbackPolicy`).
    pub fn restore(&mut self) {
        self.r = self.r_back;
        self.v = self.v_back;
        self.a = self.a_back;
    }

    /// Increments the acceleration-evaluation counter. Called once per
    /// `Equation::acceleration` invocation.
    pub fn record_evaluation(&mut self) {
        self.nevaluations += 1;
    }

    /// Fails the trajectory if `nan_guard` is set and the state is non-finite.
    pub fn check_finite(&self) -> Result<(), IntegrationError> {
        if self.nan_guard && !(self.r.is_finite() && self.v.is_finite()) {
            return Err(IntegrationError::NonFinite(self.t));
        }
        Ok(())
    }

    /// Fails the trajectory if elapsed time has exceeded [`TF_SAFETY`]
    /// without a geometric landing.
    pub fn check_safety_cap(&self) -> Result<(), IntegrationError> {
        if self.t > TF_SAFETY {
            return Err(IntegrationError::LandingSafetyCapExceeded(TF_SAFETY));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restore_undoes_a_step() {
        let mut s = IntegrationSession::new(Vec3::ZERO, Vec3::ZERO, Vec3::ZERO, false);
        s.backup();
        s.r = Vec3::new(1.0, 0.0, 0.0);
        s.restore();
        assert_eq!(s.r, Vec3::ZERO);
    }

    #[test]
    fn safety_cap_trips_past_tf_safety() {
        let mut s = IntegrationSession::new(Vec3::ZERO, Vec3::ZERO, Vec3::ZERO, false);
        s.t = TF_SAFETY + 1.0;
        assert!(s.check_safety_cap().is_err());
    }

    #[test]
    fn nan_guard_off_by_default_does_not_trip() {
        let mut s = IntegrationSession::new(Vec3::ZERO, Vec3::ZERO, Vec3::ZERO, false);
        s.r = Vec3::new(f64::NAN, 0.0, 0.0);
        assert!(s.check_finite().is_ok());
    }

    #[test]
    fn nan_guard_on_trips_on_non_finite_state() {
        let mut s = IntegrationSession::new(Vec3::ZERO, Vec3::ZERO, Vec3::ZERO, true);
        s.r = Vec3::new(f64::NAN, 0.0, 0.0);
        assert!(s.check_finite().is_err());
    }
}
