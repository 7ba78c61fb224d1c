//! Plain-data configuration records for the method/integrator layer and the
//! convergence driver, matching the field names used by the system this was
//! distilled from.

#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Whether an adaptive step that would shrink below `beta * dt` is taken
/// anyway (`None`, the definitive later-revision behaviour this crate
/// defaults to) or triggers a restore-and-retry (`Rollback`, the
/// early-version behaviour, kept for configurations authored against it).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
pub enum RollbackPolicy {
    #[default]
    None,
    Rollback,
}

/// A parsed Runge-Kutta or multi-step method configuration record.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
pub struct MethodConfig {
    /// Method order (1..=4 for Runge-Kutta, 2..=3 for multi-step).
    pub order: u8,
    /// `error_dt`: `false` selects a fixed step, `true` selects the
    /// adaptive PI-style step-size controller.
    pub error_dt: bool,
    /// Step-growth cap, used only when `error_dt` is set.
    pub alpha: f64,
    /// Step-shrink floor; validated but only consulted by
    /// [`RollbackPolicy::Rollback`].
    pub beta: f64,
    /// Target error rate `eps_max`, used only when `error_dt` is set.
    pub error_time: f64,
    pub rollback: RollbackPolicy,
}

/// A configuration error surfaced before a method is constructed.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum MethodConfigError {
    #[error("unknown Runge-Kutta order {0} (expected 1..=4)")]
    UnknownRungeKuttaOrder(u8),
    #[error("unknown multi-step order {0} (expected 2..=3)")]
    UnknownMultiStepOrder(u8),
    #[error("order-4 Runge-Kutta has no embedded error row; error_dt must be false")]
    NoEmbeddedErrorAtOrderFour,
    #[error("alpha must be > 1, got {0}")]
    InvalidAlpha(f64),
    #[error("beta must lie in (0, 1), got {0}")]
    InvalidBeta(f64),
    #[error("error_time (eps_max) must be > 0, got {0}")]
    InvalidErrorTime(f64),
}

impl MethodConfig {
    pub(crate) fn validate_common(&self) -> Result<(), MethodConfigError> {
        if self.error_dt {
            if !(self.alpha > 1.0) {
                return Err(MethodConfigError::InvalidAlpha(self.alpha));
            }
            if !(self.beta > 0.0 && self.beta < 1.0) {
                return Err(MethodConfigError::InvalidBeta(self.beta));
            }
            if !(self.error_time > 0.0) {
                return Err(MethodConfigError::InvalidErrorTime(self.error_time));
            }
        }
        Ok(())
    }
}

/// A parsed convergence-sweep configuration record.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
pub struct ConvergenceConfig {
    /// Number of randomly-parameterised trajectories averaged per iteration.
    pub trajectories: u32,
    /// Number of sweep iterations.
    pub convergence: u32,
    /// Geometric multiplier applied to the scale parameter (`dt`/`kt`, and
    /// every `error_time`) between iterations.
    pub factor: f64,
    /// RNG seed; reapplied at the start of every iteration so the same
    /// trajectory corpus is re-integrated at each sweep point.
    pub seed: u64,
}

/// A configuration error surfaced before a convergence sweep starts.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum ConvergenceConfigError {
    #[error("trajectories must be > 0")]
    NoTrajectories,
    #[error("convergence (iteration count) must be > 0")]
    NoIterations,
    #[error("factor must be > 0, got {0}")]
    InvalidFactor(f64),
}

impl ConvergenceConfig {
    pub fn validate(&self) -> Result<(), ConvergenceConfigError> {
        if self.trajectories == 0 {
            return Err(ConvergenceConfigError::NoTrajectories);
        }
        if self.convergence == 0 {
            return Err(ConvergenceConfigError::NoIterations);
        }
        if !(self.factor > 0.0) {
            return Err(ConvergenceConfigError::InvalidFactor(self.factor));
        }
        Ok(())
    }
}
