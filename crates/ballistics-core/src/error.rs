//! Errors surfaced while an integration is running, as opposed to while a
//! configuration is being validated (see `EquationConfigError` et al. in
//! `ballistics-models`).

use thiserror::Error;

/// A fallible outcome of running a single trajectory.
///
/// Numerical overflow/NaN is not trapped by default (matching the original
/// tool exactly); these two variants are the only integration-time failures
/// this crate recognises.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum IntegrationError {
    /// `land_type >= 1` but the trajectory never returned to `z <= 0` before
    /// `t` exceeded [`crate::session::TF_SAFETY`].
    #[error("trajectory did not land within the {0}s safety cap")]
    LandingSafetyCapExceeded(f64),

    /// The `nan_guard` option on [`crate::session::IntegrationSession`] is
    /// enabled and a non-finite position or velocity was produced.
    #[error("position or velocity became non-finite at t={0}")]
    NonFinite(f64),
}
