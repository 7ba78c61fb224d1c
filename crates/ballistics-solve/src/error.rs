//! The top-level error type composing every fallible boundary in this
//! workspace, and its mapping onto the original tool's exit codes.

use ballistics_core::IntegrationError;
use ballistics_models::EquationConfigError;
use thiserror::Error;

use crate::config::{ConvergenceConfigError, MethodConfigError};

/// Any failure surfaced by this workspace: configuration errors at
/// construction time, or an integration-time failure while a trajectory is
/// running.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum BallisticsError {
    #[error("equation configuration: {0}")]
    Equation(#[from] EquationConfigError),
    #[error("method configuration: {0}")]
    Method(#[from] MethodConfigError),
    #[error("convergence configuration: {0}")]
    Convergence(#[from] ConvergenceConfigError),
    #[error("integration: {0}")]
    Integration(#[from] IntegrationError),
}

/// Classifies a [`BallisticsError`] the way the original tool's exit codes
/// did, so a caller that wants bit-for-bit parity with the original exit
/// codes can still get it; a caller's own CLI is free to choose otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    Ok,
    BadArgumentCount,
    CannotOpenInput,
    RootElementMismatch,
    BallisticRunFailure,
    ConvergenceRunFailure,
    UnknownTopLevelModel,
}

impl ExitReason {
    /// The original tool's numeric exit code for this reason.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Ok => 0,
            Self::BadArgumentCount => 1,
            Self::CannotOpenInput => 2,
            Self::RootElementMismatch => 3,
            Self::BallisticRunFailure => 4,
            Self::ConvergenceRunFailure => 5,
            Self::UnknownTopLevelModel => 6,
        }
    }
}

impl BallisticsError {
    /// This error's `ExitReason`, assuming a single-trajectory ("ballistic")
    /// run; a convergence-sweep caller should use
    /// [`BallisticsError::kind_in_convergence`] instead.
    #[must_use]
    pub fn kind(self) -> ExitReason {
        ExitReason::BallisticRunFailure
    }

    /// This error's `ExitReason` when raised from within a convergence sweep.
    #[must_use]
    pub fn kind_in_convergence(self) -> ExitReason {
        ExitReason::ConvergenceRunFailure
    }
}
