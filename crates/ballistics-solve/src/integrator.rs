//! A closed dispatch enum over the two integrator families.
//!
//! An enum rather than `dyn Trait`: the variant set is closed (exactly two
//! families) and `run` is called once per trajectory in a hot loop, so a
//! `match` compiling to a direct call beats vtable indirection here.

use ballistics_core::{IntegrationError, IntegrationSession};
use ballistics_models::Equation;

use crate::config::MethodConfig;
use crate::method::Method;
use crate::multistep::MultiStep;
use crate::rk::RungeKutta;
use crate::MethodConfigError;

/// Either a Runge-Kutta or a linear multi-step integrator, already
/// validated against its coefficient table.
pub enum Integrator {
    RungeKutta(RungeKutta),
    MultiStep(MultiStep),
}

impl Integrator {
    /// Builds a Runge-Kutta integrator (orders 1..=4).
    pub fn runge_kutta(config: MethodConfig) -> Result<Self, MethodConfigError> {
        Ok(Self::RungeKutta(RungeKutta::new(config)?))
    }

    /// Builds a linear multi-step integrator (orders 2..=3).
    pub fn multi_step(config: MethodConfig) -> Result<Self, MethodConfigError> {
        Ok(Self::MultiStep(MultiStep::new(config)?))
    }

    #[must_use]
    pub fn order(&self) -> u8 {
        match self {
            Self::RungeKutta(rk) => rk.order(),
            Self::MultiStep(ms) => ms.order(),
        }
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        match self {
            Self::RungeKutta(rk) => rk.method(),
            Self::MultiStep(ms) => ms.method(),
        }
    }

    pub fn run(&mut self, eq: &Equation, session: &mut IntegrationSession) -> Result<f64, IntegrationError> {
        match self {
            Self::RungeKutta(rk) => rk.run(eq, session),
            Self::MultiStep(ms) => ms.run(eq, session),
        }
    }
}
