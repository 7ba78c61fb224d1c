//! Runge-Kutta and linear multi-step integrators, plus single-trajectory
//! and convergence-sweep orchestration, for the ballistics benchmark
//! workspace.
//!
//! Includes:
//! - `config`: method/convergence configuration records and their errors
//! - `tables`: the normative Runge-Kutta and multi-step coefficient tables
//! - `method`: shared scratch state, the adaptive step rule, the bisection
//!   time-finder
//! - `rk`: the explicit Runge-Kutta integrator
//! - `multistep`: the RK-bootstrapped linear multi-step integrator
//! - `integrator`: the closed dispatch enum over the two families
//! - `driver`: single-trajectory and convergence-sweep orchestration
//! - `error`: the top-level error type and exit-code classification

#![forbid(unsafe_code)]
#![cfg_attr(not(test), warn(missing_docs))]

pub mod config;
pub mod driver;
pub mod error;
pub mod integrator;
pub mod method;
pub mod multistep;
pub mod rk;
pub mod tables;

pub use config::{ConvergenceConfig, ConvergenceConfigError, MethodConfig, MethodConfigError, RollbackPolicy};
pub use driver::{run_convergence, run_trajectory, ConvergenceRow, IntegratorKind, TrajectoryReport};
pub use error::{BallisticsError, ExitReason};
pub use integrator::Integrator;
pub use method::{bisection_landing_time, Method};
pub use multistep::MultiStep;
pub use rk::RungeKutta;
