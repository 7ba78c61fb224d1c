//! Shared math, vector type and integration-session state for the ballistics
//! benchmark workspace.
//!
//! Includes:
//! - `vector`: the plain 3-vector used for position/velocity/acceleration
//! - `math`: bounded-interval real roots of quadratics and cubics
//! - `session`: the owned `IntegrationSession` replacing the C source's
//!   module-global working registers
//! - `error`: integration-time (not configuration-time) failures

#![forbid(unsafe_code)]
#![cfg_attr(not(test), warn(missing_docs))]

pub mod error;
pub mod math;
pub mod session;
pub mod vector;

pub use error::IntegrationError;
pub use session::{IntegrationSession, TF_SAFETY};
pub use vector::{distance, Vec3};
