//! Plain-data configuration records matching the field names of the system
//! the equation family was distilled from, so a caller deserializing XML,
//! JSON, or the legacy whitespace key/value format onto these structs needs
//! no renaming layer.
//!
//! Parsing an actual file is the caller's job; this module only validates
//! the parsed record and turns it into a runtime [`crate::equation::Equation`].

#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A parsed `Equation` configuration record.
///
/// `x`, `y`, `vx`, `vy`, `vz`, `wx`, `wy`, `lambda` are meaningful in
/// single-trajectory mode; `vmin`, `vmax`, `vertical_angle`, `wmax`,
/// `lambda_min`, `lambda_max` in convergence mode. Both sets are present on
/// one struct because the upstream format does not distinguish them
/// syntactically — only which fields a given document populates.
#[derive(Clone, Copy, Debug, Default)]
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
pub struct EquationConfig {
    pub r#type: u8,
    pub z: f64,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub vz: f64,
    pub wx: f64,
    pub wy: f64,
    pub lambda: f64,
    pub vmin: f64,
    pub vmax: f64,
    pub vertical_angle: f64,
    pub wmax: f64,
    pub lambda_min: f64,
    pub lambda_max: f64,
    /// Defaults to 9.81 when absent; `None` selects the default.
    pub g: Option<f64>,
    /// `size_type`: 0 = fixed `dt`, 1 = stability-bounded `kt`.
    #[cfg_attr(feature = "with-serde", serde(rename = "time-step"))]
    pub size_type: u8,
    pub dt: f64,
    pub kt: f64,
    /// `land_type`: 0 = final-time, 1 = linear, 2 = quadratic, 3 = cubic.
    pub land: u8,
    /// Final time, only meaningful when `land` is 0.
    pub t: f64,
    /// Selects single-trajectory fields (`false`) or range fields (`true`).
    pub random_init: bool,
}

/// Default vertical gravitational acceleration magnitude (m/s^2).
pub const DEFAULT_G: f64 = 9.81;

/// A configuration error surfaced at the boundary; the run does not start.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum EquationConfigError {
    #[error("unknown equation type {0} (expected 0..=3)")]
    UnknownType(u8),
    #[error("unknown size_type {0} (expected 0 or 1)")]
    UnknownSizeType(u8),
    #[error("unknown land_type {0} (expected 0..=3)")]
    UnknownLandType(u8),
    #[error("equation types 0 and 3 do not define a stability step")]
    NoStabilityStep,
    #[error("quadratic drag (type 2) is undefined at lambda = 0")]
    ZeroLambdaQuadraticDrag,
    #[error("vmax must be positive, got {0}")]
    NonPositiveVMax(f64),
    #[error("vmin ({0}) must lie in [0, vmax] ({1})")]
    VMinOutOfRange(f64, f64),
    #[error("wmax must be non-negative, got {0}")]
    NegativeWMax(f64),
    #[error("lambda_max ({0}) must be >= lambda_min ({1}) >= 0")]
    LambdaRangeInvalid(f64, f64),
    #[error("initial altitude z must be >= 0, got {0}")]
    NegativeAltitude(f64),
    #[error("final time t must be >= 0, got {0}")]
    NegativeFinalTime(f64),
}
