//! The four point-mass equation-of-motion families: exact acceleration
//! functional, closed-form analytical solution, stability-bounded step size
//! and geometric landing detection, plus randomised per-trajectory
//! initialisation for the convergence driver.

use ballistics_core::{IntegrationError, IntegrationSession, Vec3};
use rand::Rng;
#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::config::{EquationConfig, EquationConfigError, DEFAULT_G};

/// Which of the four acceleration functionals governs a trajectory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
pub enum EquationType {
    /// No drag, no wind; gravity only.
    NoDrag,
    /// Linear (Stokes) drag plus a constant wind.
    LinearDrag,
    /// Quadratic (speed-squared) drag plus a constant wind.
    QuadraticDrag,
    /// No drag; an exponentially-decaying horizontal forcing term in place
    /// of wind, e.g. a muzzle-blast aftereffect.
    ForcedDecay,
}

impl EquationType {
    fn from_u8(v: u8) -> Result<Self, EquationConfigError> {
        match v {
            0 => Ok(Self::NoDrag),
            1 => Ok(Self::LinearDrag),
            2 => Ok(Self::QuadraticDrag),
            3 => Ok(Self::ForcedDecay),
            other => Err(EquationConfigError::UnknownType(other)),
        }
    }

    /// `true` for the two equation families with a `lambda`-dependent
    /// stability bound on the integration step.
    #[must_use]
    pub fn has_stability_step(self) -> bool {
        matches!(self, Self::LinearDrag | Self::QuadraticDrag)
    }

    /// `true` for the three families whose `lambda` is drawn at
    /// initialisation time (type 0 has none).
    #[must_use]
    pub fn draws_lambda(self) -> bool {
        !matches!(self, Self::NoDrag)
    }
}

/// How the integration step size is chosen.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
pub enum SizeType {
    /// A fixed step `dt`, in seconds.
    Fixed(f64),
    /// `dt = kt / stability_divisor(v)`, recomputed every step.
    Stability(f64),
}

/// How ground impact is located within the step that crosses `z == 0`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
pub enum LandType {
    /// No geometric landing search; the run stops at a fixed final time.
    FinalTime(f64),
    /// Linear (first-order) local inversion.
    Linear,
    /// Quadratic (second-order) local inversion.
    Quadratic,
    /// Cubic (third-order, finite-difference jerk) local inversion.
    Cubic,
}

/// A fully-validated point-mass equation of motion, together with the
/// bounds used to redraw a fresh initial state for each trajectory in a
/// convergence sweep.
#[derive(Clone, Copy, Debug)]
pub struct Equation {
    pub kind: EquationType,
    pub g: f64,
    pub size_type: SizeType,
    pub land_type: LandType,
    /// Initial position; `x == y == 0` always, `z` fixed by configuration.
    pub r0: Vec3,
    /// Initial velocity: set directly in single-trajectory mode, or drawn
    /// by [`Equation::init_random`] in convergence mode.
    pub v0: Vec3,
    /// Constant wind (types 1, 2) or initial forcing amplitude (type 3).
    pub w: [f64; 2],
    /// Drag/decay coefficient; unused (and fixed at 0) for [`EquationType::NoDrag`].
    pub lambda: f64,
    v_min: f64,
    v_max: f64,
    vertical_angle_rad: f64,
    w_max: f64,
    lambda_min: f64,
    lambda_max: f64,
}

impl TryFrom<EquationConfig> for Equation {
    type Error = EquationConfigError;

    fn try_from(cfg: EquationConfig) -> Result<Self, Self::Error> {
        let kind = EquationType::from_u8(cfg.r#type)?;
        let g = cfg.g.unwrap_or(DEFAULT_G);

        let size_type = match cfg.size_type {
            0 => SizeType::Fixed(cfg.dt),
            1 => {
                if !kind.has_stability_step() {
                    return Err(EquationConfigError::NoStabilityStep);
                }
                SizeType::Stability(cfg.kt)
            }
            other => return Err(EquationConfigError::UnknownSizeType(other)),
        };

        let land_type = match cfg.land {
            0 => {
                if cfg.t < 0.0 {
                    return Err(EquationConfigError::NegativeFinalTime(cfg.t));
                }
                LandType::FinalTime(cfg.t)
            }
            1 => LandType::Linear,
            2 => LandType::Quadratic,
            3 => LandType::Cubic,
            other => return Err(EquationConfigError::UnknownLandType(other)),
        };

        if cfg.z < 0.0 {
            return Err(EquationConfigError::NegativeAltitude(cfg.z));
        }
        let r0 = Vec3::new(0.0, 0.0, cfg.z);

        if cfg.random_init {
            if cfg.vmax <= 0.0 {
                return Err(EquationConfigError::NonPositiveVMax(cfg.vmax));
            }
            if cfg.vmin < 0.0 || cfg.vmin > cfg.vmax {
                return Err(EquationConfigError::VMinOutOfRange(cfg.vmin, cfg.vmax));
            }
            if cfg.wmax < 0.0 {
                return Err(EquationConfigError::NegativeWMax(cfg.wmax));
            }
            if kind.draws_lambda() && (cfg.lambda_max < cfg.lambda_min || cfg.lambda_min < 0.0) {
                return Err(EquationConfigError::LambdaRangeInvalid(
                    cfg.lambda_max,
                    cfg.lambda_min,
                ));
            }
            if kind == EquationType::QuadraticDrag && cfg.lambda_min == 0.0 && cfg.lambda_max == 0.0
            {
                return Err(EquationConfigError::ZeroLambdaQuadraticDrag);
            }
            Ok(Self {
                kind,
                g,
                size_type,
                land_type,
                r0,
                v0: Vec3::ZERO,
                w: [0.0, 0.0],
                lambda: 0.0,
                v_min: cfg.vmin,
                v_max: cfg.vmax,
                vertical_angle_rad: cfg.vertical_angle * PI / 180.0,
                w_max: cfg.wmax,
                lambda_min: cfg.lambda_min,
                lambda_max: cfg.lambda_max,
            })
        } else {
            if kind == EquationType::QuadraticDrag && cfg.lambda == 0.0 {
                return Err(EquationConfigError::ZeroLambdaQuadraticDrag);
            }
            Ok(Self {
                kind,
                g,
                size_type,
                land_type,
                r0,
                v0: Vec3::new(cfg.vx, cfg.vy, cfg.vz),
                w: [cfg.wx, cfg.wy],
                lambda: cfg.lambda,
                v_min: 0.0,
                v_max: 0.0,
                vertical_angle_rad: 0.0,
                w_max: 0.0,
                lambda_min: 0.0,
                lambda_max: 0.0,
            })
        }
    }
}

impl Equation {
    /// Draws a fresh `(lambda, v0, w)` for this trajectory from the
    /// configured ranges and resets horizontal position to the origin.
    ///
    /// Draw order is load-bearing: it must match the corpus this was
    /// distilled from exactly, or re-running the same RNG seed will no
    /// longer reproduce the same trajectory corpus. Order: lambda (skipped
    /// for [`EquationType::NoDrag`]), speed, bearing, wind speed, wind
    /// bearing.
    pub fn init_random(&mut self, rng: &mut impl Rng) {
        if self.kind.draws_lambda() {
            self.lambda = self.lambda_min + (self.lambda_max - self.lambda_min) * rng.random::<f64>();
        }

        let speed = self.v_min + (self.v_max - self.v_min) * rng.random::<f64>();
        let bearing = 2.0 * PI * rng.random::<f64>();

        self.r0.x = 0.0;
        self.r0.y = 0.0;

        let vz = speed * self.vertical_angle_rad.sin();
        let mut vy = speed * self.vertical_angle_rad.cos();
        let vx = vy * bearing.cos();
        vy *= bearing.sin();
        self.v0 = Vec3::new(vx, vy, vz);

        let wind_speed = self.w_max * rng.random::<f64>();
        let wind_bearing = 2.0 * PI * rng.random::<f64>();
        self.w = [wind_speed * wind_bearing.cos(), wind_speed * wind_bearing.sin()];
    }

    /// The exact right-hand side `d/dt (r, v) = (v, a(r, v, t))`, evaluated
    /// at the current session state. Counts one acceleration evaluation.
    pub fn acceleration(&self, v: Vec3, t: f64, session: &mut IntegrationSession) -> Vec3 {
        session.record_evaluation();
        match self.kind {
            EquationType::NoDrag => Vec3::new(0.0, 0.0, -self.g),
            EquationType::LinearDrag => Vec3::new(
                -self.lambda * (v.x - self.w[0]),
                -self.lambda * (v.y - self.w[1]),
                -self.g - self.lambda * v.z,
            ),
            EquationType::QuadraticDrag => {
                let (dx, dy) = (v.x - self.w[0], v.y - self.w[1]);
                Vec3::new(
                    -self.lambda * dx.abs() * dx,
                    -self.lambda * dy.abs() * dy,
                    -self.g - self.lambda * v.z.abs() * v.z,
                )
            }
            EquationType::ForcedDecay => {
                let elt = (-self.lambda * t).exp();
                Vec3::new(self.w[0] * elt, self.w[1] * elt, -self.g)
            }
        }
    }

    /// The closed-form `(r(t), v(t))` from the initial state, used as the
    /// convergence reference and for the first embedded RK stage's
    /// reference comparison.
    #[must_use]
    pub fn closed_form(&self, t: f64) -> (Vec3, Vec3) {
        match self.kind {
            EquationType::NoDrag => {
                let v = Vec3::new(self.v0.x, self.v0.y, self.v0.z - self.g * t);
                let r = Vec3::new(
                    self.r0.x + self.v0.x * t,
                    self.r0.y + self.v0.y * t,
                    self.r0.z + t * (self.v0.z - t * 0.5 * self.g),
                );
                (r, v)
            }
            EquationType::LinearDrag => self.closed_form_linear_drag(t),
            EquationType::QuadraticDrag => self.closed_form_quadratic_drag(t),
            EquationType::ForcedDecay => self.closed_form_forced_decay(t),
        }
    }

    fn closed_form_linear_drag(&self, t: f64) -> (Vec3, Vec3) {
        let (wx, wy) = (self.w[0], self.w[1]);
        let (dvx, dvy) = (self.v0.x - wx, self.v0.y - wy);
        let elt = (-self.lambda * t).exp();
        let v = Vec3::new(
            wx + dvx * elt,
            wy + dvy * elt,
            (self.v0.z + self.g / self.lambda) * elt - self.g / self.lambda,
        );
        let li = 1.0 / self.lambda;
        let gl = self.g * li;
        let k = li * (1.0 - elt);
        let r = Vec3::new(
            self.r0.x + wx * t + dvx * k,
            self.r0.y + wy * t + dvy * k,
            self.r0.z - gl * t + (self.v0.z + gl) * k,
        );
        (r, v)
    }

    fn closed_form_quadratic_drag(&self, t: f64) -> (Vec3, Vec3) {
        let (wx, wy) = (self.w[0], self.w[1]);
        let (dvx, dvy) = (self.v0.x - wx, self.v0.y - wy);
        let lt = self.lambda * t;
        let k0 = 1.0 + lt * dvx.abs();
        let k1 = 1.0 + lt * dvy.abs();
        let vx = wx + dvx / k0;
        let vy = wy + dvy / k1;
        let li = 1.0 / self.lambda;
        let rx = self.r0.x + wx * t + dvx.signum() * li * k0.ln();
        let ry = self.r0.y + wy * t + dvy.signum() * li * k1.ln();

        let gl = (self.g * self.lambda).sqrt();
        let g_l = (self.g / self.lambda).sqrt();
        let (vz, rz) = if self.v0.z <= 0.0 {
            let k0 = (gl * t).cosh();
            let k1 = (gl * t).sinh();
            let vz = g_l * (self.v0.z * k0 - g_l * k1) / (g_l * k0 - self.v0.z * k1);
            let rz = self.r0.z - li * (k0 - self.v0.z * k1 / g_l).ln();
            (vz, rz)
        } else {
            let alpha = (self.v0.z / g_l).atan();
            let tc = alpha / gl;
            if t <= tc {
                let glt = gl * t;
                let vz = g_l * (alpha - glt).tan();
                let rz = self.r0.z + li * ((alpha - glt).cos() / alpha.cos()).ln();
                (vz, rz)
            } else {
                let glt = gl * (t - tc);
                let vz = -g_l * glt.tanh();
                let rz = self.r0.z - li * (alpha.cos() * glt.cosh()).ln();
                (vz, rz)
            }
        };
        (Vec3::new(rx, ry, rz), Vec3::new(vx, vy, vz))
    }

    fn closed_form_forced_decay(&self, t: f64) -> (Vec3, Vec3) {
        let (wx, wy) = (self.w[0], self.w[1]);
        let li = 1.0 / self.lambda;
        let k = li * (1.0 - (-self.lambda * t).exp());
        let v = Vec3::new(
            self.v0.x + wx * k,
            self.v0.y + wy * k,
            self.v0.z - self.g * t,
        );
        let k2 = k * li;
        let r = Vec3::new(
            self.r0.x + (self.v0.x + wx * li) * t - wx * k2,
            self.r0.y + (self.v0.y + wy * li) * t - wy * k2,
            self.r0.z + t * (self.v0.z - t * 0.5 * self.g),
        );
        (r, v)
    }

    /// The integration step size for the next step, given the current
    /// velocity; only meaningful for [`SizeType::Stability`].
    #[must_use]
    pub fn step_size(&self, v: Vec3) -> f64 {
        match self.size_type {
            SizeType::Fixed(dt) => dt,
            SizeType::Stability(kt) => match self.kind {
                EquationType::LinearDrag => kt / self.lambda.abs(),
                EquationType::QuadraticDrag => {
                    let divisor = (v.x - self.w[0])
                        .abs()
                        .max((v.y - self.w[1]).abs())
                        .max(v.z.abs());
                    kt / (self.lambda.abs() * divisor)
                }
                _ => kt,
            },
        }
    }

    /// Checks whether the step from `t_old` landing-crosses the ground, and
    /// if so locates the exact impact time and back-propagates the session
    /// state to it.
    ///
    /// Returns `(t_landing_or_next, landed)`. On `landed == false` for
    /// [`LandType::FinalTime`], `dt` (the caller's tentative next step) is
    /// clipped in place to stop exactly at the final time.
    pub fn land(
        &self,
        session: &mut IntegrationSession,
        t_old: f64,
        dt: &mut f64,
    ) -> Result<(f64, bool), IntegrationError> {
        match self.land_type {
            LandType::FinalTime(tf) => {
                if t_old >= tf {
                    return Ok((t_old, true));
                }
                let t = t_old + *dt;
                if t >= tf {
                    *dt = tf - t_old;
                    return Ok((tf, false));
                }
                Ok((t, false))
            }
            LandType::Linear => {
                if session.r.z > 0.0 {
                    return Ok((t_old + *dt, false));
                }
                let h = session.r.z / session.v.z;
                session.r -= session.v * h;
                session.v -= session.a * h;
                Ok((t_old - h, true))
            }
            LandType::Quadratic => {
                if session.r.z > 0.0 {
                    return Ok((t_old + *dt, false));
                }
                let h = crate::quadratic_root(
                    0.5 * session.a.z,
                    -session.v.z,
                    session.r.z,
                    0.0,
                    *dt,
                );
                session.r -= (session.v - session.a * (0.5 * h)) * h;
                session.v -= session.a * h;
                Ok((t_old - h, true))
            }
            LandType::Cubic => {
                if session.r.z > 0.0 {
                    return Ok((t_old + *dt, false));
                }
                let jerk = (session.a - session.a_back) * (1.0 / *dt);
                let h = crate::cubic_root(
                    -jerk.z / 6.0,
                    0.5 * session.a.z,
                    -session.v.z,
                    session.r.z,
                    0.0,
                    *dt,
                );
                session.r -= (session.v - (session.a * 0.5 - jerk * (h / 6.0)) * h) * h;
                session.v -= (session.a - jerk * (0.5 * h)) * h;
                Ok((t_old - h, true))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng as _;

    fn cfg_no_drag() -> EquationConfig {
        EquationConfig {
            r#type: 0,
            z: 0.0,
            vz: 0.0,
            size_type: 0,
            dt: 0.01,
            land: 0,
            t: 5.0,
            g: Some(9.81),
            ..Default::default()
        }
    }

    #[test]
    fn no_drag_rejects_stability_step() {
        let mut cfg = cfg_no_drag();
        cfg.size_type = 1;
        let err = Equation::try_from(cfg).unwrap_err();
        assert_eq!(err, EquationConfigError::NoStabilityStep);
    }

    #[test]
    fn quadratic_drag_rejects_zero_lambda() {
        let mut cfg = cfg_no_drag();
        cfg.r#type = 2;
        cfg.lambda = 0.0;
        let err = Equation::try_from(cfg).unwrap_err();
        assert_eq!(err, EquationConfigError::ZeroLambdaQuadraticDrag);
    }

    #[test]
    fn free_fall_closed_form_matches_kinematics() {
        let eq = Equation::try_from(cfg_no_drag()).unwrap();
        let (r, v) = eq.closed_form(1.0);
        assert_relative_eq!(v.z, -9.81, epsilon = 1e-12);
        assert_relative_eq!(r.z, -0.5 * 9.81, epsilon = 1e-12);
    }

    #[test]
    fn random_init_skips_lambda_draw_for_no_drag() {
        let mut cfg = cfg_no_drag();
        cfg.random_init = true;
        cfg.vmin = 10.0;
        cfg.vmax = 20.0;
        cfg.vertical_angle = 45.0;
        cfg.wmax = 0.0;
        let mut eq = Equation::try_from(cfg).unwrap();
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(0);
        eq.init_random(&mut rng);
        assert_eq!(eq.lambda, 0.0);
    }

    #[test]
    fn random_init_draws_lambda_for_linear_drag() {
        let mut cfg = cfg_no_drag();
        cfg.r#type = 1;
        cfg.random_init = true;
        cfg.vmin = 10.0;
        cfg.vmax = 20.0;
        cfg.vertical_angle = 45.0;
        cfg.wmax = 1.0;
        cfg.lambda_min = 0.01;
        cfg.lambda_max = 0.02;
        let mut eq = Equation::try_from(cfg).unwrap();
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(0);
        eq.init_random(&mut rng);
        assert!(eq.lambda >= 0.01 && eq.lambda <= 0.02);
    }

    #[test]
    fn linear_land_locates_ground_behind_the_step() {
        let mut cfg = cfg_no_drag();
        cfg.land = 1;
        cfg.z = 1.0;
        cfg.vz = -1.0;
        let eq = Equation::try_from(cfg).unwrap();
        let mut session =
            IntegrationSession::new(Vec3::new(0.0, 0.0, -0.5), Vec3::new(0.0, 0.0, -1.0), Vec3::ZERO, false);
        let mut dt = 0.1;
        let (t, landed) = eq.land(&mut session, 1.5, &mut dt).unwrap();
        assert!(landed);
        assert_relative_eq!(session.r.z, 0.0, epsilon = 1e-12);
        assert_relative_eq!(t, 1.0, epsilon = 1e-12);
    }
}
