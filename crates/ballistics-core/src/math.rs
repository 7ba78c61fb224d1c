//! Real roots of quadratics and cubics inside a bounded interval.
//!
//! Used by the landing detectors to invert `z(h) = 0` for the back-step `h`,
//! and nowhere else — callers guarantee a real root exists in `[x1, x2]`, so
//! none of these functions return `Option`.

/// Solves `x^2 + a*x + b = 0` for the root lying in `[x1, x2]`.
///
/// Prefers `-a/2 + sqrt(a^2/4 - b)`; falls back to the other root if the
/// preferred one falls outside the interval. No domain check is performed —
/// the caller guarantees at least one real root lies in `[x1, x2]`.
#[must_use]
pub fn quad_reduced(a: f64, b: f64, x1: f64, x2: f64) -> f64 {
    let a2 = -0.5 * a;
    let k = (a2 * a2 - b).sqrt();
    let x = a2 + k;
    if x < x1 || x > x2 { a2 - k } else { x }
}

/// Solves `a*x^2 + b*x + c = 0` for the root lying in `[x1, x2]`.
///
/// Degenerates to the linear solution `-c/b` when `a` is exactly zero.
#[must_use]
pub fn quadratic(a: f64, b: f64, c: f64, x1: f64, x2: f64) -> f64 {
    if a == 0.0 { -c / b } else { quad_reduced(b / a, c / a, x1, x2) }
}

/// Solves `x^3 + a*x^2 + b*x + c = 0` for the root lying in `[x1, x2]`.
///
/// Uses the trigonometric form when the discriminant is negative (three real
/// roots; tries the principal branch, then shifted by +-2*pi/3 until one
/// lands in the interval) and the Cardano form otherwise.
#[must_use]
pub fn cubic_reduced(a: f64, b: f64, c: f64, x1: f64, x2: f64) -> f64 {
    use core::f64::consts::PI;

    let a = a / 3.0;
    let mut k0 = a * a;
    let k1 = b / 3.0 - k0;
    k0 = (b * a - c) / 2.0 - a * k0;
    let disc = k1 * k1 * k1 + k0 * k0;

    if disc < 0.0 {
        let r = (-k1).sqrt();
        let theta = (k0 / (r * r * r)).acos() / 3.0;
        let r2 = 2.0 * r;
        let mut x = r2 * theta.cos() - a;
        if x < x1 || x > x2 {
            x = r2 * (theta + 2.0 * PI / 3.0).cos() - a;
            if x < x1 || x > x2 {
                x = r2 * (theta - 2.0 * PI / 3.0).cos() - a;
            }
        }
        x
    } else {
        let r = disc.sqrt();
        let hi = (k0 + r).cbrt();
        let lo = (k0 - r).cbrt();
        hi + lo - a
    }
}

/// Solves `a*x^3 + b*x^2 + c*x + d = 0` for the root lying in `[x1, x2]`.
///
/// Degenerates to [`quadratic`] when `a` is exactly zero.
#[must_use]
pub fn cubic(a: f64, b: f64, c: f64, d: f64, x1: f64, x2: f64) -> f64 {
    if a == 0.0 {
        quadratic(b, c, d, x1, x2)
    } else {
        cubic_reduced(b / a, c / a, d / a, x1, x2)
    }
}
