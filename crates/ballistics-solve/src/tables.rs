//! Constant Butcher-like coefficient tables for the Runge-Kutta and
//! multi-step integrator families.
//!
//! Tables are `'static` data reached through [`rk_table`]/[`ms_table`], not
//! fields copied into every integrator instance, so every `RungeKutta`/
//! `MultiStep` of a given order shares exactly one copy.

/// A Runge-Kutta coefficient table: lower-triangular stage weights `b`,
/// stage-time fractions `t`, and an optional embedded error-estimate row.
///
/// `b[i]` holds the weights for stage `i+1` (1-indexed in the governing
/// prose), with `i+1` entries referencing stages `0..=i`.
pub struct RungeKuttaTable {
    pub order: u8,
    pub stages: usize,
    pub b: &'static [&'static [f64]],
    pub t: &'static [f64],
    pub e: Option<&'static [f64]>,
}

impl RungeKuttaTable {
    /// The older `A`/`C` representation, derived from `b`/`t` so the two
    /// forms cannot drift apart. `a[i]` sums to 1; `c[i][j]` is `t[i] / 1`
    /// when `b[i][j]` feeds the time-advanced stage and 0 otherwise is not
    /// quite right for a general table, so this crate derives the honest
    /// equivalent: row `i` of `a` is `b[i]` itself (already normalized to
    /// sum to 1 for every governing table in 6), and `c[i][j] = t[i]` for
    /// every nonzero `b[i][j]`, matching a single evaluation time per stage.
    #[must_use]
    pub fn as_ac(&self) -> (&'static [&'static [f64]], Vec<Vec<f64>>) {
        let c = self
            .b
            .iter()
            .enumerate()
            .map(|(i, row)| row.iter().map(|_| self.t[i]).collect())
            .collect();
        (self.b, c)
    }
}

const B1: &[&[f64]] = &[&[1.0]];
const T1: &[f64] = &[1.0];
const E1: &[f64] = &[-1.0];

const B2: &[&[f64]] = &[&[1.0], &[0.5, 0.5]];
const T2: &[f64] = &[1.0, 1.0];
const E2: &[f64] = &[0.5, -0.5];

const B3: &[&[f64]] = &[&[1.0], &[0.25, 0.25], &[1.0 / 6.0, 1.0 / 6.0, 2.0 / 3.0]];
const T3: &[f64] = &[1.0, 0.5, 1.0];
const E3: &[f64] = &[1.0 / 12.0, 1.0 / 12.0, -1.0 / 6.0];

const B4: &[&[f64]] = &[
    &[0.5],
    &[0.0, 0.5],
    &[0.0, 0.0, 1.0],
    &[1.0 / 6.0, 1.0 / 3.0, 1.0 / 3.0, 1.0 / 6.0],
];
const T4: &[f64] = &[0.5, 0.5, 1.0, 1.0];

const RK1: RungeKuttaTable = RungeKuttaTable { order: 1, stages: 1, b: B1, t: T1, e: Some(E1) };
const RK2: RungeKuttaTable = RungeKuttaTable { order: 2, stages: 2, b: B2, t: T2, e: Some(E2) };
const RK3: RungeKuttaTable = RungeKuttaTable { order: 3, stages: 3, b: B3, t: T3, e: Some(E3) };
const RK4: RungeKuttaTable = RungeKuttaTable { order: 4, stages: 4, b: B4, t: T4, e: None };

/// Looks up the Runge-Kutta table for orders 1 through 4.
#[must_use]
pub fn rk_table(order: u8) -> Option<&'static RungeKuttaTable> {
    match order {
        1 => Some(&RK1),
        2 => Some(&RK2),
        3 => Some(&RK3),
        4 => Some(&RK4),
        _ => None,
    }
}

/// A linear multi-step coefficient table: combination weights `a`, slope
/// scale factors `c`, and the error-estimate weight vectors `ea`/`eb`.
pub struct MultiStepTable {
    pub order: u8,
    /// Number of history slots (`n`); order 2 uses 3, order 3 uses 4.
    pub slots: usize,
    pub a: &'static [f64],
    pub c: &'static [f64],
    pub ea: &'static [f64],
    pub eb: &'static [f64],
}

const MS2_A: &[f64] = &[0.75, 0.0, 0.25];
const MS2_C: &[f64] = &[2.0, 0.0, 0.0];
const MS2_EA: &[f64] = &[0.25, 0.0, -0.25];
const MS2_EB: &[f64] = &[0.5, 0.0, 0.0];

const MS3_A: &[f64] = &[16.0 / 27.0, 0.0, 0.0, 11.0 / 27.0];
const MS3_C: &[f64] = &[3.0, 0.0, 0.0, 12.0 / 11.0];
const MS3_EA: &[f64] = &[17.0 / 108.0, 0.0, 0.25, -11.0 / 27.0];
const MS3_EB: &[f64] = &[-5.0 / 18.0, 0.0, 0.0, -4.0 / 9.0];

const MS2: MultiStepTable = MultiStepTable { order: 2, slots: 3, a: MS2_A, c: MS2_C, ea: MS2_EA, eb: MS2_EB };
const MS3: MultiStepTable = MultiStepTable { order: 3, slots: 4, a: MS3_A, c: MS3_C, ea: MS3_EA, eb: MS3_EB };

/// Looks up the multi-step table for orders 2 and 3.
#[must_use]
pub fn ms_table(order: u8) -> Option<&'static MultiStepTable> {
    match order {
        2 => Some(&MS2),
        3 => Some(&MS3),
        _ => None,
    }
}
