//! Trace Resampling
//!
//! Aligns two independently sampled `(x, y)` traces onto a common x-grid so they can be
//! compared point by point.
//!
//! # Algorithm
//!
//! The trace with more samples is the reference grid and is returned unchanged. For each
//! reference x a cursor advances monotonically over the sparser trace until the pair
//! `x[j] <= x < x[j + 1]` brackets it, and the sparser trace is evaluated on the straight
//! line through the two bracketing points:
//!
//! ```text
//! A = (y_a - y_b) / (x_a - x_b)    (A = 0 if x_a == x_b)
//! B = y_a - A * x_a
//! y = A * x + B
//! ```
//!
//! Knots are reproduced exactly and values beyond either end are extrapolated from the
//! outermost pair. Both x sequences must be non-decreasing.

use serde::{Deserialize, Serialize};

use super::error::SimulationError;

/// Which input trace supplied the common grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reference {
    First,
    Second,
}

/// Two traces expressed over the same x-values, in input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResampledTraces {
    pub x: Vec<f64>,
    pub first: Vec<f64>,
    pub second: Vec<f64>,
    pub reference: Reference,
}

/// Straight line through two points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearSegment {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearSegment {
    /// Line through `(xa, ya)` and `(xb, yb)`. Coinciding x-values give a flat line
    /// through `ya`.
    pub fn through(xa: f64, ya: f64, xb: f64, yb: f64) -> Self {
        let slope = if xa == xb { 0.0 } else { (ya - yb) / (xa - xb) };

        Self {
            slope,
            intercept: ya - slope * xa,
        }
    }

    pub fn eval(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Resamples the sparser of two traces onto the x-values of the denser one.
///
/// # Arguments
///
/// * `x1`, `y1` - First trace
/// * `x2`, `y2` - Second trace
///
/// # Returns
///
/// Both traces over the reference grid. On equal length the second trace is the
/// reference.
///
/// # Errors
///
/// * [`SimulationError::LengthMismatch`] - a trace has different numbers of x and y values
/// * [`SimulationError::NoDataForInterpolation`] - a trace is empty
pub fn interpolate_traces(
    x1: &[f64],
    y1: &[f64],
    x2: &[f64],
    y2: &[f64],
) -> Result<ResampledTraces, SimulationError> {
    check_trace(x1, y1)?;
    check_trace(x2, y2)?;

    if x1.len() > x2.len() {
        Ok(ResampledTraces {
            x: x1.to_vec(),
            first: y1.to_vec(),
            second: resample(x2, y2, x1)?,
            reference: Reference::First,
        })
    } else {
        Ok(ResampledTraces {
            x: x2.to_vec(),
            first: resample(x1, y1, x2)?,
            second: y2.to_vec(),
            reference: Reference::Second,
        })
    }
}

/// Evaluates the piecewise linear interpolant of `(xs, ys)` at every point of `grid`.
///
/// A single sample is treated as a constant. `grid` is walked with a monotone cursor, so
/// it should be non-decreasing; unordered grids still get correct values, only slower.
pub fn resample(xs: &[f64], ys: &[f64], grid: &[f64]) -> Result<Vec<f64>, SimulationError> {
    check_trace(xs, ys)?;

    if xs.len() == 1 {
        return Ok(vec![ys[0]; grid.len()]);
    }

    let last_pair = xs.len() - 2;
    let mut j = 0;
    let mut previous = f64::NEG_INFINITY;

    let values = grid
        .iter()
        .map(|&x| {
            if x < previous {
                j = 0;
            }
            previous = x;

            while j < last_pair && xs[j + 1] <= x {
                j += 1;
            }

            let (xa, ya, xb, yb) = (xs[j], ys[j], xs[j + 1], ys[j + 1]);
            if x == xa {
                ya
            } else if x == xb {
                yb
            } else {
                LinearSegment::through(xa, ya, xb, yb).eval(x)
            }
        })
        .collect();

    Ok(values)
}

/// Index of the sample at `t`, or of the last sample before it.
///
/// Returns `None` when `t` lies before the first or after the last time point.
pub fn time_to_index(times: &[f64], t: f64) -> Option<usize> {
    let i = times.partition_point(|&x| x < t);

    match times.get(i) {
        Some(&x) if x == t => Some(i),
        Some(_) if i > 0 => Some(i - 1),
        _ => None,
    }
}

fn check_trace(x: &[f64], y: &[f64]) -> Result<(), SimulationError> {
    if x.len() != y.len() {
        return Err(SimulationError::LengthMismatch {
            x: x.len(),
            y: y.len(),
        });
    }
    if x.is_empty() {
        return Err(SimulationError::NoDataForInterpolation);
    }

    Ok(())
}
