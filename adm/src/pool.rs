//! Spatial pooling and the final score reduction.

use crate::consts::{NUMDEN_LIMIT, NUMDEN_REF_AREA, POOL_AREA_DIVISOR};

/// Pooling window after removing `border_factor` of each side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolRegion {
    pub left: usize,
    pub top: usize,
    pub right: usize,
    pub bottom: usize,
}

impl PoolRegion {
    /// Window of a `width x height` plane.
    ///
    /// Border widths are truncated toward zero, so narrow planes keep
    /// every column.
    #[must_use]
    pub fn new(width: usize, height: usize, border_factor: f64) -> Self {
        let left = border(width, border_factor);
        let top = border(height, border_factor);
        Self {
            left,
            top,
            right: width - left,
            bottom: height - top,
        }
    }

    /// Number of samples inside the window.
    #[must_use]
    pub fn area(&self) -> usize {
        (self.bottom - self.top) * (self.right - self.left)
    }
}

#[inline]
fn border(n: usize, border_factor: f64) -> usize {
    // as-cast truncates toward zero and saturates negatives at 0
    (n as f64 * border_factor - 0.5) as usize
}

/// Lp (p = 3) norm of a detail plane over the pooling window, plus a
/// stabilizer that depends only on the window area.
///
/// `rows` yields the plane's rows; only the window is read.
#[must_use]
pub fn sum_cube<'a>(
    rows: impl Fn(usize) -> &'a [f32],
    width: usize,
    height: usize,
    border_factor: f64,
) -> f32 {
    let region = PoolRegion::new(width, height, border_factor);
    let mut sum = 0.0f32;
    for y in region.top..region.bottom {
        for &v in &rows(y)[region.left..region.right] {
            let val = v.abs();
            sum += val * val * val;
        }
    }
    let exponent = (1.0f64 / 3.0) as f32;
    let stabilizer = (region.area() as f64 / POOL_AREA_DIVISOR) as f32;
    sum.powf(exponent) + stabilizer.powf(exponent)
}

/// Noise floor below which summed numerator/denominator count as zero.
#[must_use]
pub fn numden_limit(width: usize, height: usize) -> f64 {
    NUMDEN_LIMIT * (width as f64 * height as f64) / NUMDEN_REF_AREA
}

/// Reduced numerator, denominator and score of a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reduction {
    pub num: f64,
    pub den: f64,
    pub score: f64,
}

/// Applies the noise floor and forms `num / den`.
///
/// A zero denominator (after flooring) yields a score of exactly `1.0`.
#[must_use]
pub fn finalize(num: f64, den: f64, limit: f64) -> Reduction {
    let num = if num < limit { 0.0 } else { num };
    let den = if den < limit { 0.0 } else { den };
    let score = if den == 0.0 { 1.0 } else { num / den };
    Reduction { num, den, score }
}
