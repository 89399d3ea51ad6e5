//! Contrast sensitivity weighting of wavelet detail bands.
//!
//! Each detail coefficient is divided by the visibility threshold of its
//! level and orientation, taken from the 7/9 wavelet quantization model
//! (Watson et al.). Only the luma threshold row is used.

use wide::f32x8;

use crate::arena::Band;
use crate::consts::{
    DwtModelParams, DWT_7_9_BASIS_FUNCTION_AMPLITUDES, DWT_7_9_Y_THRESHOLD, NUM_SCALES, THETA_D,
    THETA_HV,
};

/// Display visual resolution in pixels per degree of visual angle.
///
/// About 56.55 for a 1080-line display viewed from three picture heights.
#[must_use]
pub fn display_resolution(view_distance: f32, display_height: f32) -> f32 {
    (f64::from(view_distance) * f64::from(display_height) * std::f64::consts::PI / 180.0) as f32
}

/// Quantization step of level `lambda` (0 = finest) and orientation `theta`.
///
/// `r` is the display resolution from [`display_resolution`].
///
/// # Panics
/// Panics if `lambda >= 4` or `theta >= 4`.
#[must_use]
pub fn quant_step(params: &DwtModelParams, lambda: usize, theta: usize, r: f32) -> f32 {
    let temp = (2.0f64.powi(lambda as i32 + 1) * f64::from(params.f0) * f64::from(params.g[theta])
        / f64::from(r))
    .log10() as f32;
    let q = 2.0 * f64::from(params.a) * 10.0f64.powf(f64::from(params.k * temp * temp))
        / f64::from(DWT_7_9_BASIS_FUNCTION_AMPLITUDES[lambda][theta]);
    q as f32
}

/// Reciprocal thresholds applied at one decomposition level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CsfWeights {
    /// Weight of the horizontal and vertical detail bands.
    pub hv: f32,
    /// Weight of the diagonal detail band.
    pub d: f32,
}

impl CsfWeights {
    /// Weights for level `scale` under the given viewing conditions.
    #[must_use]
    pub fn new(scale: usize, view_distance: f32, display_height: f32) -> Self {
        let r = display_resolution(view_distance, display_height);
        let params = &DWT_7_9_Y_THRESHOLD;
        Self {
            hv: (1.0 / f64::from(quant_step(params, scale, THETA_HV, r))) as f32,
            d: (1.0 / f64::from(quant_step(params, scale, THETA_D, r))) as f32,
        }
    }

    /// Weights of all levels, finest first.
    #[must_use]
    pub fn all(view_distance: f32, display_height: f32) -> [Self; NUM_SCALES] {
        std::array::from_fn(|scale| Self::new(scale, view_distance, display_height))
    }

    /// Weights in `[H, V, D]` order.
    #[inline]
    #[must_use]
    pub fn per_band(&self) -> [f32; 3] {
        [self.hv, self.hv, self.d]
    }
}

/// Writes the weighted detail planes of `src` into `dst`.
///
/// # Panics
/// Panics if the bands differ in size.
pub fn apply(src: &Band<'_>, dst: &mut Band<'_>, weights: &CsfWeights) {
    assert_eq!((src.width(), src.height()), (dst.width(), dst.height()));
    let height = src.height();
    for ((src, dst), factor) in src
        .details()
        .into_iter()
        .zip(dst.details_mut())
        .zip(weights.per_band())
    {
        for y in 0..height {
            scale_row(src.row(y), dst.row_mut(y), factor);
        }
    }
}

/// `dst = factor * src`, eight lanes at a time.
#[inline]
fn scale_row(src: &[f32], dst: &mut [f32], factor: f32) {
    let splat = f32x8::splat(factor);
    let mut src_chunks = src.chunks_exact(8);
    let mut dst_chunks = dst.chunks_exact_mut(8);
    for (s, d) in (&mut src_chunks).zip(&mut dst_chunks) {
        let arr: [f32; 8] = s.try_into().unwrap();
        let out: [f32; 8] = (f32x8::from(arr) * splat).into();
        d.copy_from_slice(&out);
    }
    for (s, d) in src_chunks
        .remainder()
        .iter()
        .zip(dst_chunks.into_remainder())
    {
        *d = factor * s;
    }
}
