//! One level of the separable Daubechies-2 wavelet analysis.
//!
//! Each output row is produced in two stages: a vertical pass over four
//! reflected input rows into the `temp_lo`/`temp_hi` row buffers, then two
//! horizontal decimating passes over those rows. Summation order matches
//! the reference filter tap-for-tap so scores are reproducible.

use crate::arena::Band;
use crate::consts::{DWT2_DB2_COEFFS_HI, DWT2_DB2_COEFFS_LO};
use crate::image::{half_size, reflect, PlaneRef};

const FILT_W: usize = DWT2_DB2_COEFFS_LO.len();

/// Decomposes `src` into `dst` at half resolution.
///
/// `dst` planes must already be sized `((w+1)/2) x ((h+1)/2)`; the
/// temporary rows must hold at least `w` samples.
///
/// # Panics
/// Panics if `dst` or the temporary rows have the wrong size.
pub fn dwt2(src: PlaneRef<'_>, dst: &mut Band<'_>, temp_lo: &mut [f32], temp_hi: &mut [f32]) {
    let w = src.width();
    let h = src.height();
    let out_w = half_size(w);
    let out_h = half_size(h);
    assert_eq!((dst.width(), dst.height()), (out_w, out_h));
    let temp_lo = &mut temp_lo[..w];
    let temp_hi = &mut temp_hi[..w];

    for i in 0..out_h {
        let rows: [&[f32]; FILT_W] =
            std::array::from_fn(|k| src.row(reflect(2 * i as isize - 1 + k as isize, h)));
        vertical_pass(&rows, temp_lo, temp_hi);

        // low vertical -> approximation / vertical detail
        horizontal_pass(temp_lo, dst.a.row_mut(i), dst.v.row_mut(i));
        // high vertical -> horizontal detail / diagonal detail
        horizontal_pass(temp_hi, dst.h.row_mut(i), dst.d.row_mut(i));
    }
}

/// Filters four input rows column-wise into one low and one high row.
#[multiversion::multiversion(targets(
    "x86_64+avx512f+avx512bw+avx512cd+avx512dq+avx512vl+avx+avx2+bmi1+bmi2+cmpxchg16b+f16c+fma+fxsr+lzcnt+movbe+popcnt+sse+sse2+sse3+sse4.1+sse4.2+ssse3+xsave",
    "x86_64+avx+avx2+bmi1+bmi2+cmpxchg16b+f16c+fma+fxsr+lzcnt+movbe+popcnt+sse+sse2+sse3+sse4.1+sse4.2+ssse3+xsave",
    "x86_64+cmpxchg16b+fxsr+popcnt+sse+sse2+sse3+sse4.1+sse4.2+ssse3",
))]
fn vertical_pass(rows: &[&[f32]; FILT_W], temp_lo: &mut [f32], temp_hi: &mut [f32]) {
    for (j, (lo, hi)) in temp_lo.iter_mut().zip(temp_hi.iter_mut()).enumerate() {
        let mut sum_lo = 0.0f32;
        let mut sum_hi = 0.0f32;
        for k in 0..FILT_W {
            let img_coeff = rows[k][j];
            sum_lo += DWT2_DB2_COEFFS_LO[k] * img_coeff;
            sum_hi += DWT2_DB2_COEFFS_HI[k] * img_coeff;
        }
        *lo = sum_lo;
        *hi = sum_hi;
    }
}

/// Filters and decimates one row into its low and high halves.
fn horizontal_pass(src: &[f32], out_lo: &mut [f32], out_hi: &mut [f32]) {
    let w = src.len();
    for (j, (lo, hi)) in out_lo.iter_mut().zip(out_hi.iter_mut()).enumerate() {
        let mut sum_lo = 0.0f32;
        let mut sum_hi = 0.0f32;
        for k in 0..FILT_W {
            let img_coeff = src[reflect(2 * j as isize - 1 + k as isize, w)];
            sum_lo += DWT2_DB2_COEFFS_LO[k] * img_coeff;
            sum_hi += DWT2_DB2_COEFFS_HI[k] * img_coeff;
        }
        *lo = sum_lo;
        *hi = sum_hi;
    }
}
