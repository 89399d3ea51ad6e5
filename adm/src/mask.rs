//! Contrast masking.
//!
//! The additive (artifact) energy of a neighbourhood raises the visibility
//! threshold of the restored detail at its centre. The threshold map is a
//! 3x3 weighted sum of absolute additive coefficients over all three
//! orientations; the restored detail is then soft-thresholded against it.

use crate::arena::Band;
use crate::consts::{CM_CENTER_WEIGHT, CM_NEIGHBOR_WEIGHT};
use crate::image::{reflect, PlaneMut, PlaneRef};

/// 3x3 masking kernel, row-major.
const CM_KERNEL: [[f32; 3]; 3] = [
    [CM_NEIGHBOR_WEIGHT, CM_NEIGHBOR_WEIGHT, CM_NEIGHBOR_WEIGHT],
    [CM_NEIGHBOR_WEIGHT, CM_CENTER_WEIGHT, CM_NEIGHBOR_WEIGHT],
    [CM_NEIGHBOR_WEIGHT, CM_NEIGHBOR_WEIGHT, CM_NEIGHBOR_WEIGHT],
];

/// Builds the masking threshold map from the weighted additive band.
///
/// Per row the orientations are accumulated in `H, V, D` order, each as a
/// complete 3x3 sum added onto the running threshold.
///
/// # Panics
/// Panics if `dst` differs in size from the band.
pub fn threshold(additive: &Band<'_>, dst: &mut PlaneMut<'_>) {
    let (w, h) = (additive.width(), additive.height());
    assert_eq!((dst.width(), dst.height()), (w, h));
    let details = additive.details();

    for i in 0..h {
        let out = dst.row_mut(i);
        out.fill(0.0);
        for src in &details {
            let rows: [&[f32]; 3] =
                std::array::from_fn(|k| src.row(reflect(i as isize - 1 + k as isize, h)));
            accumulate_row(&rows, out);
        }
    }
}

/// Adds one orientation's 3x3 neighbourhood sums to a threshold row.
#[multiversion::multiversion(targets(
    "x86_64+avx512f+avx512bw+avx512cd+avx512dq+avx512vl+avx+avx2+bmi1+bmi2+cmpxchg16b+f16c+fma+fxsr+lzcnt+movbe+popcnt+sse+sse2+sse3+sse4.1+sse4.2+ssse3+xsave",
    "x86_64+avx+avx2+bmi1+bmi2+cmpxchg16b+f16c+fma+fxsr+lzcnt+movbe+popcnt+sse+sse2+sse3+sse4.1+sse4.2+ssse3+xsave",
    "x86_64+cmpxchg16b+fxsr+popcnt+sse+sse2+sse3+sse4.1+sse4.2+ssse3",
))]
fn accumulate_row(rows: &[&[f32]; 3], out: &mut [f32]) {
    let w = out.len();
    for (j, acc) in out.iter_mut().enumerate() {
        let cols = [
            reflect(j as isize - 1, w),
            j,
            reflect(j as isize + 1, w),
        ];
        let mut sum = 0.0f32;
        for (row, kernel_row) in rows.iter().zip(&CM_KERNEL) {
            for (&col, &coeff) in cols.iter().zip(kernel_row) {
                sum += coeff * row[col].abs();
            }
        }
        *acc += sum;
    }
}

/// Soft-thresholds the restored band: `max(|x| - thr, 0)` per detail.
///
/// # Panics
/// Panics if the planes differ in size.
pub fn apply(restored: &Band<'_>, thresh: PlaneRef<'_>, dst: &mut Band<'_>) {
    let (w, h) = (restored.width(), restored.height());
    assert_eq!((thresh.width(), thresh.height()), (w, h));
    assert_eq!((dst.width(), dst.height()), (w, h));

    for (src, dst) in restored.details().into_iter().zip(dst.details_mut()) {
        for y in 0..h {
            let thr = thresh.row(y);
            for ((out, &x), &t) in dst.row_mut(y).iter_mut().zip(src.row(y)).zip(thr) {
                let v = x.abs() - t;
                *out = if v < 0.0 { 0.0 } else { v };
            }
        }
    }
}
