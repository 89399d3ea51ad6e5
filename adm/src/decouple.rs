//! Separation of distorted detail into restored and additive parts.
//!
//! For every detail coefficient the distorted value `t` is split against
//! the reference value `o`: the restored part is the reference scaled by
//! the clipped gain `t / o`, unless the (H, V) orientation of the distorted
//! detail lies within one degree of the reference orientation, in which
//! case the whole distorted coefficient counts as restored. The additive
//! part is what remains, so `restored + additive == distorted` always.

use crate::arena::Band;
use crate::consts::{DECOUPLE_ANGLE_DEG, DECOUPLE_EPS};

/// Fast reciprocal: 12-bit estimate refined by one Newton-Raphson step.
///
/// A portable stand-in for the hardware estimate: the exact reciprocal
/// truncated to 12 mantissa bits. It is deterministic across targets but
/// not bit-identical to x86 `rcpss`, which can differ by a few ulp after
/// the refinement step. Subnormal inputs and results are flushed the way
/// the approximate instruction does.
#[inline]
#[must_use]
pub fn rcp(x: f32) -> f32 {
    let xi = if x.is_subnormal() {
        f32::INFINITY.copysign(x)
    } else {
        let exact = 1.0 / x;
        if exact.is_subnormal() {
            0.0f32.copysign(x)
        } else {
            f32::from_bits(exact.to_bits() & 0xFFFF_F000)
        }
    };
    xi + xi * (1.0 - x * xi)
}

/// `n / d` through [`rcp`].
#[inline]
fn divs(n: f32, d: f32) -> f32 {
    n * rcp(d)
}

/// Clamps to `[0, 1]` with explicit comparisons so a NaN gain stays NaN.
#[inline]
#[allow(clippy::manual_clamp)]
fn clip_gain(k: f32) -> f32 {
    if k < 0.0 {
        0.0
    } else if k > 1.0 {
        1.0
    } else {
        k
    }
}

/// Squared cosine of the orientation tolerance, rounded once to `f32`.
fn cos_angle_sq() -> f32 {
    let c = DECOUPLE_ANGLE_DEG.to_radians().cos();
    (c * c) as f32
}

/// Splits the details of `distorted` into `restored` and `additive`.
///
/// Only the detail planes are read and written; the approximation planes
/// of all four bands are left untouched.
///
/// # Panics
/// Panics if the bands differ in size.
pub fn decouple(
    reference: &Band<'_>,
    distorted: &Band<'_>,
    restored: &mut Band<'_>,
    additive: &mut Band<'_>,
) {
    let (w, h) = (reference.width(), reference.height());
    for band in [distorted.width(), restored.width(), additive.width()] {
        assert_eq!(band, w, "decouple bands differ in width");
    }
    assert!(distorted.height() == h && restored.height() == h && additive.height() == h);

    let cos_1deg_sq = cos_angle_sq();

    for i in 0..h {
        let (o_h, o_v, o_d) = (reference.h.row(i), reference.v.row(i), reference.d.row(i));
        let (t_h, t_v, t_d) = (distorted.h.row(i), distorted.v.row(i), distorted.d.row(i));

        for j in 0..w {
            let (oh, ov, od) = (o_h[j], o_v[j], o_d[j]);
            let (th, tv, td) = (t_h[j], t_v[j], t_d[j]);

            let kh = clip_gain(divs(th, oh + DECOUPLE_EPS));
            let kv = clip_gain(divs(tv, ov + DECOUPLE_EPS));
            let kd = clip_gain(divs(td, od + DECOUPLE_EPS));

            let mut tmph = kh * oh;
            let mut tmpv = kv * ov;
            let mut tmpd = kd * od;

            let ot_dp = oh * th + ov * tv;
            let o_mag_sq = oh * oh + ov * ov;
            let t_mag_sq = th * th + tv * tv;

            let angle_flag = ot_dp >= 0.0 && ot_dp * ot_dp >= cos_1deg_sq * o_mag_sq * t_mag_sq;
            if angle_flag {
                tmph = th;
                tmpv = tv;
                tmpd = td;
            }

            restored.h.row_mut(i)[j] = tmph;
            restored.v.row_mut(i)[j] = tmpv;
            restored.d.row_mut(i)[j] = tmpd;

            additive.h.row_mut(i)[j] = th - tmph;
            additive.v.row_mut(i)[j] = tv - tmpv;
            additive.d.row_mut(i)[j] = td - tmpd;
        }
    }
}
