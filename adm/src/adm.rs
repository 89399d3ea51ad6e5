//! Four-level ADM driver.
//!
//! Runs the wavelet analysis of both frames level by level, feeding each
//! level's approximation band into the next, and pools the masked restored
//! detail (numerator) against the weighted reference detail (denominator).

use crate::arena::ScratchArena;
use crate::consts::NUM_SCALES;
use crate::csf::{self, CsfWeights};
use crate::decouple::decouple;
use crate::dwt::dwt2;
use crate::image::{half_size, PlaneRef};
use crate::mask;
use crate::pool::{finalize, numden_limit, sum_cube};
use crate::{AdmParams, AdmScore, ScaleScore};

/// Computes the score of one frame pair.
///
/// Inputs must already be validated: equal sizes of at least
/// [`MIN_DIMENSION`](crate::consts::MIN_DIMENSION) and an arena that fits.
pub(crate) fn compute_scales(
    reference: PlaneRef<'_>,
    distorted: PlaneRef<'_>,
    params: &AdmParams,
    arena: &mut ScratchArena,
) -> AdmScore {
    let (mut w, mut h) = (reference.width(), reference.height());
    let limit = numden_limit(w, h);
    let weights = CsfWeights::all(params.view_distance(), params.display_height());
    let border_factor = params.border_factor();

    let mut ws = arena.workspace(w, h);
    let mut scales = [ScaleScore::default(); NUM_SCALES];
    let mut num = 0.0f64;
    let mut den = 0.0f64;

    for (scale, weights) in weights.iter().enumerate() {
        let (bw, bh) = (half_size(w), half_size(h));
        ws.resize_bands(bw, bh);

        if scale == 0 {
            dwt2(reference, &mut ws.ref_dwt, ws.temp_lo, ws.temp_hi);
            dwt2(distorted, &mut ws.main_dwt, ws.temp_lo, ws.temp_hi);
        } else {
            dwt2(ws.ref_scale.as_view(), &mut ws.ref_dwt, ws.temp_lo, ws.temp_hi);
            dwt2(ws.main_scale.as_view(), &mut ws.main_dwt, ws.temp_lo, ws.temp_hi);
        }
        w = bw;
        h = bh;

        decouple(&ws.ref_dwt, &ws.main_dwt, &mut ws.decouple_r, &mut ws.decouple_a);

        csf::apply(&ws.ref_dwt, &mut ws.csf_o, weights);
        csf::apply(&ws.decouple_r, &mut ws.csf_r, weights);
        csf::apply(&ws.decouple_a, &mut ws.csf_a, weights);

        mask::threshold(&ws.csf_a, &mut ws.mta);
        mask::apply(&ws.csf_r, ws.mta.as_view(), &mut ws.cm_r);

        let mut num_scale = 0.0f32;
        for band in ws.cm_r.details() {
            num_scale += sum_cube(|y| band.row(y), w, h, border_factor);
        }
        let mut den_scale = 0.0f32;
        for band in ws.csf_o.details() {
            den_scale += sum_cube(|y| band.row(y), w, h, border_factor);
        }
        num += f64::from(num_scale);
        den += f64::from(den_scale);

        ws.ref_scale.resize(w, h);
        ws.ref_scale.copy_from(ws.ref_dwt.a.as_view());
        ws.main_scale.resize(w, h);
        ws.main_scale.copy_from(ws.main_dwt.a.as_view());

        tracing::trace!(scale, width = w, height = h, num_scale, den_scale, "ADM scale");
        scales[scale] = ScaleScore {
            num: num_scale,
            den: den_scale,
            width: w,
            height: h,
        };
    }

    let reduced = finalize(num, den, limit);
    if (num > 0.0 && reduced.num == 0.0) || (den > 0.0 && reduced.den == 0.0) {
        tracing::warn!(num, den, limit, "ADM sum below noise floor, treated as zero");
    }

    AdmScore {
        score: reduced.score,
        score_num: reduced.num,
        score_den: reduced.den,
        scales,
    }
}
