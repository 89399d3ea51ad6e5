//! Common test utilities for ADM tests.

#![allow(dead_code)]

pub mod generators;

use adm::{compute_adm, AdmParams, AdmScore};
use generators::luma_to_plane;

/// Scores two 8-bit luma frames with default parameters.
#[track_caller]
pub fn score_luma(reference: &[u8], distorted: &[u8], width: usize, height: usize) -> AdmScore {
    let r = luma_to_plane(reference, width, height);
    let d = luma_to_plane(distorted, width, height);
    compute_adm(r.as_view(), d.as_view(), &AdmParams::default()).expect("valid test input")
}
