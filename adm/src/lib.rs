//! # ADM
//!
//! The Additive Detail Measure is a full-reference video quality metric.
//! It decomposes reference and distorted luma with four levels of a
//! Daubechies-2 wavelet, separates distorted detail into a part that
//! restores reference detail and an additive artifact part, weights both
//! by a contrast sensitivity model and lets the artifacts mask the
//! restored detail. The score is the pooled masked restored detail over
//! the pooled reference detail.
//!
//! ## Score Range
//!
//! - 1.0: distorted detail matches the reference
//! - below 1.0: reference detail lost or masked by artifacts
//! - above 1.0 is possible when the distorted frame carries detail
//!   aligned with, but stronger than, the reference
//!
//! ## Example
//!
//! ```rust
//! use adm::{compute_adm, AdmParams, Plane};
//!
//! let reference = Plane::from_fn(64, 64, |x, y| ((x * 7 + y * 13) % 255) as f32);
//! let distorted = Plane::from_fn(64, 64, |x, y| reference.get(x, y) * 0.5 + 64.0);
//!
//! let same = compute_adm(reference.as_view(), reference.as_view(), &AdmParams::default())?;
//! assert_eq!(same.score, 1.0);
//!
//! let result = compute_adm(reference.as_view(), distorted.as_view(), &AdmParams::default())?;
//! assert!(result.score < 1.0);
//! # Ok::<(), adm::AdmError>(())
//! ```
//!
//! For video, open an [`AdmStream`] once and feed it frame pairs; it owns
//! every buffer so no frame allocates.
//!
//! ## Features
//!
//! - **`internals`**: Expose the pipeline stages for testing/benchmarking (unstable API)

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
// Filter taps and model tables keep their calibrated digits
#![allow(clippy::unreadable_literal)]
#![allow(clippy::excessive_precision)]
// mul_add would change rounding
#![allow(clippy::suboptimal_flops)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::needless_range_loop)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::imprecise_flops)]

// Internal modules - exposed with "internals" feature for testing/benchmarking
#[cfg(feature = "internals")]
pub mod consts;
#[cfg(not(feature = "internals"))]
pub(crate) mod consts;

#[cfg(feature = "internals")]
pub mod csf;
#[cfg(not(feature = "internals"))]
pub(crate) mod csf;

#[cfg(feature = "internals")]
pub mod decouple;
#[cfg(not(feature = "internals"))]
pub(crate) mod decouple;

#[cfg(feature = "internals")]
pub mod dwt;
#[cfg(not(feature = "internals"))]
pub(crate) mod dwt;

#[cfg(feature = "internals")]
pub mod mask;
#[cfg(not(feature = "internals"))]
pub(crate) mod mask;

#[cfg(feature = "internals")]
pub mod pool;
#[cfg(not(feature = "internals"))]
pub(crate) mod pool;

mod adm;
pub mod arena;
pub mod convert;
pub mod format;
pub mod image;
pub mod stream;

pub use arena::{ArenaLayout, ScratchArena};
pub use convert::{convert_plane, Sample};
pub use format::PixelFormat;
pub use image::{Plane, PlaneMut, PlaneRef};
pub use stream::{AdmStream, StreamSummary, VideoInfo};

// Re-export imgref types for convenience
pub use imgref::{Img, ImgRef, ImgVec};

use consts::{ADM_BORDER_FACTOR, MIN_DIMENSION, NUM_SCALES, REF_DISPLAY_HEIGHT, VIEW_DIST};
use thiserror::Error;

/// Error type for ADM operations.
///
/// Every error is raised before the per-frame pipeline starts; once inputs
/// are accepted, scoring cannot fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum AdmError {
    /// Frame is too small for four wavelet levels (minimum 9x9).
    #[error("image too small: {width}x{height} (minimum 9x9)")]
    ImageTooSmall { width: usize, height: usize },

    /// Reference and distorted dimensions differ.
    #[error("image dimensions don't match: {w1}x{h1} vs {w2}x{h2}")]
    DimensionMismatch {
        w1: usize,
        h1: usize,
        w2: usize,
        h2: usize,
    },

    /// A buffer size computed from the dimensions overflows.
    #[error("dimensions overflow buffer size: {width}x{height}")]
    DimensionOverflow { width: usize, height: usize },

    /// Row stride shorter than the row.
    #[error("stride {stride} is smaller than width {width}")]
    InvalidStride { width: usize, stride: usize },

    /// Sample buffer too short for its dimensions.
    #[error("buffer holds {actual} samples, {expected} required")]
    InvalidBufferSize { expected: usize, actual: usize },

    /// Scratch arena was sized for smaller frames.
    #[error("scratch arena too small: {required} bytes required, {actual} available")]
    ArenaTooSmall { required: usize, actual: usize },

    /// Reference and distorted pixel formats differ.
    #[error("pixel formats don't match: {reference} vs {distorted}")]
    FormatMismatch {
        reference: PixelFormat,
        distorted: PixelFormat,
    },

    /// Sample type too narrow for the stream's bit depth.
    #[error("{bits}-bit samples cannot hold {format} data")]
    SampleDepthMismatch { format: PixelFormat, bits: u32 },

    /// Parameter outside its valid range.
    #[error("invalid {name}: {value}")]
    InvalidParameter { name: &'static str, value: String },
}

/// ADM parameters.
///
/// Defaults reproduce the calibrated metric. Use the builder methods to
/// model other viewing conditions:
/// ```rust
/// use adm::AdmParams;
///
/// let params = AdmParams::new()
///     .with_view_distance(1.5)     // closer viewing
///     .with_display_height(2160.0) // 4K display
///     .with_sample_offset(-128.0); // center 8-bit samples
/// assert!(params.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AdmParams {
    view_distance: f32,
    display_height: f32,
    border_factor: f64,
    sample_offset: f32,
}

impl Default for AdmParams {
    fn default() -> Self {
        Self {
            view_distance: VIEW_DIST,
            display_height: REF_DISPLAY_HEIGHT,
            border_factor: ADM_BORDER_FACTOR,
            sample_offset: 0.0,
        }
    }
}

impl AdmParams {
    /// Creates a new `AdmParams` with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the viewing distance in multiples of the display height.
    #[must_use]
    pub fn with_view_distance(mut self, view_distance: f32) -> Self {
        self.view_distance = view_distance;
        self
    }

    /// Sets the display height in pixels used by the sensitivity model.
    #[must_use]
    pub fn with_display_height(mut self, display_height: f32) -> Self {
        self.display_height = display_height;
        self
    }

    /// Sets the fraction of each side excluded from pooling.
    #[must_use]
    pub fn with_border_factor(mut self, border_factor: f64) -> Self {
        self.border_factor = border_factor;
        self
    }

    /// Sets the value added to every integer sample during conversion.
    #[must_use]
    pub fn with_sample_offset(mut self, sample_offset: f32) -> Self {
        self.sample_offset = sample_offset;
        self
    }

    #[must_use]
    pub fn view_distance(&self) -> f32 {
        self.view_distance
    }

    #[must_use]
    pub fn display_height(&self) -> f32 {
        self.display_height
    }

    #[must_use]
    pub fn border_factor(&self) -> f64 {
        self.border_factor
    }

    #[must_use]
    pub fn sample_offset(&self) -> f32 {
        self.sample_offset
    }

    /// Display visual resolution (pixels per degree) of these conditions.
    #[must_use]
    pub fn display_resolution(&self) -> f32 {
        csf::display_resolution(self.view_distance, self.display_height)
    }

    /// Checks every parameter's range.
    ///
    /// # Errors
    /// Returns [`AdmError::InvalidParameter`] naming the first bad value.
    pub fn validate(&self) -> Result<(), AdmError> {
        let invalid = |name: &'static str, value: String| AdmError::InvalidParameter { name, value };
        if !(self.view_distance.is_finite() && self.view_distance > 0.0) {
            return Err(invalid("view distance", self.view_distance.to_string()));
        }
        if !(self.display_height.is_finite() && self.display_height > 0.0) {
            return Err(invalid("display height", self.display_height.to_string()));
        }
        if !(0.0..0.5).contains(&self.border_factor) {
            return Err(invalid("border factor", self.border_factor.to_string()));
        }
        if !self.sample_offset.is_finite() {
            return Err(invalid("sample offset", self.sample_offset.to_string()));
        }
        Ok(())
    }
}

/// Pooled sums of one wavelet level.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScaleScore {
    /// Pooled masked restored detail.
    pub num: f32,
    /// Pooled weighted reference detail.
    pub den: f32,
    /// Band width at this level.
    pub width: usize,
    /// Band height at this level.
    pub height: usize,
}

/// ADM result of one frame pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdmScore {
    /// `score_num / score_den`, or 1.0 when the denominator is zero.
    pub score: f64,
    /// Numerator summed over all levels, after the noise floor.
    pub score_num: f64,
    /// Denominator summed over all levels, after the noise floor.
    pub score_den: f64,
    /// Per-level sums, finest first.
    pub scales: [ScaleScore; NUM_SCALES],
}

impl AdmScore {
    /// Per-level `(num, den)` pairs flattened, finest level first.
    #[must_use]
    pub fn diagnostics(&self) -> [f64; 2 * NUM_SCALES] {
        let mut out = [0.0; 2 * NUM_SCALES];
        for (pair, scale) in out.chunks_exact_mut(2).zip(&self.scales) {
            pair[0] = f64::from(scale.num);
            pair[1] = f64::from(scale.den);
        }
        out
    }
}

/// Checks that two frames agree in size and are large enough.
pub(crate) fn validate_frames(
    (w1, h1): (usize, usize),
    (w2, h2): (usize, usize),
) -> Result<(usize, usize), AdmError> {
    if w1 != w2 || h1 != h2 {
        return Err(AdmError::DimensionMismatch { w1, h1, w2, h2 });
    }
    if w1 < MIN_DIMENSION || h1 < MIN_DIMENSION {
        return Err(AdmError::ImageTooSmall {
            width: w1,
            height: h1,
        });
    }
    Ok((w1, h1))
}

/// Computes ADM between two float luma planes.
///
/// Allocates a scratch arena for the call. For video, reuse one
/// [`ScratchArena`] through [`compute_adm_with_arena`] or use an
/// [`AdmStream`].
///
/// # Errors
/// Returns an error if:
/// - Plane dimensions don't match
/// - Planes are smaller than 9x9
/// - A parameter is out of range
pub fn compute_adm(
    reference: PlaneRef<'_>,
    distorted: PlaneRef<'_>,
    params: &AdmParams,
) -> Result<AdmScore, AdmError> {
    params.validate()?;
    let (width, height) = validate_frames(
        (reference.width(), reference.height()),
        (distorted.width(), distorted.height()),
    )?;
    let mut arena = ScratchArena::new(width, height)?;
    Ok(adm::compute_scales(reference, distorted, params, &mut arena))
}

/// Computes ADM using caller-owned scratch memory.
///
/// # Errors
/// As [`compute_adm`], plus [`AdmError::ArenaTooSmall`] if `arena` was
/// created for smaller frames.
pub fn compute_adm_with_arena(
    reference: PlaneRef<'_>,
    distorted: PlaneRef<'_>,
    params: &AdmParams,
    arena: &mut ScratchArena,
) -> Result<AdmScore, AdmError> {
    params.validate()?;
    let (width, height) = validate_frames(
        (reference.width(), reference.height()),
        (distorted.width(), distorted.height()),
    )?;
    arena.check_fits(width, height)?;
    Ok(adm::compute_scales(reference, distorted, params, arena))
}

/// Computes ADM between two integer luma images.
///
/// Samples are converted to float with the parameters' sample offset.
///
/// # Errors
/// As [`compute_adm`].
pub fn compute_adm_luma<T: Sample>(
    reference: ImgRef<'_, T>,
    distorted: ImgRef<'_, T>,
    params: &AdmParams,
) -> Result<AdmScore, AdmError> {
    params.validate()?;
    let (width, height) = validate_frames(
        (reference.width(), reference.height()),
        (distorted.width(), distorted.height()),
    )?;
    let mut ref_plane = Plane::new(width, height);
    let mut dist_plane = Plane::new(width, height);
    convert_plane(reference, params.sample_offset(), &mut ref_plane);
    convert_plane(distorted, params.sample_offset(), &mut dist_plane);
    compute_adm(ref_plane.as_view(), dist_plane.as_view(), params)
}
