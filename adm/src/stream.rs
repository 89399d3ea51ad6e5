//! Stream-scoped ADM context.
//!
//! A stream fixes frame size, pixel format and parameters at open time and
//! owns every buffer the per-frame pipeline needs. Frames are then scored
//! one pair at a time while a running average is kept.
//!
//! # Example
//!
//! ```
//! use adm::{AdmParams, AdmStream, Img, PixelFormat, VideoInfo};
//!
//! let info = VideoInfo::new(32, 32, PixelFormat::Yuv420p);
//! let mut stream = AdmStream::open(info, info, AdmParams::default())?;
//!
//! let luma: Vec<u8> = (0..32 * 32).map(|i| (i * 7 % 251) as u8).collect();
//! for _ in 0..3 {
//!     let frame = Img::new(luma.as_slice(), 32, 32);
//!     let score = stream.process(frame, frame)?;
//!     assert_eq!(score.score, 1.0);
//! }
//! let summary = stream.finish();
//! assert_eq!(summary.frames, 3);
//! # Ok::<(), adm::AdmError>(())
//! ```

use imgref::ImgRef;

use crate::arena::ScratchArena;
use crate::convert::{convert_plane, Sample};
use crate::format::PixelFormat;
use crate::image::{Plane, PlaneRef};
use crate::{adm, validate_frames, AdmError, AdmParams, AdmScore};

/// Geometry and format of one input stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoInfo {
    pub width: usize,
    pub height: usize,
    pub format: PixelFormat,
}

impl VideoInfo {
    #[must_use]
    pub fn new(width: usize, height: usize, format: PixelFormat) -> Self {
        Self {
            width,
            height,
            format,
        }
    }
}

/// Aggregate of all frames scored by a stream.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StreamSummary {
    /// Frames scored.
    pub frames: u64,
    /// Mean score, 0 when no frame was scored.
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

/// Per-stream ADM state: converted planes, scratch arena and accumulator.
#[derive(Debug)]
pub struct AdmStream {
    info: VideoInfo,
    params: AdmParams,
    arena: ScratchArena,
    reference: Plane,
    distorted: Plane,
    score_sum: f64,
    min: f64,
    max: f64,
    frames: u64,
}

impl AdmStream {
    /// Opens a stream for two inputs of identical geometry and format.
    ///
    /// # Errors
    /// Returns [`AdmError::DimensionMismatch`] or [`AdmError::FormatMismatch`]
    /// when the inputs disagree, [`AdmError::ImageTooSmall`] below 9x9,
    /// [`AdmError::InvalidParameter`] for bad parameters and
    /// [`AdmError::DimensionOverflow`] if the buffers cannot be sized.
    pub fn open(
        reference: VideoInfo,
        distorted: VideoInfo,
        params: AdmParams,
    ) -> Result<Self, AdmError> {
        params.validate()?;
        if reference.format != distorted.format {
            return Err(AdmError::FormatMismatch {
                reference: reference.format,
                distorted: distorted.format,
            });
        }
        let (width, height) = validate_frames(
            (reference.width, reference.height),
            (distorted.width, distorted.height),
        )?;

        let arena = ScratchArena::new(width, height)?;
        tracing::debug!(
            width,
            height,
            format = %reference.format,
            arena_bytes = arena.layout().total_bytes(),
            "ADM stream opened"
        );

        Ok(Self {
            info: reference,
            params,
            arena,
            reference: Plane::new(width, height),
            distorted: Plane::new(width, height),
            score_sum: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            frames: 0,
        })
    }

    /// Scores one pair of integer luma frames.
    ///
    /// Samples are converted with the configured sample offset.
    ///
    /// # Errors
    /// Returns [`AdmError::DimensionMismatch`] if a frame does not match the
    /// stream geometry, or [`AdmError::SampleDepthMismatch`] if `T` is too
    /// narrow for the stream's bit depth.
    pub fn process<T: Sample>(
        &mut self,
        reference: ImgRef<'_, T>,
        distorted: ImgRef<'_, T>,
    ) -> Result<AdmScore, AdmError> {
        if T::BITS < self.info.format.bit_depth() {
            return Err(AdmError::SampleDepthMismatch {
                format: self.info.format,
                bits: T::BITS,
            });
        }
        self.check_frame(reference.width(), reference.height())?;
        self.check_frame(distorted.width(), distorted.height())?;

        let offset = self.params.sample_offset();
        convert_plane(reference, offset, &mut self.reference);
        convert_plane(distorted, offset, &mut self.distorted);

        let score = adm::compute_scales(
            self.reference.as_view(),
            self.distorted.as_view(),
            &self.params,
            &mut self.arena,
        );
        self.record(&score);
        Ok(score)
    }

    /// Scores one pair of float planes already in the working format.
    ///
    /// # Errors
    /// Returns [`AdmError::DimensionMismatch`] if a plane does not match
    /// the stream geometry.
    pub fn compute(
        &mut self,
        reference: PlaneRef<'_>,
        distorted: PlaneRef<'_>,
    ) -> Result<AdmScore, AdmError> {
        self.check_frame(reference.width(), reference.height())?;
        self.check_frame(distorted.width(), distorted.height())?;
        let score = adm::compute_scales(reference, distorted, &self.params, &mut self.arena);
        self.record(&score);
        Ok(score)
    }

    fn check_frame(&self, width: usize, height: usize) -> Result<(), AdmError> {
        if (width, height) == (self.info.width, self.info.height) {
            Ok(())
        } else {
            Err(AdmError::DimensionMismatch {
                w1: self.info.width,
                h1: self.info.height,
                w2: width,
                h2: height,
            })
        }
    }

    fn record(&mut self, score: &AdmScore) {
        self.frames += 1;
        self.score_sum += score.score;
        self.min = self.min.min(score.score);
        self.max = self.max.max(score.score);
    }

    #[must_use]
    pub fn info(&self) -> &VideoInfo {
        &self.info
    }

    #[must_use]
    pub fn params(&self) -> &AdmParams {
        &self.params
    }

    /// Frames scored so far.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Mean score so far, `None` before the first frame.
    #[must_use]
    pub fn average(&self) -> Option<f64> {
        (self.frames > 0).then(|| self.score_sum / self.frames as f64)
    }

    #[must_use]
    pub fn summary(&self) -> StreamSummary {
        match self.average() {
            Some(mean) => StreamSummary {
                frames: self.frames,
                mean,
                min: self.min,
                max: self.max,
            },
            None => StreamSummary::default(),
        }
    }

    /// Closes the stream, logging the average score.
    pub fn finish(self) -> StreamSummary {
        let summary = self.summary();
        if summary.frames > 0 {
            tracing::info!(frames = summary.frames, "ADM AVG: {:.3}", summary.mean);
        }
        summary
    }
}
