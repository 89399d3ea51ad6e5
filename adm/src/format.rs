//! Planar YUV pixel formats accepted by the stream context.

use std::fmt;
use std::str::FromStr;

use crate::AdmError;

/// Planar YUV layouts, 8-bit or 10-bit little-endian.
///
/// Only the luma plane is scored; chroma geometry matters for locating
/// frames in raw files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PixelFormat {
    #[default]
    Yuv420p,
    Yuv422p,
    Yuv444p,
    Yuv420p10le,
    Yuv422p10le,
    Yuv444p10le,
}

impl PixelFormat {
    /// All formats, 8-bit first.
    pub const ALL: [Self; 6] = [
        Self::Yuv420p,
        Self::Yuv422p,
        Self::Yuv444p,
        Self::Yuv420p10le,
        Self::Yuv422p10le,
        Self::Yuv444p10le,
    ];

    /// Significant bits per sample.
    #[must_use]
    pub fn bit_depth(self) -> u32 {
        match self {
            Self::Yuv420p | Self::Yuv422p | Self::Yuv444p => 8,
            Self::Yuv420p10le | Self::Yuv422p10le | Self::Yuv444p10le => 10,
        }
    }

    /// Bytes each sample occupies in a raw frame.
    #[must_use]
    pub fn bytes_per_sample(self) -> usize {
        if self.bit_depth() > 8 {
            2
        } else {
            1
        }
    }

    /// Log2 chroma subsampling `(horizontal, vertical)`.
    #[must_use]
    pub fn chroma_shift(self) -> (u32, u32) {
        match self {
            Self::Yuv420p | Self::Yuv420p10le => (1, 1),
            Self::Yuv422p | Self::Yuv422p10le => (1, 0),
            Self::Yuv444p | Self::Yuv444p10le => (0, 0),
        }
    }

    /// Chroma plane dimensions for a `width x height` frame.
    #[must_use]
    pub fn chroma_size(self, width: usize, height: usize) -> (usize, usize) {
        let (sx, sy) = self.chroma_shift();
        (
            (width + (1 << sx) - 1) >> sx,
            (height + (1 << sy) - 1) >> sy,
        )
    }

    /// Bytes of the luma plane of a packed raw frame.
    #[must_use]
    pub fn luma_len(self, width: usize, height: usize) -> usize {
        width * height * self.bytes_per_sample()
    }

    /// Bytes of one packed raw frame (luma plus two chroma planes).
    #[must_use]
    pub fn frame_len(self, width: usize, height: usize) -> usize {
        let (cw, ch) = self.chroma_size(width, height);
        self.luma_len(width, height) + 2 * cw * ch * self.bytes_per_sample()
    }

    /// The ffmpeg name of the format.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Yuv420p => "yuv420p",
            Self::Yuv422p => "yuv422p",
            Self::Yuv444p => "yuv444p",
            Self::Yuv420p10le => "yuv420p10le",
            Self::Yuv422p10le => "yuv422p10le",
            Self::Yuv444p10le => "yuv444p10le",
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PixelFormat {
    type Err = AdmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|f| f.name() == lower)
            .ok_or_else(|| AdmError::InvalidParameter {
                name: "pixel format",
                value: s.to_string(),
            })
    }
}
