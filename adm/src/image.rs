//! Plane buffer types for ADM.
//!
//! [`Plane`] owns a single-channel `f32` image whose rows are padded to a
//! 32-byte boundary. [`PlaneRef`] and [`PlaneMut`] are non-owning views
//! used for caller-supplied frames and for regions of the scratch arena.
//! Every row access goes through the stride, never the raw width.

use std::ops::{Index, IndexMut};

use crate::consts::MAX_ALIGN;
use crate::AdmError;

/// Rounds a row length in elements up so the row occupies a multiple of
/// [`MAX_ALIGN`] bytes.
#[inline]
#[must_use]
pub fn aligned_stride(width: usize) -> usize {
    const LANES: usize = MAX_ALIGN / std::mem::size_of::<f32>();
    width.div_ceil(LANES) * LANES
}

/// Size of one decomposition level: `(n + 1) / 2`.
#[inline]
#[must_use]
pub fn half_size(n: usize) -> usize {
    n.div_ceil(2)
}

/// Whole-sample symmetric reflection of an index into `[0, size)`.
///
/// `idx = |idx|`, then `idx = 2*size - idx - 1` if still out of range.
/// A single reflection only; callers keep `idx` within one period, which
/// the minimum frame size guarantees.
#[inline]
#[must_use]
pub fn reflect(idx: isize, size: usize) -> usize {
    let size = size as isize;
    let mut idx = idx.abs();
    if idx >= size {
        idx = 2 * size - idx - 1;
    }
    idx as usize
}

/// Minimum slice length holding `height` rows of `width` samples at `stride`.
#[inline]
fn required_len(width: usize, height: usize, stride: usize) -> usize {
    if height == 0 {
        0
    } else {
        (height - 1) * stride + width
    }
}

/// Single-channel floating point image with 32-byte aligned rows.
#[derive(Debug, Clone)]
pub struct Plane {
    data: Vec<f32>,
    width: usize,
    height: usize,
    stride: usize,
}

impl Plane {
    /// Creates a new plane filled with zeros.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, 0.0)
    }

    /// Creates a plane filled with a constant value.
    #[must_use]
    pub fn filled(width: usize, height: usize, value: f32) -> Self {
        let stride = aligned_stride(width);
        Self {
            data: vec![value; stride * height],
            width,
            height,
            stride,
        }
    }

    /// Creates a plane by evaluating `f(x, y)` for every sample.
    #[must_use]
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> f32) -> Self {
        let mut plane = Self::new(width, height);
        for y in 0..height {
            for (x, v) in plane.row_mut(y).iter_mut().enumerate() {
                *v = f(x, y);
            }
        }
        plane
    }

    /// Plane width in samples.
    #[inline]
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Plane height in rows.
    #[inline]
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Samples per row, including padding.
    #[inline]
    #[must_use]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Returns a row (valid samples only).
    #[inline]
    #[must_use]
    pub fn row(&self, y: usize) -> &[f32] {
        let start = y * self.stride;
        &self.data[start..start + self.width]
    }

    /// Returns a mutable row (valid samples only).
    #[inline]
    pub fn row_mut(&mut self, y: usize) -> &mut [f32] {
        let start = y * self.stride;
        &mut self.data[start..start + self.width]
    }

    /// Gets a sample.
    #[inline]
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.stride + x]
    }

    /// Sets a sample.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: f32) {
        self.data[y * self.stride + x] = value;
    }

    /// Borrows the plane as a read-only view.
    #[inline]
    #[must_use]
    pub fn as_view(&self) -> PlaneRef<'_> {
        PlaneRef::from_parts(&self.data, self.width, self.height, self.stride)
    }

    /// Borrows the plane as a mutable view.
    #[inline]
    pub fn as_view_mut(&mut self) -> PlaneMut<'_> {
        PlaneMut::from_parts(&mut self.data, self.width, self.height, self.stride)
    }
}

impl Index<(usize, usize)> for Plane {
    type Output = f32;

    #[inline]
    fn index(&self, (x, y): (usize, usize)) -> &Self::Output {
        &self.data[y * self.stride + x]
    }
}

impl IndexMut<(usize, usize)> for Plane {
    #[inline]
    fn index_mut(&mut self, (x, y): (usize, usize)) -> &mut Self::Output {
        &mut self.data[y * self.stride + x]
    }
}

/// Read-only view of a strided `f32` plane.
#[derive(Debug, Clone, Copy)]
pub struct PlaneRef<'a> {
    data: &'a [f32],
    width: usize,
    height: usize,
    stride: usize,
}

impl<'a> PlaneRef<'a> {
    /// Wraps caller-owned samples.
    ///
    /// # Errors
    /// Returns an error if `stride < width` or `data` is too short for
    /// `height` rows at `stride`.
    pub fn new(
        data: &'a [f32],
        width: usize,
        height: usize,
        stride: usize,
    ) -> Result<Self, AdmError> {
        if stride < width {
            return Err(AdmError::InvalidStride { width, stride });
        }
        let expected = height
            .checked_mul(stride)
            .map(|_| required_len(width, height, stride))
            .ok_or(AdmError::DimensionOverflow { width, height })?;
        if data.len() < expected {
            return Err(AdmError::InvalidBufferSize {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self::from_parts(data, width, height, stride))
    }

    #[inline]
    pub(crate) fn from_parts(data: &'a [f32], width: usize, height: usize, stride: usize) -> Self {
        debug_assert!(stride >= width);
        debug_assert!(data.len() >= required_len(width, height, stride));
        Self {
            data,
            width,
            height,
            stride,
        }
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    #[must_use]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Returns row `y` (valid samples only).
    #[inline]
    #[must_use]
    pub fn row(&self, y: usize) -> &'a [f32] {
        let start = y * self.stride;
        &self.data[start..start + self.width]
    }

    #[inline]
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.stride + x]
    }
}

/// Mutable view of a strided `f32` plane.
///
/// Views over arena regions keep a fixed stride while their logical size
/// shrinks from one decomposition level to the next.
#[derive(Debug)]
pub struct PlaneMut<'a> {
    data: &'a mut [f32],
    width: usize,
    height: usize,
    stride: usize,
}

impl<'a> PlaneMut<'a> {
    #[inline]
    pub(crate) fn from_parts(
        data: &'a mut [f32],
        width: usize,
        height: usize,
        stride: usize,
    ) -> Self {
        debug_assert!(stride >= width);
        debug_assert!(data.len() >= required_len(width, height, stride));
        Self {
            data,
            width,
            height,
            stride,
        }
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    #[must_use]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Changes the logical size without touching the samples.
    ///
    /// # Panics
    /// Panics if the new size does not fit the backing region.
    pub fn resize(&mut self, width: usize, height: usize) {
        assert!(width <= self.stride, "width {width} exceeds stride {}", self.stride);
        assert!(required_len(width, height, self.stride) <= self.data.len());
        self.width = width;
        self.height = height;
    }

    #[inline]
    #[must_use]
    pub fn row(&self, y: usize) -> &[f32] {
        let start = y * self.stride;
        &self.data[start..start + self.width]
    }

    #[inline]
    pub fn row_mut(&mut self, y: usize) -> &mut [f32] {
        let start = y * self.stride;
        &mut self.data[start..start + self.width]
    }

    #[inline]
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.stride + x]
    }

    /// Reborrows as a read-only view.
    #[inline]
    #[must_use]
    pub fn as_view(&self) -> PlaneRef<'_> {
        PlaneRef::from_parts(&*self.data, self.width, self.height, self.stride)
    }

    /// Copies the valid samples of `src` row by row.
    ///
    /// # Panics
    /// Panics if dimensions don't match.
    pub fn copy_from(&mut self, src: PlaneRef<'_>) {
        assert_eq!((self.width, self.height), (src.width(), src.height()));
        for y in 0..self.height {
            self.row_mut(y).copy_from_slice(src.row(y));
        }
    }
}
