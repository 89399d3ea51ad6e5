//! Scratch arena for the per-frame pipeline.
//!
//! All intermediate planes of the four decomposition levels live in one
//! allocation sized from the stream's frame dimensions. Each frame the
//! arena is carved into named views ([`Workspace`]); nothing is allocated
//! in the hot path and no view aliases another.

use crate::consts::ARENA_BUFFER_COUNT;
use crate::image::{aligned_stride, half_size, PlaneMut, PlaneRef};
use crate::AdmError;

/// Offsets and sizes of the arena regions for one frame size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArenaLayout {
    /// Frame width the layout was computed for.
    pub width: usize,
    /// Frame height the layout was computed for.
    pub height: usize,
    /// Row stride (elements) of every half-resolution region.
    pub buffer_stride: usize,
    /// Length (elements) of one half-resolution region.
    pub buffer_len: usize,
    /// Length (elements) of each temporary row.
    pub row_len: usize,
}

impl ArenaLayout {
    /// Computes the layout for a `width x height` frame.
    ///
    /// # Errors
    /// Returns [`AdmError::DimensionOverflow`] if the arena size does not fit
    /// in `usize`.
    pub fn new(width: usize, height: usize) -> Result<Self, AdmError> {
        let overflow = AdmError::DimensionOverflow { width, height };
        let buffer_stride = aligned_stride(half_size(width));
        let buffer_len = buffer_stride
            .checked_mul(half_size(height))
            .ok_or(overflow.clone())?;
        buffer_len
            .checked_mul(ARENA_BUFFER_COUNT)
            .and_then(|n| n.checked_mul(std::mem::size_of::<f32>()))
            .ok_or(overflow)?;
        Ok(Self {
            width,
            height,
            buffer_stride,
            buffer_len,
            row_len: aligned_stride(width),
        })
    }

    /// Total elements of the region area.
    #[must_use]
    pub fn arena_len(&self) -> usize {
        self.buffer_len * ARENA_BUFFER_COUNT
    }

    /// Total bytes held by the arena including both temporary rows.
    #[must_use]
    pub fn total_bytes(&self) -> usize {
        (self.arena_len() + 2 * self.row_len) * std::mem::size_of::<f32>()
    }

    /// Whether this layout can serve a `width x height` frame.
    #[must_use]
    pub fn fits(&self, width: usize, height: usize) -> bool {
        let stride = aligned_stride(half_size(width));
        stride <= self.buffer_stride
            && self.buffer_stride * half_size(height) <= self.buffer_len
            && width <= self.row_len
    }
}

/// Caller-owned scratch memory for [`compute_adm_with_arena`](crate::compute_adm_with_arena).
///
/// Create once per stream and reuse for every frame. Not shareable between
/// concurrent computations; give each worker its own arena.
#[derive(Debug, Clone)]
pub struct ScratchArena {
    layout: ArenaLayout,
    data: Vec<f32>,
    temp_lo: Vec<f32>,
    temp_hi: Vec<f32>,
}

impl ScratchArena {
    /// Allocates an arena for `width x height` frames.
    ///
    /// # Errors
    /// Returns [`AdmError::DimensionOverflow`] if the size overflows.
    pub fn new(width: usize, height: usize) -> Result<Self, AdmError> {
        let layout = ArenaLayout::new(width, height)?;
        Ok(Self {
            data: vec![0.0; layout.arena_len()],
            temp_lo: vec![0.0; layout.row_len],
            temp_hi: vec![0.0; layout.row_len],
            layout,
        })
    }

    #[must_use]
    pub fn layout(&self) -> &ArenaLayout {
        &self.layout
    }

    /// Checks that the arena can hold the intermediates of a frame.
    pub(crate) fn check_fits(&self, width: usize, height: usize) -> Result<(), AdmError> {
        if self.layout.fits(width, height) {
            Ok(())
        } else {
            let required = ArenaLayout::new(width, height)?.total_bytes();
            Err(AdmError::ArenaTooSmall {
                required,
                actual: self.layout.total_bytes(),
            })
        }
    }

    /// Carves the arena into named views for a `width x height` frame.
    ///
    /// Region order is fixed: working planes, the seven analysis bands,
    /// the masking threshold, then the masked band.
    pub(crate) fn workspace(&mut self, width: usize, height: usize) -> Workspace<'_> {
        let (w, h) = (half_size(width), half_size(height));
        let stride = self.layout.buffer_stride;
        let len = self.layout.buffer_len;
        let mut rest: &mut [f32] = &mut self.data;

        let mut plane = || PlaneMut::from_parts(carve(&mut rest, len), w, h, stride);
        let ref_scale = plane();
        let main_scale = plane();
        let ref_dwt = Band::carve(&mut plane);
        let main_dwt = Band::carve(&mut plane);
        let decouple_r = Band::carve(&mut plane);
        let decouple_a = Band::carve(&mut plane);
        let csf_o = Band::carve(&mut plane);
        let csf_r = Band::carve(&mut plane);
        let csf_a = Band::carve(&mut plane);
        let mta = plane();
        let cm_r = Band::carve(&mut plane);

        Workspace {
            ref_scale,
            main_scale,
            ref_dwt,
            main_dwt,
            decouple_r,
            decouple_a,
            csf_o,
            csf_r,
            csf_a,
            mta,
            cm_r,
            temp_lo: &mut self.temp_lo[..width],
            temp_hi: &mut self.temp_hi[..width],
        }
    }
}

/// Splits `len` elements off the front of `rest`.
fn carve<'a>(rest: &mut &'a mut [f32], len: usize) -> &'a mut [f32] {
    let (head, tail) = std::mem::take(rest).split_at_mut(len);
    *rest = tail;
    head
}

/// One level of a wavelet decomposition: approximation plus three details.
#[derive(Debug)]
pub struct Band<'a> {
    /// Approximation (low/low).
    pub a: PlaneMut<'a>,
    /// Horizontal detail.
    pub h: PlaneMut<'a>,
    /// Vertical detail.
    pub v: PlaneMut<'a>,
    /// Diagonal detail.
    pub d: PlaneMut<'a>,
}

impl<'a> Band<'a> {
    fn carve(next: &mut impl FnMut() -> PlaneMut<'a>) -> Self {
        Self {
            a: next(),
            h: next(),
            v: next(),
            d: next(),
        }
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> usize {
        self.a.width()
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> usize {
        self.a.height()
    }

    /// Sets the logical size of all four planes.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.a.resize(width, height);
        self.h.resize(width, height);
        self.v.resize(width, height);
        self.d.resize(width, height);
    }

    /// Detail planes in `[H, V, D]` order.
    #[must_use]
    pub fn details(&self) -> [PlaneRef<'_>; 3] {
        [self.h.as_view(), self.v.as_view(), self.d.as_view()]
    }

    /// Mutable detail planes in `[H, V, D]` order.
    pub fn details_mut(&mut self) -> [&mut PlaneMut<'a>; 3] {
        [&mut self.h, &mut self.v, &mut self.d]
    }
}

/// Named views over one frame's arena regions.
pub(crate) struct Workspace<'a> {
    pub ref_scale: PlaneMut<'a>,
    pub main_scale: PlaneMut<'a>,
    pub ref_dwt: Band<'a>,
    pub main_dwt: Band<'a>,
    pub decouple_r: Band<'a>,
    pub decouple_a: Band<'a>,
    pub csf_o: Band<'a>,
    pub csf_r: Band<'a>,
    pub csf_a: Band<'a>,
    pub mta: PlaneMut<'a>,
    pub cm_r: Band<'a>,
    pub temp_lo: &'a mut [f32],
    pub temp_hi: &'a mut [f32],
}

impl Workspace<'_> {
    /// Sets every band and the threshold map to one level's size.
    pub fn resize_bands(&mut self, width: usize, height: usize) {
        for band in [
            &mut self.ref_dwt,
            &mut self.main_dwt,
            &mut self.decouple_r,
            &mut self.decouple_a,
            &mut self.csf_o,
            &mut self.csf_r,
            &mut self.csf_a,
            &mut self.cm_r,
        ] {
            band.resize(width, height);
        }
        self.mta.resize(width, height);
    }
}
