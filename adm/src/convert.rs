//! Integer sample to float plane conversion.

use imgref::ImgRef;

use crate::image::Plane;

/// An integer sample type a luma plane can be read from.
pub trait Sample: Copy + Send + Sync + 'static {
    /// Container width in bits.
    const BITS: u32;

    fn to_f32(self) -> f32;
}

impl Sample for u8 {
    const BITS: u32 = 8;

    #[inline]
    fn to_f32(self) -> f32 {
        f32::from(self)
    }
}

impl Sample for u16 {
    const BITS: u32 = 16;

    #[inline]
    fn to_f32(self) -> f32 {
        f32::from(self)
    }
}

/// Writes `sample + offset` for every sample of `src` into `dst`.
///
/// Both strides are honoured; padding in `dst` is left untouched.
///
/// # Panics
/// Panics if `dst` is smaller than `src`.
pub fn convert_plane<T: Sample>(src: ImgRef<'_, T>, offset: f32, dst: &mut Plane) {
    assert!(src.width() <= dst.width() && src.height() <= dst.height());
    let width = src.width();
    for (y, row) in src.rows().enumerate() {
        for (out, &v) in dst.row_mut(y)[..width].iter_mut().zip(row) {
            *out = v.to_f32() + offset;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imgref::Img;

    #[test]
    fn test_convert_u8_with_stride() {
        // 3x2 image inside a stride-5 buffer
        let buf: Vec<u8> = vec![1, 2, 3, 99, 99, 4, 5, 255, 99, 99];
        let img = Img::new_stride(buf.as_slice(), 3, 2, 5);
        let mut plane = Plane::new(3, 2);
        convert_plane(img, 0.0, &mut plane);
        assert_eq!(plane.row(0), &[1.0, 2.0, 3.0]);
        assert_eq!(plane.row(1), &[4.0, 5.0, 255.0]);
    }

    #[test]
    fn test_convert_u16_offset() {
        let buf: Vec<u16> = vec![0, 512, 1023, 64];
        let img = Img::new(buf.as_slice(), 2, 2);
        let mut plane = Plane::new(2, 2);
        convert_plane(img, -512.0, &mut plane);
        assert_eq!(plane.row(0), &[-512.0, 0.0]);
        assert_eq!(plane.row(1), &[511.0, -448.0]);
    }
}
