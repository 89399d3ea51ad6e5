//! Shared luma generation and distortion functions for ADM tests.
//!
//! These produce deterministic synthetic frames using an LCG PRNG,
//! ensuring identical test inputs across all platforms. Frames are
//! row-major 8-bit luma, `width * height` bytes.

#![allow(dead_code)]

use adm::Plane;

/// Converts 8-bit luma to a float plane.
pub fn luma_to_plane(luma: &[u8], width: usize, height: usize) -> Plane {
    assert_eq!(luma.len(), width * height);
    Plane::from_fn(width, height, |x, y| f32::from(luma[y * width + x]))
}

// ============================================================================
// LCG PRNG
// ============================================================================

/// LCG pseudo-random number generator (deterministic)
pub struct Lcg {
    state: u64,
}

impl Lcg {
    pub const fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u8(&mut self) -> u8 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((self.state >> 33) & 0xFF) as u8
    }

    pub fn next_u8_range(&mut self, min: u8, max: u8) -> u8 {
        let range = (max - min) as u64 + 1;
        let val = self.next_u8() as u64;
        (min as u64 + (val * range / 256)) as u8
    }
}

// ============================================================================
// Frame Generation Functions
// ============================================================================

/// Uniform frame
pub fn gen_uniform(width: usize, height: usize, value: u8) -> Vec<u8> {
    vec![value; width * height]
}

/// Horizontal gradient
pub fn gen_gradient_h(width: usize, height: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(width * height);
    for _y in 0..height {
        for x in 0..width {
            data.push((x * 255 / (width - 1).max(1)) as u8);
        }
    }
    data
}

/// Diagonal gradient
pub fn gen_gradient_diag(width: usize, height: usize) -> Vec<u8> {
    let max = (width + height - 2).max(1);
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            data.push(((x + y) * 255 / max) as u8);
        }
    }
    data
}

/// Checkerboard of `block_size` squares
pub fn gen_checkerboard(width: usize, height: usize, block_size: usize, lo: u8, hi: u8) -> Vec<u8> {
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let on = (x / block_size + y / block_size) % 2 == 0;
            data.push(if on { hi } else { lo });
        }
    }
    data
}

/// Vertical stripes
pub fn gen_stripes_v(width: usize, height: usize, stripe_width: usize, lo: u8, hi: u8) -> Vec<u8> {
    let mut data = Vec::with_capacity(width * height);
    for _y in 0..height {
        for x in 0..width {
            data.push(if (x / stripe_width) % 2 == 0 { lo } else { hi });
        }
    }
    data
}

/// Seeded random frame
pub fn gen_random(width: usize, height: usize, seed: u64) -> Vec<u8> {
    let mut rng = Lcg::new(seed);
    (0..width * height).map(|_| rng.next_u8()).collect()
}

/// Seeded random frame with limited range (avoids clipping under distortion)
pub fn gen_random_midrange(width: usize, height: usize, seed: u64) -> Vec<u8> {
    let mut rng = Lcg::new(seed);
    (0..width * height).map(|_| rng.next_u8_range(32, 224)).collect()
}

/// Smooth sine wave pattern
pub fn gen_sine_wave(width: usize, height: usize, freq_x: f32, freq_y: f32) -> Vec<u8> {
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let fx = (x as f32 * freq_x * std::f32::consts::TAU / width as f32).sin();
            let fy = (y as f32 * freq_y * std::f32::consts::TAU / height as f32).sin();
            data.push(((fx + fy + 2.0) / 4.0 * 255.0) as u8);
        }
    }
    data
}

/// Textured scene: sine background, a bright box and mild noise
pub fn gen_scene(width: usize, height: usize, seed: u64) -> Vec<u8> {
    let mut rng = Lcg::new(seed);
    let base = gen_sine_wave(width, height, 3.0, 2.0);
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let in_box = x > width / 4 && x < width / 2 && y > height / 3 && y < 2 * height / 3;
            let v = if in_box { 220 } else { base[y * width + x] as i16 };
            let noise = (rng.next_u8() as i16 - 128) / 16;
            data.push((v + noise).clamp(0, 255) as u8);
        }
    }
    data
}

// ============================================================================
// Distortion Functions
// ============================================================================

/// Per-pixel noise with fixed seed
pub fn distort_noise(img: &[u8], seed: u64, amplitude: u8) -> Vec<u8> {
    let mut rng = Lcg::new(seed);
    img.iter()
        .map(|&v| {
            let noise = rng.next_u8() as i16 - 128;
            let scaled = noise * amplitude as i16 / 128;
            (v as i16 + scaled).clamp(0, 255) as u8
        })
        .collect()
}

/// Contrast adjustment around mid-gray
pub fn distort_contrast(img: &[u8], factor: f32) -> Vec<u8> {
    img.iter()
        .map(|&v| {
            let centered = v as f32 - 128.0;
            (centered * factor + 128.0).clamp(0.0, 255.0) as u8
        })
        .collect()
}

/// Simple box blur (3x3)
pub fn distort_blur(img: &[u8], width: usize, height: usize) -> Vec<u8> {
    let mut out = vec![0u8; img.len()];
    for y in 0..height {
        for x in 0..width {
            let mut sum = 0u32;
            let mut count = 0u32;
            for dy in -1i32..=1 {
                for dx in -1i32..=1 {
                    let nx = x as i32 + dx;
                    let ny = y as i32 + dy;
                    if nx >= 0 && nx < width as i32 && ny >= 0 && ny < height as i32 {
                        sum += img[ny as usize * width + nx as usize] as u32;
                        count += 1;
                    }
                }
            }
            out[y * width + x] = (sum / count) as u8;
        }
    }
    out
}

/// Quantize to fewer levels
pub fn distort_quantize(img: &[u8], levels: u8) -> Vec<u8> {
    let step = 256 / levels as u16;
    img.iter()
        .map(|&v| {
            let bucket = v as u16 / step;
            (bucket * step + step / 2).min(255) as u8
        })
        .collect()
}
