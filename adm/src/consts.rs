//! Constants for the ADM wavelet pipeline.
//!
//! Filter taps and visual-model tables are the calibrated values the
//! metric was trained with. They are stored as `f32` exactly as the
//! reference filter declares them; changing any digit changes scores.

// ============================================================================
// Wavelet Filter Taps
// ============================================================================

/// Daubechies-2 analysis low-pass taps.
pub const DWT2_DB2_COEFFS_LO: [f32; 4] = [
    0.482_962_913_144_690,
    0.836_516_303_737_469,
    0.224_143_868_041_857,
    -0.129_409_522_550_921,
];

/// Daubechies-2 analysis high-pass taps.
pub const DWT2_DB2_COEFFS_HI: [f32; 4] = [
    -0.129_409_522_550_921,
    -0.224_143_868_041_857,
    0.836_516_303_737_469,
    -0.482_962_913_144_690,
];

// ============================================================================
// Viewing Model
// ============================================================================

/// Viewing distance in multiples of the display height.
pub const VIEW_DIST: f32 = 3.0;

/// Display height (pixels) the CSF thresholds were calibrated for.
pub const REF_DISPLAY_HEIGHT: f32 = 1080.0;

/// Fraction of width/height skipped on each side when pooling.
pub const ADM_BORDER_FACTOR: f64 = 0.1;

/// Parameters of the 7/9 wavelet quantization-threshold model
/// (Watson et al., "Visibility of wavelet quantization noise").
#[derive(Debug, Clone, Copy)]
pub struct DwtModelParams {
    pub a: f32,
    pub k: f32,
    pub f0: f32,
    /// Orientation gains: 0 = LL, 1 = LH/HL, 2 = HH, 3 = HL.
    pub g: [f32; 4],
}

/// Threshold model for the luma channel. Chroma rows are not used since
/// only a single luma-like plane is scored.
pub const DWT_7_9_Y_THRESHOLD: DwtModelParams = DwtModelParams {
    a: 0.495,
    k: 0.466,
    f0: 0.401,
    g: [1.501, 1.0, 0.534, 1.0],
};

/// Basis function amplitudes indexed by `[lambda][theta]`, finest level first.
pub const DWT_7_9_BASIS_FUNCTION_AMPLITUDES: [[f32; 4]; NUM_SCALES] = [
    [0.62171, 0.67234, 0.72709, 0.67234],
    [0.34537, 0.41317, 0.49428, 0.41317],
    [0.18004, 0.22727, 0.28688, 0.22727],
    [0.091401, 0.11792, 0.15214, 0.11792],
];

/// Orientation index used for the horizontal and vertical detail bands.
pub const THETA_HV: usize = 1;

/// Orientation index used for the diagonal detail band.
pub const THETA_D: usize = 2;

// ============================================================================
// Pipeline Shape
// ============================================================================

/// Number of wavelet levels analysed per frame.
pub const NUM_SCALES: usize = 4;

/// Half-resolution buffers carved out of the scratch arena:
/// 2 working planes + 7 four-plane bands + 1 threshold map + 1 masked band.
pub const ARENA_BUFFER_COUNT: usize = 35;

/// Row alignment of every plane, in bytes.
pub const MAX_ALIGN: usize = 32;

/// Smallest width/height that keeps every level's reflection in bounds
/// (9 → 5 → 3 → 2 before the last transform).
pub const MIN_DIMENSION: usize = 9;

// ============================================================================
// Decoupling, Masking and Pooling
// ============================================================================

/// Guard added to reference coefficients before taking the gain.
pub const DECOUPLE_EPS: f32 = 1e-30;

/// Angle tolerance (degrees) under which distorted detail counts as restored.
pub const DECOUPLE_ANGLE_DEG: f64 = 1.0;

/// Centre tap of the 3x3 contrast-masking kernel.
pub const CM_CENTER_WEIGHT: f32 = (1.0 / 15.0) as f32;

/// Off-centre taps of the 3x3 contrast-masking kernel.
pub const CM_NEIGHBOR_WEIGHT: f32 = (1.0 / 30.0) as f32;

/// Area divisor of the pooling stabilizer term.
pub const POOL_AREA_DIVISOR: f64 = 32.0;

/// Noise floor of the summed numerator/denominator at 1920x1080.
pub const NUMDEN_LIMIT: f64 = 1e-2;

/// Pixel count the noise floor is normalized to.
pub const NUMDEN_REF_AREA: f64 = 1920.0 * 1080.0;
