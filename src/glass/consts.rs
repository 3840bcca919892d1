//! Constants shared by the CPU evaluator and the WGSL program.

use glam::Vec2;

pub const EPSILON: f32 = 1e-4;
/// Fragments below this opacity are discarded.
pub const DISCARD_THRESHOLD: f32 = 0.001;
pub const HEIGHT_STEEPNESS: f32 = 3.0;
pub const HEIGHT_EDGE_FEATHER_PX: f32 = 1.5;
/// Bound on the sigmoid argument so `exp` stays finite.
pub const SIGMOID_LIMIT: f32 = 30.0;
pub const AA_FEATHER_PX: f32 = 1.5;
pub const MIN_OPACITY_INSET: f32 = 2.0;
/// Pixels of channel separation per unit of chromatic aberration at the rim.
pub const CHROMATIC_PIXEL_SCALE: f32 = 6.0;
pub const MAX_TINT: f32 = 0.12;
/// Highlight light direction: top-left, pixel space.
pub const LIGHT_DIR: Vec2 = Vec2::new(-std::f32::consts::FRAC_1_SQRT_2, -std::f32::consts::FRAC_1_SQRT_2);
pub const BLUR_TAPS_PER_AXIS: u32 = 5;
/// Upper bound on pixel-space lengths (`thickness`, `blurRadius`) accepted by `resolve()`.
pub const MAX_LENGTH_PX: f32 = 16384.0;
pub const MAX_DISPLACEMENT_SCALE: f32 = 64.0;
