//! CPU reference evaluator for the glass pixel program.
//!
//! Each stage is a pure function of the fragment position, the viewport, the
//! [`ResolvedGlass`](crate::params::ResolvedGlass) bundle and the background. The WGSL program in
//! [`crate::renderer::wgsl`] mirrors these functions one to one and uses the same constants.
//!
//! Coordinates are pixels with y pointing down. Shape-local positions are relative to the
//! viewport center, where the glass is centered.

pub mod composite;
pub mod consts;
pub mod cpu;
pub mod height;
pub mod optics;
pub mod sampling;
pub mod shape;

pub use composite::shade_pixel;

/// GLSL `smoothstep`. Callers keep `e1 > e0`.
#[inline]
pub fn smoothstep(e0: f32, e1: f32, x: f32) -> f32 {
    let span = e1 - e0;
    if span.abs() <= f32::EPSILON {
        return if x < e0 { 0.0 } else { 1.0 };
    }
    let t = ((x - e0) / span).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[inline]
pub fn mix(a: f32, b: f32, t: f32) -> f32 {
    a * (1.0 - t) + b * t
}
