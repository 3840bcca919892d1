//! Background sampling with the shape-aware blur kernel.

use glam::{Vec2, Vec4};

use super::consts::{BLUR_TAPS_PER_AXIS, EPSILON};
use super::shape::{glass_distance, opacity_from_distance};
use crate::background::BackgroundImage;
use crate::params::ResolvedGlass;

pub fn sample_background(bg: &BackgroundImage, position: Vec2, viewport: Vec2) -> Vec4 {
    bg.sample_bilinear(position / viewport)
}

/// Running weighted sum of blur taps.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlurAccumulator {
    sum: Vec4,
    weight: f32,
}

impl BlurAccumulator {
    pub fn add(&mut self, color: Vec4, weight: f32) {
        self.sum += color * weight;
        self.weight += weight;
    }

    pub fn weight(&self) -> f32 {
        self.weight
    }

    /// Normalised result, or `None` when the taps carried no weight.
    pub fn resolve(&self) -> Option<Vec4> {
        (self.weight > EPSILON).then(|| self.sum / self.weight)
    }
}

/// Blur around `frag + offset`, weighting each tap by the glass coverage at the tap itself so
/// that content outside the glass does not bleed in.
pub fn shape_aware_blur(
    bg: &BackgroundImage,
    frag: Vec2,
    offset: Vec2,
    viewport: Vec2,
    glass: &ResolvedGlass,
) -> Vec4 {
    let center = frag + offset;
    if glass.blur_radius <= EPSILON {
        return sample_background(bg, center, viewport);
    }

    let spacing = glass.blur_radius * 0.5;
    let reach = (BLUR_TAPS_PER_AXIS / 2) as i32;
    let mut acc = BlurAccumulator::default();
    for j in -reach..=reach {
        for i in -reach..=reach {
            let tap = center + Vec2::new(i as f32, j as f32) * spacing;
            let d = glass_distance(glass.local_position(tap, viewport), glass);
            let weight = opacity_from_distance(d, glass.opacity_inset);
            acc.add(sample_background(bg, tap, viewport), weight);
        }
    }
    acc.resolve()
        .unwrap_or_else(|| sample_background(bg, center, viewport))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::GlassSurfaceParameters;
    use image::RgbaImage;
    use proptest::prelude::*;

    fn checker(size: u32) -> BackgroundImage {
        let img = RgbaImage::from_fn(size, size, |x, y| {
            if (x / 4 + y / 4) % 2 == 0 {
                image::Rgba([255, 40, 0, 255])
            } else {
                image::Rgba([0, 90, 255, 255])
            }
        });
        BackgroundImage::from_rgba(img).unwrap()
    }

    fn glass(blur: f32) -> ResolvedGlass {
        GlassSurfaceParameters {
            width: 48.0,
            height: 48.0,
            corner_radius: 8.0,
            blur_radius: blur,
            ..Default::default()
        }
        .resolve()
        .0
    }

    #[test]
    fn zero_radius_is_a_single_tap() {
        let bg = checker(64);
        let vp = Vec2::splat(64.0);
        let frag = Vec2::new(30.5, 20.5);
        assert_eq!(
            shape_aware_blur(&bg, frag, Vec2::ZERO, vp, &glass(0.0)),
            sample_background(&bg, frag, vp)
        );
    }

    #[test]
    fn taps_outside_the_glass_fall_back_to_direct_sample() {
        let bg = checker(64);
        let vp = Vec2::splat(64.0);
        // Far outside the 48px glass: every tap has zero coverage.
        let frag = Vec2::new(1.5, 1.5);
        let offset = Vec2::new(-30.0, -30.0);
        assert_eq!(
            shape_aware_blur(&bg, frag, offset, vp, &glass(2.0)),
            sample_background(&bg, frag + offset, vp)
        );
    }

    #[test]
    fn accumulator_without_weight_is_none() {
        let mut acc = BlurAccumulator::default();
        acc.add(Vec4::ONE, 0.0);
        assert!(acc.resolve().is_none());
        acc.add(Vec4::splat(0.5), 2.0);
        assert_eq!(acc.resolve(), Some(Vec4::splat(0.5)));
    }

    proptest! {
        #[test]
        fn blur_is_a_convex_combination(
            x in 0.0f32..64.0,
            y in 0.0f32..64.0,
            ox in -10.0f32..10.0,
            oy in -10.0f32..10.0,
            radius in 0.0f32..12.0,
        ) {
            let bg = checker(64);
            let c = shape_aware_blur(&bg, Vec2::new(x, y), Vec2::new(ox, oy), Vec2::splat(64.0), &glass(radius));
            // Every tap is a blend of the two checker colors, so is the result.
            let lo = Vec4::new(0.0, 40.0 / 255.0, 0.0, 1.0);
            let hi = Vec4::new(1.0, 90.0 / 255.0, 1.0, 1.0);
            prop_assert!(c.cmpge(lo - 1e-4).all() && c.cmple(hi + 1e-4).all(), "{c:?}");
        }
    }
}
