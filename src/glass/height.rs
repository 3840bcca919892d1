//! Height field over the glass and the surface normal derived from it.

use glam::{Vec2, Vec3};

use super::consts::{EPSILON, HEIGHT_EDGE_FEATHER_PX, HEIGHT_STEEPNESS, SIGMOID_LIMIT};
use super::shape::glass_distance;
use super::smoothstep;
use crate::params::ResolvedGlass;

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Height in `[0, 1]`: zero outside, rising towards one deeper inside.
///
/// Non-increasing in `d`.
pub fn height_from_distance(d: f32, transition_width: f32) -> f32 {
    let w = transition_width.max(EPSILON);
    let x = (HEIGHT_STEEPNESS * (-d / w)).clamp(-SIGMOID_LIMIT, SIGMOID_LIMIT);
    sigmoid(x) * smoothstep(0.0, HEIGHT_EDGE_FEATHER_PX, -d)
}

pub fn surface_height(local: Vec2, glass: &ResolvedGlass) -> f32 {
    height_from_distance(glass_distance(local, glass), glass.transition_width)
}

/// Central differences of the height field with one-pixel steps.
pub fn surface_gradient(local: Vec2, glass: &ResolvedGlass) -> Vec2 {
    let dx = surface_height(local + Vec2::X, glass) - surface_height(local - Vec2::X, glass);
    let dy = surface_height(local + Vec2::Y, glass) - surface_height(local - Vec2::Y, glass);
    Vec2::new(dx, dy) * 0.5
}

pub fn surface_normal(gradient: Vec2, strength: f32) -> Vec3 {
    Vec3::new(-gradient.x * strength, -gradient.y * strength, 1.0).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::GlassSurfaceParameters;
    use proptest::prelude::*;

    fn glass() -> ResolvedGlass {
        GlassSurfaceParameters {
            width: 200.0,
            height: 100.0,
            ..Default::default()
        }
        .resolve()
        .0
    }

    #[test]
    fn zero_outside_and_near_one_deep_inside() {
        assert_eq!(height_from_distance(0.0, 12.0), 0.0);
        assert_eq!(height_from_distance(5.0, 12.0), 0.0);
        assert!(height_from_distance(-60.0, 12.0) > 0.99);
    }

    #[test]
    fn tiny_width_does_not_blow_up() {
        let h = height_from_distance(-3.0, 0.0);
        assert!(h.is_finite());
        assert!((h - 1.0).abs() < 1e-6);
    }

    #[test]
    fn flat_strength_gives_up_normal() {
        assert_eq!(surface_normal(Vec2::new(0.3, -0.7), 0.0), Vec3::Z);
    }

    #[test]
    fn normal_tilts_outward_near_the_right_edge() {
        let g = glass();
        let near_edge = Vec2::new(g.half_size.x - 2.0, 0.0);
        let n = surface_normal(surface_gradient(near_edge, &g), g.normal_strength);
        assert!(n.x > 0.05, "{n:?}");
        assert!(n.y.abs() < 1e-4, "{n:?}");
        assert!((n.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn center_is_flat() {
        let g = glass();
        let grad = surface_gradient(Vec2::ZERO, &g);
        assert!(grad.length() < 1e-5, "{grad:?}");
    }

    proptest! {
        #[test]
        fn height_is_monotonic(d in -200.0f32..50.0, step in 0.0f32..10.0, w in 0.5f32..40.0) {
            prop_assert!(height_from_distance(d + step, w) <= height_from_distance(d, w));
        }

        #[test]
        fn height_is_bounded(d in -1000.0f32..1000.0, w in 0.0f32..100.0) {
            let h = height_from_distance(d, w);
            prop_assert!((0.0..=1.0).contains(&h));
        }
    }
}
