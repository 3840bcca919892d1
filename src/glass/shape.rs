//! Rounded-rectangle signed distance field and the opacity mask derived from it.

use glam::Vec2;

use super::consts::AA_FEATHER_PX;
use super::{mix, smoothstep};
use crate::params::ResolvedGlass;

/// Polynomial smooth minimum. `k <= 0` is the exact `min`.
pub fn smin(a: f32, b: f32, k: f32) -> f32 {
    if k <= 0.0 {
        return a.min(b);
    }
    let h = (0.5 + 0.5 * (b - a) / k).clamp(0.0, 1.0);
    mix(b, a, h) - k * h * (1.0 - h)
}

pub fn smax(a: f32, b: f32, k: f32) -> f32 {
    -smin(-a, -b, k)
}

/// Signed distance to a rounded box centered at the origin. Negative inside.
///
/// `radius` is clamped to `[0, min(half_size)]`. With `smoothing > 0` every `min`/`max` of the
/// analytic formula is replaced by its smooth counterpart, which rounds the joins between the
/// straight edges and the corner arcs.
pub fn sd_rounded_box(p: Vec2, half_size: Vec2, radius: f32, smoothing: f32) -> f32 {
    let r = radius.max(0.0).min(half_size.min_element().max(0.0));
    let q = p.abs() - half_size + Vec2::splat(r);
    if smoothing <= 0.0 {
        q.max(Vec2::ZERO).length() + q.x.max(q.y).min(0.0) - r
    } else {
        let k = smoothing;
        let outside = Vec2::new(smax(q.x, 0.0, k), smax(q.y, 0.0, k));
        outside.length() + smin(smax(q.x, q.y, k), 0.0, k) - r
    }
}

pub fn glass_distance(local: Vec2, glass: &ResolvedGlass) -> f32 {
    sd_rounded_box(local, glass.half_size, glass.corner_radius, glass.smoothing)
}

/// Coverage of a fragment at signed distance `d`. Zero on and outside the boundary.
pub fn opacity_from_distance(d: f32, inset: f32) -> f32 {
    if d >= 0.0 {
        return 0.0;
    }
    let base = 1.0 - smoothstep(-inset, 0.0, d);
    let aa = 1.0 - smoothstep(-AA_FEATHER_PX, 0.0, d);
    mix(base, 1.0, aa)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const HALF: Vec2 = Vec2::new(100.0, 50.0);

    #[test]
    fn edge_midpoints_are_on_the_boundary() {
        assert_eq!(sd_rounded_box(Vec2::new(100.0, 0.0), HALF, 20.0, 0.0), 0.0);
        assert_eq!(sd_rounded_box(Vec2::new(0.0, 50.0), HALF, 20.0, 0.0), 0.0);
        assert_eq!(sd_rounded_box(Vec2::new(0.0, -50.0), HALF, 0.0, 0.0), 0.0);
    }

    #[test]
    fn center_distance_is_half_the_short_side() {
        assert_eq!(sd_rounded_box(Vec2::ZERO, HALF, 20.0, 0.0), -50.0);
        assert!((sd_rounded_box(Vec2::ZERO, HALF, 20.0, 1.0) + 50.0).abs() < 1e-3);
    }

    #[test]
    fn corner_arc_distance() {
        // Corner circle center sits at (80, 30); a point diagonally outside it.
        let p = Vec2::new(80.0, 30.0) + Vec2::splat(30.0 / 2f32.sqrt());
        assert!((sd_rounded_box(p, HALF, 20.0, 0.0) - 10.0).abs() < 1e-3);
    }

    #[test]
    fn radius_is_clamped() {
        let a = sd_rounded_box(Vec2::new(90.0, 45.0), HALF, 500.0, 0.0);
        let b = sd_rounded_box(Vec2::new(90.0, 45.0), HALF, 50.0, 0.0);
        assert_eq!(a, b);
        let c = sd_rounded_box(Vec2::new(90.0, 45.0), HALF, -4.0, 0.0);
        let d = sd_rounded_box(Vec2::new(90.0, 45.0), HALF, 0.0, 0.0);
        assert_eq!(c, d);
    }

    #[test]
    fn opacity_limits() {
        assert!(opacity_from_distance(0.0, 2.0) < 1e-6);
        assert!(opacity_from_distance(-1e-3, 2.0) < 1e-3);
        assert_eq!(opacity_from_distance(3.0, 2.0), 0.0);
        assert_eq!(opacity_from_distance(-102.0, 2.0), 1.0);
        assert_eq!(opacity_from_distance(-AA_FEATHER_PX, 2.0), 1.0);
    }

    #[test]
    fn smin_matches_min_far_from_the_seam() {
        assert_eq!(smin(-10.0, 10.0, 1.0), -10.0);
        assert_eq!(smax(-10.0, 10.0, 1.0), 10.0);
        assert!(smin(0.0, 0.0, 1.0) < 0.0);
    }

    proptest! {
        #[test]
        fn distance_grows_along_rays(angle in 0.0f32..std::f32::consts::TAU, t in 0.0f32..300.0, dt in 0.01f32..20.0) {
            let dir = Vec2::new(angle.cos(), angle.sin());
            let near = sd_rounded_box(dir * t, HALF, 20.0, 0.0);
            let far = sd_rounded_box(dir * (t + dt), HALF, 20.0, 0.0);
            prop_assert!(far >= near - 1e-4, "near={near} far={far}");
        }

        #[test]
        fn smoothing_converges_to_sharp(x in -150.0f32..150.0, y in -100.0f32..100.0, k in 1e-5f32..5e-4) {
            let p = Vec2::new(x, y);
            let sharp = sd_rounded_box(p, HALF, 20.0, 0.0);
            let smooth = sd_rounded_box(p, HALF, 20.0, k);
            prop_assert!((sharp - smooth).abs() < 1e-3, "sharp={sharp} smooth={smooth}");
        }

        #[test]
        fn opacity_is_a_unit_interval(d in -500.0f32..500.0, inset in 0.0f32..40.0) {
            let o = opacity_from_distance(d, inset.max(2.0));
            prop_assert!((0.0..=1.0).contains(&o));
        }
    }
}
