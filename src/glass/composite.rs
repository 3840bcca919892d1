//! Per-pixel assembly of the glass color.

use glam::{Vec2, Vec3, Vec4};

use super::consts::{DISCARD_THRESHOLD, EPSILON, LIGHT_DIR, MAX_TINT};
use super::height::{height_from_distance, surface_gradient, surface_normal};
use super::optics::{
    VIEW_DIR, chromatic_offsets, depth_falloff, fresnel, refraction_offset, shadow_mask,
};
use super::sampling::shape_aware_blur;
use super::shape::{glass_distance, opacity_from_distance};
use super::smoothstep;
use crate::background::BackgroundImage;
use crate::params::ResolvedGlass;

/// Rim highlight strength: a thin ring lit from [`LIGHT_DIR`], scaled by reflectance.
pub fn highlight_alpha(normal: Vec3, d: f32, fresnel: f32, glass: &ResolvedGlass) -> f32 {
    let ring = 1.0 - smoothstep(0.0, glass.highlight_width, d.abs());
    let tilt = normal.truncate();
    let directional = if tilt.length() < EPSILON {
        0.0
    } else {
        tilt.normalize().dot(LIGHT_DIR).abs()
    };
    (ring * directional * fresnel).clamp(0.0, 1.0)
}

/// Shade one fragment. `frag` is the pixel center in viewport pixels (y down).
///
/// Returns `None` for discarded fragments. The color uses straight alpha.
pub fn shade_pixel(
    frag: Vec2,
    viewport: Vec2,
    glass: &ResolvedGlass,
    bg: &BackgroundImage,
) -> Option<Vec4> {
    let local = glass.local_position(frag, viewport);
    let d = glass_distance(local, glass);
    let opacity = opacity_from_distance(d, glass.opacity_inset);
    if opacity < DISCARD_THRESHOLD {
        return None;
    }

    let normal = surface_normal(surface_gradient(local, glass), glass.normal_strength);
    if glass.show_normals {
        return Some((normal * 0.5 + 0.5).extend(opacity));
    }

    let reflectance = fresnel(normal, VIEW_DIR, glass.ior);
    let falloff = depth_falloff(d, glass);
    let base = refraction_offset(normal, d, falloff, glass);
    let [red_off, green_off, blue_off] =
        chromatic_offsets(base, falloff, glass.chromatic_aberration);

    let green = shape_aware_blur(bg, frag, green_off, viewport, glass);
    let red = if red_off == green_off {
        green
    } else {
        shape_aware_blur(bg, frag, red_off, viewport, glass)
    };
    let blue = if blue_off == green_off {
        green
    } else {
        shape_aware_blur(bg, frag, blue_off, viewport, glass)
    };

    let mut rgb = Vec3::new(red.x, green.y, blue.z) * glass.brightness;

    let shadow = shadow_mask(d, glass) * glass.shadow_color.w;
    rgb = rgb.lerp(glass.shadow_color.truncate(), shadow);

    let height = height_from_distance(d, glass.transition_width);
    let tint = (height * MAX_TINT * glass.overlay_color.w).clamp(0.0, 1.0);
    rgb = rgb.lerp(glass.overlay_color.truncate(), tint);

    rgb = rgb.lerp(Vec3::ONE, highlight_alpha(normal, d, reflectance, glass));

    Some(rgb.clamp(Vec3::ZERO, Vec3::ONE).extend(opacity))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::GlassSurfaceParameters;

    fn plain(params: GlassSurfaceParameters) -> ResolvedGlass {
        params.resolve().0
    }

    #[test]
    fn outside_is_discarded() {
        let g = plain(GlassSurfaceParameters::default());
        let bg = BackgroundImage::placeholder((400, 260));
        let vp = Vec2::new(400.0, 260.0);
        assert!(shade_pixel(Vec2::new(0.5, 0.5), vp, &g, &bg).is_none());
        assert!(shade_pixel(vp * 0.5, vp, &g, &bg).is_some());
    }

    #[test]
    fn center_of_normals_view_is_mid_gray() {
        let g = plain(GlassSurfaceParameters {
            show_normals: true,
            ..Default::default()
        });
        let bg = BackgroundImage::placeholder((400, 260));
        let vp = Vec2::new(400.0, 260.0);
        let c = shade_pixel(vp * 0.5, vp, &g, &bg).unwrap();
        assert!((c.x - 0.5).abs() < 1e-3 && (c.y - 0.5).abs() < 1e-3, "{c:?}");
        assert!((c.z - 1.0).abs() < 1e-3);
        assert_eq!(c.w, 1.0);
    }

    #[test]
    fn highlight_needs_a_tilted_normal() {
        let g = plain(GlassSurfaceParameters::default());
        assert_eq!(highlight_alpha(Vec3::Z, 0.0, 1.0, &g), 0.0);
        let lit = highlight_alpha(Vec3::new(-1.0, -1.0, 1.0).normalize(), -0.5, 1.0, &g);
        assert!(lit > 0.5, "{lit}");
        let away = highlight_alpha(Vec3::new(-1.0, -1.0, 1.0).normalize(), -10.0, 1.0, &g);
        assert_eq!(away, 0.0);
    }

    #[test]
    fn brightness_scales_the_background() {
        let bg = BackgroundImage::solid((100, 100), [100, 100, 100, 255]);
        let vp = Vec2::splat(100.0);
        let mut params = GlassSurfaceParameters {
            width: 80.0,
            height: 80.0,
            shadow_color: crate::color::Rgba::new(0.0, 0.0, 0.0, 0.0),
            overlay_color: crate::color::Rgba::new(1.0, 1.0, 1.0, 0.0),
            ..Default::default()
        };
        let dim = shade_pixel(vp * 0.5, vp, &plain(params.clone()), &bg).unwrap();
        params.brightness = 2.0;
        let bright = shade_pixel(vp * 0.5, vp, &plain(params), &bg).unwrap();
        assert!((bright.x - dim.x * 2.0).abs() < 1e-5);
    }

    #[test]
    fn extreme_parameters_still_shade() {
        let bg = BackgroundImage::solid((4, 4), [10, 200, 30, 255]);
        let vp = Vec2::new(100.0, 60.0);
        let g = plain(GlassSurfaceParameters {
            width: 100.0,
            height: 60.0,
            thickness: 1e30,
            blur_radius: 1e30,
            displacement_scale: 1e30,
            chromatic_aberration: 1e30,
            ..Default::default()
        });
        for frag in [vp * 0.5, Vec2::new(4.5, 30.5), Vec2::new(50.5, 2.5)] {
            let c = shade_pixel(frag, vp, &g, &bg).unwrap();
            assert!(c.is_finite(), "{frag:?} -> {c:?}");
        }
    }
}
