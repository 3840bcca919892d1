use bytemuck::{Pod, Zeroable};

use crate::params::ResolvedGlass;

/// Uniform block of the glass program. Layout matches `GlassUniforms` in the WGSL source.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GlassUniforms {
    /// size.x, size.y, corner_radius, smoothing
    pub geometry: [f32; 4],
    /// ior, thickness, normal_strength, displacement_scale
    pub optics: [f32; 4],
    /// transition_width, edge_falloff_exponent, refraction_inset, edge_band
    pub shaping: [f32; 4],
    /// blur_radius, chromatic_aberration, brightness, highlight_width
    pub post: [f32; 4],
    pub shadow_color: [f32; 4],
    pub overlay_color: [f32; 4],
    /// shadow_falloff, opacity_inset, show_normals, unused
    pub extra: [f32; 4],
    /// viewport width, viewport height, unused, unused
    pub viewport: [f32; 4],
}

impl GlassUniforms {
    pub fn new(glass: &ResolvedGlass, viewport: (u32, u32)) -> Self {
        Self {
            geometry: [
                glass.size.x,
                glass.size.y,
                glass.corner_radius,
                glass.smoothing,
            ],
            optics: [
                glass.ior,
                glass.thickness,
                glass.normal_strength,
                glass.displacement_scale,
            ],
            shaping: [
                glass.transition_width,
                glass.edge_falloff_exponent,
                glass.refraction_inset,
                glass.edge_band,
            ],
            post: [
                glass.blur_radius,
                glass.chromatic_aberration,
                glass.brightness,
                glass.highlight_width,
            ],
            shadow_color: glass.shadow_color.to_array(),
            overlay_color: glass.overlay_color.to_array(),
            extra: [
                glass.shadow_falloff,
                glass.opacity_inset,
                if glass.show_normals { 1.0 } else { 0.0 },
                0.0,
            ],
            viewport: [viewport.0 as f32, viewport.1 as f32, 0.0, 0.0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::GlassSurfaceParameters;

    #[test]
    fn block_is_eight_vec4s() {
        assert_eq!(std::mem::size_of::<GlassUniforms>(), 128);
    }

    #[test]
    fn packs_resolved_values() {
        let (glass, _) = GlassSurfaceParameters {
            show_normals: true,
            ..Default::default()
        }
        .resolve();
        let u = GlassUniforms::new(&glass, (640, 480));
        assert_eq!(u.geometry, [400.0, 260.0, 30.0, 1.0]);
        assert_eq!(u.extra[1], 2.0);
        assert_eq!(u.extra[2], 1.0);
        assert_eq!(u.viewport[..2], [640.0, 480.0]);
        assert_eq!(bytemuck::bytes_of(&u).len(), 128);
    }
}
