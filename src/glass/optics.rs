//! Refraction, Fresnel reflectance, and the distance-driven optical terms.

use glam::{Vec2, Vec3};

use super::consts::{CHROMATIC_PIXEL_SCALE, EPSILON};
use super::smoothstep;
use crate::params::ResolvedGlass;

/// The viewer looks straight down onto the glass.
pub const VIEW_DIR: Vec3 = Vec3::Z;

/// Schlick's approximation. Bounded to `[r0, 1]`.
pub fn fresnel(normal: Vec3, view: Vec3, ior: f32) -> f32 {
    let r0 = ((1.0 - ior) / (1.0 + ior)).powi(2);
    let cos = normal.dot(view).abs().min(1.0);
    r0 + (1.0 - r0) * (1.0 - cos).powi(5)
}

/// GLSL `refract`. Returns zero on total internal reflection.
pub fn refract(incident: Vec3, normal: Vec3, eta: f32) -> Vec3 {
    let n_dot_i = normal.dot(incident);
    let k = 1.0 - eta * eta * (1.0 - n_dot_i * n_dot_i);
    if k < 0.0 {
        Vec3::ZERO
    } else {
        eta * incident - (eta * n_dot_i + k.sqrt()) * normal
    }
}

/// Ray leaving a symmetric lens: enter through `normal`, exit through the mirrored back face.
///
/// Matched indices leave the view ray untouched.
pub fn double_refraction(normal: Vec3, ior: f32) -> Vec3 {
    let incident = -VIEW_DIR;
    if (ior - 1.0).abs() <= EPSILON {
        return incident;
    }
    let into = refract(incident, normal, 1.0 / ior);
    let exit_normal = Vec3::new(-normal.x, -normal.y, normal.z);
    let out = refract(into, exit_normal, ior);
    if out.length_squared() <= EPSILON * EPSILON {
        into
    } else {
        out
    }
}

/// One at the rim, zero once the fragment is `edge_band` pixels deep.
pub fn depth_falloff(d: f32, glass: &ResolvedGlass) -> f32 {
    let band = glass.edge_band.max(EPSILON);
    let center_proximity = (-d / band).clamp(0.0, 1.0);
    1.0 - center_proximity.powf(glass.edge_falloff_exponent)
}

pub fn inset_gate(d: f32, glass: &ResolvedGlass) -> f32 {
    smoothstep(0.0, glass.refraction_inset.max(EPSILON), -d)
}

/// Background offset in pixels before dispersion.
pub fn refraction_offset(normal: Vec3, d: f32, falloff: f32, glass: &ResolvedGlass) -> Vec2 {
    let out = double_refraction(normal, glass.ior);
    out.truncate() * glass.thickness * glass.displacement_scale * falloff * inset_gate(d, glass)
}

/// Per-channel offsets `[red, green, blue]`, spread symmetrically around green along the base
/// offset direction.
pub fn chromatic_offsets(base: Vec2, falloff: f32, strength: f32) -> [Vec2; 3] {
    let dir = if base.length() < EPSILON {
        Vec2::ZERO
    } else {
        base.normalize()
    };
    let spread = dir * (strength * CHROMATIC_PIXEL_SCALE * falloff);
    [base - spread, base, base + spread]
}

/// Darkening weight, one at the rim fading to zero `shadow_falloff` pixels inside.
pub fn shadow_mask(d: f32, glass: &ResolvedGlass) -> f32 {
    1.0 - smoothstep(0.0, glass.shadow_falloff.max(EPSILON), -d)
}
