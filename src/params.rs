//! Glass surface parameters: the per-frame value bundle, its JSON form, and clamping.

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use glam::{Vec2, Vec4};
use serde::{Deserialize, Serialize};

use crate::color::Rgba;
use crate::glass::consts::{EPSILON, MAX_DISPLACEMENT_SCALE, MAX_LENGTH_PX, MIN_OPACITY_INSET};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GlassSurfaceParameters {
    pub width: f32,
    pub height: f32,
    pub corner_radius: f32,
    pub smoothing: f32,
    pub ior: f32,
    pub thickness: f32,
    pub normal_strength: f32,
    pub displacement_scale: f32,
    pub transition_width: f32,
    pub blur_radius: f32,
    pub chromatic_aberration: f32,
    pub brightness: f32,
    pub highlight_width: f32,
    pub edge_falloff_exponent: f32,
    pub edge_band_fraction: f32,
    pub refraction_inset: f32,
    pub shadow_color: Rgba,
    /// Fraction of half the smaller glass dimension.
    pub shadow_softness: f32,
    pub overlay_color: Rgba,
    pub show_normals: bool,
}

impl Default for GlassSurfaceParameters {
    fn default() -> Self {
        Self {
            width: 400.0,
            height: 260.0,
            corner_radius: 30.0,
            smoothing: 1.0,
            ior: 1.5,
            thickness: 24.0,
            normal_strength: 1.0,
            displacement_scale: 1.0,
            transition_width: 12.0,
            blur_radius: 4.0,
            chromatic_aberration: 0.5,
            brightness: 1.0,
            highlight_width: 3.0,
            edge_falloff_exponent: 2.0,
            edge_band_fraction: 0.4,
            refraction_inset: 2.0,
            shadow_color: Rgba::new(0.0, 0.0, 0.0, 0.25),
            shadow_softness: 0.2,
            overlay_color: Rgba::new(1.0, 1.0, 1.0, 0.2),
            show_normals: false,
        }
    }
}

/// A clamp `resolve()` had to apply.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamAdjustment {
    pub field: String,
    pub requested: f32,
    pub applied: f32,
}

impl fmt::Display for ParamAdjustment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} clamped from {} to {}",
            self.field, self.requested, self.applied
        )
    }
}

/// Parameters with every clamp applied and the derived distances precomputed.
///
/// This is what both pixel program hosts consume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedGlass {
    pub size: Vec2,
    pub half_size: Vec2,
    pub corner_radius: f32,
    pub smoothing: f32,
    pub ior: f32,
    pub thickness: f32,
    pub normal_strength: f32,
    pub displacement_scale: f32,
    pub transition_width: f32,
    pub blur_radius: f32,
    pub chromatic_aberration: f32,
    pub brightness: f32,
    pub highlight_width: f32,
    pub edge_falloff_exponent: f32,
    /// Refraction band in pixels.
    pub edge_band: f32,
    pub refraction_inset: f32,
    pub opacity_inset: f32,
    pub shadow_color: Vec4,
    /// Shadow falloff distance in pixels.
    pub shadow_falloff: f32,
    pub overlay_color: Vec4,
    pub show_normals: bool,
}

impl ResolvedGlass {
    /// Zero-area or non-finite glass: nothing to draw.
    pub fn is_degenerate(&self) -> bool {
        !(self.size.x > 0.0 && self.size.y > 0.0 && self.size.is_finite())
    }

    pub fn min_dimension(&self) -> f32 {
        self.size.x.min(self.size.y).max(0.0)
    }

    /// Map a fragment position (pixel space, y down) to the glass-centered frame.
    pub fn local_position(&self, frag: Vec2, viewport: Vec2) -> Vec2 {
        frag - viewport * 0.5
    }
}

struct Clamper {
    adjustments: Vec<ParamAdjustment>,
}

impl Clamper {
    fn range(&mut self, field: &str, value: f32, lo: f32, hi: f32) -> f32 {
        let hi = hi.max(lo);
        let applied = if value.is_nan() { lo } else { value.max(lo).min(hi) };
        if applied != value {
            self.adjustments.push(ParamAdjustment {
                field: field.to_string(),
                requested: value,
                applied,
            });
        }
        applied
    }

    fn at_least(&mut self, field: &str, value: f32, lo: f32) -> f32 {
        self.range(field, value, lo, f32::INFINITY)
    }

    /// Symmetric bound; NaN becomes zero.
    fn within(&mut self, field: &str, value: f32, limit: f32) -> f32 {
        if value.is_nan() {
            return self.range(field, value, 0.0, 0.0);
        }
        self.range(field, value, -limit, limit)
    }

    fn color(&mut self, field: &str, color: Rgba) -> Vec4 {
        let mut out = [0.0f32; 4];
        for (i, (slot, v)) in out.iter_mut().zip(color.0).enumerate() {
            *slot = self.range(&format!("{field}[{i}]"), v, 0.0, 1.0);
        }
        Vec4::from_array(out)
    }
}

impl GlassSurfaceParameters {
    /// Apply every clamp and derive the pixel-space distances.
    ///
    /// Never fails. Width and height are passed through untouched so that a zero-area glass
    /// stays detectable through [`ResolvedGlass::is_degenerate`].
    pub fn resolve(&self) -> (ResolvedGlass, Vec<ParamAdjustment>) {
        let mut c = Clamper {
            adjustments: Vec::new(),
        };

        let size = Vec2::new(self.width, self.height);
        let min_dim = self.width.min(self.height).max(0.0);
        let min_dim = if min_dim.is_finite() { min_dim } else { 0.0 };

        let corner_radius = c.range("cornerRadius", self.corner_radius, 0.0, min_dim * 0.5);
        let mut smoothing = c.at_least("smoothing", self.smoothing, 0.0);
        if smoothing < EPSILON {
            smoothing = 0.0;
        }
        let ior = c.range("ior", self.ior, 1.0, 3.0);
        let thickness = c.within("thickness", self.thickness, MAX_LENGTH_PX);
        let normal_strength = c.at_least("normalStrength", self.normal_strength, 0.0);
        let displacement_scale =
            c.range("displacementScale", self.displacement_scale, 0.0, MAX_DISPLACEMENT_SCALE);
        let transition_width = c.at_least("transitionWidth", self.transition_width, EPSILON);
        let blur_radius = c.range("blurRadius", self.blur_radius, 0.0, MAX_LENGTH_PX);
        let chromatic_aberration =
            c.range("chromaticAberration", self.chromatic_aberration, 0.0, MAX_LENGTH_PX);
        let brightness = c.at_least("brightness", self.brightness, 0.0);
        let highlight_width = c.at_least("highlightWidth", self.highlight_width, EPSILON);
        let edge_falloff_exponent =
            c.at_least("edgeFalloffExponent", self.edge_falloff_exponent, EPSILON);
        let edge_band_fraction = c.range("edgeBandFraction", self.edge_band_fraction, 0.05, 0.5);
        let refraction_inset = c.at_least("refractionInset", self.refraction_inset, 0.0);
        let shadow_softness = c.range("shadowSoftness", self.shadow_softness, 0.0, 1.0);
        let shadow_color = c.color("shadowColor", self.shadow_color);
        let overlay_color = c.color("overlayColor", self.overlay_color);

        let resolved = ResolvedGlass {
            size,
            half_size: size * 0.5,
            corner_radius,
            smoothing,
            ior,
            thickness,
            normal_strength,
            displacement_scale,
            transition_width,
            blur_radius,
            chromatic_aberration,
            brightness,
            highlight_width,
            edge_falloff_exponent,
            edge_band: (edge_band_fraction * min_dim).max(EPSILON),
            refraction_inset,
            opacity_inset: refraction_inset.max(MIN_OPACITY_INSET),
            shadow_color,
            shadow_falloff: (shadow_softness * 0.5 * min_dim).max(EPSILON),
            overlay_color,
            show_normals: self.show_normals,
        };
        (resolved, c.adjustments)
    }
}

pub fn parse_params_json(text: &str) -> Result<GlassSurfaceParameters> {
    serde_json::from_str(text).context("invalid glass parameter JSON")
}

pub fn load_params_from_path(path: impl AsRef<Path>) -> Result<GlassSurfaceParameters> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read parameters from {}", path.display()))?;
    parse_params_json(&text).with_context(|| format!("while loading {}", path.display()))
}
