//! Color parsing and 8-bit channel conversion.

use anyhow::{Result, anyhow, bail};
use glam::Vec4;
use serde::{Deserialize, Serialize};

fn clamp01(x: f32) -> f32 {
    if x.is_nan() { 0.0 } else { x.clamp(0.0, 1.0) }
}

/// Convert an 8-bit unorm channel to `[0, 1]`.
pub fn unorm8_to_f32(v: u8) -> f32 {
    v as f32 / 255.0
}

/// Quantise a `[0, 1]` channel to 8 bits, round-to-nearest. Out of range and NaN inputs are clamped.
pub fn f32_to_unorm8(x: f32) -> u8 {
    (clamp01(x) * 255.0).round() as u8
}

pub fn vec4_to_rgba8(c: Vec4) -> [u8; 4] {
    [
        f32_to_unorm8(c.x),
        f32_to_unorm8(c.y),
        f32_to_unorm8(c.z),
        f32_to_unorm8(c.w),
    ]
}

/// Parse `#rrggbb` or `#rrggbbaa` (the leading `#` is optional).
pub fn parse_hex(s: &str) -> Result<[f32; 4]> {
    let hex = s.trim().trim_start_matches('#');
    if !hex.is_ascii() || (hex.len() != 6 && hex.len() != 8) {
        bail!("expected #rrggbb or #rrggbbaa, got {s:?}");
    }
    let mut out = [1.0f32; 4];
    for (i, slot) in out.iter_mut().enumerate().take(hex.len() / 2) {
        let byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16)
            .map_err(|e| anyhow!("invalid hex color {s:?}: {e}"))?;
        *slot = unorm8_to_f32(byte);
    }
    Ok(out)
}

/// Straight-alpha RGBA color with float channels.
///
/// Deserializes from `[r, g, b]`, `[r, g, b, a]`, `{ "r", "g", "b", "a"? }` or a hex string.
/// Always serializes as a 4-element array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ColorRepr", into = "[f32; 4]")]
pub struct Rgba(pub [f32; 4]);

impl Rgba {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self([r, g, b, a])
    }

    pub fn alpha(&self) -> f32 {
        self.0[3]
    }

    /// Channels clamped to `[0, 1]`.
    pub fn clamped(&self) -> Self {
        Self(self.0.map(clamp01))
    }

    pub fn to_vec4(&self) -> Vec4 {
        Vec4::from_array(self.0)
    }
}

impl From<Rgba> for [f32; 4] {
    fn from(c: Rgba) -> Self {
        c.0
    }
}

fn default_alpha() -> f32 {
    1.0
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ColorRepr {
    Array(Vec<f32>),
    Object {
        r: f32,
        g: f32,
        b: f32,
        #[serde(default = "default_alpha")]
        a: f32,
    },
    Hex(String),
}

impl TryFrom<ColorRepr> for Rgba {
    type Error = String;

    fn try_from(repr: ColorRepr) -> std::result::Result<Self, Self::Error> {
        match repr {
            ColorRepr::Array(v) => match v.as_slice() {
                [r, g, b] => Ok(Rgba::new(*r, *g, *b, 1.0)),
                [r, g, b, a] => Ok(Rgba::new(*r, *g, *b, *a)),
                other => Err(format!(
                    "color array must have 3 or 4 components, got {}",
                    other.len()
                )),
            },
            ColorRepr::Object { r, g, b, a } => Ok(Rgba::new(r, g, b, a)),
            ColorRepr::Hex(s) => parse_hex(&s).map(Rgba).map_err(|e| e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_without_alpha_is_opaque() {
        let c = parse_hex("#ff8000").unwrap();
        assert_eq!(c[0], 1.0);
        assert!((c[1] - 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(c[2], 0.0);
        assert_eq!(c[3], 1.0);
    }

    #[test]
    fn hex_with_alpha() {
        let c = parse_hex("00000040").unwrap();
        assert!((c[3] - 64.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn hex_rejects_bad_input() {
        assert!(parse_hex("#fff").is_err());
        assert!(parse_hex("#gg0000").is_err());
        assert!(parse_hex("#ééé").is_err());
    }

    #[test]
    fn deserializes_all_forms() {
        let a: Rgba = serde_json::from_str("[0.1, 0.2, 0.3, 0.4]").unwrap();
        assert_eq!(a, Rgba::new(0.1, 0.2, 0.3, 0.4));

        let b: Rgba = serde_json::from_str(r#"{"r": 1, "g": 0.5, "b": 0}"#).unwrap();
        assert_eq!(b, Rgba::new(1.0, 0.5, 0.0, 1.0));

        let c: Rgba = serde_json::from_str(r##""#ffffff""##).unwrap();
        assert_eq!(c, Rgba::new(1.0, 1.0, 1.0, 1.0));

        assert!(serde_json::from_str::<Rgba>("[1, 2]").is_err());
    }

    #[test]
    fn serializes_as_array() {
        let s = serde_json::to_string(&Rgba::new(0.0, 0.5, 1.0, 0.25)).unwrap();
        assert_eq!(s, "[0.0,0.5,1.0,0.25]");
    }

    #[test]
    fn unorm_quantisation_rounds_to_nearest() {
        assert_eq!(f32_to_unorm8(0.5), 128);
        assert_eq!(f32_to_unorm8(-1.0), 0);
        assert_eq!(f32_to_unorm8(2.0), 255);
        assert_eq!(f32_to_unorm8(f32::NAN), 0);
        assert_eq!(f32_to_unorm8(unorm8_to_f32(77)), 77);
    }
}
