//! Captured background pixels behind a glass surface.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use glam::{Vec2, Vec4};
use image::RgbaImage;
use image::imageops::FilterType;

use crate::color::unorm8_to_f32;

/// Mid-gray shown until the first capture arrives.
pub const PLACEHOLDER_RGBA: [u8; 4] = [128, 128, 128, 255];

/// Immutable RGBA8 background. Cloning shares the pixels.
#[derive(Clone)]
pub struct BackgroundImage {
    pixels: Arc<RgbaImage>,
}

impl fmt::Debug for BackgroundImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (w, h) = self.dimensions();
        f.debug_struct("BackgroundImage")
            .field("width", &w)
            .field("height", &h)
            .finish()
    }
}

impl BackgroundImage {
    pub fn from_rgba(pixels: RgbaImage) -> Result<Self> {
        if pixels.width() == 0 || pixels.height() == 0 {
            bail!(
                "background image must not be empty, got {}x{}",
                pixels.width(),
                pixels.height()
            );
        }
        Ok(Self {
            pixels: Arc::new(pixels),
        })
    }

    pub fn solid(size: (u32, u32), rgba: [u8; 4]) -> Self {
        let (w, h) = (size.0.max(1), size.1.max(1));
        Self {
            pixels: Arc::new(RgbaImage::from_pixel(w, h, image::Rgba(rgba))),
        }
    }

    pub fn placeholder(size: (u32, u32)) -> Self {
        Self::solid(size, PLACEHOLDER_RGBA)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let img = image::open(path)
            .with_context(|| format!("failed to decode background {}", path.display()))?;
        Self::from_rgba(img.to_rgba8())
            .with_context(|| format!("background {} is unusable", path.display()))
    }

    /// Bilinear resample to `size`. Returns a shared clone when the size already matches.
    pub fn scaled_to(&self, size: (u32, u32)) -> Self {
        let (w, h) = (size.0.max(1), size.1.max(1));
        if self.dimensions() == (w, h) {
            return self.clone();
        }
        Self {
            pixels: Arc::new(image::imageops::resize(
                self.pixels.as_ref(),
                w,
                h,
                FilterType::Triangle,
            )),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn rgba(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn ptr_eq(&self, other: &BackgroundImage) -> bool {
        Arc::ptr_eq(&self.pixels, &other.pixels)
    }

    fn texel(&self, x: i64, y: i64) -> Vec4 {
        let (w, h) = self.dimensions();
        let x = x.clamp(0, w as i64 - 1) as u32;
        let y = y.clamp(0, h as i64 - 1) as u32;
        let p = self.pixels.get_pixel(x, y).0;
        Vec4::new(
            unorm8_to_f32(p[0]),
            unorm8_to_f32(p[1]),
            unorm8_to_f32(p[2]),
            unorm8_to_f32(p[3]),
        )
    }

    /// Linear filtering with clamp-to-edge addressing. Texel `i` is centered at `(i + 0.5) / size`.
    pub fn sample_bilinear(&self, uv: Vec2) -> Vec4 {
        let uv = if uv.is_finite() { uv } else { Vec2::ZERO };
        let (w, h) = self.dimensions();
        // Anything past one texel outside the edge samples the edge; keeps the casts in range.
        let x = (uv.x * w as f32 - 0.5).clamp(-1.0, w as f32);
        let y = (uv.y * h as f32 - 0.5).clamp(-1.0, h as f32);
        let x0 = x.floor();
        let y0 = y.floor();
        let fx = x - x0;
        let fy = y - y0;
        let (xi, yi) = (x0 as i64, y0 as i64);

        let top = self.texel(xi, yi).lerp(self.texel(xi + 1, yi), fx);
        let bottom = self.texel(xi, yi + 1).lerp(self.texel(xi + 1, yi + 1), fx);
        top.lerp(bottom, fy)
    }
}
