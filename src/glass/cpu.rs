//! Row-parallel CPU host for the pixel program.

use glam::Vec2;
use image::RgbaImage;
use rayon::prelude::*;

use super::composite::shade_pixel;
use crate::background::BackgroundImage;
use crate::color::vec4_to_rgba8;
use crate::params::ResolvedGlass;
use crate::surface::FrameSnapshot;

pub fn render_cpu(snapshot: &FrameSnapshot) -> RgbaImage {
    render_glass_rgba(&snapshot.glass, &snapshot.background, snapshot.viewport)
}

/// Evaluate every pixel of a `viewport`-sized frame. Discarded fragments are fully transparent.
pub fn render_glass_rgba(
    glass: &ResolvedGlass,
    background: &BackgroundImage,
    viewport: (u32, u32),
) -> RgbaImage {
    let (width, height) = viewport;
    let mut out = RgbaImage::new(width, height);
    if width == 0 || height == 0 || glass.is_degenerate() {
        return out;
    }

    let vp = Vec2::new(width as f32, height as f32);
    let row_bytes = width as usize * 4;
    out.par_chunks_mut(row_bytes)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, px) in row.chunks_exact_mut(4).enumerate() {
                let frag = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let rgba = shade_pixel(frag, vp, glass, background)
                    .map(vec4_to_rgba8)
                    .unwrap_or([0; 4]);
                px.copy_from_slice(&rgba);
            }
        });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::GlassSurfaceParameters;

    #[test]
    fn degenerate_glass_renders_transparent() {
        let (g, _) = GlassSurfaceParameters {
            width: 0.0,
            ..Default::default()
        }
        .resolve();
        let img = render_glass_rgba(&g, &BackgroundImage::placeholder((8, 8)), (8, 8));
        assert!(img.pixels().all(|p| p.0 == [0; 4]));
    }

    #[test]
    fn empty_viewport_is_empty_image() {
        let (g, _) = GlassSurfaceParameters::default().resolve();
        let img = render_glass_rgba(&g, &BackgroundImage::placeholder((8, 8)), (0, 5));
        assert_eq!(img.dimensions(), (0, 5));
    }

    #[test]
    fn rows_match_the_scalar_program() {
        let (g, _) = GlassSurfaceParameters {
            width: 30.0,
            height: 20.0,
            corner_radius: 6.0,
            ..Default::default()
        }
        .resolve();
        let bg = BackgroundImage::solid((32, 24), [20, 200, 90, 255]);
        let img = render_glass_rgba(&g, &bg, (32, 24));
        let vp = Vec2::new(32.0, 24.0);
        for (x, y) in [(16u32, 12u32), (2, 12), (0, 0), (31, 23)] {
            let want = shade_pixel(Vec2::new(x as f32 + 0.5, y as f32 + 0.5), vp, &g, &bg)
                .map(vec4_to_rgba8)
                .unwrap_or([0; 4]);
            assert_eq!(img.get_pixel(x, y).0, want, "pixel ({x}, {y})");
        }
    }
}
