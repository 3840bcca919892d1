use std::path::Path;

use anyhow::{Context, Result, bail};
use image::RgbaImage;

use super::gpu::GpuContext;
use super::surface::GpuGlassSurface;
use crate::background::BackgroundImage;
use crate::params::GlassSurfaceParameters;
use crate::surface::{FrameSnapshot, render_once};

/// Render one frame on the GPU without a window and return the pixels.
///
/// A degenerate glass or viewport is a skipped frame: `Ok(None)`.
pub fn render_headless(
    params: &GlassSurfaceParameters,
    background: &BackgroundImage,
    viewport: (u32, u32),
) -> Result<Option<RgbaImage>> {
    let snapshot = FrameSnapshot::new(params.clone(), background.clone(), viewport);
    if snapshot.is_degenerate() {
        return Ok(None);
    }
    let ctx = GpuContext::new_headless()?;
    let mut surface = GpuGlassSurface::new(ctx);
    render_once(&mut surface, &snapshot)
}

/// Render and write a PNG. A degenerate glass writes a fully transparent frame.
pub fn render_to_png_headless(
    params: &GlassSurfaceParameters,
    background: &BackgroundImage,
    viewport: (u32, u32),
    output: &Path,
) -> Result<()> {
    if viewport.0 == 0 || viewport.1 == 0 {
        bail!("viewport {}x{} has no pixels to write", viewport.0, viewport.1);
    }
    let image = render_headless(params, background, viewport)?
        .unwrap_or_else(|| RgbaImage::new(viewport.0, viewport.1));
    save_png(&image, output)
}

pub fn save_png(image: &RgbaImage, output: &Path) -> Result<()> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output dir {}", parent.display()))?;
    }
    image
        .save(output)
        .with_context(|| format!("failed to write {}", output.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degenerate_glass_is_skipped_without_a_device() {
        let params = GlassSurfaceParameters {
            width: 0.0,
            ..Default::default()
        };
        let bg = BackgroundImage::placeholder((8, 8));
        assert!(render_headless(&params, &bg, (8, 8)).unwrap().is_none());
        assert!(render_headless(&GlassSurfaceParameters::default(), &bg, (0, 8))
            .unwrap()
            .is_none());
    }

    #[test]
    fn degenerate_glass_writes_a_transparent_png() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("empty.png");
        let params = GlassSurfaceParameters {
            height: -3.0,
            ..Default::default()
        };
        render_to_png_headless(&params, &BackgroundImage::placeholder((4, 4)), (6, 5), &out)
            .unwrap();
        let img = image::open(&out).unwrap().to_rgba8();
        assert_eq!(img.dimensions(), (6, 5));
        assert!(img.pixels().all(|p| p.0 == [0, 0, 0, 0]));
    }
}
