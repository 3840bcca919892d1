use anyhow::Result;
use image::RgbaImage;

use super::state::FrameSnapshot;
use crate::glass::cpu::render_cpu;

/// Something that turns frame snapshots into pixels. Owned by exactly one render thread.
pub trait FrameBackend: Send {
    fn name(&self) -> &'static str;

    /// Create GPU objects, validate programs and upload the initial background. Called once on
    /// the render thread before any frame, with the state the first frame will start from.
    fn initialize(&mut self, initial: &FrameSnapshot) -> Result<()>;

    /// `Ok(None)` means the frame was skipped (degenerate geometry).
    fn render(&mut self, frame: &FrameSnapshot) -> Result<Option<RgbaImage>>;

    /// Release every resource created by `initialize` or `render`.
    fn teardown(&mut self);
}

/// Reference evaluator on the CPU. No resources to manage.
#[derive(Debug, Default, Clone, Copy)]
pub struct CpuBackend;

impl FrameBackend for CpuBackend {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn initialize(&mut self, _initial: &FrameSnapshot) -> Result<()> {
        Ok(())
    }

    fn render(&mut self, frame: &FrameSnapshot) -> Result<Option<RgbaImage>> {
        if frame.is_degenerate() {
            return Ok(None);
        }
        Ok(Some(render_cpu(frame)))
    }

    fn teardown(&mut self) {}
}

impl<B: FrameBackend + ?Sized> FrameBackend for Box<B> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn initialize(&mut self, initial: &FrameSnapshot) -> Result<()> {
        (**self).initialize(initial)
    }

    fn render(&mut self, frame: &FrameSnapshot) -> Result<Option<RgbaImage>> {
        (**self).render(frame)
    }

    fn teardown(&mut self) {
        (**self).teardown()
    }
}
