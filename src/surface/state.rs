use glam::Vec2;

use crate::background::BackgroundImage;
use crate::params::{GlassSurfaceParameters, ParamAdjustment, ResolvedGlass};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfacePhase {
    /// Initialised, still showing the placeholder background.
    BackgroundPending,
    Ready,
    Destroyed,
}

/// Everything one frame reads, copied out of the surface state before sampling starts.
#[derive(Debug, Clone)]
pub struct FrameSnapshot {
    pub frame_index: u64,
    pub params: GlassSurfaceParameters,
    pub glass: ResolvedGlass,
    pub background: BackgroundImage,
    /// Bumped whenever `background` is replaced, so backends can skip re-uploads.
    pub background_generation: u64,
    pub viewport: (u32, u32),
    pub pointer: Option<Vec2>,
}

impl FrameSnapshot {
    /// Build a one-off snapshot outside of a render thread.
    pub fn new(
        params: GlassSurfaceParameters,
        background: BackgroundImage,
        viewport: (u32, u32),
    ) -> Self {
        let (glass, _) = params.resolve();
        Self {
            frame_index: 0,
            params,
            glass,
            background,
            background_generation: 0,
            viewport,
            pointer: None,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.viewport.0 == 0 || self.viewport.1 == 0 || self.glass.is_degenerate()
    }
}

/// State owned by a surface's render thread.
#[derive(Debug)]
pub struct RenderSurfaceState {
    params: GlassSurfaceParameters,
    glass: ResolvedGlass,
    background: Option<BackgroundImage>,
    placeholder: BackgroundImage,
    background_generation: u64,
    viewport: (u32, u32),
    pointer: Option<Vec2>,
    phase: SurfacePhase,
    frame_counter: u64,
    damaged: bool,
}

impl RenderSurfaceState {
    pub fn new(params: GlassSurfaceParameters, viewport: (u32, u32)) -> Self {
        let (glass, _) = params.resolve();
        Self {
            params,
            glass,
            background: None,
            placeholder: BackgroundImage::placeholder(viewport),
            background_generation: 0,
            viewport,
            pointer: None,
            phase: SurfacePhase::BackgroundPending,
            frame_counter: 0,
            damaged: false,
        }
    }

    /// Replace the parameter bundle. Returns the clamps that were applied.
    pub fn set_parameters(&mut self, params: GlassSurfaceParameters) -> Vec<ParamAdjustment> {
        let (glass, adjustments) = params.resolve();
        self.params = params;
        self.glass = glass;
        self.damaged = true;
        adjustments
    }

    pub fn update_background(&mut self, background: BackgroundImage) {
        self.background = Some(background);
        self.background_generation += 1;
        if self.phase == SurfacePhase::BackgroundPending {
            self.phase = SurfacePhase::Ready;
        }
        self.damaged = true;
    }

    pub fn resize(&mut self, viewport: (u32, u32)) {
        if viewport == self.viewport {
            return;
        }
        self.viewport = viewport;
        self.placeholder = BackgroundImage::placeholder(viewport);
        if self.background.is_none() {
            self.background_generation += 1;
        }
        self.damaged = true;
    }

    pub fn set_pointer(&mut self, pointer: Option<Vec2>) {
        self.pointer = pointer;
        self.damaged = true;
    }

    pub fn request_frame(&mut self) {
        self.damaged = true;
    }

    /// Returns whether anything changed since the last call, and clears the flag.
    pub fn take_damage(&mut self) -> bool {
        std::mem::take(&mut self.damaged)
    }

    /// Advance the frame counter and copy the state out for the next frame.
    pub fn snapshot(&mut self) -> FrameSnapshot {
        self.frame_counter += 1;
        self.current()
    }

    /// Copy of the current state without starting a frame.
    pub fn current(&self) -> FrameSnapshot {
        FrameSnapshot {
            frame_index: self.frame_counter,
            params: self.params.clone(),
            glass: self.glass,
            background: self
                .background
                .clone()
                .unwrap_or_else(|| self.placeholder.clone()),
            background_generation: self.background_generation,
            viewport: self.viewport,
            pointer: self.pointer,
        }
    }

    pub fn mark_destroyed(&mut self) {
        self.phase = SurfacePhase::Destroyed;
        self.background = None;
    }

    pub fn phase(&self) -> SurfacePhase {
        self.phase
    }

    pub fn params(&self) -> &GlassSurfaceParameters {
        &self.params
    }

    pub fn glass(&self) -> &ResolvedGlass {
        &self.glass
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    pub fn pointer(&self) -> Option<Vec2> {
        self.pointer
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_counter
    }
}
