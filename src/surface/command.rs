use anyhow::{Result, anyhow};
use crossbeam_channel::Sender;
use glam::Vec2;

use crate::background::BackgroundImage;
use crate::params::GlassSurfaceParameters;

/// Messages understood by a surface's render thread. Applied in send order.
#[derive(Debug, Clone)]
pub enum SurfaceCommand {
    SetParameters(GlassSurfaceParameters),
    UpdateBackground(BackgroundImage),
    Resize { width: u32, height: u32 },
    SetPointer(Option<Vec2>),
    RequestFrame,
    /// Drops any queued work and tears the backend down.
    Shutdown,
}

/// Cloneable producer side of a surface's command queue.
#[derive(Debug, Clone)]
pub struct SurfaceSender {
    tx: Sender<SurfaceCommand>,
}

impl SurfaceSender {
    pub fn new(tx: Sender<SurfaceCommand>) -> Self {
        Self { tx }
    }

    pub fn send(&self, command: SurfaceCommand) -> Result<()> {
        self.tx
            .send(command)
            .map_err(|_| anyhow!("glass surface render thread has exited"))
    }

    pub fn set_parameters(&self, params: GlassSurfaceParameters) -> Result<()> {
        self.send(SurfaceCommand::SetParameters(params))
    }

    pub fn update_background(&self, background: BackgroundImage) -> Result<()> {
        self.send(SurfaceCommand::UpdateBackground(background))
    }

    pub fn resize(&self, width: u32, height: u32) -> Result<()> {
        self.send(SurfaceCommand::Resize { width, height })
    }

    pub fn set_pointer(&self, pointer: Option<Vec2>) -> Result<()> {
        self.send(SurfaceCommand::SetPointer(pointer))
    }

    pub fn request_frame(&self) -> Result<()> {
        self.send(SurfaceCommand::RequestFrame)
    }
}
