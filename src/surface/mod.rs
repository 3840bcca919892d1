//! Per-surface render thread, its command queue, and background capture scheduling.

pub mod backend;
pub mod capture;
pub mod command;
pub mod render_thread;
pub mod state;

pub use backend::{CpuBackend, FrameBackend};
pub use capture::{
    BackgroundSource, CaptureDebouncer, CaptureScheduler, CaptureStats, DebounceDecision,
    StaticBackground,
};
pub use command::{SurfaceCommand, SurfaceSender};
pub use render_thread::{
    FrameMode, RenderedFrame, SurfaceConfig, SurfaceHandle, SurfaceStats, render_once,
};
pub use state::{FrameSnapshot, RenderSurfaceState, SurfacePhase};
