//! GPU host for the glass pixel program.
//!
//! - `wgsl`: the WGSL source, generated around the shared constants
//! - `validation`: naga validation, run before any GPU object exists
//! - `uniforms`: the uniform block layout
//! - `gpu`, `program`: device acquisition and the shareable compiled pipeline
//! - `surface`: per-surface textures and buffers, the [`FrameBackend`](crate::surface::FrameBackend) impl
//! - `readback`, `headless`: pulling frames back to the CPU and writing PNGs

pub mod gpu;
pub mod headless;
pub mod program;
pub mod readback;
pub mod surface;
pub mod uniforms;
pub mod validation;
pub mod wgsl;

pub use gpu::GpuContext;
pub use headless::{render_headless, render_to_png_headless, save_png};
pub use program::{GlassProgram, OUTPUT_FORMAT};
pub use surface::GpuGlassSurface;
pub use uniforms::GlassUniforms;
