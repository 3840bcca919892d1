//! GPU frame backend: one uniform buffer, one background texture and one render target per
//! surface, rendered through a shared [`GlassProgram`].

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use image::RgbaImage;
use tracing::debug;

use super::gpu::GpuContext;
use super::program::{GlassProgram, OUTPUT_FORMAT};
use super::readback::{map_readback_buffer, padded_bytes_per_row, unpad_rows};
use super::uniforms::GlassUniforms;
use crate::background::BackgroundImage;
use crate::surface::{FrameBackend, FrameSnapshot};

const READBACK_TIMEOUT: Duration = Duration::from_secs(10);

struct UploadedBackground {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
    generation: u64,
    dimensions: (u32, u32),
}

struct RenderTarget {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    readback: wgpu::Buffer,
    size: (u32, u32),
    padded_row: u32,
}

struct SurfaceResources {
    program: Arc<GlassProgram>,
    uniform_buffer: wgpu::Buffer,
    background: Option<UploadedBackground>,
    target: Option<RenderTarget>,
}

enum ProgramSource {
    Compile(Arc<GpuContext>),
    Shared(Arc<GlassProgram>),
}

pub struct GpuGlassSurface {
    source: ProgramSource,
    resources: Option<SurfaceResources>,
}

impl GpuGlassSurface {
    /// Compile a private program during `initialize`.
    pub fn new(ctx: Arc<GpuContext>) -> Self {
        Self {
            source: ProgramSource::Compile(ctx),
            resources: None,
        }
    }

    /// Reuse an already compiled program.
    pub fn with_program(program: Arc<GlassProgram>) -> Self {
        Self {
            source: ProgramSource::Shared(program),
            resources: None,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.resources.is_some()
    }
}

fn upload_background(
    program: &GlassProgram,
    uniform_buffer: &wgpu::Buffer,
    background: &BackgroundImage,
    generation: u64,
) -> Result<UploadedBackground> {
    let ctx = program.context();
    let (width, height) = background.dimensions();
    let max = ctx.max_texture_dimension();
    if width > max || height > max {
        bail!("background {width}x{height} exceeds the device texture limit of {max}");
    }

    let size = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };
    let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("glass.background"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    ctx.queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        background.rgba().as_raw(),
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(width * 4),
            rows_per_image: Some(height),
        },
        size,
    );

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("glass.bind_group"),
        layout: program.bind_group_layout(),
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(program.sampler()),
            },
        ],
    });

    Ok(UploadedBackground {
        texture,
        bind_group,
        generation,
        dimensions: (width, height),
    })
}

fn create_target(ctx: &GpuContext, size: (u32, u32)) -> Result<RenderTarget> {
    let (width, height) = size;
    let max = ctx.max_texture_dimension();
    if width > max || height > max {
        bail!("viewport {width}x{height} exceeds the device texture limit of {max}");
    }
    let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("glass.target"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: OUTPUT_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let padded_row = padded_bytes_per_row(width);
    let readback = ctx.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("glass.readback"),
        size: padded_row as u64 * height as u64,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    Ok(RenderTarget {
        texture,
        view,
        readback,
        size,
        padded_row,
    })
}

impl SurfaceResources {
    fn sync_background(&mut self, frame: &FrameSnapshot) -> Result<()> {
        let current = self.background.as_ref().map(|b| (b.generation, b.dimensions));
        if current == Some((frame.background_generation, frame.background.dimensions())) {
            return Ok(());
        }
        let uploaded = upload_background(
            &self.program,
            &self.uniform_buffer,
            &frame.background,
            frame.background_generation,
        )?;
        if let Some(old) = self.background.replace(uploaded) {
            old.texture.destroy();
        }
        debug!(generation = frame.background_generation, "background uploaded");
        Ok(())
    }

    fn sync_target(&mut self, size: (u32, u32)) -> Result<()> {
        if self.target.as_ref().is_some_and(|t| t.size == size) {
            return Ok(());
        }
        let target = create_target(self.program.context(), size)?;
        if let Some(old) = self.target.replace(target) {
            old.texture.destroy();
            old.readback.destroy();
        }
        Ok(())
    }

    fn draw(&mut self, frame: &FrameSnapshot) -> Result<RgbaImage> {
        self.sync_background(frame)?;
        self.sync_target(frame.viewport)?;
        let (Some(background), Some(target)) = (&self.background, &self.target) else {
            bail!("glass surface resources missing after sync");
        };

        let ctx = self.program.context();
        let uniforms = GlassUniforms::new(&frame.glass, frame.viewport);
        ctx.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        let (width, height) = target.size;
        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("glass.encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("glass.pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(self.program.pipeline());
            pass.set_bind_group(0, &background.bind_group, &[]);
            pass.draw(0..3, 0..1);
        }
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &target.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &target.readback,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(target.padded_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        ctx.queue.submit(Some(encoder.finish()));

        let size = target.padded_row as u64 * height as u64;
        let bytes = map_readback_buffer(&ctx.device, &target.readback, size, READBACK_TIMEOUT)?;
        unpad_rows(&bytes, width, height, target.padded_row)
    }

    fn destroy(self) {
        self.uniform_buffer.destroy();
        if let Some(background) = self.background {
            background.texture.destroy();
        }
        if let Some(target) = self.target {
            target.texture.destroy();
            target.readback.destroy();
        }
    }
}

impl FrameBackend for GpuGlassSurface {
    fn name(&self) -> &'static str {
        "gpu"
    }

    fn initialize(&mut self, initial: &FrameSnapshot) -> Result<()> {
        if self.resources.is_some() {
            return Ok(());
        }
        let program = match &self.source {
            ProgramSource::Compile(ctx) => GlassProgram::compile(ctx.clone())?,
            ProgramSource::Shared(program) => program.clone(),
        };
        let uniform_buffer = program.context().device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("glass.uniforms"),
            size: std::mem::size_of::<GlassUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let resources = self.resources.insert(SurfaceResources {
            program,
            uniform_buffer,
            background: None,
            target: None,
        });

        // Upload limits are checked here so `spawn` reports them; teardown releases partial work.
        resources
            .sync_background(initial)
            .context("failed to upload the initial background")?;
        if initial.viewport.0 > 0 && initial.viewport.1 > 0 {
            resources
                .sync_target(initial.viewport)
                .context("failed to create the render target")?;
        }
        Ok(())
    }

    fn render(&mut self, frame: &FrameSnapshot) -> Result<Option<RgbaImage>> {
        if frame.is_degenerate() {
            return Ok(None);
        }
        let Some(resources) = self.resources.as_mut() else {
            bail!("GPU glass surface used before initialize");
        };

        let ctx = resources.program.context().clone();
        ctx.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let result = resources.draw(frame);
        if let Some(err) = pollster::block_on(ctx.device.pop_error_scope()) {
            bail!("GPU validation error while rendering glass: {err}");
        }
        result.map(Some).context("GPU glass frame failed")
    }

    fn teardown(&mut self) {
        if let Some(resources) = self.resources.take() {
            resources.destroy();
            debug!("GPU glass surface resources released");
        }
    }
}
