use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

/// Device and queue shared by every glass program and surface created from it.
pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    adapter_info: wgpu::AdapterInfo,
}

impl GpuContext {
    /// Request an adapter and device with no presentation surface.
    pub fn new_headless() -> Result<Arc<Self>> {
        pollster::block_on(async {
            let instance = wgpu::Instance::default();
            let adapter = instance
                .request_adapter(&wgpu::RequestAdapterOptions {
                    power_preference: wgpu::PowerPreference::HighPerformance,
                    force_fallback_adapter: false,
                    compatible_surface: None,
                })
                .await
                .context("no suitable GPU adapter found")?;

            let adapter_info = adapter.get_info();
            let (device, queue) = adapter
                .request_device(&wgpu::DeviceDescriptor {
                    label: Some("prismal-glass device"),
                    ..Default::default()
                })
                .await
                .context("failed to create GPU device")?;

            info!(
                adapter = %adapter_info.name,
                backend = ?adapter_info.backend,
                "GPU context ready"
            );
            Ok(Arc::new(Self {
                device,
                queue,
                adapter_info,
            }))
        })
    }

    pub fn adapter_info(&self) -> &wgpu::AdapterInfo {
        &self.adapter_info
    }

    pub fn max_texture_dimension(&self) -> u32 {
        self.device.limits().max_texture_dimension_2d
    }
}
