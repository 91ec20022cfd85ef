//! Headless wgpu context for compute workloads.

use tracing::info;

use crate::compute::ComputeError;

/// Holds a wgpu device/queue used for terrain compute.
///
/// Pipeline setup lives in `device.rs`.
pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub adapter_name: String,
}

impl GpuContext {
    /// Create a headless wgpu device/queue suitable for compute.
    pub async fn new() -> Result<Self, ComputeError> {
        let instance = wgpu::Instance::default();
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(ComputeError::NoAdapter)?;

        let adapter_info = adapter.get_info();
        info!(
            adapter = %adapter_info.name,
            backend = ?adapter_info.backend,
            "selected GPU adapter"
        );

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("planetgen-compute-device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::Performance,
                },
                None,
            )
            .await
            .map_err(|e| ComputeError::RequestDevice(e.to_string()))?;

        Ok(Self {
            device,
            queue,
            adapter_name: adapter_info.name,
        })
    }

    /// Largest buffer the kernels can bind as storage.
    pub fn max_storage_buffer_size(&self) -> u64 {
        let limits = self.device.limits();
        u64::from(limits.max_storage_buffer_binding_size).min(limits.max_buffer_size)
    }
}
