//! Compute pipelines for the height and shading kernels.

use std::borrow::Cow;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use tracing::{debug, trace};
use wgpu::util::DeviceExt;

use super::context::GpuContext;
use crate::compute::{
    BufferBindings, ComputeDevice, ComputeError, DeviceBuffer, Kernel, KernelParams, PARAM_VEC4S,
};

/// Invocations per workgroup; must match `@workgroup_size` in the shaders.
pub const WORKGROUP_SIZE: u32 = 64;

/// Workgroups per dispatch dimension guaranteed by the default limits.
const MAX_GROUPS_PER_DIM: u32 = 65_535;

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct KernelUniforms {
    num_vertices: u32,
    // Invocations per row when the dispatch is split over y.
    row_stride: u32,
    _pad0: [u32; 2],
    values: [[f32; 4]; PARAM_VEC4S],
}

pub struct GpuBuffer {
    buffer: wgpu::Buffer,
    label: String,
    components: usize,
    len: usize,
    live: Arc<AtomicUsize>,
}

impl DeviceBuffer for GpuBuffer {
    fn label(&self) -> &str {
        &self.label
    }

    fn len(&self) -> usize {
        self.len
    }

    fn components(&self) -> usize {
        self.components
    }
}

impl Drop for GpuBuffer {
    fn drop(&mut self) {
        self.buffer.destroy();
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct GpuDevice {
    ctx: GpuContext,
    bgl: wgpu::BindGroupLayout,
    height_map: wgpu::ComputePipeline,
    shading_data: wgpu::ComputePipeline,
    live: Arc<AtomicUsize>,
}

impl GpuDevice {
    pub fn new(ctx: GpuContext) -> Result<Self, ComputeError> {
        ctx.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let noise = include_str!("shaders/noise.wgsl");
        let height_src = format!("{noise}\n{}", include_str!("shaders/height_map.wgsl"));
        let shading_src = format!("{noise}\n{}", include_str!("shaders/shading_data.wgsl"));
        let height_module = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("planetgen-height-map-wgsl"),
            source: wgpu::ShaderSource::Wgsl(Cow::Owned(height_src)),
        });
        let shading_module = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("planetgen-shading-data-wgsl"),
            source: wgpu::ShaderSource::Wgsl(Cow::Owned(shading_src)),
        });

        let storage = |binding: u32, read_only: bool| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };
        let bgl = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("planetgen-kernel-bgl"),
            entries: &[
                // Params
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<KernelUniforms>() as u64),
                    },
                    count: None,
                },
                // Vertices
                storage(1, true),
                // Output
                storage(2, false),
            ],
        });

        let pipeline_layout = ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("planetgen-kernel-pipeline-layout"),
            bind_group_layouts: &[&bgl],
            push_constant_ranges: &[],
        });

        let pipeline = |module: &wgpu::ShaderModule, kernel: Kernel| {
            ctx.device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(kernel.label()),
                layout: Some(&pipeline_layout),
                module,
                entry_point: Some(kernel.label()),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                cache: None,
            })
        };
        let height_map = pipeline(&height_module, Kernel::HeightMap);
        let shading_data = pipeline(&shading_module, Kernel::ShadingData);

        if let Some(err) = pollster::block_on(ctx.device.pop_error_scope()) {
            return Err(ComputeError::Pipeline(err.to_string()));
        }
        debug!(adapter = %ctx.adapter_name, "compute pipelines ready");

        Ok(Self {
            ctx,
            bgl,
            height_map,
            shading_data,
            live: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Convenience: request an adapter and build the pipelines.
    pub fn create() -> Result<Self, ComputeError> {
        let ctx = pollster::block_on(GpuContext::new())?;
        Self::new(ctx)
    }

    fn allocate(
        &self,
        label: &str,
        components: usize,
        len: usize,
        usage: wgpu::BufferUsages,
        contents: Option<&[u8]>,
    ) -> Result<GpuBuffer, ComputeError> {
        let size = len
            .checked_mul(components * std::mem::size_of::<f32>())
            .map(|s| s as u64)
            .ok_or_else(|| ComputeError::Allocation {
                label: label.to_string(),
                reason: "size overflows usize".to_string(),
            })?;
        let limit = self.ctx.max_storage_buffer_size();
        if size > limit {
            return Err(ComputeError::Allocation {
                label: label.to_string(),
                reason: format!("{size} bytes exceeds the device limit of {limit} bytes"),
            });
        }

        self.ctx.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        let buffer = match contents {
            Some(bytes) => self.ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytes,
                usage,
            }),
            None => self.ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size,
                usage,
                mapped_at_creation: false,
            }),
        };
        if let Some(err) = pollster::block_on(self.ctx.device.pop_error_scope()) {
            buffer.destroy();
            return Err(ComputeError::Allocation {
                label: label.to_string(),
                reason: err.to_string(),
            });
        }

        self.live.fetch_add(1, Ordering::SeqCst);
        trace!(label, bytes = size, "allocated GPU buffer");
        Ok(GpuBuffer {
            buffer,
            label: label.to_string(),
            components,
            len,
            live: Arc::clone(&self.live),
        })
    }

    fn pipeline(&self, kernel: Kernel) -> &wgpu::ComputePipeline {
        match kernel {
            Kernel::HeightMap => &self.height_map,
            Kernel::ShadingData => &self.shading_data,
        }
    }
}

/// Splits `groups` workgroups over x and y so neither exceeds the per-dimension limit.
fn dispatch_grid(groups: u32) -> (u32, u32) {
    let gx = groups.clamp(1, MAX_GROUPS_PER_DIM);
    (gx, groups.div_ceil(gx).max(1))
}

impl ComputeDevice for GpuDevice {
    type Buffer = GpuBuffer;

    fn name(&self) -> &str {
        &self.ctx.adapter_name
    }

    fn upload_vertices(&self, label: &str, vertices: &[Vec3]) -> Result<GpuBuffer, ComputeError> {
        let data: Vec<[f32; 4]> = vertices.iter().map(|v| [v.x, v.y, v.z, 0.0]).collect();
        self.allocate(
            label,
            4,
            vertices.len(),
            wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            Some(bytemuck::cast_slice(&data)),
        )
    }

    fn create_output(&self, label: &str, components: usize, len: usize) -> Result<GpuBuffer, ComputeError> {
        self.allocate(
            label,
            components,
            len,
            wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC | wgpu::BufferUsages::COPY_DST,
            None,
        )
    }

    fn dispatch(
        &self,
        kernel: Kernel,
        params: &KernelParams,
        bindings: &BufferBindings<'_, GpuBuffer>,
        invocations: u32,
    ) -> Result<(), ComputeError> {
        let (vertices, output) = bindings.resolve(kernel, invocations)?;
        let packed = params.pack(kernel)?;

        let (gx, gy) = dispatch_grid(invocations.div_ceil(WORKGROUP_SIZE));
        let mut values = [[0.0f32; 4]; PARAM_VEC4S];
        for (dst, src) in values.iter_mut().zip(packed.chunks_exact(4)) {
            dst.copy_from_slice(src);
        }
        let uniforms = KernelUniforms {
            num_vertices: invocations,
            row_stride: gx * WORKGROUP_SIZE,
            _pad0: [0; 2],
            values,
        };
        let params_buf = self.ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("planetgen-kernel-params"),
            contents: bytemuck::bytes_of(&uniforms),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        self.ctx.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let bind_group = self.ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("planetgen-kernel-bind-group"),
            layout: &self.bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: params_buf.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: vertices.buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: output.buffer.as_entire_binding(),
                },
            ],
        });

        let mut encoder = self.ctx.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("planetgen-kernel-encoder"),
        });
        {
            let mut cpass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some(kernel.label()),
                timestamp_writes: None,
            });
            cpass.set_pipeline(self.pipeline(kernel));
            cpass.set_bind_group(0, &bind_group, &[]);
            cpass.dispatch_workgroups(gx, gy, 1);
        }
        self.ctx.queue.submit(Some(encoder.finish()));
        let scope = pollster::block_on(self.ctx.device.pop_error_scope());
        self.ctx.device.poll(wgpu::Maintain::Wait);
        params_buf.destroy();

        if let Some(err) = scope {
            return Err(ComputeError::Dispatch {
                kernel: kernel.label(),
                reason: err.to_string(),
            });
        }
        trace!(kernel = kernel.label(), invocations, gx, gy, "dispatched kernel");
        Ok(())
    }

    fn read_back(&self, buffer: &GpuBuffer) -> Result<Vec<f32>, ComputeError> {
        let readback = self.allocate(
            &format!("{}-readback-buffer", buffer.label),
            buffer.components,
            buffer.len,
            wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            None,
        )?;

        let mut encoder = self.ctx.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("planetgen-readback-encoder"),
        });
        encoder.copy_buffer_to_buffer(&buffer.buffer, 0, &readback.buffer, 0, buffer.size_bytes());
        self.ctx.queue.submit(Some(encoder.finish()));

        let slice = readback.buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |r| {
            let _ = tx.send(r);
        });
        // Block until the mapping is ready.
        self.ctx.device.poll(wgpu::Maintain::Wait);
        let readback_error = |reason: String| ComputeError::Readback {
            label: buffer.label.clone(),
            reason,
        };
        rx.recv()
            .map_err(|e| readback_error(e.to_string()))?
            .map_err(|e| readback_error(e.to_string()))?;

        let data = slice.get_mapped_range();
        let out: Vec<f32> = bytemuck::cast_slice(&data).to_vec();
        drop(data);
        readback.buffer.unmap();
        Ok(out)
    }

    fn live_buffers(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}
