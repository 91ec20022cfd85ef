//! wgpu compute implementation of the terrain kernels.

mod context;
mod device;

pub use context::GpuContext;
pub use device::{GpuBuffer, GpuDevice, WORKGROUP_SIZE};
