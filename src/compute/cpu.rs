//! Sequential host implementation of [`ComputeDevice`].
//!
//! Evaluates kernels with the host noise functions. Used as the fallback when
//! no GPU is available and as the deterministic device in tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use glam::Vec3;
use parking_lot::Mutex;
use tracing::trace;

use super::{BufferBindings, ComputeDevice, ComputeError, DeviceBuffer, Kernel, KernelParams};

/// Matches wgpu's default `max_buffer_size`.
pub const DEFAULT_MAX_BUFFER_SIZE: u64 = 256 << 20;

#[derive(Debug, Clone)]
pub struct ReferenceDevice {
    max_buffer_size: u64,
    live: Arc<AtomicUsize>,
}

impl Default for ReferenceDevice {
    fn default() -> Self {
        Self::with_max_buffer_size(DEFAULT_MAX_BUFFER_SIZE)
    }
}

impl ReferenceDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// A device whose allocations fail above `bytes`.
    pub fn with_max_buffer_size(bytes: u64) -> Self {
        Self {
            max_buffer_size: bytes,
            live: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn max_buffer_size(&self) -> u64 {
        self.max_buffer_size
    }

    fn allocate(&self, label: &str, components: usize, data: Vec<f32>) -> Result<ReferenceBuffer, ComputeError> {
        let requested = (data.len() * std::mem::size_of::<f32>()) as u64;
        if requested > self.max_buffer_size {
            return Err(ComputeError::Allocation {
                label: label.to_string(),
                reason: format!(
                    "{requested} bytes exceeds the device limit of {} bytes",
                    self.max_buffer_size
                ),
            });
        }
        self.live.fetch_add(1, Ordering::SeqCst);
        trace!(label, bytes = requested, "allocated reference buffer");
        Ok(ReferenceBuffer {
            label: label.to_string(),
            components,
            len: data.len() / components.max(1),
            data: Mutex::new(data),
            live: Arc::clone(&self.live),
        })
    }
}

#[derive(Debug)]
pub struct ReferenceBuffer {
    label: String,
    components: usize,
    len: usize,
    data: Mutex<Vec<f32>>,
    live: Arc<AtomicUsize>,
}

impl DeviceBuffer for ReferenceBuffer {
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

impl Drop for ReferenceBuffer {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ComputeDevice for ReferenceDevice {
    type Buffer = ReferenceBuffer;

    fn name(&self) -> &str {
        "reference"
    }

    fn upload_vertices(&self, label: &str, vertices: &[Vec3]) -> Result<ReferenceBuffer, ComputeError> {
        let data: Vec<f32> = vertices.iter().flat_map(|v| [v.x, v.y, v.z, 0.0]).collect();
        self.allocate(label, 4, data)
    }

    fn create_output(&self, label: &str, components: usize, len: usize) -> Result<ReferenceBuffer, ComputeError> {
        let floats = len.checked_mul(components).ok_or_else(|| ComputeError::Allocation {
            label: label.to_string(),
            reason: "size overflows usize".to_string(),
        })?;
        if floats as u64 > self.max_buffer_size / 4 {
            return Err(ComputeError::Allocation {
                label: label.to_string(),
                reason: format!(
                    "{} bytes exceeds the device limit of {} bytes",
                    floats as u64 * 4,
                    self.max_buffer_size
                ),
            });
        }
        self.allocate(label, components, vec![0.0; floats])
    }

    fn dispatch(
        &self,
        kernel: Kernel,
        params: &KernelParams,
        bindings: &BufferBindings<'_, ReferenceBuffer>,
        invocations: u32,
    ) -> Result<(), ComputeError> {
        let (vertices, output) = bindings.resolve(kernel, invocations)?;
        let packed = params.pack(kernel)?;
        let width = kernel.output_components();

        let input = vertices.data.lock();
        let mut out = output.data.lock();
        for (pos, dst) in input.chunks_exact(4).zip(out.chunks_exact_mut(width)) {
            let value = kernel.evaluate(&packed, Vec3::new(pos[0], pos[1], pos[2]));
            dst.copy_from_slice(&value[..width]);
        }
        Ok(())
    }

    fn read_back(&self, buffer: &ReferenceBuffer) -> Result<Vec<f32>, ComputeError> {
        Ok(buffer.data.lock().clone())
    }

    fn live_buffers(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffers_are_counted() {
        let device = ReferenceDevice::new();
        assert_eq!(device.live_buffers(), 0);
        let a = device.create_output("a", 1, 8).unwrap();
        let b = device.upload_vertices("b", &[Vec3::ONE]).unwrap();
        assert_eq!(device.live_buffers(), 2);
        assert_eq!(a.len(), 8);
        assert_eq!(b.len(), 1);
        assert_eq!(b.components(), 4);
        drop(a);
        assert_eq!(device.live_buffers(), 1);
        drop(b);
        assert_eq!(device.live_buffers(), 0);
    }

    #[test]
    fn test_allocation_limit() {
        let device = ReferenceDevice::with_max_buffer_size(64);
        assert!(device.create_output("fits", 4, 4).is_ok());
        let err = device.create_output("too-big", 4, 5).unwrap_err();
        assert!(matches!(err, ComputeError::Allocation { ref label, .. } if label == "too-big"));
        assert!(device.upload_vertices("verts", &[Vec3::ZERO; 5]).is_err());
        assert_eq!(device.live_buffers(), 0);
    }

    #[test]
    fn test_upload_pads_to_vec4() {
        let device = ReferenceDevice::new();
        let buf = device.upload_vertices("v", &[Vec3::new(1.0, 2.0, 3.0)]).unwrap();
        assert_eq!(device.read_back(&buf).unwrap(), vec![1.0, 2.0, 3.0, 0.0]);
    }

    #[test]
    fn test_clones_share_live_count() {
        let device = ReferenceDevice::new();
        let other = device.clone();
        let _buf = other.create_output("x", 1, 1).unwrap();
        assert_eq!(device.live_buffers(), 1);
    }
}
