//! Compute abstraction used to evaluate per-vertex terrain kernels.
//!
//! A [`ComputeDevice`] owns buffers and runs [`Kernel`]s over them. Two devices
//! ship with the crate: the wgpu device in [`wgpu`] and the sequential
//! [`ReferenceDevice`] in [`cpu`], which also backs the test suite.

pub mod cpu;
mod kernel;
pub mod wgpu;

use glam::Vec3;
use thiserror::Error;

pub use cpu::{ReferenceBuffer, ReferenceDevice};
pub use kernel::*;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ComputeError {
    #[error("No suitable GPU adapter found")]
    NoAdapter,
    #[error("Failed to request device: {0}")]
    RequestDevice(String),
    #[error("Failed to build compute pipelines: {0}")]
    Pipeline(String),
    #[error("Failed to allocate buffer '{label}': {reason}")]
    Allocation { label: String, reason: String },
    #[error("Kernel '{kernel}' buffer '{name}' holds {actual} elements, expected {expected}")]
    BufferSizeMismatch {
        kernel: &'static str,
        name: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("Kernel '{kernel}' buffer '{name}' has {actual} components per element, expected {expected}")]
    ComponentMismatch {
        kernel: &'static str,
        name: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("Kernel '{kernel}' parameter '{name}' is not bound")]
    UnboundParameter { kernel: &'static str, name: &'static str },
    #[error("Kernel '{kernel}' parameter '{name}' expects {expected} floats, got {actual}")]
    ParameterLength {
        kernel: &'static str,
        name: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("Kernel '{kernel}' buffer '{name}' is not bound")]
    UnboundBuffer { kernel: &'static str, name: &'static str },
    #[error("Dispatch of kernel '{kernel}' failed: {reason}")]
    Dispatch { kernel: &'static str, reason: String },
    #[error("Readback of buffer '{label}' failed: {reason}")]
    Readback { label: String, reason: String },
}

/// Which device the generator should run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComputeBackend {
    /// Prefer GPU; if GPU init fails, fall back to the reference device.
    #[default]
    Auto,
    /// Require GPU.
    GpuOnly,
    /// Force the sequential reference device.
    ReferenceOnly,
}

/// A device-resident array of `len` elements, each `components` floats wide.
///
/// Dropping the handle releases the device memory.
pub trait DeviceBuffer {
    fn label(&self) -> &str;
    fn len(&self) -> usize;
    fn components(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn size_bytes(&self) -> u64 {
        (self.len() * self.components() * std::mem::size_of::<f32>()) as u64
    }
}

/// Something that can allocate buffers and run kernels over them.
pub trait ComputeDevice {
    type Buffer: DeviceBuffer;

    /// Short human-readable device name for logs.
    fn name(&self) -> &str;

    /// Uploads positions as 4-component elements (`w = 0`).
    fn upload_vertices(&self, label: &str, vertices: &[Vec3]) -> Result<Self::Buffer, ComputeError>;

    /// Allocates a zeroed buffer of `len` elements.
    fn create_output(&self, label: &str, components: usize, len: usize) -> Result<Self::Buffer, ComputeError>;

    /// Runs `kernel` once per vertex; `invocations` must equal the bound buffer lengths.
    fn dispatch(
        &self,
        kernel: Kernel,
        params: &KernelParams,
        bindings: &BufferBindings<'_, Self::Buffer>,
        invocations: u32,
    ) -> Result<(), ComputeError>;

    /// Copies a buffer back to host memory, `len * components` floats.
    fn read_back(&self, buffer: &Self::Buffer) -> Result<Vec<f32>, ComputeError>;

    /// Number of buffers currently alive on the device.
    fn live_buffers(&self) -> usize;
}

/// Named buffer bindings for one dispatch.
pub struct BufferBindings<'a, B> {
    entries: Vec<(&'a str, &'a B)>,
}

impl<B> Default for BufferBindings<'_, B> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<'a, B: DeviceBuffer> BufferBindings<'a, B> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `buffer` under `name`, replacing an earlier binding of the same name.
    pub fn bind(mut self, name: &'a str, buffer: &'a B) -> Self {
        self.entries.retain(|(n, _)| *n != name);
        self.entries.push((name, buffer));
        self
    }

    pub fn get(&self, name: &str) -> Option<&'a B> {
        self.entries.iter().find(|(n, _)| *n == name).map(|(_, b)| *b)
    }

    /// Resolves the vertex and output bindings of `kernel` and checks their shapes.
    pub(crate) fn resolve(&self, kernel: Kernel, invocations: u32) -> Result<(&'a B, &'a B), ComputeError> {
        let vertices = self.require(kernel, VERTEX_BUFFER)?;
        let output = self.require(kernel, kernel.output_name())?;
        check_shape(kernel, VERTEX_BUFFER, vertices, 4, invocations)?;
        check_shape(kernel, kernel.output_name(), output, kernel.output_components(), invocations)?;
        if std::ptr::eq(vertices, output) {
            return Err(ComputeError::Dispatch {
                kernel: kernel.label(),
                reason: "input and output bindings alias the same buffer".to_string(),
            });
        }
        Ok((vertices, output))
    }

    fn require(&self, kernel: Kernel, name: &'static str) -> Result<&'a B, ComputeError> {
        self.get(name).ok_or(ComputeError::UnboundBuffer {
            kernel: kernel.label(),
            name,
        })
    }
}

fn check_shape<B: DeviceBuffer>(
    kernel: Kernel,
    name: &'static str,
    buffer: &B,
    components: usize,
    invocations: u32,
) -> Result<(), ComputeError> {
    if buffer.components() != components {
        return Err(ComputeError::ComponentMismatch {
            kernel: kernel.label(),
            name,
            expected: components,
            actual: buffer.components(),
        });
    }
    if buffer.len() != invocations as usize {
        return Err(ComputeError::BufferSizeMismatch {
            kernel: kernel.label(),
            name,
            expected: invocations as usize,
            actual: buffer.len(),
        });
    }
    Ok(())
}

/// Runs `kernel` over an uploaded vertex buffer and returns the output floats.
///
/// Creates the output buffer, binds it with `vertices`, dispatches one
/// invocation per vertex and reads the result back. The output buffer is
/// released before returning on every path.
pub fn run_vertex_kernel<D: ComputeDevice>(
    device: &D,
    kernel: Kernel,
    params: &KernelParams,
    vertices: &D::Buffer,
) -> Result<Vec<f32>, ComputeError> {
    let count = vertices.len();
    let invocations = u32::try_from(count).map_err(|_| ComputeError::Dispatch {
        kernel: kernel.label(),
        reason: format!("{count} invocations exceed the dispatch range"),
    })?;

    let output = device.create_output(kernel.output_name(), kernel.output_components(), count)?;
    let bindings = BufferBindings::new()
        .bind(VERTEX_BUFFER, vertices)
        .bind(kernel.output_name(), &output);
    device.dispatch(kernel, params, &bindings, invocations)?;

    let data = device.read_back(&output)?;
    let expected = count * kernel.output_components();
    if data.len() != expected {
        return Err(ComputeError::Readback {
            label: output.label().to_string(),
            reason: format!("expected {expected} floats, got {}", data.len()),
        });
    }
    Ok(data)
}
