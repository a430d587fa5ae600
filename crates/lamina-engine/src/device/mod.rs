//! Graphics-device interface.
//!
//! This module is the seam to the external graphics collaborator. The core
//! only requires that the device can:
//! - compile program text into an opaque handle
//! - reflect active attributes/uniforms with name + type + size
//! - accept typed uniform-upload calls by location handle
//! - bind textures to sampler units and write raw uniform buffers
//!
//! The actual GPU implementation (GL, wgpu, …) lives outside this crate.

mod api;
mod error;

#[cfg(test)]
pub(crate) mod mock;

pub use api::{
    AttributeInfo, BufferHandle, CompiledProgram, ContextId, GpuDevice, ProgramHandle, TextureRef,
    UniformInfo, UniformLocation, UniformType,
};
pub use error::DeviceError;
