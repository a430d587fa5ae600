//! Recording device used by uniform-sync tests.

use std::collections::HashMap;

use super::{
    AttributeInfo, BufferHandle, CompiledProgram, ContextId, DeviceError, GpuDevice, ProgramHandle,
    TextureRef, UniformInfo, UniformLocation, UniformType,
};

/// One recorded upload call.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    UseProgram(ProgramHandle),
    UniformF32(UniformLocation, UniformType, Vec<f32>),
    UniformI32(UniformLocation, UniformType, Vec<i32>),
    BindTexture(TextureRef, u32),
    WriteBuffer(BufferHandle, Vec<u8>),
    DeleteProgram(ProgramHandle),
    DeleteBuffer(BufferHandle),
}

/// A `GpuDevice` that performs no GPU work and records every call.
///
/// Reflection is canned: every compiled program exposes the uniforms handed
/// to [`MockDevice::with_uniforms`], with locations assigned in declaration
/// order.
pub(crate) struct MockDevice {
    context: ContextId,
    declared: Vec<(String, UniformType, u32)>,
    next_handle: u32,
    pub(crate) calls: Vec<Call>,
}

impl MockDevice {
    pub(crate) fn with_uniforms(declared: Vec<(&str, UniformType, u32)>) -> Self {
        Self {
            context: ContextId(1),
            declared: declared
                .into_iter()
                .map(|(n, t, s)| (n.to_owned(), t, s))
                .collect(),
            next_handle: 0,
            calls: Vec::new(),
        }
    }

    /// Number of uniform-upload calls recorded for `location`.
    pub(crate) fn upload_count(&self, location: UniformLocation) -> usize {
        self.calls
            .iter()
            .filter(|c| match c {
                Call::UniformF32(l, _, _) | Call::UniformI32(l, _, _) => *l == location,
                _ => false,
            })
            .count()
    }

    /// Buffer-write call count for `buffer`.
    pub(crate) fn buffer_write_count(&self, buffer: BufferHandle) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, Call::WriteBuffer(b, _) if *b == buffer))
            .count()
    }

    /// Locations keyed by declared uniform name, as reflection assigns them.
    pub(crate) fn locations(&self) -> HashMap<String, UniformLocation> {
        self.declared
            .iter()
            .enumerate()
            .map(|(i, (n, _, _))| (n.clone(), UniformLocation(i as u32)))
            .collect()
    }
}

impl GpuDevice for MockDevice {
    fn context_id(&self) -> ContextId {
        self.context
    }

    fn compile_program(
        &mut self,
        _vertex_src: &str,
        _fragment_src: &str,
        _name: &str,
    ) -> Result<CompiledProgram, DeviceError> {
        self.next_handle += 1;
        Ok(CompiledProgram {
            handle: ProgramHandle(self.next_handle),
            attributes: vec![AttributeInfo {
                name: "aVertexPosition".to_owned(),
                location: 0,
                components: 2,
            }],
            uniforms: self
                .declared
                .iter()
                .enumerate()
                .map(|(i, (name, ty, size))| UniformInfo {
                    name: name.clone(),
                    ty: *ty,
                    size: *size,
                    location: UniformLocation(i as u32),
                })
                .collect(),
        })
    }

    fn use_program(&mut self, handle: ProgramHandle) {
        self.calls.push(Call::UseProgram(handle));
    }

    fn delete_program(&mut self, handle: ProgramHandle) {
        self.calls.push(Call::DeleteProgram(handle));
    }

    fn uniform_f32(&mut self, location: UniformLocation, ty: UniformType, data: &[f32]) {
        self.calls.push(Call::UniformF32(location, ty, data.to_vec()));
    }

    fn uniform_i32(&mut self, location: UniformLocation, ty: UniformType, data: &[i32]) {
        self.calls.push(Call::UniformI32(location, ty, data.to_vec()));
    }

    fn bind_texture(&mut self, texture: &TextureRef, unit: u32) -> i32 {
        self.calls.push(Call::BindTexture(*texture, unit));
        unit as i32
    }

    fn create_buffer(&mut self) -> BufferHandle {
        self.next_handle += 1;
        BufferHandle(self.next_handle)
    }

    fn write_buffer(&mut self, buffer: BufferHandle, data: &[u8]) {
        self.calls.push(Call::WriteBuffer(buffer, data.to_vec()));
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) {
        self.calls.push(Call::DeleteBuffer(buffer));
    }
}
