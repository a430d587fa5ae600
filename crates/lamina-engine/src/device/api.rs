use super::DeviceError;

/// Identity of one GPU context (e.g. one canvas/surface).
///
/// Used as a secondary cache key so one logical program can hold a compiled
/// handle per context without cross-invalidation.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ContextId(pub u32);

/// Opaque handle to a compiled+linked GPU program.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ProgramHandle(pub u32);

/// Opaque handle to a uniform location within a linked program.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct UniformLocation(pub u32);

/// Opaque handle to a device buffer (uniform-block backing storage).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct BufferHandle(pub u32);

/// Reference to a texture owned by the external texture collaborator.
///
/// The device maps it to a sampler unit via [`GpuDevice::bind_texture`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct TextureRef(pub u32);

/// Declared type of a reflected uniform.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum UniformType {
    Float,
    Vec2,
    Vec3,
    Vec4,
    Int,
    IVec2,
    IVec3,
    IVec4,
    Bool,
    BVec2,
    BVec3,
    BVec4,
    Mat2,
    Mat3,
    Mat4,
    Sampler2D,
}

impl UniformType {
    /// Scalar components per element of this type.
    pub fn component_count(self) -> usize {
        match self {
            UniformType::Float | UniformType::Int | UniformType::Bool | UniformType::Sampler2D => 1,
            UniformType::Vec2 | UniformType::IVec2 | UniformType::BVec2 => 2,
            UniformType::Vec3 | UniformType::IVec3 | UniformType::BVec3 => 3,
            UniformType::Vec4 | UniformType::IVec4 | UniformType::BVec4 | UniformType::Mat2 => 4,
            UniformType::Mat3 => 9,
            UniformType::Mat4 => 16,
        }
    }

    /// Whether uploads for this type go through the float path.
    pub fn is_float(self) -> bool {
        matches!(
            self,
            UniformType::Float
                | UniformType::Vec2
                | UniformType::Vec3
                | UniformType::Vec4
                | UniformType::Mat2
                | UniformType::Mat3
                | UniformType::Mat4
        )
    }
}

/// One active uniform reflected from a linked program.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformInfo {
    pub name: String,
    pub ty: UniformType,
    /// Array length; `1` for non-array uniforms.
    pub size: u32,
    pub location: UniformLocation,
}

/// One active vertex attribute reflected from a linked program.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeInfo {
    pub name: String,
    pub location: u32,
    /// Scalar components per vertex.
    pub components: u32,
}

/// Result of compiling and reflecting a program on one context.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledProgram {
    pub handle: ProgramHandle,
    pub attributes: Vec<AttributeInfo>,
    pub uniforms: Vec<UniformInfo>,
}

impl CompiledProgram {
    /// Looks up a reflected uniform by name.
    ///
    /// Returns `None` for uniforms the shader compiler optimized out; callers
    /// treat that as "skip", not as an error.
    pub fn uniform(&self, name: &str) -> Option<&UniformInfo> {
        self.uniforms.iter().find(|u| u.name == name)
    }
}

/// The graphics-device contract consumed by the shader layer.
///
/// All calls are synchronous; the core is single-threaded and cooperative.
pub trait GpuDevice {
    /// Identity of the context this device renders into.
    fn context_id(&self) -> ContextId;

    /// Compiles and links a program, reflecting its active interface.
    fn compile_program(
        &mut self,
        vertex_src: &str,
        fragment_src: &str,
        name: &str,
    ) -> Result<CompiledProgram, DeviceError>;

    /// Makes `handle` the active program for subsequent uniform uploads.
    fn use_program(&mut self, handle: ProgramHandle);

    fn delete_program(&mut self, handle: ProgramHandle);

    /// Uploads float-typed uniform data (scalars, vecN, matN) by location.
    fn uniform_f32(&mut self, location: UniformLocation, ty: UniformType, data: &[f32]);

    /// Uploads int/bool/sampler-typed uniform data by location.
    fn uniform_i32(&mut self, location: UniformLocation, ty: UniformType, data: &[i32]);

    /// Binds a texture to a sampler unit, returning the unit index to upload
    /// as the sampler uniform value.
    fn bind_texture(&mut self, texture: &TextureRef, unit: u32) -> i32;

    fn create_buffer(&mut self) -> BufferHandle;

    /// Replaces the contents of a uniform-block backing buffer.
    fn write_buffer(&mut self, buffer: BufferHandle, data: &[u8]);

    fn delete_buffer(&mut self, buffer: BufferHandle);
}
