use super::{Program, SharedProgram, UniformGroup, UniformValue};

use std::cell::RefCell;
use std::rc::Rc;

/// A program paired with the uniform values to draw with.
///
/// The program is shared (and compiled once per context); the uniform group
/// is owned by the shader, though nested groups inside it may be shared with
/// other shaders.
pub struct Shader {
    pub program: SharedProgram,
    pub uniforms: UniformGroup,
}

impl Shader {
    pub fn new(program: SharedProgram, uniforms: UniformGroup) -> Self {
        Self { program, uniforms }
    }

    /// Builds a shader from raw source with a plain uniform map, wrapping
    /// the map into a group.
    pub fn from_source(
        vertex_src: &str,
        fragment_src: &str,
        name: &str,
        uniforms: impl IntoIterator<Item = (String, UniformValue)>,
    ) -> Self {
        let mut group = UniformGroup::new();
        for (name, value) in uniforms {
            group.set(&name, value);
        }
        Self {
            program: Rc::new(RefCell::new(Program::new(vertex_src, fragment_src, name))),
            uniforms: group,
        }
    }
}
