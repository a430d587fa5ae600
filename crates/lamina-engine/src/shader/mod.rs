//! Shader program and uniform model.
//!
//! Responsibilities:
//! - describe a logical program (vertex + fragment source) independent of
//!   any GPU context, compiling lazily per context on first bind
//! - model uniform value trees ([`UniformGroup`]) with dirty epochs
//! - synchronize uniform values to the device with per-(program, group)
//!   memoized upload strategies ([`sync::UniformSyncer`])
//!
//! The per-draw entry point lives in [`crate::context::RenderContext`].

mod program;
mod shader;
mod uniforms;

pub mod sync;

pub use program::{substitute_placeholder, Program, ProgramId, SharedProgram};
pub use shader::Shader;
pub use uniforms::{GroupId, SharedGroup, UniformGroup, UniformValue};
