//! Lamina engine crate.
//!
//! This crate owns the scene-graph core (transforms, bounds, node tree) and
//! the shader/uniform synchronization layer that feeds a GPU rasterizer
//! through the [`device::GpuDevice`] interface.

pub mod coords;
pub mod device;
pub mod scene;
pub mod shader;

pub mod context;
pub mod logging;
