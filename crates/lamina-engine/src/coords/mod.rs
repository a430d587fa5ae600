//! Coordinate and geometry types shared across the scene graph and renderers.
//!
//! Canonical CPU space:
//! - Logical pixels
//! - Origin top-left
//! - +X right, +Y down
//!
//! The scene graph composes [`Matrix`] transforms top-down and accumulates
//! [`Bounds`] bottom-up; [`Rect`] is the public query result type.

mod bounds;
mod matrix;
mod rect;
mod transform;
mod vec2;

pub use bounds::Bounds;
pub use matrix::{Decomposed, Matrix};
pub use rect::Rect;
pub use transform::Transform;
pub use vec2::Vec2;
