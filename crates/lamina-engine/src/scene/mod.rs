//! Scene-graph node tree.
//!
//! Responsibilities:
//! - own the arena of nodes and their parent/child links
//! - propagate transforms top-down and fold bounds bottom-up
//! - provide deterministic child ordering (z-index + insertion order)
//!
//! Structural mutations go through [`SceneTree`]; per-node state (transform,
//! visibility, content) lives on [`Node`].

mod error;
mod node;
mod tree;

pub use error::SceneError;
pub use node::{Content, FrameContent, Node, NodeId};
pub use tree::{SceneEvent, SceneTree};
