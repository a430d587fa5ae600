use thiserror::Error;

use super::NodeId;

/// Structural scene-tree failures.
///
/// These fail loudly with the operation's bounds; indices are never silently
/// clamped.
#[derive(Debug, Error, PartialEq)]
pub enum SceneError {
    /// The node id does not exist in this tree (despawned or foreign).
    #[error("node {0:?} is not part of this tree")]
    UnknownNode(NodeId),

    /// A child index was outside the valid range for the operation.
    #[error("child index {index} out of bounds (container has {len} children)")]
    IndexOutOfBounds { index: usize, len: usize },

    /// The node is not a child of the given container.
    #[error("node {child:?} is not a child of {parent:?}")]
    NotAChild { parent: NodeId, child: NodeId },

    /// A child range was inverted or exceeded the container size.
    #[error("child range {begin}..{end} invalid (container has {len} children)")]
    RangeOutOfBounds {
        begin: usize,
        end: usize,
        len: usize,
    },

    /// Attaching the node would make it its own ancestor.
    #[error("adding {child:?} under {parent:?} would create a cycle")]
    WouldCycle { parent: NodeId, child: NodeId },
}
