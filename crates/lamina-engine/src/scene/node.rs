use crate::coords::{Bounds, Matrix, Rect, Transform};

slotmap::new_key_type! {
    /// Generational handle of a scene node within a [`super::SceneTree`].
    pub struct NodeId;
}

/// Content capability: the content-only bounds hook of a node.
///
/// Nodes are plain containers by default; attaching a `Content` gives them
/// drawable extent of their own. This is an explicit optional capability
/// queried by presence (composition, not inheritance).
pub trait Content {
    /// Folds the content's extent, mapped through `world`, into `out`.
    fn add_bounds(&self, world: &Matrix, out: &mut Bounds);
}

/// Fixed local-space rectangle content (sprite-like leaves).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameContent {
    pub frame: Rect,
}

impl FrameContent {
    pub fn new(frame: Rect) -> Self {
        Self { frame }
    }
}

impl Content for FrameContent {
    fn add_bounds(&self, world: &Matrix, out: &mut Bounds) {
        let f = self.frame;
        out.add_frame_matrix(world, f.x, f.y, f.x + f.width, f.y + f.height);
    }
}

/// One entry in the scene tree.
///
/// A node lives in at most one parent's children list at a time; structural
/// links are owned and mutated by the [`super::SceneTree`]. Per-node state
/// (transform, visibility, content) is mutated here; changes that affect
/// cached bounds mark the node dirty so the next update pass restamps the
/// bounds epoch.
pub struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,

    /// Local/world transform. Mutate freely; the transform's own write epoch
    /// makes the next update pass pick the change up.
    pub transform: Transform,

    /// Cached world-space bounds; fresh iff `bounds.update_id == bounds_id`.
    pub(crate) bounds: Bounds,
    /// Structural/positional epoch, bumped on every change that can affect
    /// the bounds of this node or its subtree.
    pub(crate) bounds_id: u64,

    /// Flagged by property setters whose effect the transform epoch cannot
    /// see (visibility, content, mask, filter area).
    pub(crate) props_dirty: bool,

    visible: bool,
    renderable: bool,

    /// Own opacity; `world_alpha` is derived during the update pass.
    pub alpha: f32,
    pub(crate) world_alpha: f32,

    pub(crate) z_index: i32,
    /// Position held the last time sorting ran; the tie-breaker that keeps
    /// repeated sorts idempotent.
    pub(crate) last_sorted_index: usize,
    pub(crate) sort_dirty: bool,
    /// When set, the update pass sorts children by z-index before walking.
    pub sortable_children: bool,

    pub(crate) mask: Option<NodeId>,
    pub(crate) filter_area: Option<Rect>,
    pub(crate) content: Option<Box<dyn Content>>,
}

impl Default for Node {
    fn default() -> Self {
        Self::new()
    }
}

impl Node {
    /// Creates a detached, visible, renderable container node.
    pub fn new() -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            transform: Transform::new(),
            bounds: Bounds::new(),
            bounds_id: 1,
            props_dirty: false,
            visible: true,
            renderable: true,
            alpha: 1.0,
            world_alpha: 1.0,
            z_index: 0,
            last_sorted_index: 0,
            sort_dirty: false,
            sortable_children: false,
            mask: None,
            filter_area: None,
            content: None,
        }
    }

    /// Creates a node with drawable content.
    pub fn with_content(content: impl Content + 'static) -> Self {
        let mut node = Self::new();
        node.content = Some(Box::new(content));
        node
    }

    // ── accessors ─────────────────────────────────────────────────────────

    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[inline]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    #[inline]
    pub fn visible(&self) -> bool {
        self.visible
    }

    #[inline]
    pub fn renderable(&self) -> bool {
        self.renderable
    }

    /// Opacity after multiplication down the ancestor chain, as of the last
    /// update pass.
    #[inline]
    pub fn world_alpha(&self) -> f32 {
        self.world_alpha
    }

    #[inline]
    pub fn z_index(&self) -> i32 {
        self.z_index
    }

    #[inline]
    pub fn mask(&self) -> Option<NodeId> {
        self.mask
    }

    #[inline]
    pub fn filter_area(&self) -> Option<Rect> {
        self.filter_area
    }

    #[inline]
    pub fn content(&self) -> Option<&dyn Content> {
        self.content.as_deref()
    }

    // ── property setters ──────────────────────────────────────────────────
    //
    // `visible` gates the whole subtree's transform refresh during the
    // update pass; `renderable` only gates bounds/draw contribution.

    pub fn set_visible(&mut self, visible: bool) {
        if self.visible != visible {
            self.visible = visible;
            self.props_dirty = true;
        }
    }

    pub fn set_renderable(&mut self, renderable: bool) {
        if self.renderable != renderable {
            self.renderable = renderable;
            self.props_dirty = true;
        }
    }

    pub fn set_mask(&mut self, mask: Option<NodeId>) {
        self.mask = mask;
        self.props_dirty = true;
    }

    pub fn set_filter_area(&mut self, area: Option<Rect>) {
        self.filter_area = area;
        self.props_dirty = true;
    }

    pub fn set_content(&mut self, content: Option<Box<dyn Content>>) {
        self.content = content;
        self.props_dirty = true;
    }

    #[inline]
    pub(crate) fn take_props_dirty(&mut self) -> bool {
        core::mem::take(&mut self.props_dirty)
    }
}
