use slotmap::SlotMap;

use crate::coords::{Bounds, Matrix, Rect, Transform};

use super::{Node, NodeId, SceneError};

/// Structural notification emitted by tree mutations.
///
/// Listeners observe side effects only; there is no further contract.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum SceneEvent {
    ChildAdded {
        parent: NodeId,
        child: NodeId,
        index: usize,
    },
    ChildRemoved {
        parent: NodeId,
        child: NodeId,
    },
}

/// Arena-owned scene graph.
///
/// Nodes are spawned detached and linked with explicit child operations.
/// Per frame, [`update_transforms`] walks a subtree top-down; bounds are
/// pulled lazily bottom-up via [`get_bounds`] and cached against a per-node
/// structural epoch, so repeated queries on a static subtree are O(1) after
/// the first.
///
/// Single-threaded by design; all caches are plain mutable state.
///
/// [`update_transforms`]: SceneTree::update_transforms
/// [`get_bounds`]: SceneTree::get_bounds
#[derive(Default)]
pub struct SceneTree {
    nodes: SlotMap<NodeId, Node>,
    listener: Option<Box<dyn FnMut(&SceneEvent)>>,
    bounds_recomputes: u64,
}

impl SceneTree {
    pub fn new() -> Self {
        Self::default()
    }

    // ── arena access ──────────────────────────────────────────────────────

    /// Adds a detached node to the tree, returning its handle.
    pub fn spawn(&mut self, node: Node) -> NodeId {
        self.nodes.insert(node)
    }

    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Registers the structural-event listener, replacing any previous one.
    pub fn set_listener(&mut self, listener: impl FnMut(&SceneEvent) + 'static) {
        self.listener = Some(Box::new(listener));
    }

    /// Number of bounds recomputations performed so far (diagnostic).
    #[inline]
    pub fn bounds_recompute_count(&self) -> u64 {
        self.bounds_recomputes
    }

    fn check(&self, id: NodeId) -> Result<(), SceneError> {
        if self.nodes.contains_key(id) {
            Ok(())
        } else {
            Err(SceneError::UnknownNode(id))
        }
    }

    fn emit(&mut self, event: SceneEvent) {
        if let Some(listener) = &mut self.listener {
            listener(&event);
        }
    }

    /// True if `ancestor` is `id` or appears on `id`'s parent chain.
    fn is_ancestor_or_self(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(c) = current {
            if c == ancestor {
                return true;
            }
            current = self.nodes[c].parent;
        }
        false
    }

    // ── structural operations ─────────────────────────────────────────────

    /// Appends `child` to `parent`'s children.
    ///
    /// If `child` is currently attached elsewhere it is detached first (a
    /// node lives in exactly one children list at a time). The child's
    /// world cache is invalidated so its next update recomposes against the
    /// new parent.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        self.check(parent)?;
        self.add_child_inner(parent, child, None)
    }

    /// Inserts `child` at `index` in `parent`'s children.
    ///
    /// Errors with [`SceneError::IndexOutOfBounds`] if `index > len`.
    pub fn add_child_at(
        &mut self,
        parent: NodeId,
        child: NodeId,
        index: usize,
    ) -> Result<(), SceneError> {
        self.check(parent)?;
        let len = self.nodes[parent].children.len();
        if index > len {
            return Err(SceneError::IndexOutOfBounds { index, len });
        }
        self.add_child_inner(parent, child, Some(index))
    }

    fn add_child_inner(
        &mut self,
        parent: NodeId,
        child: NodeId,
        index: Option<usize>,
    ) -> Result<(), SceneError> {
        self.check(child)?;
        if self.is_ancestor_or_self(child, parent) {
            return Err(SceneError::WouldCycle { parent, child });
        }

        // When the child moves within the same parent, detaching vacates a
        // slot in front of the requested index; account for it so the index
        // keeps meaning "before the element currently there" (and `len`
        // stays a valid append position).
        let prior_pos = if self.nodes[child].parent == Some(parent) {
            self.nodes[parent].children.iter().position(|&c| c == child)
        } else {
            None
        };

        self.detach(child);

        let len = self.nodes[parent].children.len();
        let index = match index {
            None => len,
            Some(mut i) => {
                if let Some(pos) = prior_pos {
                    if pos < i {
                        i -= 1;
                    }
                }
                i
            }
        };
        debug_assert!(index <= len);

        self.nodes[parent].children.insert(index, child);
        self.nodes[child].parent = Some(parent);
        self.nodes[child].transform.invalidate_parent_epoch();

        let p = &mut self.nodes[parent];
        p.sort_dirty = true;
        p.bounds_id += 1;

        self.emit(SceneEvent::ChildAdded { parent, child, index });
        Ok(())
    }

    /// Removes `child` from `parent`, leaving it detached.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        self.check(parent)?;
        self.check(child)?;
        if self.nodes[child].parent != Some(parent) {
            return Err(SceneError::NotAChild { parent, child });
        }
        self.detach(child);
        Ok(())
    }

    /// Removes and returns the child at `index`.
    pub fn remove_child_at(&mut self, parent: NodeId, index: usize) -> Result<NodeId, SceneError> {
        self.check(parent)?;
        let len = self.nodes[parent].children.len();
        if index >= len {
            return Err(SceneError::IndexOutOfBounds { index, len });
        }
        let child = self.nodes[parent].children[index];
        self.detach(child);
        Ok(child)
    }

    /// Removes the children in `begin..end` (`end` defaults to the current
    /// child count), returning them in prior order.
    ///
    /// Degenerate ranges are distinguished: the implicit default range on an
    /// empty container is a valid no-op; any other inverted, empty or
    /// out-of-range request errors.
    pub fn remove_children(
        &mut self,
        parent: NodeId,
        begin: usize,
        end: Option<usize>,
    ) -> Result<Vec<NodeId>, SceneError> {
        self.check(parent)?;
        let len = self.nodes[parent].children.len();
        let end = end.unwrap_or(len);

        if len == 0 && begin == 0 && end == 0 {
            return Ok(Vec::new());
        }
        if begin >= end || end > len {
            return Err(SceneError::RangeOutOfBounds { begin, end, len });
        }

        let removed: Vec<NodeId> = self.nodes[parent].children[begin..end].to_vec();
        for &child in &removed {
            self.detach(child);
        }
        Ok(removed)
    }

    /// Detaches `id` from its parent (if any): unlinks, invalidates the
    /// child's world cache, bumps the old parent's bounds epoch, notifies.
    fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.nodes[id].parent else {
            return;
        };

        let children = &mut self.nodes[parent].children;
        if let Some(pos) = children.iter().position(|&c| c == id) {
            children.remove(pos);
        }
        self.nodes[parent].bounds_id += 1;

        let node = &mut self.nodes[id];
        node.parent = None;
        node.transform.invalidate_parent_epoch();

        self.emit(SceneEvent::ChildRemoved { parent, child: id });
    }

    /// Detaches `id` and drops its entire subtree from the arena.
    ///
    /// Handles into the subtree become stale; the generational keys make any
    /// later use fail with [`SceneError::UnknownNode`] rather than aliasing.
    pub fn despawn(&mut self, id: NodeId) -> Result<(), SceneError> {
        self.check(id)?;
        self.detach(id);

        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(current) {
                stack.extend(node.children);
            }
        }
        Ok(())
    }

    // ── ordering ──────────────────────────────────────────────────────────

    /// Sets a node's z-index and marks its parent for re-sorting.
    pub fn set_z_index(&mut self, id: NodeId, z_index: i32) -> Result<(), SceneError> {
        self.check(id)?;
        let node = &mut self.nodes[id];
        if node.z_index == z_index {
            return Ok(());
        }
        node.z_index = z_index;
        if let Some(parent) = node.parent {
            self.nodes[parent].sort_dirty = true;
        }
        Ok(())
    }

    /// Stable-sorts `parent`'s children by z-index ascending.
    ///
    /// Ties keep the order the children held the last time sorting ran, so
    /// re-sorting with unchanged z-indices is idempotent. If every child has
    /// z == 0 the sort is skipped entirely.
    pub fn sort_children(&mut self, parent: NodeId) -> Result<(), SceneError> {
        self.check(parent)?;
        self.sort_children_of(parent);
        Ok(())
    }

    fn sort_children_of(&mut self, parent: NodeId) {
        let children = self.nodes[parent].children.clone();

        let mut sort_required = false;
        for (i, &child) in children.iter().enumerate() {
            let node = &mut self.nodes[child];
            node.last_sorted_index = i;
            if node.z_index != 0 {
                sort_required = true;
            }
        }

        if sort_required && children.len() > 1 {
            let mut sorted = children;
            sorted.sort_by_key(|&c| (self.nodes[c].z_index, self.nodes[c].last_sorted_index));
            self.nodes[parent].children = sorted;
        }

        self.nodes[parent].sort_dirty = false;
    }

    // ── transform propagation (top-down) ──────────────────────────────────

    /// Refreshes transforms for `root` and its visible descendants.
    ///
    /// Strictly top-down: a child is never updated before its parent within
    /// one pass. Invisible children neither update their transforms nor
    /// their descendants'; `renderable` does not gate this walk.
    ///
    /// A node's bounds epoch is bumped only when something in its subtree
    /// actually changed (transform epoch moved, a property toggled), which
    /// keeps repeated bounds queries on a static subtree cache-hits.
    pub fn update_transforms(&mut self, root: NodeId) -> Result<(), SceneError> {
        self.check(root)?;

        let (parent_world, parent_epoch, parent_alpha) = match self.nodes[root].parent {
            Some(p) => {
                let parent = &self.nodes[p];
                (
                    *parent.transform.world_matrix(),
                    parent.transform.world_id(),
                    parent.world_alpha,
                )
            }
            None => (Matrix::IDENTITY, Transform::ROOT_EPOCH, 1.0),
        };

        self.update_node(root, &parent_world, parent_epoch, parent_alpha);
        Ok(())
    }

    fn update_node(
        &mut self,
        id: NodeId,
        parent_world: &Matrix,
        parent_epoch: u64,
        parent_alpha: f32,
    ) -> bool {
        if self.nodes[id].sortable_children && self.nodes[id].sort_dirty {
            self.sort_children_of(id);
        }

        let node = &mut self.nodes[id];
        let epoch_before = node.transform.world_id();
        node.transform.update_with(parent_world, parent_epoch);
        let mut changed = node.transform.world_id() != epoch_before;
        changed |= node.take_props_dirty();
        node.world_alpha = node.alpha * parent_alpha;

        let world = *node.transform.world_matrix();
        let epoch = node.transform.world_id();
        let alpha = node.world_alpha;
        let children = node.children.clone();

        for child in children {
            if self.nodes[child].visible() {
                changed |= self.update_node(child, &world, epoch, alpha);
            }
        }

        if changed {
            self.nodes[id].bounds_id += 1;
        }
        changed
    }

    // ── bounds (bottom-up) ────────────────────────────────────────────────

    /// Recomputes `id`'s world bounds unconditionally, bottom-up.
    ///
    /// Child bounds are refreshed by explicit recursion before the parent
    /// folds them, so the fold always reads current data. Masked children
    /// contribute the intersection with their mask's bounds; children with a
    /// filter area contribute the area-clipped box.
    pub fn calculate_bounds(&mut self, id: NodeId) -> Result<(), SceneError> {
        self.check(id)?;
        self.calculate_bounds_inner(id);
        Ok(())
    }

    fn calculate_bounds_inner(&mut self, id: NodeId) {
        self.bounds_recomputes += 1;

        let mut acc = Bounds::new();
        {
            let node = &self.nodes[id];
            if let Some(content) = &node.content {
                content.add_bounds(node.transform.world_matrix(), &mut acc);
            }
        }

        let children = self.nodes[id].children.clone();
        for child in children {
            let skip = {
                let c = &self.nodes[child];
                !c.visible() || !c.renderable()
            };
            if skip {
                continue;
            }

            self.calculate_bounds_inner(child);
            let child_bounds = self.nodes[child].bounds;
            let mask = self.nodes[child].mask;
            let filter_area = self.nodes[child].filter_area;

            if let Some(mask_id) = mask {
                if self.nodes.contains_key(mask_id) {
                    self.calculate_bounds_inner(mask_id);
                    let mask_bounds = self.nodes[mask_id].bounds;
                    acc.add_bounds_mask(&child_bounds, &mask_bounds);
                } else {
                    log::debug!("mask node of {child:?} no longer exists; ignoring mask");
                    acc.add_bounds(&child_bounds);
                }
            } else if let Some(area) = filter_area {
                acc.add_bounds_area(&child_bounds, &area);
            } else {
                acc.add_bounds(&child_bounds);
            }
        }

        let node = &mut self.nodes[id];
        node.bounds = acc;
        node.bounds.update_id = node.bounds_id;
    }

    /// Refreshes everything a bounds query on `id` depends on: each ancestor
    /// on the chain up to the root (chain only, siblings untouched), then
    /// `id`'s own subtree.
    ///
    /// Visibility does not gate this refresh — an explicit query on a hidden
    /// node must still reflect pending moves; `visible` only gates the
    /// per-frame [`update_transforms`](SceneTree::update_transforms) walk.
    fn refresh_for_query(&mut self, id: NodeId) {
        let mut chain = Vec::new();
        let mut current = self.nodes[id].parent;
        while let Some(p) = current {
            chain.push(p);
            current = self.nodes[p].parent;
        }

        let mut world = Matrix::IDENTITY;
        let mut epoch = Transform::ROOT_EPOCH;
        let mut alpha = 1.0;
        for &ancestor in chain.iter().rev() {
            let node = &mut self.nodes[ancestor];
            let before = node.transform.world_id();
            node.transform.update_with(&world, epoch);
            if node.transform.world_id() != before {
                node.bounds_id += 1;
            }
            node.world_alpha = node.alpha * alpha;
            world = *node.transform.world_matrix();
            epoch = node.transform.world_id();
            alpha = node.world_alpha;
        }

        self.update_node(id, &world, epoch, alpha);
    }

    /// Returns `id`'s world-space bounds.
    ///
    /// Unless `skip_update` is set, the node's ancestor chain and own
    /// subtree are transform-refreshed first so the answer reflects pending
    /// moves, regardless of visibility. The bounds themselves are only
    /// recomputed when the cached box is stale against the node's structural
    /// epoch.
    pub fn get_bounds(&mut self, id: NodeId, skip_update: bool) -> Result<Rect, SceneError> {
        self.check(id)?;

        if !skip_update {
            self.refresh_for_query(id);
        }

        let node = &self.nodes[id];
        if node.bounds.update_id != node.bounds_id {
            self.calculate_bounds_inner(id);
        }
        Ok(self.nodes[id].bounds.rect())
    }

    /// Returns `id`'s bounds in its own local coordinate frame.
    ///
    /// Implemented as a pure fold against an explicit neutral reference
    /// frame: the node's own transform is ignored, children contribute
    /// through their (lazily refreshed) local matrices, and the world-bounds
    /// caches are never touched — a local query cannot falsely freshen or
    /// invalidate them.
    pub fn get_local_bounds(&mut self, id: NodeId) -> Result<Rect, SceneError> {
        self.check(id)?;
        let mut out = Bounds::new();
        self.local_bounds_into(id, &Matrix::IDENTITY, true, &mut out);
        Ok(out.rect())
    }

    fn local_bounds_into(&mut self, id: NodeId, frame: &Matrix, is_root: bool, out: &mut Bounds) {
        // The queried node itself is measured in the neutral frame; its own
        // local matrix applies only to descendants of the query root.
        let frame = if is_root {
            *frame
        } else {
            let mut m = *frame;
            m.append(self.nodes[id].transform.sync_local());
            m
        };

        {
            let node = &self.nodes[id];
            if let Some(content) = &node.content {
                content.add_bounds(&frame, out);
            }
        }

        let children = self.nodes[id].children.clone();
        for child in children {
            let skip = {
                let c = &self.nodes[child];
                !c.visible() || !c.renderable()
            };
            if skip {
                continue;
            }

            let mut child_bounds = Bounds::new();
            self.local_bounds_into(child, &frame, false, &mut child_bounds);

            let mask = self.nodes[child].mask;
            let filter_area = self.nodes[child].filter_area;

            if let Some(mask_id) = mask {
                if self.nodes.contains_key(mask_id) {
                    let mut mask_bounds = Bounds::new();
                    self.local_bounds_into(mask_id, &frame, false, &mut mask_bounds);
                    out.add_bounds_mask(&child_bounds, &mask_bounds);
                } else {
                    out.add_bounds(&child_bounds);
                }
            } else if let Some(area) = filter_area {
                out.add_bounds_area(&child_bounds, &area);
            } else {
                out.add_bounds(&child_bounds);
            }
        }
    }
}
