use super::{Matrix, Vec2};

/// Hierarchical 2D transform with two-stage lazy recompute.
///
/// Owns a local and a world [`Matrix`]. Local is derived from position,
/// scale, pivot, skew and rotation; every setter bumps a write epoch
/// (`local_id`) and the local matrix is only rebuilt when that epoch moved.
/// World is `parent.world ∘ local` as of the last [`update`] call — it is
/// never kept eagerly in sync. Callers must update before reading
/// [`world_matrix`].
///
/// The world recompute is keyed on the parent's `world_id` epoch, so the
/// number of world recomputes is bounded by actual ancestor-chain changes,
/// not by frame count.
///
/// [`update`]: Transform::update
/// [`world_matrix`]: Transform::world_matrix
#[derive(Debug, Clone)]
pub struct Transform {
    local: Matrix,
    world: Matrix,

    position: Vec2,
    scale: Vec2,
    pivot: Vec2,
    skew: Vec2,
    rotation: f32,

    // Rotation+skew basis, refreshed when rotation or skew change.
    cx: f32,
    sx: f32,
    cy: f32,
    sy: f32,

    local_id: u64,
    current_local_id: u64,
    world_id: u64,
    parent_epoch: Option<u64>,
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform {
    /// World epoch used as the parent reference for root transforms.
    pub(crate) const ROOT_EPOCH: u64 = 0;

    pub fn new() -> Self {
        Self {
            local: Matrix::IDENTITY,
            world: Matrix::IDENTITY,
            position: Vec2::ZERO,
            scale: Vec2::ONE,
            pivot: Vec2::ZERO,
            skew: Vec2::ZERO,
            rotation: 0.0,
            cx: 1.0,
            sx: 0.0,
            cy: 0.0,
            sy: 1.0,
            local_id: 0,
            current_local_id: 0,
            world_id: Self::ROOT_EPOCH,
            parent_epoch: None,
        }
    }

    // ── accessors ─────────────────────────────────────────────────────────

    #[inline]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    #[inline]
    pub fn scale(&self) -> Vec2 {
        self.scale
    }

    #[inline]
    pub fn pivot(&self) -> Vec2 {
        self.pivot
    }

    #[inline]
    pub fn skew(&self) -> Vec2 {
        self.skew
    }

    #[inline]
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    /// World matrix as of the last [`update`](Transform::update).
    #[inline]
    pub fn world_matrix(&self) -> &Matrix {
        &self.world
    }

    /// World epoch; bumped each time the world matrix is recomposed.
    #[inline]
    pub fn world_id(&self) -> u64 {
        self.world_id
    }

    // ── setters (each bumps the local write epoch) ────────────────────────

    #[inline]
    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
        self.local_id += 1;
    }

    #[inline]
    pub fn set_scale(&mut self, scale: Vec2) {
        self.scale = scale;
        self.local_id += 1;
    }

    #[inline]
    pub fn set_pivot(&mut self, pivot: Vec2) {
        self.pivot = pivot;
        self.local_id += 1;
    }

    pub fn set_skew(&mut self, skew: Vec2) {
        self.skew = skew;
        self.update_basis();
        self.local_id += 1;
    }

    pub fn set_rotation(&mut self, radians: f32) {
        self.rotation = radians;
        self.update_basis();
        self.local_id += 1;
    }

    /// Adopts position/scale/rotation/skew from a decomposed matrix.
    /// The pivot is left untouched.
    pub fn set_from_matrix(&mut self, matrix: &Matrix) {
        let d = matrix.decompose();
        self.position = d.position;
        self.scale = d.scale;
        self.rotation = d.rotation;
        self.skew = d.skew;
        self.update_basis();
        self.local_id += 1;
    }

    fn update_basis(&mut self) {
        self.cx = (self.rotation + self.skew.y).cos();
        self.sx = (self.rotation + self.skew.y).sin();
        self.cy = -(self.rotation - self.skew.x).sin();
        self.sy = (self.rotation - self.skew.x).cos();
    }

    // ── lazy recompute ────────────────────────────────────────────────────

    /// Rebuilds the local matrix if any component changed since the last
    /// rebuild. Returns the (now current) local matrix.
    pub(crate) fn sync_local(&mut self) -> &Matrix {
        if self.local_id != self.current_local_id {
            self.local.a = self.cx * self.scale.x;
            self.local.b = self.sx * self.scale.x;
            self.local.c = self.cy * self.scale.y;
            self.local.d = self.sy * self.scale.y;
            self.local.tx =
                self.position.x - (self.pivot.x * self.local.a + self.pivot.y * self.local.c);
            self.local.ty =
                self.position.y - (self.pivot.x * self.local.b + self.pivot.y * self.local.d);

            self.current_local_id = self.local_id;
            // Local changed; the cached parent composition is unconditionally stale.
            self.parent_epoch = None;
        }
        &self.local
    }

    /// Two-stage lazy update against a parent transform.
    ///
    /// 1. Rebuild the local matrix if its write epoch moved (this also forces
    ///    stage 2).
    /// 2. Recompose `world = parent.world ∘ local` if the parent's world
    ///    epoch differs from the cached one, bumping this transform's own
    ///    `world_id` so children recompose next pass.
    pub fn update(&mut self, parent: &Transform) {
        self.update_with(&parent.world, parent.world_id);
    }

    /// Updates a root transform (identity parent frame).
    pub fn update_root(&mut self) {
        self.update_with(&Matrix::IDENTITY, Self::ROOT_EPOCH);
    }

    pub(crate) fn update_with(&mut self, parent_world: &Matrix, parent_world_id: u64) {
        self.sync_local();

        if self.parent_epoch != Some(parent_world_id) {
            self.world = *parent_world;
            self.world.append(&self.local);

            self.parent_epoch = Some(parent_world_id);
            self.world_id += 1;
        }
    }

    /// Forgets the cached parent composition, forcing a world recompose on
    /// the next update. Called on reparenting.
    #[inline]
    pub(crate) fn invalidate_parent_epoch(&mut self) {
        self.parent_epoch = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── epoch property ────────────────────────────────────────────────────

    #[test]
    fn repeated_update_without_mutation_is_stable() {
        let mut t = Transform::new();
        t.set_position(Vec2::new(3.0, 4.0));

        t.update_root();
        let world = *t.world_matrix();
        let id = t.world_id();

        t.update_root();
        assert_eq!(*t.world_matrix(), world);
        assert_eq!(t.world_id(), id);
    }

    #[test]
    fn setter_bumps_world_epoch_on_next_update() {
        let mut t = Transform::new();
        t.update_root();
        let id = t.world_id();

        t.set_position(Vec2::new(1.0, 0.0));
        t.update_root();
        assert_eq!(t.world_id(), id + 1);
        assert_eq!(t.world_matrix().tx, 1.0);
    }

    #[test]
    fn child_recomposes_only_when_parent_epoch_moves() {
        let mut parent = Transform::new();
        let mut child = Transform::new();
        parent.update_root();
        child.update(&parent);
        let child_id = child.world_id();

        // Parent untouched: child world cache stays valid.
        child.update(&parent);
        assert_eq!(child.world_id(), child_id);

        // Parent moved: child recomposes exactly once.
        parent.set_position(Vec2::new(5.0, 0.0));
        parent.update_root();
        child.update(&parent);
        assert_eq!(child.world_id(), child_id + 1);
        assert_eq!(child.world_matrix().tx, 5.0);
    }

    // ── composition ───────────────────────────────────────────────────────

    #[test]
    fn world_is_parent_world_composed_with_local() {
        let mut parent = Transform::new();
        parent.set_position(Vec2::new(10.0, 0.0));
        parent.set_scale(Vec2::new(2.0, 2.0));
        parent.update_root();

        let mut child = Transform::new();
        child.set_position(Vec2::new(1.0, 1.0));
        child.update(&parent);

        // Child origin: scaled by parent then translated.
        let p = child.world_matrix().apply(Vec2::ZERO);
        assert_eq!(p, Vec2::new(12.0, 2.0));
    }

    #[test]
    fn pivot_offsets_local_origin() {
        let mut t = Transform::new();
        t.set_position(Vec2::new(10.0, 10.0));
        t.set_pivot(Vec2::new(2.0, 3.0));
        t.update_root();

        // The pivot point lands on the position.
        assert_eq!(t.world_matrix().apply(Vec2::new(2.0, 3.0)), Vec2::new(10.0, 10.0));
    }

    #[test]
    fn rotation_feeds_local_basis() {
        let mut t = Transform::new();
        t.set_rotation(core::f32::consts::FRAC_PI_2);
        t.update_root();

        let p = t.world_matrix().apply(Vec2::new(1.0, 0.0));
        assert!(p.x.abs() < 1e-6);
        assert!((p.y - 1.0).abs() < 1e-6);
    }
}
