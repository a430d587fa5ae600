use super::{Matrix, Rect, Vec2};

/// Mutable axis-aligned bounding-box accumulator.
///
/// The empty set is represented as `(+∞, +∞, -∞, -∞)`; folding points into an
/// empty box works without special cases because `min(+∞, x) = x` and
/// `max(-∞, x) = x`. Union with an empty box is likewise a natural no-op.
///
/// `update_id` is a staleness stamp: owners compare it against their own
/// structural epoch to decide whether the cached box needs recomputing.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Bounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,

    /// Version stamp set by the owner when the box was last recomputed.
    pub update_id: u64,
}

impl Default for Bounds {
    fn default() -> Self {
        Self::new()
    }
}

impl Bounds {
    /// Creates an empty box.
    #[inline]
    pub const fn new() -> Self {
        Self {
            min_x: f32::INFINITY,
            min_y: f32::INFINITY,
            max_x: f32::NEG_INFINITY,
            max_y: f32::NEG_INFINITY,
            update_id: 0,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    /// Resets to the empty set. The `update_id` stamp is left untouched;
    /// owners restamp it after refilling.
    #[inline]
    pub fn clear(&mut self) {
        self.min_x = f32::INFINITY;
        self.min_y = f32::INFINITY;
        self.max_x = f32::NEG_INFINITY;
        self.max_y = f32::NEG_INFINITY;
    }

    /// Returns the box as a [`Rect`]; the empty set maps to [`Rect::ZERO`].
    #[inline]
    pub fn rect(&self) -> Rect {
        if self.is_empty() {
            Rect::ZERO
        } else {
            Rect::new(
                self.min_x,
                self.min_y,
                self.max_x - self.min_x,
                self.max_y - self.min_y,
            )
        }
    }

    #[inline]
    pub fn add_point(&mut self, p: Vec2) {
        self.min_x = self.min_x.min(p.x);
        self.min_y = self.min_y.min(p.y);
        self.max_x = self.max_x.max(p.x);
        self.max_y = self.max_y.max(p.y);
    }

    /// Unions an axis-aligned frame given by two corners.
    #[inline]
    pub fn add_frame(&mut self, x0: f32, y0: f32, x1: f32, y1: f32) {
        self.min_x = self.min_x.min(x0);
        self.min_y = self.min_y.min(y0);
        self.max_x = self.max_x.max(x1);
        self.max_y = self.max_y.max(y1);
    }

    /// Transforms all four corners of an axis-aligned frame by `matrix` and
    /// folds each into the box.
    ///
    /// This is the canonical "local AABB into parent/world space" primitive;
    /// the matrix-aware insertions below all reduce to it.
    pub fn add_frame_matrix(&mut self, matrix: &Matrix, x0: f32, y0: f32, x1: f32, y1: f32) {
        self.add_point(matrix.apply(Vec2::new(x0, y0)));
        self.add_point(matrix.apply(Vec2::new(x1, y0)));
        self.add_point(matrix.apply(Vec2::new(x0, y1)));
        self.add_point(matrix.apply(Vec2::new(x1, y1)));
    }

    /// Unions another box. Empty `other` is a natural no-op.
    #[inline]
    pub fn add_bounds(&mut self, other: &Bounds) {
        self.add_frame(other.min_x, other.min_y, other.max_x, other.max_y);
    }

    /// Unions another box mapped through `matrix`.
    pub fn add_bounds_matrix(&mut self, other: &Bounds, matrix: &Matrix) {
        if other.is_empty() {
            return;
        }
        self.add_frame_matrix(matrix, other.min_x, other.min_y, other.max_x, other.max_y);
    }

    /// Unions the intersection of `other` and `mask`.
    ///
    /// An empty intersection leaves the box unchanged.
    pub fn add_bounds_mask(&mut self, other: &Bounds, mask: &Bounds) {
        let min_x = other.min_x.max(mask.min_x);
        let min_y = other.min_y.max(mask.min_y);
        let max_x = other.max_x.min(mask.max_x);
        let max_y = other.max_y.min(mask.max_y);

        if min_x <= max_x && min_y <= max_y {
            self.add_frame(min_x, min_y, max_x, max_y);
        }
    }

    /// Unions `other` clipped to `area` (a filter-area style rect clip).
    ///
    /// An empty clipped region leaves the box unchanged.
    pub fn add_bounds_area(&mut self, other: &Bounds, area: &Rect) {
        let min_x = other.min_x.max(area.x);
        let min_y = other.min_y.max(area.y);
        let max_x = other.max_x.min(area.x + area.width);
        let max_y = other.max_y.min(area.y + area.height);

        if min_x <= max_x && min_y <= max_y {
            self.add_frame(min_x, min_y, max_x, max_y);
        }
    }

    /// Grows the box by `pad_x`/`pad_y` on every side.
    ///
    /// Padding an empty box is a no-op; padding never fabricates bounds.
    pub fn pad(&mut self, pad_x: f32, pad_y: f32) {
        if self.is_empty() {
            return;
        }
        self.min_x -= pad_x;
        self.min_y -= pad_y;
        self.max_x += pad_x;
        self.max_y += pad_y;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(x0: f32, y0: f32, x1: f32, y1: f32) -> Bounds {
        let mut b = Bounds::new();
        b.add_frame(x0, y0, x1, y1);
        b
    }

    // ── empty-set algebra ─────────────────────────────────────────────────

    #[test]
    fn new_box_is_empty() {
        let b = Bounds::new();
        assert!(b.is_empty());
        assert_eq!(b.rect(), Rect::ZERO);
    }

    #[test]
    fn pad_on_empty_is_noop() {
        let mut b = Bounds::new();
        b.pad(10.0, 10.0);
        assert!(b.is_empty());
    }

    #[test]
    fn union_with_empty_is_noop() {
        let mut b = filled(0.0, 0.0, 5.0, 5.0);
        let before = b;
        b.add_bounds(&Bounds::new());
        assert_eq!(b, before);
    }

    // ── insertion ─────────────────────────────────────────────────────────

    #[test]
    fn add_point_grows_box() {
        let mut b = Bounds::new();
        b.add_point(Vec2::new(1.0, 2.0));
        b.add_point(Vec2::new(-3.0, 4.0));
        assert_eq!(b.rect(), Rect::new(-3.0, 2.0, 4.0, 2.0));
    }

    #[test]
    fn add_frame_matrix_folds_transformed_corners() {
        let mut b = Bounds::new();
        let m = Matrix::from_rotation(core::f32::consts::FRAC_PI_2);
        // Unit square rotated 90°: corners land in x ∈ [-1, 0], y ∈ [0, 1].
        b.add_frame_matrix(&m, 0.0, 0.0, 1.0, 1.0);
        let r = b.rect();
        assert!((r.x - -1.0).abs() < 1e-5);
        assert!(r.y.abs() < 1e-5);
        assert!((r.width - 1.0).abs() < 1e-5);
        assert!((r.height - 1.0).abs() < 1e-5);
    }

    // ── masked union ──────────────────────────────────────────────────────

    #[test]
    fn mask_union_is_intersection() {
        let mut target = Bounds::new();
        let b = filled(0.0, 0.0, 10.0, 10.0);
        let mask = filled(5.0, 5.0, 20.0, 20.0);
        target.add_bounds_mask(&b, &mask);
        assert_eq!(target.rect(), Rect::new(5.0, 5.0, 5.0, 5.0));
    }

    #[test]
    fn mask_union_empty_intersection_is_noop() {
        let mut target = filled(0.0, 0.0, 1.0, 1.0);
        let before = target;
        let b = filled(0.0, 0.0, 10.0, 10.0);
        let mask = filled(100.0, 100.0, 200.0, 200.0);
        target.add_bounds_mask(&b, &mask);
        assert_eq!(target, before);
    }

    #[test]
    fn area_union_clips_to_rect() {
        let mut target = Bounds::new();
        let b = filled(0.0, 0.0, 10.0, 10.0);
        target.add_bounds_area(&b, &Rect::new(8.0, 8.0, 10.0, 10.0));
        assert_eq!(target.rect(), Rect::new(8.0, 8.0, 2.0, 2.0));
    }

    // ── pad ───────────────────────────────────────────────────────────────

    #[test]
    fn pad_grows_each_side() {
        let mut b = filled(0.0, 0.0, 10.0, 10.0);
        b.pad(1.0, 2.0);
        assert_eq!(b.rect(), Rect::new(-1.0, -2.0, 12.0, 14.0));
    }
}
