use super::Vec2;

/// Determinant threshold below which a matrix is treated as singular.
const DET_EPSILON: f32 = 1e-12;

/// Skew-delta threshold for [`Matrix::decompose`].
///
/// When the sum of the recovered skew angles is this close to `0` or `2π`,
/// the matrix is treated as a pure rotation. The comparison is a strict `<`:
/// a delta exactly at the threshold takes the rotation+skew branch.
const SKEW_EPSILON: f32 = 1e-5;

/// 2D affine map.
///
/// Layout matches the 3×3 column-major convention used by GPU mat3 uniforms:
///
/// ```text
/// | a  c  tx |
/// | b  d  ty |
/// | 0  0  1  |
/// ```
///
/// A point transforms as `x' = a·x + c·y + tx`, `y' = b·x + d·y + ty`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Matrix {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub tx: f32,
    pub ty: f32,
}

/// Result of [`Matrix::decompose`].
///
/// Decomposition is not unique when rotation and skew are ambiguous; see
/// [`Matrix::decompose`] for the policy applied near degenerate
/// configurations.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Decomposed {
    pub position: Vec2,
    pub scale: Vec2,
    pub rotation: f32,
    pub skew: Vec2,
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        tx: 0.0,
        ty: 0.0,
    };

    #[inline]
    pub const fn new(a: f32, b: f32, c: f32, d: f32, tx: f32, ty: f32) -> Self {
        Self { a, b, c, d, tx, ty }
    }

    #[inline]
    pub const fn from_translation(x: f32, y: f32) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, x, y)
    }

    #[inline]
    pub const fn from_scale(sx: f32, sy: f32) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    #[inline]
    pub fn from_rotation(radians: f32) -> Self {
        let (s, c) = radians.sin_cos();
        Self::new(c, s, -s, c, 0.0, 0.0)
    }

    #[inline]
    pub fn determinant(&self) -> f32 {
        self.a * self.d - self.b * self.c
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.a.is_finite()
            && self.b.is_finite()
            && self.c.is_finite()
            && self.d.is_finite()
            && self.tx.is_finite()
            && self.ty.is_finite()
    }

    /// Forward-transforms a point.
    #[inline]
    pub fn apply(&self, p: Vec2) -> Vec2 {
        Vec2::new(
            self.a * p.x + self.c * p.y + self.tx,
            self.b * p.x + self.d * p.y + self.ty,
        )
    }

    /// Inverse-transforms a point.
    ///
    /// Returns `None` for singular matrices (degenerate scale) instead of
    /// producing non-finite coordinates.
    #[inline]
    pub fn apply_inverse(&self, p: Vec2) -> Option<Vec2> {
        let det = self.determinant();
        if det.abs() < DET_EPSILON {
            return None;
        }
        let id = 1.0 / det;
        let x = p.x - self.tx;
        let y = p.y - self.ty;
        Some(Vec2::new(
            (self.d * x - self.c * y) * id,
            (self.a * y - self.b * x) * id,
        ))
    }

    /// Returns the inverse, or `None` if the matrix is singular.
    pub fn invert(&self) -> Option<Matrix> {
        let det = self.determinant();
        if det.abs() < DET_EPSILON {
            return None;
        }
        let id = 1.0 / det;
        Some(Matrix::new(
            self.d * id,
            -self.b * id,
            -self.c * id,
            self.a * id,
            (self.c * self.ty - self.d * self.tx) * id,
            (self.b * self.tx - self.a * self.ty) * id,
        ))
    }

    /// Composes `m` *before* `self`: `self = self ∘ m`.
    ///
    /// `m` acts in the local space first; `self` maps the result onward.
    /// This is the composition used for `world = parent_world.append(local)`.
    pub fn append(&mut self, m: &Matrix) {
        let a1 = self.a;
        let b1 = self.b;
        let c1 = self.c;
        let d1 = self.d;

        self.a = m.a * a1 + m.b * c1;
        self.b = m.a * b1 + m.b * d1;
        self.c = m.c * a1 + m.d * c1;
        self.d = m.c * b1 + m.d * d1;
        self.tx = m.tx * a1 + m.ty * c1 + self.tx;
        self.ty = m.tx * b1 + m.ty * d1 + self.ty;
    }

    /// Composes `m` *after* `self`: `self = m ∘ self`. Mirror of [`append`].
    ///
    /// [`append`]: Matrix::append
    pub fn prepend(&mut self, m: &Matrix) {
        let mut out = *m;
        out.append(self);
        *self = out;
    }

    /// Translates in the output space (applied after the current map).
    #[inline]
    pub fn translate(&mut self, x: f32, y: f32) {
        self.tx += x;
        self.ty += y;
    }

    /// Scales the output space.
    pub fn scale(&mut self, sx: f32, sy: f32) {
        self.a *= sx;
        self.b *= sy;
        self.c *= sx;
        self.d *= sy;
        self.tx *= sx;
        self.ty *= sy;
    }

    /// Rotates the output space by `radians`.
    pub fn rotate(&mut self, radians: f32) {
        let (s, c) = radians.sin_cos();
        let a1 = self.a;
        let c1 = self.c;
        let tx1 = self.tx;

        self.a = a1 * c - self.b * s;
        self.b = a1 * s + self.b * c;
        self.c = c1 * c - self.d * s;
        self.d = c1 * s + self.d * c;
        self.tx = tx1 * c - self.ty * s;
        self.ty = tx1 * s + self.ty * c;
    }

    /// Splits the map into position, scale, rotation and skew.
    ///
    /// When the recovered skew angles sum to (nearly) `0` or `2π` the matrix
    /// is a pure rotation: rotation takes the full angle and skew is zeroed.
    /// Otherwise rotation is zero and both skew components carry the angles.
    /// The boundary (delta exactly at [`SKEW_EPSILON`]) resolves to the
    /// rotation+skew branch.
    pub fn decompose(&self) -> Decomposed {
        let skew_x = -(-self.c).atan2(self.d);
        let skew_y = self.b.atan2(self.a);

        let delta = (skew_x + skew_y).abs();
        let (rotation, skew) =
            if delta < SKEW_EPSILON || (core::f32::consts::TAU - delta).abs() < SKEW_EPSILON {
                (skew_y, Vec2::ZERO)
            } else {
                (0.0, Vec2::new(skew_x, skew_y))
            };

        Decomposed {
            position: Vec2::new(self.tx, self.ty),
            scale: Vec2::new(
                (self.a * self.a + self.b * self.b).sqrt(),
                (self.c * self.c + self.d * self.d).sqrt(),
            ),
            rotation,
            skew,
        }
    }

    /// Expands to a column-major 3×3 array for mat3 uniform upload.
    #[inline]
    pub fn to_array9(&self) -> [f32; 9] {
        [
            self.a, self.b, 0.0, //
            self.c, self.d, 0.0, //
            self.tx, self.ty, 1.0,
        ]
    }
}
