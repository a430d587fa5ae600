use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::coords::{Matrix, Vec2};
use crate::device::TextureRef;

static NEXT_GROUP_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a uniform group; combined with [`super::ProgramId`] it keys
/// the memoized sync strategy for the group's shape.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct GroupId(u64);

/// Shared handle to a nested uniform group.
pub type SharedGroup = Rc<RefCell<UniformGroup>>;

/// One uniform value in a group.
///
/// Matrix- and point-typed values keep their native geometry types; the sync
/// layer serializes them with the source type's own expansion
/// ([`Matrix::to_array9`], x/y fields).
#[derive(Debug, Clone)]
pub enum UniformValue {
    Float(f32),
    Vec2(Vec2),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Int(i32),
    IVec2([i32; 2]),
    Mat3(Matrix),
    Mat4([f32; 16]),
    FloatArray(Vec<f32>),
    IntArray(Vec<i32>),
    Texture(TextureRef),
    /// Nested group for block-structured uniforms.
    Group(SharedGroup),
}

/// Named bag of shader uniform values, possibly nested.
///
/// Carries a `dirty_id` epoch bumped by [`update`]: static groups are only
/// re-diffed when that epoch moves, and buffer-backed (`ubo`) groups are only
/// re-packed then. Setting a value does *not* bump the epoch — values of
/// non-static groups are read live on every sync and the cache-and-compare
/// layer suppresses redundant uploads.
///
/// [`update`]: UniformGroup::update
#[derive(Debug)]
pub struct UniformGroup {
    id: GroupId,
    uniforms: Vec<(String, UniformValue)>,
    dirty_id: u64,
    is_static: bool,
    ubo: bool,
}

impl Default for UniformGroup {
    fn default() -> Self {
        Self::new()
    }
}

impl UniformGroup {
    pub fn new() -> Self {
        Self {
            id: GroupId(NEXT_GROUP_ID.fetch_add(1, Ordering::Relaxed)),
            uniforms: Vec::new(),
            dirty_id: 0,
            is_static: false,
            ubo: false,
        }
    }

    /// A group that skips re-diffing entirely once synced, until
    /// [`update`](UniformGroup::update) marks it dirty again.
    pub fn new_static() -> Self {
        let mut group = Self::new();
        group.is_static = true;
        group
    }

    /// A buffer-backed group (uniform block); synced through the buffer
    /// write path instead of per-uniform uploads.
    pub fn new_ubo(is_static: bool) -> Self {
        let mut group = Self::new();
        group.is_static = is_static;
        group.ubo = true;
        group
    }

    #[inline]
    pub fn id(&self) -> GroupId {
        self.id
    }

    #[inline]
    pub fn dirty_id(&self) -> u64 {
        self.dirty_id
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    #[inline]
    pub fn is_ubo(&self) -> bool {
        self.ubo
    }

    /// Marks the group changed, forcing the next sync to re-diff (static
    /// groups) or re-pack (ubo groups).
    #[inline]
    pub fn update(&mut self) {
        self.dirty_id += 1;
    }

    /// Sets or replaces a uniform value, preserving declaration order.
    pub fn set(&mut self, name: &str, value: UniformValue) {
        if let Some(slot) = self.uniforms.iter_mut().find(|(n, _)| n == name) {
            slot.1 = value;
        } else {
            self.uniforms.push((name.to_owned(), value));
        }
    }

    /// Nests a child group under `name`, returning the shared handle.
    pub fn add_group(&mut self, name: &str, group: UniformGroup) -> SharedGroup {
        let shared = Rc::new(RefCell::new(group));
        self.set(name, UniformValue::Group(shared.clone()));
        shared
    }

    pub fn get(&self, name: &str) -> Option<&UniformValue> {
        self.uniforms
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Uniforms in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &UniformValue)> {
        self.uniforms.iter().map(|(n, v)| (n.as_str(), v))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.uniforms.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.uniforms.is_empty()
    }
}
