//! Uniform upload strategies.
//!
//! For each (program, uniform-group shape) pair a [`UniformSyncer`] is built
//! once: every uniform in the group is resolved against the program's
//! reflected metadata and matched against an ordered list of upload
//! strategies. The result is a flat step list that the per-draw sync loop
//! executes directly — no per-frame re-analysis or type dispatch.
//!
//! Leaf steps carry their own cached copy of the last uploaded data and only
//! call the device when the value actually changed; caches are mutated in
//! place so subsequent diffs see the update. Uniforms declared in the group
//! but absent from reflection (optimized out by the shader compiler) are
//! dropped silently at build time.

use crate::device::{
    BufferHandle, CompiledProgram, GpuDevice, UniformLocation, UniformType,
};

use super::{ProgramId, UniformGroup, UniformValue};

/// Per-draw state threaded through a sync pass.
///
/// `texture_count` allocates sampler units from one shared counter across
/// every nested group synced within the same draw.
#[derive(Debug, Default)]
pub struct SyncData {
    pub texture_count: u32,
}

/// How one step uploads its uniform.
pub(crate) enum UploadKind {
    /// Compare-then-upload through a float cache (scalars, vecs, mats).
    CachedF32 {
        ty: UniformType,
        cache: Vec<f32>,
    },
    /// Compare-then-upload through an int cache.
    CachedI32 {
        ty: UniformType,
        cache: Vec<i32>,
    },
    /// Direct upload every sync (array uniforms).
    DirectF32 { ty: UniformType },
    DirectI32 { ty: UniformType },
    /// Bind the texture each draw; upload the sampler unit only on change.
    Sampler { cached_unit: Option<i32> },
    /// Recurse into a nested group through the context's syncer cache.
    NestedGroup,
    /// Pack the nested group std140-style into a device buffer.
    NestedUbo {
        buffer: BufferHandle,
        last_dirty: Option<u64>,
    },
}

/// One uniform to sync: name, reflected location, upload strategy state.
pub(crate) struct SyncStep {
    pub(crate) name: String,
    pub(crate) location: UniformLocation,
    pub(crate) kind: UploadKind,
}

/// Memoized upload procedure for one (program, group-shape) pair.
///
/// Built once, invoked per draw via
/// [`crate::context::RenderContext::bind_shader`].
pub struct UniformSyncer {
    pub(crate) program: ProgramId,
    pub(crate) steps: Vec<SyncStep>,
    /// Group epoch at the end of the last run; lets static groups skip
    /// re-diffing entirely until marked dirty again.
    pub(crate) last_dirty: Option<u64>,
}

impl UniformSyncer {
    /// Resolves the group's shape against the reflected program interface.
    ///
    /// `device` is only used to allocate backing buffers for ubo-flagged
    /// nested groups.
    pub(crate) fn build(
        program: ProgramId,
        compiled: &CompiledProgram,
        group: &UniformGroup,
        device: &mut dyn GpuDevice,
    ) -> Self {
        let mut steps = Vec::new();

        for (name, value) in group.iter() {
            // Nested groups are structural, not reflected leaf uniforms.
            if let UniformValue::Group(nested) = value {
                let kind = if nested.borrow().is_ubo() {
                    UploadKind::NestedUbo {
                        buffer: device.create_buffer(),
                        last_dirty: None,
                    }
                } else {
                    UploadKind::NestedGroup
                };
                steps.push(SyncStep {
                    name: name.to_owned(),
                    location: UniformLocation(0),
                    kind,
                });
                continue;
            }

            let Some(info) = compiled.uniform(name) else {
                // Common case: the shader compiler eliminated it.
                log::debug!("uniform '{name}' not in reflected interface; skipping");
                continue;
            };

            let kind = STRATEGIES
                .iter()
                .find_map(|strategy| strategy(info.ty, info.size, value))
                .unwrap_or_else(|| generic_strategy(info.ty, info.size));

            steps.push(SyncStep {
                name: name.to_owned(),
                location: info.location,
                kind,
            });
        }

        Self {
            program,
            steps,
            last_dirty: None,
        }
    }
}

// ── upload strategies ─────────────────────────────────────────────────────
//
// Ordered: the first strategy matching the (reflected type, declared size,
// value shape) wins. The generic fallback below always applies.

type Strategy = fn(UniformType, u32, &UniformValue) -> Option<UploadKind>;

const STRATEGIES: &[Strategy] = &[mat3_from_matrix, vec2_from_point, sampler];

/// mat3 × 1 fed by a [`crate::coords::Matrix`]: upload through the matrix's
/// own column-major
/// expansion, cached.
fn mat3_from_matrix(ty: UniformType, size: u32, value: &UniformValue) -> Option<UploadKind> {
    if ty == UniformType::Mat3 && size == 1 && matches!(value, UniformValue::Mat3(_)) {
        Some(UploadKind::CachedF32 {
            ty,
            cache: vec![f32::NAN; 9],
        })
    } else {
        None
    }
}

/// vec2 × 1 fed by a point-like value: cached scalar-pair compare-then-upload.
fn vec2_from_point(ty: UniformType, size: u32, value: &UniformValue) -> Option<UploadKind> {
    if ty == UniformType::Vec2 && size == 1 && matches!(value, UniformValue::Vec2(_)) {
        Some(UploadKind::CachedF32 {
            ty,
            cache: vec![f32::NAN; 2],
        })
    } else {
        None
    }
}

fn sampler(ty: UniformType, _size: u32, value: &UniformValue) -> Option<UploadKind> {
    if ty == UniformType::Sampler2D && matches!(value, UniformValue::Texture(_)) {
        Some(UploadKind::Sampler { cached_unit: None })
    } else {
        None
    }
}

/// Fallback: size-1 uniforms get a cache-and-compare slot sized to the type;
/// arrays are uploaded directly every sync.
fn generic_strategy(ty: UniformType, size: u32) -> UploadKind {
    if size == 1 {
        let components = ty.component_count();
        if ty.is_float() {
            UploadKind::CachedF32 {
                ty,
                cache: vec![f32::NAN; components],
            }
        } else {
            UploadKind::CachedI32 {
                ty,
                cache: vec![i32::MIN; components],
            }
        }
    } else if ty.is_float() {
        UploadKind::DirectF32 { ty }
    } else {
        UploadKind::DirectI32 { ty }
    }
}

// ── value serialization ───────────────────────────────────────────────────

/// Writes a float-typed value into `out`, returning the component count, or
/// `None` when the value shape cannot feed a float upload.
pub(crate) fn write_f32(value: &UniformValue, out: &mut [f32; 16]) -> Option<usize> {
    match value {
        UniformValue::Float(v) => {
            out[0] = *v;
            Some(1)
        }
        UniformValue::Vec2(v) => {
            out[0] = v.x;
            out[1] = v.y;
            Some(2)
        }
        UniformValue::Vec3(v) => {
            out[..3].copy_from_slice(v);
            Some(3)
        }
        UniformValue::Vec4(v) => {
            out[..4].copy_from_slice(v);
            Some(4)
        }
        UniformValue::Mat3(m) => {
            out[..9].copy_from_slice(&m.to_array9());
            Some(9)
        }
        UniformValue::Mat4(v) => {
            out.copy_from_slice(v);
            Some(16)
        }
        _ => None,
    }
}

/// Int counterpart of [`write_f32`].
pub(crate) fn write_i32(value: &UniformValue, out: &mut [i32; 4]) -> Option<usize> {
    match value {
        UniformValue::Int(v) => {
            out[0] = *v;
            Some(1)
        }
        UniformValue::IVec2(v) => {
            out[..2].copy_from_slice(v);
            Some(2)
        }
        _ => None,
    }
}

// ── uniform-block packing ─────────────────────────────────────────────────

/// Packs a group's values into std140 layout for a buffer write.
///
/// Alignment rules applied: scalars 4 bytes, vec2 8, vec3/vec4 16; mat3 is
/// three vec4-aligned columns, mat4 four. Array elements are vec4-aligned.
/// Nested groups and textures cannot live in a uniform block and are skipped
/// with a debug message.
pub(crate) fn pack_std140(group: &UniformGroup) -> Vec<u8> {
    let mut out: Vec<u8> = Vec::new();

    for (name, value) in group.iter() {
        match value {
            UniformValue::Float(v) => {
                align(&mut out, 4);
                push_f32s(&mut out, &[*v]);
            }
            UniformValue::Int(v) => {
                align(&mut out, 4);
                out.extend_from_slice(bytemuck::bytes_of(v));
            }
            UniformValue::Vec2(v) => {
                align(&mut out, 8);
                push_f32s(&mut out, &[v.x, v.y]);
            }
            UniformValue::IVec2(v) => {
                align(&mut out, 8);
                out.extend_from_slice(bytemuck::cast_slice(v));
            }
            UniformValue::Vec3(v) => {
                align(&mut out, 16);
                push_f32s(&mut out, v);
            }
            UniformValue::Vec4(v) => {
                align(&mut out, 16);
                push_f32s(&mut out, v);
            }
            UniformValue::Mat3(m) => {
                // Three vec4-aligned columns.
                let a = m.to_array9();
                for col in a.chunks(3) {
                    align(&mut out, 16);
                    push_f32s(&mut out, col);
                }
            }
            UniformValue::Mat4(v) => {
                align(&mut out, 16);
                push_f32s(&mut out, v);
            }
            UniformValue::FloatArray(values) => {
                for v in values {
                    align(&mut out, 16);
                    push_f32s(&mut out, &[*v]);
                }
            }
            UniformValue::IntArray(values) => {
                for v in values {
                    align(&mut out, 16);
                    out.extend_from_slice(bytemuck::bytes_of(v));
                }
            }
            UniformValue::Texture(_) | UniformValue::Group(_) => {
                log::debug!("'{name}' cannot be packed into a uniform block; skipping");
            }
        }
    }

    // Blocks are sized in 16-byte rows.
    align(&mut out, 16);
    out
}

fn align(out: &mut Vec<u8>, bytes: usize) {
    while out.len() % bytes != 0 {
        out.push(0);
    }
}

fn push_f32s(out: &mut Vec<u8>, values: &[f32]) {
    out.extend_from_slice(bytemuck::cast_slice(values));
}
