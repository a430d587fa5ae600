//! Per-renderer registries: shared programs and memoized uniform syncers.
//!
//! [`RenderContext::bind_shader`] is the draw-time entry point: it compiles
//! the shader's program on first use, makes it active, and runs the memoized
//! [`UniformSyncer`] for the (program, group) pair — building it on the
//! first encounter and reusing it on every draw after that.

use std::collections::HashMap;
use std::rc::Rc;

use crate::device::{CompiledProgram, DeviceError, GpuDevice, UniformType};
use crate::shader::sync::{self, SyncData, UniformSyncer, UploadKind};
use crate::shader::{
    GroupId, Program, ProgramId, Shader, SharedProgram, UniformGroup, UniformValue,
};

/// Registries shared by every shader drawn through one renderer.
///
/// Single-threaded, like the scene it draws.
#[derive(Default)]
pub struct RenderContext {
    /// Programs deduplicated by source text: two shaders built from the same
    /// (vertex, fragment) pair share one logical program, and therefore one
    /// compiled handle per GPU context and one syncer per group shape.
    programs: HashMap<String, SharedProgram>,
    syncers: HashMap<(ProgramId, GroupId), UniformSyncer>,
}

impl RenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the shared program for this exact source pair, creating it on
    /// first request.
    pub fn program_from_source(
        &mut self,
        vertex_src: &str,
        fragment_src: &str,
        name: &str,
    ) -> SharedProgram {
        let key = format!("{vertex_src}\u{0}{fragment_src}");
        if let Some(program) = self.programs.get(&key) {
            return Rc::clone(program);
        }
        let program = Rc::new(std::cell::RefCell::new(Program::new(
            vertex_src,
            fragment_src,
            name,
        )));
        self.programs.insert(key, Rc::clone(&program));
        program
    }

    #[inline]
    pub fn program_count(&self) -> usize {
        self.programs.len()
    }

    #[inline]
    pub fn syncer_count(&self) -> usize {
        self.syncers.len()
    }

    /// Makes `shader` current on `device` and uploads its uniforms.
    ///
    /// Compilation and syncer construction happen on the first bind; later
    /// binds reuse both and only touch the device for values that changed
    /// since their last upload.
    pub fn bind_shader(
        &mut self,
        device: &mut dyn GpuDevice,
        shader: &mut Shader,
    ) -> Result<(), DeviceError> {
        let program = Rc::clone(&shader.program);
        let (program_id, compiled) = {
            let mut program = program.borrow_mut();
            let compiled = program.ensure_compiled(device)?.clone();
            (program.id(), compiled)
        };
        device.use_program(compiled.handle);

        let mut data = SyncData::default();
        self.sync_uniform_group(device, program_id, &compiled, &shader.uniforms, &mut data);
        Ok(())
    }

    /// Runs (building if needed) the syncer for one group against one
    /// program. Nested groups recurse here through their own syncers, so the
    /// (program, group) memoization holds at every nesting level.
    fn sync_uniform_group(
        &mut self,
        device: &mut dyn GpuDevice,
        program_id: ProgramId,
        compiled: &CompiledProgram,
        group: &UniformGroup,
        data: &mut SyncData,
    ) {
        let key = (program_id, group.id());
        // Removed for the duration of the run so nested groups can recurse
        // through `self` without aliasing the map entry.
        let mut syncer = self
            .syncers
            .remove(&key)
            .unwrap_or_else(|| UniformSyncer::build(program_id, compiled, group, device));
        debug_assert_eq!(syncer.program, program_id);

        if group.is_static() && syncer.last_dirty == Some(group.dirty_id()) {
            self.syncers.insert(key, syncer);
            return;
        }

        for step in &mut syncer.steps {
            let Some(value) = group.get(&step.name) else {
                continue;
            };
            match &mut step.kind {
                UploadKind::CachedF32 { ty, cache } => {
                    let mut scratch = [0f32; 16];
                    if let Some(n) = sync::write_f32(value, &mut scratch) {
                        if cache[..n] != scratch[..n] {
                            cache[..n].copy_from_slice(&scratch[..n]);
                            device.uniform_f32(step.location, *ty, &scratch[..n]);
                        }
                    }
                }
                UploadKind::CachedI32 { ty, cache } => {
                    let mut scratch = [0i32; 4];
                    if let Some(n) = sync::write_i32(value, &mut scratch) {
                        if cache[..n] != scratch[..n] {
                            cache[..n].copy_from_slice(&scratch[..n]);
                            device.uniform_i32(step.location, *ty, &scratch[..n]);
                        }
                    }
                }
                UploadKind::DirectF32 { ty } => match value {
                    UniformValue::FloatArray(values) => {
                        device.uniform_f32(step.location, *ty, values);
                    }
                    other => {
                        let mut scratch = [0f32; 16];
                        if let Some(n) = sync::write_f32(other, &mut scratch) {
                            device.uniform_f32(step.location, *ty, &scratch[..n]);
                        }
                    }
                },
                UploadKind::DirectI32 { ty } => match value {
                    UniformValue::IntArray(values) => {
                        device.uniform_i32(step.location, *ty, values);
                    }
                    other => {
                        let mut scratch = [0i32; 4];
                        if let Some(n) = sync::write_i32(other, &mut scratch) {
                            device.uniform_i32(step.location, *ty, &scratch[..n]);
                        }
                    }
                },
                UploadKind::Sampler { cached_unit } => {
                    if let UniformValue::Texture(texture) = value {
                        // Units come from one shared counter so nested
                        // groups never collide within a draw.
                        let unit = data.texture_count;
                        data.texture_count += 1;
                        let resolved = device.bind_texture(texture, unit);
                        if *cached_unit != Some(resolved) {
                            *cached_unit = Some(resolved);
                            device.uniform_i32(
                                step.location,
                                UniformType::Sampler2D,
                                &[resolved],
                            );
                        }
                    }
                }
                UploadKind::NestedGroup => {
                    if let UniformValue::Group(shared) = value {
                        let nested = Rc::clone(shared);
                        let nested = nested.borrow();
                        self.sync_uniform_group(device, program_id, compiled, &nested, data);
                    }
                }
                UploadKind::NestedUbo { buffer, last_dirty } => {
                    if let UniformValue::Group(shared) = value {
                        let nested = shared.borrow();
                        if *last_dirty != Some(nested.dirty_id()) {
                            *last_dirty = Some(nested.dirty_id());
                            let bytes = sync::pack_std140(&nested);
                            device.write_buffer(*buffer, &bytes);
                        }
                    }
                }
            }
        }

        syncer.last_dirty = Some(group.dirty_id());
        self.syncers.insert(key, syncer);
    }

    /// Releases every device resource the registries hold: ubo backing
    /// buffers owned by the syncers, then the compiled programs.
    ///
    /// Programs created outside [`program_from_source`] remain their
    /// creators' responsibility.
    ///
    /// [`program_from_source`]: RenderContext::program_from_source
    pub fn release(&mut self, device: &mut dyn GpuDevice) {
        for (_, syncer) in self.syncers.drain() {
            for step in &syncer.steps {
                if let UploadKind::NestedUbo { buffer, .. } = &step.kind {
                    device.delete_buffer(*buffer);
                }
            }
        }
        for (_, program) in self.programs.drain() {
            program.borrow_mut().release(device);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::coords::{Matrix, Vec2};
    use crate::device::mock::{Call, MockDevice};
    use crate::device::TextureRef;
    use crate::shader::UniformGroup;

    use super::*;

    // ── cache-and-compare ─────────────────────────────────────────────────

    #[test]
    fn unchanged_vec2_uploads_once_across_binds() {
        let mut device = MockDevice::with_uniforms(vec![("uOffset", UniformType::Vec2, 1)]);
        let mut ctx = RenderContext::new();
        let mut shader = Shader::from_source("v", "f", "test", []);
        let loc = device.locations()["uOffset"];

        shader
            .uniforms
            .set("uOffset", UniformValue::Vec2(Vec2::new(1.0, 2.0)));
        ctx.bind_shader(&mut device, &mut shader).unwrap();
        assert_eq!(device.upload_count(loc), 1);

        // Same value again: the cached copy matches, no device call.
        shader
            .uniforms
            .set("uOffset", UniformValue::Vec2(Vec2::new(1.0, 2.0)));
        ctx.bind_shader(&mut device, &mut shader).unwrap();
        assert_eq!(device.upload_count(loc), 1);

        shader
            .uniforms
            .set("uOffset", UniformValue::Vec2(Vec2::new(3.0, 2.0)));
        ctx.bind_shader(&mut device, &mut shader).unwrap();
        assert_eq!(device.upload_count(loc), 2);
    }

    #[test]
    fn mat3_reuploads_only_when_matrix_changes() {
        let mut device = MockDevice::with_uniforms(vec![("uProjection", UniformType::Mat3, 1)]);
        let mut ctx = RenderContext::new();
        let mut shader = Shader::from_source("v", "f", "test", []);
        let loc = device.locations()["uProjection"];

        shader
            .uniforms
            .set("uProjection", UniformValue::Mat3(Matrix::from_scale(2.0, 2.0)));
        ctx.bind_shader(&mut device, &mut shader).unwrap();
        ctx.bind_shader(&mut device, &mut shader).unwrap();
        assert_eq!(device.upload_count(loc), 1);

        shader.uniforms.set(
            "uProjection",
            UniformValue::Mat3(Matrix::from_translation(4.0, 0.0)),
        );
        ctx.bind_shader(&mut device, &mut shader).unwrap();
        assert_eq!(device.upload_count(loc), 2);
    }

    // ── memoization ───────────────────────────────────────────────────────

    #[test]
    fn one_syncer_per_program_group_pair() {
        let mut device = MockDevice::with_uniforms(vec![("uAlpha", UniformType::Float, 1)]);
        let mut ctx = RenderContext::new();
        let mut shader = Shader::from_source("v", "f", "test", []);
        shader.uniforms.set("uAlpha", UniformValue::Float(1.0));

        for _ in 0..5 {
            ctx.bind_shader(&mut device, &mut shader).unwrap();
        }
        assert_eq!(ctx.syncer_count(), 1);
    }

    #[test]
    fn programs_dedupe_by_source_text() {
        let mut ctx = RenderContext::new();
        let a = ctx.program_from_source("vert", "frag", "a");
        let b = ctx.program_from_source("vert", "frag", "b");
        let c = ctx.program_from_source("vert", "frag2", "c");

        assert!(Rc::ptr_eq(&a, &b));
        assert!(!Rc::ptr_eq(&a, &c));
        assert_eq!(ctx.program_count(), 2);
    }

    // ── static groups ─────────────────────────────────────────────────────

    #[test]
    fn static_group_skips_until_marked_dirty() {
        let mut device = MockDevice::with_uniforms(vec![("uAlpha", UniformType::Float, 1)]);
        let mut ctx = RenderContext::new();
        let mut group = UniformGroup::new_static();
        group.set("uAlpha", UniformValue::Float(0.5));
        let program = ctx.program_from_source("v", "f", "test");
        let mut shader = Shader::new(program, group);
        let loc = device.locations()["uAlpha"];

        ctx.bind_shader(&mut device, &mut shader).unwrap();
        assert_eq!(device.upload_count(loc), 1);

        // New value, but the static group's epoch did not move: skipped.
        shader.uniforms.set("uAlpha", UniformValue::Float(0.75));
        ctx.bind_shader(&mut device, &mut shader).unwrap();
        assert_eq!(device.upload_count(loc), 1);

        shader.uniforms.update();
        ctx.bind_shader(&mut device, &mut shader).unwrap();
        assert_eq!(device.upload_count(loc), 2);
    }

    // ── nesting ───────────────────────────────────────────────────────────

    #[test]
    fn nested_groups_share_the_texture_unit_counter() {
        let mut device = MockDevice::with_uniforms(vec![
            ("uSampler", UniformType::Sampler2D, 1),
            ("uMask", UniformType::Sampler2D, 1),
        ]);
        let mut ctx = RenderContext::new();
        let mut shader = Shader::from_source("v", "f", "test", []);
        shader
            .uniforms
            .set("uSampler", UniformValue::Texture(TextureRef(7)));
        let mut nested = UniformGroup::new();
        nested.set("uMask", UniformValue::Texture(TextureRef(9)));
        shader.uniforms.add_group("filterUniforms", nested);

        ctx.bind_shader(&mut device, &mut shader).unwrap();

        let binds: Vec<_> = device
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::BindTexture(t, u) => Some((*t, *u)),
                _ => None,
            })
            .collect();
        assert_eq!(binds, vec![(TextureRef(7), 0), (TextureRef(9), 1)]);
        // One syncer for the root group's shape, one for the nested one.
        assert_eq!(ctx.syncer_count(), 2);
    }

    #[test]
    fn sampler_unit_uploads_once_while_stable() {
        let mut device = MockDevice::with_uniforms(vec![("uSampler", UniformType::Sampler2D, 1)]);
        let mut ctx = RenderContext::new();
        let mut shader = Shader::from_source("v", "f", "test", []);
        shader
            .uniforms
            .set("uSampler", UniformValue::Texture(TextureRef(3)));
        let loc = device.locations()["uSampler"];

        ctx.bind_shader(&mut device, &mut shader).unwrap();
        ctx.bind_shader(&mut device, &mut shader).unwrap();

        // The texture is re-bound every draw, but the sampler uniform holds
        // the same unit and is uploaded once.
        let bind_calls = device
            .calls
            .iter()
            .filter(|c| matches!(c, Call::BindTexture(..)))
            .count();
        assert_eq!(bind_calls, 2);
        assert_eq!(device.upload_count(loc), 1);
    }

    // ── buffer-backed groups ──────────────────────────────────────────────

    #[test]
    fn ubo_group_repacks_only_when_marked_dirty() {
        let mut device = MockDevice::with_uniforms(vec![("uAlpha", UniformType::Float, 1)]);
        let mut ctx = RenderContext::new();
        let mut shader = Shader::from_source("v", "f", "test", []);
        let mut block = UniformGroup::new_ubo(false);
        block.set("uTint", UniformValue::Vec3([1.0, 1.0, 1.0]));
        let block = shader.uniforms.add_group("globals", block);

        ctx.bind_shader(&mut device, &mut shader).unwrap();
        let buffer = device
            .calls
            .iter()
            .find_map(|c| match c {
                Call::WriteBuffer(b, _) => Some(*b),
                _ => None,
            })
            .unwrap();

        ctx.bind_shader(&mut device, &mut shader).unwrap();
        assert_eq!(device.buffer_write_count(buffer), 1);

        block.borrow_mut().update();
        ctx.bind_shader(&mut device, &mut shader).unwrap();
        assert_eq!(device.buffer_write_count(buffer), 2);
    }

    // ── teardown ──────────────────────────────────────────────────────────

    #[test]
    fn release_frees_buffers_and_programs() {
        let mut device = MockDevice::with_uniforms(vec![("uAlpha", UniformType::Float, 1)]);
        let mut ctx = RenderContext::new();
        let program = ctx.program_from_source("v", "f", "test");
        let mut shader = Shader::new(program, UniformGroup::new());
        shader.uniforms.set("uAlpha", UniformValue::Float(1.0));
        let mut block = UniformGroup::new_ubo(false);
        block.set("uTint", UniformValue::Vec3([1.0, 1.0, 1.0]));
        shader.uniforms.add_group("globals", block);

        ctx.bind_shader(&mut device, &mut shader).unwrap();
        ctx.release(&mut device);

        assert_eq!(ctx.program_count(), 0);
        assert_eq!(ctx.syncer_count(), 0);
        assert!(device
            .calls
            .iter()
            .any(|c| matches!(c, Call::DeleteBuffer(_))));
        assert!(device
            .calls
            .iter()
            .any(|c| matches!(c, Call::DeleteProgram(_))));
    }
}
