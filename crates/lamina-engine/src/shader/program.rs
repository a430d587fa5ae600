use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::device::{CompiledProgram, ContextId, DeviceError, GpuDevice};

static NEXT_PROGRAM_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a logical program; the memoization key for generated uniform
/// sync strategies.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ProgramId(u64);

/// Shared handle to a logical program.
///
/// Programs are shared between shaders and the context registry; single
/// threaded, so `Rc<RefCell<…>>`.
pub type SharedProgram = Rc<RefCell<Program>>;

/// A logical shader program: a (vertex, fragment) source pair.
///
/// Source is immutable once built. Compilation happens lazily per GPU
/// context on first bind, and the compiled handle plus reflected interface
/// are cached per [`ContextId`] — one logical program can serve multiple
/// contexts without cross-invalidation.
pub struct Program {
    id: ProgramId,
    name: String,
    vertex_src: String,
    fragment_src: String,
    compiled: HashMap<ContextId, CompiledProgram>,
}

impl Program {
    pub fn new(vertex_src: &str, fragment_src: &str, name: &str) -> Self {
        Self {
            id: ProgramId(NEXT_PROGRAM_ID.fetch_add(1, Ordering::Relaxed)),
            name: name.to_owned(),
            vertex_src: vertex_src.to_owned(),
            fragment_src: fragment_src.to_owned(),
            compiled: HashMap::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> ProgramId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn vertex_src(&self) -> &str {
        &self.vertex_src
    }

    #[inline]
    pub fn fragment_src(&self) -> &str {
        &self.fragment_src
    }

    /// Compiled state for `context`, if this program was bound there.
    pub fn compiled(&self, context: ContextId) -> Option<&CompiledProgram> {
        self.compiled.get(&context)
    }

    /// Compiles and reflects for the device's context on first use; later
    /// calls return the cached state.
    pub fn ensure_compiled(
        &mut self,
        device: &mut dyn GpuDevice,
    ) -> Result<&CompiledProgram, DeviceError> {
        let context = device.context_id();
        if !self.compiled.contains_key(&context) {
            log::debug!("compiling program '{}' for context {context:?}", self.name);
            let compiled = device.compile_program(&self.vertex_src, &self.fragment_src, &self.name)?;
            self.compiled.insert(context, compiled);
        }
        Ok(&self.compiled[&context])
    }

    /// Drops compiled state for every context, deleting the GPU programs.
    pub fn release(&mut self, device: &mut dyn GpuDevice) {
        for (_, compiled) in self.compiled.drain() {
            device.delete_program(compiled.handle);
        }
    }
}

/// Literal `%key%` placeholder substitution in shader source text.
///
/// This is the only "wire format" of the shader layer: batch-style source
/// generators stamp counts and unrolled loops into template source. Plain
/// string replacement, no templating engine.
pub fn substitute_placeholder(source: &str, key: &str, value: &str) -> String {
    source.replace(&format!("%{key}%"), value)
}
