use std::sync::OnceLock;

use gcn_bytecode::{
    decode_instruction, fetch_shader_len, CodeSlice, InputUsageSlot, ProgramInfo, ShaderKey,
    ShaderStage,
};
use tracing::debug;

use crate::backend::{AnalysisPass, Backend, CompilePass};
use crate::error::{CompileError, ModuleError, ResolveError};
use crate::fetch::{decode_fetch_shader, reconstruct_semantics, VertexInputSemantic};
use crate::resolver::BindingResolver;
use crate::resource::{ShaderInput, ShaderResource, UserData};

/// One shader binary being translated.
///
/// Owns the parsed program metadata and the lazily resolved binding state.
/// The lazy caches (EUD table, linear resource table) are write-once: a
/// module may be shared across threads once constructed, and concurrent
/// first use settles on a single stable value. `define_shader_input` takes
/// `&mut self` and therefore cannot race with resolution.
#[derive(Debug)]
pub struct GcnShaderModule<'a> {
    info: ProgramInfo<'a>,
    user_data: Vec<UserData<'a>>,
    vs_semantics: Vec<VertexInputSemantic>,
    eud_table: OnceLock<&'a [u32]>,
    resource_table: OnceLock<Vec<ShaderResource<'a>>>,
}

impl<'a> GcnShaderModule<'a> {
    /// Parses a main shader binary.
    pub fn new(binary: &'a [u32]) -> Result<Self, ModuleError> {
        let info = ProgramInfo::parse(binary)?;
        debug!(
            key = %info.key(),
            stage = ?info.stage(),
            code_dwords = info.code_size_dwords(),
            slots = info.input_usage_slots().len(),
            "parsed shader binary"
        );
        Ok(GcnShaderModule {
            info,
            user_data: Vec::new(),
            vs_semantics: Vec::new(),
            eud_table: OnceLock::new(),
            resource_table: OnceLock::new(),
        })
    }

    /// Parses a main shader binary together with its vertex fetch shader,
    /// reconstructing the vertex input semantics the fetch shader encodes.
    pub fn with_fetch_shader(binary: &'a [u32], fetch: &'a [u32]) -> Result<Self, ModuleError> {
        let mut module = Self::new(binary)?;
        let len = fetch_shader_len(fetch)?;
        let instructions = decode_fetch_shader(&fetch[..len])?;
        module.vs_semantics = reconstruct_semantics(&instructions);
        Ok(module)
    }

    /// The module's identity, from the binary's trailer.
    pub fn key(&self) -> ShaderKey {
        self.info.key()
    }

    /// The stage the binary was compiled for.
    pub fn stage(&self) -> ShaderStage {
        self.info.stage()
    }

    /// Parsed program metadata.
    pub fn program_info(&self) -> &ProgramInfo<'a> {
        &self.info
    }

    /// The input usage slots the shader declares; the host uses these to
    /// assemble the user-data table it passes to [`define_shader_input`].
    ///
    /// [`define_shader_input`]: Self::define_shader_input
    pub fn input_usage_slots(&self) -> &[InputUsageSlot] {
        self.info.input_usage_slots()
    }

    /// Installs the host's user-data table. Resolution is deferred until the
    /// table is actually needed.
    ///
    /// Replacing the table after a resource table has already been resolved
    /// has no effect on the cached result; install it before first use.
    pub fn define_shader_input(&mut self, table: Vec<UserData<'a>>) {
        self.user_data = table;
    }

    /// The reconstructed vertex input semantics (empty without a fetch
    /// shader).
    pub fn vs_input_semantics(&self) -> &[VertexInputSemantic] {
        &self.vs_semantics
    }

    /// Resolves (once) and returns the linear resource table.
    ///
    /// An empty user-data table means the host has not configured inputs
    /// yet; that returns an empty table rather than an error, and resolution
    /// will still run after a later [`define_shader_input`].
    ///
    /// [`define_shader_input`]: Self::define_shader_input
    pub fn shader_resource_table(&self) -> Result<&[ShaderResource<'a>], ResolveError> {
        if let Some(table) = self.resource_table.get() {
            return Ok(table);
        }
        if self.user_data.is_empty() {
            return Ok(&[]);
        }
        let table = self.resolver().resolve_all()?;
        Ok(self.resource_table.get_or_init(|| table))
    }

    /// Translates the shader: decode → analysis pass → codegen pass →
    /// finalized module.
    ///
    /// The stream is decoded twice on purpose. Whole-shader facts (for
    /// example, whether a memory class is used at all) only exist after a
    /// complete first pass, and the code generator needs them before it emits
    /// anything.
    pub fn compile<B: Backend>(&self, backend: &B) -> Result<B::Module, CompileError> {
        let code = self.info.code();

        let mut analysis = backend.begin_analysis(&self.info);
        let mut slice = CodeSlice::new(code);
        while !slice.at_end() {
            let inst = decode_instruction(&mut slice)?;
            analysis.process_instruction(&inst);
        }

        let input = ShaderInput {
            resource_buffers: self.resolver().find_resource_buffers()?,
            vs_semantics: self.vs_semantics.clone(),
        };
        debug!(
            key = %self.key(),
            buffers = input.resource_buffers.len(),
            semantics = input.vs_semantics.len(),
            "analysis complete, starting code generation"
        );

        let mut compiler = backend.begin_compile(&self.info, &analysis, input);
        let mut slice = CodeSlice::new(code);
        while !slice.at_end() {
            let inst = decode_instruction(&mut slice)?;
            compiler.process_instruction(&inst);
        }

        Ok(compiler.finalize())
    }

    fn resolver(&self) -> BindingResolver<'_, 'a> {
        BindingResolver::new(
            self.info.input_usage_slots(),
            &self.user_data,
            &self.eud_table,
        )
    }
}
