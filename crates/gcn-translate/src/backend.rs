use gcn_bytecode::{Instruction, ProgramInfo};

use crate::resource::ShaderInput;

/// The whole-shader analysis pass (pass 1).
///
/// Sees every decoded instruction once, before code generation starts, and
/// accumulates shader-wide facts (resource usage, control-flow shape) the
/// code generator needs up front.
pub trait AnalysisPass {
    /// Feeds one decoded instruction to the analysis.
    fn process_instruction(&mut self, inst: &Instruction);
}

/// The code-generation pass (pass 2).
///
/// Sees every decoded instruction a second time and incrementally emits
/// target code; `finalize` seals the result into an immutable module.
pub trait CompilePass {
    /// The finalized, immutable shader module type.
    type Module;

    /// Feeds one decoded instruction to code generation.
    fn process_instruction(&mut self, inst: &Instruction);

    /// Seals and returns the module. Consumes the pass: nothing can be
    /// emitted afterwards.
    fn finalize(self) -> Self::Module;
}

/// Factory for the two translation passes.
///
/// The analyzer and code generator are external collaborators; a backend
/// wires concrete implementations into the pipeline. The compile pass is
/// constructed only after analysis completes, so it can rely on the full
/// analysis result and the resolved shader input.
pub trait Backend {
    /// Analysis pass type.
    type Analysis: AnalysisPass;
    /// Code-generation pass type.
    type Compiler: CompilePass<Module = Self::Module>;
    /// Finalized module type.
    type Module;

    /// Creates the analysis pass for a shader.
    fn begin_analysis(&self, info: &ProgramInfo<'_>) -> Self::Analysis;

    /// Creates the code-generation pass from the completed analysis and the
    /// resolved shader input.
    fn begin_compile(
        &self,
        info: &ProgramInfo<'_>,
        analysis: &Self::Analysis,
        input: ShaderInput<'_>,
    ) -> Self::Compiler;
}
