use gcn_bytecode::test_utils::{build_fetch_shader, ShaderBinaryBuilder, S_ENDPGM};
use gcn_bytecode::{Instruction, ProgramInfo};
use gcn_translate::{
    AnalysisPass, Backend, CompileError, CompilePass, DescriptorKind, GcnShaderModule,
    InputUsageSlot, ResolveError, ShaderInput, ShaderStage, UsageType, UserData,
    VertexInputSemantic,
};

/// A backend that records everything it is fed, standing in for the real
/// analyzer/code-generator pair.
struct RecordingBackend;

#[derive(Default)]
struct RecordingAnalysis {
    instructions: Vec<Instruction>,
}

impl AnalysisPass for RecordingAnalysis {
    fn process_instruction(&mut self, inst: &Instruction) {
        self.instructions.push(*inst);
    }
}

struct RecordingCompiler {
    key: u64,
    analyzed: usize,
    buffers: Vec<(DescriptorKind, UsageType, u32)>,
    semantics: Vec<VertexInputSemantic>,
    instructions: Vec<Instruction>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct RecordedModule {
    key: u64,
    analyzed: usize,
    buffers: Vec<(DescriptorKind, UsageType, u32)>,
    semantics: Vec<VertexInputSemantic>,
    instructions: Vec<Instruction>,
}

impl CompilePass for RecordingCompiler {
    type Module = RecordedModule;

    fn process_instruction(&mut self, inst: &Instruction) {
        self.instructions.push(*inst);
    }

    fn finalize(self) -> RecordedModule {
        RecordedModule {
            key: self.key,
            analyzed: self.analyzed,
            buffers: self.buffers,
            semantics: self.semantics,
            instructions: self.instructions,
        }
    }
}

impl Backend for RecordingBackend {
    type Analysis = RecordingAnalysis;
    type Compiler = RecordingCompiler;
    type Module = RecordedModule;

    fn begin_analysis(&self, _info: &ProgramInfo<'_>) -> RecordingAnalysis {
        RecordingAnalysis::default()
    }

    fn begin_compile(
        &self,
        info: &ProgramInfo<'_>,
        analysis: &RecordingAnalysis,
        input: ShaderInput<'_>,
    ) -> RecordingCompiler {
        RecordingCompiler {
            key: info.key().as_u64(),
            analyzed: analysis.instructions.len(),
            buffers: input
                .resource_buffers
                .iter()
                .map(|b| (b.kind, b.usage, b.resource.start_register))
                .collect(),
            semantics: input.vs_semantics.clone(),
            instructions: Vec::new(),
        }
    }
}

// A small but decodable code region: two waits and an end-of-program.
const CODE: [u32; 3] = [0xBF8C_007F, 0xBF8C_0000, S_ENDPGM];

#[test]
fn compile_is_deterministic() {
    let binary = ShaderBinaryBuilder::new(ShaderStage::Vertex)
        .code(&CODE)
        .slot(InputUsageSlot::new(UsageType::ImmConstBuffer as u8, 0, 4, 0))
        .key(0x1111_2222, 0x3333_4444)
        .build();
    let fetch = build_fetch_shader(&[(4, 3), (8, 1)]);

    let mut module = GcnShaderModule::with_fetch_shader(&binary, &fetch).unwrap();
    let cb = [0x12u32; 4];
    module.define_shader_input(vec![UserData {
        start_register: 4,
        data: &cb,
    }]);

    let first = module.compile(&RecordingBackend).unwrap();
    let second = module.compile(&RecordingBackend).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.key, 0x1111_2222_3333_4444);
}

#[test]
fn both_passes_see_the_full_instruction_stream() {
    let binary = ShaderBinaryBuilder::new(ShaderStage::Pixel).code(&CODE).build();
    let module = GcnShaderModule::new(&binary).unwrap();

    let compiled = module.compile(&RecordingBackend).unwrap();
    assert_eq!(compiled.instructions.len(), 3);
    assert_eq!(compiled.analyzed, compiled.instructions.len());
}

#[test]
fn sampler_slots_always_classify_as_ssharp() {
    for flag in [0u8, 1] {
        let binary = ShaderBinaryBuilder::new(ShaderStage::Pixel)
            .code(&CODE)
            .slot(InputUsageSlot::new(UsageType::ImmSampler as u8, 0, 3, flag))
            .build();
        let mut module = GcnShaderModule::new(&binary).unwrap();

        let ssharp = [0x9Au32; 4];
        module.define_shader_input(vec![UserData {
            start_register: 3,
            data: &ssharp,
        }]);

        let compiled = module.compile(&RecordingBackend).unwrap();
        assert_eq!(
            compiled.buffers,
            vec![(DescriptorKind::SSharp, UsageType::ImmSampler, 3)],
            "resource-type flag {flag}"
        );
    }
}

#[test]
fn resource_type_flag_selects_vsharp_or_tsharp() {
    let binary = ShaderBinaryBuilder::new(ShaderStage::Pixel)
        .code(&CODE)
        .slot(InputUsageSlot::new(UsageType::ImmResource as u8, 0, 0, 1))
        .slot(InputUsageSlot::new(UsageType::ImmConstBuffer as u8, 0, 8, 0))
        .build();
    let mut module = GcnShaderModule::new(&binary).unwrap();

    let tsharp = [0xABu32; 8];
    let vsharp = [0xCDu32; 4];
    module.define_shader_input(vec![
        UserData {
            start_register: 0,
            data: &tsharp,
        },
        UserData {
            start_register: 8,
            data: &vsharp,
        },
    ]);

    let compiled = module.compile(&RecordingBackend).unwrap();
    assert_eq!(
        compiled.buffers,
        vec![
            (DescriptorKind::TSharp, UsageType::ImmResource, 0),
            (DescriptorKind::VSharp, UsageType::ImmConstBuffer, 8),
        ]
    );
}

#[test]
fn reconstructed_semantics_reach_the_code_generator() {
    let binary = ShaderBinaryBuilder::new(ShaderStage::Vertex).code(&CODE).build();
    let fetch = build_fetch_shader(&[(4, 3), (8, 2), (12, 0)]);

    let module = GcnShaderModule::with_fetch_shader(&binary, &fetch).unwrap();
    let compiled = module.compile(&RecordingBackend).unwrap();

    assert_eq!(compiled.semantics.len(), 3);
    assert_eq!(compiled.semantics, module.vs_input_semantics());
    assert_eq!(compiled.semantics[2].vgpr, 12);
    assert_eq!(compiled.semantics[2].size_in_elements, 1);
}

#[test]
fn compile_fails_on_unresolvable_classified_slot() {
    let binary = ShaderBinaryBuilder::new(ShaderStage::Pixel)
        .code(&CODE)
        .slot(InputUsageSlot::new(UsageType::ImmResource as u8, 0, 2, 0))
        .build();
    let module = GcnShaderModule::new(&binary).unwrap();

    // No shader input was defined; the classified-buffer lookup must fail
    // loudly instead of emitting a partial module.
    assert_eq!(
        module.compile(&RecordingBackend).unwrap_err(),
        CompileError::Resolve(ResolveError::MissingBinding {
            usage: UsageType::ImmResource,
            register: 2,
        })
    );
}
