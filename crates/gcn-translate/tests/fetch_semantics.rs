use gcn_bytecode::test_utils::{build_fetch_shader, ShaderBinaryBuilder};
use gcn_bytecode::BinaryError;
use gcn_translate::{GcnShaderModule, ModuleError, ShaderStage, VertexInputSemantic};

fn main_binary() -> Vec<u32> {
    ShaderBinaryBuilder::new(ShaderStage::Vertex).build()
}

#[test]
fn semantics_round_trip_through_a_synthetic_fetch_shader() {
    let binary = main_binary();
    let fetch = build_fetch_shader(&[(4, 3), (8, 2), (12, 1), (14, 0)]);

    let module = GcnShaderModule::with_fetch_shader(&binary, &fetch).unwrap();
    assert_eq!(
        module.vs_input_semantics(),
        &[
            VertexInputSemantic {
                semantic: 0,
                vgpr: 4,
                size_in_elements: 4,
            },
            VertexInputSemantic {
                semantic: 1,
                vgpr: 8,
                size_in_elements: 3,
            },
            VertexInputSemantic {
                semantic: 2,
                vgpr: 12,
                size_in_elements: 2,
            },
            VertexInputSemantic {
                semantic: 3,
                vgpr: 14,
                size_in_elements: 1,
            },
        ]
    );
}

#[test]
fn module_without_fetch_shader_has_no_semantics() {
    let binary = main_binary();
    let module = GcnShaderModule::new(&binary).unwrap();
    assert!(module.vs_input_semantics().is_empty());
}

#[test]
fn fetch_shader_without_terminator_is_rejected() {
    let binary = main_binary();
    let fetch = [0xBF8C_007Fu32; 8]; // waits forever, never returns

    let err = GcnShaderModule::with_fetch_shader(&binary, &fetch).unwrap_err();
    assert_eq!(
        err,
        ModuleError::Binary(BinaryError::FetchTerminatorNotFound { scanned: 8 })
    );
}

#[test]
fn undecodable_fetch_shader_is_rejected() {
    let binary = main_binary();
    // 0xFC00_0000 falls in a reserved encoding-family gap.
    let garbage = [0xFC00_0000u32, 0xBE80_2000];

    let err = GcnShaderModule::with_fetch_shader(&binary, &garbage).unwrap_err();
    assert!(matches!(err, ModuleError::FetchDecode(_)), "{err:?}");
}
