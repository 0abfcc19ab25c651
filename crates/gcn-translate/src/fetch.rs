use gcn_bytecode::{decode_instruction, CodeSlice, DecodeError, Instruction};
use tracing::debug;

/// One per-vertex attribute binding recovered from a fetch shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexInputSemantic {
    /// Semantic index, assigned sequentially in discovery order.
    pub semantic: u32,
    /// First VGPR the attribute is loaded into.
    pub vgpr: u32,
    /// Number of components the attribute carries (1-4).
    pub size_in_elements: u32,
}

/// Decodes a fetch shader into its full instruction list.
pub(crate) fn decode_fetch_shader(code: &[u32]) -> Result<Vec<Instruction>, DecodeError> {
    let mut slice = CodeSlice::new(code);
    let mut instructions = Vec::new();
    while !slice.at_end() {
        instructions.push(decode_instruction(&mut slice)?);
    }
    Ok(instructions)
}

/// Recovers the vertex input semantics a fetch shader was generated from.
///
/// The toolchain lowers each attribute of the semantic table into one
/// `buffer_load_format_*` instruction, emitted in semantic order:
///
/// ```text
/// s_load_dwordx4 s[8:11], s[2:3], 0x00
/// s_load_dwordx4 s[12:15], s[2:3], 0x04
/// s_waitcnt     lgkmcnt(0)
/// buffer_load_format_xyzw v[4:7], v0, s[8:11], 0 idxen
/// buffer_load_format_xyz v[8:10], v0, s[12:15], 0 idxen
/// s_waitcnt     0
/// s_setpc_b64   s[0:1]
/// ```
///
/// This walks that lowering backwards: each format load becomes one semantic,
/// with the load's destination VGPR and its component count (`op + 1`).
///
/// The inversion is a heuristic. It assumes exactly one load per attribute
/// with no reordering or fusion; a compiler that ever violated that would
/// produce a plausible but wrong semantic list, and nothing here can detect
/// it.
pub(crate) fn reconstruct_semantics(instructions: &[Instruction]) -> Vec<VertexInputSemantic> {
    let mut semantics = Vec::new();
    for inst in instructions {
        let Instruction::BufferFormatLoad(load) = inst else {
            continue;
        };
        semantics.push(VertexInputSemantic {
            semantic: semantics.len() as u32,
            vgpr: load.vdata.into(),
            size_in_elements: load.element_count(),
        });
    }
    debug!(count = semantics.len(), "reconstructed vertex input semantics");
    semantics
}

#[cfg(test)]
mod tests {
    use super::*;
    use gcn_bytecode::test_utils::build_fetch_shader;

    #[test]
    fn one_semantic_per_format_load_in_order() {
        let code = build_fetch_shader(&[(4, 3), (8, 2), (12, 1)]);
        let instructions = decode_fetch_shader(&code).expect("decode failed");
        let semantics = reconstruct_semantics(&instructions);
        assert_eq!(
            semantics,
            vec![
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
            ]
        );
    }

    #[test]
    fn no_loads_means_no_semantics() {
        let code = build_fetch_shader(&[]);
        let instructions = decode_fetch_shader(&code).expect("decode failed");
        assert!(reconstruct_semantics(&instructions).is_empty());
    }
}
