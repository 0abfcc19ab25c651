use core::fmt;

use crate::slice::CodeSlice;

/// GCN encoding families the decoder can classify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Encoding {
    Sop2,
    Sopk,
    Sop1,
    Sopc,
    Sopp,
    Smrd,
    Vop2,
    Vop1,
    Vopc,
    Vop3,
    Vintrp,
    Ds,
    Mubuf,
    Mtbuf,
    Mimg,
    Exp,
    Flat,
}

/// A decoded `buffer_load_format_{x,xy,xyz,xyzw}` instruction (MUBUF ops 0-3).
///
/// This is the only instruction form that gets a fully typed view: vertex
/// fetch shaders are reconstructed by reading these loads back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferFormatLoad {
    /// MUBUF opcode (0-3); encodes the component count minus one.
    pub op: u8,
    /// Unsigned byte offset encoded in the instruction.
    pub offset: u16,
    /// Whether the address is offset by the index register.
    pub idxen: bool,
    /// Whether the address is offset by the voffset register.
    pub offen: bool,
    /// First VGPR of the address operand.
    pub vaddr: u8,
    /// First VGPR written by the load.
    pub vdata: u8,
    /// Buffer descriptor location, in units of four SGPRs.
    pub srsrc: u8,
    /// Scalar offset operand (SSRC encoding; 128 means the constant zero).
    pub soffset: u8,
}

impl BufferFormatLoad {
    /// Number of components the load writes (`op + 1`).
    pub fn element_count(&self) -> u32 {
        u32::from(self.op) + 1
    }
}

/// A decoded scalar memory read (`s_load_dword*` / `s_buffer_load_dword*`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScalarMemory {
    /// SMRD opcode.
    pub op: u8,
    /// Destination SGPR.
    pub sdst: u8,
    /// Base SGPR pair, in units of two SGPRs.
    pub sbase: u8,
    /// Offset operand: an immediate dword offset if `imm`, else an SGPR id.
    pub offset: u8,
    /// Whether `offset` is an immediate.
    pub imm: bool,
}

/// One decoded GCN instruction.
///
/// Only the forms the translation core inspects carry typed fields; everything
/// else is classified by encoding family and kept opaque. Field access always
/// goes through the variant, never through an unchecked reinterpretation of
/// the raw dwords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// A typed buffer-format load (see [`BufferFormatLoad`]).
    BufferFormatLoad(BufferFormatLoad),
    /// A scalar memory read (see [`ScalarMemory`]).
    ScalarMemory(ScalarMemory),
    /// Any other instruction, classified by encoding family only.
    Other {
        /// The encoding family of the instruction.
        encoding: Encoding,
        /// First dword of the instruction.
        raw: u32,
    },
}

impl Instruction {
    /// The encoding family this instruction belongs to.
    pub fn encoding(&self) -> Encoding {
        match self {
            Instruction::BufferFormatLoad(_) => Encoding::Mubuf,
            Instruction::ScalarMemory(_) => Encoding::Smrd,
            Instruction::Other { encoding, .. } => *encoding,
        }
    }
}

/// An error produced while decoding an instruction stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeError {
    /// Position of the failing instruction, in dwords from stream start.
    pub at_dword: usize,
    /// What went wrong.
    pub kind: DecodeErrorKind,
}

/// The kinds of [`DecodeError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeErrorKind {
    /// The stream ended in the middle of a multi-dword instruction.
    UnexpectedEof {
        /// Dwords the instruction still needed.
        wanted: usize,
        /// Dwords actually remaining.
        remaining: usize,
    },
    /// The leading dword matches no known encoding family.
    UnknownEncoding {
        /// The offending dword.
        token: u32,
    },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GCN decode error at dword {}: ", self.at_dword)?;
        match &self.kind {
            DecodeErrorKind::UnexpectedEof { wanted, remaining } => write!(
                f,
                "unexpected end of code stream (wanted {wanted} more dwords, {remaining} remaining)"
            ),
            DecodeErrorKind::UnknownEncoding { token } => {
                write!(f, "unrecognized instruction encoding {token:#010x}")
            }
        }
    }
}

impl std::error::Error for DecodeError {}

// MUBUF ops 0-3 are buffer_load_format_{x,xy,xyz,xyzw}.
const MUBUF_LOAD_FORMAT_MAX_OP: u32 = 3;

// Scalar/vector ALU source operand value selecting a trailing 32-bit literal.
const SRC_LITERAL: u32 = 255;

/// Decodes the next instruction and advances the cursor past it (including
/// any trailing literal constant).
///
/// The decoder never desynchronizes silently: an unrecognized leading dword is
/// an error, since guessing a width would corrupt every later instruction.
pub fn decode_instruction(slice: &mut CodeSlice<'_>) -> Result<Instruction, DecodeError> {
    let at_dword = slice.pos();
    let eof = |wanted: usize, remaining: usize| DecodeError {
        at_dword,
        kind: DecodeErrorKind::UnexpectedEof { wanted, remaining },
    };

    let remaining = slice.remaining();
    let dw0 = slice.read().ok_or_else(|| eof(1, 0))?;

    let read_second = |slice: &mut CodeSlice<'_>| slice.read().ok_or_else(|| eof(2, remaining));

    // Scalar families first: they all have bit 31 set and must be matched
    // before the VOP2 catch-all (bit 31 clear) and the 110xxx families.
    if dw0 >> 23 == 0b1_0111_1111 {
        return Ok(Instruction::Other {
            encoding: Encoding::Sopp,
            raw: dw0,
        });
    }
    if dw0 >> 23 == 0b1_0111_1110 {
        consume_literal(slice, dw0 & 0xff, (dw0 >> 8) & 0xff)?;
        return Ok(Instruction::Other {
            encoding: Encoding::Sopc,
            raw: dw0,
        });
    }
    if dw0 >> 23 == 0b1_0111_1101 {
        consume_literal(slice, dw0 & 0xff, 0)?;
        return Ok(Instruction::Other {
            encoding: Encoding::Sop1,
            raw: dw0,
        });
    }
    if dw0 >> 28 == 0b1011 {
        return Ok(Instruction::Other {
            encoding: Encoding::Sopk,
            raw: dw0,
        });
    }
    if dw0 >> 27 == 0b11000 {
        return Ok(Instruction::ScalarMemory(ScalarMemory {
            op: ((dw0 >> 22) & 0x1f) as u8,
            sdst: ((dw0 >> 15) & 0x7f) as u8,
            sbase: ((dw0 >> 9) & 0x3f) as u8,
            offset: (dw0 & 0xff) as u8,
            imm: dw0 & (1 << 8) != 0,
        }));
    }
    if dw0 >> 26 == 0b110100 {
        read_second(slice)?;
        return Ok(Instruction::Other {
            encoding: Encoding::Vop3,
            raw: dw0,
        });
    }
    if dw0 >> 26 == 0b110010 {
        return Ok(Instruction::Other {
            encoding: Encoding::Vintrp,
            raw: dw0,
        });
    }
    if dw0 >> 26 == 0b110110 {
        read_second(slice)?;
        return Ok(Instruction::Other {
            encoding: Encoding::Ds,
            raw: dw0,
        });
    }
    if dw0 >> 26 == 0b110111 {
        read_second(slice)?;
        return Ok(Instruction::Other {
            encoding: Encoding::Flat,
            raw: dw0,
        });
    }
    if dw0 >> 26 == 0b111000 {
        let dw1 = slice.read().ok_or_else(|| eof(2, remaining))?;
        let op = (dw0 >> 18) & 0x7f;
        if op <= MUBUF_LOAD_FORMAT_MAX_OP {
            return Ok(Instruction::BufferFormatLoad(BufferFormatLoad {
                op: op as u8,
                offset: (dw0 & 0xfff) as u16,
                offen: dw0 & (1 << 12) != 0,
                idxen: dw0 & (1 << 13) != 0,
                vaddr: (dw1 & 0xff) as u8,
                vdata: ((dw1 >> 8) & 0xff) as u8,
                srsrc: ((dw1 >> 16) & 0x1f) as u8,
                soffset: ((dw1 >> 24) & 0xff) as u8,
            }));
        }
        return Ok(Instruction::Other {
            encoding: Encoding::Mubuf,
            raw: dw0,
        });
    }
    if dw0 >> 26 == 0b111010 {
        read_second(slice)?;
        return Ok(Instruction::Other {
            encoding: Encoding::Mtbuf,
            raw: dw0,
        });
    }
    if dw0 >> 26 == 0b111100 {
        read_second(slice)?;
        return Ok(Instruction::Other {
            encoding: Encoding::Mimg,
            raw: dw0,
        });
    }
    if dw0 >> 26 == 0b111110 {
        read_second(slice)?;
        return Ok(Instruction::Other {
            encoding: Encoding::Exp,
            raw: dw0,
        });
    }
    if dw0 >> 25 == 0b0111111 {
        consume_literal(slice, dw0 & 0x1ff, 0)?;
        return Ok(Instruction::Other {
            encoding: Encoding::Vop1,
            raw: dw0,
        });
    }
    if dw0 >> 25 == 0b0111110 {
        consume_literal(slice, dw0 & 0x1ff, 0)?;
        return Ok(Instruction::Other {
            encoding: Encoding::Vopc,
            raw: dw0,
        });
    }
    if dw0 >> 31 == 0 {
        consume_literal(slice, dw0 & 0x1ff, 0)?;
        return Ok(Instruction::Other {
            encoding: Encoding::Vop2,
            raw: dw0,
        });
    }
    if dw0 >> 30 == 0b10 {
        consume_literal(slice, dw0 & 0xff, (dw0 >> 8) & 0xff)?;
        return Ok(Instruction::Other {
            encoding: Encoding::Sop2,
            raw: dw0,
        });
    }

    Err(DecodeError {
        at_dword,
        kind: DecodeErrorKind::UnknownEncoding { token: dw0 },
    })
}

// Source operand 255 selects a 32-bit literal appended after the instruction.
fn consume_literal(
    slice: &mut CodeSlice<'_>,
    src0: u32,
    src1: u32,
) -> Result<(), DecodeError> {
    if src0 == SRC_LITERAL || src1 == SRC_LITERAL {
        let at_dword = slice.pos();
        slice.read().ok_or(DecodeError {
            at_dword,
            kind: DecodeErrorKind::UnexpectedEof {
                wanted: 1,
                remaining: 0,
            },
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(code: &[u32]) -> Vec<Instruction> {
        let mut slice = CodeSlice::new(code);
        let mut out = Vec::new();
        while !slice.at_end() {
            out.push(decode_instruction(&mut slice).expect("decode failed"));
        }
        out
    }

    // The canonical vertex fetch shader, as emitted by the console toolchain:
    //
    //   s_load_dwordx4 s[8:11], s[2:3], 0x00                   C0840300
    //   s_load_dwordx4 s[12:15], s[2:3], 0x04                  C0860304
    //   s_load_dwordx4 s[16:19], s[2:3], 0x08                  C0880308
    //   s_waitcnt     lgkmcnt(0)                               BF8C007F
    //   buffer_load_format_xyzw v[4:7], v0, s[8:11], 0 idxen   E00C2000 80020400
    //   buffer_load_format_xyz v[8:10], v0, s[12:15], 0 idxen  E0082000 80030800
    //   buffer_load_format_xy v[12:13], v0, s[16:19], 0 idxen  E0042000 80040C00
    //   s_waitcnt     0                                        BF8C0000
    //   s_setpc_b64   s[0:1]                                   BE802000
    const FETCH_SHADER: [u32; 12] = [
        0xC084_0300,
        0xC086_0304,
        0xC088_0308,
        0xBF8C_007F,
        0xE00C_2000,
        0x8002_0400,
        0xE008_2000,
        0x8003_0800,
        0xE004_2000,
        0x8004_0C00,
        0xBF8C_0000,
        0xBE80_2000,
    ];

    #[test]
    fn decodes_canonical_fetch_shader() {
        let insts = decode_all(&FETCH_SHADER);
        assert_eq!(insts.len(), 9);

        assert_eq!(
            insts[0],
            Instruction::ScalarMemory(ScalarMemory {
                op: 2,
                sdst: 8,
                sbase: 1,
                offset: 0,
                imm: true,
            })
        );
        assert_eq!(insts[3].encoding(), Encoding::Sopp);

        let loads: Vec<_> = insts
            .iter()
            .filter_map(|i| match i {
                Instruction::BufferFormatLoad(load) => Some(*load),
                _ => None,
            })
            .collect();
        assert_eq!(loads.len(), 3);
        assert_eq!(
            loads[0],
            BufferFormatLoad {
                op: 3,
                offset: 0,
                offen: false,
                idxen: true,
                vaddr: 0,
                vdata: 4,
                srsrc: 2,
                soffset: 128,
            }
        );
        assert_eq!(loads[0].element_count(), 4);
        assert_eq!(loads[1].vdata, 8);
        assert_eq!(loads[1].element_count(), 3);
        assert_eq!(loads[2].vdata, 12);
        assert_eq!(loads[2].element_count(), 2);

        // s_setpc_b64 s[0:1] is a SOP1.
        assert_eq!(insts[8].encoding(), Encoding::Sop1);
    }

    #[test]
    fn vop2_with_literal_consumes_extra_dword() {
        // v_add_f32 v0, lit, v0 with src0 = 255 (literal).
        let code = [0x0600_00ff, 0x3f80_0000, 0xBF8C_0000];
        let insts = decode_all(&code);
        assert_eq!(insts.len(), 2);
        assert_eq!(insts[0].encoding(), Encoding::Vop2);
        assert_eq!(insts[1].encoding(), Encoding::Sopp);
    }

    #[test]
    fn truncated_mubuf_is_an_error() {
        let code = [0xE00C_2000];
        let mut slice = CodeSlice::new(&code);
        let err = decode_instruction(&mut slice).unwrap_err();
        assert_eq!(err.at_dword, 0);
        assert_eq!(
            err.kind,
            DecodeErrorKind::UnexpectedEof {
                wanted: 2,
                remaining: 1,
            }
        );
    }

    #[test]
    fn mubuf_non_format_op_stays_opaque() {
        // buffer_load_dword (op 12) must not be mistaken for a format load.
        let dw0 = (0b111000u32 << 26) | (12 << 18);
        let code = [dw0, 0x8000_0000];
        let insts = decode_all(&code);
        assert_eq!(
            insts[0],
            Instruction::Other {
                encoding: Encoding::Mubuf,
                raw: dw0,
            }
        );
    }
}
