//! Builders for synthetic GCN shader binaries.
//!
//! Real console shader binaries are proprietary, so tests assemble their own:
//! a code region, the declared input usage slots, and an `OrbShdr` trailer
//! with a valid layout. Only structural validity is provided; the code region
//! is whatever the test supplies.

use crate::binary::{ShaderKey, ShaderStage};
use crate::usage::InputUsageSlot;

/// Builds a minimal shader binary with a valid `OrbShdr` trailer.
#[derive(Debug, Clone)]
pub struct ShaderBinaryBuilder {
    stage: ShaderStage,
    code: Vec<u32>,
    slots: Vec<InputUsageSlot>,
    raw_slot_count: Option<usize>,
    key: ShaderKey,
}

impl ShaderBinaryBuilder {
    /// Starts a builder for the given stage with an empty code region.
    pub fn new(stage: ShaderStage) -> Self {
        ShaderBinaryBuilder {
            stage,
            code: vec![S_ENDPGM],
            slots: Vec::new(),
            raw_slot_count: None,
            key: ShaderKey {
                hash: 0xABCD_0123,
                crc: 0x4567_89AB,
            },
        }
    }

    /// Replaces the code region.
    pub fn code(mut self, code: &[u32]) -> Self {
        self.code = code.to_vec();
        self
    }

    /// Appends a declared input usage slot.
    pub fn slot(mut self, slot: InputUsageSlot) -> Self {
        self.slots.push(slot);
        self
    }

    /// Sets the trailer's hash and CRC fields.
    pub fn key(mut self, hash: u32, crc: u32) -> Self {
        self.key = ShaderKey { hash, crc };
        self
    }

    /// Overrides the trailer's declared slot count without emitting slot
    /// dwords; used to exercise bounds validation on hostile metadata.
    pub fn raw_slot_count(mut self, count: usize) -> Self {
        self.raw_slot_count = Some(count);
        self
    }

    /// Assembles the binary: code, slots, trailer.
    pub fn build(self) -> Vec<u32> {
        let stage_raw: u32 = match self.stage {
            ShaderStage::Pixel => 0,
            ShaderStage::Vertex => 1,
            ShaderStage::Geometry => 2,
            ShaderStage::Hull => 3,
            ShaderStage::Domain => 4,
            ShaderStage::Compute => 5,
            ShaderStage::Fetch => panic!("fetch shaders carry no trailer"),
        };

        let mut out = self.code.clone();
        for slot in &self.slots {
            out.push(slot.to_dword());
        }

        let num_slots = self.raw_slot_count.unwrap_or(self.slots.len());
        let num_slots = u32::try_from(num_slots).expect("slot count does not fit in u32");
        let length_bytes = u32::try_from(self.code.len() * 4).expect("code too large");

        out.push(u32::from_le_bytes(*b"OrbS"));
        out.push(u32::from_le_bytes([b'h', b'd', b'r', 1]));
        // is_pssl=1 | stage | length in bytes. No chunk usage masks are
        // emitted, so the mask base offset below is zero.
        out.push(1 | (stage_raw << 2) | (length_bytes << 8));
        out.push(num_slots << 8);
        out.push(self.key.hash);
        out.push(0); // hash1; unused by the parser
        out.push(self.key.crc);
        out
    }
}

/// `s_endpgm`.
pub const S_ENDPGM: u32 = 0xBF81_0000;

/// Encodes `buffer_load_format_*` (`op` 0-3) with `idxen` set, addressing
/// `v[vaddr]` through the descriptor at `s[4*srsrc ..]`.
pub fn encode_buffer_load_format(op: u8, vdata: u8, vaddr: u8, srsrc: u8) -> [u32; 2] {
    assert!(op <= 3, "not a buffer_load_format op: {op}");
    let dw0 = (0b111000u32 << 26) | (u32::from(op) << 18) | (1 << 13);
    // soffset 128 = constant zero.
    let dw1 = (128u32 << 24) | (u32::from(srsrc) << 16) | (u32::from(vdata) << 8) | u32::from(vaddr);
    [dw0, dw1]
}

/// Encodes `s_load_dwordx4 s[sdst..], s[2*sbase..], offset` (immediate form).
pub fn encode_s_load_dwordx4(sdst: u8, sbase: u8, offset: u8) -> u32 {
    (0b11000u32 << 27)
        | (2 << 22)
        | (u32::from(sdst) << 15)
        | (u32::from(sbase) << 9)
        | (1 << 8)
        | u32::from(offset)
}

/// Encodes `s_waitcnt` with the given immediate.
pub fn encode_s_waitcnt(simm16: u16) -> u32 {
    (0b1_0111_1111u32 << 23) | (12 << 16) | u32::from(simm16)
}

/// Encodes `s_setpc_b64 s[0:1]`, the fetch-shader terminator.
pub fn encode_s_setpc_b64() -> u32 {
    0xBE80_2000
}

/// Builds a fetch shader in the toolchain's canonical shape: one descriptor
/// load and one `buffer_load_format_*` per attribute, then the terminator.
///
/// `attributes` lists `(vdata, format_op)` pairs in attribute order.
pub fn build_fetch_shader(attributes: &[(u8, u8)]) -> Vec<u32> {
    let mut out = Vec::new();
    for (i, _) in attributes.iter().enumerate() {
        let i = u8::try_from(i).expect("too many attributes");
        out.push(encode_s_load_dwordx4(8 + 4 * i, 1, 4 * i));
    }
    out.push(encode_s_waitcnt(0x007f)); // lgkmcnt(0)
    for (i, &(vdata, op)) in attributes.iter().enumerate() {
        let srsrc = 2 + u8::try_from(i).expect("too many attributes");
        out.extend_from_slice(&encode_buffer_load_format(op, vdata, 0, srsrc));
    }
    out.push(encode_s_waitcnt(0));
    out.push(encode_s_setpc_b64());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::{decode_instruction, Instruction};
    use crate::slice::CodeSlice;

    #[test]
    fn built_fetch_shader_decodes_cleanly() {
        let code = build_fetch_shader(&[(4, 3), (8, 2), (12, 1)]);
        let mut slice = CodeSlice::new(&code);
        let mut loads = 0;
        while !slice.at_end() {
            if let Instruction::BufferFormatLoad(load) =
                decode_instruction(&mut slice).expect("decode failed")
            {
                loads += 1;
                assert!(load.idxen);
            }
        }
        assert_eq!(loads, 3);
    }
}
