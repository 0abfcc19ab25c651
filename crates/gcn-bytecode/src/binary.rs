use core::fmt;

use crate::usage::InputUsageSlot;

// The shader-binary trailer is located by its 7-byte signature followed by a
// version byte. The trailer is dword-aligned and always follows the code it
// describes.
const TRAILER_SIG: [u8; 7] = *b"OrbShdr";
// sig+version (2 dwords) + packed (1) + slot info (1) + hash0/hash1/crc (3).
const TRAILER_DWORDS: usize = 7;

/// Hard cap on how many dwords [`fetch_shader_len`] will scan for the
/// terminator. Real fetch shaders are a few dozen dwords; this prevents
/// unbounded walks over hostile or garbage input.
pub const MAX_FETCH_SHADER_DWORDS: usize = 256;

// s_setpc_b64 s[0:1], the jump back into the main shader that ends every
// fetch shader.
const FETCH_TERMINATOR: u32 = 0xBE80_2000;

/// The shader stage a binary was compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum ShaderStage {
    Pixel,
    Vertex,
    Geometry,
    Hull,
    Domain,
    Compute,
    /// Auxiliary vertex fetch program; never appears in a binary trailer.
    Fetch,
}

impl ShaderStage {
    fn from_trailer(raw: u32) -> Option<Self> {
        Some(match raw {
            0 => Self::Pixel,
            1 => Self::Vertex,
            2 => Self::Geometry,
            3 => Self::Hull,
            4 => Self::Domain,
            5 => Self::Compute,
            _ => return None,
        })
    }

    /// Short file extension used when dumping raw bytecode.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Pixel => "ps",
            Self::Vertex => "vs",
            Self::Geometry => "gs",
            Self::Hull => "hs",
            Self::Domain => "ds",
            Self::Compute => "cs",
            Self::Fetch => "fs",
        }
    }
}

/// Identity of a shader binary, taken from its trailer.
///
/// The key pairs the toolchain's shader hash with the code CRC; together they
/// identify a compiled module for caching and debug-dump naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderKey {
    /// Toolchain shader hash (`hash0` in the trailer).
    pub hash: u32,
    /// CRC32 of the shader code.
    pub crc: u32,
}

impl ShaderKey {
    /// The key as a single 64-bit value (hash in the high half).
    pub fn as_u64(self) -> u64 {
        (u64::from(self.hash) << 32) | u64::from(self.crc)
    }
}

impl fmt::Display for ShaderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016X}", self.as_u64())
    }
}

/// An error produced while parsing a shader binary or fetch shader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BinaryError {
    /// No `OrbShdr` trailer was found in the binary.
    MissingTrailer,
    /// The declared code length does not fit the supplied buffer.
    InvalidCodeLength {
        /// Declared code length in bytes.
        length_bytes: u32,
        /// Dwords actually supplied.
        available_dwords: usize,
    },
    /// The declared usage-slot area falls outside the binary.
    SlotsOutOfBounds {
        /// Dword index of the trailer.
        trailer_dword: usize,
        /// Declared usage-mask offset, in dwords before the trailer.
        chunk_base_dwords: usize,
        /// Declared slot count.
        num_slots: usize,
    },
    /// The trailer's stage field holds a reserved value.
    UnknownStage {
        /// The raw stage value.
        raw: u32,
    },
    /// No `s_setpc_b64 s[0:1]` terminator within the scan window.
    FetchTerminatorNotFound {
        /// Dwords scanned before giving up.
        scanned: usize,
    },
}

impl fmt::Display for BinaryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinaryError::MissingTrailer => {
                write!(f, "shader binary has no OrbShdr trailer")
            }
            BinaryError::InvalidCodeLength {
                length_bytes,
                available_dwords,
            } => write!(
                f,
                "declared code length {length_bytes} bytes exceeds binary of {available_dwords} dwords"
            ),
            BinaryError::SlotsOutOfBounds {
                trailer_dword,
                chunk_base_dwords,
                num_slots,
            } => write!(
                f,
                "usage slots ({num_slots} slots, mask base -{chunk_base_dwords} dwords) fall before the start of the binary (trailer at dword {trailer_dword})"
            ),
            BinaryError::UnknownStage { raw } => {
                write!(f, "shader binary trailer declares unknown stage {raw}")
            }
            BinaryError::FetchTerminatorNotFound { scanned } => write!(
                f,
                "no s_setpc_b64 terminator within {scanned} dwords of fetch shader"
            ),
        }
    }
}

impl std::error::Error for BinaryError {}

/// Static program metadata parsed out of a shader binary's trailer.
///
/// The binary layout is: code dwords, then the declared input usage slots,
/// then the chunk usage masks, then the trailer itself. All offsets are
/// validated against the supplied buffer before anything is read.
#[derive(Debug, Clone)]
pub struct ProgramInfo<'a> {
    stage: ShaderStage,
    key: ShaderKey,
    code: &'a [u32],
    slots: Vec<InputUsageSlot>,
}

impl<'a> ProgramInfo<'a> {
    /// Parses the trailer of `binary` (code plus metadata, as dwords).
    ///
    /// The input is treated as **untrusted**: every declared offset and count
    /// is validated, and malformed metadata yields an error rather than a
    /// panic or an out-of-bounds read.
    pub fn parse(binary: &'a [u32]) -> Result<ProgramInfo<'a>, BinaryError> {
        let trailer_dword = find_trailer(binary).ok_or(BinaryError::MissingTrailer)?;

        let packed = binary[trailer_dword + 2];
        let stage_raw = (packed >> 2) & 0xf;
        let stage =
            ShaderStage::from_trailer(stage_raw).ok_or(BinaryError::UnknownStage { raw: stage_raw })?;

        let length_bytes = packed >> 8;
        let code_dwords = (length_bytes / 4) as usize;
        if length_bytes % 4 != 0 || code_dwords > trailer_dword {
            return Err(BinaryError::InvalidCodeLength {
                length_bytes,
                available_dwords: binary.len(),
            });
        }

        let slot_info = binary[trailer_dword + 3];
        let chunk_base_dwords = (slot_info & 0xff) as usize;
        let num_slots = ((slot_info >> 8) & 0xff) as usize;

        let slots_start = trailer_dword
            .checked_sub(chunk_base_dwords + num_slots)
            .ok_or(BinaryError::SlotsOutOfBounds {
                trailer_dword,
                chunk_base_dwords,
                num_slots,
            })?;
        let slots = binary[slots_start..slots_start + num_slots]
            .iter()
            .map(|&dw| InputUsageSlot::from_dword(dw))
            .collect();

        let key = ShaderKey {
            hash: binary[trailer_dword + 4],
            crc: binary[trailer_dword + 6],
        };

        Ok(ProgramInfo {
            stage,
            key,
            code: &binary[..code_dwords],
            slots,
        })
    }

    /// The stage this binary was compiled for.
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    /// The binary's identity key.
    pub fn key(&self) -> ShaderKey {
        self.key
    }

    /// The executable code region (excludes metadata).
    pub fn code(&self) -> &'a [u32] {
        self.code
    }

    /// Code size in dwords.
    pub fn code_size_dwords(&self) -> usize {
        self.code.len()
    }

    /// The input usage slots declared by the binary, in declaration order.
    pub fn input_usage_slots(&self) -> &[InputUsageSlot] {
        &self.slots
    }
}

fn find_trailer(binary: &[u32]) -> Option<usize> {
    if binary.len() < TRAILER_DWORDS {
        return None;
    }
    (0..=binary.len() - TRAILER_DWORDS).find(|&i| {
        let a = binary[i].to_le_bytes();
        let b = binary[i + 1].to_le_bytes();
        [a[0], a[1], a[2], a[3], b[0], b[1], b[2]] == TRAILER_SIG
    })
}

/// Length, in dwords, of the fetch shader starting at `code`.
///
/// Fetch shaders carry no trailer; they end with `s_setpc_b64 s[0:1]`, which
/// jumps back to the main shader. The returned length includes the
/// terminator.
pub fn fetch_shader_len(code: &[u32]) -> Result<usize, BinaryError> {
    let window = code.len().min(MAX_FETCH_SHADER_DWORDS);
    code[..window]
        .iter()
        .position(|&dw| dw == FETCH_TERMINATOR)
        .map(|i| i + 1)
        .ok_or(BinaryError::FetchTerminatorNotFound { scanned: window })
}
