use core::fmt;

/// Number of inline user-data registers a shader stage exposes.
///
/// Bindings whose start register is at or beyond this count live in the
/// extended user data (EUD) table instead of the inline register window.
pub const MAX_USER_DATA_REGS: u32 = 16;

/// The usage type declared by an input usage slot.
///
/// Discriminants match the console ABI's `ShaderInputUsageType` values; the
/// enum space is sparse (gaps are reserved by the ABI and never declared by
/// real shaders).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum UsageType {
    ImmResource = 0x00,
    ImmSampler = 0x01,
    ImmConstBuffer = 0x02,
    ImmVertexBuffer = 0x03,
    ImmRwResource = 0x04,
    ImmAluFloatConst = 0x05,
    ImmAluBool32Const = 0x06,
    ImmGdsCounterRange = 0x07,
    ImmGdsMemoryRange = 0x08,
    ImmGwsBase = 0x09,
    ImmShaderResourceTable = 0x0a,
    ImmLdsEsGsSize = 0x0d,
    SubPtrFetchShader = 0x12,
    PtrResourceTable = 0x13,
    PtrInternalResourceTable = 0x14,
    PtrSamplerTable = 0x15,
    PtrConstBufferTable = 0x16,
    PtrVertexBufferTable = 0x17,
    PtrSoBufferTable = 0x18,
    PtrRwResourceTable = 0x19,
    PtrInternalGlobalTable = 0x1a,
    PtrExtendedUserData = 0x1b,
    PtrIndirectResourceTable = 0x1c,
    PtrIndirectInternalResourceTable = 0x1d,
    PtrIndirectRwResourceTable = 0x1e,
    ImmGdsKickRingBufferOffset = 0x22,
    ImmVertexRingBufferOffset = 0x23,
    PtrDispatchDraw = 0x24,
    ImmDispatchDrawInstances = 0x25,
}

impl UsageType {
    /// Decodes a raw usage-type byte, or `None` for reserved/unknown values.
    pub fn from_u8(raw: u8) -> Option<Self> {
        Some(match raw {
            0x00 => Self::ImmResource,
            0x01 => Self::ImmSampler,
            0x02 => Self::ImmConstBuffer,
            0x03 => Self::ImmVertexBuffer,
            0x04 => Self::ImmRwResource,
            0x05 => Self::ImmAluFloatConst,
            0x06 => Self::ImmAluBool32Const,
            0x07 => Self::ImmGdsCounterRange,
            0x08 => Self::ImmGdsMemoryRange,
            0x09 => Self::ImmGwsBase,
            0x0a => Self::ImmShaderResourceTable,
            0x0d => Self::ImmLdsEsGsSize,
            0x12 => Self::SubPtrFetchShader,
            0x13 => Self::PtrResourceTable,
            0x14 => Self::PtrInternalResourceTable,
            0x15 => Self::PtrSamplerTable,
            0x16 => Self::PtrConstBufferTable,
            0x17 => Self::PtrVertexBufferTable,
            0x18 => Self::PtrSoBufferTable,
            0x19 => Self::PtrRwResourceTable,
            0x1a => Self::PtrInternalGlobalTable,
            0x1b => Self::PtrExtendedUserData,
            0x1c => Self::PtrIndirectResourceTable,
            0x1d => Self::PtrIndirectInternalResourceTable,
            0x1e => Self::PtrIndirectRwResourceTable,
            0x22 => Self::ImmGdsKickRingBufferOffset,
            0x23 => Self::ImmVertexRingBufferOffset,
            0x24 => Self::PtrDispatchDraw,
            0x25 => Self::ImmDispatchDrawInstances,
            _ => return None,
        })
    }

    /// Size of this usage type's immediate value, in dwords.
    ///
    /// Immediate descriptors occupy their full descriptor size (V#/T#/S#);
    /// pointer kinds occupy the two dwords of a 64-bit address. The match is
    /// exhaustive, so a reserved value can never be sized by accident.
    pub fn size_in_dwords(self) -> u32 {
        match self {
            Self::ImmResource => 8,
            Self::ImmSampler => 4,
            Self::ImmConstBuffer => 4,
            Self::ImmVertexBuffer => 4,
            Self::ImmRwResource => 8,
            Self::ImmAluFloatConst => 1,
            Self::ImmAluBool32Const => 1,
            Self::ImmGdsCounterRange => 1,
            Self::ImmGdsMemoryRange => 1,
            Self::ImmGwsBase => 1,
            Self::ImmShaderResourceTable => 2,
            Self::ImmLdsEsGsSize => 1,
            Self::SubPtrFetchShader => 2,
            Self::PtrResourceTable => 2,
            Self::PtrInternalResourceTable => 2,
            Self::PtrSamplerTable => 2,
            Self::PtrConstBufferTable => 2,
            Self::PtrVertexBufferTable => 2,
            Self::PtrSoBufferTable => 2,
            Self::PtrRwResourceTable => 2,
            Self::PtrInternalGlobalTable => 2,
            Self::PtrExtendedUserData => 2,
            Self::PtrIndirectResourceTable => 2,
            Self::PtrIndirectInternalResourceTable => 2,
            Self::PtrIndirectRwResourceTable => 2,
            Self::ImmGdsKickRingBufferOffset => 1,
            Self::ImmVertexRingBufferOffset => 1,
            Self::PtrDispatchDraw => 2,
            Self::ImmDispatchDrawInstances => 1,
        }
    }
}

/// One declared input usage slot, as stored in the shader binary.
///
/// Wire layout is four bytes: usage type, API slot, start register, and a
/// packed byte holding the register-count and resource-type flags.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct InputUsageSlot {
    /// Raw usage-type byte. May be a reserved value the translator rejects.
    pub usage_type: u8,
    /// The API-level slot index this binding was declared at.
    pub api_slot: u8,
    /// First user-data register (or EUD-relative register) of the binding.
    pub start_register: u8,
    packed: u8,
}

impl InputUsageSlot {
    /// Decodes a slot from its packed dword representation.
    pub fn from_dword(dw: u32) -> Self {
        let [usage_type, api_slot, start_register, packed] = dw.to_le_bytes();
        InputUsageSlot {
            usage_type,
            api_slot,
            start_register,
            packed,
        }
    }

    /// Re-encodes the slot into its packed dword representation.
    pub fn to_dword(self) -> u32 {
        u32::from_le_bytes([
            self.usage_type,
            self.api_slot,
            self.start_register,
            self.packed,
        ])
    }

    /// The decoded usage type, or `None` for reserved values.
    pub fn usage(&self) -> Option<UsageType> {
        UsageType::from_u8(self.usage_type)
    }

    /// Register-count flag (0 = 4-dword resource, 1 = 8-dword resource).
    pub fn register_count(&self) -> u8 {
        self.packed & 0x1
    }

    /// Resource-type flag distinguishing buffer (0) from image (1)
    /// descriptors for `ImmResource`/`ImmConstBuffer` slots.
    pub fn resource_type(&self) -> u8 {
        (self.packed >> 1) & 0x1
    }

    /// Builds a slot from its fields. Mostly useful for tests and host-side
    /// slot synthesis.
    pub fn new(usage_type: u8, api_slot: u8, start_register: u8, resource_type: u8) -> Self {
        InputUsageSlot {
            usage_type,
            api_slot,
            start_register,
            packed: (resource_type & 0x1) << 1,
        }
    }
}

impl fmt::Debug for InputUsageSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputUsageSlot")
            .field("usage", &self.usage())
            .field("usage_type", &self.usage_type)
            .field("api_slot", &self.api_slot)
            .field("start_register", &self.start_register)
            .field("resource_type", &self.resource_type())
            .finish()
    }
}
