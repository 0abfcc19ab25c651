use gcn_bytecode::{BinaryError, DecodeError, UsageType};
use thiserror::Error;

/// A fatal resource-binding resolution failure.
///
/// Every variant carries enough context (usage type, register) to diagnose
/// which declared slot could not be satisfied. None of these are recoverable:
/// a shader missing a mandatory binding cannot execute meaningfully.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// A declared slot's register has no host user-data entry.
    #[error("no user data bound for register {register} (usage type {usage:?})")]
    MissingBinding {
        /// Usage type of the unsatisfied slot.
        usage: UsageType,
        /// Register the slot declared.
        register: u32,
    },

    /// A host entry is shorter than the slot's descriptor size.
    #[error("user data for register {register} holds {have} dwords, {usage:?} needs {need}")]
    ResourceTooSmall {
        /// Usage type of the slot.
        usage: UsageType,
        /// Register the slot declared.
        register: u32,
        /// Dwords supplied by the host.
        have: usize,
        /// Dwords the usage type requires.
        need: usize,
    },

    /// Immediate shader resource tables are a recognized but unimplemented
    /// feature.
    #[error("immediate shader resource tables are not supported (register {register})")]
    ShaderResourceTableUnsupported {
        /// Register the SRT slot declared.
        register: u32,
    },

    /// A slot declared a usage-type byte outside the recognized enum space.
    #[error("unrecognized input usage type {raw:#04x} in slot {slot}")]
    UnrecognizedUsage {
        /// Index of the offending slot.
        slot: usize,
        /// The raw usage-type byte.
        raw: u8,
    },

    /// A recognized usage type the resolver does not handle.
    #[error("input usage type {usage:?} in slot {slot} is not supported")]
    UnsupportedUsage {
        /// Index of the offending slot.
        slot: usize,
        /// The unhandled usage type.
        usage: UsageType,
    },

    /// A slot needs the EUD table but the shader declares no extended
    /// user data pointer.
    #[error("shader declares no extended user data pointer")]
    MissingEudPointer,

    /// An EUD-resident binding falls outside the bound EUD table.
    #[error(
        "extended user data access out of bounds: offset {offset} + {need} dwords exceeds table of {len}"
    )]
    EudOutOfBounds {
        /// Dword offset into the EUD table.
        offset: usize,
        /// Dwords required at that offset.
        need: usize,
        /// EUD table length in dwords.
        len: usize,
    },
}

/// An error constructing a [`GcnShaderModule`](crate::GcnShaderModule).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModuleError {
    /// The main shader binary is malformed.
    #[error("malformed shader binary")]
    Binary(#[from] BinaryError),

    /// The fetch shader could not be decoded.
    #[error("failed to decode fetch shader")]
    FetchDecode(#[from] DecodeError),
}

/// A fatal `compile()` failure. No partial module is ever produced.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// The main instruction stream could not be decoded.
    #[error("failed to decode shader instruction stream")]
    Decode(#[from] DecodeError),

    /// Shader input bindings could not be resolved.
    #[error("failed to resolve shader input bindings")]
    Resolve(#[from] ResolveError),
}
