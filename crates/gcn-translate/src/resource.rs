use gcn_bytecode::UsageType;

use crate::fetch::VertexInputSemantic;

/// One entry of the host-supplied user-data table: the dwords the runtime
/// placed behind a shader user-data register.
///
/// For immediate kinds `data` holds the descriptor itself; for the extended
/// user data pointer it is the EUD table; for other pointer kinds it is the
/// pointed-to table. Entries are read-only during resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserData<'a> {
    /// The user-data register this entry is bound to.
    pub start_register: u32,
    /// The bound dwords.
    pub data: &'a [u32],
}

/// A fully located and sized resource binding, produced by resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderResource<'a> {
    /// The register the owning slot declared.
    pub start_register: u32,
    /// Descriptor size for the slot's usage type, in dwords.
    pub size_dwords: u32,
    /// The resolved descriptor dwords (exactly `size_dwords` long).
    pub data: &'a [u32],
}

/// How a descriptor's bytes should be interpreted when declaring the
/// target-side binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorKind {
    /// Plain buffer view (V#).
    VSharp,
    /// Typed image view (T#).
    TSharp,
    /// Sampler state (S#).
    SSharp,
}

/// A resolved binding classified for code generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceBuffer<'a> {
    /// Descriptor interpretation.
    pub kind: DescriptorKind,
    /// The declaring slot's usage type.
    pub usage: UsageType,
    /// The located descriptor.
    pub resource: ShaderResource<'a>,
}

/// Everything the code generator needs about the shader's inputs: the
/// classified descriptor bindings plus any reconstructed vertex semantics.
#[derive(Debug, Clone, Default)]
pub struct ShaderInput<'a> {
    /// Classified descriptor bindings, in slot declaration order.
    pub resource_buffers: Vec<ResourceBuffer<'a>>,
    /// Vertex input semantics recovered from the fetch shader; empty when no
    /// fetch shader was supplied (or it declared no attributes).
    pub vs_semantics: Vec<VertexInputSemantic>,
}
