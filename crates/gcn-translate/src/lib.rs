//! Translation core for GCN console shader binaries.
//!
//! This crate resolves the console's register-indexed resource-binding model
//! into concrete, sized resource views and drives the two-pass
//! (analyze, then compile) translation pipeline over a decoded instruction
//! stream. The instruction decoder lives in `gcn-bytecode`; the analyzer and
//! code generator are external collaborators plugged in through the
//! [`Backend`] trait.
//!
//! The entry point is [`GcnShaderModule`]: construct it from raw bytecode
//! (optionally with the auxiliary vertex fetch shader), install the host's
//! user-data table with [`GcnShaderModule::define_shader_input`], then call
//! [`GcnShaderModule::compile`].

#![forbid(unsafe_code)]

mod backend;
mod error;
mod fetch;
mod module;
mod resolver;
mod resource;

#[cfg(feature = "dump-shaders")]
mod dump;

pub use crate::backend::{AnalysisPass, Backend, CompilePass};
pub use crate::error::{CompileError, ModuleError, ResolveError};
pub use crate::fetch::VertexInputSemantic;
pub use crate::module::GcnShaderModule;
pub use crate::resource::{
    DescriptorKind, ResourceBuffer, ShaderInput, ShaderResource, UserData,
};

#[cfg(feature = "dump-shaders")]
pub use crate::dump::dump_shader;

pub use gcn_bytecode::{
    InputUsageSlot, ProgramInfo, ShaderKey, ShaderStage, UsageType, MAX_USER_DATA_REGS,
};
