//! A safe parser for GCN console shader binaries.
//!
//! This crate is intended for parsing **untrusted** shader blobs (e.g. from
//! guest memory) without panicking or reading out of bounds.
//!
//! It provides:
//!
//! - A cursor ([`CodeSlice`]) and instruction decoder ([`decode_instruction`])
//!   over a raw GCN dword stream. The decoder classifies every instruction by
//!   encoding family and fully decodes the `buffer_load_format_*` forms that
//!   fetch-shader reconstruction depends on.
//! - A bounds-checked parser for the `OrbShdr` shader-binary trailer
//!   ([`ProgramInfo`]), which carries the code size, the 64-bit shader key and
//!   the declared input usage slots.
//! - The input-usage ABI ([`UsageType`], [`InputUsageSlot`]) including the
//!   per-type descriptor sizes.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod binary;
mod decode;
mod slice;
mod usage;

/// Helpers for building synthetic shader binaries in tests.
///
/// This module is only available when compiling this crate's own tests, or
/// when the `test-utils` feature is enabled. It is **not** considered part of
/// the stable parsing API.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use crate::binary::{
    fetch_shader_len, BinaryError, ProgramInfo, ShaderKey, ShaderStage, MAX_FETCH_SHADER_DWORDS,
};
pub use crate::decode::{
    decode_instruction, BufferFormatLoad, DecodeError, DecodeErrorKind, Encoding, Instruction,
    ScalarMemory,
};
pub use crate::slice::CodeSlice;
pub use crate::usage::{InputUsageSlot, UsageType, MAX_USER_DATA_REGS};
