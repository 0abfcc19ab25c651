use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use gcn_bytecode::{ShaderKey, ShaderStage};

/// Writes raw shader bytecode to `<dir>/<key>.<stage>.bin` and returns the
/// written path.
///
/// The dump is the raw little-endian dwords, nothing else; it exists so
/// captured shaders can be fed to offline disassemblers.
pub fn dump_shader(
    dir: &Path,
    stage: ShaderStage,
    key: ShaderKey,
    code: &[u32],
) -> io::Result<PathBuf> {
    let path = dir.join(format!("{key}.{}.bin", stage.extension()));
    let mut bytes = Vec::with_capacity(code.len() * 4);
    for dw in code {
        bytes.extend_from_slice(&dw.to_le_bytes());
    }
    fs::write(&path, bytes)?;
    Ok(path)
}
