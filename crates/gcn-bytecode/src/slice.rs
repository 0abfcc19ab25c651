/// A cursor over a GCN code stream.
///
/// Instructions are one or two dwords, optionally followed by a 32-bit
/// literal constant; the decoder advances the cursor by the exact width of
/// each instruction it consumes.
#[derive(Debug, Clone)]
pub struct CodeSlice<'a> {
    code: &'a [u32],
    pos: usize,
}

impl<'a> CodeSlice<'a> {
    /// Creates a cursor at the start of `code`.
    pub fn new(code: &'a [u32]) -> Self {
        CodeSlice { code, pos: 0 }
    }

    /// Returns `true` once every dword has been consumed.
    pub fn at_end(&self) -> bool {
        self.pos >= self.code.len()
    }

    /// Current position, in dwords from the start of the stream.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Number of dwords left to consume.
    pub fn remaining(&self) -> usize {
        self.code.len() - self.pos
    }

    /// Reads one dword and advances, or returns `None` at end of stream.
    pub fn read(&mut self) -> Option<u32> {
        let dw = self.code.get(self.pos).copied()?;
        self.pos += 1;
        Some(dw)
    }
}
