/*
    FluxFox
    https://github.com/dbalsom/fluxfox

    Copyright 2024-2025 Daniel Balsom

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the “Software”),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.

    --------------------------------------------------------------------------

    src/persistence/snapshot.rs

    A minimal memory snapshot stream. The emulator's snapshot subsystem calls
    every component with the same stream in either save or restore mode, and
    each component stores or restores its state in the same order.
*/

use crate::StxError;

/// The direction of a snapshot operation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SnapshotMode {
    Save,
    Restore,
}

/// A sequence of length-prefixed blocks. Each block is a big-endian u32 length followed by the
/// block's bytes.
#[derive(Clone, Debug)]
pub struct MemorySnapshot {
    mode: SnapshotMode,
    buf:  Vec<u8>,
    pos:  usize,
}

impl MemorySnapshot {
    /// Create an empty snapshot to save state into.
    pub fn new_save() -> Self {
        Self {
            mode: SnapshotMode::Save,
            buf:  Vec::new(),
            pos:  0,
        }
    }

    /// Create a snapshot to restore state from a previously saved buffer.
    pub fn from_bytes(buf: Vec<u8>) -> Self {
        Self {
            mode: SnapshotMode::Restore,
            buf,
            pos: 0,
        }
    }

    pub fn mode(&self) -> SnapshotMode {
        self.mode
    }

    /// Consume the snapshot, returning the saved bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Append a block. Only valid in save mode.
    pub fn store_block(&mut self, data: &[u8]) -> Result<(), StxError> {
        if self.mode != SnapshotMode::Save {
            return Err(StxError::ParameterError);
        }
        let len = u32::try_from(data.len()).map_err(|_| StxError::ParameterError)?;

        self.buf.try_reserve(4 + data.len())?;
        self.buf.extend_from_slice(&len.to_be_bytes());
        self.buf.extend_from_slice(data);
        Ok(())
    }

    /// Return the next block. Only valid in restore mode.
    pub fn restore_block(&mut self) -> Result<&[u8], StxError> {
        if self.mode != SnapshotMode::Restore {
            return Err(StxError::ParameterError);
        }

        let len_bytes = self
            .buf
            .get(self.pos..self.pos + 4)
            .ok_or_else(|| StxError::OverlayFormat("Snapshot ended before block length".to_string()))?;
        let len = u32::from_be_bytes([len_bytes[0], len_bytes[1], len_bytes[2], len_bytes[3]]) as usize;

        let start = self.pos + 4;
        let end = start
            .checked_add(len)
            .filter(|end| *end <= self.buf.len())
            .ok_or_else(|| StxError::OverlayFormat(format!("Snapshot block of {} bytes is truncated", len)))?;

        self.pos = end;
        Ok(&self.buf[start..end])
    }
}
