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

    src/fdc_buffer.rs

    The byte stream handed back to the floppy controller, with the number of
    FDC cycles each byte takes to arrive.
*/

use crate::timing::FDC_DELAY_CYCLE_MFM_BYTE;

/// A byte read from the disk and the FDC cycles it took to transfer.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FdcByte {
    pub value:  u8,
    pub timing: u16,
}

#[derive(Clone, Debug, Default)]
pub struct FdcBuffer {
    bytes: Vec<FdcByte>,
}

impl FdcBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
        }
    }

    /// Append a byte with the standard double density byte time.
    #[inline]
    pub fn push(&mut self, value: u8) {
        self.push_timed(value, FDC_DELAY_CYCLE_MFM_BYTE as u16);
    }

    #[inline]
    pub fn push_timed(&mut self, value: u8, timing: u16) {
        self.bytes.push(FdcByte { value, timing });
    }

    pub fn extend_from_slice(&mut self, values: &[u8]) {
        self.bytes.extend(values.iter().map(|&value| FdcByte {
            value,
            timing: FDC_DELAY_CYCLE_MFM_BYTE as u16,
        }));
    }

    /// Append `count` copies of a byte, as when writing a gap.
    pub fn fill(&mut self, value: u8, count: usize) {
        for _ in 0..count {
            self.push(value);
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    pub fn get(&self, index: usize) -> Option<&FdcByte> {
        self.bytes.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FdcByte> {
        self.bytes.iter()
    }

    /// Return the values of all bytes, without timings.
    pub fn values(&self) -> Vec<u8> {
        self.bytes.iter().map(|b| b.value).collect()
    }

    /// Return the sum of all byte timings.
    pub fn total_cycles(&self) -> u64 {
        self.bytes.iter().map(|b| b.timing as u64).sum()
    }
}

impl AsRef<[FdcByte]> for FdcBuffer {
    fn as_ref(&self) -> &[FdcByte] {
        &self.bytes
    }
}
