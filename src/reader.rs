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

    src/reader.rs

    A bounds-checked cursor over a borrowed byte buffer.

    Image files are untrusted input. Every offset and size they declare is
    checked against the region it is supposed to lie in before it is used.
*/

use crate::StxError;
use binrw::{meta::ReadEndian, BinRead};
use std::{io::Cursor, ops::Range};

/// A cursor over a window of a larger buffer. Positions reported by the reader are absolute
/// offsets into the underlying buffer, so ranges it returns can be stored and used to slice the
/// buffer later.
#[derive(Clone)]
pub(crate) struct ByteReader<'a> {
    buf:   &'a [u8],
    start: usize,
    end:   usize,
    pos:   usize,
}

impl<'a> ByteReader<'a> {
    /// Create a reader over the entire buffer.
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            start: 0,
            end: buf.len(),
            pos: 0,
        }
    }

    /// Create a reader limited to `len` bytes starting at the absolute offset `start`. The window
    /// must lie inside the window of this reader.
    pub(crate) fn window(&self, start: usize, len: usize) -> Result<ByteReader<'a>, StxError> {
        let range = self.check_range(start, len)?;
        Ok(Self {
            buf:   self.buf,
            start: range.start,
            end:   range.end,
            pos:   range.start,
        })
    }

    /// Return the current absolute position.
    #[inline]
    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    /// Return the absolute end of this reader's window.
    #[inline]
    pub(crate) fn end(&self) -> usize {
        self.end
    }

    #[inline]
    pub(crate) fn remaining(&self) -> usize {
        self.end - self.pos
    }

    /// Move to an absolute position inside the window. Seeking to the very end is allowed.
    pub(crate) fn seek(&mut self, pos: usize) -> Result<(), StxError> {
        if pos < self.start || pos > self.end {
            return Err(StxError::ImageCorrupt(format!(
                "Seek to offset {} outside of region {}..{}",
                pos, self.start, self.end
            )));
        }
        self.pos = pos;
        Ok(())
    }

    /// Verify that `len` bytes at absolute offset `start` lie inside the window, and return them
    /// as a range.
    pub(crate) fn check_range(&self, start: usize, len: usize) -> Result<Range<usize>, StxError> {
        match start.checked_add(len) {
            Some(end) if start >= self.start && end <= self.end => Ok(start..end),
            _ => Err(StxError::ImageCorrupt(format!(
                "Reference to {} bytes at offset {} outside of region {}..{}",
                len, start, self.start, self.end
            ))),
        }
    }

    /// Consume `len` bytes, returning their absolute range.
    pub(crate) fn take_range(&mut self, len: usize) -> Result<Range<usize>, StxError> {
        let range = self.check_range(self.pos, len)?;
        self.pos = range.end;
        Ok(range)
    }

    /// Consume `len` bytes, returning them as a slice.
    pub(crate) fn bytes(&mut self, len: usize) -> Result<&'a [u8], StxError> {
        let range = self.take_range(len)?;
        Ok(&self.buf[range])
    }

    pub(crate) fn u8(&mut self) -> Result<u8, StxError> {
        Ok(self.bytes(1)?[0])
    }

    pub(crate) fn u16_le(&mut self) -> Result<u16, StxError> {
        let b = self.bytes(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub(crate) fn u16_be(&mut self) -> Result<u16, StxError> {
        let b = self.bytes(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub(crate) fn u32_le(&mut self) -> Result<u32, StxError> {
        let b = self.bytes(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub(crate) fn u32_be(&mut self) -> Result<u32, StxError> {
        let b = self.bytes(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Read a fixed-size binrw record of `size` bytes at the current position. The record is
    /// decoded from a bounded slice, so a record can never read beyond the window.
    pub(crate) fn record<T>(&mut self, size: usize) -> Result<T, StxError>
    where
        for<'b> T: BinRead<Args<'b> = ()> + ReadEndian,
    {
        let slice = self.bytes(size)?;
        let mut cursor = Cursor::new(slice);
        T::read(&mut cursor).map_err(|e| StxError::ImageCorrupt(e.to_string()))
    }
}
