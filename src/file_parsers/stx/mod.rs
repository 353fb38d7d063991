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

    src/file_parsers/stx/mod.rs

    A parser for the Pasti STX disk image format.

    STX images are produced by the Pasti imaging tool and the Discovery
    Cartridge. They store the sectors of each track along with the information
    needed to reproduce the copy protections of Atari ST software: sector
    positions, data timings, fuzzy bits, CRC errors and optional raw dumps of
    the whole track.
*/

mod parser;
pub mod records;

use crate::file_parsers::FormatCaps;
use records::STX_MAGIC;

pub struct StxFormat;

impl StxFormat {
    pub fn extensions() -> Vec<&'static str> {
        vec!["stx"]
    }

    pub fn capabilities() -> FormatCaps {
        FormatCaps::CAP_VARIABLE_SPT
            | FormatCaps::CAP_VARIABLE_SSPT
            | FormatCaps::CAP_ADDRESS_CRC
            | FormatCaps::CAP_DATA_CRC
            | FormatCaps::CAP_DATA_DELETED
            | FormatCaps::CAP_SID_OVERRIDE
            | FormatCaps::CAP_WEAK_BITS
            | FormatCaps::CAP_NO_DAM
            | FormatCaps::CAP_TRACK_IMAGE
            | FormatCaps::CAP_SECTOR_TIMING
    }

    /// Return true if the buffer starts with the STX magic and is long enough to hold a header.
    pub fn detect(buf: &[u8]) -> bool {
        buf.len() > STX_MAGIC.len() && buf[0..STX_MAGIC.len()] == STX_MAGIC[..]
    }
}
