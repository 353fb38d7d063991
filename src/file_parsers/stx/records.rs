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

    src/file_parsers/stx/records.rs

    Fixed-layout records of the Pasti STX format.
*/

use binrw::binrw;

pub const STX_MAGIC: &[u8; 4] = b"RSY\0";
pub const STX_VERSION: u16 = 3;
pub const STX_HEADER_SIZE: usize = 16;
pub const STX_TRACK_HEADER_SIZE: usize = 16;
pub const STX_SECTOR_RECORD_SIZE: usize = 16;

/// The STX file header.
#[derive(Clone, Debug, Default)]
#[binrw]
#[brw(little)]
pub struct StxFileHeader {
    pub id: [u8; 4],
    pub version: u16,
    pub imaging_tool: u16,
    pub reserved_1: u16,
    pub track_count: u8,
    pub revision: u8,
    pub reserved_2: u32,
}

/// The header of a track record. `block_size` covers the header itself and everything up to the
/// next track record.
#[derive(Clone, Debug, Default)]
#[binrw]
#[brw(little)]
pub struct StxTrackHeader {
    pub block_size: u32,
    pub fuzzy_size: u32,
    pub sector_count: u16,
    pub flags: u16,
    pub mfm_size: u16,
    /// Bits 0-6: track number, bit 7: side
    pub track_number: u8,
    pub record_type: u8,
}

/// A sector descriptor. All fields are little-endian except the ID field CRC, which is stored
/// in the order it appears on disk.
#[derive(Clone, Debug, Default)]
#[binrw]
#[brw(little)]
pub struct StxSectorRecord {
    pub data_offset: u32,
    pub bit_position: u16,
    pub read_time: u16,
    pub id_track: u8,
    pub id_head: u8,
    pub id_sector: u8,
    pub id_size: u8,
    #[brw(big)]
    pub id_crc: u16,
    pub fdc_status: u8,
    pub reserved: u8,
}
