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
*/

//! The `chs` module defines the structures used to address a physical track and to hold the
//! contents of a sector's ID field.
//!
//! Note that the ID field of a sector is not required to agree with the physical track it
//! was found on. Copy protections rely on this, so the two are kept as separate types.

use crate::{util::crc_ibm_3740, SECTOR_SIZE_MASK};
use std::fmt::Display;

/// The address mark bytes that precede every ID field: three MFM sync bytes and the IDAM.
pub const IDAM_MARKER_BYTES: [u8; 4] = [0xA1, 0xA1, 0xA1, 0xFE];

/// A physical track address, consisting of a track (cylinder) number and a side (head).
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct DiskCh {
    pub(crate) c: u8,
    pub(crate) h: u8,
}

impl Display for DiskCh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[c:{:2} h:{}]", self.c, self.h)
    }
}

impl DiskCh {
    pub fn new(c: u8, h: u8) -> Self {
        Self { c, h }
    }

    /// Decode the packed track byte used by STX track records: bits 0-6 hold the track number
    /// and bit 7 holds the side.
    pub fn from_track_byte(byte: u8) -> Self {
        Self {
            c: byte & 0x7F,
            h: (byte >> 7) & 0x01,
        }
    }

    /// Return the track (cylinder) number.
    #[inline]
    pub fn c(&self) -> u8 {
        self.c
    }
    /// Return the side (head) number.
    #[inline]
    pub fn h(&self) -> u8 {
        self.h
    }
}

/// A structure representing the four components of a Sector ID:
///  - Cylinder (c)
///  - Head (h)
///  - Sector ID (s)
///  - Sector Size (n)
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq)]
pub struct DiskChsn {
    c: u8,
    h: u8,
    s: u8,
    n: u8,
}

impl Display for DiskChsn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[c:{:2} h:{} s:{:3} n:{}]", self.c, self.h, self.s, self.n)
    }
}

impl DiskChsn {
    pub fn new(c: u8, h: u8, s: u8, n: u8) -> Self {
        Self { c, h, s, n }
    }

    /// Return all four sector ID components.
    #[inline]
    pub fn get(&self) -> (u8, u8, u8, u8) {
        (self.c, self.h, self.s, self.n)
    }
    #[inline]
    pub fn c(&self) -> u8 {
        self.c
    }
    #[inline]
    pub fn h(&self) -> u8 {
        self.h
    }
    #[inline]
    pub fn s(&self) -> u8 {
        self.s
    }
    #[inline]
    pub fn n(&self) -> u8 {
        self.n
    }

    /// Return the size in bytes of a sector with this ID, as the WD1772 would transfer it.
    #[inline]
    pub fn n_size(&self) -> usize {
        Self::n_to_bytes(self.n)
    }

    /// Convert the value of the sector size field (n) into bytes.
    /// The WD1772 only looks at the two lowest bits of the size field, so the result is one of
    /// 128, 256, 512 or 1024.
    #[inline]
    pub fn n_to_bytes(n: u8) -> usize {
        128usize << (n & SECTOR_SIZE_MASK)
    }

    /// Return true if the cylinder, head and sector fields match. The size field is ignored,
    /// as the controller does when comparing an ID field against its registers.
    pub fn matches_chs(&self, other: &DiskChsn) -> bool {
        self.c == other.c && self.h == other.h && self.s == other.s
    }
}

/// The complete contents of a sector's ID field as it appears on disk, including the stored
/// CRC which may or may not be valid.
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq)]
pub struct SectorIdField {
    pub chsn: DiskChsn,
    pub crc:  u16,
}

impl Display for SectorIdField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} crc:{:04X}", self.chsn, self.crc)
    }
}

impl SectorIdField {
    pub fn new(chsn: DiskChsn, crc: u16) -> Self {
        Self { chsn, crc }
    }

    /// Build an ID field with a correctly calculated CRC.
    pub fn with_valid_crc(chsn: DiskChsn) -> Self {
        Self {
            chsn,
            crc: Self::calculate_crc(&chsn),
        }
    }

    /// Calculate the CRC of an ID field, including the three sync bytes and the IDAM.
    pub fn calculate_crc(chsn: &DiskChsn) -> u16 {
        let crc = crc_ibm_3740(&IDAM_MARKER_BYTES, None);
        let (c, h, s, n) = chsn.get();
        crc_ibm_3740(&[c, h, s, n], Some(crc))
    }

    /// Return the six raw bytes of the ID field that follow the IDAM, as returned by a
    /// 'read address' command: track, side, sector, size, CRC high byte, CRC low byte.
    pub fn to_bytes(&self) -> [u8; 6] {
        let (c, h, s, n) = self.chsn.get();
        let crc = self.crc.to_be_bytes();
        [c, h, s, n, crc[0], crc[1]]
    }

    /// Return true if the stored CRC matches the contents of the ID field.
    pub fn crc_valid(&self) -> bool {
        self.crc == Self::calculate_crc(&self.chsn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn track_byte_packs_side_in_bit_7() {
        let ch = DiskCh::from_track_byte(0x85);
        assert_eq!(ch, DiskCh::new(5, 1));
        assert_eq!(DiskCh::from_track_byte(0x4F), DiskCh::new(79, 0));
    }

    #[test]
    fn size_code_uses_low_two_bits() {
        assert_eq!(DiskChsn::n_to_bytes(0), 128);
        assert_eq!(DiskChsn::n_to_bytes(2), 512);
        assert_eq!(DiskChsn::n_to_bytes(3), 1024);
        assert_eq!(DiskChsn::n_to_bytes(6), 512);
    }

    #[test]
    fn id_field_crc() {
        // Well known ID field CRC for track 0, side 0, sector 1, 512 bytes.
        let id = SectorIdField::with_valid_crc(DiskChsn::new(0, 0, 1, 2));
        assert_eq!(id.crc, 0xCA6F);
        assert!(id.crc_valid());
        assert_eq!(id.to_bytes(), [0, 0, 1, 2, 0xCA, 0x6F]);

        let bad = SectorIdField::new(DiskChsn::new(0, 0, 1, 2), 0x1234);
        assert!(!bad.crc_valid());
    }
}
