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

//! The `track` module builds and interprets the raw byte streams returned by the WD1772
//! 'read track' command.
//!
//! When an image holds no dump of a track, [synthesize] builds a standard track layout from
//! the track's sectors. When a program formats a track with 'write track', [interpret] converts
//! the bytes it sent into the bytes a later 'read track' returns, and can scan them for sectors.

pub mod interpret;
pub mod synthesize;

pub use interpret::{interpret_written_track, patch_sector_data, scan_track_for_sector, ScannedSector};
pub use synthesize::{synthesize_track, SynthSector};

/// Track pre-gap, filled with $4E.
pub const STANDARD_GAP1: usize = 60;
/// Sector ID pre-gap, filled with $00.
pub const STANDARD_GAP2: usize = 12;
/// Sector ID post-gap, filled with $4E.
pub const STANDARD_GAP3A: usize = 22;
/// Sector data pre-gap, filled with $00.
pub const STANDARD_GAP3B: usize = 12;
/// Sector data post-gap, filled with $4E.
pub const STANDARD_GAP4: usize = 40;

pub const GAP_BYTE: u8 = 0x4E;
pub const SYNC_BYTE: u8 = 0x00;
pub const MARK_SYNC_BYTE: u8 = 0xA1;
pub const IDAM_BYTE: u8 = 0xFE;
pub const DAM_BYTE: u8 = 0xFB;
pub const DDAM_BYTE: u8 = 0xF8;

pub const DAM_MARKER_BYTES: [u8; 4] = [0xA1, 0xA1, 0xA1, 0xFB];
pub const DDAM_MARKER_BYTES: [u8; 4] = [0xA1, 0xA1, 0xA1, 0xF8];

/// The size of a standard 512 byte sector on a track, including its ID field, data field and
/// gaps.
pub const STANDARD_RAW_SECTOR_512: usize =
    STANDARD_GAP2 + 3 + 1 + 6 + STANDARD_GAP3A + STANDARD_GAP3B + 3 + 1 + 512 + 2 + STANDARD_GAP4;

/// Byte offset of the first sector's bit position on a standard track. STX bit positions point
/// just after the IDAM.
pub const SIMPLE_SECTOR_FIRST_ID_BYTE: usize = STANDARD_GAP1 + STANDARD_GAP2 + 4;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_layout() {
        assert_eq!(STANDARD_RAW_SECTOR_512, 614);
        assert_eq!(SIMPLE_SECTOR_FIRST_ID_BYTE, 76);
    }
}
