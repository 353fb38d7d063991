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

    src/track/synthesize.rs

    Build a standard track for 'read track' from a list of sectors.
*/

use super::*;
use crate::{fdc_buffer::FdcBuffer, types::chs::IDAM_MARKER_BYTES, util::crc_ibm_3740, SectorIdField};

/// A sector to place on a synthesized track.
#[derive(Copy, Clone, Debug)]
pub struct SynthSector<'a> {
    pub id: SectorIdField,
    /// Write a deleted data mark instead of a normal one.
    pub deleted: bool,
    /// The data field contents, or None if the sector has no data.
    pub data: Option<&'a [u8]>,
}

impl SynthSector<'_> {
    /// Return the worst case number of bytes this sector adds to the track.
    fn footprint(&self) -> usize {
        self.data.map(|d| d.len()).unwrap_or(0)
            + STANDARD_GAP2
            + 10
            + STANDARD_GAP3A
            + STANDARD_GAP3B
            + 4
            + 2
            + STANDARD_GAP4
    }
}

/// Append a standard track of `track_len` bytes to `out`, built from `sectors` in order.
/// Sectors that would not fit in the track are dropped with a warning. The end of the track is
/// padded with gap bytes. All bytes get the standard byte timing.
pub fn synthesize_track(track_len: usize, sectors: &[SynthSector], out: &mut FdcBuffer) {
    let start = out.len();

    out.fill(GAP_BYTE, STANDARD_GAP1);

    for (i, sector) in sectors.iter().enumerate() {
        if out.len() - start + sector.footprint() >= track_len {
            log::warn!(
                "synthesize_track(): Sector {} of {} does not fit in a track of {} bytes, truncating track",
                i,
                sectors.len(),
                track_len
            );
            break;
        }

        // ID field
        out.fill(SYNC_BYTE, STANDARD_GAP2);
        out.extend_from_slice(&IDAM_MARKER_BYTES);
        out.extend_from_slice(&sector.id.to_bytes());
        out.fill(GAP_BYTE, STANDARD_GAP3A);
        out.fill(SYNC_BYTE, STANDARD_GAP3B);

        // Data field. A sector without data still gets a mark and the CRC of no bytes.
        let data = sector.data.unwrap_or_default();
        let marker = if sector.deleted {
            DDAM_MARKER_BYTES
        }
        else {
            DAM_MARKER_BYTES
        };
        let crc = crc_ibm_3740(data, Some(crc_ibm_3740(&marker, None)));
        out.extend_from_slice(&marker);
        out.extend_from_slice(data);
        out.extend_from_slice(&crc.to_be_bytes());
        out.fill(GAP_BYTE, STANDARD_GAP4);
    }

    while out.len() - start < track_len {
        out.push(GAP_BYTE);
    }
}
