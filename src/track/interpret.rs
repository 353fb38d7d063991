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

    src/track/interpret.rs

    Interpret the bytes sent to a 'write track' command.

    The WD1772 treats some byte values specially when formatting a track:
      $F5 writes an $A1 sync byte with a missing clock and presets the CRC
      $F6 writes a $C2 sync byte with a missing clock
      $F7 writes the two CRC bytes
    Every other value is written as is.
*/

use super::*;
use crate::{
    types::{chs::IDAM_MARKER_BYTES, DiskChsn},
    util::{crc_ibm_3740, crc_ibm_3740_byte},
};
use std::ops::Range;

const WRITE_SYNC_A1: u8 = 0xF5;
const WRITE_SYNC_C2: u8 = 0xF6;
const WRITE_CRC: u8 = 0xF7;

/// The WD1772 gives up looking for a data mark this many bytes after the ID field.
const DAM_SEARCH_WINDOW: usize = 43;

/// Convert the bytes written by a 'write track' command into the bytes a 'read track' command
/// will return.
pub fn interpret_written_track(written: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(written.len() + written.len() / 64);
    let mut crc = 0xFFFFu16;
    let mut prev = 0u8;

    for &byte in written {
        match byte {
            WRITE_SYNC_A1 => {
                if prev != WRITE_SYNC_A1 {
                    crc = 0xFFFF;
                }
                out.push(MARK_SYNC_BYTE);
                crc = crc_ibm_3740_byte(crc, MARK_SYNC_BYTE);
            }
            WRITE_SYNC_C2 => {
                out.push(0xC2);
                crc = crc_ibm_3740_byte(crc, 0xC2);
            }
            WRITE_CRC => {
                out.extend_from_slice(&crc.to_be_bytes());
            }
            _ => {
                out.push(byte);
                crc = crc_ibm_3740_byte(crc, byte);
            }
        }
        prev = byte;
    }
    out
}

/// A sector data field found in an interpreted track.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScannedSector {
    /// Range of the data bytes within the track.
    pub data: Range<usize>,
    /// The data field used a deleted data mark.
    pub deleted: bool,
    /// The CRC following the data matches its contents.
    pub crc_valid: bool,
}

/// Scan the bytes of a track for the data field of the sector with ID `id`, as the controller
/// would. ID fields with a bad CRC are skipped. Returns None if no matching ID field with a
/// following data field was found, or if the data field runs past the end of the track.
pub fn scan_track_for_sector(track: &[u8], id: &DiskChsn) -> Option<ScannedSector> {
    let mut pos = 0;

    while pos + 10 <= track.len() {
        if track[pos..pos + 4] != IDAM_MARKER_BYTES {
            pos += 1;
            continue;
        }

        let found = DiskChsn::new(track[pos + 4], track[pos + 5], track[pos + 6], track[pos + 7]);
        let stored_crc = u16::from_be_bytes([track[pos + 8], track[pos + 9]]);
        let id_end = pos + 10;

        if stored_crc != crc_ibm_3740(&track[pos..pos + 8], None) {
            log::trace!("scan_track_for_sector(): Skipping ID field {} with bad CRC at {}", found, pos);
        }
        else if found.matches_chs(id) {
            match find_data_field(track, id_end, found.n_size()) {
                Some(scanned) => return Some(scanned),
                None => log::trace!("scan_track_for_sector(): No data field for ID field {} at {}", found, pos),
            }
        }
        pos = id_end;
    }
    None
}

/// Replace the data of the sector with ID `id` in an interpreted track and rewrite the CRC
/// after it. Data longer than the data field is cut to fit. Returns false if the sector's data
/// field was not found.
pub fn patch_sector_data(track: &mut [u8], id: &DiskChsn, data: &[u8]) -> bool {
    let Some(found) = scan_track_for_sector(track, id)
    else {
        return false;
    };

    let len = data.len().min(found.data.len());
    track[found.data.start..found.data.start + len].copy_from_slice(&data[..len]);

    // The CRC covers the data mark as well as the data.
    let mark = found.data.start - DAM_MARKER_BYTES.len();
    let crc = crc_ibm_3740(&track[mark..found.data.end], None);
    track[found.data.end..found.data.end + 2].copy_from_slice(&crc.to_be_bytes());
    true
}

fn find_data_field(track: &[u8], search_start: usize, size: usize) -> Option<ScannedSector> {
    let search_end = (search_start + DAM_SEARCH_WINDOW).min(track.len().saturating_sub(4));

    for mark in search_start..=search_end {
        let deleted = match track.get(mark..mark + 4)? {
            m if m == DAM_MARKER_BYTES => false,
            m if m == DDAM_MARKER_BYTES => true,
            _ => continue,
        };

        let data = mark + 4..mark + 4 + size;
        let crc_bytes = track.get(data.end..data.end + 2)?;
        let stored_crc = u16::from_be_bytes([crc_bytes[0], crc_bytes[1]]);
        let crc_valid = stored_crc == crc_ibm_3740(&track[mark..data.end], None);

        return Some(ScannedSector { data, deleted, crc_valid });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build the bytes a formatting program would send for one sector.
    fn format_sector(out: &mut Vec<u8>, chsn: DiskChsn, fill: u8, deleted: bool) {
        out.extend_from_slice(&[0x4E; 22]);
        out.extend_from_slice(&[0x00; 12]);
        out.extend_from_slice(&[0xF5, 0xF5, 0xF5, 0xFE]);
        let (c, h, s, n) = chsn.get();
        out.extend_from_slice(&[c, h, s, n, 0xF7]);
        out.extend_from_slice(&[0x4E; 22]);
        out.extend_from_slice(&[0x00; 12]);
        out.extend_from_slice(&[0xF5, 0xF5, 0xF5, if deleted { 0xF8 } else { 0xFB }]);
        out.extend(std::iter::repeat(fill).take(chsn.n_size()));
        out.push(0xF7);
        out.extend_from_slice(&[0x4E; 40]);
    }

    #[test]
    fn control_bytes_are_expanded() {
        let written = [0x4E, 0xF5, 0xF5, 0xF5, 0xFE, 0x00, 0x00, 0x01, 0x02, 0xF7, 0xF6];
        let read = interpret_written_track(&written);
        assert_eq!(read, vec![0x4E, 0xA1, 0xA1, 0xA1, 0xFE, 0x00, 0x00, 0x01, 0x02, 0xCA, 0x6F, 0xC2]);
    }

    #[test]
    fn formatted_sectors_can_be_found() {
        let mut written = Vec::new();
        for s in 1..=3 {
            format_sector(&mut written, DiskChsn::new(5, 0, s, 2), 0xE5 + s, s == 2);
        }
        let track = interpret_written_track(&written);

        let found = scan_track_for_sector(&track, &DiskChsn::new(5, 0, 2, 2)).unwrap();
        assert!(found.crc_valid);
        assert!(found.deleted);
        assert_eq!(found.data.len(), 512);
        assert!(track[found.data].iter().all(|&b| b == 0xE7));

        assert!(scan_track_for_sector(&track, &DiskChsn::new(5, 0, 4, 2)).is_none());
        assert!(scan_track_for_sector(&track, &DiskChsn::new(6, 0, 1, 2)).is_none());
    }

    #[test]
    fn truncated_data_is_not_found() {
        let mut written = Vec::new();
        format_sector(&mut written, DiskChsn::new(0, 0, 1, 2), 0x00, false);
        written.truncate(written.len() - 300);
        let track = interpret_written_track(&written);
        assert!(scan_track_for_sector(&track, &DiskChsn::new(0, 0, 1, 2)).is_none());
    }

    #[test]
    fn patched_data_gets_a_new_crc() {
        let mut written = Vec::new();
        format_sector(&mut written, DiskChsn::new(2, 1, 1, 2), 0x00, false);
        format_sector(&mut written, DiskChsn::new(2, 1, 2, 2), 0x22, true);
        let mut track = interpret_written_track(&written);

        assert!(patch_sector_data(&mut track, &DiskChsn::new(2, 1, 2, 2), &[0x99; 600]));
        let found = scan_track_for_sector(&track, &DiskChsn::new(2, 1, 2, 2)).unwrap();
        assert!(found.crc_valid);
        assert!(found.deleted);
        assert!(track[found.data].iter().all(|&b| b == 0x99));

        let other = scan_track_for_sector(&track, &DiskChsn::new(2, 1, 1, 2)).unwrap();
        assert!(track[other.data].iter().all(|&b| b == 0x00));

        assert!(!patch_sector_data(&mut track, &DiskChsn::new(2, 1, 3, 2), &[0; 512]));
    }

    #[test]
    fn corrupted_data_reports_crc_error() {
        let mut written = Vec::new();
        format_sector(&mut written, DiskChsn::new(0, 0, 1, 1), 0x00, false);
        let mut track = interpret_written_track(&written);
        let found = scan_track_for_sector(&track, &DiskChsn::new(0, 0, 1, 1)).unwrap();
        track[found.data.start] ^= 0xFF;
        let found = scan_track_for_sector(&track, &DiskChsn::new(0, 0, 1, 1)).unwrap();
        assert!(!found.crc_valid);
    }
}
