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

    src/drive/read.rs

    'read sector' and 'read track' for an STX drive.
*/

use super::StxDrive;
use crate::{
    fdc_buffer::FdcBuffer,
    image::{SectorData, StxImage, StxSector, StxTrack},
    overlay::OverlayStore,
    timing::{
        timing_block_cycles,
        ByteTimer,
        FDC_CYCLES_PER_REVOLUTION,
        FDC_CYCLES_PER_US,
        FDC_STANDARD_BYTE_US,
        TIMING_BLOCK_BYTES,
    },
    track::{patch_sector_data, scan_track_for_sector, synthesize_track, SynthSector},
    types::{DiskCh, FdcStatus, SectorStatus},
    util::random_bytes,
};

/// Return the number of FDC cycles to read `len` bytes at the standard rate.
fn standard_read_cycles(len: usize) -> u32 {
    len as u32 * FDC_STANDARD_BYTE_US * FDC_CYCLES_PER_US
}

/// Append bytes with timings spread evenly over `total_cycles`.
fn push_spread(buf: &mut FdcBuffer, bytes: &[u8], total_cycles: u32) {
    for (&byte, timing) in bytes.iter().zip(ByteTimer::new(total_cycles, bytes.len())) {
        buf.push_timed(byte, timing);
    }
}

impl StxDrive {
    /// Append the data of the last located sector to `buf`, with the time in FDC cycles each
    /// byte takes to read.
    ///
    /// Returns RECORD_NOT_FOUND if the sector has no data field. Otherwise the CRC_ERROR and
    /// RECORD_TYPE bits of the sector's status are returned.
    pub fn read_sector(&mut self, track: u8, side: u8, buf: &mut FdcBuffer) -> FdcStatus {
        let ch = DiskCh::new(track, side);
        let (Some(image), Some(located)) = (self.image.as_ref(), self.located)
        else {
            log::warn!("read_sector(): No located sector on track {} side {}", track, side);
            return FdcStatus::RECORD_NOT_FOUND;
        };
        let Some(stx_track) = image.track(ch)
        else {
            log::warn!("read_sector(): Track {} not found", ch);
            return FdcStatus::RECORD_NOT_FOUND;
        };
        let Some(sector) = stx_track.sectors.get(located.index)
        else {
            log::warn!("read_sector(): Sector {} not found on track {}", located.index, ch);
            return FdcStatus::RECORD_NOT_FOUND;
        };

        if !sector.status.has_data() {
            return FdcStatus::RECORD_NOT_FOUND;
        }

        // A written sector is newer than any written track, as 'write track' removes them.
        if let Some(data) = sector.overlay.and_then(|h| self.overlays.sector(h)).map(|s| &s.data) {
            log::trace!(
                "read_sector(): {} sector {} using written data of {} bytes",
                ch,
                sector.id,
                data.len()
            );
            push_spread(buf, data, standard_read_cycles(data.len()));
            return FdcStatus::from(sector.status);
        }

        if let Some(overlay_track) = stx_track.overlay.and_then(|h| self.overlays.track(h)) {
            return Self::read_sector_from_written_track(&overlay_track.interpreted, sector, buf);
        }

        match image.original_data(sector) {
            Some(data) => Self::read_original_sector(image, sector, data, buf),
            None => {
                log::warn!("read_sector(): {} sector {} has no data", ch, sector.id);
                return FdcStatus::RECORD_NOT_FOUND;
            }
        }
        FdcStatus::from(sector.status)
    }

    fn read_original_sector(image: &StxImage, sector: &StxSector, data: SectorData, buf: &mut FdcBuffer) {
        let len = data.bytes().len();

        match image.timing_table(sector).filter(|t| t.len() >= 2) {
            Some(table) => {
                // Each big-endian table word gives the time to read a block of 16 bytes.
                let table_blocks = table.len() / 2;
                for (block, start) in (0..len).step_by(TIMING_BLOCK_BYTES).enumerate() {
                    let word = (block % table_blocks) * 2;
                    let units = u16::from_be_bytes([table[word], table[word + 1]]);
                    let end = (start + TIMING_BLOCK_BYTES).min(len);

                    let timer = ByteTimer::new(timing_block_cycles(units), TIMING_BLOCK_BYTES);
                    for (i, timing) in (start..end).zip(timer) {
                        buf.push_timed(data.read_byte(i), timing);
                    }
                }
            }
            None => {
                let total = match sector.read_time {
                    0 => standard_read_cycles(len),
                    us => us as u32 * FDC_CYCLES_PER_US,
                };
                for (i, timing) in ByteTimer::new(total, len).enumerate() {
                    buf.push_timed(data.read_byte(i), timing);
                }
            }
        }
    }

    fn read_sector_from_written_track(track: &[u8], sector: &StxSector, buf: &mut FdcBuffer) -> FdcStatus {
        let Some(found) = scan_track_for_sector(track, &sector.id.chsn)
        else {
            log::debug!(
                "read_sector_from_written_track(): Sector {} not found in written track",
                sector.id
            );
            return FdcStatus::RECORD_NOT_FOUND;
        };

        let data = &track[found.data.clone()];
        push_spread(buf, data, standard_read_cycles(data.len()));

        let mut status = FdcStatus::empty();
        status.set(FdcStatus::CRC_ERROR, !found.crc_valid);
        status.set(FdcStatus::RECORD_TYPE, found.deleted);
        status
    }

    /// Append the contents of a whole track to `buf`, starting at the index pulse.
    ///
    /// A written track is returned as it was interpreted when written, with the data of any
    /// sector written since then in place. Otherwise the track
    /// image of the STX file is used if there is one, and a standard track is built from the
    /// track's sectors if not. Tracks missing from the image and tracks without sectors read as
    /// random bytes.
    pub fn read_track(&mut self, track: u8, side: u8, buf: &mut FdcBuffer) -> FdcStatus {
        let ch = DiskCh::new(track, side);
        let Some(image) = self.image.as_ref()
        else {
            log::error!("read_track(): No image in drive");
            return FdcStatus::RECORD_NOT_FOUND;
        };

        let Some(stx_track) = image.track(ch)
        else {
            log::warn!("read_track(): Track {} not in image, returning random bytes", ch);
            for byte in random_bytes(self.track_byte_length(track, side)) {
                buf.push(byte);
            }
            return FdcStatus::empty();
        };

        if let Some(overlay_track) = stx_track.overlay.and_then(|h| self.overlays.track(h)) {
            log::trace!(
                "read_track(): {} using written track of {} bytes",
                ch,
                overlay_track.interpreted.len()
            );
            // Sectors written after the track are newer than its bytes.
            let mut bytes = overlay_track.interpreted.clone();
            for sector in &stx_track.sectors {
                let Some(written) = sector.overlay.and_then(|h| self.overlays.sector(h))
                else {
                    continue;
                };
                if !patch_sector_data(&mut bytes, &sector.id.chsn, &written.data) {
                    log::debug!("read_track(): Sector {} not found in written track {}", sector.id, ch);
                }
            }
            push_spread(buf, &bytes, FDC_CYCLES_PER_REVOLUTION);
            return FdcStatus::empty();
        }

        if let Some(track_image) = image.track_image_bytes(stx_track) {
            push_spread(buf, track_image, FDC_CYCLES_PER_REVOLUTION);
            return FdcStatus::empty();
        }

        if stx_track.sectors.is_empty() {
            log::warn!(
                "read_track(): No track image and no sectors for {}, building an unformatted track",
                ch
            );
            for byte in random_bytes(stx_track.byte_length()) {
                buf.push(byte);
            }
            return FdcStatus::empty();
        }

        log::debug!("read_track(): No track image for {}, building a standard track", ch);
        let sectors = Self::synth_sectors(image, &self.overlays, stx_track);
        synthesize_track(stx_track.byte_length(), &sectors, buf);
        FdcStatus::empty()
    }

    fn synth_sectors<'a>(image: &'a StxImage, overlays: &'a OverlayStore, track: &'a StxTrack) -> Vec<SynthSector<'a>> {
        track
            .sectors
            .iter()
            .map(|sector| {
                let data = match sector.overlay.and_then(|h| overlays.sector(h)) {
                    Some(written) => Some(written.data.as_slice()),
                    None => image.original_data(sector).map(|d| d.bytes()),
                };
                SynthSector {
                    id: sector.id,
                    deleted: sector.status.contains(SectorStatus::RECORD_TYPE),
                    data,
                }
            })
            .collect()
    }
}
