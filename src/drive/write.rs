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

    src/drive/write.rs

    'write sector' and 'write track' for an STX drive. Written data goes to
    the overlay store, the image itself is never modified.
*/

use super::{StxDrive, WriteKind};
use crate::{
    overlay::{OverlaySector, OverlayTrack},
    types::{DiskCh, FdcStatus, SectorStatus},
    StxError,
};

fn copy_data(data: &[u8]) -> Result<Vec<u8>, StxError> {
    let mut owned = Vec::new();
    owned.try_reserve_exact(data.len())?;
    owned.extend_from_slice(data);
    Ok(owned)
}

impl StxDrive {
    /// Write `data` to the last located sector. The data replaces the sector's contents for
    /// all later reads, with standard timing and no fuzzy bits.
    ///
    /// Returns RECORD_NOT_FOUND if the sector has no data field, and CRC_ERROR if the sector
    /// is marked with a CRC error.
    pub fn write_sector(&mut self, track: u8, side: u8, data: &[u8]) -> FdcStatus {
        let ch = DiskCh::new(track, side);
        let (Some(image), Some(located)) = (self.image.as_mut(), self.located)
        else {
            log::warn!("write_sector(): No located sector on track {} side {}", track, side);
            return FdcStatus::RECORD_NOT_FOUND;
        };
        let Some(ti) = image.find_track(ch)
        else {
            log::warn!("write_sector(): Track {} not found", ch);
            return FdcStatus::RECORD_NOT_FOUND;
        };
        let Some(sector) = image.tracks[ti].sectors.get_mut(located.index)
        else {
            log::warn!("write_sector(): Sector {} not found on track {}", located.index, ch);
            return FdcStatus::RECORD_NOT_FOUND;
        };

        if !sector.status.has_data() {
            return FdcStatus::RECORD_NOT_FOUND;
        }
        if sector.status.contains(SectorStatus::CRC_ERROR) {
            return FdcStatus::CRC_ERROR;
        }

        let result = match sector.overlay.filter(|&h| self.overlays.sector(h).is_some()) {
            Some(handle) => self.overlays.set_sector_data(handle, data),
            None => copy_data(data)
                .and_then(|owned| {
                    self.overlays.add_sector(OverlaySector {
                        ch,
                        bit_position: sector.bit_position,
                        id: sector.id,
                        data: owned,
                    })
                })
                .map(|handle| sector.overlay = Some(handle)),
        };

        if let Err(e) = result {
            log::error!("write_sector(): Can't store sector {} of track {}: {}", sector.id, ch, e);
            return FdcStatus::RECORD_NOT_FOUND;
        }

        log::trace!("write_sector(): {} sector {} wrote {} bytes", ch, sector.id, data.len());
        self.note_write(WriteKind::Sector);
        FdcStatus::empty()
    }

    /// Write a whole track. `data` holds the bytes sent to the controller, including the
    /// $F5-$F7 control bytes. The written track replaces the original track and any sector
    /// written on it before.
    ///
    /// Returns LOST_DATA if the track does not exist in the image.
    pub fn write_track(&mut self, track: u8, side: u8, data: &[u8]) -> FdcStatus {
        let ch = DiskCh::new(track, side);
        let Some(image) = self.image.as_mut()
        else {
            log::warn!("write_track(): No image in drive");
            return FdcStatus::LOST_DATA;
        };
        let Some(ti) = image.find_track(ch)
        else {
            log::warn!("write_track(): Track {} not in image", ch);
            return FdcStatus::LOST_DATA;
        };
        let stx_track = &mut image.tracks[ti];

        let result = match stx_track.overlay.filter(|&h| self.overlays.track(h).is_some()) {
            Some(handle) => self.overlays.set_track_data(handle, data),
            None => copy_data(data)
                .and_then(|owned| self.overlays.add_track(OverlayTrack::new(ch, owned)))
                .map(|handle| stx_track.overlay = Some(handle)),
        };

        if let Err(e) = result {
            log::error!("write_track(): Can't store track {}: {}", ch, e);
            return FdcStatus::LOST_DATA;
        }

        // The new track supersedes every sector written on the old one.
        for sector in stx_track.sectors.iter_mut() {
            if let Some(handle) = sector.overlay.take() {
                self.overlays.free_sector(handle);
            }
        }

        log::trace!("write_track(): {} wrote {} bytes", ch, data.len());
        self.note_write(WriteKind::Track);
        FdcStatus::empty()
    }
}
