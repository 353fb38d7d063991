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

    src/overlay.rs

    The write overlay store.

    STX images are read only. Data written by the emulated program is kept
    here instead, and preferred over the original image data when read back.
    Tracks and sectors of the image refer to their overlay entries by index.
*/

use crate::{
    image::StxImage,
    track::interpret_written_track,
    types::{DiskCh, SectorIdField},
    StxError,
};

/// The data written to a single sector with 'write sector'.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OverlaySector {
    /// The physical track the sector is on.
    pub ch: DiskCh,
    /// Bit position of the original sector, which identifies it within its track.
    pub bit_position: u16,
    /// A copy of the original sector's ID field.
    pub id: SectorIdField,
    pub data: Vec<u8>,
}

/// The data written to a whole track with 'write track'.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OverlayTrack {
    pub ch: DiskCh,
    /// The bytes sent to the controller, including $F5-$F7 control bytes.
    pub written: Vec<u8>,
    /// The bytes a 'read track' returns for the written track.
    pub interpreted: Vec<u8>,
}

impl OverlayTrack {
    pub fn new(ch: DiskCh, written: Vec<u8>) -> Self {
        let interpreted = interpret_written_track(&written);
        Self {
            ch,
            written,
            interpreted,
        }
    }
}

/// Overlay entries for one drive. Freed sector entries leave an empty slot behind, so the
/// indices held by the image stay valid.
#[derive(Clone, Debug, Default)]
pub struct OverlayStore {
    sectors: Vec<Option<OverlaySector>>,
    tracks:  Vec<OverlayTrack>,
}

impl OverlayStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove all entries.
    pub fn clear(&mut self) {
        self.sectors.clear();
        self.tracks.clear();
    }

    pub fn sector(&self, handle: usize) -> Option<&OverlaySector> {
        self.sectors.get(handle).and_then(|s| s.as_ref())
    }

    pub fn track(&self, handle: usize) -> Option<&OverlayTrack> {
        self.tracks.get(handle)
    }

    /// Iterate over all sector entries that have not been freed.
    pub fn live_sectors(&self) -> impl Iterator<Item = &OverlaySector> {
        self.sectors.iter().flatten()
    }

    pub fn tracks(&self) -> &[OverlayTrack] {
        &self.tracks
    }

    pub fn live_sector_count(&self) -> usize {
        self.live_sectors().count()
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Return true if the store holds no live entry.
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty() && self.live_sector_count() == 0
    }

    /// Add a sector entry, returning its handle.
    pub fn add_sector(&mut self, sector: OverlaySector) -> Result<usize, StxError> {
        self.sectors.try_reserve(1)?;
        self.sectors.push(Some(sector));
        Ok(self.sectors.len() - 1)
    }

    /// Replace the data of an existing sector entry.
    pub fn set_sector_data(&mut self, handle: usize, data: &[u8]) -> Result<(), StxError> {
        let sector = self
            .sectors
            .get_mut(handle)
            .and_then(|s| s.as_mut())
            .ok_or(StxError::ParameterError)?;

        let mut new_data = Vec::new();
        new_data.try_reserve_exact(data.len())?;
        new_data.extend_from_slice(data);
        sector.data = new_data;
        Ok(())
    }

    /// Free a sector entry. Its slot stays allocated.
    pub fn free_sector(&mut self, handle: usize) {
        if let Some(slot) = self.sectors.get_mut(handle) {
            *slot = None;
        }
    }

    /// Add a track entry, returning its handle.
    pub fn add_track(&mut self, track: OverlayTrack) -> Result<usize, StxError> {
        self.tracks.try_reserve(1)?;
        self.tracks.push(track);
        Ok(self.tracks.len() - 1)
    }

    /// Replace the written bytes of an existing track entry.
    pub fn set_track_data(&mut self, handle: usize, written: &[u8]) -> Result<(), StxError> {
        let track = self.tracks.get_mut(handle).ok_or(StxError::ParameterError)?;

        let mut new_data = Vec::new();
        new_data.try_reserve_exact(written.len())?;
        new_data.extend_from_slice(written);
        track.interpreted = interpret_written_track(&new_data);
        track.written = new_data;
        Ok(())
    }

    /// Link every entry of this store to the matching sector or track of `image`. Sectors are
    /// matched by physical track and bit position, tracks by physical address. An entry without
    /// a match is an error, and leaves the image without any overlay links.
    pub fn associate(&self, image: &mut StxImage) -> Result<(), StxError> {
        Self::dissociate(image);

        let result = self.link(image);
        if result.is_err() {
            Self::dissociate(image);
        }
        result
    }

    fn link(&self, image: &mut StxImage) -> Result<(), StxError> {
        for (handle, sector) in self.sectors.iter().enumerate() {
            let Some(sector) = sector
            else {
                continue;
            };
            let (ti, si) = image
                .find_sector_by_position(sector.ch, sector.bit_position)
                .ok_or(StxError::OrphanedSector {
                    c: sector.ch.c(),
                    h: sector.ch.h(),
                    bit_position: sector.bit_position,
                })?;
            image.tracks[ti].sectors[si].overlay = Some(handle);
        }

        for (handle, track) in self.tracks.iter().enumerate() {
            let ti = image.find_track(track.ch).ok_or(StxError::OrphanedTrack {
                c: track.ch.c(),
                h: track.ch.h(),
            })?;
            image.tracks[ti].overlay = Some(handle);
        }
        Ok(())
    }

    /// Remove all overlay links from an image.
    pub fn dissociate(image: &mut StxImage) {
        for track in image.tracks.iter_mut() {
            track.overlay = None;
            for sector in track.sectors.iter_mut() {
                sector.overlay = None;
            }
        }
    }
}
