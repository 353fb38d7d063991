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

    src/drive/mod.rs

    The controller-facing side of the engine. An StxDrive holds one inserted
    STX image and its write overlay, and answers the requests of the WD1772
    state machine: where the next ID field is, and what bytes a read returns.
*/

mod read;
mod write;

use crate::{
    fdc_buffer::FdcBuffer,
    image::{StxImage, StxSector, StxTrack},
    overlay::OverlayStore,
    persistence::{
        sidecar::{encode_sidecar, read_sidecar, sidecar_path},
        snapshot::{MemorySnapshot, SnapshotMode},
    },
    reader::ByteReader,
    timing::{self, FDC_DELAY_CYCLE_MFM_BIT, FDC_DELAY_CYCLE_MFM_BYTE, ID_FIELD_LOOKBACK_CYCLES},
    types::{DiskCh, DiskChsn, FdcStatus, SectorIdField, TrackDensity},
    StxError,
};
use binrw::{binrw, BinWrite};
use std::{
    collections::VecDeque,
    fmt::{self, Display, Formatter},
    io::Cursor,
    path::{Path, PathBuf},
};

/// The state of the drive and machine that the engine cannot know by itself, supplied by the
/// caller when looking for the next sector ID.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RotationContext {
    /// The current rotational position in FDC cycles since the last index pulse, or None if
    /// there is no drive or disk to read from.
    pub position: Option<u32>,
    /// The number of heads of the drive.
    pub heads: u8,
    /// Whether the machine can handle the density of the inserted disk.
    pub density_supported: bool,
}

impl RotationContext {
    /// A double sided drive able to read the disk, at rotational position `position`.
    pub fn at(position: u32) -> Self {
        Self {
            position: Some(position),
            heads: 2,
            density_supported: true,
        }
    }
}

/// The kind of write that produced a notice.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WriteKind {
    Sector,
    Track,
}

impl Display for WriteKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            WriteKind::Sector => write!(f, "write sector"),
            WriteKind::Track => write!(f, "write track"),
        }
    }
}

/// A message for the user about the fate of written data. Each kind of write produces at most
/// one notice per inserted image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DriveNotice {
    /// Changes will be saved into the given overlay file on eject.
    ChangesWillBeSaved { kind: WriteKind, path: PathBuf },
    /// The image has no path an overlay file can be derived from, for example because it was
    /// loaded from an archive, so changes will be lost on eject.
    ChangesCannotBeSaved { kind: WriteKind },
}

impl Display for DriveNotice {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            DriveNotice::ChangesWillBeSaved { kind, path } => write!(
                f,
                "Changes made with '{}' to an STX disk will be saved into {}",
                kind,
                path.display()
            ),
            DriveNotice::ChangesCannotBeSaved { kind } => {
                write!(f, "WARNING: can't save changes made with '{}' to this STX disk", kind)
            }
        }
    }
}

/// The ID field selected by the last call to [StxDrive::locate_next_sector_id].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct LocatedSector {
    pub ch: DiskCh,
    /// Index of the sector within its track.
    pub index: usize,
    pub id: SectorIdField,
    /// False if the ID field has a CRC error.
    pub crc_ok: bool,
}

#[derive(Debug)]
#[binrw]
#[brw(big)]
struct LocatedRecord {
    present: u8,
    track: u8,
    side: u8,
    index: u16,
    id_track: u8,
    id_head: u8,
    id_sector: u8,
    id_size: u8,
    id_crc: u16,
    crc_ok: u8,
}

const LOCATED_RECORD_SIZE: usize = 12;

/// A floppy drive with an STX image inserted.
#[derive(Default)]
pub struct StxDrive {
    image: Option<StxImage>,
    path: Option<PathBuf>,
    overlays: OverlayStore,
    located: Option<LocatedSector>,
    contents_changed: bool,
    notices: VecDeque<DriveNotice>,
}

impl StxDrive {
    /// Create an empty drive.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the image at `path` and insert it. If an overlay file for the image exists, it is
    /// loaded as well.
    pub fn insert_path(&mut self, path: impl AsRef<Path>) -> Result<(), StxError> {
        let image = StxImage::load_path(path.as_ref())?;
        self.insert(image, Some(path.as_ref()));
        Ok(())
    }

    /// Insert a parsed image, ejecting any image already in the drive. `path` is the image's
    /// location on disk, used to find and save its overlay file. Without a path, written data
    /// cannot be saved.
    ///
    /// An overlay file that fails to load is reported and ignored, the image is inserted
    /// without it.
    pub fn insert(&mut self, image: StxImage, path: Option<&Path>) {
        if self.image.is_some() {
            if let Err(e) = self.eject() {
                log::error!("insert(): Failed to save changes of previous image: {}", e);
            }
        }

        self.image = Some(image);
        self.path = path.map(Path::to_path_buf);
        self.overlays.clear();
        self.located = None;
        self.contents_changed = false;

        let Some(overlay_path) = self.path.as_deref().and_then(sidecar_path)
        else {
            return;
        };
        if !overlay_path.exists() {
            return;
        }

        if let Err(e) = self.load_overlays(&overlay_path) {
            log::error!(
                "insert(): Error loading overlay file {}, ignoring it: {}",
                overlay_path.display(),
                e
            );
            self.overlays.clear();
            if let Some(image) = self.image.as_mut() {
                OverlayStore::dissociate(image);
            }
        }
    }

    fn load_overlays(&mut self, overlay_path: &Path) -> Result<(), StxError> {
        let buf = std::fs::read(overlay_path)?;
        let store = read_sidecar(&buf)?;
        if let Some(image) = self.image.as_mut() {
            store.associate(image)?;
        }
        log::debug!(
            "load_overlays(): Restored {} sectors and {} tracks from {}",
            store.live_sector_count(),
            store.track_count(),
            overlay_path.display()
        );
        self.overlays = store;
        Ok(())
    }

    /// Remove the image from the drive, saving written data to its overlay file first if the
    /// contents changed. The image is removed even if saving fails.
    pub fn eject(&mut self) -> Result<Option<StxImage>, StxError> {
        let result = if self.contents_changed {
            self.save_overlays().map(|_| ())
        }
        else {
            Ok(())
        };

        let image = self.image.take();
        self.path = None;
        self.overlays.clear();
        self.located = None;
        self.contents_changed = false;
        self.notices.clear();

        result.map(|_| image)
    }

    /// Write the overlay store to the image's overlay file. Nothing is written if there is no
    /// live overlay entry or if the image has no path an overlay file can be derived from.
    /// Returns true if a file was written.
    pub fn save_overlays(&mut self) -> Result<bool, StxError> {
        if self.overlays.is_empty() {
            return Ok(false);
        }
        let Some(overlay_path) = self.path.as_deref().and_then(sidecar_path)
        else {
            log::warn!("save_overlays(): Image has no overlay file path, changes are lost");
            return Ok(false);
        };

        let buf = encode_sidecar(&self.overlays)?;
        std::fs::write(&overlay_path, buf)?;
        log::debug!(
            "save_overlays(): Saved {} sectors and {} tracks to {}",
            self.overlays.live_sector_count(),
            self.overlays.track_count(),
            overlay_path.display()
        );
        self.contents_changed = false;
        Ok(true)
    }

    pub fn image(&self) -> Option<&StxImage> {
        self.image.as_ref()
    }
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
    pub fn overlays(&self) -> &OverlayStore {
        &self.overlays
    }
    pub fn is_inserted(&self) -> bool {
        self.image.is_some()
    }
    /// Return true if data was written since the image was inserted or last saved.
    pub fn contents_changed(&self) -> bool {
        self.contents_changed
    }
    pub fn located(&self) -> Option<&LocatedSector> {
        self.located.as_ref()
    }

    /// Remove and return all pending user notices.
    pub fn take_notices(&mut self) -> Vec<DriveNotice> {
        self.notices.drain(..).collect()
    }

    fn find_track(&self, ch: DiskCh) -> Option<&StxTrack> {
        self.image.as_ref()?.track(ch)
    }

    /// Find the sector selected by the last locate on the track at `ch`.
    fn located_sector(&self, ch: DiskCh) -> Option<&StxSector> {
        let located = self.located?;
        self.find_track(ch)?.sectors.get(located.index)
    }

    /// Return the length in bytes of a track. Tracks missing from the image have the length of
    /// a standard double density track.
    pub fn track_byte_length(&self, track: u8, side: u8) -> usize {
        timing::track_byte_length(self.find_track(DiskCh::new(track, side)))
    }

    /// Return the density of a track, guessed from its length.
    pub fn track_density(&self, track: u8, side: u8) -> TrackDensity {
        TrackDensity::from_track_length(self.track_byte_length(track, side))
    }

    /// Return the number of FDC cycles for one revolution of a track.
    pub fn cycles_per_revolution(&self, track: u8, side: u8) -> u32 {
        let len = self.track_byte_length(track, side);
        timing::cycles_per_revolution(len, TrackDensity::from_track_length(len))
    }

    /// Find the next ID field to pass under the head, and return the number of FDC cycles until
    /// its first sync byte is reached. The sector is remembered for the following read or
    /// write. Returns None if no ID field can be found: there is no disk or position, the side
    /// does not exist on the drive, the track has no sectors, or the machine can't handle the
    /// disk's density.
    pub fn locate_next_sector_id(&mut self, ctx: &RotationContext, track: u8, side: u8) -> Option<u32> {
        let position = ctx.position? as i64;
        if side == 1 && ctx.heads == 1 {
            return None;
        }
        let ch = DiskCh::new(track, side);
        let stx_track = self.find_track(ch)?;
        if stx_track.sectors.is_empty() || !ctx.density_supported {
            return None;
        }

        let bit_cycles = |s: &StxSector| s.bit_position as i64 * FDC_DELAY_CYCLE_MFM_BIT as i64;
        let lookback = ID_FIELD_LOOKBACK_CYCLES as i64;

        let (index, delay) = match stx_track
            .sectors
            .iter()
            .position(|s| position < bit_cycles(s) - lookback)
        {
            Some(i) => (i, bit_cycles(&stx_track.sectors[i]) - position),
            None => {
                // Past the last ID field: wait for the index pulse, then for the first sector.
                let track_cycles = stx_track.byte_length() as i64 * FDC_DELAY_CYCLE_MFM_BYTE as i64;
                (0, track_cycles - position + bit_cycles(&stx_track.sectors[0]))
            }
        };

        let sector = &stx_track.sectors[index];
        let located = LocatedSector {
            ch,
            index,
            id: sector.id,
            crc_ok: !sector.status.id_crc_error(),
        };
        log::trace!(
            "locate_next_sector_id(): {} position {} found sector {} {} delay {}",
            ch,
            position,
            index,
            located.id,
            delay - lookback
        );
        self.located = Some(located);

        // Bit positions point just past the IDAM; report the delay to the first $A1 instead.
        Some((delay - lookback).max(0) as u32)
    }

    /// The track number of the last located ID field.
    pub fn next_sector_id_tr(&self) -> u8 {
        self.located.map(|l| l.id.chsn.c()).unwrap_or(0)
    }
    /// The sector number of the last located ID field.
    pub fn next_sector_id_sr(&self) -> u8 {
        self.located.map(|l| l.id.chsn.s()).unwrap_or(0)
    }
    /// The size code of the last located ID field.
    pub fn next_sector_id_len(&self) -> u8 {
        self.located.map(|l| l.id.chsn.n()).unwrap_or(0)
    }
    /// Whether the CRC of the last located ID field is correct.
    pub fn next_sector_id_crc_ok(&self) -> bool {
        self.located.map(|l| l.crc_ok).unwrap_or(false)
    }

    /// Append the six bytes of the last located ID field to `buf`. Returns CRC_ERROR if the ID
    /// field has a bad CRC.
    pub fn read_address_field(&mut self, track: u8, side: u8, buf: &mut FdcBuffer) -> FdcStatus {
        let Some(sector) = self.located_sector(DiskCh::new(track, side))
        else {
            log::error!(
                "read_address_field(): No located sector on track {} side {}",
                track,
                side
            );
            return FdcStatus::RECORD_NOT_FOUND;
        };

        buf.extend_from_slice(&sector.id.to_bytes());

        if sector.status.id_crc_error() {
            FdcStatus::CRC_ERROR
        }
        else {
            FdcStatus::empty()
        }
    }

    /// Save or restore the drive's state to or from a memory snapshot: the last located ID
    /// field, then the overlay store. On restore, the overlay store is linked to the image in
    /// the drive.
    pub fn memory_snapshot_capture(&mut self, snapshot: &mut MemorySnapshot) -> Result<(), StxError> {
        match snapshot.mode() {
            SnapshotMode::Save => {
                let record = match self.located {
                    Some(l) => {
                        let (id_track, id_head, id_sector, id_size) = l.id.chsn.get();
                        LocatedRecord {
                            present: 1,
                            track: l.ch.c(),
                            side: l.ch.h(),
                            index: l.index as u16,
                            id_track,
                            id_head,
                            id_sector,
                            id_size,
                            id_crc: l.id.crc,
                            crc_ok: l.crc_ok as u8,
                        }
                    }
                    None => LocatedRecord {
                        present: 0,
                        track: 0,
                        side: 0,
                        index: 0,
                        id_track: 0,
                        id_head: 0,
                        id_sector: 0,
                        id_size: 0,
                        id_crc: 0,
                        crc_ok: 0,
                    },
                };
                let mut cursor = Cursor::new(Vec::new());
                record.write(&mut cursor)?;
                snapshot.store_block(cursor.get_ref())?;
                snapshot.store_block(&encode_sidecar(&self.overlays)?)?;
            }
            SnapshotMode::Restore => {
                let record: LocatedRecord = ByteReader::new(snapshot.restore_block()?).record(LOCATED_RECORD_SIZE)?;
                let store = read_sidecar(snapshot.restore_block()?)?;

                self.located = (record.present != 0).then(|| LocatedSector {
                    ch: DiskCh::new(record.track, record.side),
                    index: record.index as usize,
                    id: SectorIdField::new(
                        DiskChsn::new(record.id_track, record.id_head, record.id_sector, record.id_size),
                        record.id_crc,
                    ),
                    crc_ok: record.crc_ok != 0,
                });

                self.overlays.clear();
                match self.image.as_mut() {
                    Some(image) => {
                        if let Err(e) = store.associate(image) {
                            log::error!("memory_snapshot_capture(): Overlay doesn't match inserted image: {}", e);
                            return Err(e);
                        }
                    }
                    None => {
                        if let Some(sector) = store.live_sectors().next() {
                            return Err(StxError::OrphanedSector {
                                c: sector.ch.c(),
                                h: sector.ch.h(),
                                bit_position: sector.bit_position,
                            });
                        }
                        if let Some(track) = store.tracks().first() {
                            return Err(StxError::OrphanedTrack {
                                c: track.ch.c(),
                                h: track.ch.h(),
                            });
                        }
                    }
                }
                self.overlays = store;
            }
        }
        Ok(())
    }

    /// Record that data was written and queue the user notice for this kind of write, once per
    /// image.
    fn note_write(&mut self, kind: WriteKind) {
        self.contents_changed = true;

        let Some(image) = self.image.as_mut()
        else {
            return;
        };
        let warned = match kind {
            WriteKind::Sector => &mut image.warned_write_sector,
            WriteKind::Track => &mut image.warned_write_track,
        };
        if *warned {
            return;
        }
        *warned = true;

        let notice = match self.path.as_deref().and_then(sidecar_path) {
            Some(path) => DriveNotice::ChangesWillBeSaved { kind, path },
            None => DriveNotice::ChangesCannotBeSaved { kind },
        };
        log::warn!("{}", notice);
        self.notices.push_back(notice);
    }
}
