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

//! # fluxfox_stx
//!
//! An emulation engine for Pasti STX floppy disk images, intended to sit behind the WD1772
//! floppy disk controller of an Atari ST emulator.
//!
//! An [StxImage] is parsed once when a disk is inserted into an [StxDrive]. The drive then
//! answers the requests of the controller state machine: how many cycles until the next
//! sector ID field passes under the head, the bytes (and per-byte timings) of a sector or a
//! whole track, and so on.
//!
//! The source image is never modified. Sector and track writes are captured in an
//! [OverlayStore], which may be persisted to a `.wd1772` sidecar file next to the image and
//! into emulator memory snapshots.

pub mod containers;
pub mod drive;
pub mod fdc_buffer;
pub mod file_parsers;
pub mod image;
pub mod overlay;
pub mod persistence;
mod reader;
pub mod timing;
pub mod track;
pub mod types;
pub mod util;

use thiserror::Error;

/// The number of bytes on a standard double density track at 300RPM.
pub const DEFAULT_TRACK_SIZE_BYTES: usize = 6250;
/// Sector sizes are encoded by the lower two bits of the ID field's size code on the WD1772.
pub const SECTOR_SIZE_MASK: u8 = 0x03;
pub const DEFAULT_SECTOR_SIZE: usize = 512;

#[derive(Clone, Debug, Error)]
pub enum StxError {
    #[error("An IO error occurred reading or writing the disk image: {0}")]
    IoError(String),
    #[error("Unknown disk image format")]
    UnknownFormat,
    #[error("The disk image format parser determined the image was corrupt: {0}")]
    ImageCorrupt(String),
    #[error("Failed to allocate memory: {0}")]
    AllocationError(String),
    #[error("The overlay file is invalid: {0}")]
    OverlayFormat(String),
    #[error("Saved sector at c:{c} h:{h} bit position {bit_position} has no matching sector in the image")]
    OrphanedSector { c: u8, h: u8, bit_position: u16 },
    #[error("Saved track c:{c} h:{h} has no matching track in the image")]
    OrphanedTrack { c: u8, h: u8 },
    #[error("Invalid parameters were specified to a library function")]
    ParameterError,
}

impl From<std::io::Error> for StxError {
    fn from(err: std::io::Error) -> Self {
        StxError::IoError(err.to_string())
    }
}

impl From<binrw::Error> for StxError {
    fn from(err: binrw::Error) -> Self {
        match err {
            binrw::Error::Io(e) => StxError::IoError(e.to_string()),
            _ => StxError::ImageCorrupt(err.to_string()),
        }
    }
}

impl From<std::collections::TryReserveError> for StxError {
    fn from(err: std::collections::TryReserveError) -> Self {
        StxError::AllocationError(err.to_string())
    }
}

pub use crate::{
    drive::{DriveNotice, LocatedSector, RotationContext, StxDrive, WriteKind},
    fdc_buffer::{FdcBuffer, FdcByte},
    image::{SectorData, StxImage, StxSector, StxTrack},
    overlay::{OverlaySector, OverlayStore, OverlayTrack},
    persistence::snapshot::MemorySnapshot,
    types::{DiskCh, DiskChsn, FdcStatus, ImagingTool, SectorIdField, SectorStatus, TrackDensity, TrackFlags},
};
