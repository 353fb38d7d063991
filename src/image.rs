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

    src/image.rs

    The in-memory index of a parsed STX image.

    The image owns the file buffer. Tracks and sectors refer to their data,
    fuzzy masks and timing tables by range into that buffer, so the buffer is
    never copied or modified after loading.
*/

use crate::{
    containers,
    file_parsers::stx::StxFormat,
    types::{DiskCh, ImagingTool, SectorIdField, SectorStatus, TrackFlags},
    StxError,
};
use std::{
    io::{Read, Write},
    ops::Range,
    path::Path,
};

/// The timing table used for variable-timing sectors in images that do not carry their own
/// table. Each big-endian word covers 16 bytes of sector data.
#[rustfmt::skip]
pub const DEFAULT_TIMING_TABLE: [u8; 64] = [
    0x00,0x7f,0x00,0x7f,0x00,0x7f,0x00,0x7f,0x00,0x7f,0x00,0x7f,0x00,0x7f,0x00,0x7f,
    0x00,0x85,0x00,0x85,0x00,0x85,0x00,0x85,0x00,0x85,0x00,0x85,0x00,0x85,0x00,0x85,
    0x00,0x79,0x00,0x79,0x00,0x79,0x00,0x79,0x00,0x79,0x00,0x79,0x00,0x79,0x00,0x79,
    0x00,0x7f,0x00,0x7f,0x00,0x7f,0x00,0x7f,0x00,0x7f,0x00,0x7f,0x00,0x7f,0x00,0x7f,
];

/// Where the per-16-byte timings of a sector come from.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum TimingSource {
    /// The sector is read at a constant rate derived from its read time.
    #[default]
    None,
    /// A table stored in the image.
    Table(Range<usize>),
    /// The built-in table, for images older than revision 2.
    Default,
}

/// A full dump of a track, as returned by a 'read track' command when the image was made.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackImage {
    pub(crate) sync_position: u16,
    pub(crate) range: Range<usize>,
}

impl TrackImage {
    pub fn sync_position(&self) -> u16 {
        self.sync_position
    }
    pub fn len(&self) -> usize {
        self.range.len()
    }
    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

/// The data of a sector, as it should be returned to the controller.
#[derive(Copy, Clone, Debug)]
pub enum SectorData<'a> {
    /// Data from the original image, with an optional fuzzy bit mask. Bits clear in the mask
    /// are unstable and read back randomly.
    Original { data: &'a [u8], fuzzy: Option<&'a [u8]> },
    /// Data written by the emulated program.
    Overlay(&'a [u8]),
}

impl<'a> SectorData<'a> {
    /// Return the stored bytes, ignoring any fuzzy mask.
    pub fn bytes(&self) -> &'a [u8] {
        match self {
            SectorData::Original { data, .. } => data,
            SectorData::Overlay(data) => data,
        }
    }

    pub fn is_overlay(&self) -> bool {
        matches!(self, SectorData::Overlay(_))
    }

    /// Return the byte at `index` as the drive would read it, blending in random bits where the
    /// fuzzy mask is clear.
    pub fn read_byte(&self, index: usize) -> u8 {
        match self {
            SectorData::Original { data, fuzzy: Some(mask) } => {
                let m = mask[index];
                (data[index] & m) | (rand::random::<u8>() & !m)
            }
            _ => self.bytes()[index],
        }
    }
}

/// A sector of an STX track. Sectors are identified within their track by bit position.
#[derive(Clone, Debug)]
pub struct StxSector {
    pub(crate) data_offset: u32,
    pub(crate) bit_position: u16,
    pub(crate) read_time: u16,
    pub(crate) id: SectorIdField,
    pub(crate) status: SectorStatus,
    pub(crate) reserved: u8,
    /// Length of the data field in bytes. Zero when the sector has no data.
    pub(crate) size: usize,
    pub(crate) data: Option<Range<usize>>,
    pub(crate) fuzzy: Option<Range<usize>>,
    pub(crate) timing: TimingSource,
    /// Index of this sector's entry in the overlay store, if it has been written.
    pub(crate) overlay: Option<usize>,
}

impl StxSector {
    pub fn bit_position(&self) -> u16 {
        self.bit_position
    }
    pub fn read_time(&self) -> u16 {
        self.read_time
    }
    pub fn data_offset(&self) -> u32 {
        self.data_offset
    }
    pub fn id(&self) -> &SectorIdField {
        &self.id
    }
    pub fn status(&self) -> SectorStatus {
        self.status
    }
    pub fn size(&self) -> usize {
        self.size
    }
    pub fn has_fuzzy_mask(&self) -> bool {
        self.fuzzy.is_some()
    }
    pub fn timing_source(&self) -> &TimingSource {
        &self.timing
    }
    pub fn overlay(&self) -> Option<usize> {
        self.overlay
    }
}

/// A track of an STX image.
#[derive(Clone, Debug)]
pub struct StxTrack {
    pub(crate) ch: DiskCh,
    pub(crate) block_size: u32,
    pub(crate) fuzzy_size: u32,
    pub(crate) flags: TrackFlags,
    pub(crate) mfm_size: u16,
    pub(crate) record_type: u8,
    pub(crate) image: Option<TrackImage>,
    pub(crate) timing_flags: u16,
    pub(crate) timing_size: u16,
    pub(crate) sectors: Vec<StxSector>,
    /// Index of this track's entry in the overlay store, if it has been written.
    pub(crate) overlay: Option<usize>,
}

impl StxTrack {
    pub fn ch(&self) -> DiskCh {
        self.ch
    }
    pub fn flags(&self) -> TrackFlags {
        self.flags
    }
    pub fn mfm_size(&self) -> u16 {
        self.mfm_size
    }
    pub fn record_type(&self) -> u8 {
        self.record_type
    }
    pub fn block_size(&self) -> u32 {
        self.block_size
    }
    pub fn fuzzy_size(&self) -> u32 {
        self.fuzzy_size
    }
    pub fn track_image(&self) -> Option<&TrackImage> {
        self.image.as_ref()
    }
    pub fn sectors(&self) -> &[StxSector] {
        &self.sectors
    }
    pub fn overlay(&self) -> Option<usize> {
        self.overlay
    }

    /// Return true if the track record holds only raw 512 byte sectors.
    pub fn is_simple(&self) -> bool {
        !self.flags.contains(TrackFlags::SECTOR_BLOCK)
    }

    /// Return the length of the track in bytes. This is the size of the track image if there is
    /// one, otherwise the MFM size, which is stored in bits for simple tracks.
    pub fn byte_length(&self) -> usize {
        if let Some(image) = &self.image {
            image.len()
        }
        else if self.is_simple() {
            self.mfm_size as usize / 8
        }
        else {
            self.mfm_size as usize
        }
    }

    /// Find a sector by bit position.
    pub fn find_sector_by_position(&self, bit_position: u16) -> Option<usize> {
        self.sectors.iter().position(|s| s.bit_position == bit_position)
    }
}

/// A parsed STX image.
pub struct StxImage {
    pub(crate) buffer: Vec<u8>,
    pub(crate) version: u16,
    pub(crate) imaging_tool: u16,
    pub(crate) revision: u8,
    pub(crate) tracks: Vec<StxTrack>,
    pub(crate) warned_write_sector: bool,
    pub(crate) warned_write_track: bool,
}

impl StxImage {
    /// Parse an STX image from an owned buffer. Gzip compressed buffers are decompressed first
    /// when the `gzip` feature is enabled.
    pub fn from_bytes(buffer: Vec<u8>) -> Result<StxImage, StxError> {
        let buffer = containers::unwrap_container(buffer)?;
        let (header, tracks) = StxFormat::parse(&buffer)?;

        Ok(StxImage {
            buffer,
            version: header.version,
            imaging_tool: header.imaging_tool,
            revision: header.revision,
            tracks,
            warned_write_sector: false,
            warned_write_track: false,
        })
    }

    /// Read and parse an STX image from a reader.
    pub fn load<R: Read>(reader: &mut R) -> Result<StxImage, StxError> {
        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer)?;
        Self::from_bytes(buffer)
    }

    /// Read and parse an STX image from a file.
    pub fn load_path(path: impl AsRef<Path>) -> Result<StxImage, StxError> {
        let buffer = std::fs::read(path.as_ref())?;
        log::debug!(
            "StxImage::load_path(): Read {} bytes from {}",
            buffer.len(),
            path.as_ref().display()
        );
        Self::from_bytes(buffer)
    }

    pub fn version(&self) -> u16 {
        self.version
    }
    pub fn revision(&self) -> u8 {
        self.revision
    }
    pub fn imaging_tool(&self) -> ImagingTool {
        ImagingTool::from(self.imaging_tool)
    }
    pub fn tracks(&self) -> &[StxTrack] {
        &self.tracks
    }
    /// Return the raw file buffer.
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// Find the index of a track by physical address.
    pub fn find_track(&self, ch: DiskCh) -> Option<usize> {
        self.tracks.iter().position(|t| t.ch == ch)
    }

    pub fn track(&self, ch: DiskCh) -> Option<&StxTrack> {
        self.tracks.iter().find(|t| t.ch == ch)
    }

    /// Find a sector by physical track address and bit position, returning the track and sector
    /// indices.
    pub fn find_sector_by_position(&self, ch: DiskCh, bit_position: u16) -> Option<(usize, usize)> {
        let ti = self.find_track(ch)?;
        let si = self.tracks[ti].find_sector_by_position(bit_position)?;
        Some((ti, si))
    }

    /// Return the original data of a sector, or None if the sector has no data field.
    pub fn original_data(&self, sector: &StxSector) -> Option<SectorData<'_>> {
        let data = &self.buffer[sector.data.clone()?];
        let fuzzy = sector.fuzzy.clone().map(|r| &self.buffer[r]);
        Some(SectorData::Original { data, fuzzy })
    }

    /// Return the bytes of a track image.
    pub fn track_image_bytes(&self, track: &StxTrack) -> Option<&[u8]> {
        track.image.as_ref().map(|img| &self.buffer[img.range.clone()])
    }

    /// Return the timing table bytes that apply to a sector.
    pub(crate) fn timing_table(&self, sector: &StxSector) -> Option<&[u8]> {
        match &sector.timing {
            TimingSource::None => None,
            TimingSource::Table(range) => Some(&self.buffer[range.clone()]),
            TimingSource::Default => Some(&DEFAULT_TIMING_TABLE),
        }
    }

    /// Write a human-readable description of the image structure.
    pub fn dump_info<W: Write>(&self, mut out: W) -> std::io::Result<()> {
        writeln!(
            out,
            "STX header version={:04X} tool={:04X} ({}) tracks={} revision={:02X}",
            self.version,
            self.imaging_tool,
            self.imaging_tool(),
            self.tracks.len(),
            self.revision
        )?;

        for (ti, track) in self.tracks.iter().enumerate() {
            writeln!(
                out,
                "  track {:3} {} block={} fuzzy={} sectors={} flags={:04X} mfm_size={} record_type={:X} image={} timings={},{}",
                ti,
                track.ch,
                track.block_size,
                track.fuzzy_size,
                track.sectors.len(),
                track.flags.bits(),
                track.mfm_size,
                track.record_type,
                match &track.image {
                    Some(img) => format!("yes ({} bytes, sync={:04X})", img.len(), img.sync_position),
                    None => "no".to_string(),
                },
                track.timing_flags,
                track.timing_size,
            )?;

            if track.sectors.is_empty() {
                writeln!(
                    out,
                    "    no sectors, {}",
                    if track.image.is_some() {
                        "track image only"
                    }
                    else {
                        "empty / not formatted"
                    }
                )?;
            }

            for (si, sector) in track.sectors.iter().enumerate() {
                writeln!(
                    out,
                    "    sector {:2} offset={} bit_position={} read_time={} {} status={:02X} reserved={:02X} timing={}",
                    si,
                    sector.data_offset,
                    sector.bit_position,
                    sector.read_time,
                    sector.id,
                    sector.status.bits(),
                    sector.reserved,
                    match &sector.timing {
                        TimingSource::None => "none".to_string(),
                        TimingSource::Table(r) => format!("table@{}", r.start),
                        TimingSource::Default => "default".to_string(),
                    }
                )?;
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for StxImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StxImage")
            .field("version", &self.version)
            .field("imaging_tool", &self.imaging_tool)
            .field("revision", &self.revision)
            .field("buffer_len", &self.buffer.len())
            .field("tracks", &self.tracks.len())
            .finish()
    }
}

