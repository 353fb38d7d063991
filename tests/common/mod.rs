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

    tests/common/mod.rs

    Common support routines for tests. Images are built in memory, so no
    test depends on image files.
*/
#![allow(dead_code)]

use fluxfox_stx::{DiskChsn, FdcBuffer, FdcStatus, RotationContext, SectorIdField, StxDrive, StxImage};
use hex::encode;
use sha1::{Digest, Sha1};

pub const STATUS_VARIABLE_TIME: u8 = 0x01;
pub const STATUS_CRC: u8 = 0x08;
pub const STATUS_RNF: u8 = 0x10;
pub const STATUS_RECORD_TYPE: u8 = 0x20;
pub const STATUS_FUZZY: u8 = 0x80;

const FLAG_SECTOR_BLOCK: u16 = 0x01;
const FLAG_TRACK_IMAGE: u16 = 0x40;
const FLAG_TRACK_IMAGE_SYNC: u16 = 0x80;

pub fn compute_slice_hash(slice: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(slice);
    let result = hasher.finalize();

    encode(result)
}

/// A sector record of a test image.
#[derive(Clone, Debug)]
pub struct TestSector {
    pub bit_position: u16,
    pub chsn: DiskChsn,
    /// None to store a valid CRC.
    pub id_crc: Option<u16>,
    pub status: u8,
    pub read_time: u16,
    pub data: Vec<u8>,
    pub fuzzy: Option<Vec<u8>>,
    /// Big-endian timing words, one per 16 bytes. Only stored in revision 2 images.
    pub timing: Option<Vec<u8>>,
}

impl TestSector {
    /// A normal sector filled with `fill`.
    pub fn new(bit_position: u16, chsn: DiskChsn, fill: u8) -> Self {
        Self {
            bit_position,
            chsn,
            id_crc: None,
            status: 0,
            read_time: 0,
            data: vec![fill; chsn.n_size()],
            fuzzy: None,
            timing: None,
        }
    }

    /// A sector with counting data, so that every byte is distinct within 256 bytes.
    pub fn counting(bit_position: u16, chsn: DiskChsn) -> Self {
        let mut sector = Self::new(bit_position, chsn, 0);
        for (i, b) in sector.data.iter_mut().enumerate() {
            *b = i as u8;
        }
        sector
    }

    /// A sector without a data field.
    pub fn no_data(bit_position: u16, chsn: DiskChsn, status: u8) -> Self {
        Self {
            status: status | STATUS_RNF,
            data: Vec::new(),
            ..Self::new(bit_position, chsn, 0)
        }
    }

    pub fn with_status(mut self, status: u8) -> Self {
        self.status |= status;
        self
    }

    pub fn with_read_time(mut self, read_time: u16) -> Self {
        self.read_time = read_time;
        self
    }

    pub fn with_fuzzy(mut self, mask: Vec<u8>) -> Self {
        self.status |= STATUS_FUZZY;
        self.fuzzy = Some(mask);
        self
    }

    pub fn with_timing(mut self, words: &[u16]) -> Self {
        self.status |= STATUS_VARIABLE_TIME;
        self.timing = Some(words.iter().flat_map(|w| w.to_be_bytes()).collect());
        self
    }

    fn crc(&self) -> u16 {
        self.id_crc.unwrap_or_else(|| SectorIdField::calculate_crc(&self.chsn))
    }
}

/// A track record of a test image.
#[derive(Clone, Debug)]
pub struct TestTrack {
    pub track: u8,
    pub side: u8,
    pub mfm_size: u16,
    pub sectors: Vec<TestSector>,
    /// Track image, with an optional sync position.
    pub image: Option<(Option<u16>, Vec<u8>)>,
    /// Raw 512 byte sectors of a track without sector records.
    pub simple: Option<Vec<Vec<u8>>>,
}

impl TestTrack {
    pub fn new(track: u8, side: u8, sectors: Vec<TestSector>) -> Self {
        Self {
            track,
            side,
            mfm_size: 6250,
            sectors,
            image: None,
            simple: None,
        }
    }

    /// A track holding only consecutive 512 byte sectors.
    pub fn simple(track: u8, side: u8, sectors: Vec<Vec<u8>>) -> Self {
        Self {
            mfm_size: 6250 * 8,
            simple: Some(sectors),
            ..Self::new(track, side, Vec::new())
        }
    }

    pub fn with_image(mut self, sync: Option<u16>, image: Vec<u8>) -> Self {
        self.image = Some((sync, image));
        self
    }

    pub fn with_mfm_size(mut self, mfm_size: u16) -> Self {
        self.mfm_size = mfm_size;
        self
    }

    fn build(&self, revision: u8) -> Vec<u8> {
        let mut body = Vec::new();

        let (flags, sector_count) = match &self.simple {
            Some(raw) => {
                for data in raw {
                    body.extend_from_slice(data);
                }
                (0u16, raw.len() as u16)
            }
            None => {
                let mut flags = FLAG_SECTOR_BLOCK;

                // Track data: the optional track image, then the sector data.
                let mut track_data = Vec::new();
                if let Some((sync, image)) = &self.image {
                    flags |= FLAG_TRACK_IMAGE;
                    if let Some(sync) = sync {
                        flags |= FLAG_TRACK_IMAGE_SYNC;
                        track_data.extend_from_slice(&sync.to_le_bytes());
                    }
                    track_data.extend_from_slice(&(image.len() as u16).to_le_bytes());
                    track_data.extend_from_slice(image);
                }

                let mut offsets = Vec::new();
                for sector in &self.sectors {
                    offsets.push(track_data.len() as u32);
                    track_data.extend_from_slice(&sector.data);
                }

                let tables: Vec<&Vec<u8>> = self.sectors.iter().filter_map(|s| s.timing.as_ref()).collect();
                if revision == 2 && !tables.is_empty() {
                    let size: usize = tables.iter().map(|t| t.len()).sum::<usize>() + 4;
                    track_data.extend_from_slice(&0x0005u16.to_le_bytes());
                    track_data.extend_from_slice(&(size as u16).to_le_bytes());
                    for table in tables {
                        track_data.extend_from_slice(table);
                    }
                }

                for (sector, offset) in self.sectors.iter().zip(offsets) {
                    body.extend_from_slice(&offset.to_le_bytes());
                    body.extend_from_slice(&sector.bit_position.to_le_bytes());
                    body.extend_from_slice(&sector.read_time.to_le_bytes());
                    let (c, h, s, n) = sector.chsn.get();
                    body.extend_from_slice(&[c, h, s, n]);
                    body.extend_from_slice(&sector.crc().to_be_bytes());
                    body.push(sector.status);
                    body.push(0);
                }
                for sector in &self.sectors {
                    if let Some(mask) = &sector.fuzzy {
                        body.extend_from_slice(mask);
                    }
                }
                body.extend_from_slice(&track_data);

                (flags, self.sectors.len() as u16)
            }
        };

        let fuzzy_size: usize = self.sectors.iter().filter_map(|s| s.fuzzy.as_ref()).map(|f| f.len()).sum();

        let mut block = Vec::new();
        block.extend_from_slice(&((body.len() + 16) as u32).to_le_bytes());
        block.extend_from_slice(&(fuzzy_size as u32).to_le_bytes());
        block.extend_from_slice(&sector_count.to_le_bytes());
        block.extend_from_slice(&flags.to_le_bytes());
        block.extend_from_slice(&self.mfm_size.to_le_bytes());
        block.push((self.track & 0x7F) | (self.side << 7));
        block.push(0);
        block.extend_from_slice(&body);
        block
    }
}

/// Builds an STX file in memory.
#[derive(Clone, Debug)]
pub struct StxBuilder {
    pub version: u16,
    pub tool: u16,
    pub revision: u8,
    pub tracks: Vec<TestTrack>,
}

impl Default for StxBuilder {
    fn default() -> Self {
        Self {
            version: 3,
            tool: 0x01,
            revision: 2,
            tracks: Vec::new(),
        }
    }
}

impl StxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn revision(mut self, revision: u8) -> Self {
        self.revision = revision;
        self
    }

    pub fn version(mut self, version: u16) -> Self {
        self.version = version;
        self
    }

    pub fn track(mut self, track: TestTrack) -> Self {
        self.tracks.push(track);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"RSY\0");
        out.extend_from_slice(&self.version.to_le_bytes());
        out.extend_from_slice(&self.tool.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.push(self.tracks.len() as u8);
        out.push(self.revision);
        out.extend_from_slice(&0u32.to_le_bytes());
        for track in &self.tracks {
            out.extend_from_slice(&track.build(self.revision));
        }
        out
    }

    pub fn image(&self) -> StxImage {
        StxImage::from_bytes(self.build()).unwrap()
    }

    /// Build the image and insert it into a drive, without a path.
    pub fn drive(&self) -> StxDrive {
        let mut drive = StxDrive::new();
        drive.insert(self.image(), None);
        drive
    }
}

/// A track with two sectors: A at bit position 100 and B at bit position 5000.
pub fn two_sector_track() -> TestTrack {
    TestTrack::new(
        0,
        0,
        vec![
            TestSector::new(100, DiskChsn::new(0, 0, 1, 2), 0xAA),
            TestSector::new(5000, DiskChsn::new(0, 0, 2, 2), 0xBB),
        ],
    )
}

/// Locate the sector whose ID field starts at `bit_position` by placing the head just before it.
pub fn locate_at_bit(drive: &mut StxDrive, track: u8, side: u8, bit_position: u16) -> Option<u32> {
    let position = (bit_position as u32 * 32).saturating_sub(4 * 256 + 1);
    drive.locate_next_sector_id(&RotationContext::at(position), track, side)
}

pub fn read_sector_bytes(drive: &mut StxDrive, track: u8, side: u8) -> (Vec<u8>, FdcStatus) {
    let mut buf = FdcBuffer::new();
    let status = drive.read_sector(track, side, &mut buf);
    (buf.values(), status)
}

/// The bytes a formatting program sends to 'write track' for a standard track of 512 byte
/// sectors.
pub fn format_track_bytes(track: u8, side: u8, sectors: &[(u8, u8)]) -> Vec<u8> {
    let mut out = vec![0x4E; 60];
    for &(s, fill) in sectors {
        out.extend_from_slice(&[0x00; 12]);
        out.extend_from_slice(&[0xF5, 0xF5, 0xF5, 0xFE, track, side, s, 2, 0xF7]);
        out.extend_from_slice(&[0x4E; 22]);
        out.extend_from_slice(&[0x00; 12]);
        out.extend_from_slice(&[0xF5, 0xF5, 0xF5, 0xFB]);
        out.extend_from_slice(&[fill; 512]);
        out.push(0xF7);
        out.extend_from_slice(&[0x4E; 40]);
    }
    out.resize(6250, 0x4E);
    out
}
