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

    src/persistence/sidecar.rs

    Reading and writing of '.wd1772' overlay files.

    All integers are big-endian. The file starts with a 16 byte header:

      "WD1772", version (u8), revision (u8), sector count (u32), track count (u32)

    followed by a sequence of blocks, each starting with a 4 byte id and a u32
    length. The length counts every byte of the block after the id, the length
    field included:

      "SECT": track, side, bit position (u16), ID track, head, sector, size,
              ID CRC (u16), data size (u16), data
      "TRCK": track, side, data size (u16), written data

    Unknown blocks are skipped.
*/

use crate::{
    overlay::{OverlaySector, OverlayStore, OverlayTrack},
    reader::ByteReader,
    types::{DiskCh, DiskChsn, SectorIdField},
    util::ends_with_ignore_case,
    StxError,
};
use binrw::{binrw, BinWrite};
use std::{
    io::{Cursor, Seek, Write},
    path::{Path, PathBuf},
};

pub const SIDECAR_EXTENSION: &str = "wd1772";
pub const SIDECAR_MAGIC: &[u8; 6] = b"WD1772";
pub const SIDECAR_VERSION: u8 = 1;
pub const SIDECAR_REVISION: u8 = 0;

const SECTOR_BLOCK_ID: &[u8; 4] = b"SECT";
const TRACK_BLOCK_ID: &[u8; 4] = b"TRCK";
const HEADER_SIZE: usize = 16;
const BLOCK_ID_SIZE: usize = 4;
const BLOCK_LEN_SIZE: usize = 4;
const BLOCK_HEADER_SIZE: usize = BLOCK_ID_SIZE + BLOCK_LEN_SIZE;
const SECTOR_BLOCK_FIELDS_SIZE: usize = 12;
const TRACK_BLOCK_FIELDS_SIZE: usize = 4;

#[derive(Debug)]
#[binrw]
#[brw(big)]
struct SidecarHeader {
    magic: [u8; 6],
    version: u8,
    revision: u8,
    sector_count: u32,
    track_count: u32,
}

#[derive(Debug)]
#[binrw]
#[brw(big)]
struct BlockHeader {
    id:  [u8; 4],
    len: u32,
}

#[derive(Debug)]
#[binrw]
#[brw(big)]
struct SectorBlockFields {
    track: u8,
    side: u8,
    bit_position: u16,
    id_track: u8,
    id_head: u8,
    id_sector: u8,
    id_size: u8,
    id_crc: u16,
    size: u16,
}

#[derive(Debug)]
#[binrw]
#[brw(big)]
struct TrackBlockFields {
    track: u8,
    side: u8,
    size: u16,
}

/// Return the path of the overlay file for an image, replacing a `.stx` or `.stx.gz` extension
/// with `.wd1772`. Returns None for any other extension, such as an image inside an archive.
pub fn sidecar_path(image_path: &Path) -> Option<PathBuf> {
    let name = image_path.file_name()?.to_str()?;

    let stem_len = [".stx.gz", ".stx"]
        .iter()
        .find(|ext| ends_with_ignore_case(name, ext))
        .map(|ext| name.len() - ext.len())?;

    Some(image_path.with_file_name(format!("{}.{}", &name[..stem_len], SIDECAR_EXTENSION)))
}

fn size_u16(len: usize, what: &str) -> Result<u16, StxError> {
    u16::try_from(len).map_err(|_| StxError::OverlayFormat(format!("{} of {} bytes is too large to save", what, len)))
}

/// Write all live entries of an overlay store in '.wd1772' format: sectors first, then tracks.
pub fn write_sidecar<W: Write + Seek>(store: &OverlayStore, out: &mut W) -> Result<(), StxError> {
    SidecarHeader {
        magic: *SIDECAR_MAGIC,
        version: SIDECAR_VERSION,
        revision: SIDECAR_REVISION,
        sector_count: store.live_sector_count() as u32,
        track_count: store.track_count() as u32,
    }
    .write(out)?;

    for sector in store.live_sectors() {
        let size = size_u16(sector.data.len(), "Overlay sector")?;
        let (id_track, id_head, id_sector, id_size) = sector.id.chsn.get();

        BlockHeader {
            id:  *SECTOR_BLOCK_ID,
            len: (BLOCK_LEN_SIZE + SECTOR_BLOCK_FIELDS_SIZE + sector.data.len()) as u32,
        }
        .write(out)?;
        SectorBlockFields {
            track: sector.ch.c(),
            side: sector.ch.h(),
            bit_position: sector.bit_position,
            id_track,
            id_head,
            id_sector,
            id_size,
            id_crc: sector.id.crc,
            size,
        }
        .write(out)?;
        out.write_all(&sector.data)?;
    }

    for track in store.tracks() {
        let size = size_u16(track.written.len(), "Overlay track")?;

        BlockHeader {
            id:  *TRACK_BLOCK_ID,
            len: (BLOCK_LEN_SIZE + TRACK_BLOCK_FIELDS_SIZE + track.written.len()) as u32,
        }
        .write(out)?;
        TrackBlockFields {
            track: track.ch.c(),
            side: track.ch.h(),
            size,
        }
        .write(out)?;
        out.write_all(&track.written)?;
    }

    Ok(())
}

/// Encode an overlay store into a new buffer.
pub fn encode_sidecar(store: &OverlayStore) -> Result<Vec<u8>, StxError> {
    let mut cursor = Cursor::new(Vec::new());
    write_sidecar(store, &mut cursor)?;
    Ok(cursor.into_inner())
}

/// Decode a '.wd1772' buffer into an overlay store. The store is not yet linked to any image.
pub fn read_sidecar(buf: &[u8]) -> Result<OverlayStore, StxError> {
    let mut reader = ByteReader::new(buf);
    let header: SidecarHeader = reader.record(HEADER_SIZE).map_err(overlay_error)?;

    if &header.magic != SIDECAR_MAGIC {
        return Err(StxError::OverlayFormat("Bad header".to_string()));
    }
    if header.version != SIDECAR_VERSION || header.revision != SIDECAR_REVISION {
        return Err(StxError::OverlayFormat(format!(
            "Unsupported version {:02X} revision {:02X}",
            header.version, header.revision
        )));
    }

    let mut store = OverlayStore::new();

    while reader.remaining() > 0 {
        let block_start = reader.position();
        let block_header: BlockHeader = reader.record(BLOCK_HEADER_SIZE).map_err(overlay_error)?;
        if (block_header.len as usize) < BLOCK_LEN_SIZE {
            return Err(StxError::OverlayFormat(format!(
                "Block at offset {} has invalid length {}",
                block_start, block_header.len
            )));
        }
        let mut body = reader
            .window(block_start + BLOCK_ID_SIZE, block_header.len as usize)
            .map_err(overlay_error)?;
        body.seek(block_start + BLOCK_HEADER_SIZE).map_err(overlay_error)?;

        match &block_header.id {
            id if id == SECTOR_BLOCK_ID => {
                let fields: SectorBlockFields = body.record(SECTOR_BLOCK_FIELDS_SIZE).map_err(overlay_error)?;
                let data = body.bytes(fields.size as usize).map_err(overlay_error)?;

                let mut owned = Vec::new();
                owned.try_reserve_exact(data.len())?;
                owned.extend_from_slice(data);

                store.add_sector(OverlaySector {
                    ch: DiskCh::new(fields.track, fields.side),
                    bit_position: fields.bit_position,
                    id: SectorIdField::new(
                        DiskChsn::new(fields.id_track, fields.id_head, fields.id_sector, fields.id_size),
                        fields.id_crc,
                    ),
                    data: owned,
                })?;
            }
            id if id == TRACK_BLOCK_ID => {
                let fields: TrackBlockFields = body.record(TRACK_BLOCK_FIELDS_SIZE).map_err(overlay_error)?;
                let data = body.bytes(fields.size as usize).map_err(overlay_error)?;

                let mut owned = Vec::new();
                owned.try_reserve_exact(data.len())?;
                owned.extend_from_slice(data);

                store.add_track(OverlayTrack::new(DiskCh::new(fields.track, fields.side), owned))?;
            }
            id => {
                log::warn!(
                    "read_sidecar(): Unknown block '{}' of {} bytes at offset {}, skipping",
                    String::from_utf8_lossy(id),
                    block_header.len,
                    block_start
                );
            }
        }

        reader.seek(body.end()).map_err(overlay_error)?;
    }

    if store.live_sector_count() != header.sector_count as usize || store.track_count() != header.track_count as usize {
        log::warn!(
            "read_sidecar(): Header declares {} sectors and {} tracks, found {} and {}",
            header.sector_count,
            header.track_count,
            store.live_sector_count(),
            store.track_count()
        );
    }

    log::debug!(
        "read_sidecar(): Loaded {} sectors and {} tracks",
        store.live_sector_count(),
        store.track_count()
    );
    Ok(store)
}

/// Out of range reads in an overlay file are overlay format errors, not image errors.
fn overlay_error(err: StxError) -> StxError {
    match err {
        StxError::ImageCorrupt(msg) => StxError::OverlayFormat(msg),
        other => other,
    }
}
