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

    src/file_parsers/stx/parser.rs

    Builds the track and sector index of an STX image.

    A track record is laid out as follows:

      track header (16 bytes)
      sector records (16 bytes each, if the SECTOR_BLOCK flag is set)
      fuzzy mask bytes (fuzzy_size bytes)
      track data:
        [sync position (u16)]   if TRACK_IMAGE_SYNC is set
        [track image size (u16)] if TRACK_IMAGE is set
        [track image]
        sector data, addressed by each sector's data offset from the start of track data
      [timing table header + timings] for revision 2 images with variable timing sectors

    Tracks without the SECTOR_BLOCK flag hold nothing but consecutive 512 byte sectors.
*/

use super::{
    records::{
        StxFileHeader,
        StxSectorRecord,
        StxTrackHeader,
        STX_HEADER_SIZE,
        STX_SECTOR_RECORD_SIZE,
        STX_TRACK_HEADER_SIZE,
        STX_VERSION,
    },
    StxFormat,
};
use crate::{
    image::{StxSector, StxTrack, TimingSource, TrackImage},
    reader::ByteReader,
    track::{SIMPLE_SECTOR_FIRST_ID_BYTE, STANDARD_RAW_SECTOR_512},
    types::{DiskCh, DiskChsn, SectorIdField, SectorStatus, TrackFlags},
    StxError,
    DEFAULT_SECTOR_SIZE,
};

impl StxFormat {
    /// Parse an STX file buffer into its header and track index.
    pub(crate) fn parse(buf: &[u8]) -> Result<(StxFileHeader, Vec<StxTrack>), StxError> {
        if !Self::detect(buf) {
            return Err(StxError::UnknownFormat);
        }

        let mut reader = ByteReader::new(buf);
        let header: StxFileHeader = reader.record(STX_HEADER_SIZE)?;

        log::trace!(
            "StxFormat::parse(): Header version={:04X} tool={:04X} tracks={} revision={:02X}",
            header.version,
            header.imaging_tool,
            header.track_count,
            header.revision
        );

        if header.version != STX_VERSION {
            log::warn!(
                "StxFormat::parse(): Unexpected STX version {:04X}, attempting to parse anyway",
                header.version
            );
        }

        let mut tracks = Vec::new();
        tracks.try_reserve(header.track_count as usize)?;

        for track_idx in 0..header.track_count {
            let block_start = reader.position();
            let track_header: StxTrackHeader = reader.record(STX_TRACK_HEADER_SIZE)?;

            if (track_header.block_size as usize) < STX_TRACK_HEADER_SIZE {
                return Err(StxError::ImageCorrupt(format!(
                    "Track record {} has invalid block size {}",
                    track_idx, track_header.block_size
                )));
            }

            let mut block = reader.window(block_start, track_header.block_size as usize)?;
            block.seek(block_start + STX_TRACK_HEADER_SIZE)?;

            let track = Self::parse_track(&header, &track_header, &mut block)?;
            log::trace!(
                "StxFormat::parse(): Track {:3} {} flags={:04X} sectors={} length={}",
                track_idx,
                track.ch,
                track.flags.bits(),
                track.sectors.len(),
                track.byte_length()
            );
            tracks.push(track);

            reader.seek(block.end())?;
        }

        Ok((header, tracks))
    }

    fn parse_track(
        header: &StxFileHeader,
        track_header: &StxTrackHeader,
        block: &mut ByteReader,
    ) -> Result<StxTrack, StxError> {
        let ch = DiskCh::from_track_byte(track_header.track_number);
        let flags = TrackFlags::from_bits_retain(track_header.flags);
        let sector_count = track_header.sector_count as usize;

        let mut track = StxTrack {
            ch,
            block_size: track_header.block_size,
            fuzzy_size: track_header.fuzzy_size,
            flags,
            mfm_size: track_header.mfm_size,
            record_type: track_header.record_type,
            image: None,
            timing_flags: 0,
            timing_size: 0,
            sectors: Vec::new(),
            overlay: None,
        };

        if sector_count > 0 && !flags.contains(TrackFlags::SECTOR_BLOCK) {
            track.sectors = Self::build_simple_sectors(ch, sector_count, block)?;
            return Ok(track);
        }

        let mut records = Vec::new();
        records.try_reserve(sector_count)?;
        for _ in 0..sector_count {
            records.push(block.record::<StxSectorRecord>(STX_SECTOR_RECORD_SIZE)?);
        }

        let fuzzy_range = block.take_range(track_header.fuzzy_size as usize)?;
        let track_data = block.position();

        let mut sectors_image_start = track_data;
        if flags.contains(TrackFlags::TRACK_IMAGE) {
            let sync_position = if flags.contains(TrackFlags::TRACK_IMAGE_SYNC) {
                block.u16_le()?
            }
            else {
                0
            };
            let image_size = block.u16_le()? as usize;
            let range = block.take_range(image_size)?;
            sectors_image_start = range.end;
            track.image = Some(TrackImage { sync_position, range });
        }

        if records.is_empty() {
            return Ok(track);
        }

        let mut fuzzy = block.window(fuzzy_range.start, fuzzy_range.len())?;
        let mut sectors = Vec::new();
        sectors.try_reserve(sector_count)?;
        let mut max_sector_end = 0usize;
        let mut variable_timings = false;

        for (i, record) in records.iter().enumerate() {
            let status = SectorStatus::from_bits_retain(record.fdc_status);
            let chsn = DiskChsn::new(record.id_track, record.id_head, record.id_sector, record.id_size);

            let mut sector = StxSector {
                data_offset: record.data_offset,
                bit_position: record.bit_position,
                read_time: record.read_time,
                id: SectorIdField::new(chsn, record.id_crc),
                status,
                reserved: record.reserved,
                size: 0,
                data: None,
                fuzzy: None,
                timing: TimingSource::None,
                overlay: None,
            };

            if status.has_data() {
                if record.id_size & !crate::SECTOR_SIZE_MASK != 0 {
                    log::debug!(
                        "StxFormat::parse_track(): Track {} sector {} has non-standard size code {:02X}",
                        ch,
                        i,
                        record.id_size
                    );
                }
                let size = chsn.n_size();
                let data_start = track_data
                    .checked_add(record.data_offset as usize)
                    .ok_or_else(|| StxError::ImageCorrupt(format!("Track {} sector {} data offset overflow", ch, i)))?;
                sector.size = size;
                sector.data = Some(block.check_range(data_start, size)?);

                if status.contains(SectorStatus::FUZZY) {
                    sector.fuzzy = Some(fuzzy.take_range(size)?);
                }

                max_sector_end = max_sector_end.max(record.data_offset as usize + size);

                if status.contains(SectorStatus::VARIABLE_TIME) {
                    variable_timings = true;
                }
            }
            sectors.push(sector);
        }

        if variable_timings {
            let timing_start = (track_data + max_sector_end).max(sectors_image_start);

            if header.revision == 2 {
                block.seek(timing_start)?;
                track.timing_flags = block.u16_le()?;
                track.timing_size = block.u16_le()?;

                for sector in sectors.iter_mut() {
                    if sector.status.has_data() && sector.status.contains(SectorStatus::VARIABLE_TIME) {
                        let range = block.take_range((sector.size / 16) * 2)?;
                        sector.timing = TimingSource::Table(range);
                    }
                }
            }
            else {
                for sector in sectors.iter_mut() {
                    if sector.status.has_data() && sector.status.contains(SectorStatus::VARIABLE_TIME) {
                        sector.timing = TimingSource::Default;
                    }
                }
            }
        }

        if !sectors.windows(2).all(|w| w[0].bit_position <= w[1].bit_position) {
            log::debug!("StxFormat::parse_track(): Track {} sectors out of order, sorting", ch);
            sectors.sort_by_key(|s| s.bit_position);
        }

        track.sectors = sectors;
        Ok(track)
    }

    /// Build the sectors of a track that stores only consecutive 512 byte sectors, at the
    /// positions they would have on a standard formatted track.
    fn build_simple_sectors(ch: DiskCh, count: usize, block: &mut ByteReader) -> Result<Vec<StxSector>, StxError> {
        let mut sectors = Vec::new();
        sectors.try_reserve(count)?;

        let data_start = block.position();
        for i in 0..count {
            let byte_position = SIMPLE_SECTOR_FIRST_ID_BYTE + i * STANDARD_RAW_SECTOR_512;
            let bit_position = u16::try_from(byte_position * 8).map_err(|_| {
                StxError::ImageCorrupt(format!("Track {} has too many sectors for a standard layout", ch))
            })?;
            let chsn = DiskChsn::new(ch.c(), ch.h(), (i + 1) as u8, 2);

            sectors.push(StxSector {
                data_offset: 0,
                bit_position,
                read_time: 0,
                id: SectorIdField::with_valid_crc(chsn),
                status: SectorStatus::empty(),
                reserved: 0,
                size: DEFAULT_SECTOR_SIZE,
                data: Some(block.check_range(data_start + i * DEFAULT_SECTOR_SIZE, DEFAULT_SECTOR_SIZE)?),
                fuzzy: None,
                timing: TimingSource::None,
                overlay: None,
            });
        }
        Ok(sectors)
    }
}
