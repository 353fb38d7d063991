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

    flags.rs

    Defines common bitflags
*/

use bitflags::bitflags;

bitflags! {
    /// Bit flags found in the flags field of an STX track record.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    #[rustfmt::skip]
    pub struct TrackFlags: u16 {
        #[doc = "Track record contains sector blocks. If clear, the track holds only raw 512 byte sectors"]
        const SECTOR_BLOCK      = 0b0000_0000_0000_0001;
        #[doc = "Track record contains a track image, as returned by the 'read track' command"]
        const TRACK_IMAGE       = 0b0000_0000_0100_0000;
        #[doc = "The track image is preceded by a sync position"]
        const TRACK_IMAGE_SYNC  = 0b0000_0000_1000_0000;
    }
}

bitflags! {
    /// Bit flags found in the FDC status field of an STX sector record.
    /// Bits 3, 4 and 5 have the same meaning as the corresponding bits of the WD1772 status
    /// register.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    #[rustfmt::skip]
    pub struct SectorStatus: u8 {
        #[doc = "Sector has variable bit width, described by a timing table"]
        const VARIABLE_TIME     = 0b0000_0001;
        #[doc = "Sector has a CRC error. With RECORD_NOT_FOUND, the error is in the ID field"]
        const CRC_ERROR         = 0b0000_1000;
        #[doc = "Sector has no data field"]
        const RECORD_NOT_FOUND  = 0b0001_0000;
        #[doc = "Sector uses a deleted data address mark"]
        const RECORD_TYPE       = 0b0010_0000;
        #[doc = "Sector contains fuzzy bits"]
        const FUZZY             = 0b1000_0000;
    }
}

impl SectorStatus {
    /// Return true if the ID field of this sector has a bad CRC. STX marks this with both RNF and
    /// CRC set; a CRC flag without RNF refers to the data field.
    #[inline]
    pub fn id_crc_error(&self) -> bool {
        self.contains(SectorStatus::RECORD_NOT_FOUND | SectorStatus::CRC_ERROR)
    }

    #[inline]
    pub fn has_data(&self) -> bool {
        !self.contains(SectorStatus::RECORD_NOT_FOUND)
    }
}

bitflags! {
    /// Status bits returned to the controller, laid out as in the WD1772 status register.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    #[rustfmt::skip]
    pub struct FdcStatus: u8 {
        const LOST_DATA         = 0b0000_0100;
        const CRC_ERROR         = 0b0000_1000;
        const RECORD_NOT_FOUND  = 0b0001_0000;
        const RECORD_TYPE       = 0b0010_0000;
    }
}

impl FdcStatus {
    /// Return true if the operation completed without any error condition.
    /// RECORD_TYPE is informational and does not count as an error.
    #[inline]
    pub fn is_ok(&self) -> bool {
        !self.intersects(FdcStatus::LOST_DATA | FdcStatus::CRC_ERROR | FdcStatus::RECORD_NOT_FOUND)
    }
}

impl From<SectorStatus> for FdcStatus {
    /// Only the CRC and record type bits of a sector's status are reported after a read.
    fn from(status: SectorStatus) -> Self {
        FdcStatus::from_bits_truncate(status.bits() & (SectorStatus::CRC_ERROR | SectorStatus::RECORD_TYPE).bits())
    }
}
