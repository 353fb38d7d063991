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

    enums.rs

    Defines common enum types
*/
use crate::DEFAULT_TRACK_SIZE_BYTES;
use std::{
    fmt,
    fmt::{Display, Formatter},
};
use strum::IntoEnumIterator;

/// The tool that produced an STX image, from the header's imaging tool field.
#[repr(u16)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, strum::EnumIter)]
pub enum ImagingTool {
    Unknown,
    AtariTool = 0x01,
    DiscoveryCartridge = 0xCC,
}

impl From<u16> for ImagingTool {
    /// All undefined values will be mapped to Unknown.
    fn from(value: u16) -> ImagingTool {
        ImagingTool::iter()
            .find(|x| *x as u16 == value)
            .unwrap_or(ImagingTool::Unknown)
    }
}

impl Display for ImagingTool {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            ImagingTool::Unknown => write!(f, "Unknown"),
            ImagingTool::AtariTool => write!(f, "Atari imaging tool"),
            ImagingTool::DiscoveryCartridge => write!(f, "Discovery Cartridge"),
        }
    }
}

/// The density of a track, inferred from its length in bytes.
///
/// STX was designed for double density disks, but some conversion tools will happily produce
/// STX images of high density disks. A high density track holds about twice as many bytes as a
/// double density track, but still takes one revolution to read at 300RPM, so each byte takes
/// proportionally fewer cycles.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, strum::EnumIter)]
pub enum TrackDensity {
    #[default]
    Double,
    High,
    Extended,
}

impl TrackDensity {
    /// Guess the density of a track from its length in bytes. Mastering processes and drive
    /// speeds vary, so x1.5 and x3 of the standard length are used as the boundaries.
    pub fn from_track_length(bytes: usize) -> TrackDensity {
        if bytes > 3 * DEFAULT_TRACK_SIZE_BYTES {
            TrackDensity::Extended
        }
        else if bytes * 2 > 3 * DEFAULT_TRACK_SIZE_BYTES {
            TrackDensity::High
        }
        else {
            TrackDensity::Double
        }
    }

    /// Return the number of bytes this density fits in the space of one double density byte.
    pub fn factor(&self) -> u32 {
        match self {
            TrackDensity::Double => 1,
            TrackDensity::High => 2,
            TrackDensity::Extended => 4,
        }
    }
}

impl Display for TrackDensity {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            TrackDensity::Double => write!(f, "DD"),
            TrackDensity::High => write!(f, "HD"),
            TrackDensity::Extended => write!(f, "ED"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn imaging_tool_from_u16() {
        assert_eq!(ImagingTool::from(0x01), ImagingTool::AtariTool);
        assert_eq!(ImagingTool::from(0xCC), ImagingTool::DiscoveryCartridge);
        assert_eq!(ImagingTool::from(0x42), ImagingTool::Unknown);
    }

    #[test]
    fn density_boundaries() {
        assert_eq!(TrackDensity::from_track_length(6250), TrackDensity::Double);
        assert_eq!(TrackDensity::from_track_length(9375), TrackDensity::Double);
        assert_eq!(TrackDensity::from_track_length(9376), TrackDensity::High);
        assert_eq!(TrackDensity::from_track_length(12500), TrackDensity::High);
        assert_eq!(TrackDensity::from_track_length(18751), TrackDensity::Extended);
    }
}
