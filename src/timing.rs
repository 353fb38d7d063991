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

    src/timing.rs

    The rotational timing model.

    All delays are expressed in FDC cycles at 8MHz. At the double density data
    rate of 250kbps one data bit takes 4us or 32 cycles, so a full byte takes
    32us or 256 cycles.
*/

use crate::{image::StxTrack, types::TrackDensity, DEFAULT_TRACK_SIZE_BYTES};

/// FDC cycles per MFM data bit at double density.
pub const FDC_DELAY_CYCLE_MFM_BIT: u32 = 32;
/// FDC cycles per MFM data byte at double density.
pub const FDC_DELAY_CYCLE_MFM_BYTE: u32 = 8 * FDC_DELAY_CYCLE_MFM_BIT;
/// FDC clock cycles per microsecond.
pub const FDC_CYCLES_PER_US: u32 = 8;
/// Standard time to read one byte, in microseconds.
pub const FDC_STANDARD_BYTE_US: u32 = 32;
/// One revolution at 300RPM.
pub const FDC_CYCLES_PER_REVOLUTION: u32 = 8_000_000 / 5;
/// Sector bit positions point just after the IDAM. The ID field starts 4 bytes earlier at the
/// first $A1 sync byte.
pub const ID_FIELD_LOOKBACK_CYCLES: u32 = 4 * FDC_DELAY_CYCLE_MFM_BYTE;

/// Number of data bytes covered by one entry of a sector timing table.
pub const TIMING_BLOCK_BYTES: usize = 16;
const TIMING_UNIT_CYCLES: u32 = 32;
const TIMING_BLOCK_EXTRA_CYCLES: u32 = 28;

/// Return the length in bytes of a track, or the length of a standard track if the track does
/// not exist in the image.
pub fn track_byte_length(track: Option<&StxTrack>) -> usize {
    match track {
        Some(track) => track.byte_length(),
        None => DEFAULT_TRACK_SIZE_BYTES,
    }
}

/// Return the number of FDC cycles for one revolution of a track of `byte_length` bytes.
/// High density tracks hold more bytes in the same time, so the density factor divides the
/// result.
pub fn cycles_per_revolution(byte_length: usize, density: TrackDensity) -> u32 {
    (byte_length as u64 * FDC_DELAY_CYCLE_MFM_BYTE as u64 / density.factor() as u64) as u32
}

/// Convert an entry of a sector timing table into the FDC cycles needed to read its 16 bytes.
#[inline]
pub fn timing_block_cycles(units: u16) -> u32 {
    units as u32 * TIMING_UNIT_CYCLES + TIMING_BLOCK_EXTRA_CYCLES
}

/// Distributes a total number of cycles over a number of bytes, emitting whole cycle counts
/// whose running sum never drifts more than half a cycle from the exact running total.
///
/// For byte k of n, the timing is `round(total * (k + 1) / n - emitted)`, with ties rounded to
/// even.
#[derive(Clone, Debug)]
pub struct ByteTimer {
    total:   f64,
    count:   usize,
    index:   usize,
    emitted: f64,
    clamped: bool,
}

impl ByteTimer {
    pub fn new(total_cycles: u32, count: usize) -> Self {
        Self {
            total: total_cycles as f64,
            count,
            index: 0,
            emitted: 0.0,
            clamped: false,
        }
    }
}

impl Iterator for ByteTimer {
    type Item = u16;

    fn next(&mut self) -> Option<u16> {
        if self.index >= self.count {
            return None;
        }
        self.index += 1;
        let target = self.total * self.index as f64 / self.count as f64;
        let timing = (target - self.emitted).round_ties_even();
        self.emitted += timing;

        // A byte timing must fit the buffer's u16. Only a corrupt timing table gets this far.
        match u16::try_from(timing as u64) {
            Ok(cycles) => Some(cycles),
            Err(_) => {
                if !self.clamped {
                    log::warn!(
                        "ByteTimer: {} cycles over {} bytes gives a byte timing of {} cycles, clamping to {}",
                        self.total,
                        self.count,
                        timing,
                        u16::MAX
                    );
                    self.clamped = true;
                }
                Some(u16::MAX)
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.count - self.index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ByteTimer {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_timer_sums_to_total() {
        for (total, count) in [(4096u32, 512usize), (1_600_000, 6250), (1_600_000, 6253), (3000, 7)] {
            let timings: Vec<u16> = ByteTimer::new(total, count).collect();
            assert_eq!(timings.len(), count);
            assert_eq!(timings.iter().map(|&t| t as u32).sum::<u32>(), total);
        }
    }

    #[test]
    fn byte_timer_does_not_drift() {
        let total = 1_600_000u32;
        let count = 6271usize;
        let mut running = 0.0f64;
        for (k, t) in ByteTimer::new(total, count).enumerate() {
            running += t as f64;
            let ideal = total as f64 * (k + 1) as f64 / count as f64;
            assert!((running - ideal).abs() <= 0.5 + f64::EPSILON);
        }
    }

    #[test]
    fn byte_timer_clamps_oversized_timings() {
        // A full scale table entry spreads over 16 bytes at more than u16::MAX cycles each.
        let timings: Vec<u16> = ByteTimer::new(timing_block_cycles(u16::MAX), 16).collect();
        assert_eq!(timings, vec![u16::MAX; 16]);

        let timings: Vec<u16> = ByteTimer::new(70_000, 2).collect();
        assert_eq!(timings, vec![35_000, 35_000]);
    }

    #[test]
    fn byte_timer_rounds_half_to_even() {
        let timings: Vec<u16> = ByteTimer::new(timing_block_cycles(0x7f), 16).collect();
        assert_eq!(timings.iter().map(|&t| t as u32).sum::<u32>(), 0x7f * 32 + 28);
        // 5 cycles over 2 bytes: 2.5 rounds to 2, then 3.
        let timings: Vec<u16> = ByteTimer::new(5, 2).collect();
        assert_eq!(timings, vec![2, 3]);
    }

    #[test]
    fn revolution_cycles() {
        assert_eq!(cycles_per_revolution(6250, TrackDensity::Double), 1_600_000);
        assert_eq!(cycles_per_revolution(12500, TrackDensity::High), 1_600_000);
        assert_eq!(track_byte_length(None), DEFAULT_TRACK_SIZE_BYTES);
    }
}
