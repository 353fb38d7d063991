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

    src/util.rs

    Miscellaneous helpers shared across the crate.
*/

/// Calculate a CRC-16/IBM-3740 (CCITT polynomial 0x1021, preset 0xFFFF) over `data`.
/// Pass the result of a previous call as `start` to continue a running CRC.
pub fn crc_ibm_3740(data: &[u8], start: Option<u16>) -> u16 {
    let mut crc = start.unwrap_or(0xFFFF);
    for &byte in data {
        crc = crc_ibm_3740_byte(crc, byte);
    }
    crc
}

/// Feed a single byte into a running CRC-16/IBM-3740.
#[inline]
pub fn crc_ibm_3740_byte(crc: u16, byte: u8) -> u16 {
    let mut crc = crc ^ ((byte as u16) << 8);
    for _ in 0..8 {
        if crc & 0x8000 != 0 {
            crc = (crc << 1) ^ 0x1021;
        }
        else {
            crc <<= 1;
        }
    }
    crc
}

/// Return true if `path` ends with `suffix`, ignoring ASCII case.
pub(crate) fn ends_with_ignore_case(path: &str, suffix: &str) -> bool {
    path.len() >= suffix.len()
        && path.is_char_boundary(path.len() - suffix.len())
        && path[path.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
}

/// Fill a vector with `len` random bytes.
pub(crate) fn random_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|_| rand::random::<u8>()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crc_check_value() {
        assert_eq!(crc_ibm_3740(b"123456789", None), 0x29B1);
    }

    #[test]
    fn crc_can_be_continued() {
        let whole = crc_ibm_3740(b"123456789", None);
        let first = crc_ibm_3740(b"1234", None);
        assert_eq!(crc_ibm_3740(b"56789", Some(first)), whole);
    }

    #[test]
    fn suffix_match() {
        assert!(ends_with_ignore_case("GAME.STX", ".stx"));
        assert!(ends_with_ignore_case("game.Stx.GZ", ".stx.gz"));
        assert!(!ends_with_ignore_case("stx", ".stx"));
    }
}
