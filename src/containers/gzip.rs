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

    src/containers/gzip.rs

    Decompression of gzipped (.stx.gz) images.
*/

use crate::StxError;
use flate2::read::GzDecoder;
use std::io::Read;

// Only support deflate-based gzips
const GZIP_SIGNATURE: &[u8; 3] = b"\x1F\x8B\x08";
const MAX_FILE_SIZE: u64 = 100_000_000;

/// Return true if the buffer starts with a gzip signature.
pub fn detect(buf: &[u8]) -> bool {
    buf.starts_with(GZIP_SIGNATURE)
}

/// Return the name of the file stored in the gzip header, if present.
pub fn filename(buf: &[u8]) -> Option<String> {
    let decoder = GzDecoder::new(buf);
    let name = decoder.header()?.filename()?;
    String::from_utf8(name.to_vec()).ok()
}

/// Decompress a gzip buffer, returning its contents.
pub fn extract(buf: &[u8]) -> Result<Vec<u8>, StxError> {
    let decoder = GzDecoder::new(buf);
    if let Some(header) = decoder.header() {
        log::debug!("gzip::extract(): GZIP header: {:?}", header);
    }

    // Read one byte more than the limit, so an oversized file is detected without reading it all
    let mut decompressed_data = Vec::new();
    decoder
        .take(MAX_FILE_SIZE + 1)
        .read_to_end(&mut decompressed_data)
        .map_err(|e| StxError::IoError(e.to_string()))?;

    // Sanity check on the decompressed data size
    if decompressed_data.len() as u64 > MAX_FILE_SIZE {
        return Err(StxError::IoError("Decompressed file too large".to_string()));
    }

    Ok(decompressed_data)
}
