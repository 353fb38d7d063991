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

    src/containers/mod.rs

    Container formats wrapping STX images. Only gzip is supported; images in
    other archives are expected to be extracted by the disk loader.
*/

#[cfg(feature = "gzip")]
pub mod gzip;

use crate::StxError;

/// The container an image buffer was found in.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ImageContainer {
    Raw,
    #[cfg(feature = "gzip")]
    Gzip,
}

/// Detect the container of an image buffer from its signature.
#[cfg(feature = "gzip")]
pub fn detect_container(buf: &[u8]) -> ImageContainer {
    if gzip::detect(buf) {
        ImageContainer::Gzip
    }
    else {
        ImageContainer::Raw
    }
}

#[cfg(not(feature = "gzip"))]
pub fn detect_container(_buf: &[u8]) -> ImageContainer {
    ImageContainer::Raw
}

/// Return the image contained in `buf`, decompressing it if required. Raw buffers are returned
/// as they are.
pub fn unwrap_container(buf: Vec<u8>) -> Result<Vec<u8>, StxError> {
    match detect_container(&buf) {
        ImageContainer::Raw => Ok(buf),
        #[cfg(feature = "gzip")]
        ImageContainer::Gzip => {
            log::debug!("unwrap_container(): Decompressing gzip container of {} bytes", buf.len());
            gzip::extract(&buf)
        }
    }
}
