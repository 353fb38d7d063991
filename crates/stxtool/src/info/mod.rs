/*
    stxtool
    https://github.com/dbalsom/fluxfox

    Copyright 2024 Daniel Balsom

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
*/
pub mod args;

use crate::{args::GlobalOptions, load_drive};
use anyhow::Error;
use fluxfox_stx::{containers::gzip, timing, TrackDensity};

pub(crate) fn run(global: &GlobalOptions, params: &args::InfoParams) -> Result<(), Error> {
    let drive = load_drive(&params.in_file)?;
    let Some(image) = drive.image()
    else {
        anyhow::bail!("No image inserted");
    };

    if !global.silent {
        println!("Image: {}", params.in_file.display());
        println!("Imaging tool: {}", image.imaging_tool());
        let file_buf = std::fs::read(&params.in_file)?;
        if gzip::detect(&file_buf) {
            match gzip::filename(&file_buf) {
                Some(name) => println!("Compressed with gzip, stored as: {}", name),
                None => println!("Compressed with gzip"),
            }
        }
        println!("{}", "-".repeat(79));
    }
    image.dump_info(&mut std::io::stdout())?;
    println!();

    if params.timings {
        println!("Track timings:");
        println!("{}", "-".repeat(79));
        for track in image.tracks() {
            let len = timing::track_byte_length(Some(track));
            let density = TrackDensity::from_track_length(len);
            println!(
                "  {} length: {:5} bytes density: {} cycles/rev: {}",
                track.ch(),
                len,
                density,
                timing::cycles_per_revolution(len, density)
            );
        }
        println!();
    }

    let overlays = drive.overlays();
    if !overlays.is_empty() {
        println!(
            "Overlay file loaded: {} written sectors, {} written tracks",
            overlays.live_sector_count(),
            overlays.track_count()
        );
    }

    Ok(())
}
