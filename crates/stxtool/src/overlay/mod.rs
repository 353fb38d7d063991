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

use crate::{args::GlobalOptions, load_image};
use anyhow::{bail, Context, Error};
use fluxfox_stx::persistence::{read_sidecar, sidecar_path};

pub(crate) fn run(global: &GlobalOptions, params: &args::OverlayParams) -> Result<(), Error> {
    let Some(overlay_path) = sidecar_path(&params.in_file)
    else {
        bail!("{} is not an .stx or .stx.gz file", params.in_file.display());
    };

    let buf = std::fs::read(&overlay_path).with_context(|| format!("Error reading {}", overlay_path.display()))?;
    let store = read_sidecar(&buf).with_context(|| format!("Error parsing {}", overlay_path.display()))?;

    if !global.silent {
        println!("Overlay file: {}", overlay_path.display());
        println!("{}", "-".repeat(79));
    }

    println!("{} written sectors:", store.live_sector_count());
    for sector in store.live_sectors() {
        println!(
            "  {} bit_position={:5} id={} size={}",
            sector.ch,
            sector.bit_position,
            sector.id,
            sector.data.len()
        );
    }

    println!("{} written tracks:", store.track_count());
    for track in store.tracks() {
        println!(
            "  {} written={} interpreted={}",
            track.ch,
            track.written.len(),
            track.interpreted.len()
        );
    }

    if params.check {
        let mut image = load_image(&params.in_file)?;
        store.associate(&mut image).context("Overlay file doesn't match image")?;
        println!("All overlay entries match the image.");
    }

    Ok(())
}
