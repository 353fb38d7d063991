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
pub(crate) mod args;

use anyhow::{bail, Error};
use std::io::{BufWriter, Write};

use crate::{args::GlobalOptions, load_drive};
use fluxfox_stx::{FdcBuffer, RotationContext};

fn dump_rows<W: Write>(out: &mut W, bytes: &[u8], row_size: usize) -> std::io::Result<()> {
    for (row, chunk) in bytes.chunks(row_size).enumerate() {
        write!(out, "{:05X} |", row * row_size)?;
        for byte in chunk {
            write!(out, " {:02X}", byte)?;
        }
        for _ in chunk.len()..row_size {
            write!(out, "   ")?;
        }
        write!(out, " | ")?;
        for &byte in chunk {
            if byte.is_ascii_graphic() {
                write!(out, "{}", byte as char)?;
            }
            else {
                write!(out, ".")?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

pub(crate) fn run(global: &GlobalOptions, params: &args::DumpParams) -> Result<(), Error> {
    let row_size = params.row_size.unwrap_or(16) as usize;
    let mut drive = load_drive(&params.in_file)?;
    let mut out = BufWriter::new(std::io::stdout());

    if params.raw {
        let mut buf = FdcBuffer::new();
        drive.read_track(params.track, params.side, &mut buf);
        if !global.silent {
            writeln!(
                out,
                "Track {} side {}: {} bytes, {} cycles",
                params.track,
                params.side,
                buf.len(),
                buf.total_cycles()
            )?;
        }
        dump_rows(&mut out, &buf.values(), row_size)?;
        return Ok(());
    }

    let sector_count = drive
        .image()
        .and_then(|image| image.track(fluxfox_stx::DiskCh::new(params.track, params.side)))
        .map(|track| track.sectors().len())
        .unwrap_or(0);
    if sector_count == 0 {
        bail!("Track {} side {} has no sectors", params.track, params.side);
    }

    // Visit each ID field once by following the disk around a single revolution.
    let revolution = drive.cycles_per_revolution(params.track, params.side).max(1);
    let mut position = 0u32;
    for _ in 0..sector_count {
        let Some(delay) = drive.locate_next_sector_id(&RotationContext::at(position), params.track, params.side)
        else {
            bail!("No ID field found on track {} side {}", params.track, params.side);
        };
        position = (position + delay) % revolution;

        let mut id_buf = FdcBuffer::new();
        let id_status = drive.read_address_field(params.track, params.side, &mut id_buf);
        let mut buf = FdcBuffer::new();
        let status = drive.read_sector(params.track, params.side, &mut buf);

        let Some(located) = drive.located()
        else {
            bail!("Drive lost the located sector");
        };
        writeln!(
            out,
            "Sector {} at cycle {}: id {} {:02X?} id status {:?} read status {:?} {} bytes",
            located.index,
            position,
            located.id,
            id_buf.values(),
            id_status,
            status,
            buf.len()
        )?;
        dump_rows(&mut out, &buf.values(), row_size)?;
    }
    out.flush()?;

    Ok(())
}
