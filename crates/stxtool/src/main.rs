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
pub mod dump;
pub mod info;
pub mod overlay;

use anyhow::{Context, Error};
use bpaf::Parser;
use fluxfox_stx::{StxDrive, StxImage};
use std::path::Path;

use crate::args::Command;
use args::command_parser;

fn main() -> Result<(), Error> {
    env_logger::init();

    let app_params = command_parser().run();

    let command_result = match &app_params.command {
        Command::Version => {
            println!("stxtool v{}", env!("CARGO_PKG_VERSION"));
            println!(
                "Supported image extensions: {}",
                fluxfox_stx::file_parsers::supported_extensions().join(", ")
            );
            let caps = fluxfox_stx::file_parsers::stx::StxFormat::capabilities();
            println!(
                "STX format capabilities: {}",
                caps.iter_names().map(|(name, _)| name).collect::<Vec<_>>().join(", ")
            );
            Ok(())
        }
        Command::Dump(params) => dump::run(&app_params.global, params),
        Command::Info(params) => info::run(&app_params.global, params),
        Command::Overlay(params) => overlay::run(&app_params.global, params),
    };

    match command_result {
        Ok(_) => Ok(()),
        Err(e) => {
            eprintln!("Command '{}' failed: {}", app_params.command, e);
            for cause in e.chain().skip(1) {
                eprintln!("Caused by: {}", cause);
            }
            std::process::exit(1);
        }
    }
}

pub(crate) fn load_image(path: &Path) -> Result<StxImage, Error> {
    StxImage::load_path(path).with_context(|| format!("Error loading STX image {}", path.display()))
}

/// Insert the image at `path` into a new drive, along with its overlay file if there is one.
pub(crate) fn load_drive(path: &Path) -> Result<StxDrive, Error> {
    let mut drive = StxDrive::new();
    drive
        .insert_path(path)
        .with_context(|| format!("Error loading STX image {}", path.display()))?;
    Ok(drive)
}
