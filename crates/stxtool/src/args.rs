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
use bpaf::*;
use std::{fmt, path::PathBuf};

use crate::{
    dump::args::{dump_parser, DumpParams},
    info::args::{info_parser, InfoParams},
    overlay::args::{overlay_parser, OverlayParams},
};

#[derive(Clone, Debug)]
pub enum Command {
    Version,
    Dump(DumpParams),
    Info(InfoParams),
    Overlay(OverlayParams),
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Command::Version => write!(f, "version"),
            Command::Dump(_) => write!(f, "dump"),
            Command::Info(_) => write!(f, "info"),
            Command::Overlay(_) => write!(f, "overlay"),
        }
    }
}

#[derive(Debug)]
pub struct AppParams {
    pub global: GlobalOptions,
    pub command: Command,
}

#[derive(Debug)]
pub struct GlobalOptions {
    pub silent: bool,
}

pub fn global_options_parser() -> impl Parser<GlobalOptions> {
    let silent = long("silent")
        .help("Suppress all output except required output")
        .switch(); // Switch returns a bool, true if the flag is present

    construct!(GlobalOptions { silent })
}

pub(crate) fn in_file_parser() -> impl Parser<PathBuf> {
    long("in_file")
        .short('i')
        .argument::<PathBuf>("IN_FILE")
        .help("Path to input file")
}

pub(crate) fn command_parser() -> impl Parser<AppParams> {
    let global = global_options_parser();

    let version = pure(Command::Version)
        .to_options()
        .command("version")
        .help("Display version information and exit");

    let dump = construct!(Command::Dump(dump_parser()))
        .to_options()
        .command("dump")
        .help("Read the sectors or the whole contents of a track as the floppy controller would");
    let info = construct!(Command::Info(info_parser()))
        .to_options()
        .command("info")
        .help("Display the structure of an STX image");
    let overlay = construct!(Command::Overlay(overlay_parser()))
        .to_options()
        .command("overlay")
        .help("Display the contents of an image's .wd1772 overlay file");

    let command = construct!([version, dump, info, overlay]);

    construct!(AppParams { global, command })
}

pub(crate) fn track_parser() -> impl Parser<u8> {
    long("track")
        .short('t')
        .argument::<u8>("TRACK")
        .help("Specify the track number")
        .guard(|&track| track < 128, "Track must be between 0 and 127")
}

pub(crate) fn side_parser() -> impl Parser<u8> {
    long("side")
        .short('s')
        .argument::<u8>("SIDE")
        .help("Specify the side")
        .guard(|&side| side == 0 || side == 1, "Side must be either 0 or 1")
}
