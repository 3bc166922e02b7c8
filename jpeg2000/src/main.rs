mod print;

use clap::Parser;
use log::info;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::process;
use thiserror::Error;

use jp2::{encode_jp2, wrap_codestream, DecodeOptions, Document, JP2Error};
use jpc::Diagnostics;
use print::{CodestreamLevel, PrintOptions};

#[derive(Debug, Error)]
enum JP2000Error {
    #[error("error reading {path}: {error}")]
    Read { path: PathBuf, error: io::Error },

    #[error("error writing {path}: {error}")]
    Write { path: PathBuf, error: io::Error },

    #[error("error decoding {path}: {error}")]
    Decoding { path: PathBuf, error: JP2Error },

    #[error("error wrapping {path}: {error}")]
    Wrapping { path: PathBuf, error: JP2Error },

    #[error("invalid codestream level {level}, expected 0, 1 or 2")]
    CodestreamLevel { level: u8 },

    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Parser)]
#[clap(name = "jp2000", about = "Inspect JPEG 2000 files")]
struct Opts {
    #[clap(subcommand)]
    subcommand: SubCommand,
}

#[derive(Parser)]
enum SubCommand {
    /// Print the boxes of a .jp2/.jpx file or the marker segments of a raw
    /// codestream
    Dump(Dump),

    /// Wrap a raw codestream in a JP2 file
    Wrap(Wrap),
}

#[derive(Parser)]
struct Dump {
    /// Path to a .jp2, .jpx, .j2k or .j2c file
    path: PathBuf,

    /// Only print the box header lines
    #[clap(short, long)]
    short: bool,

    /// Do not print the contents of XML boxes
    #[clap(short = 'x', long = "noxml")]
    no_xml: bool,

    /// Codestream detail: 0 for none, 1 for the main header, 2 for every
    /// marker segment
    #[clap(short, long, default_value = "1")]
    codestream: u8,
}

#[derive(Parser)]
struct Wrap {
    /// Path to a raw codestream
    input: PathBuf,

    /// Path of the JP2 file to write
    output: PathBuf,
}

fn dump(c: Dump) -> Result<(), JP2000Error> {
    let level = CodestreamLevel::new(c.codestream)
        .ok_or(JP2000Error::CodestreamLevel { level: c.codestream })?;
    let options = PrintOptions {
        short: c.short,
        xml: !c.no_xml,
        codestream: level,
    };

    let file = File::open(&c.path).map_err(|error| JP2000Error::Read {
        path: c.path.clone(),
        error,
    })?;
    let mut reader = BufReader::new(file);

    // Tile-parts are only located when every marker segment is printed.
    let decode_options = DecodeOptions {
        header_only: level != CodestreamLevel::Full,
    };
    let mut diagnostics = Diagnostics::new();
    let document = Document::decode(&mut reader, &decode_options, &mut diagnostics).map_err(
        |error| JP2000Error::Decoding {
            path: c.path.clone(),
            error,
        },
    )?;

    let stdout = io::stdout();
    let mut writer = BufWriter::new(stdout.lock());
    print::document(&mut writer, &document, &options)?;
    print::warnings(&mut writer, diagnostics.warnings())?;
    writer.flush()?;
    Ok(())
}

fn wrap(c: Wrap) -> Result<(), JP2000Error> {
    let data = fs::read(&c.input).map_err(|error| JP2000Error::Read {
        path: c.input.clone(),
        error,
    })?;
    info!("Wrapping {} codestream bytes", data.len());

    let boxes = wrap_codestream(data).map_err(|error| JP2000Error::Wrapping {
        path: c.input.clone(),
        error,
    })?;

    let mut encoded = Vec::new();
    encode_jp2(&mut encoded, &boxes).map_err(|error| JP2000Error::Wrapping {
        path: c.input.clone(),
        error,
    })?;
    fs::write(&c.output, encoded).map_err(|error| JP2000Error::Write {
        path: c.output.clone(),
        error,
    })
}

fn run() -> Result<(), JP2000Error> {
    env_logger::init();

    let opts: Opts = Opts::parse();

    match opts.subcommand {
        SubCommand::Dump(c) => dump(c),
        SubCommand::Wrap(c) => wrap(c),
    }
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{}", error);
        process::exit(1);
    }
}
