//! A command-line application to convert a raw FEM descriptor dump into
//! the canonical model record consumed by the simulation software.

#![allow(clippy::needless_return)]
#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use femrec::prelude::*;
use log::*;

/// The two raw source encodings we know how to read.
#[derive(Copy, Clone, Debug, ValueEnum)]
enum SourceFormat {
  /// Older generation: channel groups as flat arrays-of-records.
  Flat,
  /// Newer, large-file generation: channel groups as nested mappings.
  Nested
}

/// The arguments passed to the converter.
#[derive(Clone, Debug, Parser)]
#[command(author, version, about)]
struct Cli {
  /// Source encoding of the raw document.
  #[arg(short = 'f', long = "format", value_enum)]
  format: SourceFormat,
  /// Alternate file tried when the primary one cannot be read. Only
  /// meaningful for the nested encoding; defaults to the well-known
  /// static-reduction artifact name next to the input.
  #[arg(short = 'a', long = "alternate")]
  alternate: Option<PathBuf>,
  /// Directory the canonical record is written into.
  #[arg(short = 'o', long = "output-dir", default_value = ".")]
  output_dir: PathBuf,
  /// Output extra/debug info while converting.
  #[arg(short = 'v', long = "verbose")]
  verbose: bool,
  /// The raw source document.
  input: PathBuf
}

/// Loads the source, runs the pipeline, writes the record.
fn run(args: &Cli) -> Result<PathBuf, ConversionError> {
  let (model, generation) = match args.format {
    SourceFormat::Flat => {
      let source = FlatSource::open(&args.input)?;
      (convert(&source)?, FlatSource::GENERATION)
    },
    SourceFormat::Nested => {
      let alternate = args
        .alternate
        .clone()
        .unwrap_or_else(|| args.input.with_file_name(ALTERNATE_SOURCE));
      let source = TreeSource::open(&args.input, &alternate)?;
      (convert(&source)?, TreeSource::GENERATION)
    }
  };
  return write_model(&model, generation, &args.output_dir);
}

fn main() -> ExitCode {
  // init cli stuff
  let args = Cli::parse();
  let log_level = if args.verbose {
    LevelFilter::Debug
  } else {
    LevelFilter::Info
  };
  env_logger::builder().filter_level(log_level).init();
  return match run(&args) {
    Ok(path) => {
      info!("All done, record at {}.", path.display());
      ExitCode::SUCCESS
    },
    Err(ConversionError::UnsupportedVariant) => {
      // a diagnostic, not a crash: the document is readable, it just
      // matches neither known model shape
      warn!("Source matches neither known model shape; no output written.");
      ExitCode::from(2)
    },
    Err(e) => {
      error!("{}", e);
      ExitCode::FAILURE
    }
  };
}
