//! Dumps summary information on a canonical FEM model record: variant,
//! channel groups and counts, and the modal content if any.

#![allow(clippy::needless_return)]
#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use femrec::prelude::*;
use itertools::Itertools;
use log::{LevelFilter, error, info};

/// The arguments passed to the inspector.
#[derive(Parser)]
#[command(author, version)]
struct Cli {
  /// Output extra/debug info while loading.
  #[arg(short, long)]
  verbose: bool,
  /// Path to a canonical model record.
  file: PathBuf
}

/// One indentation step for listings.
const INDENT: &str = "  ";

/// Describes one side of the model.
fn describe_side(label: &str, groups: &[ChannelGroup]) {
  if groups.is_empty() {
    info!("No {} groups.", label);
    return;
  }
  info!("{} {} groups:", groups.len(), label);
  for group in groups {
    let tags = group
      .channels
      .iter()
      .map(|c| c.type_tag.as_str())
      .unique()
      .join(", ");
    info!(
      "{}- \"{}\": {} channels (tags: {})",
      INDENT,
      group.name,
      group.len(),
      tags
    );
  }
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
  // load the record
  let model = match CanonicalModel::from_file(&args.file) {
    Ok(model) => model,
    Err(e) => {
      error!("{}", e);
      return ExitCode::FAILURE;
    }
  };
  info!("Model: {}", model.model_description);
  info!("Variant: {}", model.variant());
  describe_side("input", &model.inputs);
  describe_side("output", &model.outputs);
  match model.variant() {
    ModelVariant::Modal => {
      info!("Modes: {}", model.n_modes());
      let mut freqs = model.eigenfrequencies.clone();
      freqs.sort_by(|a, b| a.total_cmp(b));
      if let (Some(lo), Some(hi)) = (freqs.first(), freqs.last()) {
        info!("Eigenfrequency range: {:.3} Hz to {:.3} Hz", lo, hi);
      }
      info!(
        "Coupling matrices: {} (in), {} (out); {} damping coefficients.",
        model.inputs_to_modal_force.len(),
        model.modal_displacement_to_outputs.len(),
        model.proportional_damping_vector.len()
      );
    },
    ModelVariant::StaticReduction => {
      info!("Gain matrix: {} values.", model.gain_matrix.len());
    }
  };
  return ExitCode::SUCCESS;
}
