//! This module implements the canonical model record, the variant
//! classifier that assembles it from a raw source, and the one-call
//! conversion pipeline.

use std::fmt::Display;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use log::{debug, info};
use serde::{Serialize, Deserialize};

use crate::channels::{ChannelGroup, normalize_side};
use crate::errors::ConversionError;
use crate::raw::{decode_text, flatten_numbers};
use crate::source::{ChannelKind, ModelSource};

/// Top-level source key of the model description (byte-encoded text).
pub const MODEL_DESCRIPTION: &str = "modelDescription";

/// Top-level source key of the eigenfrequencies.
pub const EIGENFREQUENCIES: &str = "eigenfrequencies";

/// Top-level source key of the inputs-to-modal-forces matrix.
pub const INPUTS_2_MODAL_F: &str = "inputs2ModalF";

/// Top-level source key of the modal-displacements-to-outputs matrix.
pub const MODAL_DISP_2_OUTPUTS: &str = "modalDisp2Outputs";

/// Top-level source key of the proportional damping coefficients.
pub const PROPORTIONAL_DAMPING_VEC: &str = "proportionalDampingVec";

/// Top-level source key of the static gain matrix.
pub const GAIN_MATRIX: &str = "gainMatrix";

/// The four top-level keys that, together, signal the modal variant.
pub const MODAL_KEYS: [&str; 4] = [
  EIGENFREQUENCIES,
  INPUTS_2_MODAL_F,
  MODAL_DISP_2_OUTPUTS,
  PROPORTIONAL_DAMPING_VEC
];

/// Which payload a canonical model carries.
#[derive(
  Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord
)]
pub enum ModelVariant {
  /// Eigenfrequencies and modal coupling matrices, for building a reduced
  /// dynamical system.
  Modal,
  /// A static input-to-output gain matrix, no dynamics.
  StaticReduction
}

impl ModelVariant {
  /// Returns a readable name for the variant.
  pub const fn desc(&self) -> &'static str {
    return match self {
      Self::Modal => "modal state-space",
      Self::StaticReduction => "static reduction"
    };
  }
}

impl Display for ModelVariant {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    return write!(f, "{}", self.desc());
  }
}

/// The canonical model record: the output of a whole conversion run. Both
/// variant payloads are always present so the schema stays uniform;
/// exactly one is non-empty, and that is the variant discriminant.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CanonicalModel {
  /// Free-text description of the exported model.
  #[serde(rename = "modelDescription")]
  pub model_description: String,
  /// The excitation channel groups, in source order.
  pub inputs: Vec<ChannelGroup>,
  /// The measurement channel groups, in source order.
  pub outputs: Vec<ChannelGroup>,
  /// Mode shape eigenfrequencies [Hz]; modal variant only.
  pub eigenfrequencies: Vec<f64>,
  /// Input forces to modal forces matrix, row-wise; modal variant only.
  #[serde(rename = "inputsToModalForce")]
  pub inputs_to_modal_force: Vec<f64>,
  /// Modal displacements to output nodes matrix, row-wise; modal variant
  /// only.
  #[serde(rename = "modalDisplacementToOutputs")]
  pub modal_displacement_to_outputs: Vec<f64>,
  /// Mode shape damping coefficients; modal variant only.
  #[serde(rename = "proportionalDampingVector")]
  pub proportional_damping_vector: Vec<f64>,
  /// Static input-to-output gain matrix; static-reduction variant only.
  #[serde(rename = "gainMatrix")]
  pub gain_matrix: Vec<f64>
}

impl CanonicalModel {
  /// Returns the variant this model carries, off the payload discriminant.
  pub fn variant(&self) -> ModelVariant {
    return if self.gain_matrix.is_empty() {
      ModelVariant::Modal
    } else {
      ModelVariant::StaticReduction
    };
  }

  /// Returns the number of modes.
  pub fn n_modes(&self) -> usize {
    return self.eigenfrequencies.len();
  }

  /// Returns the total number of input channels across all groups.
  pub fn n_inputs(&self) -> usize {
    return self.inputs.iter().map(ChannelGroup::len).sum();
  }

  /// Returns the total number of output channels across all groups.
  pub fn n_outputs(&self) -> usize {
    return self.outputs.iter().map(ChannelGroup::len).sum();
  }

  /// Converts the eigenfrequencies from Hz to radians per second.
  pub fn eigen_frequencies_to_radians(&self) -> Vec<f64> {
    return self
      .eigenfrequencies
      .iter()
      .map(|x| 2.0 * std::f64::consts::PI * x)
      .collect();
  }

  /// Reads a canonical record back from a file.
  pub fn from_file(path: &Path) -> Result<Self, ConversionError> {
    let wrap = |e: Box<dyn std::error::Error + Send + Sync>| {
      ConversionError::SourceLoad { path: path.to_path_buf(), source: e }
    };
    let file = File::open(path).map_err(|e| wrap(Box::new(e)))?;
    return serde_json::from_reader(BufReader::new(file))
      .map_err(|e| wrap(Box::new(e)));
  }
}

/// Inspects the raw top-level keys to decide the model variant and
/// assembles the canonical record around the normalized channel groups.
/// If all four modal keys are present the modal payload is populated; else
/// a gain matrix alone means the static-reduction variant; else the source
/// matches no known model shape and no record is produced.
pub fn classify<S: ModelSource>(
  source: &S,
  inputs: Vec<ChannelGroup>,
  outputs: Vec<ChannelGroup>
) -> Result<CanonicalModel, ConversionError> {
  let context = "document root";
  let model_description = match source.top_level(MODEL_DESCRIPTION) {
    Some(v) => decode_text(v, S::LENIENCY, MODEL_DESCRIPTION, context)?,
    None => {
      return Err(ConversionError::MandatoryFieldMissing {
        field: MODEL_DESCRIPTION.to_string(),
        context: context.to_string()
      })
    }
  };
  let mut model = CanonicalModel {
    model_description,
    inputs,
    outputs,
    eigenfrequencies: Vec::new(),
    inputs_to_modal_force: Vec::new(),
    modal_displacement_to_outputs: Vec::new(),
    proportional_damping_vector: Vec::new(),
    gain_matrix: Vec::new()
  };
  if MODAL_KEYS.iter().all(|key| source.top_level(key).is_some()) {
    debug!("All modal keys present; this is a modal state-space model.");
    let grab = |key: &str| match source.top_level(key) {
      Some(v) => flatten_numbers(v, key, context),
      None => Err(ConversionError::MandatoryFieldMissing {
        field: key.to_string(),
        context: context.to_string()
      })
    };
    model.eigenfrequencies = grab(EIGENFREQUENCIES)?;
    model.inputs_to_modal_force = grab(INPUTS_2_MODAL_F)?;
    model.modal_displacement_to_outputs = grab(MODAL_DISP_2_OUTPUTS)?;
    model.proportional_damping_vector = grab(PROPORTIONAL_DAMPING_VEC)?;
  } else if let Some(gain) = source.top_level(GAIN_MATRIX) {
    debug!("Gain matrix present; this is a static reduction model.");
    model.gain_matrix = flatten_numbers(gain, GAIN_MATRIX, context)?;
  } else {
    return Err(ConversionError::UnsupportedVariant);
  }
  return Ok(model);
}

/// Runs the whole pipeline over one raw source: normalizes both channel
/// sides, then classifies and assembles the canonical record.
pub fn convert<S: ModelSource>(
  source: &S
) -> Result<CanonicalModel, ConversionError> {
  let inputs = normalize_side(source, ChannelKind::Input)?;
  let outputs = normalize_side(source, ChannelKind::Output)?;
  let model = classify(source, inputs, outputs)?;
  info!(
    "Normalized a {} model: {} input and {} output channels.",
    model.variant(),
    model.n_inputs(),
    model.n_outputs()
  );
  return Ok(model);
}
