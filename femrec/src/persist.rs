//! This module implements the canonical serializer: a pure side-effecting
//! sink that writes a finished model record into a store directory, keyed
//! by its variant and the export generation it came from.

use std::path::{Path, PathBuf};

use log::info;

use crate::errors::ConversionError;
use crate::model::{CanonicalModel, ModelVariant};
use crate::source::SourceGeneration;

/// Returns the store identifier for a variant and export generation. These
/// match the artifact names the downstream simulation software looks for.
pub const fn artifact_key(
  variant: ModelVariant,
  generation: SourceGeneration
) -> &'static str {
  return match (variant, generation) {
    (ModelVariant::Modal, SourceGeneration::FlatArrays) => {
      "modal_state_space_model_2ndOrder"
    },
    (ModelVariant::Modal, SourceGeneration::Hierarchical) => {
      "modal_state_space_model_2ndOrder.73"
    },
    (ModelVariant::StaticReduction, SourceGeneration::FlatArrays) => {
      "static_reduction_model"
    },
    (ModelVariant::StaticReduction, SourceGeneration::Hierarchical) => {
      "static_reduction_model.73"
    }
  };
}

/// Writes a canonical model record into the store directory, under its
/// variant-and-generation identifier. Returns the path written. The record
/// is serialized fully in memory first, so a failed run never leaves a
/// partial file behind.
pub fn write_model(
  model: &CanonicalModel,
  generation: SourceGeneration,
  store: &Path
) -> Result<PathBuf, ConversionError> {
  let key = artifact_key(model.variant(), generation);
  let path = store.join(format!("{}.json", key));
  let wrap_io = |path: &Path, e: std::io::Error| ConversionError::Persist {
    path: path.to_path_buf(),
    source: e
  };
  let bytes = serde_json::to_vec(model).map_err(|e| {
    wrap_io(&path, std::io::Error::new(std::io::ErrorKind::InvalidData, e))
  })?;
  std::fs::write(&path, &bytes).map_err(|e| wrap_io(&path, e))?;
  info!(
    "Wrote {} model record to {} ({} bytes).",
    model.variant(),
    path.display(),
    bytes.len()
  );
  return Ok(path);
}
