//! This submodule implements the adapter for the newer, large-file export
//! generation, which lays channel groups out as named nested mappings: each
//! group is a list of per-channel records, each record a mapping from field
//! name to value.
//!
//! This generation's schema evolved over time, so decoding is lenient:
//! optional property fields are attempted and omitted on absence or decode
//! failure. Source resolution is also forgiving, in a bounded way: the full
//! modal model and the static-reduction-only model reside under different
//! file names, so opening tries a primary name and then exactly one
//! alternate before giving up.

use std::path::Path;

use log::warn;
use serde_json::{Map, Value};

use crate::errors::ConversionError;
use crate::raw::{Leniency, load_document};
use crate::source::*;

/// The file name the full modal model usually resides under.
pub const PRIMARY_SOURCE: &str = "modal_state_space_model_2ndOrder.rs.json";

/// The file name tried when the primary one cannot be read; holds the
/// static-reduction-only model.
pub const ALTERNATE_SOURCE: &str = "static_reduction_model.rs.json";

/// Adapter for the hierarchical encoding.
#[derive(Clone, Debug)]
pub struct TreeSource {
  /// The whole raw document, loaded up front.
  doc: Map<String, Value>
}

impl TreeSource {
  /// Loads a hierarchically-encoded source document, trying the primary
  /// path first and the alternate one on failure. A second failure is
  /// fatal and surfaces the alternate's load error.
  pub fn open(
    primary: &Path,
    alternate: &Path
  ) -> Result<Self, ConversionError> {
    let doc = match load_document(primary) {
      Ok(doc) => doc,
      Err(first) => {
        warn!("{}; trying {}", first, alternate.display());
        load_document(alternate)?
      }
    };
    return Self::from_value(doc);
  }

  /// Wraps an already-loaded raw document.
  pub fn from_value(doc: Value) -> Result<Self, ConversionError> {
    return match doc {
      Value::Object(doc) => Ok(Self { doc }),
      _ => Err(ConversionError::Malformed {
        context: "document root".to_string(),
        expected: "a mapping"
      })
    };
  }

  /// Borrows the group table for one channel kind.
  fn groups(
    &self,
    kind: ChannelKind
  ) -> Result<&Map<String, Value>, ConversionError> {
    let table = self.doc.get(kind.key()).and_then(defined).ok_or_else(|| {
      ConversionError::MandatoryFieldMissing {
        field: kind.key().to_string(),
        context: "document root".to_string()
      }
    })?;
    return table.as_object().ok_or(ConversionError::Malformed {
      context: kind.key().to_string(),
      expected: "a mapping of channel lists"
    });
  }

  /// Borrows one named group, i.e. one list of per-channel records.
  fn group(
    &self,
    kind: ChannelKind,
    name: &str
  ) -> Result<&Vec<Value>, ConversionError> {
    return self
      .groups(kind)?
      .get(name)
      .and_then(Value::as_array)
      .ok_or(ConversionError::Malformed {
        context: format!("{}/{}", kind.key(), name),
        expected: "a list of channel records"
      });
  }
}

impl ModelSource for TreeSource {
  const LENIENCY: Leniency = Leniency::Lenient;
  const GENERATION: SourceGeneration = SourceGeneration::Hierarchical;

  fn top_level(&self, key: &str) -> Option<&Value> {
    return self.doc.get(key).and_then(defined);
  }

  fn group_names(
    &self,
    kind: ChannelKind
  ) -> Result<Vec<String>, ConversionError> {
    return Ok(self.groups(kind)?.keys().cloned().collect());
  }

  fn entry_count(
    &self,
    kind: ChannelKind,
    group: &str
  ) -> Result<usize, ConversionError> {
    return Ok(self.group(kind, group)?.len());
  }

  fn entry_field(
    &self,
    kind: ChannelKind,
    group: &str,
    index: usize,
    field: &str
  ) -> Option<&Value> {
    return self
      .group(kind, group)
      .ok()?
      .get(index)
      .and_then(Value::as_object)?
      .get(field)
      .and_then(defined);
  }
}
