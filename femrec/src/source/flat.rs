//! This submodule implements the adapter for the older export generation,
//! which lays channel groups out as named, fixed-size arrays-of-records:
//! each group record carries one array per field, indexed by channel.
//!
//! This generation is fully specified, so decoding is strict: every
//! expected field must exist, and a missing one means the export is
//! corrupt.

use std::path::Path;

use serde_json::{Map, Value};

use crate::channels::TYPES;
use crate::errors::ConversionError;
use crate::raw::{Leniency, load_document};
use crate::source::*;

/// Adapter for the flat array-of-records encoding.
#[derive(Clone, Debug)]
pub struct FlatSource {
  /// The whole raw document, loaded up front.
  doc: Map<String, Value>
}

impl FlatSource {
  /// Loads a flat-encoded source document from a file.
  pub fn open(path: &Path) -> Result<Self, ConversionError> {
    return Self::from_value(load_document(path)?);
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
      expected: "a mapping of channel group records"
    });
  }

  /// Borrows one named group record.
  fn group(
    &self,
    kind: ChannelKind,
    name: &str
  ) -> Result<&Map<String, Value>, ConversionError> {
    return self
      .groups(kind)?
      .get(name)
      .and_then(Value::as_object)
      .ok_or(ConversionError::Malformed {
        context: format!("{}/{}", kind.key(), name),
        expected: "a channel group record"
      });
  }
}

impl ModelSource for FlatSource {
  const LENIENCY: Leniency = Leniency::Strict;
  const GENERATION: SourceGeneration = SourceGeneration::FlatArrays;

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
    // the record is fixed-size, so any per-channel array gives the extent;
    // the type tags are as good as any
    let types = self.group(kind, group)?.get(TYPES).and_then(defined);
    return match types.and_then(Value::as_array) {
      Some(arr) => Ok(arr.len()),
      None => Err(ConversionError::MandatoryFieldMissing {
        field: TYPES.to_string(),
        context: format!("{}/{}", kind.key(), group)
      })
    };
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
      .get(field)
      .and_then(Value::as_array)?
      .get(index)
      .and_then(defined);
  }
}
