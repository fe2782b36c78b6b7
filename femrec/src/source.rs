//! This module implements the capability trait the extraction engine needs
//! from a raw model source, and hosts the two adapters that implement it:
//! one per on-disk encoding generation.

pub mod flat;
pub mod tree;

use std::fmt::Display;

use serde::{Serialize, Deserialize};
use serde_json::Value;

use crate::errors::ConversionError;
use crate::raw::Leniency;

/// Which side of the model a channel group belongs to.
#[derive(
  Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord
)]
pub enum ChannelKind {
  /// An excitation channel, e.g. a force applied at an interface.
  Input,
  /// A measurement channel, e.g. a displacement picked off a node.
  Output
}

impl ChannelKind {
  /// Returns both channel kinds.
  pub const fn all() -> &'static [Self] {
    return &[Self::Input, Self::Output];
  }

  /// Returns the top-level source key the groups of this kind live under.
  pub const fn key(&self) -> &'static str {
    return match self {
      Self::Input => "fem_inputs",
      Self::Output => "fem_outputs"
    };
  }

  /// Returns true for the input side.
  pub const fn is_input(&self) -> bool {
    return matches!(self, Self::Input);
  }
}

impl Display for ChannelKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    return write!(f, "{}", self.key());
  }
}

/// The export generation a source document was produced by. The canonical
/// record is identical either way; this only picks the artifact identifier
/// the serializer writes under.
#[derive(
  Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord
)]
pub enum SourceGeneration {
  /// The older generation: channel groups as flat arrays-of-records.
  FlatArrays,
  /// The newer, large-file generation: channel groups as nested mappings.
  Hierarchical
}

impl Display for SourceGeneration {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    return write!(f, "{}", match self {
      Self::FlatArrays => "flat array-of-records",
      Self::Hierarchical => "hierarchical"
    });
  }
}

/// The capability set the extraction engine needs from a raw source: group
/// names, per-group entry counts, per-entry field access, and a presence
/// check. Each encoding supplies one implementation; everything downstream
/// of the adapters is shared.
pub trait ModelSource {
  /// How this encoding treats optional metadata that is absent or fails to
  /// decode. The flat encoding is the older, fully-specified generation, so
  /// a partial export is corrupt input; the hierarchical encoding evolved
  /// over time and tolerates omission.
  const LENIENCY: Leniency;

  /// The generation tag of this encoding.
  const GENERATION: SourceGeneration;

  /// Borrows a top-level field of the document, if present.
  fn top_level(&self, key: &str) -> Option<&Value>;

  /// Lists the channel group names of one kind, in source order.
  fn group_names(
    &self,
    kind: ChannelKind
  ) -> Result<Vec<String>, ConversionError>;

  /// Returns the number of channel entries in one named group.
  fn entry_count(
    &self,
    kind: ChannelKind,
    group: &str
  ) -> Result<usize, ConversionError>;

  /// Borrows one per-channel field of one entry. Returns `None` when the
  /// source lacks the field or carries it with an undefined value.
  fn entry_field(
    &self,
    kind: ChannelKind,
    group: &str,
    index: usize,
    field: &str
  ) -> Option<&Value>;

  /// Checks field presence without borrowing the value.
  fn has_field(
    &self,
    kind: ChannelKind,
    group: &str,
    index: usize,
    field: &str
  ) -> bool {
    return self.entry_field(kind, group, index, field).is_some();
  }
}

/// Strips undefined values: the export tooling sometimes keeps a field's
/// slot with a null in it, which counts as absent.
pub(crate) fn defined(value: &Value) -> Option<&Value> {
  return match value {
    Value::Null => None,
    other => Some(other)
  };
}
