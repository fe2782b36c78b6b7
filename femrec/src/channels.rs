//! This module implements canonical channel entries and channel groups,
//! plus the normalizer that turns one raw channel-group record into an
//! ordered sequence of canonical entries.

use itertools::Itertools;
use log::debug;
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Serialize, Deserialize};
use serde_json::Value;

use crate::errors::ConversionError;
use crate::properties::{PropertyRecord, extract_properties};
use crate::raw::{Leniency, decode_text, to_unsigned};
use crate::source::{ChannelKind, ModelSource};

/// Source field name of the per-channel type tags (byte-encoded text).
pub const TYPES: &str = "types";

/// Source field name of the excitation identifiers (input channels only).
pub const EXCITE_IDS: &str = "exciteIDs";

/// Source field name of the per-channel descriptions (byte-encoded text).
pub const DESCRIPTIONS: &str = "descriptions";

/// Source field name of the degrees-of-freedom indices.
pub const INDICES: &str = "indices";

/// Source field name of the per-channel property sub-record.
pub const PROPERTIES: &str = "properties";

/// One physical excitation or measurement channel.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ChannelEntry {
  /// Short code for the physical quantity, e.g. "F" for a force.
  #[serde(rename = "typeTag")]
  pub type_tag: String,
  /// Free-text description of the channel.
  pub description: String,
  /// Degrees-of-freedom mapping, in source order, never re-sorted.
  pub indices: Vec<u32>,
  /// Load case identifiers; input channels only.
  #[serde(rename = "excitationIds", skip_serializing_if = "Option::is_none")]
  pub excitation_ids: Option<Vec<u32>>,
  /// The channel's property sub-record.
  pub properties: PropertyRecord
}

/// A named ordered sequence of channels sharing one physical interface on
/// the structure. Serializes as a one-entry mapping, name to entry list.
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelGroup {
  /// The interface name, unique within its side of the model.
  pub name: String,
  /// The channels, in source order.
  pub channels: Vec<ChannelEntry>
}

impl ChannelGroup {
  /// Returns the number of channels in the group.
  pub fn len(&self) -> usize {
    return self.channels.len();
  }

  /// Returns true for a channel-less group.
  pub fn is_empty(&self) -> bool {
    return self.channels.is_empty();
  }
}

impl Serialize for ChannelGroup {
  fn serialize<S: Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
    let mut map = ser.serialize_map(Some(1))?;
    map.serialize_entry(&self.name, &self.channels)?;
    return map.end();
  }
}

impl<'de> Deserialize<'de> for ChannelGroup {
  fn deserialize<D: Deserializer<'de>>(des: D) -> Result<Self, D::Error> {
    /// Expects exactly one name-to-channels entry.
    struct GroupVisitor;
    impl<'de> Visitor<'de> for GroupVisitor {
      type Value = ChannelGroup;

      fn expecting(
        &self,
        f: &mut std::fmt::Formatter<'_>
      ) -> std::fmt::Result {
        return write!(f, "a one-entry mapping of group name to channels");
      }

      fn visit_map<A: MapAccess<'de>>(
        self,
        mut access: A
      ) -> Result<Self::Value, A::Error> {
        let (name, channels) = access
          .next_entry::<String, Vec<ChannelEntry>>()?
          .ok_or_else(|| de::Error::invalid_length(0, &self))?;
        if access.next_key::<String>()?.is_some() {
          return Err(de::Error::invalid_length(2, &self));
        }
        return Ok(ChannelGroup { name, channels });
      }
    }
    return des.deserialize_map(GroupVisitor);
  }
}

/// Borrows a mandatory per-channel field or reports its absence.
fn require<'a>(
  value: Option<&'a Value>,
  field: &str,
  context: &str
) -> Result<&'a Value, ConversionError> {
  return value.ok_or_else(|| ConversionError::MandatoryFieldMissing {
    field: field.to_string(),
    context: context.to_string()
  });
}

/// Normalizes one named channel group: builds one canonical entry per
/// source channel, preserving order. The per-channel metadata itself is
/// never optional in either encoding, so type tags and descriptions are
/// decoded strictly; leniency only reaches the property sub-record.
pub fn normalize_group<S: ModelSource>(
  source: &S,
  kind: ChannelKind,
  name: &str
) -> Result<ChannelGroup, ConversionError> {
  let count = source.entry_count(kind, name)?;
  debug!("Normalizing {} group \"{}\" ({} channels).", kind, name, count);
  let mut channels = Vec::with_capacity(count);
  for k in 0..count {
    let context = format!("{}/{}[{}]", kind.key(), name, k);
    let field = |f: &str| source.entry_field(kind, name, k, f);
    let type_tag = decode_text(
      require(field(TYPES), TYPES, &context)?,
      Leniency::Strict,
      TYPES,
      &context
    )?;
    let description = decode_text(
      require(field(DESCRIPTIONS), DESCRIPTIONS, &context)?,
      Leniency::Strict,
      DESCRIPTIONS,
      &context
    )?;
    let indices = to_unsigned(
      require(field(INDICES), INDICES, &context)?,
      INDICES,
      &context
    )?;
    let excitation_ids = if kind.is_input() {
      Some(to_unsigned(
        require(field(EXCITE_IDS), EXCITE_IDS, &context)?,
        EXCITE_IDS,
        &context
      )?)
    } else {
      None
    };
    let props = require(field(PROPERTIES), PROPERTIES, &context)?
      .as_object()
      .ok_or(ConversionError::Malformed {
        context: context.clone(),
        expected: "a property sub-record mapping"
      })?;
    let properties = extract_properties(props, kind, S::LENIENCY, &context)?;
    channels.push(ChannelEntry {
      type_tag,
      description,
      indices,
      excitation_ids,
      properties
    });
  }
  return Ok(ChannelGroup { name: name.to_string(), channels });
}

/// Normalizes every channel group of one kind, in source order. Group
/// names must be unique within a side of the model.
pub fn normalize_side<S: ModelSource>(
  source: &S,
  kind: ChannelKind
) -> Result<Vec<ChannelGroup>, ConversionError> {
  let names = source.group_names(kind)?;
  if let Some(dup) = names.iter().duplicates().next() {
    return Err(ConversionError::Malformed {
      context: format!("{}/{}", kind.key(), dup),
      expected: "a unique group name"
    });
  }
  return names
    .iter()
    .map(|name| normalize_group(source, kind, name))
    .collect();
}
