//! This module implements the per-channel property sub-record and its
//! extractor. Three fields are semantically special -- the coordinate
//! system label, the node identifiers and the coordinate system number --
//! plus, for output channels, the measured component; everything else is
//! carried along verbatim as flattened numeric sequences.

use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};
use serde_json::{Map, Value};

use crate::errors::ConversionError;
use crate::raw::{Leniency, decode_text, flatten_numbers, to_signed, to_unsigned};
use crate::source::{ChannelKind, defined};

/// Source field name of the coordinate system label (byte-encoded text).
pub const CS_LABEL: &str = "csLabel";

/// Source field name of the node identifiers.
pub const NODE_ID: &str = "nodeID";

/// Source field name of the coordinate system number. Only the newer
/// exports carry it.
pub const CS_NUMBER: &str = "csNumber";

/// Source field name of the measured component (output channels only).
pub const COMPONENT: &str = "component";

/// Whether a property field may be absent from a source record. Each
/// adapter's policy consults this table instead of sprinkling presence
/// checks around.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FieldRule {
  /// Absence is a fatal parse error.
  Mandatory,
  /// Absence omits the field from the record, nothing more.
  Optional
}

/// Returns the presence rule for one property field, given the channel
/// kind and the source encoding's leniency.
pub fn property_rule(
  field: &str,
  kind: ChannelKind,
  leniency: Leniency
) -> FieldRule {
  return match field {
    // no export generation may omit the node identifiers
    NODE_ID => FieldRule::Mandatory,
    // the coordinate system number only exists in newer exports
    CS_NUMBER => FieldRule::Optional,
    COMPONENT => FieldRule::Optional,
    CS_LABEL if kind.is_input() => FieldRule::Mandatory,
    // flat exports carry the label slot on every record; hierarchical
    // ones may drop it on the output side
    CS_LABEL if leniency.is_lenient() => FieldRule::Optional,
    CS_LABEL => FieldRule::Mandatory,
    _ => FieldRule::Optional
  };
}

/// The free-form metadata attached to one channel. Optional fields are
/// entirely absent from the serialized mapping when the source lacks them,
/// never carried as nulls.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PropertyRecord {
  /// The label of the coordinate system the channel is expressed in.
  #[serde(
    rename = "coordinateSystemLabel",
    skip_serializing_if = "Option::is_none"
  )]
  pub coordinate_system_label: Option<String>,
  /// The mesh node identifiers the channel is attached to. Always present
  /// and non-empty.
  #[serde(rename = "nodeId")]
  pub node_id: Vec<u32>,
  /// The number of the coordinate system, in newer exports.
  #[serde(
    rename = "coordinateSystemNumber",
    skip_serializing_if = "Option::is_none"
  )]
  pub coordinate_system_number: Option<Vec<u32>>,
  /// The measured component, on output channels that carry one.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub component: Option<Vec<i32>>,
  /// Every remaining source field, flattened to numeric sequences.
  #[serde(flatten)]
  pub extra: BTreeMap<String, Vec<f64>>
}

/// Shorthand for the fatal-absence error.
fn missing(field: &str, context: &str) -> ConversionError {
  return ConversionError::MandatoryFieldMissing {
    field: field.to_string(),
    context: context.to_string()
  };
}

/// Decodes the property sub-record of one channel from a raw
/// field-name-to-array mapping.
pub fn extract_properties(
  record: &Map<String, Value>,
  kind: ChannelKind,
  leniency: Leniency,
  context: &str
) -> Result<PropertyRecord, ConversionError> {
  let context = format!("properties of {}", context);
  let lookup = |field: &str| record.get(field).and_then(defined);
  let node_id = match lookup(NODE_ID) {
    Some(v) => to_unsigned(v, NODE_ID, &context)?,
    None => return Err(missing(NODE_ID, &context))
  };
  if node_id.is_empty() {
    return Err(missing(NODE_ID, &context));
  }
  let label_rule = property_rule(CS_LABEL, kind, leniency);
  let coordinate_system_label = match (lookup(CS_LABEL), label_rule) {
    // input channels require a clean decode; output channels drop the
    // field when its bytes are garbage. asymmetry inherited from the
    // source schema, preserved as observed.
    (Some(v), _) => match decode_text(v, Leniency::Strict, CS_LABEL, &context) {
      Ok(s) => Some(s),
      Err(_) if !kind.is_input() => None,
      Err(e) => return Err(e)
    },
    (None, FieldRule::Optional) => None,
    (None, FieldRule::Mandatory) => return Err(missing(CS_LABEL, &context))
  };
  let coordinate_system_number = lookup(CS_NUMBER)
    .map(|v| to_unsigned(v, CS_NUMBER, &context))
    .transpose()?;
  let component = match kind {
    ChannelKind::Input => None,
    ChannelKind::Output => lookup(COMPONENT)
      .map(|v| to_signed(v, COMPONENT, &context))
      .transpose()?
  };
  let mut extra = BTreeMap::new();
  for (field, value) in record.iter() {
    if matches!(field.as_str(), NODE_ID | CS_LABEL | CS_NUMBER | COMPONENT) {
      continue;
    }
    if let Some(value) = defined(value) {
      extra.insert(field.clone(), flatten_numbers(value, field, &context)?);
    }
  }
  return Ok(PropertyRecord {
    coordinate_system_label,
    node_id,
    coordinate_system_number,
    component,
    extra
  });
}
