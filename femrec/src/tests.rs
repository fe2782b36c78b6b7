use std::path::Path;

use serde_json::{Value, json};

use crate::prelude::*;
use crate::source::defined;

/// Encodes text the way the export tooling does: as a numeric byte array.
fn bytes(s: &str) -> Value {
  return Value::from(s.bytes().map(u64::from).collect::<Vec<_>>());
}

/// A flat (array-of-records) modal source document, two input groups and
/// one output group.
fn flat_doc() -> Value {
  return json!({
    "modelDescription": bytes("M1 test model"),
    "fem_inputs": {
      "OSS_M1_lcl_6F": {
        "types": [bytes("F")],
        "exciteIDs": [[1]],
        "descriptions": [bytes("M1 local forces")],
        "indices": [[10, 11, 12]],
        "properties": [{
          "csLabel": bytes("OSS_M1_lcl"),
          "nodeID": [101, 102, 103],
          "csNumber": [4],
          "location": [0.5, 1.5, 2.5]
        }]
      },
      "OSS_Hardpoint_D": {
        "types": [bytes("F"), bytes("M")],
        "exciteIDs": [[2], [3]],
        "descriptions": [bytes("hardpoint dz"), bytes("hardpoint my")],
        "indices": [[40], [41]],
        "properties": [
          { "csLabel": bytes("OSS_HP"), "nodeID": [301] },
          { "csLabel": bytes("OSS_HP"), "nodeID": [302] }
        ]
      }
    },
    "fem_outputs": {
      "OSS_M1_lcl": {
        "types": [bytes("D")],
        "descriptions": [bytes("M1 local displacements")],
        "indices": [[20, 21]],
        "properties": [{
          "csLabel": bytes("OSS_M1_lcl"),
          "nodeID": [201],
          "component": [[-3]]
        }]
      }
    },
    "eigenfrequencies": [[0.5], [1.25], [8.0]],
    "inputs2ModalF": [0.1, 0.2, 0.3, 0.4],
    "modalDisp2Outputs": [1.0, 2.0, 3.0],
    "proportionalDampingVec": [0.02, 0.02, 0.02]
  });
}

/// The same logical model as [`flat_doc`], in the hierarchical encoding.
fn tree_doc() -> Value {
  return json!({
    "modelDescription": bytes("M1 test model"),
    "fem_inputs": {
      "OSS_M1_lcl_6F": [{
        "types": bytes("F"),
        "exciteIDs": [1],
        "descriptions": bytes("M1 local forces"),
        "indices": [10, 11, 12],
        "properties": {
          "csLabel": bytes("OSS_M1_lcl"),
          "nodeID": [101, 102, 103],
          "csNumber": [4],
          "location": [0.5, 1.5, 2.5]
        }
      }],
      "OSS_Hardpoint_D": [
        {
          "types": bytes("F"),
          "exciteIDs": [2],
          "descriptions": bytes("hardpoint dz"),
          "indices": [40],
          "properties": { "csLabel": bytes("OSS_HP"), "nodeID": [301] }
        },
        {
          "types": bytes("M"),
          "exciteIDs": [3],
          "descriptions": bytes("hardpoint my"),
          "indices": [41],
          "properties": { "csLabel": bytes("OSS_HP"), "nodeID": [302] }
        }
      ]
    },
    "fem_outputs": {
      "OSS_M1_lcl": [{
        "types": bytes("D"),
        "descriptions": bytes("M1 local displacements"),
        "indices": [20, 21],
        "properties": {
          "csLabel": bytes("OSS_M1_lcl"),
          "nodeID": [201],
          "component": [-3]
        }
      }]
    },
    "eigenfrequencies": [0.5, 1.25, 8.0],
    "inputs2ModalF": [0.1, 0.2, 0.3, 0.4],
    "modalDisp2Outputs": [1.0, 2.0, 3.0],
    "proportionalDampingVec": [0.02, 0.02, 0.02]
  });
}

/// A hierarchical document carrying only the static-reduction payload.
fn static_tree_doc() -> Value {
  let mut doc = tree_doc();
  let map = doc.as_object_mut().unwrap();
  for key in MODAL_KEYS {
    map.remove(key);
  }
  map.insert(GAIN_MATRIX.to_string(), json!([1.0, 0.0, 0.0, 1.0]));
  return doc;
}

#[test]
fn flat_scenario_single_force_group() {
  let source = FlatSource::from_value(flat_doc()).unwrap();
  let model = convert(&source).unwrap();
  assert_eq!(model.inputs.len(), 2);
  assert_eq!(model.outputs.len(), 1);
  let expected = json!({
    "OSS_M1_lcl_6F": [{
      "typeTag": "F",
      "description": "M1 local forces",
      "indices": [10, 11, 12],
      "excitationIds": [1],
      "properties": {
        "coordinateSystemLabel": "OSS_M1_lcl",
        "nodeId": [101, 102, 103],
        "coordinateSystemNumber": [4],
        "location": [0.5, 1.5, 2.5]
      }
    }]
  });
  assert_eq!(serde_json::to_value(&model.inputs[0]).unwrap(), expected);
}

#[test]
fn both_encodings_yield_identical_canonical_bytes() {
  let flat = FlatSource::from_value(flat_doc()).unwrap();
  let tree = TreeSource::from_value(tree_doc()).unwrap();
  let a = serde_json::to_string(&convert(&flat).unwrap()).unwrap();
  let b = serde_json::to_string(&convert(&tree).unwrap()).unwrap();
  assert_eq!(a, b);
}

#[test]
fn conversion_is_deterministic() {
  let source = TreeSource::from_value(tree_doc()).unwrap();
  let a = serde_json::to_string(&convert(&source).unwrap()).unwrap();
  let b = serde_json::to_string(&convert(&source).unwrap()).unwrap();
  assert_eq!(a, b);
}

#[test]
fn counts_and_order_match_source_extents() {
  let source = FlatSource::from_value(flat_doc()).unwrap();
  let model = convert(&source).unwrap();
  let names: Vec<&str> = model.inputs.iter().map(|g| g.name.as_str()).collect();
  assert_eq!(names, ["OSS_M1_lcl_6F", "OSS_Hardpoint_D"]);
  assert_eq!(model.inputs[1].len(), 2);
  let tags: Vec<&str> = model.inputs[1]
    .channels
    .iter()
    .map(|c| c.type_tag.as_str())
    .collect();
  assert_eq!(tags, ["F", "M"]);
  assert_eq!(model.n_inputs(), 3);
  assert_eq!(model.n_outputs(), 1);
}

#[test]
fn modal_variant_is_exclusive() {
  let source = TreeSource::from_value(tree_doc()).unwrap();
  let model = convert(&source).unwrap();
  assert_eq!(model.variant(), ModelVariant::Modal);
  assert_eq!(model.n_modes(), 3);
  assert!(!model.inputs_to_modal_force.is_empty());
  assert!(!model.modal_displacement_to_outputs.is_empty());
  assert!(!model.proportional_damping_vector.is_empty());
  assert!(model.gain_matrix.is_empty());
}

#[test]
fn static_variant_is_exclusive() {
  let source = TreeSource::from_value(static_tree_doc()).unwrap();
  let model = convert(&source).unwrap();
  assert_eq!(model.variant(), ModelVariant::StaticReduction);
  assert_eq!(model.gain_matrix, [1.0, 0.0, 0.0, 1.0]);
  assert!(model.eigenfrequencies.is_empty());
  assert!(model.inputs_to_modal_force.is_empty());
  assert!(model.modal_displacement_to_outputs.is_empty());
  assert!(model.proportional_damping_vector.is_empty());
}

#[test]
fn unsupported_variant_produces_no_record() {
  let mut doc = tree_doc();
  let map = doc.as_object_mut().unwrap();
  for key in MODAL_KEYS {
    map.remove(key);
  }
  let source = TreeSource::from_value(doc).unwrap();
  match convert(&source) {
    Err(ConversionError::UnsupportedVariant) => {},
    other => panic!("expected UnsupportedVariant, got {:?}", other)
  };
}

#[test]
fn optional_fields_are_absent_not_null() {
  // the hardpoint records carry no csNumber
  let source = TreeSource::from_value(tree_doc()).unwrap();
  let model = convert(&source).unwrap();
  let props = &model.inputs[1].channels[0].properties;
  assert_eq!(props.coordinate_system_number, None);
  let raw = serde_json::to_value(props).unwrap();
  assert!(raw.get("coordinateSystemNumber").is_none());
  assert!(raw.get("component").is_none());
}

#[test]
fn missing_mandatory_field_is_fatal_in_flat_sources() {
  let mut doc = flat_doc();
  doc["fem_inputs"]["OSS_M1_lcl_6F"]
    .as_object_mut()
    .unwrap()
    .remove("exciteIDs");
  let source = FlatSource::from_value(doc).unwrap();
  match convert(&source) {
    Err(ConversionError::MandatoryFieldMissing { field, .. }) => {
      assert_eq!(field, "exciteIDs");
    },
    other => panic!("expected MandatoryFieldMissing, got {:?}", other)
  };
}

#[test]
fn missing_node_id_is_fatal_even_in_lenient_sources() {
  let mut doc = tree_doc();
  doc["fem_outputs"]["OSS_M1_lcl"][0]["properties"]
    .as_object_mut()
    .unwrap()
    .remove("nodeID");
  let source = TreeSource::from_value(doc).unwrap();
  assert!(matches!(
    convert(&source),
    Err(ConversionError::MandatoryFieldMissing { .. })
  ));
}

#[test]
fn empty_node_id_counts_as_missing() {
  let mut doc = tree_doc();
  doc["fem_outputs"]["OSS_M1_lcl"][0]["properties"]["nodeID"] = json!([]);
  let source = TreeSource::from_value(doc).unwrap();
  assert!(matches!(
    convert(&source),
    Err(ConversionError::MandatoryFieldMissing { .. })
  ));
}

#[test]
fn output_label_failures_are_omitted_input_ones_are_fatal() {
  // 0xff never decodes as UTF-8
  let garbage = json!([79, 255, 83]);
  let mut doc = tree_doc();
  doc["fem_outputs"]["OSS_M1_lcl"][0]["properties"]["csLabel"] =
    garbage.clone();
  let source = TreeSource::from_value(doc).unwrap();
  let model = convert(&source).unwrap();
  let props = &model.outputs[0].channels[0].properties;
  assert_eq!(props.coordinate_system_label, None);
  let mut doc = tree_doc();
  doc["fem_inputs"]["OSS_M1_lcl_6F"][0]["properties"]["csLabel"] = garbage;
  let source = TreeSource::from_value(doc).unwrap();
  assert!(matches!(
    convert(&source),
    Err(ConversionError::TextDecode { .. })
  ));
}

#[test]
fn output_label_absence_is_tolerated_only_in_lenient_sources() {
  let mut doc = tree_doc();
  doc["fem_outputs"]["OSS_M1_lcl"][0]["properties"]
    .as_object_mut()
    .unwrap()
    .remove("csLabel");
  let source = TreeSource::from_value(doc).unwrap();
  let model = convert(&source).unwrap();
  let props = &model.outputs[0].channels[0].properties;
  assert_eq!(props.coordinate_system_label, None);
  // in the flat encoding a missing label is corrupt input
  let mut doc = flat_doc();
  doc["fem_outputs"]["OSS_M1_lcl"]["properties"][0]
    .as_object_mut()
    .unwrap()
    .remove("csLabel");
  let source = FlatSource::from_value(doc).unwrap();
  assert!(matches!(
    convert(&source),
    Err(ConversionError::MandatoryFieldMissing { .. })
  ));
}

#[test]
fn model_description_decode_follows_source_leniency() {
  let garbage = json!([77, 255, 49]);
  let mut doc = tree_doc();
  doc["modelDescription"] = garbage.clone();
  let source = TreeSource::from_value(doc).unwrap();
  // lenient: the invalid byte is dropped, not replaced
  assert_eq!(convert(&source).unwrap().model_description, "M1");
  let mut doc = flat_doc();
  doc["modelDescription"] = garbage;
  let source = FlatSource::from_value(doc).unwrap();
  assert!(matches!(
    convert(&source),
    Err(ConversionError::TextDecode { .. })
  ));
}

#[test]
fn component_is_coerced_signed() {
  let source = TreeSource::from_value(tree_doc()).unwrap();
  let model = convert(&source).unwrap();
  let props = &model.outputs[0].channels[0].properties;
  assert_eq!(props.component, Some(vec![-3]));
}

#[test]
fn property_rules_match_the_source_schema() {
  let strict = Leniency::Strict;
  let lenient = Leniency::Lenient;
  let inp = ChannelKind::Input;
  let out = ChannelKind::Output;
  assert_eq!(property_rule(NODE_ID, out, lenient), FieldRule::Mandatory);
  assert_eq!(property_rule(CS_NUMBER, inp, strict), FieldRule::Optional);
  assert_eq!(property_rule(CS_LABEL, inp, lenient), FieldRule::Mandatory);
  assert_eq!(property_rule(CS_LABEL, out, lenient), FieldRule::Optional);
  assert_eq!(property_rule(CS_LABEL, out, strict), FieldRule::Mandatory);
}

#[test]
fn null_values_count_as_absent() {
  assert!(defined(&Value::Null).is_none());
  let mut doc = tree_doc();
  doc["fem_inputs"]["OSS_M1_lcl_6F"][0]["properties"]["csNumber"] =
    Value::Null;
  let source = TreeSource::from_value(doc).unwrap();
  let model = convert(&source).unwrap();
  let props = &model.inputs[0].channels[0].properties;
  assert_eq!(props.coordinate_system_number, None);
}

#[test]
fn duplicate_group_names_are_rejected() {
  /// A source whose group name list repeats itself; real documents cannot
  /// hold duplicate keys, but nothing forces an adapter to come from one.
  struct DupSource;
  impl ModelSource for DupSource {
    const LENIENCY: Leniency = Leniency::Lenient;
    const GENERATION: SourceGeneration = SourceGeneration::Hierarchical;

    fn top_level(&self, _key: &str) -> Option<&Value> {
      return None;
    }

    fn group_names(
      &self,
      _kind: ChannelKind
    ) -> Result<Vec<String>, ConversionError> {
      return Ok(vec!["same".to_string(), "same".to_string()]);
    }

    fn entry_count(
      &self,
      _kind: ChannelKind,
      _group: &str
    ) -> Result<usize, ConversionError> {
      return Ok(0);
    }

    fn entry_field(
      &self,
      _kind: ChannelKind,
      _group: &str,
      _index: usize,
      _field: &str
    ) -> Option<&Value> {
      return None;
    }
  }
  assert!(matches!(
    normalize_side(&DupSource, ChannelKind::Input),
    Err(ConversionError::Malformed { .. })
  ));
}

#[test]
fn lenient_text_decode_drops_bad_bytes() {
  let raw = json!([72, 255, 105, 300, 33.5]);
  let lenient =
    decode_text(&raw, Leniency::Lenient, "field", "test").unwrap();
  assert_eq!(lenient, "Hi");
  assert!(decode_text(&raw, Leniency::Strict, "field", "test").is_err());
}

#[test]
fn artifact_keys_cover_all_known_artifacts() {
  use ModelVariant::*;
  use SourceGeneration::*;
  assert_eq!(
    artifact_key(Modal, FlatArrays),
    "modal_state_space_model_2ndOrder"
  );
  assert_eq!(
    artifact_key(Modal, Hierarchical),
    "modal_state_space_model_2ndOrder.73"
  );
  assert_eq!(
    artifact_key(StaticReduction, Hierarchical),
    "static_reduction_model.73"
  );
  assert_eq!(
    artifact_key(StaticReduction, FlatArrays),
    "static_reduction_model"
  );
}

#[test]
fn fallback_source_name_is_used_when_primary_is_unreadable() {
  let dir = tempfile::tempdir().unwrap();
  let alternate = dir.path().join(ALTERNATE_SOURCE);
  std::fs::write(
    &alternate,
    serde_json::to_vec(&static_tree_doc()).unwrap()
  )
  .unwrap();
  let primary = dir.path().join(PRIMARY_SOURCE);
  let source = TreeSource::open(&primary, &alternate).unwrap();
  let model = convert(&source).unwrap();
  assert_eq!(model.variant(), ModelVariant::StaticReduction);
  // a second failure is fatal
  let neither = TreeSource::open(&primary, Path::new("/nonexistent.json"));
  assert!(matches!(neither, Err(ConversionError::SourceLoad { .. })));
}

#[test]
fn written_record_round_trips() {
  let dir = tempfile::tempdir().unwrap();
  let source = FlatSource::from_value(flat_doc()).unwrap();
  let model = convert(&source).unwrap();
  let path =
    write_model(&model, FlatSource::GENERATION, dir.path()).unwrap();
  assert_eq!(
    path.file_name().and_then(|s| s.to_str()),
    Some("modal_state_space_model_2ndOrder.json")
  );
  let back = CanonicalModel::from_file(&path).unwrap();
  assert_eq!(back, model);
}
