//! This module implements handling of the raw nested-record documents the
//! export tooling hands us: loading one fully into memory, flattening its
//! numeric fields, coercing index-like fields to fixed-width integers, and
//! the single byte-sequence-to-text decode primitive.
//!
//! The structured-file readers themselves are external to this crate; a
//! source document arrives as one nested record (a JSON dump of the raw
//! export) and is read in full before any extraction begins.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use log::debug;
use num::ToPrimitive;
use serde_json::Value;

use crate::errors::ConversionError;

/// How a decode or lookup reacts to bad or missing input. Which call sites
/// get which mode is fixed by the source schema, never inferred.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Leniency {
  /// Failure is fatal: the run aborts and nothing is written.
  Strict,
  /// Failure is recovered locally by omission.
  Lenient
}

impl Leniency {
  /// Returns whether this is the lenient mode.
  pub const fn is_lenient(&self) -> bool {
    return matches!(self, Self::Lenient);
  }
}

/// Reads a whole raw source document into memory.
pub fn load_document(path: &Path) -> Result<Value, ConversionError> {
  let wrap = |e: Box<dyn std::error::Error + Send + Sync>| {
    ConversionError::SourceLoad { path: path.to_path_buf(), source: e }
  };
  let file = File::open(path).map_err(|e| wrap(Box::new(e)))?;
  let doc = serde_json::from_reader(BufReader::new(file))
    .map_err(|e| wrap(Box::new(e)))?;
  debug!("Loaded raw document {}.", path.display());
  return Ok(doc);
}

/// Flattens a raw numeric field into a flat sequence of reals. The export
/// tooling wraps scalars and rows in nested arrays of varying depth, so any
/// nesting is accepted and flattened in order.
pub fn flatten_numbers(
  value: &Value,
  field: &str,
  context: &str
) -> Result<Vec<f64>, ConversionError> {
  /// Recursive helper so the public signature stays flat.
  fn walk(value: &Value, acc: &mut Vec<f64>) -> bool {
    return match value {
      Value::Number(n) => n.as_f64().map(|x| acc.push(x)).is_some(),
      Value::Array(items) => items.iter().all(|v| walk(v, acc)),
      _ => false
    };
  }
  let mut acc = Vec::new();
  if walk(value, &mut acc) {
    return Ok(acc);
  }
  return Err(ConversionError::Malformed {
    context: format!("{} of {}", field, context),
    expected: "a numeric sequence"
  });
}

/// Coerces a raw numeric field to unsigned 32-bit integers, the width all
/// degree-of-freedom and identifier fields carry in the canonical record.
pub fn to_unsigned(
  value: &Value,
  field: &str,
  context: &str
) -> Result<Vec<u32>, ConversionError> {
  let reals = flatten_numbers(value, field, context)?;
  let coerced: Option<Vec<u32>> = reals.iter().map(|x| x.to_u32()).collect();
  return coerced.ok_or(ConversionError::Malformed {
    context: format!("{} of {}", field, context),
    expected: "unsigned 32-bit values"
  });
}

/// Coerces a raw numeric field to signed 32-bit integers.
pub fn to_signed(
  value: &Value,
  field: &str,
  context: &str
) -> Result<Vec<i32>, ConversionError> {
  let reals = flatten_numbers(value, field, context)?;
  let coerced: Option<Vec<i32>> = reals.iter().map(|x| x.to_i32()).collect();
  return coerced.ok_or(ConversionError::Malformed {
    context: format!("{} of {}", field, context),
    expected: "signed 32-bit values"
  });
}

/// Decodes a raw byte-sequence field into text. Strict mode fails on
/// anything that is not a UTF-8 byte sequence; lenient mode drops invalid
/// bytes and always produces a string.
pub fn decode_text(
  value: &Value,
  mode: Leniency,
  field: &str,
  context: &str
) -> Result<String, ConversionError> {
  let fail = || ConversionError::TextDecode {
    field: field.to_string(),
    context: context.to_string()
  };
  let reals = flatten_numbers(value, field, context)?;
  let mut bytes: Vec<u8> = Vec::with_capacity(reals.len());
  for x in reals {
    match x.to_u8().filter(|_| x.fract() == 0.0) {
      Some(b) => bytes.push(b),
      None if mode.is_lenient() => continue,
      None => return Err(fail())
    };
  }
  return match mode {
    Leniency::Strict => String::from_utf8(bytes).map_err(|_| fail()),
    Leniency::Lenient => Ok(utf8_dropping(&bytes))
  };
}

/// Decodes as much UTF-8 as possible, dropping invalid bytes.
fn utf8_dropping(bytes: &[u8]) -> String {
  let mut out = String::with_capacity(bytes.len());
  let mut rest = bytes;
  while !rest.is_empty() {
    match std::str::from_utf8(rest) {
      Ok(s) => {
        out.push_str(s);
        break;
      },
      Err(e) => {
        let (good, bad) = rest.split_at(e.valid_up_to());
        out.push_str(&String::from_utf8_lossy(good));
        match e.error_len() {
          Some(n) => rest = &bad[n..],
          // incomplete sequence at the very end, nothing left to salvage
          None => break
        };
      }
    };
  }
  return out;
}
