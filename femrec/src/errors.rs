//! This module implements the error types for a conversion run. Every fatal
//! kind aborts the run immediately; the only recovered condition -- an
//! optional field absent from a lenient source -- never becomes an error
//! value at all, the field is simply omitted from the record.

use std::error::Error;
use std::fmt::Display;
use std::path::PathBuf;

/// Things that can go wrong while turning a raw source document into a
/// canonical model record.
#[derive(Debug)]
#[non_exhaustive]
pub enum ConversionError {
  /// A field the source schema requires was absent (or present but empty
  /// where the schema demands contents, like `nodeID`).
  MandatoryFieldMissing {
    /// The source name of the missing field.
    field: String,
    /// Where in the document we were looking.
    context: String
  },
  /// A byte-sequence-to-text decode failed under strict decoding.
  TextDecode {
    /// The source name of the undecodable field.
    field: String,
    /// Where in the document we were looking.
    context: String
  },
  /// A record had a shape that matches neither encoding at that point,
  /// e.g. a channel group that is not an array, or text bytes outside
  /// the 0-255 range.
  Malformed {
    /// Where in the document we were looking.
    context: String,
    /// What we expected to find there.
    expected: &'static str
  },
  /// The source document could not be read, after the fallback attempt
  /// if the encoding has one.
  SourceLoad {
    /// The last path we tried.
    path: PathBuf,
    /// The underlying read or parse error.
    source: Box<dyn Error + Send + Sync>
  },
  /// The top-level keys match neither the modal nor the static-reduction
  /// model shape. Reported as a diagnostic; no output is produced.
  UnsupportedVariant,
  /// The canonical record could not be written out.
  Persist {
    /// The output path.
    path: PathBuf,
    /// The underlying write error.
    source: std::io::Error
  }
}

impl Display for ConversionError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    return match self {
      Self::MandatoryFieldMissing { field, context } => write!(
        f, "mandatory field \"{}\" missing in {}", field, context
      ),
      Self::TextDecode { field, context } => write!(
        f, "field \"{}\" in {} does not decode to text", field, context
      ),
      Self::Malformed { context, expected } => write!(
        f, "malformed source: expected {} in {}", expected, context
      ),
      Self::SourceLoad { path, source } => write!(
        f, "could not load source document {}: {}", path.display(), source
      ),
      Self::UnsupportedVariant => write!(
        f, "top-level keys match neither known model shape"
      ),
      Self::Persist { path, source } => write!(
        f, "could not write canonical record {}: {}", path.display(), source
      )
    };
  }
}

impl Error for ConversionError {
  fn source(&self) -> Option<&(dyn Error + 'static)> {
    return match self {
      Self::SourceLoad { source, .. } => Some(source.as_ref()),
      Self::Persist { source, .. } => Some(source),
      _ => None
    };
  }
}
