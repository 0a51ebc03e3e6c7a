//! Error types for `dossier-core`.

use thiserror::Error;

/// Why an imported document was rejected. The database is never replaced
/// when any of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportError {
  #[error("import is not valid JSON: {0}")]
  Parse(String),

  #[error("import root is not an object")]
  NotAnObject,

  #[error("missing required field {0:?}")]
  MissingField(&'static str),

  #[error("field {0:?} is not an array")]
  NotAnArray(&'static str),

  /// A record inside `investigations` or `evidence` failed to decode.
  /// `detail` carries serde's path and message.
  #[error("malformed record: {detail}")]
  Decode { detail: String },
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("import rejected: {0}")]
  Import(#[from] ImportError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
