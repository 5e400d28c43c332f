//! Error taxonomy for the loading / preprocessing pipeline.
//!
//! Every library function returns [`Result<T>`]; the binaries wrap these in
//! `anyhow` for context and exit with a non-zero status on the first error.
use std::path::PathBuf;

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The input file is missing or unreadable.
    #[error("cannot read {}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The container is not a well-formed Level-5 MAT-file, or a field has
    /// the wrong MATLAB class.
    #[error("malformed MAT-file: {0}")]
    Format(String),

    /// An expected variable or struct field is absent.
    #[error("missing field `{0}`")]
    MissingField(String),

    /// Two related fields disagree on a dimension.
    #[error("shape mismatch: {0}")]
    Shape(String),

    /// Parallel event arrays have different lengths.
    #[error("length mismatch: {positions} positions vs {labels} labels")]
    LengthMismatch { positions: usize, labels: usize },

    /// A processing parameter is out of range (filter cutoffs, epoch window, …).
    #[error("invalid parameter: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn format(msg: impl Into<String>) -> Self {
        Error::Format(msg.into())
    }

    pub(crate) fn missing(field: impl Into<String>) -> Self {
        Error::MissingField(field.into())
    }
}
