//! Error types for stream network extraction and channel-profile analysis.

use thiserror::Error;

/// Main error type for streamnet operations.
///
/// Every variant is a deterministic function of the inputs; nothing here is
/// worth retrying.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Shape mismatch for {what}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        what: &'static str,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Invalid unit '{0}': expected one of 'pixels', 'mapunits', 'm2', 'km2'")]
    InvalidUnit(String),

    #[error("Unsupported source for a node attribute list: {0}")]
    UnsupportedSourceType(String),

    #[error("Unsupported numeric type for {what}: {dtype} (expected f32 or f64)")]
    UnsupportedNumericType { what: &'static str, dtype: String },

    #[error("Malformed drainage graph: {0}")]
    MalformedGraph(String),
}

impl Error {
    pub(crate) fn shape_mismatch(what: &'static str, expected: &[usize], actual: &[usize]) -> Self {
        Error::ShapeMismatch {
            what,
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }
}

/// Result type alias for streamnet operations.
pub type Result<T> = std::result::Result<T, Error>;
