//! BovError: Unified error type for bov-io public APIs
//!
//! Every fallible operation in the crate returns `Result<_, BovError>`.
//! Failures are local and synchronous; nothing here is broadcast to other
//! ranks unless the calling code does so explicitly.

use crate::extent::CartesianExtent;
use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for bov-io operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BovError {
    /// An extent was empty or inverted where a valid one was required.
    #[error("Invalid extent {0}")]
    InvalidExtent(CartesianExtent),
    /// Requested decomposition dimensions cannot be realised.
    #[error("Invalid decomposition: {0}")]
    InvalidDecomposition(String),
    /// Ghost widths must be non-negative.
    #[error("Invalid ghost width {0}: must be >= 0")]
    InvalidGhostWidth(i32),
    /// A file view and its memory view (or a buffer and its view) disagree on size.
    #[error("View size mismatch: expected {expected} elements, got {actual}")]
    ViewSizeMismatch { expected: usize, actual: usize },
    /// Decomposition index outside `[0, dims)` on some axis.
    #[error("Block index {index:?} outside decomposition dims {dims:?}")]
    BlockIndexOutOfRange { index: [usize; 3], dims: [usize; 3] },
    /// A message-passing operation was attempted on the serial communicator.
    #[error("Operation requires a parallel communicator (serial build)")]
    SerialCommunicator,
    /// A message-passing operation failed or delivered unexpected data.
    #[error("Communication error: {0}")]
    Communication(String),
    /// File-system level failure with the file involved.
    #[error("I/O error on `{path}`: {message}")]
    Io { path: PathBuf, message: String },
    /// Malformed metadata text.
    #[error("Metadata parse error: {0}")]
    MetadataParse(String),
    /// Packed metadata could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),
    /// Reader/writer used before `open` succeeded.
    #[error("Dataset is not open")]
    NotOpen,
    /// Array requested from a catalog or data set that does not carry it.
    #[error("Array `{0}` not found")]
    MissingArray(String),
    /// Time step not present in the dataset catalog.
    #[error("Time step {0} not found in dataset")]
    UnknownTimeStep(i64),
    /// I/O of one array component failed; the rest of the time step was abandoned.
    #[error("I/O failed for array `{array}` component {component}: {source}")]
    ArrayIo {
        array: String,
        component: usize,
        source: Box<BovError>,
    },
    /// Any other invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl BovError {
    /// Attach a file path to a raw `std::io::Error`.
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        BovError::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// Wrap an error with the array/component it occurred on.
    pub fn in_array(self, array: &str, component: usize) -> Self {
        BovError::ArrayIo {
            array: array.to_string(),
            component,
            source: Box::new(self),
        }
    }
}

impl From<std::io::Error> for BovError {
    fn from(err: std::io::Error) -> Self {
        BovError::Io {
            path: PathBuf::new(),
            message: err.to_string(),
        }
    }
}
