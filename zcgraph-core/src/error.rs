//! Error types for zcgraph-core

use std::collections::TryReserveError;
use std::io;
use thiserror::Error;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type
///
/// "No path between two nodes" is not an error: path queries return
/// `Ok(None)` for it.
#[derive(Error, Debug)]
pub enum Error {
    /// The caller passed a graph or parameter the operation cannot accept
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A buffer allocation failed while serializing
    #[error("Out of memory: failed to reserve {bytes} bytes")]
    OutOfMemory {
        /// Number of bytes requested
        bytes: usize,
    },

    /// File creation, locking, mapping or writing failed
    #[error("I/O error: {context}: {source}")]
    Io {
        /// What was being attempted
        context: String,
        /// Underlying OS error
        #[source]
        source: io::Error,
    },

    /// Magic/version/checksum mismatch, or a structure that reads past the file
    #[error("Corrupt graph file: {0}")]
    Corrupt(String),

    /// A node or edge index beyond its table
    #[error("Index out of range: {what} {index} (count is {len})")]
    OutOfRange {
        /// Kind of element that was addressed
        what: &'static str,
        /// Requested index or identifier
        index: u64,
        /// Number of elements available
        len: u64,
    },

    /// Depth-first search exceeded its configured stack depth
    #[error("Depth limit exceeded: traversal deeper than {limit} frames")]
    DepthExceeded {
        /// Configured maximum depth
        limit: usize,
    },

    /// A traversal observed its cancellation flag at a level boundary
    #[error("Traversal cancelled")]
    Cancelled,
}

impl Error {
    /// Create an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    /// Create a corrupt-format error
    pub fn corrupt(msg: impl Into<String>) -> Self {
        Error::Corrupt(msg.into())
    }

    /// Create an I/O error carrying a short description of the operation
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Error::Io {
            context: context.into(),
            source,
        }
    }

    /// Create an out-of-range error
    pub fn out_of_range(what: &'static str, index: impl Into<u64>, len: impl Into<u64>) -> Self {
        Error::OutOfRange {
            what,
            index: index.into(),
            len: len.into(),
        }
    }

    /// Whether this error means the file itself cannot be trusted
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Error::Corrupt(_))
    }

    /// Whether this error is an out-of-range access
    pub fn is_out_of_range(&self) -> bool {
        matches!(self, Error::OutOfRange { .. })
    }
}

/// Map a failed `try_reserve` to an out-of-memory error for `bytes`.
pub(crate) fn reserve_failed(bytes: usize) -> impl FnOnce(TryReserveError) -> Error {
    move |_| Error::OutOfMemory { bytes }
}
