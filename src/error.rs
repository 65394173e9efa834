//! Centralized error handling for Graphcode.
//!
//! Every failure in the library is reported through [`GraphcodeError`]; the crate
//! denies `unwrap()` and `panic!()` so that corrupted input can never abort the
//! process.
//!
//! ## Error Categories
//!
//! - **I/O Errors** ([`GraphcodeError::Io`]): failures reported by the byte sink or source.
//! - **Malformed Primitives** ([`GraphcodeError::MalformedPrimitive`]): a flag byte other
//!   than `0`/`1`, a negative or oversized length prefix, invalid UTF-8, etc.
//! - **Truncation** ([`GraphcodeError::UnexpectedEndOfStream`]): the source ran dry
//!   before a read could be satisfied.
//! - **Unknown Fields** ([`GraphcodeError::UnknownField`]): a field identifier that the
//!   decoded schema cannot resolve. The payload shape is unknown, so this is always fatal.
//! - **Container Construction** ([`GraphcodeError::ContainerConstruction`]): decoded
//!   elements cannot be shaped into the requested container.
//! - **Schema** ([`GraphcodeError::Schema`]): a schema table that violates the
//!   identifier rules.
//! - **Internal** ([`GraphcodeError::Internal`]): lock poisoning or a lost flush task.
//!
//! Hitting the depth ceiling is not an error: it is a policy truncation applied
//! symmetrically on both sides.
//!
//! ## Usage
//!
//! ```rust
//! use graphcode::{Graphcode, GraphcodeError};
//!
//! match Graphcode::deserialize::<u64>(&[1, 2, 3]) {
//!     Err(GraphcodeError::UnexpectedEndOfStream { needed, available }) => {
//!         assert_eq!((needed, available), (8, 3));
//!     }
//!     other => panic!("unexpected result: {other:?}"),
//! }
//! ```

use std::fmt;
use std::io;
use std::sync::Arc;

/// A specialized `Result` type for Graphcode operations.
pub type Result<T> = std::result::Result<T, GraphcodeError>;

/// The master error enum covering all failure domains in Graphcode.
///
/// This type is `Clone` so that a failure observed by the background flush task
/// can be stored and re-reported. I/O errors are wrapped in `Arc` for that reason.
#[derive(Debug, Clone)]
pub enum GraphcodeError {
    /// Failure reported by the underlying sink or source.
    Io(Arc<io::Error>),

    /// A scalar, flag byte or length prefix that cannot be decoded.
    ///
    /// Length prefixes are validated against the configured ceiling before any
    /// allocation happens, so a corrupted stream cannot trigger a runaway allocation.
    MalformedPrimitive(String),

    /// The source was exhausted before a read could be satisfied.
    UnexpectedEndOfStream {
        /// Bytes the decoder asked for.
        needed: usize,
        /// Bytes that were actually left in the stream.
        available: usize,
    },

    /// The decoder met a field identifier it cannot map to a field of the target type.
    UnknownField {
        /// Name of the composite type being decoded.
        type_name: &'static str,
        /// The offending wire identifier.
        field_id: u8,
    },

    /// The decoded element list cannot be shaped into the declared container.
    ContainerConstruction(String),

    /// A schema table violates the identifier rules (reserved id, duplicates, too many fields).
    Schema(String),

    /// Logic error inside the engine (poisoned lock, lost flush task).
    Internal(String),
}

impl fmt::Display for GraphcodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O Error: {e}"),
            Self::MalformedPrimitive(s) => write!(f, "Malformed Primitive: {s}"),
            Self::UnexpectedEndOfStream { needed, available } => write!(
                f,
                "Unexpected End Of Stream: needed {needed} bytes, {available} available"
            ),
            Self::UnknownField {
                type_name,
                field_id,
            } => write!(f, "Unknown Field: id {field_id} in type {type_name}"),
            Self::ContainerConstruction(s) => write!(f, "Container Construction Error: {s}"),
            Self::Schema(s) => write!(f, "Schema Error: {s}"),
            Self::Internal(s) => write!(f, "Internal Logic Error: {s}"),
        }
    }
}

impl std::error::Error for GraphcodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for GraphcodeError {
    fn from(err: io::Error) -> Self {
        Self::Io(Arc::new(err))
    }
}
