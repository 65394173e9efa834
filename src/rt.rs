//! Runtime utilities for generated code (Macros).
//! Do not use directly.

use crate::error::GraphcodeError;

pub use crate::walker::{Decoder, Encoder, FieldEncoder};

/// Error for a local field index the derived `decode_field` does not know.
///
/// Indices come from the type's own `FIELDS` table, so reaching this means the
/// derived impl and the descriptor list disagree.
pub fn unknown_local_field(type_name: &'static str, index: usize) -> GraphcodeError {
    GraphcodeError::Internal(format!(
        "{type_name}: field index {index} has no accessor"
    ))
}
