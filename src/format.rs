//! Defines the byte-level layout of a Graphcode stream.
//!
//! There is no global header or footer: a stream is the plain concatenation of
//! the values pushed into it.
//!
//! ## Composite Anatomy
//! ```text
//! [Schema Table (first occurrence of the type only)]
//! { [u8 FieldId] [u8 Presence] [Value (if Presence = 1)] }*
//! [u8 0 Terminator]
//! ```
//!
//! ## Container Anatomy
//! `[i32 Count] [Element 0] ... [Element Count-1]`
//!
//! Key-value pairs are two consecutive values (key then value). The schema table
//! is itself a map container of `String -> u8`.

/// Field identifier reserved as the end-of-object marker.
pub const FIELD_END: u8 = 0;

/// Lowest identifier assigned to a persisted field.
pub const FIRST_FIELD_ID: u8 = 1;

/// Upper bound on persisted fields per composite type (identifiers are one byte).
pub const MAX_FIELDS: usize = u8::MAX as usize;

/// Presence byte for an absent (`None`) value.
pub const ABSENT: u8 = 0;

/// Presence byte for a present value.
pub const PRESENT: u8 = 1;

/// Width of the widest scalar. The write engine keeps at least this much room in
/// the active block and the read engine carries this many bytes across refills.
pub const MAX_SCALAR_WIDTH: usize = 8;

/// Smallest block size the engines accept (two widest scalars).
pub const MIN_BLOCK_SIZE: usize = 2 * MAX_SCALAR_WIDTH;

/// Default block size for both engines.
pub const DEFAULT_BLOCK_SIZE: usize = 64 * 1024;

/// Default recursion ceiling for composite values.
pub const DEFAULT_DEPTH_CEILING: usize = 10;

/// Default ceiling for decoded string lengths and container counts.
pub const DEFAULT_MAX_LENGTH: usize = 256 * 1024 * 1024;

/// Decodes a presence byte.
pub(crate) fn presence_from_byte(byte: u8) -> Option<bool> {
    match byte {
        ABSENT => Some(false),
        PRESENT => Some(true),
        _ => None,
    }
}
