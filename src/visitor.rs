//! The traits that let values travel through the object graph walker.
//!
//! [`Encode`] and [`Decode`] are implemented for scalars, strings, UUIDs and the
//! standard containers. Composite types implement [`GraphObject`], which exposes
//! their field descriptors and per-field accessors. The
//! `#[derive(GraphObject)]` macro writes all three impls for a struct.

use std::io::{Read, Write};

use crate::error::Result;
use crate::walker::{Decoder, Encoder, FieldEncoder};

/// A value that can be written to a Graphcode stream.
pub trait Encode {
    /// Writes the value.
    fn encode<W: Write + Send + 'static>(&self, encoder: &mut Encoder<W>) -> Result<()>;

    /// Whether the value is present when it sits in a field position.
    ///
    /// Only `Option::None` is absent: the walker writes presence byte `0` and
    /// nothing else for it.
    fn is_present(&self) -> bool {
        true
    }

    /// Writes the value after a field's presence byte has already been written.
    fn encode_present<W: Write + Send + 'static>(&self, encoder: &mut Encoder<W>) -> Result<()> {
        self.encode(encoder)
    }
}

/// A value that can be read back from a Graphcode stream.
pub trait Decode: Sized {
    /// Reads the value.
    fn decode<R: Read>(decoder: &mut Decoder<R>) -> Result<Self>;

    /// Reads a field value whose presence byte was `1`.
    fn decode_present<R: Read>(decoder: &mut Decoder<R>) -> Result<Self> {
        Self::decode(decoder)
    }
}

/// A composite type with named fields.
///
/// `FIELDS` is the ordered field-descriptor list; identifiers are assigned in this
/// order. The type is default-constructed before decoding and filled field by field,
/// and is only handed to the caller once the whole object decoded successfully.
pub trait GraphObject: Default + 'static {
    /// Name used in diagnostics.
    const TYPE_NAME: &'static str;

    /// Wire names of the persisted fields, in declaration order.
    const FIELDS: &'static [&'static str];

    /// Writes every persisted field, in `FIELDS` order.
    fn encode_fields<W: Write + Send + 'static>(&self, fields: &mut FieldEncoder<'_, W>)
    -> Result<()>;

    /// Decodes the field at `index` (into `FIELDS`) and assigns it.
    fn decode_field<R: Read>(&mut self, index: usize, decoder: &mut Decoder<R>) -> Result<()>;
}
