//! The object graph walker.
//!
//! [`Encoder`] and [`Decoder`] sit between typed values and the block engines.
//! Scalars go straight through the primitive codec; containers are written as a
//! count followed by their elements; composite values are written field by field
//! behind their schema table.
//!
//! # Depth Ceiling
//!
//! Composite values nested deeper than the configured ceiling are skipped
//! entirely: the encoder writes nothing for them and the decoder leaves them at
//! their default value without reading. Both sides count depth the same way, so
//! the truncation point always matches.

use std::io::{Read, Write};

use uuid::Uuid;

use crate::api::GraphcodeOptions;
use crate::codec::{self, Primitive};
use crate::container::{self, Container};
use crate::error::{GraphcodeError, Result};
use crate::format::{ABSENT, FIELD_END, PRESENT, presence_from_byte};
use crate::io::BlockWriter;
use crate::reader::BlockReader;
use crate::schema::{SchemaMapping, SchemaRegistry, WireSchema, WireSchemaRegistry};
use crate::visitor::{Decode, Encode, GraphObject};

/// Serializes values into a byte sink through a double-buffered [`BlockWriter`].
#[derive(Debug)]
pub struct Encoder<W: Write + Send + 'static> {
    writer: BlockWriter<W>,
    schemas: SchemaRegistry,
    options: GraphcodeOptions,
    depth: usize,
}

impl<W: Write + Send + 'static> Encoder<W> {
    /// Creates an encoder with default options.
    pub fn new(sink: W) -> Self {
        Self::with_options(sink, GraphcodeOptions::default())
    }

    /// Creates an encoder with explicit options.
    pub fn with_options(sink: W, options: GraphcodeOptions) -> Self {
        Self {
            writer: BlockWriter::new(sink, options.block_size, options.pipelined),
            schemas: SchemaRegistry::new(),
            options,
            depth: 0,
        }
    }

    /// Options this encoder was built with.
    pub fn options(&self) -> &GraphcodeOptions {
        &self.options
    }

    /// Appends one value to the stream.
    pub fn encode<T: Encode + ?Sized>(&mut self, value: &T) -> Result<()> {
        value.encode(self)
    }

    /// Forces the buffered bytes out to the sink and waits for completion.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.force_flush()
    }

    /// Flushes everything and returns the sink.
    pub fn finish(self) -> Result<W> {
        self.writer.finish()
    }

    /// Bytes written so far, including bytes still buffered.
    pub fn position(&self) -> Result<u64> {
        self.writer.position()
    }

    /// Number of composite types whose schema table has been emitted.
    pub fn schema_count(&self) -> usize {
        self.schemas.len()
    }

    /// Writes a single raw byte.
    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.writer.append(&[value])
    }

    /// Writes a fixed-width scalar in the stream's byte order.
    pub fn write_primitive<P: Primitive>(&mut self, value: P) -> Result<()> {
        let bytes = value.encode(self.options.byte_order)?;
        self.writer.append(&bytes[..P::WIDTH])
    }

    /// Writes a boolean flag byte.
    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        self.write_u8(codec::encode_bool(value))
    }

    /// Writes an `i32` length or count prefix.
    pub fn write_length(&mut self, len: usize) -> Result<()> {
        let raw = codec::encode_length(len)?;
        self.write_primitive(raw)
    }

    /// Writes a length-prefixed UTF-8 string.
    pub fn write_str(&mut self, value: &str) -> Result<()> {
        self.write_length(value.len())?;
        self.writer.append(value.as_bytes())
    }

    /// Writes the 16 raw bytes of a UUID.
    pub fn write_uuid(&mut self, value: &Uuid) -> Result<()> {
        self.writer.append(value.as_bytes())
    }

    /// Writes a container: its element count, then every element.
    pub fn write_elements<'a, T, I>(&mut self, len: usize, elements: I) -> Result<()>
    where
        T: Encode + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        self.write_length(len)?;
        let mut written = 0usize;
        for element in elements {
            element.encode(self)?;
            written += 1;
        }
        check_count(len, written)
    }

    /// Writes a map container: its entry count, then each key followed by its value.
    pub fn write_entries<'a, K, V, I>(&mut self, len: usize, entries: I) -> Result<()>
    where
        K: Encode + 'a,
        V: Encode + 'a,
        I: IntoIterator<Item = (&'a K, &'a V)>,
    {
        self.write_length(len)?;
        let mut written = 0usize;
        for (key, value) in entries {
            key.encode(self)?;
            value.encode(self)?;
            written += 1;
        }
        check_count(len, written)
    }

    /// Writes a composite value: schema table on first use, tagged fields, terminator.
    pub fn encode_object<T: GraphObject>(&mut self, value: &T) -> Result<()> {
        if self.depth > self.options.depth_ceiling {
            tracing::trace!(
                type_name = T::TYPE_NAME,
                depth = self.depth,
                "depth ceiling reached; composite omitted"
            );
            return Ok(());
        }

        let (mapping, first_use) = self.schemas.get_or_create::<T>()?;
        if first_use {
            self.encode(mapping.entries())?;
        }

        self.depth += 1;
        let result = value.encode_fields(&mut FieldEncoder {
            encoder: self,
            mapping: &mapping,
        });
        self.depth -= 1;
        result?;

        self.write_u8(FIELD_END)
    }
}

fn check_count(declared: usize, written: usize) -> Result<()> {
    if declared != written {
        return Err(GraphcodeError::Internal(format!(
            "container declared {declared} elements but yielded {written}"
        )));
    }
    Ok(())
}

/// Writes the tagged fields of one composite value.
///
/// Handed to [`GraphObject::encode_fields`]; each call writes the field's
/// identifier, its presence byte and, when present, its value.
#[derive(Debug)]
pub struct FieldEncoder<'a, W: Write + Send + 'static> {
    encoder: &'a mut Encoder<W>,
    mapping: &'a SchemaMapping,
}

impl<W: Write + Send + 'static> FieldEncoder<'_, W> {
    /// Writes the field at `index` in the type's descriptor order.
    pub fn field<T: Encode + ?Sized>(&mut self, index: usize, value: &T) -> Result<()> {
        let id = self.mapping.id_of(index).ok_or_else(|| {
            GraphcodeError::Schema(format!(
                "{}: no identifier for field index {index}",
                self.mapping.type_name()
            ))
        })?;
        self.encoder.write_u8(id)?;
        if !value.is_present() {
            return self.encoder.write_u8(ABSENT);
        }
        self.encoder.write_u8(PRESENT)?;
        value.encode_present(self.encoder)
    }
}

/// Deserializes values from a byte source through a [`BlockReader`].
#[derive(Debug)]
pub struct Decoder<R: Read> {
    reader: BlockReader<R>,
    schemas: WireSchemaRegistry,
    options: GraphcodeOptions,
    depth: usize,
}

impl<R: Read> Decoder<R> {
    /// Creates a decoder with default options.
    pub fn new(source: R) -> Self {
        Self::with_options(source, GraphcodeOptions::default())
    }

    /// Creates a decoder with explicit options.
    pub fn with_options(source: R, options: GraphcodeOptions) -> Self {
        Self {
            reader: BlockReader::new(source, options.block_size),
            schemas: WireSchemaRegistry::new(),
            options,
            depth: 0,
        }
    }

    /// Options this decoder was built with.
    pub fn options(&self) -> &GraphcodeOptions {
        &self.options
    }

    /// Pops the next value from the stream.
    pub fn decode<T: Decode>(&mut self) -> Result<T> {
        T::decode(self)
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> u64 {
        self.reader.position()
    }

    /// Returns `true` once the source is exhausted.
    pub fn at_end(&mut self) -> Result<bool> {
        self.reader.at_end()
    }

    /// Returns the source. Buffered bytes are discarded.
    pub fn into_inner(self) -> R {
        self.reader.into_inner()
    }

    /// Number of composite types whose schema table has been decoded.
    pub fn schema_count(&self) -> usize {
        self.schemas.len()
    }

    /// Reads a single raw byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        let bytes = self.reader.fill(1)?;
        Ok(bytes[0])
    }

    /// Reads a fixed-width scalar in the stream's byte order.
    pub fn read_primitive<P: Primitive>(&mut self) -> Result<P> {
        let bytes = self.reader.fill(P::WIDTH)?;
        P::decode(&bytes, self.options.byte_order)
    }

    /// Reads a boolean flag byte.
    pub fn read_bool(&mut self) -> Result<bool> {
        let byte = self.read_u8()?;
        codec::decode_bool(byte)
    }

    /// Reads and validates an `i32` length or count prefix.
    pub fn read_length(&mut self) -> Result<usize> {
        let raw: i32 = self.read_primitive()?;
        codec::decode_length(raw, self.options.max_length)
    }

    /// Reads a length-prefixed UTF-8 string.
    pub fn read_string(&mut self) -> Result<String> {
        let len = self.read_length()?;
        let bytes = self.reader.read_vec(len)?;
        codec::decode_utf8(bytes)
    }

    /// Reads the 16 raw bytes of a UUID.
    pub fn read_uuid(&mut self) -> Result<Uuid> {
        let mut bytes = [0u8; 16];
        self.reader.read_bytes(&mut bytes)?;
        Ok(Uuid::from_bytes(bytes))
    }

    /// Reads a presence byte.
    pub fn read_presence(&mut self) -> Result<bool> {
        let byte = self.read_u8()?;
        presence_from_byte(byte).ok_or_else(|| {
            GraphcodeError::MalformedPrimitive(format!("invalid presence byte {byte:#04x}"))
        })
    }

    /// Reads a container's count and elements, then shapes them into `C`.
    pub fn read_container<C>(&mut self) -> Result<C>
    where
        C: Container,
        C::Element: Decode,
    {
        let count = self.read_length()?;
        // The count is untrusted until the elements arrive: reserve at most one
        // block's worth of bytes up front.
        let per_block =
            (self.options.block_size / std::mem::size_of::<C::Element>().max(1)).max(1);
        let mut elements = Vec::with_capacity(count.min(per_block));
        for _ in 0..count {
            elements.push(C::Element::decode(self)?);
        }
        container::reconstruct(elements)
    }

    /// Reads a composite value: schema table on first use, then tagged fields.
    ///
    /// The object is returned only after its terminator was read; any failure
    /// drops the partially filled instance.
    pub fn decode_object<T: GraphObject>(&mut self) -> Result<T> {
        if self.depth > self.options.depth_ceiling {
            return Ok(T::default());
        }

        let schema = match self.schemas.lookup::<T>() {
            Some(schema) => schema,
            None => {
                let table: Vec<(String, u8)> = self.decode()?;
                let schema = WireSchema::from_table::<T>(table)?;
                self.schemas.register::<T>(schema)
            }
        };

        let mut value = T::default();
        self.depth += 1;
        let result = self.decode_fields(&mut value, &schema);
        self.depth -= 1;
        result?;
        Ok(value)
    }

    fn decode_fields<T: GraphObject>(&mut self, value: &mut T, schema: &WireSchema) -> Result<()> {
        loop {
            let id = self.read_u8()?;
            if id == FIELD_END {
                return Ok(());
            }
            let index = schema.local_index(id)?;
            if self.read_presence()? {
                value.decode_field(index, self)?;
            }
        }
    }
}
