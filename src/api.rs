//! High-level entry points and stream configuration.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::codec::ByteOrder;
use crate::error::Result;
use crate::format::{
    DEFAULT_BLOCK_SIZE, DEFAULT_DEPTH_CEILING, DEFAULT_MAX_LENGTH, MIN_BLOCK_SIZE,
};
use crate::visitor::{Decode, Encode};
use crate::walker::{Decoder, Encoder};

/// The main entry point for one-shot encoding and decoding with default options.
///
/// For several values on one stream (sharing schema tables), use [`Encoder`] and
/// [`Decoder`] directly.
#[derive(Debug)]
pub struct Graphcode;

impl Graphcode {
    /// Returns a configuration builder.
    ///
    /// ```rust
    /// use graphcode::{ByteOrder, Graphcode};
    ///
    /// let options = Graphcode::builder()
    ///     .block_size(4096)
    ///     .byte_order(ByteOrder::Big)
    ///     .depth_ceiling(32);
    /// let bytes = options.serialize(&vec![1u32, 2, 3])?;
    /// let back: Vec<u32> = options.deserialize(&bytes)?;
    /// assert_eq!(back, [1, 2, 3]);
    /// # Ok::<(), graphcode::GraphcodeError>(())
    /// ```
    pub fn builder() -> GraphcodeOptions {
        GraphcodeOptions::default()
    }

    /// Encodes a value into a file, truncating it first.
    pub fn save<T, P>(path: P, value: &T) -> Result<()>
    where
        T: Encode + ?Sized,
        P: AsRef<Path>,
    {
        GraphcodeOptions::default().save(path, value)
    }

    /// Decodes a value from a file.
    pub fn load<T: Decode, P: AsRef<Path>>(path: P) -> Result<T> {
        GraphcodeOptions::default().load(path)
    }

    /// Encodes a value into a sink and hands the sink back once every byte reached it.
    pub fn write<W, T>(sink: W, value: &T) -> Result<W>
    where
        W: Write + Send + 'static,
        T: Encode + ?Sized,
    {
        GraphcodeOptions::default().write(sink, value)
    }

    /// Decodes a value from a source.
    pub fn read<R: Read, T: Decode>(source: R) -> Result<T> {
        GraphcodeOptions::default().read(source)
    }

    /// Encodes a value into an in-memory buffer.
    pub fn serialize<T: Encode + ?Sized>(value: &T) -> Result<Vec<u8>> {
        GraphcodeOptions::default().serialize(value)
    }

    /// Decodes a value from an in-memory buffer.
    pub fn deserialize<T: Decode>(bytes: &[u8]) -> Result<T> {
        GraphcodeOptions::default().deserialize(bytes)
    }
}

/// Configuration shared by the encoder and decoder of a stream.
///
/// Byte order, depth ceiling and length ceiling must match on both ends; the block
/// size only affects buffering and may differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphcodeOptions {
    /// Capacity of each buffer block in bytes.
    pub block_size: usize,
    /// Composite nesting depth beyond which values are omitted.
    pub depth_ceiling: usize,
    /// Byte order of fixed-width scalars.
    pub byte_order: ByteOrder,
    /// Ceiling on decoded string lengths and container counts.
    pub max_length: usize,
    /// Flush full blocks on a background task instead of the calling thread.
    pub pipelined: bool,
}

impl Default for GraphcodeOptions {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            depth_ceiling: DEFAULT_DEPTH_CEILING,
            byte_order: ByteOrder::Little,
            max_length: DEFAULT_MAX_LENGTH,
            pipelined: true,
        }
    }
}

impl GraphcodeOptions {
    /// Sets the block size. Values below 16 bytes are raised to 16.
    pub fn block_size(mut self, bytes: usize) -> Self {
        self.block_size = bytes.max(MIN_BLOCK_SIZE);
        self
    }

    /// Sets the depth ceiling.
    pub fn depth_ceiling(mut self, depth: usize) -> Self {
        self.depth_ceiling = depth;
        self
    }

    /// Sets the scalar byte order.
    pub fn byte_order(mut self, order: ByteOrder) -> Self {
        self.byte_order = order;
        self
    }

    /// Sets the decode ceiling for string lengths and container counts.
    pub fn max_length(mut self, len: usize) -> Self {
        self.max_length = len;
        self
    }

    /// Enables or disables background flushing.
    pub fn pipelined(mut self, enabled: bool) -> Self {
        self.pipelined = enabled;
        self
    }

    /// Builds an encoder over `sink`.
    pub fn encoder<W: Write + Send + 'static>(&self, sink: W) -> Encoder<W> {
        Encoder::with_options(sink, *self)
    }

    /// Builds a decoder over `source`.
    pub fn decoder<R: Read>(&self, source: R) -> Decoder<R> {
        Decoder::with_options(source, *self)
    }

    /// Encodes a value into a sink and returns the sink.
    pub fn write<W, T>(&self, sink: W, value: &T) -> Result<W>
    where
        W: Write + Send + 'static,
        T: Encode + ?Sized,
    {
        let mut encoder = self.encoder(sink);
        encoder.encode(value)?;
        encoder.finish()
    }

    /// Decodes a value from a source.
    pub fn read<R: Read, T: Decode>(&self, source: R) -> Result<T> {
        self.decoder(source).decode()
    }

    /// Encodes a value into an in-memory buffer.
    pub fn serialize<T: Encode + ?Sized>(&self, value: &T) -> Result<Vec<u8>> {
        self.write(Vec::new(), value)
    }

    /// Decodes a value from an in-memory buffer.
    pub fn deserialize<T: Decode>(&self, bytes: &[u8]) -> Result<T> {
        self.read(bytes)
    }

    /// Encodes a value into a file, truncating it first.
    pub fn save<T, P>(&self, path: P, value: &T) -> Result<()>
    where
        T: Encode + ?Sized,
        P: AsRef<Path>,
    {
        let file = File::create(path)?;
        let file = self.write(file, value)?;
        file.sync_all()?;
        Ok(())
    }

    /// Decodes a value from a file.
    pub fn load<T: Decode, P: AsRef<Path>>(&self, path: P) -> Result<T> {
        let file = File::open(path)?;
        self.read(file)
    }
}
