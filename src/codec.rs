//! The primitive wire codec.
//!
//! Fixed-width scalars are packed byte by byte with shift-and-mask, in the byte
//! order configured for the stream. Floating point values travel as the raw
//! IEEE-754 bit pattern through the integer path. Strings are an `i32` byte length
//! followed by raw UTF-8, and UUIDs are their 16 raw bytes.

use serde::{Deserialize, Serialize};

use crate::error::{GraphcodeError, Result};
use crate::format::MAX_SCALAR_WIDTH;

/// Byte order used for every fixed-width scalar in a stream.
///
/// Both ends of a stream must agree on the order; it is not recorded on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub enum ByteOrder {
    /// Least-significant byte first.
    #[default]
    Little,
    /// Most-significant byte first.
    Big,
}

impl ByteOrder {
    /// The byte order of the machine running this code.
    pub const fn native() -> Self {
        if cfg!(target_endian = "little") {
            Self::Little
        } else {
            Self::Big
        }
    }
}

fn check_width(width: usize) -> Result<()> {
    if width > MAX_SCALAR_WIDTH {
        return Err(GraphcodeError::MalformedPrimitive(format!(
            "scalar width {width} exceeds {MAX_SCALAR_WIDTH} bytes"
        )));
    }
    Ok(())
}

/// Packs the low `width` bytes of `bits` into a scalar slot.
///
/// Only the first `width` bytes of the returned array are meaningful. A width
/// above [`MAX_SCALAR_WIDTH`] is `MalformedPrimitive`.
pub fn pack(bits: u64, width: usize, order: ByteOrder) -> Result<[u8; MAX_SCALAR_WIDTH]> {
    check_width(width)?;
    let mut out = [0u8; MAX_SCALAR_WIDTH];
    for (i, slot) in out.iter_mut().take(width).enumerate() {
        let shift = match order {
            ByteOrder::Little => i,
            ByteOrder::Big => width - 1 - i,
        };
        *slot = ((bits >> (8 * shift)) & 0xFF) as u8;
    }
    Ok(out)
}

/// Reassembles a scalar from the first `width` bytes of `bytes`.
///
/// Fewer than `width` bytes, or a width above [`MAX_SCALAR_WIDTH`], is
/// `MalformedPrimitive`.
pub fn unpack(bytes: &[u8], width: usize, order: ByteOrder) -> Result<u64> {
    check_width(width)?;
    let Some(bytes) = bytes.get(..width) else {
        return Err(GraphcodeError::MalformedPrimitive(format!(
            "{width}-byte scalar from {} bytes",
            bytes.len()
        )));
    };
    let mut bits = 0u64;
    for (i, byte) in bytes.iter().enumerate() {
        let shift = match order {
            ByteOrder::Little => i,
            ByteOrder::Big => width - 1 - i,
        };
        bits |= u64::from(*byte) << (8 * shift);
    }
    Ok(bits)
}

/// A fixed-width scalar that travels through the integer packing path.
pub trait Primitive: Copy {
    /// Encoded width in bytes (at most [`MAX_SCALAR_WIDTH`]).
    const WIDTH: usize;

    /// The value's bit pattern, zero-extended to 64 bits.
    fn to_bits(self) -> u64;

    /// Rebuilds the value from the low `WIDTH` bytes of `bits`.
    fn from_bits(bits: u64) -> Self;

    /// Encodes the value; the first `WIDTH` bytes of the result are the wire bytes.
    fn encode(self, order: ByteOrder) -> Result<[u8; MAX_SCALAR_WIDTH]> {
        pack(self.to_bits(), Self::WIDTH, order)
    }

    /// Decodes the value from the first `WIDTH` bytes of `bytes`.
    fn decode(bytes: &[u8], order: ByteOrder) -> Result<Self> {
        unpack(bytes, Self::WIDTH, order).map(Self::from_bits)
    }
}

macro_rules! impl_primitive_int {
    ($($t:ty => $unsigned:ty),* $(,)?) => {
        $(
            impl Primitive for $t {
                const WIDTH: usize = std::mem::size_of::<$t>();

                #[allow(clippy::cast_sign_loss, clippy::cast_lossless)]
                fn to_bits(self) -> u64 {
                    self as $unsigned as u64
                }

                #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
                fn from_bits(bits: u64) -> Self {
                    bits as $unsigned as $t
                }
            }
        )*
    };
}

impl_primitive_int!(
    u8 => u8, i8 => u8,
    u16 => u16, i16 => u16,
    u32 => u32, i32 => u32,
    u64 => u64, i64 => u64,
);

impl Primitive for f32 {
    const WIDTH: usize = 4;

    fn to_bits(self) -> u64 {
        u64::from(f32::to_bits(self))
    }

    #[allow(clippy::cast_possible_truncation)]
    fn from_bits(bits: u64) -> Self {
        f32::from_bits(bits as u32)
    }
}

impl Primitive for f64 {
    const WIDTH: usize = 8;

    fn to_bits(self) -> u64 {
        f64::to_bits(self)
    }

    fn from_bits(bits: u64) -> Self {
        f64::from_bits(bits)
    }
}

/// Encodes a boolean flag byte.
pub fn encode_bool(value: bool) -> u8 {
    u8::from(value)
}

/// Decodes a boolean flag byte; anything other than `0` or `1` is malformed.
pub fn decode_bool(byte: u8) -> Result<bool> {
    match byte {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(GraphcodeError::MalformedPrimitive(format!(
            "invalid bool byte {other:#04x}"
        ))),
    }
}

/// Converts an in-memory length to its `i32` wire prefix.
pub fn encode_length(len: usize) -> Result<i32> {
    i32::try_from(len).map_err(|_| {
        GraphcodeError::MalformedPrimitive(format!("length {len} exceeds the i32 wire prefix"))
    })
}

/// Validates a decoded `i32` length prefix against the configured ceiling.
pub fn decode_length(raw: i32, max: usize) -> Result<usize> {
    let len = usize::try_from(raw)
        .map_err(|_| GraphcodeError::MalformedPrimitive(format!("negative length {raw}")))?;
    if len > max {
        return Err(GraphcodeError::MalformedPrimitive(format!(
            "length {len} exceeds ceiling {max}"
        )));
    }
    Ok(len)
}

/// Rebuilds a string from its raw UTF-8 payload.
pub fn decode_utf8(bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes)
        .map_err(|e| GraphcodeError::MalformedPrimitive(format!("invalid UTF-8 string: {e}")))
}

/// Rebuilds a `char` from its `u32` scalar.
pub fn decode_char(code: u32) -> Result<char> {
    char::from_u32(code).ok_or_else(|| {
        GraphcodeError::MalformedPrimitive(format!("invalid char code point {code:#x}"))
    })
}
