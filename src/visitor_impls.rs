//! `Encode`/`Decode` for scalars, strings, UUIDs and the transparent wrappers.
//!
//! Container impls live with the container adapter.

use std::io::{Read, Write};

use uuid::Uuid;

use crate::codec;
use crate::error::{GraphcodeError, Result};
use crate::visitor::{Decode, Encode};
use crate::walker::{Decoder, Encoder};

/// Implements the codec traits for fixed-width scalars in bulk.
macro_rules! impl_primitive_codec {
    ($($t:ty),*) => {
        $(
            impl Encode for $t {
                fn encode<W: Write + Send + 'static>(&self, encoder: &mut Encoder<W>) -> Result<()> {
                    encoder.write_primitive(*self)
                }
            }

            impl Decode for $t {
                fn decode<R: Read>(decoder: &mut Decoder<R>) -> Result<Self> {
                    decoder.read_primitive()
                }
            }
        )*
    }
}

impl_primitive_codec!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

// Pointer-sized integers always travel as 8 bytes.

impl Encode for usize {
    fn encode<W: Write + Send + 'static>(&self, encoder: &mut Encoder<W>) -> Result<()> {
        encoder.write_primitive(*self as u64)
    }
}

impl Decode for usize {
    fn decode<R: Read>(decoder: &mut Decoder<R>) -> Result<Self> {
        let raw: u64 = decoder.read_primitive()?;
        usize::try_from(raw).map_err(|_| {
            GraphcodeError::MalformedPrimitive(format!("{raw} does not fit in usize"))
        })
    }
}

impl Encode for isize {
    fn encode<W: Write + Send + 'static>(&self, encoder: &mut Encoder<W>) -> Result<()> {
        encoder.write_primitive(*self as i64)
    }
}

impl Decode for isize {
    fn decode<R: Read>(decoder: &mut Decoder<R>) -> Result<Self> {
        let raw: i64 = decoder.read_primitive()?;
        isize::try_from(raw).map_err(|_| {
            GraphcodeError::MalformedPrimitive(format!("{raw} does not fit in isize"))
        })
    }
}

impl Encode for bool {
    fn encode<W: Write + Send + 'static>(&self, encoder: &mut Encoder<W>) -> Result<()> {
        encoder.write_bool(*self)
    }
}

impl Decode for bool {
    fn decode<R: Read>(decoder: &mut Decoder<R>) -> Result<Self> {
        decoder.read_bool()
    }
}

impl Encode for char {
    fn encode<W: Write + Send + 'static>(&self, encoder: &mut Encoder<W>) -> Result<()> {
        encoder.write_primitive(u32::from(*self))
    }
}

impl Decode for char {
    fn decode<R: Read>(decoder: &mut Decoder<R>) -> Result<Self> {
        let code: u32 = decoder.read_primitive()?;
        codec::decode_char(code)
    }
}

impl Encode for str {
    fn encode<W: Write + Send + 'static>(&self, encoder: &mut Encoder<W>) -> Result<()> {
        encoder.write_str(self)
    }
}

impl Encode for String {
    fn encode<W: Write + Send + 'static>(&self, encoder: &mut Encoder<W>) -> Result<()> {
        encoder.write_str(self)
    }
}

impl Decode for String {
    fn decode<R: Read>(decoder: &mut Decoder<R>) -> Result<Self> {
        decoder.read_string()
    }
}

impl Encode for Uuid {
    fn encode<W: Write + Send + 'static>(&self, encoder: &mut Encoder<W>) -> Result<()> {
        encoder.write_uuid(self)
    }
}

impl Decode for Uuid {
    fn decode<R: Read>(decoder: &mut Decoder<R>) -> Result<Self> {
        decoder.read_uuid()
    }
}

impl Encode for () {
    fn encode<W: Write + Send + 'static>(&self, _encoder: &mut Encoder<W>) -> Result<()> {
        Ok(())
    }
}

impl Decode for () {
    fn decode<R: Read>(_decoder: &mut Decoder<R>) -> Result<Self> {
        Ok(())
    }
}

// --- Nullable values ---
//
// In a field position the walker writes the presence byte itself and calls
// `encode_present`/`decode_present`. Anywhere else (container elements, pairs)
// an option carries its own presence byte.

impl<T: Encode> Encode for Option<T> {
    fn encode<W: Write + Send + 'static>(&self, encoder: &mut Encoder<W>) -> Result<()> {
        match self {
            Some(value) => {
                encoder.write_bool(true)?;
                value.encode(encoder)
            }
            None => encoder.write_bool(false),
        }
    }

    fn is_present(&self) -> bool {
        self.is_some()
    }

    fn encode_present<W: Write + Send + 'static>(&self, encoder: &mut Encoder<W>) -> Result<()> {
        match self {
            Some(value) => value.encode(encoder),
            None => Err(GraphcodeError::Internal(
                "absent value reached the present-field path".into(),
            )),
        }
    }
}

impl<T: Decode> Decode for Option<T> {
    fn decode<R: Read>(decoder: &mut Decoder<R>) -> Result<Self> {
        if decoder.read_presence()? {
            T::decode(decoder).map(Some)
        } else {
            Ok(None)
        }
    }

    fn decode_present<R: Read>(decoder: &mut Decoder<R>) -> Result<Self> {
        T::decode(decoder).map(Some)
    }
}

// --- Transparent wrappers ---

impl<T: Encode + ?Sized> Encode for &T {
    fn encode<W: Write + Send + 'static>(&self, encoder: &mut Encoder<W>) -> Result<()> {
        (**self).encode(encoder)
    }

    fn is_present(&self) -> bool {
        (**self).is_present()
    }

    fn encode_present<W: Write + Send + 'static>(&self, encoder: &mut Encoder<W>) -> Result<()> {
        (**self).encode_present(encoder)
    }
}

impl<T: Encode + ?Sized> Encode for Box<T> {
    fn encode<W: Write + Send + 'static>(&self, encoder: &mut Encoder<W>) -> Result<()> {
        (**self).encode(encoder)
    }

    fn is_present(&self) -> bool {
        (**self).is_present()
    }

    fn encode_present<W: Write + Send + 'static>(&self, encoder: &mut Encoder<W>) -> Result<()> {
        (**self).encode_present(encoder)
    }
}

impl<T: Decode> Decode for Box<T> {
    fn decode<R: Read>(decoder: &mut Decoder<R>) -> Result<Self> {
        T::decode(decoder).map(Box::new)
    }

    fn decode_present<R: Read>(decoder: &mut Decoder<R>) -> Result<Self> {
        T::decode_present(decoder).map(Box::new)
    }
}

// --- Key-value pairs: key first, then value ---

impl<K: Encode, V: Encode> Encode for (K, V) {
    fn encode<W: Write + Send + 'static>(&self, encoder: &mut Encoder<W>) -> Result<()> {
        self.0.encode(encoder)?;
        self.1.encode(encoder)
    }
}

impl<K: Decode, V: Decode> Decode for (K, V) {
    fn decode<R: Read>(decoder: &mut Decoder<R>) -> Result<Self> {
        let key = K::decode(decoder)?;
        let value = V::decode(decoder)?;
        Ok((key, value))
    }
}
