//! The container adapter.
//!
//! On the wire every container is a flat list: an `i32` count followed by that many
//! elements (maps contribute key-value pairs). On decode the elements are collected
//! into a `Vec` first and only then shaped into the requested container. The shape
//! is a closed set, [`ContainerKind`], fixed per container type at compile time.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::hash::{BuildHasher, Hash};
use std::io::{Read, Write};

use crate::error::{GraphcodeError, Result};
use crate::visitor::{Decode, Encode};
use crate::walker::{Decoder, Encoder};

/// The shapes a flat element list can be reconstructed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    /// Ordered, growable.
    List,
    /// Unordered, unique. Duplicate elements collapse silently.
    Set,
    /// Built from key-value pairs. The last duplicate key wins.
    Map,
    /// Fixed length; the decoded count must match exactly.
    Array,
    /// Ordered, exposed as a read-once forward sequence.
    Sequence,
}

/// A container that can be rebuilt from its decoded elements.
pub trait Container: Sized {
    /// The element type as it appears on the wire (`(K, V)` for maps).
    type Element;

    /// Shape of the container.
    const KIND: ContainerKind;

    /// Required element count, for fixed-size shapes.
    const FIXED_LEN: Option<usize> = None;

    /// Builds the container from decoded elements, in wire order.
    fn from_elements(elements: Vec<Self::Element>) -> Result<Self>;

    /// Number of elements currently held.
    fn element_count(&self) -> usize;
}

/// Shapes a flat element list into `C`.
pub fn reconstruct<C: Container>(elements: Vec<C::Element>) -> Result<C> {
    let decoded = elements.len();
    if let Some(expected) = C::FIXED_LEN
        && expected != decoded
    {
        return Err(GraphcodeError::ContainerConstruction(format!(
            "{:?} of length {expected} cannot hold {decoded} decoded elements",
            C::KIND
        )));
    }

    let container = C::from_elements(elements)?;
    if matches!(C::KIND, ContainerKind::Set | ContainerKind::Map) {
        let kept = container.element_count();
        if kept < decoded {
            tracing::trace!(
                kind = ?C::KIND,
                decoded,
                kept,
                "duplicate elements collapsed"
            );
        }
    }
    Ok(container)
}

/// A read-once forward sequence of decoded elements.
///
/// Elements are yielded in wire order and each can be taken only once. Encoding a
/// sequence writes the elements it still holds.
#[derive(Debug, Clone)]
pub struct Sequence<T> {
    items: std::vec::IntoIter<T>,
}

impl<T> Sequence<T> {
    /// Wraps a list of elements.
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items: items.into_iter(),
        }
    }

    /// Elements not consumed yet.
    pub fn remaining(&self) -> &[T] {
        self.items.as_slice()
    }
}

impl<T> Default for Sequence<T> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<T> From<Vec<T>> for Sequence<T> {
    fn from(items: Vec<T>) -> Self {
        Self::new(items)
    }
}

impl<T> FromIterator<T> for Sequence<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<T> Iterator for Sequence<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.items.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.items.size_hint()
    }
}

impl<T> ExactSizeIterator for Sequence<T> {}

// --- Container impls ---

impl<T> Container for Vec<T> {
    type Element = T;
    const KIND: ContainerKind = ContainerKind::List;

    fn from_elements(elements: Vec<T>) -> Result<Self> {
        Ok(elements)
    }

    fn element_count(&self) -> usize {
        self.len()
    }
}

impl<T> Container for VecDeque<T> {
    type Element = T;
    const KIND: ContainerKind = ContainerKind::List;

    fn from_elements(elements: Vec<T>) -> Result<Self> {
        Ok(elements.into())
    }

    fn element_count(&self) -> usize {
        self.len()
    }
}

impl<T> Container for Sequence<T> {
    type Element = T;
    const KIND: ContainerKind = ContainerKind::Sequence;

    fn from_elements(elements: Vec<T>) -> Result<Self> {
        Ok(Self::new(elements))
    }

    fn element_count(&self) -> usize {
        self.items.len()
    }
}

impl<T, const N: usize> Container for [T; N] {
    type Element = T;
    const KIND: ContainerKind = ContainerKind::Array;
    const FIXED_LEN: Option<usize> = Some(N);

    fn from_elements(elements: Vec<T>) -> Result<Self> {
        let decoded = elements.len();
        elements.try_into().map_err(|_| {
            GraphcodeError::ContainerConstruction(format!(
                "array of length {N} cannot hold {decoded} decoded elements"
            ))
        })
    }

    fn element_count(&self) -> usize {
        N
    }
}

impl<T: Eq + Hash, S: BuildHasher + Default> Container for HashSet<T, S> {
    type Element = T;
    const KIND: ContainerKind = ContainerKind::Set;

    fn from_elements(elements: Vec<T>) -> Result<Self> {
        Ok(elements.into_iter().collect())
    }

    fn element_count(&self) -> usize {
        self.len()
    }
}

impl<T: Ord> Container for BTreeSet<T> {
    type Element = T;
    const KIND: ContainerKind = ContainerKind::Set;

    fn from_elements(elements: Vec<T>) -> Result<Self> {
        Ok(elements.into_iter().collect())
    }

    fn element_count(&self) -> usize {
        self.len()
    }
}

impl<K: Eq + Hash, V, S: BuildHasher + Default> Container for HashMap<K, V, S> {
    type Element = (K, V);
    const KIND: ContainerKind = ContainerKind::Map;

    fn from_elements(elements: Vec<(K, V)>) -> Result<Self> {
        Ok(elements.into_iter().collect())
    }

    fn element_count(&self) -> usize {
        self.len()
    }
}

impl<K: Ord, V> Container for BTreeMap<K, V> {
    type Element = (K, V);
    const KIND: ContainerKind = ContainerKind::Map;

    fn from_elements(elements: Vec<(K, V)>) -> Result<Self> {
        Ok(elements.into_iter().collect())
    }

    fn element_count(&self) -> usize {
        self.len()
    }
}

// --- Encode / Decode ---

impl<T: Encode> Encode for [T] {
    fn encode<W: Write + Send + 'static>(&self, encoder: &mut Encoder<W>) -> Result<()> {
        encoder.write_elements(self.len(), self)
    }
}

macro_rules! impl_sequence_codec {
    ($($ty:ident),*) => {
        $(
            impl<T: Encode> Encode for $ty<T> {
                fn encode<W: Write + Send + 'static>(&self, encoder: &mut Encoder<W>) -> Result<()> {
                    encoder.write_elements(self.len(), self.iter())
                }
            }

            impl<T: Decode> Decode for $ty<T> {
                fn decode<R: Read>(decoder: &mut Decoder<R>) -> Result<Self> {
                    decoder.read_container()
                }
            }
        )*
    };
}

impl_sequence_codec!(Vec, VecDeque);

impl<T: Encode> Encode for Sequence<T> {
    fn encode<W: Write + Send + 'static>(&self, encoder: &mut Encoder<W>) -> Result<()> {
        let remaining = self.remaining();
        encoder.write_elements(remaining.len(), remaining)
    }
}

impl<T: Decode> Decode for Sequence<T> {
    fn decode<R: Read>(decoder: &mut Decoder<R>) -> Result<Self> {
        decoder.read_container()
    }
}

impl<T: Encode, const N: usize> Encode for [T; N] {
    fn encode<W: Write + Send + 'static>(&self, encoder: &mut Encoder<W>) -> Result<()> {
        encoder.write_elements(N, self)
    }
}

impl<T: Decode, const N: usize> Decode for [T; N] {
    fn decode<R: Read>(decoder: &mut Decoder<R>) -> Result<Self> {
        decoder.read_container()
    }
}

impl<T: Encode, S> Encode for HashSet<T, S> {
    fn encode<W: Write + Send + 'static>(&self, encoder: &mut Encoder<W>) -> Result<()> {
        encoder.write_elements(self.len(), self)
    }
}

impl<T: Decode + Eq + Hash, S: BuildHasher + Default> Decode for HashSet<T, S> {
    fn decode<R: Read>(decoder: &mut Decoder<R>) -> Result<Self> {
        decoder.read_container()
    }
}

impl<T: Encode> Encode for BTreeSet<T> {
    fn encode<W: Write + Send + 'static>(&self, encoder: &mut Encoder<W>) -> Result<()> {
        encoder.write_elements(self.len(), self)
    }
}

impl<T: Decode + Ord> Decode for BTreeSet<T> {
    fn decode<R: Read>(decoder: &mut Decoder<R>) -> Result<Self> {
        decoder.read_container()
    }
}

impl<K: Encode, V: Encode, S> Encode for HashMap<K, V, S> {
    fn encode<W: Write + Send + 'static>(&self, encoder: &mut Encoder<W>) -> Result<()> {
        encoder.write_entries(self.len(), self)
    }
}

impl<K, V, S> Decode for HashMap<K, V, S>
where
    K: Decode + Eq + Hash,
    V: Decode,
    S: BuildHasher + Default,
{
    fn decode<R: Read>(decoder: &mut Decoder<R>) -> Result<Self> {
        decoder.read_container()
    }
}

impl<K: Encode, V: Encode> Encode for BTreeMap<K, V> {
    fn encode<W: Write + Send + 'static>(&self, encoder: &mut Encoder<W>) -> Result<()> {
        encoder.write_entries(self.len(), self)
    }
}

impl<K: Decode + Ord, V: Decode> Decode for BTreeMap<K, V> {
    fn decode<R: Read>(decoder: &mut Decoder<R>) -> Result<Self> {
        decoder.read_container()
    }
}
