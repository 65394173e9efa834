//! # Graphcode
//!
//! A streaming binary serialization library for large, deeply nested object graphs.
//!
//! ## Overview
//!
//! Graphcode writes values to any byte sink and reads them back from any byte
//! source without ever materializing the whole encoded representation. Encoded
//! bytes flow through a fixed pair of blocks; full blocks are flushed in the
//! background while the next one fills up. Composite types describe their fields
//! through `#[derive(GraphObject)]`, so no per-type marshalling code is written by
//! hand.
//!
//! ### Key Features
//!
//! *   **Bounded Memory:** Encoding and decoding hold two blocks (write side) or one
//!     block plus an 8-byte carry-over (read side), regardless of the graph's size.
//! *   **Pipelined Flushes:** A full block is handed to a background task while
//!     appends continue into the standby block. Bytes reach the sink in append order.
//! *   **Compact Field Tags:** Each composite type's field names are sent once per
//!     stream as a small table; every later field is tagged with a one-byte id.
//! *   **Nullable Fields:** `Option` fields cost a single presence byte when absent.
//! *   **Depth Ceiling:** Composite nesting beyond a configurable depth is omitted
//!     on both sides, bounding runaway recursion.
//! *   **Strict Decoding:** Truncated streams, oversized length prefixes, invalid
//!     flag bytes and unknown field ids are errors, never undefined data.
//!
//! ## Architecture
//!
//! ```text
//! value ─> walker (Encoder) ─> codec ─> BlockWriter ─> sink
//! source ─> BlockReader ─> codec ─> walker (Decoder) ─> value
//! ```
//!
//! * [`codec`]: fixed-width scalar packing, strings, UUIDs.
//! * [`io::BlockWriter`] / [`reader::BlockReader`]: the block engines.
//! * [`schema`]: per-type field-identifier tables.
//! * [`container`]: reconstruction of lists, sets, maps, arrays and sequences.
//! * [`walker`]: [`Encoder`] and [`Decoder`].
//!
//! ### Stream Format
//!
//! There is no header or footer. See [`format`] for the exact layout.
//!
//! ## Usage
//!
//! ```rust
//! use graphcode::{Decoder, Encoder, GraphObject};
//!
//! #[derive(GraphObject, Default, Debug, PartialEq)]
//! struct Player {
//!     name: String,
//!     level: u32,
//!     guild: Option<String>,
//! }
//!
//! let players = vec![
//!     Player { name: "ana".into(), level: 7, guild: None },
//!     Player { name: "bo".into(), level: 12, guild: Some("north".into()) },
//! ];
//!
//! let mut encoder = Encoder::new(Vec::new());
//! encoder.encode(&players)?;
//! encoder.encode(&"trailer")?;
//! let bytes = encoder.finish()?;
//!
//! let mut decoder = Decoder::new(bytes.as_slice());
//! let back: Vec<Player> = decoder.decode()?;
//! let trailer: String = decoder.decode()?;
//! assert_eq!(back, players);
//! assert_eq!(trailer, "trailer");
//! # Ok::<(), graphcode::GraphcodeError>(())
//! ```
//!
//! ### Safety and Error Handling
//!
//! * **No Unsafe:** the crate forbids `unsafe` code.
//! * **No Panics:** No `unwrap()` or `panic!()` calls in the library (enforced by clippy lints).
//! * **Comprehensive Errors:** All failures correspond to a [`GraphcodeError`] variant.

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::panic)]
#![warn(missing_docs)]

// --- PUBLIC API MODULES ---
pub mod api;
pub mod codec;
pub mod container;
pub mod error;
pub mod format;
pub mod schema;
pub mod visitor;
pub mod walker;

// --- ENGINE MODULES (Hidden from Docs) ---
#[doc(hidden)]
pub mod io;
#[doc(hidden)]
pub mod reader;

// Private modules
mod visitor_impls;

// --- MACRO SUPPORT MODULES ---

/// Runtime utilities used by the derived code.
#[doc(hidden)]
pub mod rt;

// --- RE-EXPORTS ---

pub use api::{Graphcode, GraphcodeOptions};
pub use codec::ByteOrder;
pub use container::{ContainerKind, Sequence};
pub use error::{GraphcodeError, Result};
pub use visitor::{Decode, Encode, GraphObject};
pub use walker::{Decoder, Encoder, FieldEncoder};

// Re-export the derive macro so it is accessible as `graphcode::GraphObject`
pub use graphcode_derive::GraphObject;

/// Re-export of the UUID type supported natively by the codec.
pub use uuid::Uuid;
