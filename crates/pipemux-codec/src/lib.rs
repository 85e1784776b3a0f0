//! Typed value codecs for the pipemux transport.
//!
//! A codec specifies how a semantic piece of information is encoded in
//! raw bytes on a pipe's byte stream. Two families are provided:
//! fixed-width little-endian scalars and length-prefixed strings
//! (decode-only in this version).
//!
//! Lookup goes through [`CodecRegistry`], which is immutable after
//! construction and maps `(format name, value kind)` pairs to codec
//! entries.

pub mod decoders;
pub mod error;
pub mod registry;
pub mod scalar;
pub mod value;

pub use decoders::{ScalarDecoder, StringDecoder};
pub use error::{CodecError, Result};
pub use registry::{CodecEntry, CodecRegistry};
pub use scalar::ScalarFormat;
pub use value::{Value, ValueClass, ValueKind};
