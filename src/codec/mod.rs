//! Structured body codecs and charset handling.

pub mod builtin;
pub mod charset;
pub mod registry;

pub use charset::Charset;
pub use registry::{Codec, CodecRegistry};
