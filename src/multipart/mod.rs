//! Streaming multipart/form-data bodies.

pub mod form;
pub mod part;
pub mod source;

pub use form::{generate_boundary, MultipartForm, MultipartReader, SegmentPiece};
pub use part::Part;
pub use source::ContentSource;
