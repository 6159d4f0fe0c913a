//! Error types for the paloma client.
//!
//! A single [`Error`] type with a [`Kind`] classification covers validation
//! failures (raised before any I/O), transport failures (propagated through
//! the middleware pipeline unchanged), and exceptional-status results
//! (carrying the full response as structured context).

mod constructors;
mod types;

pub use constructors::*;
pub use types::{Error, Kind, Result};
