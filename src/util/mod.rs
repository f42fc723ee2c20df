//! Utility types shared across the library.
//!
//! - [`Error`] / [`Result`] - Error handling

mod error;

pub use error::*;
