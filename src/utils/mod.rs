//! The `utils` module provides the shared error type and logging setup used
//! across the `chatrelay` application.

pub mod error;
pub mod logging;

pub use error::{RelayError, Result};
