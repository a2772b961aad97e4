//! The `utils` module holds the pieces shared across the crate: the
//! `StoreError` type and logging setup.

pub mod error;
pub mod logging;

pub use error::{Result, StoreError};
