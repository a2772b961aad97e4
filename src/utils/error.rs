//! The `error` module defines the error type shared by every store operation.
//!
//! A missing key is never an error here: lookups return `Ok(None)` or an
//! empty collection. Only the failure to open the store at startup is meant
//! to be fatal; everything else is handed back to the caller.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store could not be opened at startup.
    #[error("failed to open store at '{path}': {source}")]
    Connection {
        path: String,
        #[source]
        source: sled::Error,
    },

    /// A single store round-trip failed.
    #[error("store command {command} failed for key '{key}': {source}")]
    Command {
        command: &'static str,
        key: String,
        #[source]
        source: sled::Error,
    },

    /// A record could not be encoded or decoded.
    #[error("failed to {op} {kind} record: {source}")]
    Serialization {
        op: &'static str,
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The stored record is of a different kind than the one requested.
    #[error("schema mismatch: expected {expected} record, found {found}")]
    KindMismatch { expected: &'static str, found: String },

    /// An atomic update kept losing to concurrent writers.
    #[error("gave up updating '{key}' after {attempts} conflicting attempts")]
    Conflict { key: String, attempts: u32 },
}

impl StoreError {
    pub(crate) fn command(command: &'static str, key: &str, source: sled::Error) -> Self {
        StoreError::Command {
            command,
            key: key.to_string(),
            source,
        }
    }

    /// True for failures caused by stored data rather than the store itself.
    pub fn is_serialization(&self) -> bool {
        matches!(
            self,
            StoreError::Serialization { .. } | StoreError::KindMismatch { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
