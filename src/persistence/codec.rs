//! Record encoding for stored values.
//!
//! Every stored value is a `Record` wrapped in a `{kind, body}` envelope and
//! encoded with `serde_json`. Decoding checks the tag before the body, so
//! reading a key as the wrong record type is reported as a schema mismatch
//! instead of a confusing field error.
//!
//! JSON is text, so byte payloads are stored as number arrays and take a few
//! times their raw size. Records here are small session entries, and the
//! format stays readable with any JSON tool.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::utils::{Result, StoreError};

/// A value type that may be written to the store.
pub trait Record: Serialize + DeserializeOwned {
    /// Stable tag written next to the body.
    const KIND: &'static str;
}

#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
    kind: &'a str,
    body: &'a T,
}

#[derive(Deserialize)]
struct Header {
    kind: String,
}

#[derive(Deserialize)]
struct Envelope<T> {
    body: T,
}

pub fn encode<T: Record>(value: &T) -> Result<Vec<u8>> {
    let envelope = EnvelopeRef {
        kind: T::KIND,
        body: value,
    };
    serde_json::to_vec(&envelope).map_err(|source| StoreError::Serialization {
        op: "encode",
        kind: T::KIND,
        source,
    })
}

pub fn decode<T: Record>(bytes: &[u8]) -> Result<T> {
    let decode_err = |source: serde_json::Error| StoreError::Serialization {
        op: "decode",
        kind: T::KIND,
        source,
    };

    let header: Header = serde_json::from_slice(bytes).map_err(decode_err)?;
    if header.kind != T::KIND {
        return Err(StoreError::KindMismatch {
            expected: T::KIND,
            found: header.kind,
        });
    }

    let envelope: Envelope<T> = serde_json::from_slice(bytes).map_err(decode_err)?;
    Ok(envelope.body)
}
