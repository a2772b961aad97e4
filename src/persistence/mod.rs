//! The `persistence` module is the lowest layer of the session state: the
//! store connection and its primitive commands, record encoding, and the
//! key namespace.
//!
//! The backing store is `sled`. All primitives on one `Connection` are
//! serialized by a single guard; see `connection` for what that does and
//! does not promise.

pub mod codec;
pub mod connection;
pub mod keys;

pub use codec::{Record, decode, encode};
pub use connection::{Connection, Swap};
pub use keys::KeySpace;

#[cfg(test)]
mod tests;
