//! # gossipd-state
//!
//! `gossipd-state` is the durable session-state layer of an MQTT broker. It
//! keeps per-client in-flight messages, per-topic retained messages and the
//! registry of subscribed clients in an embedded key-value store, so they
//! survive a broker restart.
//!
//! ## Core Modules
//!
//! - `config`: loads store and logging settings.
//! - `persistence`: the store connection, record encoding and key naming.
//! - `session`: flying-message, retained-message and subscriber stores.
//! - `utils`: the shared error type and logging setup.
//!
//! Any number of worker threads may share one `SessionStore`. Store
//! round-trips are serialized on a single connection guard, and per-client
//! flying-message updates are atomic.

pub mod config;
pub mod persistence;
pub mod session;
pub mod utils;

pub use session::SessionStore;
pub use utils::{Result, StoreError};
