//! The `session` module is the durable per-client state of the broker.
//!
//! - `flying`: messages sent to a client and waiting for an acknowledgment
//! - `retained`: the last retained message of each topic, plus message bodies
//! - `subscribers`: subscription markers of known clients
//! - `store`: `SessionStore`, the handle broker workers share

pub mod flying;
pub mod message;
pub mod retained;
pub mod store;
pub mod subscribers;

pub use flying::FlyingStore;
pub use message::{
    ClientSubscriptions, FlyingMessage, FlyingMessages, FlyingStatus, MqttMessage,
    RetainedPointer,
};
pub use retained::{MessageStore, RetainedStore};
pub use store::SessionStore;
pub use subscribers::SubscriberRegistry;
